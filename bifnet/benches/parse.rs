use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use itertools::Itertools;
use ndarray::Array1;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use bifnet::{bif, Config};

/// Network with `np` root variables and one child of all of them, all with `nc` states.
/// The child table is written in a single `table` statement.
fn gen_family(np: usize, nc: usize) -> String {
    let mut src = String::new();
    let states = (0..nc).map(|s| format!("s{}", s)).join(", ");
    for v in 0..=np {
        src += &format!("variable V{} {{\n  type discrete [ {} ] {{ {} }};\n}}\n", v, nc, states);
    }
    let parents = (1..=np).map(|v| format!("V{}", v)).join(", ");
    let size = nc.pow(np as u32 + 1);
    let values = Array1::<f64>::random(size, Uniform::new(0.0, 1.0));
    src += &format!(
        "probability ( V0 | {} ) {{\n  table {};\n}}\n",
        parents,
        values.iter().join(", ")
    );
    src
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_table");
    // no normalization check: random tables would log a warning per parent assignment
    let config = Config::no_normalization_check();
    for np in [1, 3, 5, 7] {
        let src = gen_family(np, 3);
        group.bench_with_input(BenchmarkId::new("parents", np), &np, |b, _| {
            b.iter(|| bif::parse_str(&src, &config).unwrap())
        });
    }
    group.finish();

    let sachs = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/data/sachs.bif"
    ))
    .unwrap();
    c.bench_function("parse_sachs", |b| {
        b.iter(|| bif::parse_str(&sachs, &Config::default()).unwrap())
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
