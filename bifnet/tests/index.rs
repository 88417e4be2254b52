use std::collections::HashMap;

use bifnet::{AttributionIndex, OrderedIndex, Scope};
use itertools::Itertools;
use ndarray::Array1;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use proptest::prelude::*;
use rand_xoshiro::Xoshiro256StarStar;

fn scope(vars: &[usize], cards: &[usize]) -> Scope {
    Scope::from_parts(vars.to_vec(), vars.iter().map(|v| cards[*v]).collect()).unwrap()
}

/// Family of variables 0..cards.len() and a listing order which is a permutation of it.
fn family_and_order() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    prop::collection::vec(1usize..5, 1..6).prop_flat_map(|cards| {
        let n = cards.len();
        (Just(cards), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    })
}

/// Assignments of `var_ord`, the first variable varying fastest.
fn listing(var_ord: &Scope) -> Vec<HashMap<usize, usize>> {
    var_ord
        .cards()
        .iter()
        .rev()
        .map(|c| 0..*c)
        .multi_cartesian_product()
        .map(|states| {
            var_ord
                .vars()
                .iter()
                .copied()
                .zip(states.into_iter().rev())
                .collect()
        })
        .collect()
}

proptest! {
    #[test]
    fn ordered_index_visits_each_index_once((cards, order) in family_and_order()) {
        let family = scope(&(0..cards.len()).collect::<Vec<_>>(), &cards);
        let var_ord = scope(&order, &cards);
        let index = OrderedIndex::new(&var_ord, &family).unwrap();
        prop_assert_eq!(index.len(), family.size());
        let visited = index.collect::<Vec<_>>();
        prop_assert_eq!(visited.len(), family.size());
        let sorted = visited.into_iter().sorted().collect::<Vec<_>>();
        prop_assert_eq!(sorted, (0..family.size()).collect::<Vec<_>>());
    }

    #[test]
    fn ordered_and_attribution_agree((cards, order) in family_and_order(), seed in any::<u64>()) {
        let family = scope(&(0..cards.len()).collect::<Vec<_>>(), &cards);
        let var_ord = scope(&order, &cards);
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let values = Array1::<f64>::random_using(family.size(), Uniform::new(0.0, 1.0), &mut rng);

        let mut by_order = vec![f64::NAN; family.size()];
        for (i, v) in OrderedIndex::new(&var_ord, &family).unwrap().zip(values.iter()) {
            by_order[i] = *v;
        }
        let mut by_attribution = vec![f64::NAN; family.size()];
        let attribution = AttributionIndex::new(&family);
        for (assignment, v) in listing(&var_ord).iter().zip(values.iter()) {
            by_attribution[attribution.index(assignment).unwrap()] = *v;
        }
        let bits = |x: &[f64]| x.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(by_order.as_slice()), bits(by_attribution.as_slice()));
    }
}

#[test]
fn strides() {
    let s = scope(&[0, 1, 2], &[2, 3, 4]);
    assert_eq!(s.size(), 24);
    assert_eq!(s.strides(), [12, 4, 1]);
    let empty = Scope::from_parts(vec![], vec![]).unwrap();
    assert_eq!(empty.size(), 1);
    assert!(empty.strides().is_empty());
}

#[test]
fn attribution_index() {
    let s = scope(&[0, 1, 2], &[2, 3, 4]);
    let index = AttributionIndex::new(&s);
    let assignment = HashMap::from([(0, 1), (1, 2), (2, 3), (7, 5)]);
    assert_eq!(index.index(&assignment).unwrap(), 23);
    assert!(index.index(&HashMap::from([(0, 1), (1, 2)])).is_err());
    assert!(index.index(&HashMap::from([(0, 2), (1, 2), (2, 3)])).is_err());
}

#[test]
fn ordered_index_order() {
    // listing (0, 1) with 0 fastest, stored (1, 0) with 0 fastest: identity
    let cards = [2, 3];
    let index = OrderedIndex::new(&scope(&[0, 1], &cards), &scope(&[1, 0], &cards)).unwrap();
    assert_eq!(index.collect::<Vec<_>>(), [0, 1, 2, 3, 4, 5]);
    // same order for listing and storage: transposed
    let mut index = OrderedIndex::new(&scope(&[0, 1], &cards), &scope(&[0, 1], &cards)).unwrap();
    assert_eq!(index.index(), 0);
    assert_eq!(index.next(), Some(0));
    assert_eq!(index.states(), [1, 0]);
    assert_eq!(index.collect::<Vec<_>>(), [3, 1, 4, 2, 5]);
}

#[test]
fn invalid_scopes() {
    assert!(Scope::from_parts(vec![0, 1, 0], vec![2, 2, 2]).is_err());
    assert!(Scope::from_parts(vec![0, 1], vec![2]).is_err());
    assert!(Scope::from_parts(vec![0], vec![0]).is_err());
    let cards = [2, 3, 2];
    assert!(OrderedIndex::new(&scope(&[0, 1], &cards), &scope(&[0, 2], &cards)).is_err());
    assert!(OrderedIndex::new(&scope(&[0, 1], &cards), &scope(&[0, 1, 2], &cards)).is_err());
    let other = Scope::from_parts(vec![0, 1], vec![2, 4]).unwrap();
    assert!(OrderedIndex::new(&scope(&[0, 1], &cards), &other).is_err());
}
