use std::collections::BTreeSet;

use geoprep::split::{permutation, split, SplitKind, SplitProportions};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn permutation_visits_every_index_once(count in 0usize..300, seed in any::<u32>()) {
        let order = permutation(count, seed);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..count).collect::<Vec<_>>());
    }

    #[test]
    fn partition_is_disjoint_and_exhaustive(
        count in 0usize..300,
        seed in any::<u32>(),
        (train, test) in proptest_helpers::arb_proportions(),
    ) {
        let proportions = SplitProportions::new(train, test).expect("valid proportions");
        let partition = split(count, seed, proportions);

        let mut seen = BTreeSet::new();
        for kind in SplitKind::ALL {
            for &index in partition.indices(kind) {
                prop_assert!(index < count);
                prop_assert!(seen.insert(index), "index {} assigned twice", index);
            }
        }
        prop_assert_eq!(seen.len(), count);
        prop_assert_eq!(partition.len(), count);
    }

    #[test]
    fn split_sizes_follow_the_proportions(
        count in 0usize..300,
        seed in any::<u32>(),
        (train, test) in proptest_helpers::arb_proportions(),
    ) {
        let proportions = SplitProportions::new(train, test).expect("valid proportions");
        let partition = split(count, seed, proportions);
        let (n_train, n_test, n_validation) = proportions.sizes(count);

        prop_assert_eq!(partition.train.len(), n_train);
        prop_assert_eq!(partition.test.len(), n_test);
        prop_assert_eq!(partition.validation.len(), n_validation);
        prop_assert!(n_train as f64 <= count as f64 * train);
        prop_assert!(n_train + n_test <= count);
    }

    #[test]
    fn split_is_a_function_of_count_and_seed(
        count in 0usize..300,
        seed in any::<u32>(),
        (train, test) in proptest_helpers::arb_proportions(),
    ) {
        let proportions = SplitProportions::new(train, test).expect("valid proportions");
        let first = split(count, seed, proportions);
        let second = split(count, seed, proportions);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn splits_follow_the_permutation_order(count in 1usize..300, seed in any::<u32>()) {
        let proportions = SplitProportions::new(0.7, 0.2).expect("valid proportions");
        let partition = split(count, seed, proportions);
        let concatenated: Vec<usize> = SplitKind::ALL
            .iter()
            .flat_map(|&kind| partition.indices(kind).iter().copied())
            .collect();
        prop_assert_eq!(concatenated, permutation(count, seed));
    }
}
