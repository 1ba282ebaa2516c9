use std::collections::HashMap;

use proptest::prelude::*;

use lockstep::sort::{sort_sequential, ParallelSorter};
use lockstep::testing::is_sorted;

fn multiset<T: std::hash::Hash + Eq + Copy>(data: &[T]) -> HashMap<T, usize> {
    let mut counts = HashMap::new();
    for &x in data {
        *counts.entry(x).or_insert(0) += 1;
    }
    counts
}

proptest! {
    #[test]
    fn parallel_sort_matches_std(mut data in proptest::collection::vec(any::<i16>(), 0..5000)) {
        let mut expected = data.clone();
        expected.sort_unstable();

        let sorter = ParallelSorter::with_cutoff(4, 64);
        sorter.sort(&mut data);
        prop_assert_eq!(data, expected);
    }

    #[test]
    fn sequential_sort_preserves_the_multiset(mut data in proptest::collection::vec(any::<i32>(), 0..2000)) {
        let before = multiset(&data);
        sort_sequential(&mut data);
        prop_assert!(is_sorted(&data));
        prop_assert_eq!(multiset(&data), before);
    }

    #[test]
    fn parallel_sort_preserves_the_multiset(mut data in proptest::collection::vec(any::<i16>(), 0..3000)) {
        let before = multiset(&data);
        let sorter = ParallelSorter::with_cutoff(3, 128);
        sorter.sort(&mut data);
        prop_assert!(is_sorted(&data));
        prop_assert_eq!(multiset(&data), before);
    }
}

#[test]
fn thread_counts_agree_on_one_input() {
    let data = lockstep::testing::generate_array::<i16>(20_000);
    let mut expected = data.clone();
    expected.sort_unstable();

    for threads in [1, 2, 4, 8] {
        let mut copy = data.clone();
        ParallelSorter::new(threads).sort(&mut copy);
        assert_eq!(copy, expected, "threads = {threads}");
    }
}
