//! Sequential quicksort: the leaf routine of the parallel sorter.

use rand::Rng;

/// Recursive quicksort with a uniformly random pivot.
pub fn sort_sequential<T: Copy + Ord>(data: &mut [T]) {
    if data.len() < 2 {
        return;
    }
    let pivot = random_pivot(data);
    let (less_end, greater_begin) = partition(data, pivot);
    sort_sequential(&mut data[..less_end]);
    sort_sequential(&mut data[greater_begin..]);
}

/// Three-way partition around `pivot`.
///
/// Returns `(less_end, greater_begin)` such that `[0, less_end)` is
/// strictly less than the pivot, `[less_end, greater_begin)` equal, and
/// `[greater_begin, len)` strictly greater. The equal run needs no
/// further sorting and stays in place.
pub fn partition<T: Copy + Ord>(data: &mut [T], pivot: T) -> (usize, usize) {
    let mut less_end = 0;
    let mut greater_begin = data.len();
    let mut cur = 0;
    while cur < greater_begin {
        match data[cur].cmp(&pivot) {
            std::cmp::Ordering::Less => {
                data.swap(less_end, cur);
                less_end += 1;
                cur += 1;
            }
            std::cmp::Ordering::Greater => {
                greater_begin -= 1;
                data.swap(greater_begin, cur);
            }
            std::cmp::Ordering::Equal => cur += 1,
        }
    }
    (less_end, greater_begin)
}

/// A pivot drawn uniformly from the slice.
pub(super) fn random_pivot<T: Copy>(data: &[T]) -> T {
    data[rand::thread_rng().gen_range(0..data.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_contract_holds() {
        let mut data = vec![5, 1, 9, 5, 3, 7, 5, 2, 8];
        let (less_end, greater_begin) = partition(&mut data, 5);
        assert!(data[..less_end].iter().all(|&x| x < 5));
        assert!(data[less_end..greater_begin].iter().all(|&x| x == 5));
        assert!(data[greater_begin..].iter().all(|&x| x > 5));
        assert_eq!(greater_begin - less_end, 3);
    }

    #[test]
    fn partition_with_absent_pivot_value() {
        let mut data = vec![9, 1, 8, 2];
        let (less_end, greater_begin) = partition(&mut data, 5);
        assert_eq!(less_end, 2);
        assert_eq!(greater_begin, 2);
    }

    #[test]
    fn sorts_small_inputs() {
        let mut data = vec![3, 1, 2];
        sort_sequential(&mut data);
        assert_eq!(data, vec![1, 2, 3]);

        let mut empty: Vec<i32> = Vec::new();
        sort_sequential(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![7];
        sort_sequential(&mut single);
        assert_eq!(single, vec![7]);
    }

    #[test]
    fn sorts_random_input_like_std() {
        let mut data = crate::testing::generate_array::<i16>(10_000);
        let mut expected = data.clone();
        expected.sort_unstable();
        sort_sequential(&mut data);
        assert_eq!(data, expected);
    }

    #[test]
    fn sorts_all_equal_input() {
        let mut data = vec![4i32; 100];
        sort_sequential(&mut data);
        assert!(data.iter().all(|&x| x == 4));
    }
}
