//! An endpoint-ordered list of intervals, bucketed by identical `high` endpoint.
//!
//! The outer sequence is kept sorted by descending `high` ([`Interval::compare_high`]);
//! within a bucket, membership is by reference identity (type B, [`ReferenceSet`]). This is
//! the container the dynamic interval tree hangs off each node to record every interval
//! whose `low` equals the node's key, and to walk them in decreasing-high order during a
//! query so the scan can stop as soon as a bucket's `high` no longer reaches the query.

use crate::interval::{Interval, IntervalRef};
use crate::reference_set::ReferenceSet;
use std::cmp::Ordering;

struct Bucket<K> {
    representative: IntervalRef<K>,
    members: ReferenceSet<K>,
}

/// See the module documentation.
pub struct EndpointOrderedList<K> {
    buckets: Vec<Bucket<K>>,
}

impl<K> Default for EndpointOrderedList<K> {
    fn default() -> Self {
        Self { buckets: Vec::new() }
    }
}

impl<K: Ord> EndpointOrderedList<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.members.is_empty())
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.members.len()).sum()
    }

    /// Locates the bucket index whose representative has the same `high` as `interval`
    /// under [`Interval::compare_high`], via binary search over the descending order.
    fn bucket_index(&self, interval: &Interval<K>) -> Result<usize, usize> {
        self.buckets
            .binary_search_by(|bucket| Interval::compare_high(interval, &bucket.representative))
    }

    pub fn add(&mut self, interval: IntervalRef<K>) {
        match self.bucket_index(&interval) {
            Ok(index) => {
                self.buckets[index].members.add(interval);
            }
            Err(index) => {
                let mut members = ReferenceSet::new();
                members.add(interval.clone());
                self.buckets.insert(
                    index,
                    Bucket {
                        representative: interval,
                        members,
                    },
                );
            }
        }
    }

    /// Whether `interval` is present, by identity.
    pub fn contains(&self, interval: &IntervalRef<K>) -> bool {
        match self.bucket_index(interval) {
            Ok(index) => self.buckets[index].members.contains(interval),
            Err(_) => false,
        }
    }

    /// Removes `interval` by identity. Returns `false` if it wasn't present.
    pub fn remove(&mut self, interval: &IntervalRef<K>) -> bool {
        match self.bucket_index(interval) {
            Ok(index) => {
                let removed = self.buckets[index].members.remove(interval);
                if removed && self.buckets[index].members.is_empty() {
                    self.buckets.remove(index);
                }
                removed
            }
            Err(_) => false,
        }
    }

    /// The first bucket in descending-`high` order, i.e. the representative with the
    /// greatest `high` currently stored.
    pub fn highest(&self) -> Option<&IntervalRef<K>> {
        self.buckets.first().map(|b| &b.representative)
    }

    /// Iterates every stored interval in decreasing-`high` bucket order (members within a
    /// bucket are unordered).
    pub fn iter(&self) -> impl Iterator<Item = &IntervalRef<K>> {
        self.buckets.iter().flat_map(|b| b.members.iter())
    }

    /// Yields every member from the leading run of buckets whose `high` still reaches
    /// `query.low` (per [`Interval::compare_high_low`]); stops at the first bucket whose
    /// `high` falls short, since buckets beyond it can only have a smaller `high`.
    pub fn find_overlaps<'a>(
        &'a self,
        query: &'a Interval<K>,
    ) -> impl Iterator<Item = &'a IntervalRef<K>> {
        self.buckets
            .iter()
            .take_while(move |bucket| {
                Interval::compare_high_low(&bucket.representative, query) != Ordering::Less
            })
            .flat_map(|bucket| bucket.members.iter())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::rc::Rc;

    fn make(low: i32, high: i32) -> IntervalRef<i32> {
        Rc::new(Interval::closed(low, high))
    }

    #[test]
    fn buckets_by_equal_high_and_orders_descending() {
        let mut list = EndpointOrderedList::new();
        list.add(make(1, 5));
        list.add(make(2, 5));
        list.add(make(3, 9));
        assert_eq!(list.len(), 3);
        assert_eq!(list.highest().unwrap().high, 9);
    }

    #[test]
    fn remove_drops_empty_buckets() {
        let mut list = EndpointOrderedList::new();
        let a = make(1, 5);
        list.add(a.clone());
        assert!(list.remove(&a));
        assert!(list.is_empty());
    }

    #[test]
    fn find_overlaps_stops_once_high_falls_short() {
        let mut list = EndpointOrderedList::new();
        list.add(make(0, 10));
        list.add(make(0, 6));
        list.add(make(0, 2));
        let query = Interval::closed(5, 5);
        let found: Vec<_> = list.find_overlaps(&query).map(|i| i.high).collect();
        assert_eq!(found, vec![10, 6]);
    }
}
