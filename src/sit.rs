//! Component G: the Static Interval Tree (§4.G), a classical Berg-style median-split
//! tree built once from a batch and frozen for the rest of its life.

use crate::collection::IntervalCollection;
use crate::error::{EmptyCollectionError, ReadOnlyError};
use crate::interval::{union_spans, Interval, IntervalRef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

struct SitNode<K> {
    key: K,
    /// Intervals straddling `key`, ascending by `compare_low`.
    left_list: Vec<IntervalRef<K>>,
    /// The same intervals, descending by `compare_high`.
    right_list: Vec<IntervalRef<K>>,
    left: Option<Box<SitNode<K>>>,
    right: Option<Box<SitNode<K>>>,
}

/// An immutable interval tree built from a fixed batch in one pass: every node holds a
/// median endpoint and the intervals straddling it, sorted both ways so overlap queries
/// can stop scanning as soon as a prefix no longer matches.
pub struct StaticIntervalTree<K: Ord + Clone> {
    root: Option<Box<SitNode<K>>>,
    count: u32,
    span: Option<Interval<K>>,
}

impl<K: Ord + Clone> StaticIntervalTree<K> {
    /// Builds the tree from `intervals`, using `seed` to drive the reproducible Knuth
    /// shuffle behind the randomized median selection (§9's note on entropy sourcing).
    pub fn build(intervals: Vec<IntervalRef<K>>, seed: u64) -> Self {
        let count = intervals.len() as u32;
        let span = union_spans(intervals.iter().map(|iv| iv.as_ref()));
        let mut rng = StdRng::seed_from_u64(seed);
        let root = build_node(intervals, &mut rng);
        Self { root, count, span }
    }

    /// §6's `from_iter` lifecycle operation: builds from any iterable using a fixed
    /// default seed. Call [`Self::build`] directly when the caller needs to control or
    /// vary the seed.
    pub fn from_iter(intervals: impl IntoIterator<Item = IntervalRef<K>>) -> Self {
        Self::build(intervals.into_iter().collect(), 0)
    }
}

/// Shuffles `endpoints` (Knuth/Fisher-Yates) and partitions around its midpoint with a
/// Hoare-style scheme, returning the value now sitting at the middle index — a
/// randomized quickselect median, cheaper than a full sort.
fn median_endpoint<K: Ord + Clone>(mut endpoints: Vec<K>, rng: &mut StdRng) -> K {
    let len = endpoints.len();
    for i in (1..len).rev() {
        let j = rng.gen_range(0..=i);
        endpoints.swap(i, j);
    }
    let mid = len / 2;
    quickselect(&mut endpoints, mid);
    endpoints[mid].clone()
}

fn quickselect<K: Ord>(values: &mut [K], target: usize) {
    let mut lo = 0;
    let mut hi = values.len() - 1;
    loop {
        if lo >= hi {
            return;
        }
        let pivot_index = partition(values, lo, hi);
        match target.cmp(&pivot_index) {
            Ordering::Less => hi = pivot_index - 1,
            Ordering::Equal => return,
            Ordering::Greater => lo = pivot_index + 1,
        }
    }
}

fn partition<K: Ord>(values: &mut [K], lo: usize, hi: usize) -> usize {
    values.swap(hi, lo + (hi - lo) / 2);
    let mut store = lo;
    for i in lo..hi {
        if values[i] <= values[hi] {
            values.swap(i, store);
            store += 1;
        }
    }
    values.swap(store, hi);
    store
}

fn build_node<K: Ord + Clone>(intervals: Vec<IntervalRef<K>>, rng: &mut StdRng) -> Option<Box<SitNode<K>>> {
    if intervals.is_empty() {
        return None;
    }
    let endpoints: Vec<K> = intervals
        .iter()
        .flat_map(|iv| [iv.low.clone(), iv.high.clone()])
        .collect();
    let key = median_endpoint(endpoints, rng);

    let mut left_of = Vec::new();
    let mut right_of = Vec::new();
    let mut straddling = Vec::new();
    for iv in intervals {
        if iv.high < key {
            left_of.push(iv);
        } else if key < iv.low {
            right_of.push(iv);
        } else {
            straddling.push(iv);
        }
    }

    let mut left_list = straddling.clone();
    left_list.sort_by(|a, b| Interval::compare_low(a, b));
    let mut right_list = straddling;
    right_list.sort_by(|a, b| Interval::compare_high(b, a));

    Some(Box::new(SitNode {
        key,
        left_list,
        right_list,
        left: build_node(left_of, rng),
        right: build_node(right_of, rng),
    }))
}

impl<K: Ord + Clone> IntervalCollection<K> for StaticIntervalTree<K> {
    fn count(&self) -> u32 {
        self.count
    }

    fn allows_reference_duplicates(&self) -> bool {
        true
    }

    fn add(&mut self, _interval: IntervalRef<K>) -> Result<bool, ReadOnlyError> {
        Err(ReadOnlyError)
    }

    fn remove(&mut self, _interval: &IntervalRef<K>) -> Result<bool, ReadOnlyError> {
        Err(ReadOnlyError)
    }

    fn clear(&mut self) -> Result<(), ReadOnlyError> {
        Err(ReadOnlyError)
    }

    fn span(&self) -> Result<Interval<K>, EmptyCollectionError> {
        self.span.clone().ok_or(EmptyCollectionError)
    }

    fn choose(&self) -> Result<IntervalRef<K>, EmptyCollectionError> {
        self.iter().next().ok_or(EmptyCollectionError)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_> {
        Box::new(InorderIter::new(self.root.as_deref()).flat_map(|node| node.left_list.iter().cloned()))
    }

    fn find_overlaps(&self, query: &Interval<K>) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_> {
        let mut out = Vec::new();
        collect_overlaps(self.root.as_deref(), query, &mut out);
        Box::new(out.into_iter())
    }
}

struct InorderIter<'a, K> {
    stack: Vec<&'a SitNode<K>>,
}

impl<'a, K: Ord + Clone> InorderIter<'a, K> {
    fn new(root: Option<&'a SitNode<K>>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left(root);
        iter
    }

    fn push_left(&mut self, mut node: Option<&'a SitNode<K>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, K: Ord + Clone> Iterator for InorderIter<'a, K> {
    type Item = &'a SitNode<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some(node)
    }
}

/// Descends toward the split node for `query`, emitting the overlapping prefix of each
/// visited node's `left_list`/`right_list` depending on which side of the key `query`
/// falls, and widening to a full in-order subtree walk once past the split.
fn collect_overlaps<K: Ord + Clone>(node: Option<&SitNode<K>>, query: &Interval<K>, out: &mut Vec<IntervalRef<K>>) {
    let Some(node) = node else { return };

    if query.high < node.key || (query.high == node.key && !query.high_included) {
        // Ascending by low: once `low` runs past `query.high` nothing further can overlap.
        for iv in &node.left_list {
            if iv.low > query.high {
                break;
            }
            if iv.overlaps_with(query) {
                out.push(iv.clone());
            }
        }
        collect_overlaps(node.left.as_deref(), query, out);
    } else if node.key < query.low || (node.key == query.low && !query.low_included) {
        // Descending by high: once `high` runs past `query.low` nothing further can overlap.
        for iv in &node.right_list {
            if iv.high < query.low {
                break;
            }
            if iv.overlaps_with(query) {
                out.push(iv.clone());
            }
        }
        collect_overlaps(node.right.as_deref(), query, out);
    } else {
        // `node.key` lies inside `query`, so every straddling interval here overlaps it:
        // each one's `high >= node.key >= query.low` and `low <= node.key <= query.high`.
        out.extend(node.left_list.iter().cloned());
        collect_overlaps(node.left.as_deref(), query, out);
        collect_overlaps(node.right.as_deref(), query, out);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::rc::Rc;

    fn iv(low: i32, high: i32) -> IntervalRef<i32> {
        Rc::new(Interval::closed(low, high))
    }

    #[test]
    fn scenario_s4_split_query_and_full_range() {
        let intervals = vec![iv(1, 3), iv(2, 6), iv(4, 5), iv(7, 9), iv(5, 8)];
        let tree = StaticIntervalTree::build(intervals, 42);

        let found: std::collections::HashSet<_> =
            tree.find_overlaps(&Interval::point(5)).map(|iv| (iv.low, iv.high)).collect();
        assert_eq!(found, [(2, 6), (4, 5), (5, 8)].into_iter().collect());

        assert_eq!(tree.count_overlaps(&Interval::closed(0, 10)), 5);
    }

    #[test]
    fn read_only_mutation_fails() {
        let mut tree = StaticIntervalTree::build(vec![iv(1, 2)], 7);
        assert!(tree.add(iv(3, 4)).is_err());
        assert!(tree.remove(&iv(1, 2)).is_err());
        assert!(tree.clear().is_err());
    }

    #[test]
    fn span_covers_every_inserted_interval() {
        let tree = StaticIntervalTree::build(vec![iv(-10, -1), iv(0, 100), iv(50, 60)], 1);
        assert_eq!(tree.span().unwrap(), Interval::closed(-10, 100));
    }

    #[test]
    fn empty_batch_reports_empty_collection_errors() {
        let tree: StaticIntervalTree<i32> = StaticIntervalTree::build(Vec::new(), 0);
        assert!(tree.is_empty());
        assert!(tree.span().is_err());
        assert!(tree.choose().is_err());
    }
}
