//! Component E: the Dynamic Interval Tree (§4), an AVL tree keyed on interval endpoints
//! with a max-number-overlapping (MNO) aggregate maintained at every node.

mod node;

use crate::collection::IntervalCollection;
use crate::error::{EmptyCollectionError, ReadOnlyError};
use crate::interval::{Interval, IntervalRef};
use node::DitNode;

/// A self-balancing interval tree supporting `O(log n)` insert, remove, overlap query
/// and maximum-overlap query.
///
/// Each node is keyed on an endpoint value (both the `low`s and the `high`s of stored
/// intervals share the same key space); intervals are recorded at the node matching
/// their `low`, split further into an included/excluded bucket list ordered by `high`.
/// Rotations are generic ([`crate::avl`]); only the per-node payload repair
/// (`DitNode::refresh`) is specific to this structure.
pub struct DynamicIntervalTree<K: Ord + Clone> {
    root: Option<Box<DitNode<K>>>,
    count: u32,
    allow_reference_duplicates: bool,
}

impl<K: Ord + Clone> Default for DynamicIntervalTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> DynamicIntervalTree<K> {
    /// A new, empty tree that rejects inserting an interval value already present by
    /// identity-distinct reference at the same endpoints (see [`Self::with_reference_duplicates`]
    /// to allow it).
    pub fn new() -> Self {
        Self {
            root: None,
            count: 0,
            allow_reference_duplicates: false,
        }
    }

    /// A new, empty tree that allows the same interval value to be stored more than
    /// once under distinct `Rc` references (scenario S5: two point intervals `[3,3]`
    /// held as separate entries).
    pub fn with_reference_duplicates() -> Self {
        Self {
            root: None,
            count: 0,
            allow_reference_duplicates: true,
        }
    }

    /// Builds a tree from a batch of intervals in one call (§6's `from_iter`),
    /// allowing reference duplicates since no deduplication policy is implied by a
    /// bare batch constructor.
    pub fn from_iter(intervals: impl IntoIterator<Item = IntervalRef<K>>) -> Self {
        let mut tree = Self::with_reference_duplicates();
        tree.add_all(intervals).expect("a fresh DynamicIntervalTree is never read-only");
        tree
    }

    fn contains_identity(&self, interval: &IntervalRef<K>) -> bool {
        match node::find_node(self.root.as_deref(), &interval.low) {
            Some(found) => found.local_intervals().any(|stored| std::rc::Rc::ptr_eq(stored, interval)),
            None => false,
        }
    }

    /// The maximum number of stored intervals simultaneously overlapping any single
    /// point, in `O(1)`.
    pub fn maximum_overlap(&self) -> u32 {
        self.root.as_deref().map_or(0, |root| root.max.max(0) as u32)
    }
}

impl<K: Ord + Clone> IntervalCollection<K> for DynamicIntervalTree<K> {
    fn count(&self) -> u32 {
        self.count
    }

    fn allows_reference_duplicates(&self) -> bool {
        self.allow_reference_duplicates
    }

    fn add(&mut self, interval: IntervalRef<K>) -> Result<bool, ReadOnlyError> {
        if !self.allow_reference_duplicates && self.contains_identity(&interval) {
            return Ok(false);
        }
        let root = self.root.take();
        let root = node::insert_low(root, &interval);
        let root = node::insert_high(Some(root), &interval);
        self.root = Some(root);
        self.count += 1;
        Ok(true)
    }

    fn remove(&mut self, interval: &IntervalRef<K>) -> Result<bool, ReadOnlyError> {
        if !self.contains_identity(interval) {
            return Ok(false);
        }
        let root = self.root.take();
        let root = node::remove_low(root, interval);
        let root = node::remove_high(root, interval);
        self.root = root;
        self.count -= 1;
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), ReadOnlyError> {
        self.root = None;
        self.count = 0;
        Ok(())
    }

    fn span(&self) -> Result<Interval<K>, EmptyCollectionError> {
        self.root
            .as_deref()
            .and_then(|root| root.span.clone())
            .ok_or(EmptyCollectionError)
    }

    fn choose(&self) -> Result<IntervalRef<K>, EmptyCollectionError> {
        self.iter().next().ok_or(EmptyCollectionError)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_> {
        Box::new(InorderIter::new(self.root.as_deref()).flat_map(|node| node.local_intervals().cloned()))
    }

    fn find_overlaps(&self, query: &Interval<K>) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_> {
        Box::new(OverlapIter::new(self.root.as_deref(), query.clone()))
    }
}

/// Plain in-order walk over every node, used by [`DynamicIntervalTree::iter`].
struct InorderIter<'a, K> {
    stack: Vec<&'a DitNode<K>>,
}

impl<'a, K: Ord + Clone> InorderIter<'a, K> {
    fn new(root: Option<&'a DitNode<K>>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left(root);
        iter
    }

    fn push_left(&mut self, mut node: Option<&'a DitNode<K>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, K: Ord + Clone> Iterator for InorderIter<'a, K> {
    type Item = &'a DitNode<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some(node)
    }
}

/// Descends the tree guided by `query`, pruning any subtree whose `span` cannot overlap
/// it, and yields every stored interval that does.
///
/// The spec's literal pruning condition (descend right only once `span.high >= query.low`)
/// is folded into the stronger, always-correct check `Interval::overlaps(span, query)`:
/// a subtree whose span doesn't overlap the query can contain no overlapping interval,
/// and one whose span does overlap is always worth descending into.
struct OverlapIter<'a, K: Ord + Clone> {
    stack: Vec<&'a DitNode<K>>,
    query: Interval<K>,
    current_matches: std::vec::IntoIter<IntervalRef<K>>,
}

impl<'a, K: Ord + Clone> OverlapIter<'a, K> {
    fn new(root: Option<&'a DitNode<K>>, query: Interval<K>) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            query,
            current_matches: Vec::new().into_iter(),
        };
        iter.push_candidates(root);
        iter
    }

    fn push_candidates(&mut self, node: Option<&'a DitNode<K>>) {
        if let Some(node) = node {
            if node.span.as_ref().is_some_and(|span| Interval::overlaps(span, &self.query)) {
                self.stack.push(node);
            }
        }
    }
}

impl<'a, K: Ord + Clone> Iterator for OverlapIter<'a, K> {
    type Item = IntervalRef<K>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(found) = self.current_matches.next() {
                return Some(found);
            }
            let node = self.stack.pop()?;
            self.push_candidates(node.left.as_deref());
            self.push_candidates(node.right.as_deref());
            let matches: Vec<_> = node
                .local_intervals()
                .filter(|interval| interval.overlaps_with(&self.query))
                .cloned()
                .collect();
            self.current_matches = matches.into_iter();
        }
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
    fn scenario_s1_basic_overlap_and_span() {
        let mut tree = DynamicIntervalTree::new();
        tree.add(iv(1, 5)).unwrap();
        tree.add(iv(3, 7)).unwrap();
        tree.add(iv(6, 8)).unwrap();

        assert_eq!(tree.count_overlaps(&Interval::point(4)), 2);
        assert_eq!(tree.count_overlaps(&Interval::point(6)), 2);
        assert_eq!(tree.maximum_overlap(), 2);
        assert_eq!(tree.span().unwrap(), Interval::closed(1, 8));
    }

    #[test]
    fn scenario_s5_reference_duplicates() {
        let mut unique = DynamicIntervalTree::new();
        let a = iv(3, 3);
        assert!(unique.add(a.clone()).unwrap());
        assert!(!unique.add(a.clone()).unwrap());
        assert_eq!(unique.count(), 1);

        let mut duped = DynamicIntervalTree::with_reference_duplicates();
        let b = iv(3, 3);
        assert!(duped.add(a.clone()).unwrap());
        assert!(duped.add(b.clone()).unwrap());
        assert_eq!(duped.count(), 2);
        assert_eq!(duped.maximum_overlap(), 2);
        assert!(duped.remove(&a).unwrap());
        assert_eq!(duped.count(), 1);
        assert_eq!(duped.maximum_overlap(), 1);
    }

    #[test]
    fn scenario_s6_half_open_intervals_do_not_touch() {
        let mut tree = DynamicIntervalTree::new();
        tree.add(Rc::new(Interval::new(1, 5, true, false))).unwrap();
        tree.add(Rc::new(Interval::new(5, 9, false, true))).unwrap();

        assert_eq!(tree.maximum_overlap(), 1);
        assert_eq!(tree.count_overlaps(&Interval::point(5)), 0);
        assert_eq!(tree.count_overlaps(&Interval::point(4)), 1);
        assert_eq!(tree.count_overlaps(&Interval::point(6)), 1);
    }

    #[test]
    fn remove_then_reinsert_keeps_span_and_balance_consistent() {
        let mut tree = DynamicIntervalTree::new();
        let values = [(1, 10), (2, 4), (5, 6), (7, 20), (0, 1), (15, 16)];
        let refs: Vec<_> = values.iter().map(|&(l, h)| iv(l, h)).collect();
        for r in &refs {
            tree.add(r.clone()).unwrap();
        }
        assert_eq!(tree.span().unwrap(), Interval::closed(0, 20));

        assert!(tree.remove(&refs[3]).unwrap());
        assert_eq!(tree.count(), 5);
        assert_eq!(tree.span().unwrap(), Interval::closed(0, 16));

        for r in &refs {
            if !std::rc::Rc::ptr_eq(r, &refs[3]) {
                assert!(tree.find_overlaps(r).any(|found| std::rc::Rc::ptr_eq(&found, r)));
            }
        }
    }

    #[test]
    fn empty_tree_reports_empty_collection_errors() {
        let tree: DynamicIntervalTree<i32> = DynamicIntervalTree::new();
        assert!(tree.is_empty());
        assert!(tree.span().is_err());
        assert!(tree.choose().is_err());
        assert_eq!(tree.maximum_overlap(), 0);
    }
}
