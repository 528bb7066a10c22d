//! Component F: the Interval Binary Search Tree (§4.F), Hanson & Chaabouni's IBS-tree
//! with AVL balancing.

mod node;

use crate::collection::IntervalCollection;
use crate::error::{EmptyCollectionError, ReadOnlyError};
use crate::interval::{Interval, IntervalRef};
use node::IbsNode;
use std::collections::HashSet as StdHashSet;
use std::rc::Rc;

/// An interval binary search tree: every distinct endpoint ever inserted becomes a node,
/// and each interval is classified into a node's `less`/`equal`/`greater` set depending
/// on whether the node's key falls inside, before, or after it. Unlike the dynamic tree,
/// this structure never allows the same interval value to be stored twice under distinct
/// references (§9's open question: the no-duplicate behaviour is IBS-specific).
pub struct IntervalBinarySearchTree<K: Ord + Clone> {
    root: Option<Box<IbsNode<K>>>,
    count: u32,
}

impl<K: Ord + Clone> Default for IntervalBinarySearchTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> IntervalBinarySearchTree<K> {
    pub fn new() -> Self {
        Self { root: None, count: 0 }
    }

    /// Builds a tree from a batch of intervals in one call (§6's `from_iter`).
    /// Reference-identical duplicates within `intervals` are silently skipped, the
    /// same as calling [`Self::add`] for each one in turn.
    pub fn from_iter(intervals: impl IntoIterator<Item = IntervalRef<K>>) -> Self {
        let mut tree = Self::new();
        tree.add_all(intervals).expect("a fresh IntervalBinarySearchTree is never read-only");
        tree
    }

    fn contains_identity(&self, interval: &IntervalRef<K>) -> bool {
        match node::find_node(self.root.as_deref(), &interval.low) {
            Some(found) => found.ends_here().any(|stored| Rc::ptr_eq(stored, interval)),
            None => false,
        }
    }

    /// The largest number of stored intervals simultaneously overlapping any point,
    /// i.e. the deepest stabbing count anywhere in the set, in `O(1)`.
    pub fn maximum_depth(&self) -> u32 {
        self.root.as_deref().map_or(0, |root| root.max.max(0) as u32)
    }
}

impl<K: Ord + Clone> IntervalCollection<K> for IntervalBinarySearchTree<K> {
    fn count(&self) -> u32 {
        self.count
    }

    fn allows_reference_duplicates(&self) -> bool {
        false
    }

    fn add(&mut self, interval: IntervalRef<K>) -> Result<bool, ReadOnlyError> {
        if self.contains_identity(&interval) {
            return Ok(false);
        }
        let root = self.root.take();
        let root = node::ensure_node(root, &interval.low);
        let mut root = node::ensure_node(Some(root), &interval.high);

        node::place(&mut root, &interval);
        node::record_endpoint(&mut root, &interval.low, &interval, true);
        node::record_endpoint(&mut root, &interval.high, &interval, false);

        let root = node::refresh_path(root, &interval.low);
        let root = node::refresh_path(root, &interval.high);

        self.root = Some(root);
        self.count += 1;
        Ok(true)
    }

    fn remove(&mut self, interval: &IntervalRef<K>) -> Result<bool, ReadOnlyError> {
        if !self.contains_identity(interval) {
            return Ok(false);
        }
        let mut root = self.root.take().expect("contains_identity implies a root");

        node::unplace(&mut root, interval);
        node::unrecord_endpoint(&mut root, &interval.low, interval, true);
        node::unrecord_endpoint(&mut root, &interval.high, interval, false);

        let root = node::refresh_path(root, &interval.low);
        let root = node::refresh_path(root, &interval.high);

        let root = node::remove_node_if_empty(Some(root), &interval.low);
        let root = node::remove_node_if_empty(root, &interval.high);

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
        self.root.as_deref().and_then(|root| root.span.clone()).ok_or(EmptyCollectionError)
    }

    fn choose(&self) -> Result<IntervalRef<K>, EmptyCollectionError> {
        self.iter().next().ok_or(EmptyCollectionError)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_> {
        let mut seen = StdHashSet::new();
        let mut out = Vec::new();
        collect_all(self.root.as_deref(), &mut seen, &mut out);
        Box::new(out.into_iter())
    }

    fn find_overlaps(&self, query: &Interval<K>) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_> {
        let mut seen = StdHashSet::new();
        let mut out = Vec::new();
        collect_overlaps(self.root.as_deref(), query, &mut seen, &mut out);
        Box::new(out.into_iter())
    }
}

fn collect_all<K: Ord + Clone>(node: Option<&IbsNode<K>>, seen: &mut StdHashSet<usize>, out: &mut Vec<IntervalRef<K>>) {
    let Some(node) = node else { return };
    for iv in node.ends_here() {
        if seen.insert(Rc::as_ptr(iv) as usize) {
            out.push(iv.clone());
        }
    }
    collect_all(node.left.as_deref(), seen, out);
    collect_all(node.right.as_deref(), seen, out);
}

/// Collects every overlapping interval, pruning subtrees whose `span` cannot overlap
/// `query` and deduplicating by reference identity (the same interval may legitimately
/// be recorded in several nodes' `less`/`equal`/`greater` sets along its placement path).
fn collect_overlaps<K: Ord + Clone>(
    node: Option<&IbsNode<K>>,
    query: &Interval<K>,
    seen: &mut StdHashSet<usize>,
    out: &mut Vec<IntervalRef<K>>,
) {
    let Some(node) = node else { return };
    if !node.span.as_ref().is_some_and(|span| Interval::overlaps(span, query)) {
        return;
    }
    for iv in node.all_local() {
        if iv.overlaps_with(query) && seen.insert(Rc::as_ptr(iv) as usize) {
            out.push(iv.clone());
        }
    }
    collect_overlaps(node.left.as_deref(), query, seen, out);
    collect_overlaps(node.right.as_deref(), query, seen, out);
}

#[cfg(test)]
mod test {
    use super::*;

    fn iv(low: i32, high: i32) -> IntervalRef<i32> {
        Rc::new(Interval::closed(low, high))
    }

    #[test]
    fn scenario_s2_depth_and_overlap_then_removal() {
        let mut tree = IntervalBinarySearchTree::new();
        let a = iv(0, 10);
        let b = iv(2, 4);
        let c = iv(5, 6);
        let d = iv(7, 9);
        for x in [&a, &b, &c, &d] {
            assert!(tree.add(x.clone()).unwrap());
        }

        assert_eq!(tree.maximum_depth(), 2);

        let found: std::collections::HashSet<_> = tree
            .find_overlaps(&Interval::open(3, 5))
            .map(|iv| (iv.low, iv.high))
            .collect();
        assert_eq!(found, [(0, 10), (2, 4)].into_iter().collect());

        assert!(tree.remove(&a).unwrap());
        assert_eq!(tree.maximum_depth(), 1);
        assert_eq!(tree.count_overlaps(&Interval::point(10)), 0);
    }

    #[test]
    fn duplicate_reference_insert_is_rejected() {
        let mut tree = IntervalBinarySearchTree::new();
        let a = iv(1, 2);
        assert!(tree.add(a.clone()).unwrap());
        assert!(!tree.add(a.clone()).unwrap());
        assert_eq!(tree.count(), 1);
    }

    #[test]
    fn span_tracks_inserted_and_removed_bounds() {
        let mut tree = IntervalBinarySearchTree::new();
        let wide = iv(-5, 100);
        let narrow = iv(0, 1);
        tree.add(wide.clone()).unwrap();
        tree.add(narrow.clone()).unwrap();
        assert_eq!(tree.span().unwrap(), Interval::closed(-5, 100));
        tree.remove(&wide).unwrap();
        assert_eq!(tree.span().unwrap(), Interval::closed(0, 1));
    }

    #[test]
    fn empty_tree_reports_errors() {
        let tree: IntervalBinarySearchTree<i32> = IntervalBinarySearchTree::new();
        assert!(tree.span().is_err());
        assert!(tree.choose().is_err());
        assert_eq!(tree.maximum_depth(), 0);
    }
}
