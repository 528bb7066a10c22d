//! Node payload and endpoint-BST mechanics for the interval binary search tree.

use crate::avl::{self, height_of, AvlNode};
use crate::interval::{union_spans, Interval, IntervalRef};
use crate::reference_set::ReferenceSet;
use std::cmp::Ordering;

pub(crate) struct IbsNode<K> {
    pub(crate) key: K,
    height: i32,
    pub(crate) left: Option<Box<IbsNode<K>>>,
    pub(crate) right: Option<Box<IbsNode<K>>>,
    less: ReferenceSet<K>,
    equal: ReferenceSet<K>,
    greater: ReferenceSet<K>,
    intervals_ending_in_node: ReferenceSet<K>,
    local_span: Option<Interval<K>>,
    pub(crate) span: Option<Interval<K>>,
    delta_at: i32,
    delta_after: i32,
    pub(crate) sum: i32,
    pub(crate) max: i32,
}

/// Where `key` falls relative to `interval`, per the Hanson placement rule (§3.4): a key
/// inside the interval is `Equal`; a key at or before an excluded low (or strictly before
/// the low) is `Greater` (the interval's covered points lie above it); everything else is
/// `Less`.
enum Region {
    Less,
    Equal,
    Greater,
}

fn classify<K: Ord>(key: &K, interval: &Interval<K>) -> Region {
    if interval.contains_point(key) {
        Region::Equal
    } else if *key <= interval.low {
        Region::Greater
    } else {
        Region::Less
    }
}

impl<K: Ord + Clone> IbsNode<K> {
    fn new(key: K) -> Self {
        Self {
            key,
            height: 1,
            left: None,
            right: None,
            less: ReferenceSet::new(),
            equal: ReferenceSet::new(),
            greater: ReferenceSet::new(),
            intervals_ending_in_node: ReferenceSet::new(),
            local_span: None,
            span: None,
            delta_at: 0,
            delta_after: 0,
            sum: 0,
            max: 0,
        }
    }

    fn is_empty_payload(&self) -> bool {
        self.intervals_ending_in_node.is_empty()
    }

    /// The widest interval anchored with `low == key`, scanning `intervals_ending_in_node`
    /// (every interval touching this key, by either endpoint) for the low-rooted subset;
    /// mirrors the dynamic tree's `local_span`, since every interval's low-keyed node is
    /// exactly the node that should contribute its true `high` to the global span.
    fn recompute_local_span(&mut self) {
        let low_rooted: Vec<&IntervalRef<K>> = self
            .intervals_ending_in_node
            .iter()
            .filter(|iv| iv.low == self.key)
            .collect();
        self.local_span = low_rooted
            .iter()
            .max_by(|a, b| Interval::compare_high(a, b))
            .map(|widest| {
                let low_included = low_rooted.iter().any(|iv| iv.low_included);
                Interval::new_unchecked(self.key.clone(), widest.high.clone(), low_included, widest.high_included)
            });
    }

    fn update_span(&mut self) {
        let children = [
            self.left.as_deref().and_then(|n| n.span.as_ref()),
            self.right.as_deref().and_then(|n| n.span.as_ref()),
        ];
        self.span = union_spans(self.local_span.iter().chain(children.into_iter().flatten()));
    }

    fn update_mno(&mut self) {
        let (left_sum, left_max) = self.left.as_deref().map_or((0, 0), |n| (n.sum, n.max));
        let (right_sum, right_max) = self.right.as_deref().map_or((0, 0), |n| (n.sum, n.max));
        self.sum = left_sum + self.delta_at + self.delta_after + right_sum;
        self.max = [
            left_max,
            left_sum + self.delta_at,
            left_sum + self.delta_at + self.delta_after,
            left_sum + self.delta_at + self.delta_after + right_max,
        ]
        .into_iter()
        .max()
        .unwrap();
    }

    /// All intervals this node carries, across every membership set, without duplicates
    /// when the same reference happens to be recorded twice (identity union).
    pub(crate) fn all_local(&self) -> impl Iterator<Item = &IntervalRef<K>> {
        self.less
            .iter()
            .chain(self.equal.iter())
            .chain(self.greater.iter())
            .chain(self.intervals_ending_in_node.iter())
    }

    pub(crate) fn ends_here(&self) -> impl Iterator<Item = &IntervalRef<K>> {
        self.intervals_ending_in_node.iter()
    }
}

impl<K: Ord + Clone> AvlNode for IbsNode<K> {
    fn height(&self) -> i32 {
        self.height
    }

    fn left_height(&self) -> i32 {
        height_of(&self.left)
    }

    fn right_height(&self) -> i32 {
        height_of(&self.right)
    }

    fn take_left(&mut self) -> Option<Box<Self>> {
        self.left.take()
    }

    fn take_right(&mut self) -> Option<Box<Self>> {
        self.right.take()
    }

    fn set_left(&mut self, child: Option<Box<Self>>) {
        self.left = child;
    }

    fn set_right(&mut self, child: Option<Box<Self>>) {
        self.right = child;
    }

    fn refresh(&mut self) {
        self.height = 1 + self.left_height().max(self.right_height());
        self.recompute_local_span();
        self.update_span();
        self.update_mno();
    }
}

/// Moves `p.greater` upward into the newly-promoted `c`, then reclassifies the window
/// that changed hands, per the left-rotation rule in §4.F. Must run before the structural
/// rotation swaps `p` and `c`'s roles.
fn rebucket_left<K: Ord + Clone>(
    p_less: &mut ReferenceSet<K>,
    p_equal: &mut ReferenceSet<K>,
    p_greater: &mut ReferenceSet<K>,
    c: &mut IbsNode<K>,
) {
    c.greater.union_with(p_greater);
    c.equal.union_with(p_greater);
    let moving: Vec<_> = c.less.iter().filter(|iv| !p_greater.contains(iv)).cloned().collect();
    for iv in moving {
        c.less.remove(&iv);
        p_greater.add(iv);
    }
    let still_in_c_less: Vec<_> = c.less.iter().cloned().collect();
    for iv in &still_in_c_less {
        p_equal.remove(iv);
        p_less.remove(iv);
    }
}

/// Mirror of [`rebucket_left`] for a right rotation.
fn rebucket_right<K: Ord + Clone>(
    p_less: &mut ReferenceSet<K>,
    p_equal: &mut ReferenceSet<K>,
    p_greater: &mut ReferenceSet<K>,
    c: &mut IbsNode<K>,
) {
    c.less.union_with(p_less);
    c.equal.union_with(p_less);
    let moving: Vec<_> = c.greater.iter().filter(|iv| !p_less.contains(iv)).cloned().collect();
    for iv in moving {
        c.greater.remove(&iv);
        p_less.add(iv);
    }
    let still_in_c_greater: Vec<_> = c.greater.iter().cloned().collect();
    for iv in &still_in_c_greater {
        p_equal.remove(iv);
        p_greater.remove(iv);
    }
}

pub(crate) fn rotate_left_with_rebucket<K: Ord + Clone>(mut node: Box<IbsNode<K>>) -> Box<IbsNode<K>> {
    {
        let IbsNode {
            less, equal, greater, right, ..
        } = &mut *node;
        let c = right.as_deref_mut().expect("rotate_left requires a right child");
        rebucket_left(less, equal, greater, c);
    }
    avl::rotate_left(node)
}

pub(crate) fn rotate_right_with_rebucket<K: Ord + Clone>(mut node: Box<IbsNode<K>>) -> Box<IbsNode<K>> {
    {
        let IbsNode {
            less, equal, greater, left, ..
        } = &mut *node;
        let c = left.as_deref_mut().expect("rotate_right requires a left child");
        rebucket_right(less, equal, greater, c);
    }
    avl::rotate_right(node)
}

/// Rebalances exactly like [`avl::rebalance`] but routes through the rebucketing rotations.
pub(crate) fn rebalance<K: Ord + Clone>(mut node: Box<IbsNode<K>>) -> Box<IbsNode<K>> {
    let factor = avl::balance_factor(&*node);
    if factor > 1 {
        let mut right = node.take_right().expect("positive balance implies a right child");
        if avl::balance_factor(&*right) < 0 {
            right = rotate_right_with_rebucket(right);
        }
        node.set_right(Some(right));
        node.refresh();
        rotate_left_with_rebucket(node)
    } else if factor < -1 {
        let mut left = node.take_left().expect("negative balance implies a left child");
        if avl::balance_factor(&*left) > 0 {
            left = rotate_left_with_rebucket(left);
        }
        node.set_left(Some(left));
        node.refresh();
        rotate_right_with_rebucket(node)
    } else {
        node
    }
}

/// Ensures a node keyed on `key` exists, creating it (with AVL rebalancing) if missing.
/// Does not touch any interval-specific payload.
pub(crate) fn ensure_node<K: Ord + Clone>(node: Option<Box<IbsNode<K>>>, key: &K) -> Box<IbsNode<K>> {
    let mut node = match node {
        Some(node) => node,
        None => return Box::new(IbsNode::new(key.clone())),
    };
    match key.cmp(&node.key) {
        Ordering::Less => node.left = Some(ensure_node(node.left.take(), key)),
        Ordering::Greater => node.right = Some(ensure_node(node.right.take(), key)),
        Ordering::Equal => {}
    }
    node.refresh();
    rebalance(node)
}

/// Walks from `node` placing `interval` into exactly one of `less`/`equal`/`greater` at
/// every node whose window it still covers, per the recursive rule in §4.F.
pub(crate) fn place<K: Ord + Clone>(node: &mut IbsNode<K>, interval: &IntervalRef<K>) {
    match classify(&node.key, interval) {
        Region::Equal => {
            node.equal.add(interval.clone());
            if node.key > interval.low {
                if let Some(left) = node.left.as_deref_mut() {
                    place(left, interval);
                }
            }
            if node.key < interval.high {
                if let Some(right) = node.right.as_deref_mut() {
                    place(right, interval);
                }
            }
        }
        Region::Greater => {
            node.greater.add(interval.clone());
            if let Some(right) = node.right.as_deref_mut() {
                place(right, interval);
            }
        }
        Region::Less => {
            node.less.add(interval.clone());
            if let Some(left) = node.left.as_deref_mut() {
                place(left, interval);
            }
        }
    }
}

/// Mirror of [`place`] for removal: undoes the same membership placement.
pub(crate) fn unplace<K: Ord + Clone>(node: &mut IbsNode<K>, interval: &IntervalRef<K>) {
    match classify(&node.key, interval) {
        Region::Equal => {
            node.equal.remove(interval);
            if node.key > interval.low {
                if let Some(left) = node.left.as_deref_mut() {
                    unplace(left, interval);
                }
            }
            if node.key < interval.high {
                if let Some(right) = node.right.as_deref_mut() {
                    unplace(right, interval);
                }
            }
        }
        Region::Greater => {
            node.greater.remove(interval);
            if let Some(right) = node.right.as_deref_mut() {
                unplace(right, interval);
            }
        }
        Region::Less => {
            node.less.remove(interval);
            if let Some(left) = node.left.as_deref_mut() {
                unplace(left, interval);
            }
        }
    }
}

/// Records `interval` as ending at the node keyed on `key` (one of `interval.low`,
/// `interval.high`) and bumps the MNO delta there.
pub(crate) fn record_endpoint<K: Ord + Clone>(node: &mut IbsNode<K>, key: &K, interval: &IntervalRef<K>, is_low: bool) {
    match key.cmp(&node.key) {
        Ordering::Less => record_endpoint(node.left.as_deref_mut().expect("endpoint node must exist"), key, interval, is_low),
        Ordering::Greater => record_endpoint(node.right.as_deref_mut().expect("endpoint node must exist"), key, interval, is_low),
        Ordering::Equal => {
            node.intervals_ending_in_node.add(interval.clone());
            if is_low {
                if interval.low_included {
                    node.delta_at += 1;
                } else {
                    node.delta_after += 1;
                }
            } else if interval.high_included {
                node.delta_after -= 1;
            } else {
                node.delta_at -= 1;
            }
        }
    }
}

/// Mirror of [`record_endpoint`] for removal.
pub(crate) fn unrecord_endpoint<K: Ord + Clone>(node: &mut IbsNode<K>, key: &K, interval: &IntervalRef<K>, is_low: bool) {
    match key.cmp(&node.key) {
        Ordering::Less => unrecord_endpoint(node.left.as_deref_mut().expect("endpoint node must exist"), key, interval, is_low),
        Ordering::Greater => unrecord_endpoint(node.right.as_deref_mut().expect("endpoint node must exist"), key, interval, is_low),
        Ordering::Equal => {
            node.intervals_ending_in_node.remove(interval);
            if is_low {
                if interval.low_included {
                    node.delta_at -= 1;
                } else {
                    node.delta_after -= 1;
                }
            } else if interval.high_included {
                node.delta_after += 1;
            } else {
                node.delta_at += 1;
            }
        }
    }
}

/// Refreshes height/span/MNO bottom-up along the path to `key`, without rebalancing
/// (no structural change happened, only leaf payload at `key` and set memberships along
/// the way, which do not feed into aggregates).
pub(crate) fn refresh_path<K: Ord + Clone>(mut node: Box<IbsNode<K>>, key: &K) -> Box<IbsNode<K>> {
    match key.cmp(&node.key) {
        Ordering::Less => {
            if let Some(left) = node.left.take() {
                node.left = Some(refresh_path(left, key));
            }
        }
        Ordering::Greater => {
            if let Some(right) = node.right.take() {
                node.right = Some(refresh_path(right, key));
            }
        }
        Ordering::Equal => {}
    }
    node.refresh();
    node
}

struct Extracted<K> {
    key: K,
    less: ReferenceSet<K>,
    equal: ReferenceSet<K>,
    greater: ReferenceSet<K>,
    intervals_ending_in_node: ReferenceSet<K>,
    local_span: Option<Interval<K>>,
    delta_at: i32,
    delta_after: i32,
}

fn extract_min<K: Ord + Clone>(node: Box<IbsNode<K>>) -> (Option<Box<IbsNode<K>>>, Extracted<K>) {
    let mut node = node;
    if let Some(left) = node.left.take() {
        let (new_left, extracted) = extract_min(left);
        node.left = new_left;
        node.refresh();
        (Some(rebalance(node)), extracted)
    } else {
        let IbsNode {
            right,
            key,
            less,
            equal,
            greater,
            intervals_ending_in_node,
            local_span,
            delta_at,
            delta_after,
            ..
        } = *node;
        (
            right,
            Extracted {
                key,
                less,
                equal,
                greater,
                intervals_ending_in_node,
                local_span,
                delta_at,
                delta_after,
            },
        )
    }
}

/// Removes the node keyed on `key` if it no longer carries any interval, splicing it out
/// with the standard two-children successor swap (payload fields only, not child links).
pub(crate) fn remove_node_if_empty<K: Ord + Clone>(node: Option<Box<IbsNode<K>>>, key: &K) -> Option<Box<IbsNode<K>>> {
    let mut node = node?;
    match key.cmp(&node.key) {
        Ordering::Less => {
            node.left = remove_node_if_empty(node.left.take(), key);
            node.refresh();
            Some(rebalance(node))
        }
        Ordering::Greater => {
            node.right = remove_node_if_empty(node.right.take(), key);
            node.refresh();
            Some(rebalance(node))
        }
        Ordering::Equal => {
            if !node.is_empty_payload() {
                node.refresh();
                return Some(rebalance(node));
            }
            match (node.left.take(), node.right.take()) {
                (None, None) => None,
                (Some(child), None) => Some(child),
                (None, Some(child)) => Some(child),
                (Some(left), Some(right)) => {
                    let (right, successor) = extract_min(right);
                    node.key = successor.key;
                    node.less = successor.less;
                    node.equal = successor.equal;
                    node.greater = successor.greater;
                    node.intervals_ending_in_node = successor.intervals_ending_in_node;
                    node.local_span = successor.local_span;
                    node.delta_at = successor.delta_at;
                    node.delta_after = successor.delta_after;
                    node.left = Some(left);
                    node.right = right;
                    node.refresh();
                    Some(rebalance(node))
                }
            }
        }
    }
}

pub(crate) fn find_node<'a, K: Ord>(mut current: Option<&'a IbsNode<K>>, key: &K) -> Option<&'a IbsNode<K>> {
    while let Some(node) = current {
        current = match key.cmp(&node.key) {
            Ordering::Less => node.left.as_deref(),
            Ordering::Greater => node.right.as_deref(),
            Ordering::Equal => return Some(node),
        };
    }
    None
}
