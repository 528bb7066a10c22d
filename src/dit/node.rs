//! The dynamic interval tree's node payload and the low/high descents that maintain it.

use crate::avl::{self, height_of, AvlNode};
use crate::endpoint_list::EndpointOrderedList;
use crate::interval::{union_spans, Interval, IntervalRef};
use std::cmp::Ordering;

pub(crate) struct DitNode<K> {
    pub(crate) key: K,
    height: i32,
    pub(crate) left: Option<Box<DitNode<K>>>,
    pub(crate) right: Option<Box<DitNode<K>>>,
    /// Intervals whose `low == key` and `low_included == true`.
    included_list: EndpointOrderedList<K>,
    /// Intervals whose `low == key` and `low_included == false`.
    excluded_list: EndpointOrderedList<K>,
    pub(crate) local_span: Option<Interval<K>>,
    pub(crate) span: Option<Interval<K>>,
    delta_at: i32,
    delta_after: i32,
    pub(crate) sum: i32,
    pub(crate) max: i32,
}

impl<K: Ord + Clone> DitNode<K> {
    fn new(key: K) -> Self {
        Self {
            key,
            height: 1,
            left: None,
            right: None,
            included_list: EndpointOrderedList::new(),
            excluded_list: EndpointOrderedList::new(),
            local_span: None,
            span: None,
            delta_at: 0,
            delta_after: 0,
            sum: 0,
            max: 0,
        }
    }

    fn is_empty_payload(&self) -> bool {
        self.delta_at == 0
            && self.delta_after == 0
            && self.included_list.is_empty()
            && self.excluded_list.is_empty()
    }

    fn recompute_local_span(&mut self) {
        let widest = self
            .included_list
            .iter()
            .chain(self.excluded_list.iter())
            .max_by(|a, b| Interval::compare_high(a, b));
        self.local_span = widest.map(|widest| {
            Interval::new_unchecked(
                self.key.clone(),
                widest.high.clone(),
                !self.included_list.is_empty(),
                widest.high_included,
            )
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
        let (left_sum, left_max) = self
            .left
            .as_deref()
            .map_or((0, 0), |n| (n.sum, n.max));
        let (right_sum, right_max) = self
            .right
            .as_deref()
            .map_or((0, 0), |n| (n.sum, n.max));
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

    /// Every interval recorded at this node, in no particular order.
    pub(crate) fn local_intervals(&self) -> impl Iterator<Item = &IntervalRef<K>> {
        self.included_list.iter().chain(self.excluded_list.iter())
    }
}

impl<K: Ord + Clone> AvlNode for DitNode<K> {
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
        self.update_span();
        self.update_mno();
    }
}

/// Descends by `interval.low`, recording it in the matching node's included/excluded list
/// and bumping the corresponding MNO delta; creates the node if no endpoint matches yet.
pub(crate) fn insert_low<K: Ord + Clone>(
    node: Option<Box<DitNode<K>>>,
    interval: &IntervalRef<K>,
) -> Box<DitNode<K>> {
    let mut node = node.unwrap_or_else(|| Box::new(DitNode::new(interval.low.clone())));
    match interval.low.cmp(&node.key) {
        Ordering::Less => node.left = Some(insert_low(node.left.take(), interval)),
        Ordering::Greater => node.right = Some(insert_low(node.right.take(), interval)),
        Ordering::Equal => {
            if interval.low_included {
                node.included_list.add(interval.clone());
                node.delta_at += 1;
            } else {
                node.excluded_list.add(interval.clone());
                node.delta_after += 1;
            }
            node.recompute_local_span();
        }
    }
    node.refresh();
    avl::rebalance(node)
}

/// Descends by `interval.high`, adjusting the MNO deltas of the matching node; creates
/// the node if no endpoint matches yet.
pub(crate) fn insert_high<K: Ord + Clone>(
    node: Option<Box<DitNode<K>>>,
    interval: &IntervalRef<K>,
) -> Box<DitNode<K>> {
    let mut node = node.unwrap_or_else(|| Box::new(DitNode::new(interval.high.clone())));
    match interval.high.cmp(&node.key) {
        Ordering::Less => node.left = Some(insert_high(node.left.take(), interval)),
        Ordering::Greater => node.right = Some(insert_high(node.right.take(), interval)),
        Ordering::Equal => {
            if interval.high_included {
                node.delta_after -= 1;
            } else {
                node.delta_at -= 1;
            }
        }
    }
    node.refresh();
    avl::rebalance(node)
}

pub(crate) fn remove_low<K: Ord + Clone>(
    node: Option<Box<DitNode<K>>>,
    interval: &IntervalRef<K>,
) -> Option<Box<DitNode<K>>> {
    let mut node = node?;
    match interval.low.cmp(&node.key) {
        Ordering::Less => {
            node.left = remove_low(node.left.take(), interval);
            node.refresh();
            Some(avl::rebalance(node))
        }
        Ordering::Greater => {
            node.right = remove_low(node.right.take(), interval);
            node.refresh();
            Some(avl::rebalance(node))
        }
        Ordering::Equal => {
            if interval.low_included {
                node.included_list.remove(interval);
                node.delta_at -= 1;
            } else {
                node.excluded_list.remove(interval);
                node.delta_after -= 1;
            }
            node.recompute_local_span();
            maybe_splice(node)
        }
    }
}

pub(crate) fn remove_high<K: Ord + Clone>(
    node: Option<Box<DitNode<K>>>,
    interval: &IntervalRef<K>,
) -> Option<Box<DitNode<K>>> {
    let mut node = node?;
    match interval.high.cmp(&node.key) {
        Ordering::Less => {
            node.left = remove_high(node.left.take(), interval);
            node.refresh();
            Some(avl::rebalance(node))
        }
        Ordering::Greater => {
            node.right = remove_high(node.right.take(), interval);
            node.refresh();
            Some(avl::rebalance(node))
        }
        Ordering::Equal => {
            if interval.high_included {
                node.delta_after += 1;
            } else {
                node.delta_at += 1;
            }
            maybe_splice(node)
        }
    }
}

/// Fields carried from an extracted in-order successor into the node it replaces.
struct Extracted<K> {
    key: K,
    included_list: EndpointOrderedList<K>,
    excluded_list: EndpointOrderedList<K>,
    local_span: Option<Interval<K>>,
    delta_at: i32,
    delta_after: i32,
}

fn extract_min<K: Ord + Clone>(node: Box<DitNode<K>>) -> (Option<Box<DitNode<K>>>, Extracted<K>) {
    let mut node = node;
    if let Some(left) = node.left.take() {
        let (new_left, extracted) = extract_min(left);
        node.left = new_left;
        node.refresh();
        (Some(avl::rebalance(node)), extracted)
    } else {
        let DitNode {
            right,
            key,
            included_list,
            excluded_list,
            local_span,
            delta_at,
            delta_after,
            ..
        } = *node;
        (
            right,
            Extracted {
                key,
                included_list,
                excluded_list,
                local_span,
                delta_at,
                delta_after,
            },
        )
    }
}

/// Splices `node` out of the tree if it no longer carries any payload, following the
/// standard two-children BST delete (swap with the in-order successor, copying only its
/// data fields, never its child links).
fn maybe_splice<K: Ord + Clone>(mut node: Box<DitNode<K>>) -> Option<Box<DitNode<K>>> {
    if !node.is_empty_payload() {
        node.refresh();
        return Some(avl::rebalance(node));
    }
    match (node.left.take(), node.right.take()) {
        (None, None) => None,
        (Some(child), None) => Some(child),
        (None, Some(child)) => Some(child),
        (Some(left), Some(right)) => {
            let (right, successor) = extract_min(right);
            node.key = successor.key;
            node.included_list = successor.included_list;
            node.excluded_list = successor.excluded_list;
            node.local_span = successor.local_span;
            node.delta_at = successor.delta_at;
            node.delta_after = successor.delta_after;
            node.left = Some(left);
            node.right = right;
            node.refresh();
            Some(avl::rebalance(node))
        }
    }
}

/// Read-only descent to the node keyed on `key`, if any.
pub(crate) fn find_node<'a, K: Ord>(
    mut current: Option<&'a DitNode<K>>,
    key: &K,
) -> Option<&'a DitNode<K>> {
    while let Some(node) = current {
        current = match key.cmp(&node.key) {
            Ordering::Less => node.left.as_deref(),
            Ordering::Greater => node.right.as_deref(),
            Ordering::Equal => return Some(node),
        };
    }
    None
}
