//! Generic AVL rotation machinery shared by the dynamic interval tree (E) and the
//! interval binary search tree (F).
//!
//! Both trees key nodes on an endpoint and need the same left/right rotations and the
//! same rebalance-on-insert/rebalance-on-delete shape; what differs between them is the
//! per-node payload (span + MNO counters for the DIT, additionally the `less`/`equal`/`greater`
//! sets for the IBS) and how that payload is repaired after a rotation. [`AvlNode::refresh`]
//! is the structure-specific hook: it is always invoked on the rotated child first and then
//! on the rotated parent, bottom-up, matching the order their subtrees actually changed.

/// A tree node that can be rotated generically.
///
/// Implementors store only one child pointer ownership at a time (standard `Option<Box<Self>>`
/// child links) and keep a cached `height` used purely for balancing; [`refresh`](AvlNode::refresh)
/// is responsible for recomputing that height alongside any other subtree aggregate.
pub(crate) trait AvlNode: Sized {
    fn height(&self) -> i32;
    fn left_height(&self) -> i32;
    fn right_height(&self) -> i32;
    fn take_left(&mut self) -> Option<Box<Self>>;
    fn take_right(&mut self) -> Option<Box<Self>>;
    fn set_left(&mut self, child: Option<Box<Self>>);
    fn set_right(&mut self, child: Option<Box<Self>>);

    /// Recomputes every aggregate this node caches (height, span, MNO, ...) from its
    /// current children. Must be idempotent and must not look past direct children.
    fn refresh(&mut self);
}

pub(crate) fn height_of<N: AvlNode>(node: &Option<Box<N>>) -> i32 {
    node.as_ref().map_or(0, |n| n.height())
}

/// `right_height - left_height`, per the universal AVL invariant in the testable
/// properties: a balanced node always has this in `{-1, 0, 1}`.
pub(crate) fn balance_factor<N: AvlNode>(node: &N) -> i32 {
    node.right_height() - node.left_height()
}

/// Single left rotation: `node`'s right child becomes the new subtree root, `node`
/// becomes its left child. Panics if `node` has no right child.
pub(crate) fn rotate_left<N: AvlNode>(mut node: Box<N>) -> Box<N> {
    let mut new_root = node
        .take_right()
        .expect("rotate_left requires a right child");
    let crossing_over = new_root.take_left();
    node.set_right(crossing_over);
    node.refresh();
    new_root.set_left(Some(node));
    new_root.refresh();
    new_root
}

/// Single right rotation, the mirror of [`rotate_left`].
pub(crate) fn rotate_right<N: AvlNode>(mut node: Box<N>) -> Box<N> {
    let mut new_root = node
        .take_left()
        .expect("rotate_right requires a left child");
    let crossing_over = new_root.take_right();
    node.set_left(crossing_over);
    node.refresh();
    new_root.set_right(Some(node));
    new_root.refresh();
    new_root
}

/// Restores the AVL invariant at `node` if its children's heights differ by more than
/// one, performing the double-rotation case (rotating the heavy child first) where
/// needed, and returns the subtree's (possibly new) root.
///
/// Assumes `node`'s own height is already stale (the caller just mutated a child); the
/// rotation helpers refresh it as part of rebalancing.
pub(crate) fn rebalance<N: AvlNode>(mut node: Box<N>) -> Box<N> {
    let factor = balance_factor(&*node);
    if factor > 1 {
        let mut right = node.take_right().expect("positive balance implies a right child");
        if balance_factor(&*right) < 0 {
            right = rotate_right(right);
        }
        node.set_right(Some(right));
        node.refresh();
        rotate_left(node)
    } else if factor < -1 {
        let mut left = node.take_left().expect("negative balance implies a left child");
        if balance_factor(&*left) > 0 {
            left = rotate_left(left);
        }
        node.set_left(Some(left));
        node.refresh();
        rotate_right(node)
    } else {
        node
    }
}
