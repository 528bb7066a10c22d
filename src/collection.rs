//! The shared interval-collection capability (§6): the handful of operations every
//! index variant exposes, whether it is mutable (DIT, IBS) or built once and frozen
//! (SIT, LCL).

use crate::error::{EmptyCollectionError, ReadOnlyError};
use crate::interval::{Interval, IntervalRef};

/// Common surface implemented by [`crate::dit::DynamicIntervalTree`],
/// [`crate::ibs::IntervalBinarySearchTree`], [`crate::sit::StaticIntervalTree`] and
/// [`crate::lcl::LayeredContainmentList`].
///
/// Read-only structures still implement `add`/`remove`/`clear` (per §6) but every call
/// returns [`ReadOnlyError`].
pub trait IntervalCollection<K: Ord> {
    /// Number of stored intervals, counted by identity (reference duplicates count twice).
    fn count(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether this structure allows the same interval value to be stored under two
    /// distinct references. Always `true` for SIT/LCL (unused, since they never mutate);
    /// settable at construction for the DIT; always `false` for the IBS.
    fn allows_reference_duplicates(&self) -> bool;

    fn add(&mut self, interval: IntervalRef<K>) -> Result<bool, ReadOnlyError>;

    /// Adds every interval in `intervals`, stopping at the first rejection.
    ///
    /// Returns the number of intervals actually added. For the mutable variants this
    /// always equals `intervals.len()` (each `add` can only fail by being called on a
    /// read-only structure, which never happens here); for SIT/LCL it returns `0` along
    /// with a [`ReadOnlyError`] on the very first item.
    fn add_all(
        &mut self,
        intervals: impl IntoIterator<Item = IntervalRef<K>>,
    ) -> Result<u32, ReadOnlyError> {
        let mut added = 0;
        for interval in intervals {
            if self.add(interval)? {
                added += 1;
            }
        }
        Ok(added)
    }

    fn remove(&mut self, interval: &IntervalRef<K>) -> Result<bool, ReadOnlyError>;

    fn clear(&mut self) -> Result<(), ReadOnlyError>;

    /// The smallest interval covering every stored interval.
    fn span(&self) -> Result<Interval<K>, EmptyCollectionError>;

    /// An arbitrary stored interval.
    fn choose(&self) -> Result<IntervalRef<K>, EmptyCollectionError>;

    /// All stored intervals, in no particular order.
    fn iter(&self) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_>;

    /// Every stored interval overlapping `query`.
    fn find_overlaps(&self, query: &Interval<K>) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_>;

    /// Every stored interval containing `point`.
    fn find_overlaps_at(&self, point: K) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_>
    where
        K: Clone,
    {
        self.find_overlaps(&Interval::point(point))
    }

    /// Appends every overlapping interval to `out`, returning whether any were found.
    fn find_overlap(&self, query: &Interval<K>, out: &mut Vec<IntervalRef<K>>) -> bool {
        let mut found_any = false;
        for interval in self.find_overlaps(query) {
            out.push(interval);
            found_any = true;
        }
        found_any
    }

    /// The number of stored intervals overlapping `query`, without materializing them.
    fn count_overlaps(&self, query: &Interval<K>) -> u32 {
        self.find_overlaps(query).count() as u32
    }
}
