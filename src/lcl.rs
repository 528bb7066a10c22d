//! Component H: the Layered Containment List (§4.H), a flat, array-based static index
//! built once from a batch, exploiting strict-containment depth to answer overlap
//! queries without ever touching a node pointer.

use crate::collection::IntervalCollection;
use crate::error::{EmptyCollectionError, ReadOnlyError};
use crate::interval::{compare_to, union_spans, Interval, IntervalRef};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// An immutable, layered index: layer 0 holds the outermost (least-contained)
/// intervals, layer ℓ holds intervals strictly contained by at least one interval in
/// every shallower layer. Overlap queries narrow a `[lower, upper)` window per layer
/// using the previous layer's pointer array, never touching layers that can't contribute.
pub struct LayeredContainmentList<K: Ord + Clone> {
    interval_layers: Vec<Vec<IntervalRef<K>>>,
    /// `pointer_layers[l][i]` is the index in `interval_layers[l+1]` of the first interval
    /// strictly contained in `interval_layers[l][i]`; each layer's array carries a trailing
    /// sentinel equal to the length of the next layer.
    pointer_layers: Vec<Vec<usize>>,
    count: u32,
    span: Option<Interval<K>>,
    maximum_overlap: u32,
}

impl<K: Ord + Clone> LayeredContainmentList<K> {
    /// Builds the list from `intervals`, sorting them once by `compare_to` and then
    /// assigning each to the shallowest layer whose last interval doesn't already reach
    /// past it.
    pub fn build(mut intervals: Vec<IntervalRef<K>>) -> Self {
        intervals.sort_by(|a, b| compare_to(a, b));
        let count = intervals.len() as u32;

        let mut interval_layers: Vec<Vec<IntervalRef<K>>> = Vec::new();
        let mut last_in_layer: Vec<IntervalRef<K>> = Vec::new();

        for iv in intervals {
            // The shallowest layer whose last-placed interval no longer reaches as far as
            // `iv` (i.e. doesn't strictly contain it); `last_in_layer`'s highs are
            // non-increasing by construction, so this is a clean prefix/suffix split.
            let layer = last_in_layer.partition_point(|last| Interval::compare_high(last, &iv) != Ordering::Less);
            if layer == interval_layers.len() {
                interval_layers.push(Vec::new());
                last_in_layer.push(iv.clone());
            } else {
                last_in_layer[layer] = iv.clone();
            }
            interval_layers[layer].push(iv);
        }

        let layer_count = interval_layers.len();
        let mut pointer_layers = vec![Vec::new(); layer_count];
        for layer in 0..layer_count {
            let next_len = interval_layers.get(layer + 1).map_or(0, |next| next.len());
            let mut next_cursor = 0usize;
            for interval in &interval_layers[layer] {
                pointer_layers[layer].push(next_cursor);
                if let Some(next) = interval_layers.get(layer + 1) {
                    while next_cursor < next.len() && Interval::strictly_contains(interval, &next[next_cursor]) {
                        next_cursor += 1;
                    }
                }
            }
            pointer_layers[layer].push(next_len.max(next_cursor));
        }

        let maximum_overlap = compute_maximum_overlap(&interval_layers);
        // Every deeper-layer interval is strictly contained in some layer-0 interval
        // (the build invariant), so layer 0 alone already bounds the whole collection.
        let span = union_spans(interval_layers.first().into_iter().flatten().map(|iv| iv.as_ref()));

        Self {
            interval_layers,
            pointer_layers,
            count,
            span,
            maximum_overlap,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.interval_layers.len()
    }

    pub fn layer(&self, index: usize) -> &[IntervalRef<K>] {
        &self.interval_layers[index]
    }

    /// The largest number of stored intervals simultaneously overlapping any point.
    pub fn maximum_overlap(&self) -> u32 {
        self.maximum_overlap
    }

    /// Every overlapping interval, in the collection's global `compare_to` order.
    pub fn find_overlaps_sorted<'a>(&'a self, query: &Interval<K>) -> impl Iterator<Item = IntervalRef<K>> + 'a {
        let mut found = self.find_overlaps(query).collect::<Vec<_>>();
        found.sort_by(|a, b| compare_to(a, b));
        found.into_iter()
    }

    /// §6's `from_iter` lifecycle operation: builds from any iterable.
    pub fn from_iter(intervals: impl IntoIterator<Item = IntervalRef<K>>) -> Self {
        Self::build(intervals.into_iter().collect())
    }
}

/// Single sorted pass feeding a min-heap keyed on `high`: push each interval, pop while
/// the heap's smallest `high` precedes the current interval's `low`, and track the
/// largest heap size seen. Operates directly on the already-sorted layers by merging
/// them back into global order via their shared `compare_to` ordering.
fn compute_maximum_overlap<K: Ord + Clone>(interval_layers: &[Vec<IntervalRef<K>>]) -> u32 {
    struct ByHigh<K>(IntervalRef<K>);
    impl<K: Ord> Ord for ByHigh<K> {
        fn cmp(&self, other: &Self) -> Ordering {
            other.0.high.cmp(&self.0.high)
        }
    }
    impl<K: Ord> PartialOrd for ByHigh<K> {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    impl<K: Ord> PartialEq for ByHigh<K> {
        fn eq(&self, other: &Self) -> bool {
            self.0.high == other.0.high
        }
    }
    impl<K: Ord> Eq for ByHigh<K> {}

    let mut all: Vec<&IntervalRef<K>> = interval_layers.iter().flatten().collect();
    all.sort_by(|a, b| compare_to(a, b));

    let mut heap: BinaryHeap<ByHigh<K>> = BinaryHeap::new();
    let mut best = 0usize;
    for iv in all {
        while let Some(top) = heap.peek() {
            if Interval::compare_high_low(&top.0, iv) == Ordering::Less {
                heap.pop();
            } else {
                break;
            }
        }
        heap.push(ByHigh(iv.clone()));
        best = best.max(heap.len());
    }
    best as u32
}

impl<K: Ord + Clone> IntervalCollection<K> for LayeredContainmentList<K> {
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
        self.interval_layers
            .first()
            .and_then(|layer| layer.first())
            .cloned()
            .ok_or(EmptyCollectionError)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_> {
        Box::new(self.interval_layers.iter().flatten().cloned())
    }

    fn find_overlaps(&self, query: &Interval<K>) -> Box<dyn Iterator<Item = IntervalRef<K>> + '_> {
        if self.interval_layers.is_empty() {
            return Box::new(std::iter::empty());
        }
        let mut out = Vec::new();
        let mut window = 0..self.interval_layers[0].len();
        for layer in 0..self.interval_layers.len() {
            if window.is_empty() {
                break;
            }
            let (first, last) = match overlap_bounds(&self.interval_layers[layer], window.clone(), query) {
                Some(bounds) => bounds,
                None => break,
            };
            for interval in &self.interval_layers[layer][first..last] {
                out.push(interval.clone());
            }
            let next_start = self.pointer_layers[layer][first];
            let next_end = self.pointer_layers[layer][last];
            window = next_start..next_end;
        }
        Box::new(out.into_iter())
    }
}

/// Locates `[first, last)` within `window` such that every interval in that slice
/// overlaps `query`, via two binary searches over the ascending-by-`low` (and,
/// within ties, ascending-by-`high`) layer order.
fn overlap_bounds<K: Ord + Clone>(
    layer: &[IntervalRef<K>],
    window: std::ops::Range<usize>,
    query: &Interval<K>,
) -> Option<(usize, usize)> {
    let slice = &layer[window.clone()];
    let first_offset = slice.partition_point(|iv| Interval::compare_high_low(iv, query) == Ordering::Less);
    let last_offset = slice.partition_point(|iv| Interval::compare_high_low(query, iv) != Ordering::Less);
    if first_offset >= last_offset {
        return None;
    }
    Some((window.start + first_offset, window.start + last_offset))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::rc::Rc;

    fn iv(low: i32, high: i32) -> IntervalRef<i32> {
        Rc::new(Interval::closed(low, high))
    }

    #[test]
    fn scenario_s3_layer_shape_and_query() {
        let intervals = vec![iv(1, 20), iv(2, 5), iv(6, 19), iv(7, 10), iv(11, 18)];
        let lcl = LayeredContainmentList::build(intervals);

        assert_eq!(lcl.layer_count(), 3);
        let layer0: Vec<_> = lcl.layer(0).iter().map(|iv| (iv.low, iv.high)).collect();
        assert_eq!(layer0, vec![(1, 20)]);
        let layer1: Vec<_> = lcl.layer(1).iter().map(|iv| (iv.low, iv.high)).collect();
        assert_eq!(layer1, vec![(2, 5), (6, 19)]);
        let layer2: Vec<_> = lcl.layer(2).iter().map(|iv| (iv.low, iv.high)).collect();
        assert_eq!(layer2, vec![(7, 10), (11, 18)]);

        let found: Vec<_> = lcl
            .find_overlaps(&Interval::closed(8, 12))
            .map(|iv| (iv.low, iv.high))
            .collect();
        assert_eq!(found, vec![(1, 20), (6, 19), (7, 10), (11, 18)]);
    }

    #[test]
    fn find_overlaps_sorted_matches_global_order() {
        let intervals = vec![iv(1, 20), iv(2, 5), iv(6, 19), iv(7, 10), iv(11, 18)];
        let lcl = LayeredContainmentList::build(intervals);
        let sorted: Vec<_> = lcl
            .find_overlaps_sorted(&Interval::closed(8, 12))
            .map(|iv| (iv.low, iv.high))
            .collect();
        assert_eq!(sorted, vec![(1, 20), (6, 19), (7, 10), (11, 18)]);
    }

    #[test]
    fn read_only_mutation_fails() {
        let mut lcl = LayeredContainmentList::build(vec![iv(1, 2)]);
        assert!(lcl.add(iv(3, 4)).is_err());
        assert!(lcl.remove(&iv(1, 2)).is_err());
        assert!(lcl.clear().is_err());
    }

    #[test]
    fn maximum_overlap_matches_brute_force_peak() {
        let intervals = vec![iv(1, 5), iv(3, 7), iv(6, 8), iv(10, 12)];
        let lcl = LayeredContainmentList::build(intervals);
        assert_eq!(lcl.maximum_overlap(), 2);
    }

    #[test]
    fn empty_batch_reports_empty_collection_errors() {
        let lcl: LayeredContainmentList<i32> = LayeredContainmentList::build(Vec::new());
        assert!(lcl.is_empty());
        assert!(lcl.span().is_err());
        assert!(lcl.choose().is_err());
        assert_eq!(lcl.maximum_overlap(), 0);
    }
}
