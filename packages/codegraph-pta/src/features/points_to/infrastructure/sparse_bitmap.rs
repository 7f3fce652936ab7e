//! Sparse Bitmap for Points-to Sets
//!
//! Sorted-vector set with a small unsorted insertion buffer:
//! - **Deferred sorting**: O(1) amortized insert, batch merge on consolidation
//! - **Change reporting**: every mutating operation tells whether the set grew,
//!   which is what drives the solver's worklist
//!
//! # Performance Characteristics
//! - Insert: O(1) amortized
//! - Contains: O(log n) + O(pending)
//! - Union / Intersection / Difference: O(n + m) merge
//!
//! # References
//! - Briggs & Torczon "Efficient Implementation of Set Operations"
//! - Hardekopf & Lin "Semi-sparse Flow-Sensitive Pointer Analysis" (POPL 2009)

use std::cmp::Ordering;
use std::fmt;

/// Auto-consolidate when pending buffer exceeds this
const PENDING_BUFFER_THRESHOLD: usize = 16;

/// Sparse set of `u32` with deferred sorting
#[derive(Clone, Default)]
pub struct SparseBitmap {
    /// Sorted, deduplicated elements
    elements: Vec<u32>,

    /// Unsorted insertions, disjoint from `elements`
    pending: Vec<u32>,
}

/// Points-to set of node IDs
pub type PointsTo = SparseBitmap;

impl SparseBitmap {
    /// Shared empty set
    pub const EMPTY: SparseBitmap = SparseBitmap {
        elements: Vec::new(),
        pending: Vec::new(),
    };

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn singleton(element: u32) -> Self {
        Self {
            elements: vec![element],
            pending: Vec::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Internal: Consolidation (Deferred Sorting)
    // ═══════════════════════════════════════════════════════════════════════

    fn consolidate(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.pending.sort_unstable();
        if self.elements.is_empty() {
            std::mem::swap(&mut self.elements, &mut self.pending);
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        self.elements = merge_sorted(&self.elements, &pending);
    }

    /// Sorted view of `other` without mutating it
    fn sorted_elements(other: &SparseBitmap) -> std::borrow::Cow<'_, [u32]> {
        if other.pending.is_empty() {
            std::borrow::Cow::Borrowed(&other.elements)
        } else {
            let mut pending = other.pending.clone();
            pending.sort_unstable();
            std::borrow::Cow::Owned(merge_sorted(&other.elements, &pending))
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Basic Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert an element. Returns true if it was not present.
    #[inline]
    pub fn insert(&mut self, element: u32) -> bool {
        if self.elements.binary_search(&element).is_ok() || self.pending.contains(&element) {
            return false;
        }
        self.pending.push(element);
        if self.pending.len() >= PENDING_BUFFER_THRESHOLD {
            self.consolidate();
        }
        true
    }

    #[inline]
    pub fn contains(&self, element: u32) -> bool {
        self.pending.contains(&element) || self.elements.binary_search(&element).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len() + self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.pending.is_empty()
    }

    /// Remove every element
    #[inline]
    pub fn clear(&mut self) {
        self.elements.clear();
        self.pending.clear();
    }

    /// Iterate in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        MergedIterator::new(&self.elements, &self.pending)
    }

    /// Smallest element
    #[inline]
    pub fn first(&self) -> Option<u32> {
        let sorted = self.elements.first().copied();
        let pending = self.pending.iter().copied().min();
        match (sorted, pending) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Set Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// self = self ∪ other. Returns true if self grew.
    pub fn union_with(&mut self, other: &SparseBitmap) -> bool {
        if other.is_empty() {
            return false;
        }
        self.consolidate();
        let other_elements = Self::sorted_elements(other);
        if self.elements.is_empty() {
            self.elements = other_elements.into_owned();
            return true;
        }
        let before = self.elements.len();
        self.elements = merge_sorted(&self.elements, &other_elements);
        self.elements.len() > before
    }

    /// self = self ∩ other
    pub fn intersect_with(&mut self, other: &SparseBitmap) {
        self.consolidate();
        if self.is_empty() {
            return;
        }
        if other.is_empty() {
            self.elements.clear();
            return;
        }
        let other_elements = Self::sorted_elements(other);
        let mut result = Vec::with_capacity(self.elements.len().min(other_elements.len()));
        let (mut i, mut j) = (0, 0);
        while i < self.elements.len() && j < other_elements.len() {
            match self.elements[i].cmp(&other_elements[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    result.push(self.elements[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        self.elements = result;
    }

    /// self = self \ other
    pub fn difference_with(&mut self, other: &SparseBitmap) {
        self.consolidate();
        if self.is_empty() || other.is_empty() {
            return;
        }
        let other_elements = Self::sorted_elements(other);
        let mut j = 0;
        self.elements.retain(|elem| {
            while j < other_elements.len() && other_elements[j] < *elem {
                j += 1;
            }
            !(j < other_elements.len() && other_elements[j] == *elem)
        });
    }

    /// self \ other as a new set
    pub fn difference(&self, other: &SparseBitmap) -> SparseBitmap {
        let mut result = self.clone();
        result.difference_with(other);
        result
    }

    /// Check if the sets share an element
    pub fn intersects(&self, other: &SparseBitmap) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|e| large.contains(e))
    }

    pub fn is_subset_of(&self, other: &SparseBitmap) -> bool {
        self.len() <= other.len() && self.iter().all(|e| other.contains(e))
    }
}

impl PartialEq for SparseBitmap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for SparseBitmap {}

impl fmt::Debug for SparseBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<u32> for SparseBitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut elements: Vec<u32> = iter.into_iter().collect();
        elements.sort_unstable();
        elements.dedup();
        Self {
            elements,
            pending: Vec::new(),
        }
    }
}

impl Extend<u32> for SparseBitmap {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for e in iter {
            self.insert(e);
        }
    }
}

fn merge_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                merged.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                merged.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                merged.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    merged
}

/// Iterator that merges sorted and pending elements
struct MergedIterator<'a> {
    sorted: std::iter::Peekable<std::slice::Iter<'a, u32>>,
    pending_sorted: Vec<u32>,
    pending_idx: usize,
}

impl<'a> MergedIterator<'a> {
    fn new(sorted: &'a [u32], pending: &[u32]) -> Self {
        let mut pending_sorted = pending.to_vec();
        pending_sorted.sort_unstable();
        Self {
            sorted: sorted.iter().peekable(),
            pending_sorted,
            pending_idx: 0,
        }
    }
}

impl<'a> Iterator for MergedIterator<'a> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let pending_next = self.pending_sorted.get(self.pending_idx).copied();
        match (self.sorted.peek().copied().copied(), pending_next) {
            (Some(s), Some(p)) if s < p => {
                self.sorted.next();
                Some(s)
            }
            (_, Some(p)) => {
                self.pending_idx += 1;
                Some(p)
            }
            (Some(s), None) => {
                self.sorted.next();
                Some(s)
            }
            (None, None) => None,
        }
    }
}
