//! Input constraints
//!
//! The IR builder describes a program as a stream of `(src, dst, kind)` triples.
//! Each triple becomes one constraint edge:
//! - ADDR:  p = &o      → o ∈ pts(p)
//! - COPY:  b = a       → pts(b) ⊇ pts(a)
//! - LOAD:  b = *a      → pts(b) ⊇ *a
//! - STORE: *b = a      → *b ⊇ pts(a)
//! - GEP:   b = &a->k   → pts(b) ⊇ {o.k | o ∈ pts(a)}

use super::edge::EdgeKind;
use super::node::NodeId;
use serde::{Deserialize, Serialize};

/// A single constraint triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: EdgeKind,
    pub src: NodeId,
    pub dst: NodeId,
}

impl Constraint {
    /// p = &o
    #[inline]
    pub fn addr(pointer: NodeId, object: NodeId) -> Self {
        Self {
            kind: EdgeKind::Addr,
            src: pointer,
            dst: object,
        }
    }

    /// dst = src
    #[inline]
    pub fn copy(src: NodeId, dst: NodeId) -> Self {
        Self {
            kind: EdgeKind::Copy,
            src,
            dst,
        }
    }

    /// dst = *pointer
    #[inline]
    pub fn load(pointer: NodeId, dst: NodeId) -> Self {
        Self {
            kind: EdgeKind::Load,
            src: pointer,
            dst,
        }
    }

    /// *pointer = src
    #[inline]
    pub fn store(src: NodeId, pointer: NodeId) -> Self {
        Self {
            kind: EdgeKind::Store,
            src,
            dst: pointer,
        }
    }

    /// dst = &src->field[offset]
    #[inline]
    pub fn normal_gep(src: NodeId, dst: NodeId, offset: u32) -> Self {
        Self {
            kind: EdgeKind::NormalGep { offset },
            src,
            dst,
        }
    }

    /// dst = &src[i] with a non-constant index
    #[inline]
    pub fn variant_gep(src: NodeId, dst: NodeId) -> Self {
        Self {
            kind: EdgeKind::VariantGep,
            src,
            dst,
        }
    }

    /// Gep from builder metadata; missing offset degrades to a variant gep
    #[inline]
    pub fn gep(src: NodeId, dst: NodeId, offset: Option<u32>) -> Self {
        match offset {
            Some(offset) => Self::normal_gep(src, dst, offset),
            None => Self::variant_gep(src, dst),
        }
    }

    /// Check if this is a LOAD or STORE
    #[inline]
    pub fn is_complex(&self) -> bool {
        matches!(self.kind, EdgeKind::Load | EdgeKind::Store)
    }
}

/// Constraint set with statistics
#[derive(Debug, Default, Clone)]
pub struct ConstraintSet {
    pub constraints: Vec<Constraint>,

    pub addr_count: usize,
    pub copy_count: usize,
    pub gep_count: usize,
    pub load_count: usize,
    pub store_count: usize,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            constraints: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    /// Add a constraint and update statistics
    pub fn add(&mut self, constraint: Constraint) {
        match constraint.kind {
            EdgeKind::Addr => self.addr_count += 1,
            EdgeKind::Copy => self.copy_count += 1,
            EdgeKind::NormalGep { .. } | EdgeKind::VariantGep => self.gep_count += 1,
            EdgeKind::Load => self.load_count += 1,
            EdgeKind::Store => self.store_count += 1,
        }
        self.constraints.push(constraint);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    /// Number of LOAD/STORE constraints
    pub fn complex_count(&self) -> usize {
        self.load_count + self.store_count
    }
}

impl FromIterator<Constraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut set = ConstraintSet::new();
        for c in iter {
            set.add(c);
        }
        set
    }
}
