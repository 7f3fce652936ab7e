//! Constraint edges
//!
//! Six edge kinds encode Andersen inclusion constraints:
//! - ADDR:    p = &o        → o ∈ pts(p)           (src = p, dst = o)
//! - COPY:    b = a         → pts(b) ⊇ pts(a)
//! - GEP:     b = &a->f     → field f of pts(a) ⊆ pts(b)
//! - LOAD:    b = *a        → ∀o ∈ pts(a): pts(b) ⊇ pts(o)
//! - STORE:   *b = a        → ∀o ∈ pts(b): pts(o) ⊇ pts(a)
//!
//! Copy and Gep are *direct* edges (no dereference); Load and Store are
//! *indirect* and only take effect through the current points-to sets.

use super::call_site::CallSiteId;
use super::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into the graph's edge arena
pub type EdgeId = u32;

/// Edge kind (Gep offset is part of the kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Addr,
    Copy,
    NormalGep { offset: u32 },
    VariantGep,
    Load,
    Store,
}

/// Coarse classification used for traversal filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeClass {
    Addr,
    /// Copy and Gep
    Direct,
    /// Load and Store
    Indirect,
}

impl EdgeKind {
    #[inline]
    pub fn class(&self) -> EdgeClass {
        match self {
            EdgeKind::Addr => EdgeClass::Addr,
            EdgeKind::Copy | EdgeKind::NormalGep { .. } | EdgeKind::VariantGep => {
                EdgeClass::Direct
            }
            EdgeKind::Load | EdgeKind::Store => EdgeClass::Indirect,
        }
    }

    #[inline]
    pub fn is_gep(&self) -> bool {
        matches!(self, EdgeKind::NormalGep { .. } | EdgeKind::VariantGep)
    }

    /// A Gep that can grow offsets around a cycle (variant or non-zero offset)
    #[inline]
    pub fn is_critical_gep(&self) -> bool {
        match self {
            EdgeKind::NormalGep { offset } => *offset != 0,
            EdgeKind::VariantGep => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Addr => "ADDR",
            EdgeKind::Copy => "COPY",
            EdgeKind::NormalGep { .. } => "NORMAL_GEP",
            EdgeKind::VariantGep => "VARIANT_GEP",
            EdgeKind::Load => "LOAD",
            EdgeKind::Store => "STORE",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::NormalGep { offset } => write!(f, "NORMAL_GEP({})", offset),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Uniqueness key of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: EdgeKind,
}

/// A directed constraint edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintEdge {
    pub id: EdgeId,
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: EdgeKind,
    /// Set on parameter/return copies created by call resolution
    pub call_site: Option<CallSiteId>,
}

impl ConstraintEdge {
    #[inline]
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            src: self.src,
            dst: self.dst,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_classes() {
        assert_eq!(EdgeKind::Addr.class(), EdgeClass::Addr);
        assert_eq!(EdgeKind::Copy.class(), EdgeClass::Direct);
        assert_eq!(EdgeKind::VariantGep.class(), EdgeClass::Direct);
        assert_eq!(EdgeKind::NormalGep { offset: 3 }.class(), EdgeClass::Direct);
        assert_eq!(EdgeKind::Load.class(), EdgeClass::Indirect);
        assert_eq!(EdgeKind::Store.class(), EdgeClass::Indirect);
    }

    #[test]
    fn test_critical_gep() {
        assert!(!EdgeKind::NormalGep { offset: 0 }.is_critical_gep());
        assert!(EdgeKind::NormalGep { offset: 1 }.is_critical_gep());
        assert!(EdgeKind::VariantGep.is_critical_gep());
        assert!(!EdgeKind::Copy.is_critical_gep());
    }

    #[test]
    fn test_display_includes_offset() {
        assert_eq!(EdgeKind::NormalGep { offset: 4 }.to_string(), "NORMAL_GEP(4)");
        assert_eq!(EdgeKind::Load.to_string(), "LOAD");
    }
}
