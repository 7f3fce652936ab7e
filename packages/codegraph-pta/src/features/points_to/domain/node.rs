//! Constraint graph nodes
//!
//! Two families of variables share one dense ID space:
//! - **Value variables**: top-level pointers and temporaries
//! - **Object variables**: abstract memory (stack, heap, global, function) and
//!   the field sub-objects derived from them by constant-offset GEPs
//!
//! IDs are allocated by the owning graph and stay valid for its whole lifetime.
//! A node merged into an SCC representative keeps its ID; lookups are redirected
//! through the representative table.

use serde::{Deserialize, Serialize};

/// Dense node identifier (index into the graph arena)
pub type NodeId = u32;

/// Value variable with an empty points-to set
pub const NULL_PTR: NodeId = 0;

/// Sentinel object for unknown/unmodeled memory
pub const BLACK_HOLE: NodeId = 1;

/// Constant/null object
pub const CONSTANT_OBJ: NodeId = 2;

/// Value variable pointing to [`BLACK_HOLE`]
pub const BLK_PTR: NodeId = 3;

/// Number of reserved node IDs created with every graph
pub const RESERVED_NODES: u32 = 4;

/// Kind of memory an object variable models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Stack,
    Heap,
    Global,
    Function,
    BlackHole,
    Constant,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Stack => "stack",
            ObjectKind::Heap => "heap",
            ObjectKind::Global => "global",
            ObjectKind::Function => "function",
            ObjectKind::BlackHole => "blackhole",
            ObjectKind::Constant => "constant",
        }
    }
}

/// Static memory-model metadata for a base object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Memory kind
    pub kind: ObjectKind,

    /// Number of fields used to reduce GEP offsets (0 = unknown, no reduction)
    pub num_fields: u32,

    /// Whether the object is modeled as a single undifferentiated blob
    pub field_insensitive: bool,
}

impl ObjectMeta {
    #[inline]
    pub fn new(kind: ObjectKind, num_fields: u32) -> Self {
        Self {
            kind,
            num_fields,
            field_insensitive: false,
        }
    }

    /// Stack object with `num_fields` fields
    #[inline]
    pub fn stack(num_fields: u32) -> Self {
        Self::new(ObjectKind::Stack, num_fields)
    }

    /// Heap allocation site
    #[inline]
    pub fn heap(num_fields: u32) -> Self {
        Self::new(ObjectKind::Heap, num_fields)
    }

    /// Global variable
    #[inline]
    pub fn global(num_fields: u32) -> Self {
        Self::new(ObjectKind::Global, num_fields)
    }

    /// Function object (target of function pointers)
    #[inline]
    pub fn function() -> Self {
        Self {
            kind: ObjectKind::Function,
            num_fields: 0,
            field_insensitive: true,
        }
    }

    /// Builder: start out field-insensitive
    #[inline]
    pub fn flat(mut self) -> Self {
        self.field_insensitive = true;
        self
    }
}

/// Node variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Top-level pointer variable
    Value,

    /// Base abstract object
    Object(ObjectMeta),

    /// Field sub-object of `base` at a constant offset
    Field { base: NodeId, offset: u32 },
}

/// A node in the constraint graph
#[derive(Debug, Clone)]
pub struct ConstraintNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Display name for logs
    pub name: Option<Box<str>>,
}

impl ConstraintNode {
    pub fn new(id: NodeId, kind: NodeKind, name: Option<&str>) -> Self {
        Self {
            id,
            kind,
            name: name.map(Into::into),
        }
    }

    #[inline]
    pub fn is_value(&self) -> bool {
        matches!(self.kind, NodeKind::Value)
    }

    /// Base objects and field sub-objects
    #[inline]
    pub fn is_object(&self) -> bool {
        !self.is_value()
    }

    #[inline]
    pub fn is_field(&self) -> bool {
        matches!(self.kind, NodeKind::Field { .. })
    }

    /// Base object of this node (itself for base objects and values)
    #[inline]
    pub fn base(&self) -> NodeId {
        match self.kind {
            NodeKind::Field { base, .. } => base,
            _ => self.id,
        }
    }

    /// Field offset relative to the base (0 for base objects)
    #[inline]
    pub fn offset(&self) -> u32 {
        match self.kind {
            NodeKind::Field { offset, .. } => offset,
            _ => 0,
        }
    }

    /// Label used in log output
    pub fn label(&self) -> String {
        match (&self.name, &self.kind) {
            (Some(name), _) => name.to_string(),
            (None, NodeKind::Field { base, offset }) => format!("obj{}.f{}", base, offset),
            (None, NodeKind::Object(_)) => format!("obj{}", self.id),
            (None, NodeKind::Value) => format!("v{}", self.id),
        }
    }
}
