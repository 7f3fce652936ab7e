//! Call sites and function signatures
//!
//! A call instruction is identified by a builder-assigned [`CallInstId`]. Every
//! resolved `(call instruction, callee)` pair gets its own [`CallSiteId`], which tags
//! the parameter and return copies created for that pair.

use super::node::NodeId;
use serde::{Deserialize, Serialize};

/// Builder-assigned call instruction ID
pub type CallInstId = u32;

/// ID of a resolved (call instruction, callee) pair
pub type CallSiteId = u32;

/// Formal interface of a function object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    /// Formal parameter value nodes
    pub formals: Vec<NodeId>,
    /// Formal return value node
    pub ret: Option<NodeId>,
    /// Value node receiving variadic arguments
    pub vararg: Option<NodeId>,
    /// External allocator whose return is fresh heap memory
    pub heap_allocator: bool,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_formals(mut self, formals: impl IntoIterator<Item = NodeId>) -> Self {
        self.formals = formals.into_iter().collect();
        self
    }

    pub fn with_ret(mut self, ret: NodeId) -> Self {
        self.ret = Some(ret);
        self
    }

    pub fn with_vararg(mut self, vararg: NodeId) -> Self {
        self.vararg = Some(vararg);
        self
    }

    pub fn heap_allocator(mut self) -> Self {
        self.heap_allocator = true;
        self
    }

    #[inline]
    pub fn is_variadic(&self) -> bool {
        self.vararg.is_some()
    }

    /// Whether a call with `num_args` actual arguments can target this function
    #[inline]
    pub fn accepts(&self, num_args: usize) -> bool {
        self.is_variadic() || self.formals.len() == num_args
    }
}

/// Call through a function pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectCallSite {
    pub id: CallInstId,
    /// Function object containing the call
    pub caller: Option<NodeId>,
    /// Value holding the called function pointer
    pub target: NodeId,
    pub args: Vec<NodeId>,
    pub ret: Option<NodeId>,
}

impl IndirectCallSite {
    pub fn new(id: CallInstId, target: NodeId) -> Self {
        Self {
            id,
            caller: None,
            target,
            args: Vec::new(),
            ret: None,
        }
    }

    pub fn with_caller(mut self, caller: NodeId) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = NodeId>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    pub fn with_ret(mut self, ret: NodeId) -> Self {
        self.ret = Some(ret);
        self
    }
}

/// Call with a statically known callee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectCallSite {
    pub id: CallInstId,
    pub caller: Option<NodeId>,
    pub callee: NodeId,
    pub args: Vec<NodeId>,
    pub ret: Option<NodeId>,
}

impl DirectCallSite {
    pub fn new(id: CallInstId, callee: NodeId) -> Self {
        Self {
            id,
            caller: None,
            callee,
            args: Vec::new(),
            ret: None,
        }
    }

    pub fn with_caller(mut self, caller: NodeId) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = NodeId>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    pub fn with_ret(mut self, ret: NodeId) -> Self {
        self.ret = Some(ret);
        self
    }
}

/// Spawn flavor of a thread site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForkKind {
    /// pthread_create-style fork
    Fork,
    /// Parallel-for region executing the routine on many threads
    ParallelFor,
}

/// Thread spawn site; `routine` holds the start-routine pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkSite {
    pub id: CallInstId,
    pub caller: Option<NodeId>,
    pub routine: NodeId,
    pub arg: Option<NodeId>,
    /// Pointer to the thread handle written by the spawn
    pub thread_handle: Option<NodeId>,
    pub kind: ForkKind,
}

impl ForkSite {
    pub fn fork(id: CallInstId, routine: NodeId) -> Self {
        Self {
            id,
            caller: None,
            routine,
            arg: None,
            thread_handle: None,
            kind: ForkKind::Fork,
        }
    }

    pub fn parallel_for(id: CallInstId, routine: NodeId) -> Self {
        Self {
            kind: ForkKind::ParallelFor,
            ..Self::fork(id, routine)
        }
    }

    pub fn with_caller(mut self, caller: NodeId) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_arg(mut self, arg: NodeId) -> Self {
        self.arg = Some(arg);
        self
    }

    pub fn with_thread_handle(mut self, handle: NodeId) -> Self {
        self.thread_handle = Some(handle);
        self
    }
}

/// Thread join site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSite {
    pub id: CallInstId,
    pub caller: Option<NodeId>,
    pub thread_handle: NodeId,
}

impl JoinSite {
    pub fn new(id: CallInstId, thread_handle: NodeId) -> Self {
        Self {
            id,
            caller: None,
            thread_handle,
        }
    }

    pub fn with_caller(mut self, caller: NodeId) -> Self {
        self.caller = Some(caller);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_arity() {
        let fixed = FunctionSignature::new("f").with_formals([10, 11]);
        assert!(fixed.accepts(2));
        assert!(!fixed.accepts(3));

        let variadic = FunctionSignature::new("printf")
            .with_formals([10])
            .with_vararg(12);
        assert!(variadic.accepts(1));
        assert!(variadic.accepts(5));
    }

    #[test]
    fn test_parallel_for_site() {
        let site = ForkSite::parallel_for(3, 40).with_arg(41);
        assert_eq!(site.kind, ForkKind::ParallelFor);
        assert_eq!(site.arg, Some(41));
        assert_eq!(site.thread_handle, None);
    }
}
