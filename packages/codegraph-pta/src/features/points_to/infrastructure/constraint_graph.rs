//! Constraint Graph
//!
//! Arena-owned directed multigraph of inclusion constraints:
//! - **Nodes** live in a dense `Vec`, indexed by [`NodeId`]
//! - **Edges** live in a tombstoned arena, indexed by [`EdgeId`], with a hashed
//!   `(src, dst, kind)` index for O(1) duplicate detection and existence queries
//! - **Per-node buckets**: separate in/out edge sets per kind for fast filtered
//!   iteration (copy, gep, load, store, addr)
//! - **Representative table**: SCC-merged nodes keep their IDs and are redirected
//! - **Field objects**: `(base, offset)` sub-objects created on demand by Gep
//!   resolution, with per-base field lists used by field collapse
//!
//! Every public mutation that takes IDs from outside validates them and returns a
//! [`GraphResult`]. Endpoints are resolved to their representatives before an edge
//! is inserted, so live edges always connect representatives.

use super::rep_table::RepTable;
use super::sparse_bitmap::SparseBitmap;
use crate::features::points_to::domain::{
    CallSiteId, ConstraintEdge, ConstraintGraphError, ConstraintNode, EdgeClass, EdgeId, EdgeKey,
    EdgeKind, GraphResult, NodeId, NodeKind, ObjectKind, ObjectMeta, BLACK_HOLE, BLK_PTR,
    CONSTANT_OBJ, NULL_PTR,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Default upper bound on tracked field offsets
pub const DEFAULT_MAX_FIELD_LIMIT: u32 = 512;

/// Edge bucket selector (Normal and Variant Gep share one bucket)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeBucket {
    Addr,
    Copy,
    Gep,
    Load,
    Store,
}

impl From<EdgeKind> for EdgeBucket {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Addr => EdgeBucket::Addr,
            EdgeKind::Copy => EdgeBucket::Copy,
            EdgeKind::NormalGep { .. } | EdgeKind::VariantGep => EdgeBucket::Gep,
            EdgeKind::Load => EdgeBucket::Load,
            EdgeKind::Store => EdgeBucket::Store,
        }
    }
}

/// Per-node edge sets, one per bucket
#[derive(Debug, Clone, Default)]
struct EdgeBuckets {
    addr: FxHashSet<EdgeId>,
    copy: FxHashSet<EdgeId>,
    gep: FxHashSet<EdgeId>,
    load: FxHashSet<EdgeId>,
    store: FxHashSet<EdgeId>,
}

impl EdgeBuckets {
    #[inline]
    fn get(&self, bucket: EdgeBucket) -> &FxHashSet<EdgeId> {
        match bucket {
            EdgeBucket::Addr => &self.addr,
            EdgeBucket::Copy => &self.copy,
            EdgeBucket::Gep => &self.gep,
            EdgeBucket::Load => &self.load,
            EdgeBucket::Store => &self.store,
        }
    }

    #[inline]
    fn get_mut(&mut self, bucket: EdgeBucket) -> &mut FxHashSet<EdgeId> {
        match bucket {
            EdgeBucket::Addr => &mut self.addr,
            EdgeBucket::Copy => &mut self.copy,
            EdgeBucket::Gep => &mut self.gep,
            EdgeBucket::Load => &mut self.load,
            EdgeBucket::Store => &mut self.store,
        }
    }

    /// All edge IDs, ascending
    fn all(&self) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self
            .addr
            .iter()
            .chain(&self.copy)
            .chain(&self.gep)
            .chain(&self.load)
            .chain(&self.store)
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    fn is_empty(&self) -> bool {
        self.addr.is_empty()
            && self.copy.is_empty()
            && self.gep.is_empty()
            && self.load.is_empty()
            && self.store.is_empty()
    }
}

/// Owning constraint graph
#[derive(Debug, Clone)]
pub struct ConstraintGraph {
    nodes: Vec<ConstraintNode>,
    in_edges: Vec<EdgeBuckets>,
    out_edges: Vec<EdgeBuckets>,

    /// Edge arena (None = removed)
    edges: Vec<Option<ConstraintEdge>>,
    edge_index: FxHashMap<EdgeKey, EdgeId>,

    reps: RepTable,
    pwc: FxHashSet<NodeId>,

    /// (base, offset) → field node
    gep_objs: FxHashMap<(NodeId, u32), NodeId>,
    /// base → field nodes created so far
    fields: FxHashMap<NodeId, Vec<NodeId>>,
    /// Bases made field-insensitive that still need their fields collapsed
    nodes_to_collapse: Vec<NodeId>,

    max_field_limit: u32,
    first_field_eq_base: bool,
}

impl Default for ConstraintGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintGraph {
    /// Create a graph holding only the reserved nodes
    pub fn new() -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            in_edges: Vec::new(),
            out_edges: Vec::new(),
            edges: Vec::new(),
            edge_index: FxHashMap::default(),
            reps: RepTable::new(),
            pwc: FxHashSet::default(),
            gep_objs: FxHashMap::default(),
            fields: FxHashMap::default(),
            nodes_to_collapse: Vec::new(),
            max_field_limit: DEFAULT_MAX_FIELD_LIMIT,
            first_field_eq_base: false,
        };

        let null = graph.push_node(NodeKind::Value, Some("null"));
        let black_hole = graph.push_node(
            NodeKind::Object(ObjectMeta::new(ObjectKind::BlackHole, 0).flat()),
            Some("blackhole"),
        );
        let constant = graph.push_node(
            NodeKind::Object(ObjectMeta::new(ObjectKind::Constant, 0).flat()),
            Some("constant"),
        );
        let blk_ptr = graph.push_node(NodeKind::Value, Some("blkptr"));
        debug_assert_eq!(
            [null, black_hole, constant, blk_ptr],
            [NULL_PTR, BLACK_HOLE, CONSTANT_OBJ, BLK_PTR]
        );

        // Unknown memory holds unknown pointers
        graph.attach(BLK_PTR, BLACK_HOLE, EdgeKind::Addr, None);
        graph.attach(BLACK_HOLE, BLACK_HOLE, EdgeKind::Addr, None);
        graph
    }

    /// Field-sensitivity knobs used by [`Self::gep_obj_node`]
    pub fn with_field_options(mut self, max_field_limit: u32, first_field_eq_base: bool) -> Self {
        self.max_field_limit = max_field_limit.max(1);
        self.first_field_eq_base = first_field_eq_base;
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Nodes
    // ═══════════════════════════════════════════════════════════════════════

    fn push_node(&mut self, kind: NodeKind, name: Option<&str>) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(ConstraintNode::new(id, kind, name));
        self.in_edges.push(EdgeBuckets::default());
        self.out_edges.push(EdgeBuckets::default());
        self.reps.make_set(id);
        id
    }

    /// Add a top-level pointer variable
    pub fn add_value(&mut self, name: Option<&str>) -> NodeId {
        self.push_node(NodeKind::Value, name)
    }

    /// Add a base object
    pub fn add_object(&mut self, name: Option<&str>, meta: ObjectMeta) -> NodeId {
        self.push_node(NodeKind::Object(meta), name)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn contains_node(&self, id: NodeId) -> bool {
        (id as usize) < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> GraphResult<&ConstraintNode> {
        self.nodes
            .get(id as usize)
            .ok_or(ConstraintGraphError::UnknownNode(id))
    }

    #[inline]
    pub fn get_node(&self, id: NodeId) -> Option<&ConstraintNode> {
        self.nodes.get(id as usize)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ConstraintNode> {
        self.nodes.iter()
    }

    /// Label for logging (falls back to the raw ID)
    pub fn label(&self, id: NodeId) -> String {
        self.get_node(id)
            .map_or_else(|| id.to_string(), ConstraintNode::label)
    }

    #[inline]
    pub fn is_value(&self, id: NodeId) -> bool {
        self.get_node(id).map_or(false, ConstraintNode::is_value)
    }

    #[inline]
    pub fn is_object(&self, id: NodeId) -> bool {
        self.get_node(id).map_or(false, ConstraintNode::is_object)
    }

    /// Base object of a field node; any other node is its own base
    #[inline]
    pub fn base_of(&self, id: NodeId) -> NodeId {
        self.get_node(id).map_or(id, ConstraintNode::base)
    }

    /// Memory-model metadata of the base object of `id`
    pub fn object_meta(&self, id: NodeId) -> Option<&ObjectMeta> {
        match self.get_node(self.base_of(id)).map(|n| &n.kind) {
            Some(NodeKind::Object(meta)) => Some(meta),
            _ => None,
        }
    }

    fn object_meta_mut(&mut self, id: NodeId) -> Option<&mut ObjectMeta> {
        let base = self.base_of(id);
        match self.nodes.get_mut(base as usize).map(|n| &mut n.kind) {
            Some(NodeKind::Object(meta)) => Some(meta),
            _ => None,
        }
    }

    #[inline]
    pub fn object_kind(&self, id: NodeId) -> Option<ObjectKind> {
        self.object_meta(id).map(|m| m.kind)
    }

    #[inline]
    pub fn is_function(&self, id: NodeId) -> bool {
        self.get_node(id).map_or(false, |n| !n.is_field())
            && self.object_kind(id) == Some(ObjectKind::Function)
    }

    #[inline]
    pub fn is_heap(&self, id: NodeId) -> bool {
        self.object_kind(id) == Some(ObjectKind::Heap)
    }

    #[inline]
    pub fn is_black_hole(&self, id: NodeId) -> bool {
        self.object_kind(id) == Some(ObjectKind::BlackHole)
    }

    #[inline]
    pub fn is_constant(&self, id: NodeId) -> bool {
        self.object_kind(id) == Some(ObjectKind::Constant)
    }

    #[inline]
    pub fn is_black_hole_or_constant(&self, id: NodeId) -> bool {
        matches!(
            self.object_kind(id),
            Some(ObjectKind::BlackHole | ObjectKind::Constant)
        )
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Field sensitivity
    // ═══════════════════════════════════════════════════════════════════════

    /// Whether the base object of `id` is modeled as a single blob
    #[inline]
    pub fn is_field_insensitive(&self, id: NodeId) -> bool {
        self.object_meta(id).map_or(false, |m| m.field_insensitive)
    }

    /// Flatten the base object of `id`. Returns true on the first call for a base.
    ///
    /// Later Gep accesses resolve to the base itself. Value nodes are ignored.
    pub fn set_obj_field_insensitive(&mut self, id: NodeId) -> bool {
        match self.object_meta_mut(id) {
            Some(meta) if !meta.field_insensitive => {
                meta.field_insensitive = true;
                true
            }
            _ => false,
        }
    }

    /// Field nodes created so far for `base`
    pub fn fields_of(&self, base: NodeId) -> &[NodeId] {
        self.fields.get(&base).map_or(&[], Vec::as_slice)
    }

    /// Queue a base whose fields must be merged into it
    pub fn add_node_to_collapse(&mut self, base: NodeId) {
        self.nodes_to_collapse.push(base);
    }

    /// Drain queued bases
    pub fn take_nodes_to_collapse(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.nodes_to_collapse)
    }

    /// Field sub-object of `obj` at `offset` relative to it, created on demand
    ///
    /// Offsets are accumulated from the base and reduced modulo the base's field
    /// count. Offsets beyond the field limit flatten the base. Field-insensitive
    /// bases (and the black-hole/constant objects) resolve to themselves.
    pub fn gep_obj_node(&mut self, obj: NodeId, offset: u32) -> GraphResult<NodeId> {
        let node = self.node(obj)?;
        if node.is_value() {
            return Err(ConstraintGraphError::ExpectedObject {
                node: obj,
                context: "gep object",
            });
        }
        let base = node.base();
        let current = node.offset();
        let meta = match self.object_meta(base) {
            Some(meta) => *meta,
            None => return Err(ConstraintGraphError::UnknownNode(base)),
        };
        if meta.field_insensitive {
            return Ok(base);
        }

        let mut field = current.saturating_add(offset);
        if meta.num_fields > 0 {
            field %= meta.num_fields;
        }
        if field >= self.max_field_limit {
            tracing::debug!(
                base = base,
                offset = field,
                limit = self.max_field_limit,
                "field offset over limit, collapsing object"
            );
            self.set_obj_field_insensitive(base);
            self.add_node_to_collapse(base);
            return Ok(base);
        }
        if field == 0 && self.first_field_eq_base {
            return Ok(base);
        }
        Ok(self.field_node(base, field))
    }

    /// Field node of a base object at an absolute offset, created on demand
    pub fn add_field_node(&mut self, base: NodeId, offset: u32) -> GraphResult<NodeId> {
        match self.node(base)?.kind {
            NodeKind::Object(_) => Ok(self.field_node(base, offset)),
            _ => Err(ConstraintGraphError::ExpectedObject {
                node: base,
                context: "field base",
            }),
        }
    }

    fn field_node(&mut self, base: NodeId, offset: u32) -> NodeId {
        if let Some(&id) = self.gep_objs.get(&(base, offset)) {
            return id;
        }
        let id = self.push_node(NodeKind::Field { base, offset }, None);
        self.gep_objs.insert((base, offset), id);
        self.fields.entry(base).or_default().push(id);
        id
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Edges
    // ═══════════════════════════════════════════════════════════════════════

    fn check_node(&self, id: NodeId) -> GraphResult<()> {
        if self.contains_node(id) {
            Ok(())
        } else {
            Err(ConstraintGraphError::UnknownNode(id))
        }
    }

    /// Validate endpoints for a new edge of `kind`
    fn check_edge(&self, src: NodeId, dst: NodeId, kind: EdgeKind) -> GraphResult<()> {
        self.check_node(src)?;
        self.check_node(dst)?;
        if kind == EdgeKind::Addr && !self.is_object(dst) {
            return Err(ConstraintGraphError::ExpectedObject {
                node: dst,
                context: "address-of target",
            });
        }
        Ok(())
    }

    /// Insert without validation; endpoints must be representatives
    fn attach(
        &mut self,
        src: NodeId,
        dst: NodeId,
        kind: EdgeKind,
        call_site: Option<CallSiteId>,
    ) -> Option<EdgeId> {
        if kind == EdgeKind::Copy && src == dst {
            return None;
        }
        let key = EdgeKey { src, dst, kind };
        if self.edge_index.contains_key(&key) {
            return None;
        }
        let id = self.edges.len() as EdgeId;
        self.edges.push(Some(ConstraintEdge {
            id,
            src,
            dst,
            kind,
            call_site,
        }));
        self.edge_index.insert(key, id);
        let bucket = EdgeBucket::from(kind);
        self.out_edges[src as usize].get_mut(bucket).insert(id);
        self.in_edges[dst as usize].get_mut(bucket).insert(id);
        Some(id)
    }

    fn detach(&mut self, id: EdgeId) -> Option<ConstraintEdge> {
        let edge = self.edges.get_mut(id as usize)?.take()?;
        self.edge_index.remove(&edge.key());
        let bucket = EdgeBucket::from(edge.kind);
        self.out_edges[edge.src as usize].get_mut(bucket).remove(&id);
        self.in_edges[edge.dst as usize].get_mut(bucket).remove(&id);
        Some(edge)
    }

    /// Insert an edge between the representatives of `src` and `dst`
    ///
    /// Returns `Ok(false)` for duplicates and copy self-loops.
    pub fn add_edge(&mut self, kind: EdgeKind, src: NodeId, dst: NodeId) -> GraphResult<bool> {
        self.add_tagged_edge(kind, src, dst, None)
    }

    fn add_tagged_edge(
        &mut self,
        kind: EdgeKind,
        src: NodeId,
        dst: NodeId,
        call_site: Option<CallSiteId>,
    ) -> GraphResult<bool> {
        self.check_edge(src, dst, kind)?;
        // Address edges name the object itself, not its SCC representative
        let (src, dst) = match kind {
            EdgeKind::Addr => (self.scc_rep_node(src), dst),
            _ => (self.scc_rep_node(src), self.scc_rep_node(dst)),
        };
        Ok(self.attach(src, dst, kind, call_site).is_some())
    }

    /// p = &o
    pub fn add_addr_edge(&mut self, pointer: NodeId, object: NodeId) -> GraphResult<bool> {
        self.add_edge(EdgeKind::Addr, pointer, object)
    }

    /// dst = src
    pub fn add_copy_edge(&mut self, src: NodeId, dst: NodeId) -> GraphResult<bool> {
        self.add_edge(EdgeKind::Copy, src, dst)
    }

    /// Copy tagged with the call site that created it
    pub fn add_call_copy_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        call_site: CallSiteId,
    ) -> GraphResult<bool> {
        self.add_tagged_edge(EdgeKind::Copy, src, dst, Some(call_site))
    }

    /// dst = *pointer
    pub fn add_load_edge(&mut self, pointer: NodeId, dst: NodeId) -> GraphResult<bool> {
        self.add_edge(EdgeKind::Load, pointer, dst)
    }

    /// *pointer = src
    pub fn add_store_edge(&mut self, src: NodeId, pointer: NodeId) -> GraphResult<bool> {
        self.add_edge(EdgeKind::Store, src, pointer)
    }

    pub fn add_normal_gep_edge(
        &mut self,
        src: NodeId,
        dst: NodeId,
        offset: u32,
    ) -> GraphResult<bool> {
        self.add_edge(EdgeKind::NormalGep { offset }, src, dst)
    }

    pub fn add_variant_gep_edge(&mut self, src: NodeId, dst: NodeId) -> GraphResult<bool> {
        self.add_edge(EdgeKind::VariantGep, src, dst)
    }

    /// Insert an edge the caller assumes to be new
    pub fn insert_unique_edge(
        &mut self,
        kind: EdgeKind,
        src: NodeId,
        dst: NodeId,
    ) -> GraphResult<EdgeId> {
        self.check_edge(src, dst, kind)?;
        let (rsrc, rdst) = (self.scc_rep_node(src), self.scc_rep_node(dst));
        let rdst = if kind == EdgeKind::Addr { dst } else { rdst };
        self.attach(rsrc, rdst, kind, None)
            .ok_or(ConstraintGraphError::DuplicateEdge { src, dst, kind })
    }

    /// Whether `(src, dst, kind)` exists (endpoints resolved to representatives)
    pub fn has_edge(&self, src: NodeId, dst: NodeId, kind: EdgeKind) -> bool {
        let src = self.scc_rep_node(src);
        let dst = if kind == EdgeKind::Addr {
            dst
        } else {
            self.scc_rep_node(dst)
        };
        self.edge_index.contains_key(&EdgeKey { src, dst, kind })
    }

    pub fn edge(&self, id: EdgeId) -> Option<&ConstraintEdge> {
        self.edges.get(id as usize).and_then(Option::as_ref)
    }

    pub fn find_edge(&self, src: NodeId, dst: NodeId, kind: EdgeKind) -> Option<&ConstraintEdge> {
        self.edge_index
            .get(&EdgeKey { src, dst, kind })
            .and_then(|&id| self.edge(id))
    }

    /// Live edges, in creation order
    pub fn edges(&self) -> impl Iterator<Item = &ConstraintEdge> {
        self.edges.iter().flatten()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    /// Number of live edges in a bucket
    pub fn count_edges(&self, bucket: EdgeBucket) -> usize {
        self.edges()
            .filter(|e| EdgeBucket::from(e.kind) == bucket)
            .count()
    }

    /// Outgoing edges of `node` in `bucket`
    pub fn out_edges(
        &self,
        node: NodeId,
        bucket: EdgeBucket,
    ) -> impl Iterator<Item = &ConstraintEdge> + '_ {
        self.bucket_edges(&self.out_edges, node, bucket)
    }

    /// Incoming edges of `node` in `bucket`
    pub fn in_edges(
        &self,
        node: NodeId,
        bucket: EdgeBucket,
    ) -> impl Iterator<Item = &ConstraintEdge> + '_ {
        self.bucket_edges(&self.in_edges, node, bucket)
    }

    fn bucket_edges<'a>(
        &'a self,
        side: &'a [EdgeBuckets],
        node: NodeId,
        bucket: EdgeBucket,
    ) -> impl Iterator<Item = &'a ConstraintEdge> + 'a {
        side.get(node as usize)
            .into_iter()
            .flat_map(move |b| b.get(bucket).iter())
            .filter_map(move |&id| self.edge(id))
    }

    /// Whether `node` has no incident edges
    pub fn is_isolated(&self, node: NodeId) -> bool {
        let idx = node as usize;
        self.in_edges.get(idx).map_or(true, EdgeBuckets::is_empty)
            && self.out_edges.get(idx).map_or(true, EdgeBuckets::is_empty)
    }

    /// Copy/Gep successors of a representative, resolved and sorted
    pub fn direct_successors(&self, node: NodeId) -> Vec<NodeId> {
        let mut succs: Vec<NodeId> = self
            .out_edges(node, EdgeBucket::Copy)
            .chain(self.out_edges(node, EdgeBucket::Gep))
            .map(|e| self.scc_rep_node(e.dst))
            .collect();
        succs.sort_unstable();
        succs.dedup();
        succs
    }

    /// Whether `node` carries a Gep self-loop that grows offsets (a PWC)
    pub fn has_critical_gep_self_loop(&self, node: NodeId) -> bool {
        self.out_edges(node, EdgeBucket::Gep)
            .any(|e| e.dst == node && e.kind.is_critical_gep())
    }

    /// All address edges as `(pointer, object)` pairs
    pub fn addr_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.edges()
            .filter(|e| e.kind == EdgeKind::Addr)
            .map(|e| (e.src, e.dst))
            .collect()
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> GraphResult<ConstraintEdge> {
        self.detach(id).ok_or(ConstraintGraphError::EdgeNotFound(id))
    }

    /// Rewire the source of an edge. Returns whether the rewired edge survived
    /// (it is dropped when it duplicates an existing edge or becomes a copy self-loop).
    pub fn re_target_src_of_edge(&mut self, id: EdgeId, new_src: NodeId) -> GraphResult<bool> {
        self.check_node(new_src)?;
        let edge = self.remove_edge(id)?;
        Ok(self.attach(new_src, edge.dst, edge.kind, edge.call_site).is_some())
    }

    /// Rewire the destination of an edge. See [`Self::re_target_src_of_edge`].
    pub fn re_target_dst_of_edge(&mut self, id: EdgeId, new_dst: NodeId) -> GraphResult<bool> {
        self.check_node(new_dst)?;
        let edge = self.remove_edge(id)?;
        Ok(self.attach(edge.src, new_dst, edge.kind, edge.call_site).is_some())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SCC merging
    // ═══════════════════════════════════════════════════════════════════════

    /// Move the incoming edges of `node` onto `rep`
    ///
    /// Edges from outside the SCC are retargeted. Internal Copy and zero-offset Gep
    /// edges are dropped; internal Load/Store edges and offset-growing Geps are kept
    /// as self-loops on `rep`. Address edges targeting `node` keep pointing at the
    /// object.
    /// Returns true if an internal edge was a Gep that grows offsets.
    pub fn move_in_edges_to_rep(&mut self, node: NodeId, rep: NodeId) -> bool {
        let Some(buckets) = self.in_edges.get(node as usize) else {
            return false;
        };
        let mut critical_gep = false;
        for id in buckets.all() {
            // Address edges name the object itself and stay on it
            if self.edge(id).map_or(true, |e| e.kind == EdgeKind::Addr) {
                continue;
            }
            let Some(edge) = self.detach(id) else {
                continue;
            };
            let internal = self.scc_rep_node(edge.src) == rep || edge.src == node;
            if !internal {
                self.attach(edge.src, rep, edge.kind, edge.call_site);
                continue;
            }
            match edge.kind.class() {
                EdgeClass::Indirect => {
                    self.attach(rep, rep, edge.kind, edge.call_site);
                }
                EdgeClass::Direct if edge.kind.is_critical_gep() => {
                    critical_gep = true;
                    self.attach(rep, rep, edge.kind, edge.call_site);
                }
                EdgeClass::Direct | EdgeClass::Addr => {}
            }
        }
        critical_gep
    }

    /// Move the outgoing edges of `node` onto `rep`. See [`Self::move_in_edges_to_rep`].
    pub fn move_out_edges_to_rep(&mut self, node: NodeId, rep: NodeId) -> bool {
        let Some(buckets) = self.out_edges.get(node as usize) else {
            return false;
        };
        let mut critical_gep = false;
        for id in buckets.all() {
            let Some(edge) = self.detach(id) else {
                continue;
            };
            // Address edges keep naming the object
            if edge.kind == EdgeKind::Addr {
                self.attach(rep, edge.dst, edge.kind, edge.call_site);
                continue;
            }
            let internal = self.scc_rep_node(edge.dst) == rep || edge.dst == node;
            if !internal {
                self.attach(rep, edge.dst, edge.kind, edge.call_site);
                continue;
            }
            match edge.kind.class() {
                EdgeClass::Indirect => {
                    self.attach(rep, rep, edge.kind, edge.call_site);
                }
                EdgeClass::Direct if edge.kind.is_critical_gep() => {
                    critical_gep = true;
                    self.attach(rep, rep, edge.kind, edge.call_site);
                }
                EdgeClass::Direct | EdgeClass::Addr => {}
            }
        }
        critical_gep
    }

    /// Move all edges of `node` onto `rep`; true if a critical Gep was internal
    pub fn move_edges_to_rep(&mut self, node: NodeId, rep: NodeId) -> bool {
        let gep_in = self.move_in_edges_to_rep(node, rep);
        let gep_out = self.move_out_edges_to_rep(node, rep);
        gep_in || gep_out
    }

    /// Record `node` (and its sub-nodes) as collapsed into `rep`
    ///
    /// A PWC flag on `node` moves to `rep`.
    pub fn merge_rep(&mut self, node: NodeId, rep: NodeId) -> bool {
        let (node, rep) = (self.scc_rep_node(node), self.scc_rep_node(rep));
        if !self.reps.merge(node, rep) {
            return false;
        }
        if self.pwc.remove(&node) {
            self.pwc.insert(rep);
        }
        true
    }

    #[inline]
    pub fn scc_rep_node(&self, id: NodeId) -> NodeId {
        self.reps.find(id)
    }

    /// Nodes collapsed into the class of `id`, representative included
    pub fn scc_sub_nodes(&self, id: NodeId) -> SparseBitmap {
        self.reps.sub_nodes(id)
    }

    #[inline]
    pub fn is_rep(&self, id: NodeId) -> bool {
        self.reps.is_rep(id)
    }

    /// Current representatives, ascending
    pub fn rep_nodes(&self) -> Vec<NodeId> {
        (0..self.nodes.len() as NodeId)
            .filter(|&n| self.reps.is_rep(n))
            .collect()
    }

    pub fn rep_table(&self) -> &RepTable {
        &self.reps
    }

    #[inline]
    pub fn is_pwc(&self, id: NodeId) -> bool {
        self.pwc.contains(&self.scc_rep_node(id))
    }

    pub fn set_pwc(&mut self, id: NodeId) {
        let rep = self.scc_rep_node(id);
        self.pwc.insert(rep);
    }

    /// Number of nodes flagged PWC
    pub fn pwc_count(&self) -> usize {
        self.pwc.len()
    }
}
