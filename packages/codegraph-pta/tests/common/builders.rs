//! Test data builders

use codegraph_pta::features::points_to::ConstraintSource;
use codegraph_pta::{
    AndersenAnalysis, Constraint, ConstraintGraphBuilder, ConstraintProgram, NodeId, ObjectMeta,
    PtaConfig,
};
use codegraph_pta::features::points_to::domain::GraphResult;

/// Solve a program with the default configuration
pub fn solve(program: ConstraintProgram) -> AndersenAnalysis {
    solve_with(program, PtaConfig::default())
}

pub fn solve_with(program: ConstraintProgram, config: PtaConfig) -> AndersenAnalysis {
    let mut analysis = AndersenAnalysis::new(program, config).expect("valid config");
    analysis.solve();
    analysis
}

/// Random-program description used by property tests
///
/// Each entry is `(kind, src, dst, offset)`; indices wrap around the node lists.
#[derive(Debug, Clone)]
pub struct RandomProgram {
    pub values: usize,
    pub objects: Vec<u32>,
    pub constraints: Vec<(u8, usize, usize, u32)>,
}

/// Node IDs of a program built from a [`RandomProgram`]
#[derive(Debug, Clone, Default)]
pub struct BuiltProgram {
    pub values: Vec<NodeId>,
    pub objects: Vec<NodeId>,
    pub copies: Vec<(NodeId, NodeId)>,
    pub addrs: Vec<(NodeId, NodeId)>,
    /// `(pointer, dst)` of each `dst = *pointer`
    pub loads: Vec<(NodeId, NodeId)>,
    /// `(src, pointer)` of each `*pointer = src`
    pub stores: Vec<(NodeId, NodeId)>,
}

impl RandomProgram {
    /// Build through the [`ConstraintSource`] port
    ///
    /// Node IDs are allocated in a fixed order, so the IDs recorded by a second
    /// population match the program's.
    pub fn build(&self) -> (ConstraintProgram, BuiltProgram) {
        let program =
            ConstraintProgram::from_source(self).expect("generated constraints are valid");
        let built = self
            .populate_into(&mut ConstraintGraphBuilder::new())
            .expect("generated constraints are valid");
        (program, built)
    }

    fn populate_into(&self, builder: &mut ConstraintGraphBuilder) -> GraphResult<BuiltProgram> {
        let mut built = BuiltProgram::default();
        for i in 0..self.values.max(1) {
            built.values.push(builder.add_value(&format!("v{i}")));
        }
        for (i, &fields) in self.objects.iter().enumerate() {
            built
                .objects
                .push(builder.add_object(&format!("o{i}"), ObjectMeta::stack(fields)));
        }
        if built.objects.is_empty() {
            built.objects.push(builder.add_object("o0", ObjectMeta::stack(0)));
        }

        let value = |i: usize| built.values[i % built.values.len()];
        let object = |i: usize| built.objects[i % built.objects.len()];
        let (mut copies, mut addrs) = (Vec::new(), Vec::new());
        let (mut loads, mut stores) = (Vec::new(), Vec::new());
        for &(kind, src, dst, offset) in &self.constraints {
            let constraint = match kind % 5 {
                0 => {
                    addrs.push((value(src), object(dst)));
                    Constraint::addr(value(src), object(dst))
                }
                1 => {
                    copies.push((value(src), value(dst)));
                    Constraint::copy(value(src), value(dst))
                }
                2 => {
                    loads.push((value(src), value(dst)));
                    Constraint::load(value(src), value(dst))
                }
                3 => {
                    stores.push((value(src), value(dst)));
                    Constraint::store(value(src), value(dst))
                }
                _ => Constraint::gep(value(src), value(dst), Some(offset % 3)),
            };
            builder.add_constraint(constraint)?;
        }
        built.copies = copies;
        built.addrs = addrs;
        built.loads = loads;
        built.stores = stores;
        Ok(built)
    }
}

impl ConstraintSource for RandomProgram {
    fn populate(&self, builder: &mut ConstraintGraphBuilder) -> GraphResult<()> {
        self.populate_into(builder).map(|_| ())
    }
}
