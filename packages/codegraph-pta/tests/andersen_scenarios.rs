//! End-to-end scenarios for the Andersen analysis
//!
//! Each test builds a small program through the public builder API, solves it
//! and checks points-to sets, alias verdicts and the call graph.

mod common;

use codegraph_pta::features::points_to::infrastructure::EdgeBucket;
use codegraph_pta::features::points_to::{BLACK_HOLE, BLK_PTR, CONSTANT_OBJ};
use codegraph_pta::{
    AliasResult, AndersenAnalysis, Constraint, ConstraintGraphBuilder, ConstraintRegion,
    ObjectMeta, PointsToQuery, Preset, PtaConfig,
};
use common::*;
use pretty_assertions::assert_eq;

// ============================================================================
// Copy propagation
// ============================================================================

#[test]
fn test_copy_chain_propagates_to_every_value() {
    let chain = copy_chain(6);
    let analysis = solve(chain.program);

    for &v in &chain.values {
        assert_pts(&analysis, v, &[chain.object]);
    }
    assert!(analysis.stats().converged);
}

#[test]
fn test_copy_chain_values_must_alias() {
    let chain = copy_chain(3);
    let analysis = solve(chain.program);

    assert_eq!(
        analysis.alias(chain.values[0], chain.values[2]),
        AliasResult::MustAlias
    );
}

#[test]
fn test_pts_grow_monotonically_across_rounds() {
    let table = dispatch_table();
    let mut analysis = AndersenAnalysis::new(table.program, PtaConfig::default()).unwrap();

    let mut previous = pts_snapshot(&analysis);
    loop {
        let more = analysis.solve_round();
        let current = pts_snapshot(&analysis);
        assert_monotone(&previous, &current);
        previous = current;
        if !more {
            break;
        }
    }
    assert_pts(&analysis, table.handler_formal, &[table.p_obj]);
}

// ============================================================================
// Fields
// ============================================================================

#[test]
fn test_gep_selects_field_object() {
    // a = &Obj1; b = &a->field1
    let mut builder = ConstraintGraphBuilder::new();
    let (a, b, c) = (builder.add_value("a"), builder.add_value("b"), builder.add_value("c"));
    let obj = builder.add_object("Obj1", ObjectMeta::stack(2));
    builder
        .add_constraints([
            Constraint::addr(a, obj),
            Constraint::normal_gep(a, b, 1),
            // Offset 3 of a two-field struct wraps to field 1
            Constraint::normal_gep(a, c, 3),
        ])
        .unwrap();

    let analysis = solve(builder.build());

    let pts = analysis.points_to(b);
    assert_eq!(pts.len(), 1);
    let field = analysis.graph().get_node(pts[0]).unwrap();
    assert_eq!(field.base(), obj);
    assert_eq!(field.offset(), 1);
    assert_eq!(analysis.points_to(c), pts);
    assert_eq!(analysis.graph().fields_of(obj), &[pts[0]]);
    assert_eq!(analysis.alias(a, b), AliasResult::NoAlias);
}

#[test]
fn test_variant_gep_collapses_object() {
    let mut builder = ConstraintGraphBuilder::new();
    let (a, f, v) = (builder.add_value("a"), builder.add_value("f"), builder.add_value("v"));
    let obj = builder.add_object("arr", ObjectMeta::stack(4));
    let mut region = ConstraintRegion::new("main");
    region
        .push(Constraint::addr(a, obj))
        .push(Constraint::normal_gep(a, f, 2));
    region.gep(a, v, None);
    builder.add_region(region).unwrap();

    let analysis = solve(builder.build());

    assert!(analysis.is_field_insensitive(obj));
    assert_pts_contains(&analysis, v, &[obj]);
    // Holders of the old field see the whole object
    assert_pts_contains(&analysis, f, &[obj]);
    assert_eq!(analysis.alias(f, v), AliasResult::MayAlias);
    assert!(analysis.stats().field_collapses >= 1);
}

#[test]
fn test_field_insensitive_configuration() {
    let mut builder = ConstraintGraphBuilder::new();
    let (a, b) = (builder.add_value("a"), builder.add_value("b"));
    let obj = builder.add_object("s", ObjectMeta::stack(3));
    builder
        .add_constraints([Constraint::addr(a, obj), Constraint::normal_gep(a, b, 2)])
        .unwrap();

    let analysis = solve_with(builder.build(), PtaConfig::default().field_sensitive(false));

    assert_pts(&analysis, b, &[obj]);
    assert!(analysis.graph().fields_of(obj).is_empty());
}

#[test]
fn test_first_field_is_base() {
    let mut builder = ConstraintGraphBuilder::new();
    let (a, b) = (builder.add_value("a"), builder.add_value("b"));
    let obj = builder.add_object("s", ObjectMeta::stack(3));
    builder
        .add_constraints([Constraint::addr(a, obj), Constraint::normal_gep(a, b, 0)])
        .unwrap();

    let analysis = solve_with(builder.build(), PtaConfig::default().first_field_eq_base(true));

    assert_pts(&analysis, b, &[obj]);
}

// ============================================================================
// Positive weight cycles
// ============================================================================

#[test]
fn test_pwc_cycle_flagged_and_flattened() {
    let pwc = pwc_cycle();
    let analysis = solve(pwc.program);

    assert_eq!(analysis.scc_rep_node(pwc.b), pwc.a);
    assert!(analysis.is_pwc(pwc.a));
    assert!(analysis.is_pwc(pwc.b));
    assert!(analysis.is_field_insensitive(pwc.obj));
    assert_pts(&analysis, pwc.a, &[pwc.obj]);
    assert_eq!(analysis.points_to(pwc.b), analysis.points_to(pwc.a));
}

#[test]
fn test_pwc_without_merging_stops_at_field_limit() {
    let pwc = pwc_cycle();
    let config = PtaConfig::default().merge_pwc(false).max_field_limit(8);
    let analysis = solve_with(pwc.program, config);

    assert!(analysis.stats().converged);
    assert!(analysis.is_pwc(pwc.a));
    assert!(analysis.is_field_insensitive(pwc.obj));
    assert_pts_contains(&analysis, pwc.a, &[pwc.obj]);
    assert!(analysis.graph().fields_of(pwc.obj).len() < 8);
}

#[test]
fn test_thorough_preset_flattens_pwc_objects() {
    let pwc = pwc_cycle();
    let analysis = solve_with(pwc.program, PtaConfig::from_preset(Preset::Thorough));

    assert!(analysis.stats().converged);
    assert!(analysis.is_field_insensitive(pwc.obj));
    assert_pts(&analysis, pwc.a, &[pwc.obj]);
    assert!(analysis.graph().fields_of(pwc.obj).is_empty());
}

/// `a = &obj; b = &a->f2; *a = b; a = &b->f1`
#[test]
fn test_thorough_preset_bounds_store_fed_pwc() {
    let mut builder = ConstraintGraphBuilder::new();
    let (a, b) = (builder.add_value("a"), builder.add_value("b"));
    let obj = builder.add_object("obj", ObjectMeta::stack(0));
    builder
        .add_constraints([
            Constraint::addr(a, obj),
            Constraint::normal_gep(a, b, 2),
            Constraint::store(b, a),
            Constraint::normal_gep(b, a, 1),
        ])
        .unwrap();

    let analysis = solve_with(builder.build(), PtaConfig::from_preset(Preset::Thorough));

    assert!(analysis.stats().converged);
    assert!(analysis.is_field_insensitive(obj));
    assert_pts(&analysis, a, &[obj]);
    assert!(analysis.graph().node_count() < 16);
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn test_function_pointer_resolved_on_the_fly() {
    let fx = function_pointer();
    let analysis = solve(fx.program);

    assert_eq!(analysis.callees(fx.call), vec![fx.foo]);
    let call_site = analysis.call_graph().call_site_id(fx.call, fx.foo).unwrap();
    let arg_edges: Vec<_> = analysis
        .graph()
        .out_edges(fx.arg, EdgeBucket::Copy)
        .map(|e| (e.dst, e.call_site))
        .collect();
    assert_eq!(arg_edges, vec![(fx.formal, Some(call_site))]);

    assert_pts(&analysis, fx.formal, &[fx.arg_obj]);
    // Facts discovered inside foo flow back to the caller
    assert_pts(&analysis, fx.result, &[fx.local, fx.arg_obj]);
    assert!(analysis.unresolved_call_sites().is_empty());
    assert_eq!(analysis.stats().indirect_call_edges, 1);
}

#[test]
fn test_callee_reached_through_memory() {
    let table = dispatch_table();
    let analysis = solve(table.program);

    assert_eq!(analysis.callees(table.call), vec![table.handler]);
    assert_eq!(analysis.call_graph().callers_of(table.handler), vec![table.call]);
    assert_pts(&analysis, table.handler_formal, &[table.p_obj]);
    assert_eq!(analysis.callees(table.direct_call).len(), 1);
    assert!(analysis.stats().rounds >= 2);
}

#[test]
fn test_round_budget_stops_early() {
    let table = dispatch_table();
    let config = PtaConfig::default().max_iterations(Some(1));
    let analysis = solve_with(table.program, config);

    assert_eq!(analysis.stats().rounds, 1);
    assert!(!analysis.stats().converged);
    // Resolved in the first round, which asked for another one
    assert_eq!(analysis.callees(table.call), vec![table.handler]);
}

// ============================================================================
// Special objects
// ============================================================================

#[test]
fn test_black_hole_absorbs_unknown_loads() {
    // a = external_call(); b = *a
    let mut builder = ConstraintGraphBuilder::new();
    let (a, b, x) = (builder.add_value("a"), builder.add_value("b"), builder.add_value("x"));
    let unrelated = builder.add_object("X", ObjectMeta::stack(0));
    builder
        .add_constraints([
            Constraint::copy(BLK_PTR, a),
            Constraint::load(a, b),
            Constraint::addr(x, unrelated),
        ])
        .unwrap();

    let analysis = solve(builder.build());

    assert_pts_contains(&analysis, b, &[BLACK_HOLE]);
    assert_eq!(analysis.alias(b, x), AliasResult::MayAlias);
    assert!(analysis.may_alias(x, a));
}

#[test]
fn test_constant_object_is_not_dereferenced() {
    let mut builder = ConstraintGraphBuilder::new();
    let (a, b) = (builder.add_value("a"), builder.add_value("b"));
    builder
        .add_constraints([Constraint::addr(a, CONSTANT_OBJ), Constraint::load(a, b)])
        .unwrap();

    let analysis = solve(builder.build());

    assert_pts(&analysis, a, &[CONSTANT_OBJ]);
    assert!(analysis.points_to(b).is_empty());
}

// ============================================================================
// Driver
// ============================================================================

#[test]
fn test_second_solve_is_noop() {
    let fx = function_pointer();
    let mut analysis = solve(fx.program);
    let before = pts_snapshot(&analysis);
    let rounds = analysis.stats().rounds;

    analysis.solve();
    assert_eq!(analysis.stats().rounds, rounds);
    assert_eq!(pts_snapshot(&analysis), before);

    // Forcing another round changes nothing either
    assert!(!analysis.solve_round());
    assert_eq!(pts_snapshot(&analysis), before);
}

#[test]
fn test_skipped_region_is_reported() {
    let mut builder = ConstraintGraphBuilder::new();
    let (a, b) = (builder.add_value("a"), builder.add_value("b"));
    let obj = builder.add_object("o", ObjectMeta::stack(0));

    let mut good = ConstraintRegion::new("good");
    good.push(Constraint::addr(a, obj));
    builder.add_region(good).unwrap();

    let mut bad = ConstraintRegion::new("bad");
    bad.push(Constraint::copy(a, b)).push(Constraint::copy(b, 4242));
    builder.add_region(bad).unwrap_err();

    let analysis = solve(builder.build());
    assert_eq!(analysis.skipped_regions().len(), 1);
    assert_eq!(analysis.stats().skipped_regions, 1);
    assert_pts(&analysis, a, &[obj]);
    assert!(analysis.points_to(b).is_empty());
}
