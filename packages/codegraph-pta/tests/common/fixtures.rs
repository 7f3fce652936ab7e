//! Test fixtures
//!
//! Small programs with named nodes, shared by the scenario tests.

use codegraph_pta::features::points_to::{
    DirectCallSite, FunctionSignature, IndirectCallSite,
};
use codegraph_pta::{
    Constraint, ConstraintGraphBuilder, ConstraintProgram, ConstraintRegion, NodeId, ObjectMeta,
};

/// `v0 = &o; v1 = v0; ...; v{n-1} = v{n-2}`
pub struct CopyChain {
    pub program: ConstraintProgram,
    pub values: Vec<NodeId>,
    pub object: NodeId,
}

pub fn copy_chain(len: usize) -> CopyChain {
    let mut builder = ConstraintGraphBuilder::new();
    let values: Vec<NodeId> = (0..len).map(|i| builder.add_value(&format!("v{i}"))).collect();
    let object = builder.add_object("o", ObjectMeta::stack(0));

    let mut region = ConstraintRegion::new("chain");
    region.push(Constraint::addr(values[0], object));
    for pair in values.windows(2) {
        region.push(Constraint::copy(pair[0], pair[1]));
    }
    builder.add_region(region).unwrap();

    CopyChain {
        program: builder.build(),
        values,
        object,
    }
}

/// Copy ring `v0 -> v1 -> ... -> v{n-1} -> v0` seeded at every node with its own object
pub struct CopyCycle {
    pub program: ConstraintProgram,
    pub values: Vec<NodeId>,
    pub objects: Vec<NodeId>,
}

pub fn copy_cycle(len: usize) -> CopyCycle {
    let mut builder = ConstraintGraphBuilder::new();
    let values: Vec<NodeId> = (0..len).map(|i| builder.add_value(&format!("v{i}"))).collect();
    let objects: Vec<NodeId> = (0..len)
        .map(|i| builder.add_object(&format!("o{i}"), ObjectMeta::stack(0)))
        .collect();

    let mut region = ConstraintRegion::new("cycle");
    for i in 0..len {
        region.push(Constraint::addr(values[i], objects[i]));
        region.push(Constraint::copy(values[i], values[(i + 1) % len]));
    }
    builder.add_region(region).unwrap();

    CopyCycle {
        program: builder.build(),
        values,
        objects,
    }
}

/// `a = &obj; b = &a->f1; a = b`
pub struct PwcCycle {
    pub program: ConstraintProgram,
    pub a: NodeId,
    pub b: NodeId,
    pub obj: NodeId,
}

pub fn pwc_cycle() -> PwcCycle {
    let mut builder = ConstraintGraphBuilder::new();
    let (a, b) = (builder.add_value("A"), builder.add_value("B"));
    let obj = builder.add_object("obj", ObjectMeta::stack(0));

    let mut region = ConstraintRegion::new("pwc");
    region
        .push(Constraint::addr(a, obj))
        .push(Constraint::normal_gep(a, b, 1))
        .push(Constraint::copy(b, a));
    builder.add_region(region).unwrap();

    PwcCycle {
        program: builder.build(),
        a,
        b,
        obj,
    }
}

/// Caller passes `&arg_obj` through `fp = &foo`; foo returns its argument or `&local`
///
/// ```text
/// foo(x) { ret = x; ret = &local; return ret }
/// main() { fp = &foo; a = &arg_obj; r = fp(a) }
/// ```
pub struct FunctionPointer {
    pub program: ConstraintProgram,
    pub fp: NodeId,
    pub foo: NodeId,
    pub formal: NodeId,
    pub foo_ret: NodeId,
    pub local: NodeId,
    pub arg: NodeId,
    pub arg_obj: NodeId,
    pub result: NodeId,
    pub call: u32,
}

pub fn function_pointer() -> FunctionPointer {
    let mut builder = ConstraintGraphBuilder::new();
    let (formal, foo_ret) = (builder.add_value("x"), builder.add_value("foo.ret"));
    let foo = builder
        .add_function(
            "foo",
            FunctionSignature::default().with_formals([formal]).with_ret(foo_ret),
        )
        .unwrap();
    let local = builder.add_object("local", ObjectMeta::global(0));

    let mut body = ConstraintRegion::new("foo");
    body.push(Constraint::copy(formal, foo_ret))
        .push(Constraint::addr(foo_ret, local));
    builder.add_region(body).unwrap();

    let (fp, arg, result) = (
        builder.add_value("fp"),
        builder.add_value("a"),
        builder.add_value("r"),
    );
    let arg_obj = builder.add_object("arg_obj", ObjectMeta::stack(0));
    let call = 1;
    let mut main = ConstraintRegion::new("main");
    main.push(Constraint::addr(fp, foo))
        .push(Constraint::addr(arg, arg_obj))
        .indirect_call(IndirectCallSite::new(call, fp).with_args([arg]).with_ret(result));
    builder.add_region(main).unwrap();

    FunctionPointer {
        program: builder.build(),
        fp,
        foo,
        formal,
        foo_ret,
        local,
        arg,
        arg_obj,
        result,
        call,
    }
}

/// Dispatch table: `table = &slots; *table = &handler; f = *table; f(p)`
///
/// The callee is only reachable once a load through memory has been solved.
pub struct DispatchTable {
    pub program: ConstraintProgram,
    pub handler: NodeId,
    pub handler_formal: NodeId,
    pub p: NodeId,
    pub p_obj: NodeId,
    pub call: u32,
    pub direct_call: u32,
}

pub fn dispatch_table() -> DispatchTable {
    let mut builder = ConstraintGraphBuilder::new();
    let handler_formal = builder.add_value("h.arg");
    let handler = builder
        .add_function("handler", FunctionSignature::default().with_formals([handler_formal]))
        .unwrap();
    let register_formal = builder.add_value("reg.arg");
    let register = builder
        .add_function("register", FunctionSignature::default().with_formals([register_formal]))
        .unwrap();

    let (table, fn_ptr, f, p) = (
        builder.add_value("table"),
        builder.add_value("fn_ptr"),
        builder.add_value("f"),
        builder.add_value("p"),
    );
    let slots = builder.add_object("slots", ObjectMeta::global(0));
    let p_obj = builder.add_object("p_obj", ObjectMeta::stack(0));

    let (call, direct_call) = (10, 11);
    let mut main = ConstraintRegion::new("main");
    main.push(Constraint::addr(table, slots))
        .push(Constraint::addr(fn_ptr, handler))
        .push(Constraint::store(fn_ptr, table))
        .push(Constraint::load(table, f))
        .push(Constraint::addr(p, p_obj))
        .direct_call(DirectCallSite::new(direct_call, register).with_args([fn_ptr]))
        .indirect_call(IndirectCallSite::new(call, f).with_args([p]));
    builder.add_region(main).unwrap();

    DispatchTable {
        program: builder.build(),
        handler,
        handler_formal,
        p,
        p_obj,
        call,
        direct_call,
    }
}
