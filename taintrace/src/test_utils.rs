//! Shared fixtures for tests: parametrized call-graph shapes.
//!
//! The classic probe for distance bookkeeping is a chain of forwarding
//! functions on each side of a source/sink pair; building the chains by
//! depth keeps the tests honest about what each extra hop costs.

use crate::call_graph::{CallGraph, CallGraphBuilder};
use crate::ir::FunctionBody;

/// Kind used by the generic test source.
pub const TEST_SOURCE: &str = "TestSource";
/// Kind used by the generic test sink.
pub const TEST_SINK: &str = "TestSink";

/// Adds `source_0 .. source_{depth}` to the builder: `source_0` produces
/// the taint, each `source_n` returns `source_{n-1}`'s result, so
/// `source_n`'s return carries the source at distance n.
#[must_use]
pub fn source_chain(mut builder: CallGraphBuilder, depth: u32) -> CallGraphBuilder {
    let mut leaf = FunctionBody::new(0);
    let v = leaf.source(TEST_SOURCE);
    leaf.set_return(v);
    builder = builder.function("source_0", leaf);

    for n in 1..=depth {
        let mut body = FunctionBody::new(0);
        let r = body.call(&format!("source_{}", n - 1), []);
        body.set_return(r);
        builder = builder.function(&format!("source_{n}"), body);
    }
    builder
}

/// Adds `sink_0 .. sink_{depth}` to the builder: `sink_0` consumes its
/// parameter, each `sink_n` forwards its parameter to `sink_{n-1}`, so
/// `sink_n`'s parameter reaches the sink at distance n.
#[must_use]
pub fn sink_chain(mut builder: CallGraphBuilder, depth: u32) -> CallGraphBuilder {
    let mut leaf = FunctionBody::new(1);
    leaf.sink(TEST_SINK, leaf.param(0));
    builder = builder.function("sink_0", leaf);

    for n in 1..=depth {
        let mut body = FunctionBody::new(1);
        let _ = body.call(&format!("sink_{}", n - 1), [body.param(0)]);
        builder = builder.function(&format!("sink_{n}"), body);
    }
    builder
}

/// A complete probe graph: one `probe` function passing the result of
/// `source_{source_depth}` into `sink_{sink_depth}`, with chains deep
/// enough on both sides.
///
/// # Panics
/// Panics if the graph fails validation, which the fixtures never do.
#[must_use]
pub fn probe_graph(source_depth: u32, sink_depth: u32) -> CallGraph {
    let mut builder = CallGraph::builder();
    builder = source_chain(builder, source_depth);
    builder = sink_chain(builder, sink_depth);

    let mut probe = FunctionBody::new(0);
    let v = probe.call(&format!("source_{source_depth}"), []);
    let _ = probe.call(&format!("sink_{sink_depth}"), [v]);
    builder = builder.function("probe", probe);

    #[allow(clippy::unwrap_used)]
    builder.build().unwrap()
}
