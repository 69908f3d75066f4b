//! Cyclic call graphs: convergence, distance stability, and the guard.

use taintrace::{AnalysisConfig, AnalysisError, CallGraph, Distance, FunctionBody, TaintAnalyzer, TaintKind};

const SOURCE: &str = "TestSource";
const SINK: &str = "TestSink";

/// A self-recursive producer: returns either a fresh source or its own
/// recursive result.
fn recursive_producer() -> CallGraph {
    let mut body = FunctionBody::new(0);
    let direct = body.source(SOURCE);
    let _again = body.call("produce", []);
    body.set_return(direct);
    CallGraph::builder()
        .function("produce", body)
        .build()
        .unwrap()
}

#[test]
fn test_self_recursion_reaches_a_fixed_point() {
    let graph = recursive_producer();
    let analyzer = TaintAnalyzer::new(AnalysisConfig::with_max_trace_length(2));
    let result = analyzer.run(&graph).unwrap();

    let summary = result.summary(&graph, "produce").unwrap();
    let fact = summary.return_sources.get(&TaintKind::new(SOURCE)).unwrap();
    assert_eq!(fact.distance, Distance::ZERO);
}

#[test]
fn test_mutually_recursive_sink_forwarders_converge() {
    // even and odd forward their parameter to each other; even also feeds
    // the real sink. The parameter of both reaches the sink.
    let mut even = FunctionBody::new(1);
    let _ = even.call("consume", [even.param(0)]);
    let _ = even.call("odd", [even.param(0)]);

    let mut odd = FunctionBody::new(1);
    let _ = odd.call("even", [odd.param(0)]);

    let mut consume = FunctionBody::new(1);
    consume.sink(SINK, consume.param(0));

    let mut probe = FunctionBody::new(0);
    let v = probe.source(SOURCE);
    let _ = probe.call("odd", [v]);

    let graph = CallGraph::builder()
        .function("even", even)
        .function("odd", odd)
        .function("consume", consume)
        .function("probe", probe)
        .build()
        .unwrap();

    let analyzer = TaintAnalyzer::new(AnalysisConfig::with_max_trace_length(4));
    let result = analyzer.run(&graph).unwrap();

    // odd -> even -> consume -> sink: the sink sits two hops below odd.
    let odd_summary = result.summary(&graph, "odd").unwrap();
    let fact = odd_summary.param_sinks[0]
        .get(&TaintKind::new(SINK))
        .unwrap();
    assert_eq!(fact.distance, Distance::new(2));

    assert_eq!(result.issues().len(), 1);
    assert_eq!(result.issues()[0].sink_distance, Distance::new(2));
}

#[test]
fn test_cycle_distances_collapse_beyond_ceiling() {
    // With a budget of 0, the forwarding cycle's re-based sink facts can
    // never be reported; the run must still converge, with no issues.
    let mut ping = FunctionBody::new(1);
    let _ = ping.call("pong", [ping.param(0)]);

    let mut pong = FunctionBody::new(1);
    let _ = pong.call("ping", [pong.param(0)]);
    pong.sink(SINK, pong.param(0));

    let mut probe = FunctionBody::new(0);
    let v = probe.source(SOURCE);
    let _ = probe.call("ping", [v]);

    let graph = CallGraph::builder()
        .function("ping", ping)
        .function("pong", pong)
        .function("probe", probe)
        .build()
        .unwrap();

    let analyzer = TaintAnalyzer::new(AnalysisConfig::with_max_trace_length(0));
    let result = analyzer.run(&graph).unwrap();
    assert!(result.issues().is_empty());

    // ping's parameter only reaches the sink one hop away: too far at
    // budget zero, so the retained fact is the sentinel.
    let ping_summary = result.summary(&graph, "ping").unwrap();
    let fact = ping_summary.param_sinks[0]
        .get(&TaintKind::new(SINK))
        .unwrap();
    assert!(fact.distance.is_too_far());
}

#[test]
fn test_exhausted_iteration_guard_is_fatal() {
    let graph = recursive_producer();
    let mut config = AnalysisConfig::with_max_trace_length(2);
    config.max_iterations = 0;
    let analyzer = TaintAnalyzer::new(config);

    let error = analyzer.run(&graph).unwrap_err();
    assert!(matches!(error, AnalysisError::Divergence { .. }));
}
