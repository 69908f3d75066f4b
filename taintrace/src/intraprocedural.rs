//! Intraprocedural taint propagation.
//!
//! A single linear pass over one function body: taint production seeds
//! zero-distance source facts, calls import their callee's current summary
//! facts unchanged into local values, and sink consumption attributes
//! zero-distance sink facts back to the parameters the consumed value
//! derives from. The extra hop per call is attributed when facts are
//! exported into this function's own summary: a summary distance counts
//! call edges between the summarized function and the fact's origin
//! function. The pass is monotone in the callee summaries it reads, which
//! the outer fixed point relies on.

use crate::call_graph::CallGraph;
use crate::config::AnalysisConfig;
use crate::distance::Distance;
use crate::ir::Op;
use crate::lattice::{Fact, FactMap, Summary};
use crate::types::{AnalysisError, OpSite};
use petgraph::graph::NodeIndex;
use smallvec::SmallVec;

/// Read access to the summaries visible while propagating one function.
///
/// During fixed-point iteration a callee's summary may still be partial;
/// after convergence the lookup serves only stable summaries.
pub trait SummaryLookup {
    /// The current summary of `func`.
    fn summary(&self, func: NodeIndex) -> &Summary;
}

impl SummaryLookup for Vec<Summary> {
    fn summary(&self, func: NodeIndex) -> &Summary {
        &self[func.index()]
    }
}

/// Facts attached to one value slot during the pass.
#[derive(Debug, Clone, Default)]
pub struct ValueState {
    /// Source facts the value carries.
    pub sources: FactMap,
    /// Parameters the value transitively derives from. Intraprocedural
    /// flow and pass-through do not add hops, so no distance is tracked.
    pub param_origins: SmallVec<[u32; 2]>,
}

impl ValueState {
    fn add_origin(&mut self, param: u32) {
        if !self.param_origins.contains(&param) {
            self.param_origins.push(param);
        }
    }
}

/// Result of one pass over a function body.
#[derive(Debug)]
pub struct FunctionFlow {
    /// Per-value facts, indexed by value slot.
    pub values: Vec<ValueState>,
    /// The summary implied by those facts.
    pub summary: Summary,
}

/// Propagates taint through `func` using the summaries currently visible.
pub fn propagate(
    graph: &CallGraph,
    func: NodeIndex,
    summaries: &impl SummaryLookup,
    config: &AnalysisConfig,
) -> Result<FunctionFlow, AnalysisError> {
    let body = &graph.node(func).body;
    let param_count = body.param_count();
    let ceiling = config.max_trace_length;
    #[allow(clippy::cast_possible_truncation)]
    let self_index = func.index() as u32;

    let mut values: Vec<ValueState> = vec![ValueState::default(); body.value_count()];
    for (param, state) in values.iter_mut().enumerate().take(param_count) {
        #[allow(clippy::cast_possible_truncation)]
        state.add_origin(param as u32);
    }

    let mut summary = Summary::bottom(param_count);

    for (op_index, op) in body.ops().iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let site = OpSite::new(self_index, op_index as u32);

        match op {
            Op::Source { kind, result } => {
                values[result.index()]
                    .sources
                    .add(kind.clone(), Fact::new(Distance::ZERO, site));
            }

            Op::Sink { kind, operand } => {
                // The sink consumes the value at this frame; its parameter
                // origins gain a zero-distance sink fact.
                let origins = values[operand.index()].param_origins.clone();
                for param in origins {
                    summary.param_sinks[param as usize]
                        .add(kind.clone(), Fact::new(Distance::ZERO, site));
                }
            }

            Op::Call {
                callee,
                args,
                result,
            } => {
                let target = graph
                    .node_index(callee)
                    .ok_or_else(|| AnalysisError::UnknownFunction(callee.clone()))?;
                let callee_summary = summaries.summary(target);

                // Sink facts on callee parameters cross into this
                // function's summary for whatever parameters of ours the
                // arguments derive from, gaining the boundary hop.
                for (position, arg) in args.iter().enumerate() {
                    let Some(sinks) = callee_summary.sinks_for_param(position) else {
                        continue;
                    };
                    if sinks.is_empty() {
                        continue;
                    }
                    let origins = values[arg.index()].param_origins.clone();
                    for param in origins {
                        summary.param_sinks[param as usize].join_exported(
                            sinks,
                            self_index,
                            ceiling,
                        );
                    }
                }

                // The result imports the callee's return facts unchanged;
                // the hop is accounted for if they flow onward into this
                // function's summary.
                let mut result_state = ValueState::default();
                result_state.sources.join(&callee_summary.return_sources);

                // Pass-through: a forwarded argument's facts keep their
                // distance, since the origin's frame offset is unchanged by
                // a round trip through the callee.
                for (position, arg) in args.iter().enumerate() {
                    if !passes_through(callee_summary, position) {
                        continue;
                    }
                    let arg_state = values[arg.index()].clone();
                    result_state.sources.join(&arg_state.sources);
                    for param in arg_state.param_origins {
                        result_state.add_origin(param);
                    }
                }

                values[result.index()] = result_state;
            }
        }
    }

    if let Some(ret) = body.ret() {
        let ret_state = &values[ret.index()];
        summary
            .return_sources
            .join_exported(&ret_state.sources, self_index, ceiling);
        for &param in &ret_state.param_origins {
            summary.param_to_return[param as usize] = true;
        }
    }

    Ok(FunctionFlow { values, summary })
}

fn passes_through(summary: &Summary, position: usize) -> bool {
    summary.param_to_return.get(position).copied().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FunctionBody;
    use crate::types::TaintKind;

    const SOURCE: &str = "TestSource";
    const SINK: &str = "TestSink";

    fn config() -> AnalysisConfig {
        AnalysisConfig::with_max_trace_length(2)
    }

    fn bottoms(graph: &CallGraph) -> Vec<Summary> {
        graph
            .functions()
            .map(|f| Summary::bottom(graph.node(f).body.param_count()))
            .collect()
    }

    #[test]
    fn test_source_reaches_return_at_distance_zero() {
        let mut body = FunctionBody::new(0);
        let v = body.source(SOURCE);
        body.set_return(v);
        let graph = CallGraph::builder().function("produce", body).build().unwrap();
        let summaries = bottoms(&graph);

        let func = graph.node_index("produce").unwrap();
        let flow = propagate(&graph, func, &summaries, &config()).unwrap();

        let fact = flow
            .summary
            .return_sources
            .get(&TaintKind::new(SOURCE))
            .unwrap();
        assert_eq!(fact.distance, Distance::ZERO);
    }

    #[test]
    fn test_sink_attributes_to_parameter() {
        let mut body = FunctionBody::new(1);
        body.sink(SINK, body.param(0));
        let graph = CallGraph::builder().function("consume", body).build().unwrap();
        let summaries = bottoms(&graph);

        let func = graph.node_index("consume").unwrap();
        let flow = propagate(&graph, func, &summaries, &config()).unwrap();

        let fact = flow.summary.param_sinks[0]
            .get(&TaintKind::new(SINK))
            .unwrap();
        assert_eq!(fact.distance, Distance::ZERO);
    }

    #[test]
    fn test_call_rebases_callee_facts_by_one_hop() {
        let mut inner = FunctionBody::new(1);
        let v = inner.source(SOURCE);
        inner.sink(SINK, inner.param(0));
        inner.set_return(v);

        let mut outer = FunctionBody::new(1);
        let r = outer.call("inner", [outer.param(0)]);
        outer.set_return(r);

        let graph = CallGraph::builder()
            .function("inner", inner)
            .function("outer", outer)
            .build()
            .unwrap();

        let mut summaries = bottoms(&graph);
        let inner_idx = graph.node_index("inner").unwrap();
        let flow = propagate(&graph, inner_idx, &summaries, &config()).unwrap();
        summaries[inner_idx.index()] = flow.summary;

        let outer_idx = graph.node_index("outer").unwrap();
        let flow = propagate(&graph, outer_idx, &summaries, &config()).unwrap();

        let source = flow
            .summary
            .return_sources
            .get(&TaintKind::new(SOURCE))
            .unwrap();
        assert_eq!(source.distance, Distance::ONE);
        let sink = flow.summary.param_sinks[0]
            .get(&TaintKind::new(SINK))
            .unwrap();
        assert_eq!(sink.distance, Distance::ONE);
    }

    #[test]
    fn test_pass_through_keeps_distance() {
        // identity(x) = x; caller forwards a fresh source through it.
        let mut identity = FunctionBody::new(1);
        identity.set_return(identity.param(0));

        let mut caller = FunctionBody::new(0);
        let v = caller.source(SOURCE);
        let r = caller.call("identity", [v]);
        caller.set_return(r);

        let graph = CallGraph::builder()
            .function("identity", identity)
            .function("caller", caller)
            .build()
            .unwrap();

        let mut summaries = bottoms(&graph);
        let identity_idx = graph.node_index("identity").unwrap();
        let flow = propagate(&graph, identity_idx, &summaries, &config()).unwrap();
        assert_eq!(flow.summary.param_to_return, vec![true]);
        summaries[identity_idx.index()] = flow.summary;

        let caller_idx = graph.node_index("caller").unwrap();
        let flow = propagate(&graph, caller_idx, &summaries, &config()).unwrap();
        let fact = flow
            .summary
            .return_sources
            .get(&TaintKind::new(SOURCE))
            .unwrap();
        assert_eq!(fact.distance, Distance::ZERO);
    }

    #[test]
    fn test_distance_beyond_ceiling_collapses() {
        // A chain long enough that the ceiling truncates the re-based fact.
        let mut inner = FunctionBody::new(0);
        let v = inner.source(SOURCE);
        inner.set_return(v);

        let mut mid = FunctionBody::new(0);
        let r = mid.call("inner", []);
        mid.set_return(r);

        let graph = CallGraph::builder()
            .function("inner", inner)
            .function("mid", mid)
            .build()
            .unwrap();

        let tight = AnalysisConfig::with_max_trace_length(0);
        let mut summaries = bottoms(&graph);
        let inner_idx = graph.node_index("inner").unwrap();
        summaries[inner_idx.index()] =
            propagate(&graph, inner_idx, &summaries, &tight)
                .unwrap()
                .summary;

        let mid_idx = graph.node_index("mid").unwrap();
        let flow = propagate(&graph, mid_idx, &summaries, &tight).unwrap();
        let fact = flow
            .summary
            .return_sources
            .get(&TaintKind::new(SOURCE))
            .unwrap();
        assert!(fact.distance.is_too_far());
    }
}
