//! Issue detection over converged summaries.
//!
//! A final pass per function with the stable summaries in hand: wherever a
//! value carrying source facts is consumed, directly by a sink operation
//! or passed to a callee whose parameter reaches sinks, an issue is
//! emitted if the combined trace length stays within budget. Every check
//! goes through [`crate::distance::is_within_budget`]; there is no second
//! truncation policy.

use crate::call_graph::CallGraph;
use crate::config::AnalysisConfig;
use crate::distance::{is_within_budget, Distance};
use crate::intraprocedural;
use crate::ir::Op;
use crate::lattice::Summary;
use crate::types::{AnalysisError, Issue, Location, OpSite, TaintKind};
use rustc_hash::FxHashSet;

/// One potential issue before de-duplication, in site coordinates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    location: OpSite,
    source_site: OpSite,
    sink_site: OpSite,
    source_kind: TaintKind,
    sink_kind: TaintKind,
    source_distance: Distance,
    sink_distance: Distance,
}

/// Detects all reportable issues given converged summaries.
///
/// One issue per distinct (source production site, sink consumption site)
/// pair: the same pair reached via different intermediate call chains is
/// reported once, at the smallest call-site location. Output is sorted by
/// call-site location and stable across runs.
pub fn detect(
    graph: &CallGraph,
    summaries: &Vec<Summary>,
    config: &AnalysisConfig,
) -> Result<Vec<Issue>, AnalysisError> {
    let mut candidates: Vec<Candidate> = Vec::new();

    for func in graph.functions() {
        let flow = intraprocedural::propagate(graph, func, summaries, config)?;
        let body = &graph.node(func).body;

        for (op_index, op) in body.ops().iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let site = OpSite::new(func.index() as u32, op_index as u32);

            match op {
                Op::Sink { kind, operand } => {
                    // The sink consumes the value right here: sink distance
                    // zero.
                    for (source_kind, fact) in flow.values[operand.index()].sources.iter() {
                        if is_within_budget(fact.distance, Distance::ZERO, config.max_trace_length)
                        {
                            candidates.push(Candidate {
                                location: site,
                                source_site: fact.origin,
                                sink_site: site,
                                source_kind: source_kind.clone(),
                                sink_kind: kind.clone(),
                                source_distance: fact.distance,
                                sink_distance: Distance::ZERO,
                            });
                        }
                    }
                }

                Op::Call { callee, args, .. } => {
                    let target = graph
                        .node_index(callee)
                        .ok_or_else(|| AnalysisError::UnknownFunction(callee.clone()))?;
                    let callee_summary = &summaries[target.index()];

                    for (position, arg) in args.iter().enumerate() {
                        let Some(sinks) = callee_summary.sinks_for_param(position) else {
                            continue;
                        };
                        for (source_kind, source_fact) in
                            flow.values[arg.index()].sources.iter()
                        {
                            for (sink_kind, sink_fact) in sinks.iter() {
                                if is_within_budget(
                                    source_fact.distance,
                                    sink_fact.distance,
                                    config.max_trace_length,
                                ) {
                                    candidates.push(Candidate {
                                        location: site,
                                        source_site: source_fact.origin,
                                        sink_site: sink_fact.origin,
                                        source_kind: source_kind.clone(),
                                        sink_kind: sink_kind.clone(),
                                        source_distance: source_fact.distance,
                                        sink_distance: sink_fact.distance,
                                    });
                                }
                            }
                        }
                    }
                }

                Op::Source { .. } => {}
            }
        }
    }

    candidates.sort();
    let mut seen: FxHashSet<(OpSite, OpSite)> = FxHashSet::default();
    let mut issues = Vec::new();
    for candidate in candidates {
        if seen.insert((candidate.source_site, candidate.sink_site)) {
            issues.push(resolve(graph, candidate));
        }
    }
    Ok(issues)
}

fn resolve(graph: &CallGraph, candidate: Candidate) -> Issue {
    let locate = |site: OpSite| Location {
        function: graph
            .node(petgraph::graph::NodeIndex::new(site.function as usize))
            .name
            .clone(),
        op: site.op,
    };
    Issue {
        source_kind: candidate.source_kind,
        source_distance: candidate.source_distance,
        sink_kind: candidate.sink_kind,
        sink_distance: candidate.sink_distance,
        location: locate(candidate.location),
        source: locate(candidate.source_site),
        sink: locate(candidate.sink_site),
    }
}
