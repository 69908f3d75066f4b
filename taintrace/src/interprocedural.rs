//! Interprocedural fixed-point engine.
//!
//! Summaries start at bottom and are recomputed until stable, one
//! strongly-connected component at a time in dependency order. Within a
//! component a classic worklist revisits a function whenever one of its
//! intra-component callees changed; across components, every callee summary
//! is already converged and read-only, so independent components of the
//! same dependency level can be solved in parallel.
//!
//! Termination rests on the distance ceiling: per kind a fact's distance
//! can only tighten within a finite set, so recursive re-basing cannot
//! iterate indefinitely. An iteration guard still aborts with a fatal error
//! if convergence fails to arrive, rather than ever returning partial
//! results.

use crate::call_graph::CallGraph;
use crate::config::AnalysisConfig;
use crate::intraprocedural::{self, SummaryLookup};
use crate::lattice::Summary;
use crate::types::AnalysisError;
use log::{debug, trace};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Summaries of one in-flight component overlaid on the converged rest of
/// the graph.
struct Overlay<'a> {
    converged: &'a [Summary],
    local: &'a FxHashMap<NodeIndex, Summary>,
}

impl SummaryLookup for Overlay<'_> {
    fn summary(&self, func: NodeIndex) -> &Summary {
        self.local
            .get(&func)
            .unwrap_or_else(|| &self.converged[func.index()])
    }
}

/// Computes the stable per-function summaries for the whole call graph.
///
/// The returned vector is indexed by call-graph node index and read-only
/// from here on; issue detection consumes it as-is.
pub fn compute_summaries(
    graph: &CallGraph,
    config: &AnalysisConfig,
) -> Result<Vec<Summary>, AnalysisError> {
    let mut summaries: Vec<Summary> = graph
        .functions()
        .map(|func| Summary::bottom(graph.node(func).body.param_count()))
        .collect();

    let levels = graph.scc_levels();
    debug!(
        "solving {} functions across {} dependency levels",
        graph.function_count(),
        levels.len()
    );

    for (depth, level) in levels.into_iter().enumerate() {
        let solved: Vec<Vec<(NodeIndex, Summary)>> = if config.parallel && level.len() > 1 {
            level
                .par_iter()
                .map(|component| solve_component(graph, component, &summaries, config))
                .collect::<Result<_, _>>()?
        } else {
            level
                .iter()
                .map(|component| solve_component(graph, component, &summaries, config))
                .collect::<Result<_, _>>()?
        };

        // Components of one level touch disjoint functions, so the merge
        // order cannot affect the outcome.
        for component in solved {
            for (func, summary) in component {
                summaries[func.index()] = summary;
            }
        }
        trace!("dependency level {depth} converged");
    }

    Ok(summaries)
}

/// Runs the worklist to a fixed point within one strongly-connected
/// component.
fn solve_component(
    graph: &CallGraph,
    component: &[NodeIndex],
    converged: &[Summary],
    config: &AnalysisConfig,
) -> Result<Vec<(NodeIndex, Summary)>, AnalysisError> {
    let members: FxHashSet<NodeIndex> = component.iter().copied().collect();
    let mut local: FxHashMap<NodeIndex, Summary> = component
        .iter()
        .map(|&func| (func, Summary::bottom(graph.node(func).body.param_count())))
        .collect();

    let mut worklist: VecDeque<NodeIndex> = component.iter().copied().collect();
    let mut queued: FxHashSet<NodeIndex> = members.clone();

    let budget = config.max_iterations.saturating_mul(component.len().max(1));
    let mut iterations = 0usize;

    while let Some(func) = worklist.pop_front() {
        queued.remove(&func);
        iterations += 1;
        if iterations > budget {
            return Err(AnalysisError::Divergence {
                function: graph.node(func).name.clone(),
                iterations,
            });
        }

        let summary = {
            let overlay = Overlay {
                converged,
                local: &local,
            };
            intraprocedural::propagate(graph, func, &overlay, config)?.summary
        };

        if local.get(&func) != Some(&summary) {
            trace!(
                "summary of {} changed; revisiting its callers",
                graph.node(func).name
            );
            local.insert(func, summary);
            for caller in graph.callers(func) {
                if members.contains(&caller) && queued.insert(caller) {
                    worklist.push_back(caller);
                }
            }
        }
    }

    let mut result: Vec<(NodeIndex, Summary)> = local.into_iter().collect();
    result.sort_by_key(|(func, _)| func.index());
    Ok(result)
}
