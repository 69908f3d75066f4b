//! Call graph over function bodies.
//!
//! The graph is supplied fully built by the front end: each function with
//! its operation sequence, edges derived from the call operations. May
//! contain cycles (recursion, mutual recursion). Validation fails fast if a
//! call references an undefined function, since no summary could ever be
//! computed for it.

use crate::ir::{FunctionBody, Op};
use crate::types::AnalysisError;
use compact_str::CompactString;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;

/// A function identity in the call graph.
#[derive(Debug)]
pub struct FunctionNode {
    /// The function's name, unique within the graph.
    pub name: CompactString,
    /// The function's operation sequence.
    pub body: FunctionBody,
}

/// Directed call graph with name lookup.
#[derive(Debug)]
pub struct CallGraph {
    graph: DiGraph<FunctionNode, ()>,
    by_name: FxHashMap<CompactString, NodeIndex>,
}

impl CallGraph {
    /// Starts building a call graph.
    #[must_use]
    pub fn builder() -> CallGraphBuilder {
        CallGraphBuilder::default()
    }

    /// Number of functions in the graph.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn node_index(&self, name: &str) -> Option<NodeIndex> {
        self.by_name.get(name).copied()
    }

    /// The function at `index`.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &FunctionNode {
        &self.graph[index]
    }

    /// All functions, in insertion order.
    pub fn functions(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Direct callers of `func`.
    pub fn callers(&self, func: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(func, Direction::Incoming)
    }

    /// Strongly-connected components grouped into dependency levels.
    ///
    /// Level 0 holds SCCs with no external callees; every SCC at level n
    /// only calls into levels below n. Processing levels in ascending order
    /// guarantees each SCC sees converged callee summaries; SCCs within one
    /// level are independent and may be solved in parallel.
    #[must_use]
    pub fn scc_levels(&self) -> Vec<Vec<Vec<NodeIndex>>> {
        // tarjan_scc yields components in reverse topological order, so a
        // component's external callees always precede it.
        let sccs = tarjan_scc(&self.graph);

        let mut scc_of = vec![usize::MAX; self.graph.node_count()];
        for (index, scc) in sccs.iter().enumerate() {
            for &node in scc {
                scc_of[node.index()] = index;
            }
        }

        let mut level_of = vec![0usize; sccs.len()];
        for (index, scc) in sccs.iter().enumerate() {
            let mut level = 0;
            for &node in scc {
                for callee in self.graph.neighbors_directed(node, Direction::Outgoing) {
                    let callee_scc = scc_of[callee.index()];
                    if callee_scc != index {
                        level = level.max(level_of[callee_scc] + 1);
                    }
                }
            }
            level_of[index] = level;
        }

        let depth = level_of.iter().max().map_or(0, |max| max + 1);
        let mut levels = vec![Vec::new(); depth];
        for (index, scc) in sccs.into_iter().enumerate() {
            levels[level_of[index]].push(scc);
        }
        levels
    }
}

/// Accumulates function definitions, then validates and produces the graph.
#[derive(Debug, Default)]
pub struct CallGraphBuilder {
    functions: Vec<(CompactString, FunctionBody)>,
}

impl CallGraphBuilder {
    /// Adds a function definition.
    #[must_use]
    pub fn function(mut self, name: &str, body: FunctionBody) -> Self {
        self.functions.push((CompactString::new(name), body));
        self
    }

    /// Validates the definitions and builds the graph.
    ///
    /// Fails with [`AnalysisError::DuplicateFunction`] on redefinition and
    /// [`AnalysisError::UnknownFunction`] when a call references a function
    /// that was never defined.
    pub fn build(self) -> Result<CallGraph, AnalysisError> {
        let mut graph = DiGraph::new();
        let mut by_name: FxHashMap<CompactString, NodeIndex> = FxHashMap::default();

        for (name, body) in self.functions {
            if by_name.contains_key(&name) {
                return Err(AnalysisError::DuplicateFunction(name));
            }
            let index = graph.add_node(FunctionNode {
                name: name.clone(),
                body,
            });
            by_name.insert(name, index);
        }

        let mut edges = Vec::new();
        for index in graph.node_indices() {
            for op in graph[index].body.ops() {
                if let Op::Call { callee, .. } = op {
                    match by_name.get(callee) {
                        Some(&target) => edges.push((index, target)),
                        None => return Err(AnalysisError::UnknownFunction(callee.clone())),
                    }
                }
            }
        }
        for (caller, callee) in edges {
            // update_edge collapses repeated call sites into one edge.
            graph.update_edge(caller, callee, ());
        }

        Ok(CallGraph { graph, by_name })
    }
}
