//! Top-level analysis driver.

use crate::call_graph::CallGraph;
use crate::config::AnalysisConfig;
use crate::interprocedural;
use crate::issues;
use crate::lattice::Summary;
use crate::types::{AnalysisError, Issue};

/// Whole-program taint analyzer: fixed-point summary computation followed
/// by issue detection, both driven by one explicit configuration.
#[derive(Debug, Clone, Default)]
pub struct TaintAnalyzer {
    config: AnalysisConfig,
}

impl TaintAnalyzer {
    /// Creates an analyzer with the given configuration.
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// The configuration this analyzer runs with.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Runs the full analysis over `graph`.
    pub fn run(&self, graph: &CallGraph) -> Result<AnalysisResult, AnalysisError> {
        let summaries = interprocedural::compute_summaries(graph, &self.config)?;
        let issues = issues::detect(graph, &summaries, &self.config)?;
        Ok(AnalysisResult { summaries, issues })
    }
}

/// Converged summaries plus the issues detected over them.
#[derive(Debug)]
pub struct AnalysisResult {
    summaries: Vec<Summary>,
    issues: Vec<Issue>,
}

impl AnalysisResult {
    /// Detected issues, sorted by call-site location.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Consumes the result, yielding the issues.
    #[must_use]
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// The converged summary of the named function.
    #[must_use]
    pub fn summary(&self, graph: &CallGraph, name: &str) -> Option<&Summary> {
        let index = graph.node_index(name)?;
        self.summaries.get(index.index())
    }
}
