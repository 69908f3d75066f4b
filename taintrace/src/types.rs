//! Core types for taint analysis.

use crate::distance::Distance;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Identifier for a class of sensitive data or sensitive operation.
///
/// The engine tracks each kind independently; a single value may carry
/// facts of several kinds at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaintKind(CompactString);

impl TaintKind {
    /// Creates a kind from its name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(CompactString::new(name))
    }

    /// The kind's name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for TaintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaintKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A specific operation within a function body, identified by the
/// function's call-graph index and the operation's position in the body.
///
/// Sites are the identity used for issue de-duplication: one issue per
/// (source production site, sink consumption site) pair, regardless of how
/// many call chains connect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpSite {
    /// Call-graph index of the containing function.
    pub function: u32,
    /// Position of the operation in the function body.
    pub op: u32,
}

impl OpSite {
    /// Creates a site.
    #[must_use]
    pub fn new(function: u32, op: u32) -> Self {
        Self { function, op }
    }
}

/// A resolved source location in issue output: function name plus
/// operation index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Name of the containing function.
    pub function: CompactString,
    /// Position of the operation in the function body.
    pub op: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.function, self.op)
    }
}

/// A reported source-reaches-sink event.
///
/// Created once at issue-detection time and immutable thereafter. The
/// combined trace length (`source_distance + sink_distance`) is guaranteed
/// to be within the configured maximum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Kind of the source the tainted value originated from.
    pub source_kind: TaintKind,
    /// Call hops from the source production site to the call site.
    pub source_distance: Distance,
    /// Kind of the sink the value reached.
    pub sink_kind: TaintKind,
    /// Call hops from the call site to the sink consumption site.
    pub sink_distance: Distance,
    /// The call site where the flow was observed.
    pub location: Location,
    /// Where the taint was produced.
    pub source: Location,
    /// Where the sink consumed it.
    pub sink: Location,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (distance {}) -> {} (distance {}) at {}",
            self.source_kind, self.source_distance, self.sink_kind, self.sink_distance, self.location
        )
    }
}

/// Errors surfaced by call-graph validation and the fixed-point engine.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A call references a function the call graph does not define.
    #[error("unknown function: {0}")]
    UnknownFunction(CompactString),
    /// A function is defined more than once.
    #[error("duplicate function definition: {0}")]
    DuplicateFunction(CompactString),
    /// The iteration guard tripped before summaries stabilized.
    ///
    /// Unreachable for well-formed input given the distance ceiling; a
    /// trip indicates an engine bug and never yields partial results.
    #[error("fixed point did not converge while recomputing {function} (after {iterations} iterations)")]
    Divergence {
        /// Function being recomputed when the guard tripped.
        function: CompactString,
        /// Number of recomputations performed in the offending component.
        iterations: usize,
    },
    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
