//! Core library for the taintrace interprocedural taint-flow analyzer.
//!
//! Tracks values produced by designated source operations across a
//! whole-program call graph, detects when they reach designated sink
//! operations, and bounds how far a provenance trace may extend before the
//! flow is discarded. The call graph and per-function operation sequences
//! are supplied by an external front end; issue records go to an external
//! reporting layer.

#![allow(clippy::type_complexity, clippy::too_many_arguments, clippy::ptr_arg)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module containing the top-level analysis driver.
pub mod analyzer;

/// Module containing the call graph and its builder.
pub mod call_graph;

/// Module for loading configuration.
pub mod config;

/// Module defining provenance distances and the trace-length budget.
pub mod distance;

/// Module containing the interprocedural fixed-point engine.
pub mod interprocedural;

/// Module containing the single-function taint propagator.
pub mod intraprocedural;

/// Module defining the function-body abstraction consumed by the engine.
pub mod ir;

/// Module containing issue detection over converged summaries.
pub mod issues;

/// Module defining the taint lattice: fact maps and summaries.
pub mod lattice;

/// Module containing shared test fixtures (parametrized call-graph shapes).
pub mod test_utils;

/// Module defining the core taint analysis types.
pub mod types;

pub use analyzer::{AnalysisResult, TaintAnalyzer};
pub use call_graph::{CallGraph, CallGraphBuilder};
pub use config::AnalysisConfig;
pub use distance::Distance;
pub use ir::FunctionBody;
pub use types::{AnalysisError, Issue, TaintKind};
