//! The taint lattice: per-kind fact maps and function summaries.
//!
//! A fact map keeps, for every taint kind, the closest known origin. `join`
//! is commutative, associative and idempotent with the empty map as bottom,
//! which is what lets the fixed-point engine converge regardless of the
//! order functions are revisited in.

use crate::distance::Distance;
use crate::types::{OpSite, TaintKind};
use rustc_hash::FxHashMap;

/// One provenance fact: the closest origin of a given kind, as seen from
/// the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fact {
    /// Call hops from the origin to the current frame.
    pub distance: Distance,
    /// The operation that produced (source) or consumed (sink) the value.
    pub origin: OpSite,
}

impl Fact {
    /// Creates a fact rooted at `origin`, `distance` hops away.
    #[must_use]
    pub fn new(distance: Distance, origin: OpSite) -> Self {
        Self { distance, origin }
    }

    /// Lattice preference: smaller distance wins; ties break on the
    /// smaller origin site so joins are order-independent.
    fn better(self, other: Fact) -> Fact {
        if (other.distance, other.origin) < (self.distance, self.origin) {
            other
        } else {
            self
        }
    }
}

/// Map from taint kind to the closest known fact of that kind.
///
/// Bottom is the empty map. Per (value, kind) only the minimum distance is
/// retained; shorter paths dominate longer ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactMap {
    facts: FxHashMap<TaintKind, Fact>,
}

impl FactMap {
    /// The bottom element: no facts known.
    #[must_use]
    pub fn bottom() -> Self {
        Self::default()
    }

    /// Whether no facts are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// The fact for `kind`, if any.
    #[must_use]
    pub fn get(&self, kind: &TaintKind) -> Option<Fact> {
        self.facts.get(kind).copied()
    }

    /// Iterates over all (kind, fact) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&TaintKind, Fact)> {
        self.facts.iter().map(|(kind, fact)| (kind, *fact))
    }

    /// Inserts a fact, or tightens the existing one if the new fact is
    /// closer. Returns whether the map changed.
    pub fn add(&mut self, kind: TaintKind, fact: Fact) -> bool {
        match self.facts.get_mut(&kind) {
            Some(existing) => {
                let merged = existing.better(fact);
                if merged == *existing {
                    false
                } else {
                    *existing = merged;
                    true
                }
            }
            None => {
                self.facts.insert(kind, fact);
                true
            }
        }
    }

    /// Joins `other` into `self`, keeping the closer fact per kind.
    /// Returns whether `self` changed.
    pub fn join(&mut self, other: &FactMap) -> bool {
        let mut changed = false;
        for (kind, fact) in &other.facts {
            changed |= self.add(kind.clone(), *fact);
        }
        changed
    }

    /// Joins `other` into `self` as part of exporting facts into the
    /// summary of function `exporter`.
    ///
    /// A fact gains one hop when it crosses a function boundary it did not
    /// originate in: the distance of a summary fact counts call edges
    /// between the summarized function and the fact's origin function.
    /// Facts whose origin lies in `exporter` keep their distance.
    /// Re-based distances are clamped so anything beyond the reportable
    /// ceiling collapses to the sentinel, keeping the lattice finite under
    /// recursion.
    pub fn join_exported(&mut self, other: &FactMap, exporter: u32, max_trace_length: u32) -> bool {
        let mut changed = false;
        for (kind, fact) in &other.facts {
            let distance = if fact.origin.function == exporter {
                fact.distance
            } else {
                fact.distance.combine(Distance::ONE)
            };
            let rebased = Fact::new(distance.clamp(max_trace_length), fact.origin);
            changed |= self.add(kind.clone(), rebased);
        }
        changed
    }
}

/// Per-function taint facts, valid once the fixed point is reached.
///
/// Owned by the engine; read-only to issue detection. Starts at bottom and
/// only tightens between iterations (more facts, or smaller distances).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Source facts carried by the return value.
    pub return_sources: FactMap,
    /// Per parameter: sink facts reachable from it.
    pub param_sinks: Vec<FactMap>,
    /// Per parameter: whether it flows to the return value.
    pub param_to_return: Vec<bool>,
}

impl Summary {
    /// The bottom summary for a function with `param_count` parameters.
    #[must_use]
    pub fn bottom(param_count: usize) -> Self {
        Self {
            return_sources: FactMap::bottom(),
            param_sinks: vec![FactMap::bottom(); param_count],
            param_to_return: vec![false; param_count],
        }
    }

    /// Sink facts for parameter `index`, or bottom past the declared count.
    #[must_use]
    pub fn sinks_for_param(&self, index: usize) -> Option<&FactMap> {
        self.param_sinks.get(index)
    }
}
