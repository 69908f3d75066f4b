//! Provenance distances and the trace-length budget.
//!
//! A distance counts call hops between an origin (source production or sink
//! consumption) and the frame observing the fact. Arithmetic saturates: a
//! distance that can no longer contribute to a reportable issue collapses to
//! the `TOO_FAR` sentinel, which is excluded from all budget checks.

use serde::Serialize;

/// Non-negative call-hop count with a saturating "too far" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Distance(u32);

impl Distance {
    /// At the origin call itself.
    pub const ZERO: Distance = Distance(0);
    /// One call hop; the re-basing step applied per call site.
    pub const ONE: Distance = Distance(1);
    /// Sentinel for distances beyond any reportable trace length.
    pub const TOO_FAR: Distance = Distance(u32::MAX);

    /// Creates a distance of `hops` call hops.
    #[must_use]
    pub fn new(hops: u32) -> Self {
        Self(hops)
    }

    /// The hop count, or `None` for the sentinel.
    #[must_use]
    pub fn hops(self) -> Option<u32> {
        if self == Self::TOO_FAR {
            None
        } else {
            Some(self.0)
        }
    }

    /// Whether this is the sentinel.
    #[must_use]
    pub fn is_too_far(self) -> bool {
        self == Self::TOO_FAR
    }

    /// Adds two distances, saturating to `TOO_FAR` instead of wrapping.
    #[must_use]
    pub fn combine(self, other: Distance) -> Distance {
        if self.is_too_far() || other.is_too_far() {
            return Self::TOO_FAR;
        }
        match self.0.checked_add(other.0) {
            Some(sum) => Self(sum),
            None => Self::TOO_FAR,
        }
    }

    /// Collapses any distance that can never appear in an issue to the
    /// sentinel.
    ///
    /// A distance above `max_trace_length` cannot satisfy the budget even
    /// paired with distance zero, so the lattice stays finite per kind and
    /// recursive re-basing terminates.
    #[must_use]
    pub fn clamp(self, max_trace_length: u32) -> Distance {
        if self.is_too_far() || self.0 > max_trace_length {
            Self::TOO_FAR
        } else {
            self
        }
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.hops() {
            Some(hops) => write!(f, "{hops}"),
            None => write!(f, "too-far"),
        }
    }
}

/// The entire truncation policy: a source/sink pair is reportable iff the
/// combined trace length stays within the configured maximum.
///
/// This is the single implementation point; issue detection never
/// approximates it elsewhere. The sentinel is never within budget.
#[must_use]
pub fn is_within_budget(source: Distance, sink: Distance, max_trace_length: u32) -> bool {
    match (source.hops(), sink.hops()) {
        (Some(a), Some(b)) => u64::from(a) + u64::from(b) <= u64::from(max_trace_length),
        _ => false,
    }
}
