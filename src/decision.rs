//! Decision types returned by every admission call.
//!
//! A `DecisionRecord` is a pure value: it has no identity and is never
//! mutated after construction. `allowed` and `available_at` are always
//! derived, never stored, so there is no way to construct an
//! inconsistent record. All decision types derive `serde::Serialize`/
//! `Deserialize` so a caller-side HTTP adaptor can hand one back as a
//! response body without a translation layer.

/// The result of a plain (non-concurrency-aware) admission call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DecisionRecord {
    /// Seconds until the next allowed attempt. `0` iff allowed.
    pub retry_after_seconds: u64,
    /// Admissions still available in the current budgeting horizon.
    pub retries_left: u64,
    /// The effective cap reported to the caller (algorithm-dependent).
    pub limit: u64,
}

impl DecisionRecord {
    /// Construct a record from its three independent fields.
    pub fn new(retry_after_seconds: u64, retries_left: u64, limit: u64) -> Self {
        Self {
            retry_after_seconds,
            retries_left,
            limit,
        }
    }

    /// Whether the call was admitted.
    pub fn allowed(&self) -> bool {
        self.retry_after_seconds == 0
    }

    /// Wall-clock second at which the next admission becomes possible,
    /// given the current wall-clock second.
    pub fn available_at(&self, now_seconds: u64) -> u64 {
        now_seconds + self.retry_after_seconds
    }
}

/// Why a concurrency-aware admission was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RejectionCause {
    /// Not denied.
    None,
    /// The concurrency gate was at capacity; the base limiter was never
    /// consulted and its state was not mutated.
    GateExhausted,
    /// The gate had room but the base limiter denied the request; any
    /// gate slot taken for this attempt has already been released.
    RateExceeded,
}

/// A projected, uniform view over `ConcurrencyDecision`, adding the
/// concurrency-aware fields to the base record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExtendedDecisionRecord {
    /// The base rate-limit decision.
    pub base: DecisionRecord,
    /// True iff the call holds a concurrency slot at return time.
    pub gate_acquired: bool,
    /// Classification of why the call was denied, if it was.
    pub rejection_cause: RejectionCause,
    /// Gate occupancy observed during this call.
    pub current_in_flight: u64,
    /// Configured gate capacity.
    pub max_in_flight: u64,
}

/// The outcome of `ConcurrencyAwareLimiter::attempt_with_concurrency`,
/// modeled as a tagged variant per the cause of denial rather than a
/// single struct with nullable fields — callers match on why a call was
/// denied instead of checking which fields happen to be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "outcome")]
pub enum ConcurrencyDecision {
    /// Gate slot acquired and the base limiter admitted the request.
    /// The caller now owns the slot and must eventually release it.
    Allowed {
        base: DecisionRecord,
        current_in_flight: u64,
        max_in_flight: u64,
    },
    /// The gate had room, but the base limiter denied the request. Any
    /// slot taken for this attempt has already been released.
    DeniedByRate {
        base: DecisionRecord,
        current_in_flight: u64,
        max_in_flight: u64,
    },
    /// The gate was already at capacity; the base limiter was never
    /// consulted.
    DeniedByGate {
        current_in_flight: u64,
        max_in_flight: u64,
    },
}

impl ConcurrencyDecision {
    /// Whether this decision represents an admitted call.
    pub fn is_allowed(&self) -> bool {
        matches!(self, ConcurrencyDecision::Allowed { .. })
    }

    /// Project down to the uniform extended shape every caller can read
    /// without matching on the variant.
    pub fn into_record(self) -> ExtendedDecisionRecord {
        match self {
            ConcurrencyDecision::Allowed {
                base,
                current_in_flight,
                max_in_flight,
            } => ExtendedDecisionRecord {
                base,
                gate_acquired: true,
                rejection_cause: RejectionCause::None,
                current_in_flight,
                max_in_flight,
            },
            ConcurrencyDecision::DeniedByRate {
                base,
                current_in_flight,
                max_in_flight,
            } => ExtendedDecisionRecord {
                base,
                gate_acquired: false,
                rejection_cause: RejectionCause::RateExceeded,
                current_in_flight,
                max_in_flight,
            },
            ConcurrencyDecision::DeniedByGate {
                current_in_flight,
                max_in_flight,
            } => ExtendedDecisionRecord {
                base: DecisionRecord::new(1, 0, max_in_flight),
                gate_acquired: false,
                rejection_cause: RejectionCause::GateExhausted,
                current_in_flight,
                max_in_flight,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_iff_zero_retry_after() {
        let allowed = DecisionRecord::new(0, 4, 5);
        assert!(allowed.allowed());

        let denied = DecisionRecord::new(3, 0, 5);
        assert!(!denied.allowed());
    }

    #[test]
    fn available_at_adds_retry_after() {
        let record = DecisionRecord::new(7, 0, 5);
        assert_eq!(record.available_at(100), 107);
    }

    #[test]
    fn gate_exhausted_never_acquires_and_base_is_untouched() {
        let decision = ConcurrencyDecision::DeniedByGate {
            current_in_flight: 2,
            max_in_flight: 2,
        };
        let record = decision.into_record();
        assert!(!record.gate_acquired);
        assert_eq!(record.rejection_cause, RejectionCause::GateExhausted);
    }

    #[test]
    fn rate_exceeded_releases_gate() {
        let decision = ConcurrencyDecision::DeniedByRate {
            base: DecisionRecord::new(5, 0, 2),
            current_in_flight: 1,
            max_in_flight: 2,
        };
        let record = decision.into_record();
        assert!(!record.gate_acquired);
        assert_eq!(record.rejection_cause, RejectionCause::RateExceeded);
        assert_eq!(record.base.retry_after_seconds, 5);
    }

    #[test]
    fn allowed_carries_gate_acquired_true() {
        let decision = ConcurrencyDecision::Allowed {
            base: DecisionRecord::new(0, 1, 2),
            current_in_flight: 1,
            max_in_flight: 2,
        };
        let record = decision.into_record();
        assert!(record.gate_acquired);
        assert_eq!(record.rejection_cause, RejectionCause::None);
    }
}
