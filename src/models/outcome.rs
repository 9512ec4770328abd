//! Probe outcome data model

use crate::types::ProbeFailure;
use serde::{Deserialize, Serialize};

/// Result of probing one candidate address
///
/// The serialized field names follow the result file layout consumed by
/// tunneling client tooling: `ip`, `response_time` and `available`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    #[serde(rename = "ip")]
    address: String,

    #[serde(rename = "response_time", default)]
    latency_millis: Option<f64>,

    available: bool,

    #[serde(skip)]
    failure: Option<ProbeFailure>,
}

impl ProbeOutcome {
    /// A probe that passed every stage in `latency_millis` milliseconds
    pub fn available<S: Into<String>>(address: S, latency_millis: f64) -> Self {
        Self {
            address: address.into(),
            latency_millis: Some(latency_millis),
            available: true,
            failure: None,
        }
    }

    /// A probe that stopped at some stage
    pub fn unavailable<S: Into<String>>(address: S, failure: ProbeFailure) -> Self {
        Self {
            address: address.into(),
            latency_millis: None,
            available: false,
            failure: Some(failure),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Measured latency, present only for available outcomes
    pub fn latency_millis(&self) -> Option<f64> {
        if self.available {
            self.latency_millis
        } else {
            None
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn failure(&self) -> Option<&ProbeFailure> {
        self.failure.as_ref()
    }

    /// Latency used for ordering; unavailable outcomes sort last
    pub fn sort_latency(&self) -> f64 {
        self.latency_millis().unwrap_or(f64::INFINITY)
    }

    /// Whether this outcome may appear in a ranked result
    ///
    /// Records read back from disk may claim availability without a usable
    /// latency; those are not rankable.
    pub fn is_rankable(&self) -> bool {
        matches!(self.latency_millis(), Some(ms) if ms.is_finite() && ms >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailureReason, ProbeStage};

    #[test]
    fn test_available_outcome() {
        let outcome = ProbeOutcome::available("1.0.0.1", 5.0);
        assert_eq!(outcome.address(), "1.0.0.1");
        assert_eq!(outcome.latency_millis(), Some(5.0));
        assert!(outcome.is_available());
        assert!(outcome.is_rankable());
        assert!(outcome.failure().is_none());
    }

    #[test]
    fn test_unavailable_outcome_has_infinite_sort_latency() {
        let outcome = ProbeOutcome::unavailable("10.0.0.1", ProbeFailure::timeout(ProbeStage::Connect));
        assert!(!outcome.is_available());
        assert_eq!(outcome.latency_millis(), None);
        assert_eq!(outcome.sort_latency(), f64::INFINITY);
        assert!(!outcome.is_rankable());
        assert_eq!(outcome.failure().map(|f| &f.reason), Some(&FailureReason::Timeout));
    }

    #[test]
    fn test_serialized_layout() {
        let outcome = ProbeOutcome::available("104.16.1.2", 42.5);
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["ip"], "104.16.1.2");
        assert_eq!(json["response_time"], 42.5);
        assert_eq!(json["available"], true);
        assert!(json.get("failure").is_none());
    }

    #[test]
    fn test_deserialized_record_without_latency_is_not_rankable() {
        let outcome: ProbeOutcome =
            serde_json::from_str(r#"{"ip": "104.16.1.2", "available": true}"#).unwrap();
        assert!(outcome.is_available());
        assert!(!outcome.is_rankable());
    }
}
