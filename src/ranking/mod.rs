//! Ranking of probe outcomes
//!
//! Only available outcomes are ranked. They are ordered by ascending
//! latency; equal latencies fall back to the numeric value of the IPv4
//! address so the same outcome set always yields the same ranking,
//! whatever order the probes completed in.

use crate::models::ProbeOutcome;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::net::Ipv4Addr;

/// Best available outcomes, fastest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedResult(Vec<ProbeOutcome>);

impl RankedResult {
    /// Rebuild a ranking from previously saved records
    ///
    /// Records are re-ranked, so a hand-edited file still yields a valid
    /// ordering and unusable entries are dropped.
    pub fn from_saved(records: Vec<ProbeOutcome>) -> Self {
        let count = records.len();
        rank(&records, count)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProbeOutcome> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ProbeOutcome] {
        &self.0
    }

    /// Fastest outcome, if any
    pub fn best(&self) -> Option<&ProbeOutcome> {
        self.0.first()
    }

    pub fn addresses(&self) -> Vec<&str> {
        self.0.iter().map(ProbeOutcome::address).collect()
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a ProbeOutcome;
    type IntoIter = std::slice::Iter<'a, ProbeOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Keep the `top_n` fastest available outcomes
///
/// Returns every available outcome when fewer than `top_n` exist and an
/// empty result when none do.
pub fn rank(outcomes: &[ProbeOutcome], top_n: usize) -> RankedResult {
    let mut ranked: Vec<ProbeOutcome> = outcomes
        .iter()
        .filter(|outcome| outcome.is_rankable())
        .cloned()
        .collect();

    ranked.sort_by(compare_outcomes);
    ranked.truncate(top_n);

    RankedResult(ranked)
}

fn compare_outcomes(a: &ProbeOutcome, b: &ProbeOutcome) -> Ordering {
    a.sort_latency()
        .total_cmp(&b.sort_latency())
        .then_with(|| address_key(a.address()).cmp(&address_key(b.address())))
}

/// Numeric IPv4 order; anything that does not parse sorts after, by text
fn address_key(address: &str) -> (bool, u32, &str) {
    match address.trim().parse::<Ipv4Addr>() {
        Ok(ip) => (false, u32::from(ip), address),
        Err(_) => (true, 0, address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProbeFailure, ProbeStage};
    use proptest::prelude::*;

    fn unavailable(address: &str) -> ProbeOutcome {
        ProbeOutcome::unavailable(address, ProbeFailure::timeout(ProbeStage::Connect))
    }

    #[test]
    fn test_three_address_scenario() {
        let outcomes = vec![
            ProbeOutcome::available("1.1.1.1", 20.0),
            ProbeOutcome::available("1.0.0.1", 5.0),
            unavailable("10.0.0.1"),
        ];

        let ranked = rank(&outcomes, 2);
        assert_eq!(ranked.addresses(), vec!["1.0.0.1", "1.1.1.1"]);
        assert_eq!(ranked.best().and_then(ProbeOutcome::latency_millis), Some(5.0));
    }

    #[test]
    fn test_all_unavailable_is_empty() {
        let outcomes = vec![unavailable("10.0.0.1"), unavailable("10.0.0.2")];
        let ranked = rank(&outcomes, 20);
        assert!(ranked.is_empty());
        assert_eq!(ranked.best(), None);
    }

    #[test]
    fn test_top_n_larger_than_available() {
        let outcomes = vec![
            ProbeOutcome::available("1.1.1.1", 20.0),
            unavailable("10.0.0.1"),
            ProbeOutcome::available("1.0.0.1", 5.0),
        ];

        let ranked = rank(&outcomes, 10);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(&[], 20).is_empty());
    }

    #[test]
    fn test_equal_latency_uses_numeric_address_order() {
        let outcomes = vec![
            ProbeOutcome::available("104.16.10.1", 30.0),
            ProbeOutcome::available("104.16.9.1", 30.0),
            ProbeOutcome::available("9.9.9.9", 30.0),
        ];

        let ranked = rank(&outcomes, 3);
        // "104.16.10.1" < "104.16.9.1" as text, but not numerically
        assert_eq!(ranked.addresses(), vec!["9.9.9.9", "104.16.9.1", "104.16.10.1"]);
    }

    #[test]
    fn test_from_saved_drops_unusable_records() {
        let records: Vec<ProbeOutcome> = serde_json::from_str(
            r#"[
                {"ip": "1.1.1.1", "response_time": 40.0, "available": true},
                {"ip": "1.0.0.1", "response_time": 12.5, "available": true},
                {"ip": "10.0.0.1", "response_time": null, "available": false},
                {"ip": "10.0.0.2", "available": true}
            ]"#,
        )
        .unwrap();

        let ranked = RankedResult::from_saved(records);
        assert_eq!(ranked.addresses(), vec!["1.0.0.1", "1.1.1.1"]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let ranked = rank(&[ProbeOutcome::available("1.0.0.1", 5.0)], 1);
        let json = serde_json::to_value(&ranked).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["ip"], "1.0.0.1");
    }

    fn outcome_strategy() -> impl Strategy<Value = ProbeOutcome> {
        (any::<[u8; 4]>(), prop::option::of(0.0f64..2000.0)).prop_map(|(octets, latency)| {
            let address = Ipv4Addr::from(octets).to_string();
            match latency {
                Some(ms) => ProbeOutcome::available(address, ms),
                None => ProbeOutcome::unavailable(address, ProbeFailure::status(503)),
            }
        })
    }

    proptest! {
        #[test]
        fn prop_ranking_is_bounded_sorted_and_available(
            outcomes in prop::collection::vec(outcome_strategy(), 0..200),
            top_n in 0usize..50,
        ) {
            let ranked = rank(&outcomes, top_n);
            let available = outcomes.iter().filter(|o| o.is_available()).count();

            prop_assert!(ranked.len() <= top_n.min(available));
            prop_assert!(ranked.iter().all(ProbeOutcome::is_available));
            for pair in ranked.as_slice().windows(2) {
                prop_assert!(pair[0].sort_latency() <= pair[1].sort_latency());
            }
        }

        #[test]
        fn prop_ranking_ignores_input_order(
            outcomes in prop::collection::vec(outcome_strategy(), 0..100),
            top_n in 1usize..30,
        ) {
            let mut reversed = outcomes.clone();
            reversed.reverse();

            let first = rank(&outcomes, top_n);
            prop_assert_eq!(&first, &rank(&outcomes, top_n));
            prop_assert_eq!(first, rank(&reversed, top_n));
        }
    }
}
