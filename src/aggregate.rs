use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

use crate::collector::{MatchRecord, PlayerOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerFailure {
    pub puuid: String,
    pub reason: String,
}

/// Everything a run produced, plus the numbers worth reporting.
#[derive(Debug)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub players_total: usize,
    pub failures: Vec<PlayerFailure>,
    pub records: Vec<MatchRecord>,
}

impl RunReport {
    pub fn players_ok(&self) -> usize {
        self.players_total - self.failures.len()
    }

    pub fn log_summary(&self) {
        info!(
            "Run started {} finished in {:.1}s: {} records from {}/{} players",
            self.started_at.to_rfc3339(),
            self.elapsed.as_secs_f64(),
            self.records.len(),
            self.players_ok(),
            self.players_total
        );
        if !self.failures.is_empty() {
            warn!("{} players contributed nothing", self.failures.len());
            for failure in &self.failures {
                warn!("  {}: {}", failure.puuid, failure.reason);
            }
        }
    }
}

/// Concatenates per-player records in player order. Duplicates are kept:
/// a match shared by two sampled players shows up twice. Failed players add
/// nothing and are listed in `failures`.
pub fn flatten(
    outcomes: Vec<PlayerOutcome>,
    started_at: DateTime<Utc>,
    elapsed: Duration,
) -> RunReport {
    let players_total = outcomes.len();
    let mut failures = Vec::new();
    let mut records = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(player_records) => records.extend(player_records),
            Err(err) => failures.push(PlayerFailure {
                puuid: outcome.puuid,
                reason: err.to_string(),
            }),
        }
    }

    RunReport {
        started_at,
        elapsed,
        players_total,
        failures,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectError;
    use serde_json::json;

    fn ok(puuid: &str, ids: &[&str]) -> PlayerOutcome {
        PlayerOutcome {
            puuid: puuid.to_string(),
            result: Ok(ids.iter().map(|id| json!({ "matchId": id })).collect()),
        }
    }

    #[test]
    fn keeps_player_order_and_duplicates() {
        let outcomes = vec![ok("a", &["m1", "m2"]), ok("b", &["m2"])];

        let report = flatten(outcomes, Utc::now(), Duration::from_secs(3));

        let ids: Vec<&str> = report
            .records
            .iter()
            .filter_map(|r| r["matchId"].as_str())
            .collect();
        assert_eq!(ids, vec!["m1", "m2", "m2"]);
        assert_eq!(report.players_ok(), 2);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn failed_players_are_counted_not_flattened() {
        let outcomes = vec![
            ok("a", &["m1"]),
            PlayerOutcome {
                puuid: "b".to_string(),
                result: Err(CollectError::Projection {
                    match_id: "m9".to_string(),
                    reason: "missing info.participants".to_string(),
                }),
            },
        ];

        let report = flatten(outcomes, Utc::now(), Duration::ZERO);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.players_total, 2);
        assert_eq!(report.players_ok(), 1);
        assert_eq!(report.failures[0].puuid, "b");
        assert!(report.failures[0].reason.contains("m9"));
    }
}
