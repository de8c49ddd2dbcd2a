use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::fetch::{FetchError, Transport};
use crate::riot_api::{FetchTarget, LeagueEntry, RiotClient};

/// One fetched match or timeline document, passed through uninterpreted.
pub type MatchRecord = Value;

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Could not project match {match_id}: {reason}")]
    Projection { match_id: String, reason: String },
}

/// How much of each document is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Projection {
    #[default]
    Full,
    /// Only `info.participants`.
    Participants,
}

impl Projection {
    pub fn apply(self, match_id: &str, document: Value) -> Result<MatchRecord, CollectError> {
        match self {
            Projection::Full => Ok(document),
            Projection::Participants => match document
                .get("info")
                .and_then(|info| info.get("participants"))
            {
                Some(participants @ Value::Array(_)) => Ok(participants.clone()),
                _ => Err(CollectError::Projection {
                    match_id: match_id.to_string(),
                    reason: "missing info.participants".to_string(),
                }),
            },
        }
    }
}

/// What a single failing match does to the rest of its player's batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Any failure empties the player's whole contribution.
    #[default]
    DiscardPlayer,
    /// Failing matches are dropped and the rest are kept.
    SkipMatch,
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Most recent matches fetched per player.
    pub depth: usize,
    pub target: FetchTarget,
    pub projection: Projection,
    pub failure_policy: FailurePolicy,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            depth: 20,
            target: FetchTarget::Matches,
            projection: Projection::Full,
            failure_policy: FailurePolicy::DiscardPlayer,
        }
    }
}

/// Result of one player's unit of work.
#[derive(Debug)]
pub struct PlayerOutcome {
    pub puuid: String,
    pub result: Result<Vec<MatchRecord>, CollectError>,
}

/// Fans out one unit of work per player and, inside it, one fetch per match.
/// Everything still funnels through the client's single rate limiter.
pub struct MatchCollector<'a, T> {
    client: &'a RiotClient<T>,
    options: CollectOptions,
}

impl<'a, T: Transport> MatchCollector<'a, T> {
    pub fn new(client: &'a RiotClient<T>, options: CollectOptions) -> Self {
        Self { client, options }
    }

    /// Outcomes come back in the order players were given. A failure stays
    /// inside its player's outcome and never cancels siblings.
    pub async fn collect(&self, players: &[LeagueEntry]) -> Vec<PlayerOutcome> {
        let total = players.len();
        info!(
            "Collecting up to {} {:?} for {} players",
            self.options.depth, self.options.target, total
        );

        join_all(players.iter().map(|player| async move {
            let result = self.collect_player(&player.puuid).await;
            match &result {
                Ok(records) => debug!("{}: {} records", player.puuid, records.len()),
                Err(err) => warn!("Dropping player {}: {}", player.puuid, err),
            }
            PlayerOutcome {
                puuid: player.puuid.clone(),
                result,
            }
        }))
        .await
    }

    pub async fn collect_player(&self, puuid: &str) -> Result<Vec<MatchRecord>, CollectError> {
        if self.options.depth == 0 {
            return Ok(Vec::new());
        }

        let match_ids = self
            .client
            .get_match_ids_by_puuid(puuid, self.options.depth)
            .await?;

        let fetched = join_all(match_ids.iter().map(|match_id| self.fetch_record(match_id))).await;

        match self.options.failure_policy {
            FailurePolicy::DiscardPlayer => fetched.into_iter().collect(),
            FailurePolicy::SkipMatch => Ok(fetched
                .into_iter()
                .filter_map(|record| match record {
                    Ok(record) => Some(record),
                    Err(err) => {
                        warn!("Skipping match for {}: {}", puuid, err);
                        None
                    }
                })
                .collect()),
        }
    }

    async fn fetch_record(&self, match_id: &str) -> Result<MatchRecord, CollectError> {
        let document = self
            .client
            .get_match_document(match_id, self.options.target)
            .await?;
        self.options.projection.apply(match_id, document)
    }
}
