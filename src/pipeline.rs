use chrono::Utc;
use tokio::time::Instant;
use tracing::info;

use crate::aggregate::{RunReport, flatten};
use crate::collector::{CollectOptions, MatchCollector};
use crate::fetch::Transport;
use crate::riot_api::RiotClient;
use crate::sampler::{PlayerSampler, SampleError, SamplingStrategy};

/// Sample players, collect their matches, flatten.
///
/// Only a failure to build the player list aborts the run; anything that
/// goes wrong for an individual player ends up in the report instead.
pub async fn run<T: Transport>(
    client: &RiotClient<T>,
    strategy: &SamplingStrategy,
    options: CollectOptions,
) -> Result<RunReport, SampleError> {
    let started_at = Utc::now();
    let start = Instant::now();

    let players = PlayerSampler::new(client).sample(strategy).await?;
    info!("Sampled {} players", players.len());

    let outcomes = MatchCollector::new(client, options).collect(&players).await;

    Ok(flatten(outcomes, started_at, start.elapsed()))
}
