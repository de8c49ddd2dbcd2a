use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fetch::{FetchError, Transport};
use crate::rank::{Division, Tier, all_buckets};
use crate::riot_api::{LeagueEntry, RiotClient};

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("Failed to list players: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid rank distribution: {0}")]
    InvalidDistribution(String),
}

/// Share of the sample drawn from one ladder bucket. `division` is ignored
/// for apex tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankDistributionEntry {
    pub tier: Tier,
    #[serde(default)]
    pub division: Option<Division>,
    pub percentage: f64,
}

impl RankDistributionEntry {
    pub fn validate(&self) -> Result<(), SampleError> {
        if !(self.percentage > 0.0 && self.percentage <= 1.0) {
            return Err(SampleError::InvalidDistribution(format!(
                "percentage {} for {} must be in (0, 1]",
                self.percentage, self.tier
            )));
        }
        if !self.tier.is_apex() && self.division.is_none() {
            return Err(SampleError::InvalidDistribution(format!(
                "tier {} needs a division",
                self.tier
            )));
        }
        Ok(())
    }

    /// Players requested from this bucket out of `total`.
    pub fn player_count(&self, total: usize) -> usize {
        (self.percentage * total as f64).ceil() as usize
    }
}

/// Which players a run samples.
#[derive(Debug, Clone)]
pub enum SamplingStrategy {
    /// `count` players from every bucket of the ladder.
    AllDivisions { count: usize },
    Division {
        tier: Tier,
        division: Division,
        count: usize,
    },
    Distribution {
        entries: Vec<RankDistributionEntry>,
        total: usize,
    },
}

pub struct PlayerSampler<'a, T> {
    client: &'a RiotClient<T>,
}

impl<'a, T: Transport> PlayerSampler<'a, T> {
    pub fn new(client: &'a RiotClient<T>) -> Self {
        Self { client }
    }

    pub async fn sample(&self, strategy: &SamplingStrategy) -> Result<Vec<LeagueEntry>, SampleError> {
        match strategy {
            SamplingStrategy::AllDivisions { count } => self.all_divisions(*count).await,
            SamplingStrategy::Division {
                tier,
                division,
                count,
            } => Ok(self.by_division(*tier, *division, *count).await?),
            SamplingStrategy::Distribution { entries, total } => {
                self.by_distribution(entries, *total).await
            }
        }
    }

    /// Up to `count` players of one bucket, fetching pages only until the
    /// count is met or the ladder runs out. Apex tiers come from their flat
    /// list and ignore `division`.
    pub async fn by_division(
        &self,
        tier: Tier,
        division: Division,
        count: usize,
    ) -> Result<Vec<LeagueEntry>, FetchError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        if tier.is_apex() {
            let mut entries = self.client.get_apex_league(tier).await?;
            entries.truncate(count);
            info!("Sampled {} players from {}", entries.len(), tier);
            return Ok(entries);
        }

        let mut entries = Vec::with_capacity(count);
        let mut page = 1;
        while entries.len() < count {
            let batch = self.client.get_league_page(tier, division, page).await?;
            if batch.is_empty() {
                debug!("{} {} exhausted at page {}", tier, division, page);
                break;
            }
            entries.extend(batch);
            page += 1;
        }
        entries.truncate(count);

        info!("Sampled {} players from {} {}", entries.len(), tier, division);
        Ok(entries)
    }

    /// `count` players from each of the ladder's buckets, concatenated.
    pub async fn all_divisions(&self, count: usize) -> Result<Vec<LeagueEntry>, SampleError> {
        let mut players = Vec::new();
        for (tier, division) in all_buckets() {
            players.extend(self.by_division(tier, division, count).await?);
        }
        Ok(players)
    }

    /// `ceil(percentage * total)` players per entry. Entries are independent,
    /// so the shares need not add up to one.
    pub async fn by_distribution(
        &self,
        distribution: &[RankDistributionEntry],
        total: usize,
    ) -> Result<Vec<LeagueEntry>, SampleError> {
        for entry in distribution {
            entry.validate()?;
        }

        let mut players = Vec::new();
        for entry in distribution {
            let division = entry.division.unwrap_or(Division::I);
            players.extend(
                self.by_division(entry.tier, division, entry.player_count(total))
                    .await?,
            );
        }
        Ok(players)
    }
}
