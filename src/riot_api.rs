use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fetch::{FetchError, FetchExecutor, Transport};
use crate::rank::{Division, Tier};

pub const QUEUE: &str = "RANKED_SOLO_5x5";
/// Server-side cap on the `count` parameter of the match-ID endpoint.
pub const MAX_MATCH_IDS_PER_REQUEST: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub puuid: String,
}

/// One ranked ladder row. Only the identifying fields are typed; everything
/// else the API returns rides along untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueEntry {
    pub puuid: String,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(rename = "rank", default)]
    pub division: Option<Division>,
    #[serde(rename = "leaguePoints", default)]
    pub league_points: i32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LeagueEntry {
    /// Entry for a player known only by puuid.
    pub fn from_puuid(puuid: impl Into<String>) -> Self {
        Self {
            puuid: puuid.into(),
            tier: None,
            division: None,
            league_points: 0,
            extra: Map::new(),
        }
    }
}

/// Response of the apex league endpoints: a flat list under `entries`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApexLeague {
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub entries: Vec<LeagueEntry>,
}

/// Which per-match document to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FetchTarget {
    Matches,
    Timelines,
}

/// Typed wrapper over the league, account and match endpoints.
///
/// League lookups are platform-routed (`na1`, `euw1`, ...); account and
/// match lookups are regionally routed (`americas`, `europe`, ...).
pub struct RiotClient<T> {
    executor: FetchExecutor<T>,
    platform_url: String,
    region_url: String,
}

impl<T: Transport> RiotClient<T> {
    pub fn new(executor: FetchExecutor<T>, platform_url: &str, region_url: &str) -> Self {
        Self {
            executor,
            platform_url: platform_url.trim_end_matches('/').to_string(),
            region_url: region_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn executor(&self) -> &FetchExecutor<T> {
        &self.executor
    }

    pub async fn get_account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Account, FetchError> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.region_url, game_name, tag_line
        );

        self.executor.fetch_json(&url).await
    }

    /// One page (1-indexed) of a non-apex division.
    pub async fn get_league_page(
        &self,
        tier: Tier,
        division: Division,
        page: u32,
    ) -> Result<Vec<LeagueEntry>, FetchError> {
        let url = format!(
            "{}/lol/league/v4/entries/{}/{}/{}?page={}",
            self.platform_url, QUEUE, tier, division, page
        );

        self.executor.fetch_json(&url).await
    }

    /// The whole ladder of an apex tier. Entries get the tier filled in
    /// since the API only reports it once at the top level.
    pub async fn get_apex_league(&self, tier: Tier) -> Result<Vec<LeagueEntry>, FetchError> {
        let url = format!(
            "{}/lol/league/v4/{}leagues/by-queue/{}",
            self.platform_url,
            tier.as_str().to_lowercase(),
            QUEUE
        );

        let league: ApexLeague = self.executor.fetch_json(&url).await?;
        let tier = league.tier.unwrap_or(tier);
        Ok(league
            .entries
            .into_iter()
            .map(|mut entry| {
                entry.tier.get_or_insert(tier);
                entry
            })
            .collect())
    }

    /// Most recent match IDs, newest first. `count` is clamped to the
    /// server maximum.
    pub async fn get_match_ids_by_puuid(
        &self,
        puuid: &str,
        count: usize,
    ) -> Result<Vec<String>, FetchError> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?start=0&count={}",
            self.region_url,
            puuid,
            count.min(MAX_MATCH_IDS_PER_REQUEST)
        );

        self.executor.fetch_json(&url).await
    }

    pub async fn get_match_json(&self, match_id: &str) -> Result<Value, FetchError> {
        let url = format!("{}/lol/match/v5/matches/{}", self.region_url, match_id);

        self.executor.fetch_json(&url).await
    }

    pub async fn get_timeline_json(&self, match_id: &str) -> Result<Value, FetchError> {
        let url = format!(
            "{}/lol/match/v5/matches/{}/timeline",
            self.region_url, match_id
        );

        self.executor.fetch_json(&url).await
    }

    pub async fn get_match_document(
        &self,
        match_id: &str,
        target: FetchTarget,
    ) -> Result<Value, FetchError> {
        match target {
            FetchTarget::Matches => self.get_match_json(match_id).await,
            FetchTarget::Timelines => self.get_timeline_json(match_id).await,
        }
    }
}
