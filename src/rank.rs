use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ranked solo queue tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    /// Tiers split into four divisions and served by the paginated endpoint.
    pub const DIVIDED: [Tier; 6] = [
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Diamond,
    ];

    pub const APEX: [Tier; 3] = [Tier::Master, Tier::Grandmaster, Tier::Challenger];

    pub fn is_apex(self) -> bool {
        matches!(self, Tier::Master | Tier::Grandmaster | Tier::Challenger)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Iron => "IRON",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Diamond => "DIAMOND",
            Tier::Master => "MASTER",
            Tier::Grandmaster => "GRANDMASTER",
            Tier::Challenger => "CHALLENGER",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-division inside a non-apex tier, `IV` lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Division {
    #[serde(rename = "IV")]
    #[value(name = "IV")]
    Iv,
    #[serde(rename = "III")]
    #[value(name = "III")]
    Iii,
    #[serde(rename = "II")]
    #[value(name = "II")]
    Ii,
    #[serde(rename = "I")]
    #[value(name = "I")]
    I,
}

impl Division {
    pub const ALL: [Division; 4] = [Division::Iv, Division::Iii, Division::Ii, Division::I];

    pub fn as_str(self) -> &'static str {
        match self {
            Division::Iv => "IV",
            Division::Iii => "III",
            Division::Ii => "II",
            Division::I => "I",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every (tier, division) bucket the ladder exposes. Apex tiers appear once,
/// paired with `Division::I` which the league endpoints ignore for them.
pub fn all_buckets() -> Vec<(Tier, Division)> {
    let mut buckets = Vec::with_capacity(Tier::DIVIDED.len() * Division::ALL.len() + Tier::APEX.len());
    for tier in Tier::DIVIDED {
        for division in Division::ALL {
            buckets.push((tier, division));
        }
    }
    for tier in Tier::APEX {
        buckets.push((tier, Division::I));
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_cover_ladder() {
        let buckets = all_buckets();
        assert_eq!(buckets.len(), 27);
        assert_eq!(buckets[0], (Tier::Iron, Division::Iv));
        assert_eq!(buckets.iter().filter(|(tier, _)| tier.is_apex()).count(), 3);
    }

    #[test]
    fn serde_uses_api_spelling() {
        let tier: Tier = serde_json::from_str("\"GRANDMASTER\"").unwrap();
        assert_eq!(tier, Tier::Grandmaster);
        let division: Division = serde_json::from_str("\"III\"").unwrap();
        assert_eq!(division, Division::Iii);
        assert_eq!(serde_json::to_string(&Division::Iv).unwrap(), "\"IV\"");
    }
}
