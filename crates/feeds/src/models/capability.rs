use serde::{Deserialize, Serialize};

/// Kind of data a provider can supply.
///
/// A closed set: adding a kind here forces every `match` over capabilities
/// to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Baseline weapon statistics (damage, fire rate, magazine size).
    WeaponStats,
    /// Meta tier rankings.
    TierRankings,
    /// Usage and pick rates.
    PickRates,
    /// Detailed ballistics (damage falloff, bullet velocity, recoil patterns).
    Ballistics,
    /// Attachment catalogues and their stat modifiers.
    Attachments,
    /// Balance changes per game patch.
    PatchNotes,
}

impl Capability {
    /// All capabilities, in declaration order.
    pub const ALL: [Capability; 6] = [
        Capability::WeaponStats,
        Capability::TierRankings,
        Capability::PickRates,
        Capability::Ballistics,
        Capability::Attachments,
        Capability::PatchNotes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::WeaponStats => "weapon_stats",
            Capability::TierRankings => "tier_rankings",
            Capability::PickRates => "pick_rates",
            Capability::Ballistics => "ballistics",
            Capability::Attachments => "attachments",
            Capability::PatchNotes => "patch_notes",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown capability: {}", s))
    }
}

/// How often a provider refreshes its data. Informational only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UpdateFrequency {
    Realtime,
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl UpdateFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateFrequency::Realtime => "realtime",
            UpdateFrequency::Hourly => "hourly",
            UpdateFrequency::Daily => "daily",
            UpdateFrequency::Weekly => "weekly",
            UpdateFrequency::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for UpdateFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_parse_roundtrips_names() {
        for capability in Capability::ALL {
            assert_eq!(capability.as_str().parse::<Capability>(), Ok(capability));
        }
        assert_eq!("BALLISTICS".parse::<Capability>(), Ok(Capability::Ballistics));
        assert!("loadouts".parse::<Capability>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Capability::TierRankings).unwrap();
        assert_eq!(json, "\"tier_rankings\"");

        let freq: UpdateFrequency = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(freq, UpdateFrequency::Weekly);
    }
}
