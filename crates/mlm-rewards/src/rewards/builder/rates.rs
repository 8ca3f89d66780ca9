use serde::{Deserialize, Serialize};

const DEFAULT_BASIC_TIER_BPS: [u32; 3] = [1_000, 500, 250];
const DEFAULT_EXTRA_BPS: u32 = 200;

/// Rate table for the strategy formulas, in basis points of the subject amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRates {
    /// Entry `n` applies to tier `n + 1`; deeper tiers earn nothing.
    pub basic_tier_bps: Vec<u32>,
    pub extra_bps: u32,
}

impl RewardRates {
    pub fn basic_bps_for_tier(&self, tier: u8) -> u32 {
        usize::from(tier)
            .checked_sub(1)
            .and_then(|index| self.basic_tier_bps.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Parses a comma separated tier table such as `1000,500,250`.
    pub fn parse_tiers(raw: &str) -> Result<Vec<u32>, RatesError> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| RatesError::InvalidTier(part.to_string()))
            })
            .collect()
    }
}

impl Default for RewardRates {
    fn default() -> Self {
        Self {
            basic_tier_bps: DEFAULT_BASIC_TIER_BPS.to_vec(),
            extra_bps: DEFAULT_EXTRA_BPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatesError {
    #[error("tier rate '{0}' is not a whole number of basis points")]
    InvalidTier(String),
}
