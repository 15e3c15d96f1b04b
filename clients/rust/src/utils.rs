use borsh::{BorshDeserialize, BorshSerialize};
use serde::Deserialize;
use solana_pubkey::Pubkey;

pub const AGENT_SEED: &[u8] = b"agent";

#[derive(BorshSerialize, BorshDeserialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SemanticVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl SemanticVersion {
    pub fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

/// Address of the agent account, seeds `["agent", owner]`.
pub fn find_agent_pda(program_id: &Pubkey, owner: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[AGENT_SEED, owner.as_ref()], program_id)
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn checked_increment(current: u64) -> Option<u64> {
    current.checked_add(1)
}

/// Serde helpers for config values written as text.
pub mod serde_text {
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer};
    use solana_pubkey::Pubkey;

    pub fn pubkey<'de, D>(d: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(d)?;
        Pubkey::from_str(&text).map_err(serde::de::Error::custom)
    }

    /// 32 bytes as hex, with or without a `0x` prefix.
    pub fn hex32<'de, D>(d: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(d)?;
        let text = text.strip_prefix("0x").unwrap_or(&text);
        let bytes = hex::decode(text).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("measurement must be 32 bytes"))
    }
}
