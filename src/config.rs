//! Client configuration: cluster, signer source, member keys and the
//! program profiles the client knows how to call.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use crate::deriver::DerivationMode;
use crate::error::ConfigError;
use crate::payload::PayloadShape;

pub const DEFAULT_CONFIG_PATH: &str = "pda-seed.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub log_level: Option<String>,
    /// Base58 member keys; their digest is the seed material.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<ProgramProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub rpc_url: String,
    pub commitment: Commitment,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

/// Where the fee payer comes from. Secrets never live in the file itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Environment variable holding a BIP39 seed phrase.
    pub mnemonic_env: Option<String>,
    /// Environment variable holding the optional BIP39 passphrase.
    pub passphrase_env: Option<String>,
    /// Solana CLI JSON keypair file.
    pub keypair_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramProfile {
    pub name: String,
    pub program_id: String,
    #[serde(default)]
    pub mode: DerivationMode,
    #[serde(default)]
    pub payload: PayloadShape,
    /// Pass the member keys after the system program so the program can
    /// recompute the seed.
    #[serde(default)]
    pub include_members: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8899".to_string(),
            commitment: Commitment::Confirmed,
            timeout_secs: 30,
            max_attempts: 3,
            retry_delay_ms: 500,
        }
    }
}

impl ClusterConfig {
    pub fn commitment_config(&self) -> CommitmentConfig {
        match self.commitment {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl ProgramProfile {
    pub fn program_id(&self) -> Result<Pubkey, ConfigError> {
        parse_pubkey(&format!("profiles.{}.program_id", self.name), &self.program_id)
    }
}

impl ClientConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every key parses so bad input surfaces before any network call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.member_keys()?;
        for profile in &self.profiles {
            profile.program_id()?;
        }
        Ok(())
    }

    pub fn member_keys(&self) -> Result<Vec<Pubkey>, ConfigError> {
        self.members
            .iter()
            .enumerate()
            .map(|(i, key)| parse_pubkey(&format!("members[{i}]"), key))
            .collect()
    }

    pub fn profile(&self, name: &str) -> Result<&ProgramProfile, ConfigError> {
        self.profiles
            .iter()
            .find(|profile| profile.name == name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value).map_err(|_| ConfigError::InvalidKey {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
log_level = "debug"
members = [
    "9JeizzjvGCk3fyPXPCPYJass2JhfhKHXVAv9NDDxSDTj",
    "GKCGKYHPYkcQHEwNtK2SXveup5kGSL74TPz18gnmS2cJ",
    "Fy93VrzyyfBCx5yZbhgujTvJpMoQuKLCUw38biPuZag",
]

[cluster]
rpc_url = "https://api.devnet.solana.com"
commitment = "finalized"

[signer]
mnemonic_env = "PDA_SEED_MNEMONIC"

[[profiles]]
name = "bootcamp"
program_id = "ADbPHYkPbDUdd7cSYrMtEg9f6Cj7WTVTmrzbxh1A5MW3"

[[profiles]]
name = "onepubkey"
program_id = "5bzzMcr3sc8bMUfQPP6WuwYmJn6JCU2TuG4Hf4seFodd"
mode = "canonical"
payload = { shape = "tagged", discriminator = 1 }
include_members = true
"#;

    #[test]
    fn test_parse_sample() {
        let config = ClientConfig::from_toml(SAMPLE).unwrap();

        assert_eq!(config.cluster.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(config.cluster.commitment, Commitment::Finalized);
        assert_eq!(config.cluster.max_attempts, 3);
        assert_eq!(config.member_keys().unwrap().len(), 3);

        let bootcamp = config.profile("bootcamp").unwrap();
        assert_eq!(bootcamp.mode, DerivationMode::Strict);
        assert_eq!(bootcamp.payload, PayloadShape::Raw);
        assert!(!bootcamp.include_members);

        let onepubkey = config.profile("onepubkey").unwrap();
        assert_eq!(onepubkey.mode, DerivationMode::Canonical);
        assert_eq!(onepubkey.payload, PayloadShape::Tagged { discriminator: 1 });
        assert!(onepubkey.include_members);
    }

    #[test]
    fn test_unknown_profile() {
        let config = ClientConfig::from_toml(SAMPLE).unwrap();
        assert!(matches!(
            config.profile("missing"),
            Err(ConfigError::UnknownProfile(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_rejects_bad_program_id() {
        let content = r#"
[[profiles]]
name = "broken"
program_id = "not-a-key"
"#;
        assert!(matches!(
            ClientConfig::from_toml(content),
            Err(ConfigError::InvalidKey { field, .. }) if field == "profiles.broken.program_id"
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_toml("").unwrap();
        assert_eq!(config.cluster.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.cluster.timeout(), Duration::from_secs(30));
        assert!(config.profiles.is_empty());
    }
}
