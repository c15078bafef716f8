use thiserror::Error;

/// Reasons a program address could not be derived from seed material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DerivationError {
    #[error("program id must be {expected} bytes, got {actual}")]
    InvalidProgramId { expected: usize, actual: usize },
    #[error("seed material is empty")]
    EmptySeed,
    #[error("no bump in 1..={max_bump} produced a valid program address")]
    Exhausted { max_bump: u8 },
    #[error("seed material has {len} bytes, bump {bump} needs more")]
    SeedTooShort { bump: u8, len: usize },
}

impl DerivationError {
    /// True when the caller handed in malformed input, as opposed to
    /// well-formed seed material that simply yields no address.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, DerivationError::Exhausted { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid public key `{value}` for {field}")]
    InvalidKey { field: String, value: String },
    #[error("unknown profile `{0}`")]
    UnknownProfile(String),
    #[error("no signer configured: set signer.mnemonic_env or signer.keypair_path")]
    MissingSigner,
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_is_not_an_input_error() {
        assert!(!DerivationError::Exhausted { max_bump: 32 }.is_input_error());
        assert!(DerivationError::EmptySeed.is_input_error());
        assert!(
            DerivationError::InvalidProgramId {
                expected: 32,
                actual: 3
            }
            .is_input_error()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DerivationError::Exhausted { max_bump: 32 }.to_string(),
            "no bump in 1..=32 produced a valid program address"
        );
    }
}
