use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::anyhow;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, keypair_from_seed_phrase_and_passphrase};
use solana_sdk::signer::Signer;
use tracing::{debug, info, warn};

use crate::config::{ClusterConfig, SignerConfig};
use crate::error::ConfigError;

pub fn get_rpc_client(cluster: &ClusterConfig) -> RpcClient {
    RpcClient::new_with_commitment(cluster.rpc_url.clone(), cluster.commitment_config())
}

/// BIP39 seed phrase to keypair: the first 32 bytes of the PBKDF2 seed are
/// used as the ed25519 secret.
pub fn keypair_from_seed_phrase(phrase: &str, passphrase: &str) -> anyhow::Result<Keypair> {
    keypair_from_seed_phrase_and_passphrase(phrase, passphrase)
        .map_err(|err| anyhow!("failed to derive keypair from seed phrase: {err}"))
}

pub fn get_key_pair_from_local_json(path: impl AsRef<Path>) -> anyhow::Result<Keypair> {
    let keypair_file = fs::read_to_string(path)?;
    let keypair_bytes: Vec<u8> = serde_json::from_str(&keypair_file)?;

    let keypair = Keypair::from_bytes(&keypair_bytes)?;
    Ok(keypair)
}

/// Resolve the fee payer from the configured secret source.
///
/// A seed phrase in the environment takes precedence over a keypair file.
pub fn load_payer(signer: &SignerConfig) -> anyhow::Result<Keypair> {
    if let Some(mnemonic_env) = &signer.mnemonic_env {
        let phrase = std::env::var(mnemonic_env)
            .map_err(|_| ConfigError::MissingEnv(mnemonic_env.clone()))?;
        let passphrase = read_passphrase(signer.passphrase_env.as_deref());
        let keypair = keypair_from_seed_phrase(phrase.trim(), &passphrase)?;
        debug!(payer = %keypair.pubkey(), source = %mnemonic_env, "loaded payer from seed phrase");
        return Ok(keypair);
    }

    if let Some(path) = &signer.keypair_path {
        let keypair = get_key_pair_from_local_json(path)?;
        debug!(payer = %keypair.pubkey(), path = %path.display(), "loaded payer from keypair file");
        return Ok(keypair);
    }

    Err(ConfigError::MissingSigner.into())
}

/// Passphrase for the seed phrase; an unreadable variable falls back to
/// the empty passphrase, which derives a different payer.
fn read_passphrase(name: Option<&str>) -> String {
    let Some(name) = name else {
        return String::new();
    };
    match std::env::var(name) {
        Ok(passphrase) => passphrase,
        Err(err) => {
            warn!(env = %name, error = %err, "passphrase variable unreadable, using empty passphrase");
            String::new()
        }
    }
}

pub async fn airdrop(client: &RpcClient, pubkey: &Pubkey, lamports: u64) -> anyhow::Result<()> {
    let signature = client.request_airdrop(pubkey, lamports).await?;
    while !client.confirm_transaction(&signature).await? {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    info!(%pubkey, lamports, %signature, "airdrop confirmed");
    Ok(())
}

pub async fn get_account(client: &RpcClient, pubkey: &Pubkey) -> anyhow::Result<Account> {
    let account_info = client.get_account(pubkey).await?;
    debug!(%pubkey, lamports = account_info.lamports, len = account_info.data.len(), "fetched account");
    Ok(account_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_seed_phrase_is_deterministic() {
        let first = keypair_from_seed_phrase(PHRASE, "").unwrap();
        let second = keypair_from_seed_phrase(PHRASE, "").unwrap();
        assert_eq!(first.pubkey(), second.pubkey());

        let with_passphrase = keypair_from_seed_phrase(PHRASE, "extra").unwrap();
        assert_ne!(first.pubkey(), with_passphrase.pubkey());
    }

    #[test]
    fn test_get_key_pair_from_local_json() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()).unwrap();

        let restored = get_key_pair_from_local_json(file.path()).unwrap();
        assert_eq!(restored.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_load_payer_from_keypair_path() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap()).unwrap();

        let signer = SignerConfig {
            keypair_path: Some(file.path().to_path_buf()),
            ..SignerConfig::default()
        };
        assert_eq!(load_payer(&signer).unwrap().pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_read_passphrase() {
        assert_eq!(read_passphrase(None), "");
        assert_eq!(read_passphrase(Some("PDA_SEED_TEST_PASSPHRASE_UNSET")), "");
    }

    #[test]
    fn test_load_payer_errors() {
        let err = load_payer(&SignerConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingSigner)
        ));

        let signer = SignerConfig {
            mnemonic_env: Some("PDA_SEED_TEST_UNSET_MNEMONIC".to_string()),
            ..SignerConfig::default()
        };
        let err = load_payer(&signer).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingEnv(name)) if name == "PDA_SEED_TEST_UNSET_MNEMONIC"
        ));
    }
}
