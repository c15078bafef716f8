use std::time::Duration;

use anyhow::{Context, bail};
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::{Transaction, TransactionError};
use tracing::{debug, info, warn};

use crate::config::ClusterConfig;

/// How long one send may take and how often transport failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self::from(&ClusterConfig::default())
    }
}

impl From<&ClusterConfig> for SubmitPolicy {
    fn from(cluster: &ClusterConfig) -> Self {
        Self {
            timeout: cluster.timeout(),
            max_attempts: cluster.max_attempts.max(1),
            retry_delay: cluster.retry_delay(),
        }
    }
}

enum Failure {
    Transient(anyhow::Error),
    Fatal(anyhow::Error),
}

/// What the cluster knows about a signature from an earlier attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorAttempt {
    Landed,
    Failed(TransactionError),
    Unknown,
}

impl PriorAttempt {
    pub fn from_status(status: Option<Result<(), TransactionError>>) -> Self {
        match status {
            Some(Ok(())) => PriorAttempt::Landed,
            Some(Err(err)) => PriorAttempt::Failed(err),
            None => PriorAttempt::Unknown,
        }
    }
}

/// Errors worth another attempt: the request never got a verdict from the
/// cluster.
pub fn is_transient(err: &ClientError) -> bool {
    matches!(err.kind(), ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_))
}

/// Sign once and send, retrying transport failures and timeouts up to
/// `policy.max_attempts` times. RPC rejections fail at once.
///
/// Retries resend the same signed transaction, so it can land at most once.
/// Before each resend the previous signature is looked up; once its
/// blockhash expires the cluster rejects the resend instead of running it.
pub async fn submit_transaction(
    client: &RpcClient,
    instructions: &[Instruction],
    payer: &Keypair,
    extra_signers: &[&Keypair],
    policy: SubmitPolicy,
) -> anyhow::Result<Signature> {
    let mut signers: Vec<&Keypair> = vec![payer];
    signers.extend_from_slice(extra_signers);

    let mut transaction: Option<Transaction> = None;
    let mut attempt = 1;
    loop {
        let result = if let Some(signed) = &transaction {
            let signature = signed.signatures[0];
            match prior_attempt(client, &signature).await {
                PriorAttempt::Landed => {
                    info!(%signature, attempt, "earlier send landed");
                    return Ok(signature);
                }
                PriorAttempt::Failed(err) => {
                    return Err(
                        anyhow::Error::new(err).context(format!("transaction {signature} failed"))
                    );
                }
                PriorAttempt::Unknown => send_once(client, signed, policy.timeout).await,
            }
        } else {
            match sign(client, instructions, payer, &signers[..], policy.timeout).await {
                Ok(signed) => send_once(client, transaction.insert(signed), policy.timeout).await,
                Err(failure) => Err(failure),
            }
        };

        match result {
            Ok(signature) => {
                info!(%signature, attempt, "transaction confirmed");
                return Ok(signature);
            }
            Err(Failure::Transient(err)) if attempt < policy.max_attempts => {
                warn!(attempt, error = %err, "transient send failure, retrying");
                tokio::time::sleep(policy.retry_delay).await;
                attempt += 1;
            }
            Err(Failure::Transient(err)) => {
                return Err(err.context(format!("giving up after {attempt} attempts")));
            }
            Err(Failure::Fatal(err)) => return Err(err),
        }
    }
}

async fn sign(
    client: &RpcClient,
    instructions: &[Instruction],
    payer: &Keypair,
    signers: &[&Keypair],
    timeout: Duration,
) -> Result<Transaction, Failure> {
    let blockhash = with_timeout(timeout, client.get_latest_blockhash()).await?;
    let transaction =
        Transaction::new_signed_with_payer(instructions, Some(&payer.pubkey()), signers, blockhash);
    debug!(signature = %transaction.signatures[0], %blockhash, "signed transaction");
    Ok(transaction)
}

async fn send_once(
    client: &RpcClient,
    transaction: &Transaction,
    timeout: Duration,
) -> Result<Signature, Failure> {
    with_timeout(timeout, client.send_and_confirm_transaction(transaction)).await
}

/// A failed lookup is treated as unknown; resending the same signature is
/// harmless.
async fn prior_attempt(client: &RpcClient, signature: &Signature) -> PriorAttempt {
    match client.get_signature_status(signature).await {
        Ok(status) => PriorAttempt::from_status(status),
        Err(err) => {
            debug!(%signature, error = %err, "signature status lookup failed");
            PriorAttempt::Unknown
        }
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    request: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, Failure> {
    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) if is_transient(&err) => Err(Failure::Transient(err.into())),
        Ok(Err(err)) => Err(Failure::Fatal(err.into())),
        Err(elapsed) => Err(Failure::Transient(
            anyhow::Error::new(elapsed).context("request timed out"),
        )),
    }
}

/// Simulate the transaction and report compute units consumed.
pub async fn estimate_cu_used(
    client: &RpcClient,
    instructions: &[Instruction],
    payer: &Keypair,
    extra_signers: &[&Keypair],
) -> anyhow::Result<u64> {
    let mut signers: Vec<&Keypair> = vec![payer];
    signers.extend_from_slice(extra_signers);

    let transaction = Transaction::new_signed_with_payer(
        instructions,
        Some(&payer.pubkey()),
        &signers[..],
        client.get_latest_blockhash().await?,
    );
    let sim_res = client.simulate_transaction(&transaction).await?;

    if let Some(err) = sim_res.value.err {
        bail!("simulation failed: {err}; logs: {:?}", sim_res.value.logs);
    }
    let units_consumed = sim_res
        .value
        .units_consumed
        .context("couldn't estimate CUs used")?;

    debug!(units_consumed, "simulated transaction");
    Ok(units_consumed)
}
