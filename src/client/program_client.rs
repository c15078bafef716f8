use anyhow::{Context, bail};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use tracing::{debug, info};

use crate::config::ProgramProfile;
use crate::deriver::{AddressDeriver, DerivedAddress};
use crate::instruction::{member_keys_data_instructions, seed_pda_instruction};
use crate::payload::build_payload;
use crate::seed::{SeedMaterial, concat_keys};
use crate::transaction::{SubmitPolicy, estimate_cu_used, submit_transaction};

/// Everything needed to call a seed-PDA program, computed offline.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    pub program_id: Pubkey,
    pub seed: SeedMaterial,
    pub derived: DerivedAddress,
    pub payload: Vec<u8>,
    pub instruction: Instruction,
}

/// Derive the PDA for `profile` and build its instruction. No network access.
pub fn prepare_call(
    profile: &ProgramProfile,
    payer: &Pubkey,
    members: &[Pubkey],
) -> anyhow::Result<PreparedCall> {
    if members.is_empty() {
        bail!("at least one member key is required to build seed material");
    }

    let program_id = profile.program_id()?;
    let seed = SeedMaterial::from_keys(members);
    let derived = AddressDeriver::with_mode(profile.mode)
        .derive(&program_id, seed.as_ref())
        .with_context(|| format!("deriving address for profile `{}`", profile.name))?;
    debug!(
        profile = %profile.name,
        address = %derived.address,
        bump = derived.bump,
        canonical_bump = ?derived.canonical_bump,
        "derived program address"
    );

    let payload = build_payload(profile.payload, &derived, seed.as_ref())?;
    let account_members: &[Pubkey] = if profile.include_members { members } else { &[] };
    let instruction = seed_pda_instruction(
        &program_id,
        payer,
        &derived.address,
        account_members,
        payload.clone(),
    );

    Ok(PreparedCall {
        program_id,
        seed,
        derived,
        payload,
        instruction,
    })
}

/// Human-readable summary of the derivation for `profile`.
///
/// The payer only appears in the instruction's accounts, which the report
/// leaves out, so no signer is needed.
pub fn derivation_report(profile: &ProgramProfile, members: &[Pubkey]) -> anyhow::Result<String> {
    let call = prepare_call(profile, &Pubkey::default(), members)?;

    let mut report = format!("program:        {}\n", call.program_id);
    report.push_str(&format!("seed material:  {}\n", hex::encode(call.seed.as_ref())));
    report.push_str(&format!("bump:           {}\n", call.derived.bump));
    if let Some(nonce) = call.derived.canonical_bump {
        report.push_str(&format!("canonical bump: {nonce}\n"));
    }
    report.push_str(&format!("pda:            {}\n", call.derived.address));
    report.push_str(&format!("payload:        {}\n", hex::encode(&call.payload)));
    Ok(report)
}

pub struct ProgramClient {
    rpc: RpcClient,
    payer: Keypair,
    policy: SubmitPolicy,
}

impl ProgramClient {
    pub fn new(rpc: RpcClient, payer: Keypair, policy: SubmitPolicy) -> Self {
        Self { rpc, payer, policy }
    }

    pub fn payer(&self) -> Pubkey {
        self.payer.pubkey()
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Derive, build, sign and submit the call described by `profile`.
    pub async fn call_profile(
        &self,
        profile: &ProgramProfile,
        members: &[Pubkey],
    ) -> anyhow::Result<(PreparedCall, Signature)> {
        let call = prepare_call(profile, &self.payer(), members)?;
        let instructions = [call.instruction.clone()];

        match estimate_cu_used(&self.rpc, &instructions, &self.payer, &[]).await {
            Ok(units) => debug!(units, "estimated compute units"),
            Err(err) => debug!(error = %err, "compute unit estimate unavailable"),
        }

        let signature =
            submit_transaction(&self.rpc, &instructions, &self.payer, &[], self.policy).await?;
        info!(
            profile = %profile.name,
            pda = %call.derived.address,
            %signature,
            "program call confirmed"
        );
        Ok((call, signature))
    }

    /// Create a fresh account owned by `program_id` and have the program
    /// write the concatenated member keys into it.
    pub async fn write_member_keys(
        &self,
        program_id: &Pubkey,
        members: &[Pubkey],
    ) -> anyhow::Result<(Pubkey, Signature)> {
        let data_account = Keypair::new();
        let space = concat_keys(members).len();
        let rent_exemption = self
            .rpc
            .get_minimum_balance_for_rent_exemption(space)
            .await?;

        let instructions = member_keys_data_instructions(
            &self.payer(),
            &data_account.pubkey(),
            program_id,
            members,
            rent_exemption,
        );

        let signature = submit_transaction(
            &self.rpc,
            &instructions,
            &self.payer,
            &[&data_account],
            self.policy,
        )
        .await?;
        info!(account = %data_account.pubkey(), %signature, "member keys written");
        Ok((data_account.pubkey(), signature))
    }
}
