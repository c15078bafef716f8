//! Program-side handlers for the instructions this client sends.

use arrayref::{array_ref, array_refs};
use solana_program::account_info::{AccountInfo, next_account_info};
use solana_program::entrypoint::ProgramResult;
use solana_program::program::invoke_signed;
use solana_program::program_error::ProgramError;
use solana_program::pubkey::Pubkey;
use solana_program::rent::Rent;
use solana_program::sysvar::Sysvar;
use solana_program::{msg, system_instruction};

use crate::seed::SeedMaterial;

pub const CREATE_PDA: u8 = 0;
pub const CRANK_PDA: u8 = 1;

/// Instruction data `[type, offset, seed[..offset]]` of the seed-PDA program.
#[derive(Debug, PartialEq, Eq)]
pub enum SeedPdaInstruction<'a> {
    CreatePda { seed: &'a [u8] },
    Crank { offset: usize, seed: &'a [u8] },
}

impl<'a> SeedPdaInstruction<'a> {
    pub fn unpack(data: &'a [u8]) -> Result<Self, ProgramError> {
        if data.len() < 3 {
            return Err(ProgramError::InvalidInstructionData);
        }

        let header = array_ref![data, 0, 2];
        let (&[tag], &[offset]) = array_refs![header, 1, 1];
        let offset = offset as usize;
        if offset > data.len() - 2 {
            return Err(ProgramError::InvalidInstructionData);
        }
        let seed = &data[2..offset + 2];

        match tag {
            CREATE_PDA => Ok(Self::CreatePda { seed }),
            CRANK_PDA => Ok(Self::Crank { offset, seed }),
            _ => Err(ProgramError::InvalidInstructionData),
        }
    }
}

pub fn process_seed_pda_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    match SeedPdaInstruction::unpack(instruction_data)? {
        SeedPdaInstruction::CreatePda { seed } => create_pda(program_id, accounts, seed),
        SeedPdaInstruction::Crank { offset, seed } => crank_pda(program_id, accounts, offset, seed),
    }
}

// Accounts required
/// 1. [signer, writable] Funding account
/// 2. [writable] PDA, derived from `[seed]` without a nonce
/// 3. [] System program
fn create_pda(program_id: &Pubkey, accounts: &[AccountInfo], seed: &[u8]) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();
    let funding_account = next_account_info(accounts_iter)?;
    let pda_account = next_account_info(accounts_iter)?;
    let system_program = next_account_info(accounts_iter)?;

    let expected = Pubkey::create_program_address(&[seed], program_id)?;
    if expected != *pda_account.key {
        msg!("PDA mismatch: expected {}, got {}", expected, pda_account.key);
        return Err(ProgramError::InvalidSeeds);
    }

    if pda_account.lamports() > 0 {
        msg!("PDA account already exists");
        return Ok(());
    }

    let rent = Rent::get()?;
    let space = pda_account.data_len();
    let create_pda_account_ix = system_instruction::create_account(
        funding_account.key,
        pda_account.key,
        rent.minimum_balance(space),
        space as u64,
        program_id,
    );

    invoke_signed(
        &create_pda_account_ix,
        &[
            funding_account.clone(),
            pda_account.clone(),
            system_program.clone(),
        ],
        &[&[seed]],
    )
}

// Accounts required
/// 1. [signer, writable] Funding account
/// 2. [writable] PDA, canonically derived from the member-key digest prefix
/// 3. [] System program
/// 4..6. [] Member keys in seed order
fn crank_pda(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    offset: usize,
    seed: &[u8],
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();
    let _funding_account = next_account_info(accounts_iter)?;
    let pda_account = next_account_info(accounts_iter)?;
    let _system_program = next_account_info(accounts_iter)?;
    let member1 = next_account_info(accounts_iter)?;
    let member2 = next_account_info(accounts_iter)?;
    let member3 = next_account_info(accounts_iter)?;

    let digest = SeedMaterial::from_keys(&[*member1.key, *member2.key, *member3.key]);
    if offset > digest.as_bytes().len() {
        return Err(ProgramError::InvalidInstructionData);
    }
    let program_seed = digest.prefix(offset);
    msg!("Program seed {:?}", program_seed);

    if program_seed != seed {
        msg!("Passed seed {:?} does not match", seed);
        return Err(ProgramError::InvalidSeeds);
    }

    let (pda, _bump) = Pubkey::find_program_address(&[program_seed], program_id);
    if pda != *pda_account.key {
        msg!("PDA mismatch: derived {}, passed {}", pda, pda_account.key);
        return Err(ProgramError::InvalidSeeds);
    }
    msg!("Program-derived address: {}", pda);

    Ok(())
}

/// Copies the instruction data into the start of the first account.
///
/// Accounts required
/// 1. [writable] Destination account, at least as large as the data
pub fn process_write_data(
    _program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();
    let account_info = next_account_info(accounts_iter)?;

    if !account_info.is_writable {
        return Err(ProgramError::InvalidArgument);
    }

    let dest_data = &mut account_info.try_borrow_mut_data()?;
    if dest_data.len() < data.len() {
        return Err(ProgramError::InvalidArgument);
    }
    dest_data[..data.len()].copy_from_slice(data);

    Ok(())
}
