use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::{system_instruction::create_account, system_program::ID as SYSTEM_PROGRAM_ID};

use crate::seed::concat_keys;

/// Instruction for a seed-PDA program.
///
/// Accounts required
/// 1. [signer, writable] Payer
/// 2. [writable] Derived address
/// 3. [] System program
/// 4. [] Member keys, in seed order, when the program recomputes the seed
pub fn seed_pda_instruction(
    program_id: &Pubkey,
    payer: &Pubkey,
    pda: &Pubkey,
    members: &[Pubkey],
    data: Vec<u8>,
) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*pda, false),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
    ];
    accounts.extend(
        members
            .iter()
            .map(|member| AccountMeta::new_readonly(*member, false)),
    );

    Instruction::new_with_bytes(*program_id, &data, accounts)
}

/// Create an account owned by `program_id` sized for the member keys, then
/// have the program write the concatenated keys into it.
///
/// `rent_exemption` is the minimum balance for the data length; the data
/// length is added on top of it.
pub fn member_keys_data_instructions(
    payer: &Pubkey,
    data_account: &Pubkey,
    program_id: &Pubkey,
    members: &[Pubkey],
    rent_exemption: u64,
) -> [Instruction; 2] {
    let data = concat_keys(members);
    let space = data.len() as u64;

    let create_account_ix = create_account(
        payer,                  // fee payer
        data_account,           // new account
        rent_exemption + space, // lamports
        space,                  // space
        program_id,             // owner
    );

    let write_data_ix = Instruction::new_with_bytes(
        *program_id,
        &data,
        vec![AccountMeta::new(*data_account, false)],
    );

    [create_account_ix, write_data_ix]
}
