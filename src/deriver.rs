//! Bump search for seed-prefix program derived addresses.
//!
//! The "bump" here is the number of leading seed-material bytes used as the
//! single derivation seed. Candidates are tried from [`MAX_BUMP`] down to 1
//! and the first one the derivation primitive accepts wins.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::{MAX_SEED_LEN, PUBKEY_BYTES, Pubkey};

use crate::error::DerivationError;

/// Largest seed prefix a single PDA seed may hold.
pub const MAX_BUMP: u8 = MAX_SEED_LEN as u8;

/// Successful output of a derivation primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub address: Pubkey,
    /// Nonce the primitive appended on its own, if it searched for one.
    pub nonce: Option<u8>,
}

/// Deterministic address derivation from a single seed.
///
/// Implementations must be pure: the same `(seed, program_id)` always yields
/// the same answer.
pub trait DerivationPrimitive {
    fn derive(&self, seed: &[u8], program_id: &Pubkey) -> Option<Candidate>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivationMode {
    /// `create_program_address`: rejects seeds whose hash lands on the curve.
    #[default]
    Strict,
    /// `find_program_address`: appends its own nonce until off-curve.
    Canonical,
}

impl DerivationPrimitive for DerivationMode {
    fn derive(&self, seed: &[u8], program_id: &Pubkey) -> Option<Candidate> {
        match self {
            DerivationMode::Strict => Pubkey::create_program_address(&[seed], program_id)
                .ok()
                .map(|address| Candidate {
                    address,
                    nonce: None,
                }),
            DerivationMode::Canonical => Pubkey::try_find_program_address(&[seed], program_id)
                .map(|(address, nonce)| Candidate {
                    address,
                    nonce: Some(nonce),
                }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Pubkey,
    /// Seed prefix length that produced `address`.
    pub bump: u8,
    /// Nonce reported by a canonical primitive.
    pub canonical_bump: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct AddressDeriver<P> {
    primitive: P,
}

impl AddressDeriver<DerivationMode> {
    pub fn with_mode(mode: DerivationMode) -> Self {
        Self::new(mode)
    }
}

impl<P: DerivationPrimitive> AddressDeriver<P> {
    pub fn new(primitive: P) -> Self {
        Self { primitive }
    }

    /// Derive from a raw program id; it must be exactly 32 bytes.
    pub fn derive_address(
        &self,
        program_id: &[u8],
        seed_material: &[u8],
    ) -> Result<DerivedAddress, DerivationError> {
        let program_id =
            Pubkey::try_from(program_id).map_err(|_| DerivationError::InvalidProgramId {
                expected: PUBKEY_BYTES,
                actual: program_id.len(),
            })?;
        self.derive(&program_id, seed_material)
    }

    /// Search bumps from the highest candidate down; the first accepted wins.
    pub fn derive(
        &self,
        program_id: &Pubkey,
        seed_material: &[u8],
    ) -> Result<DerivedAddress, DerivationError> {
        if seed_material.is_empty() {
            return Err(DerivationError::EmptySeed);
        }

        let max_bump = seed_material.len().min(MAX_BUMP as usize) as u8;
        for bump in (1..=max_bump).rev() {
            let seed = &seed_material[..bump as usize];
            if let Some(candidate) = self.primitive.derive(seed, program_id) {
                return Ok(DerivedAddress {
                    address: candidate.address,
                    bump,
                    canonical_bump: candidate.nonce,
                });
            }
        }

        Err(DerivationError::Exhausted { max_bump })
    }
}
