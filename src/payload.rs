use serde::{Deserialize, Serialize};

use crate::deriver::DerivedAddress;
use crate::error::DerivationError;

/// Instruction data layouts accepted by the target programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum PayloadShape {
    /// The seed prefix bytes, nothing else.
    #[default]
    Raw,
    /// `[discriminator, bump, seed prefix...]`
    Tagged { discriminator: u8 },
}

/// Lay out the instruction data for `derived`. `seed_material` must be the
/// bytes the address was derived from.
pub fn build_payload(
    shape: PayloadShape,
    derived: &DerivedAddress,
    seed_material: &[u8],
) -> Result<Vec<u8>, DerivationError> {
    let prefix = seed_material
        .get(..derived.bump as usize)
        .ok_or(DerivationError::SeedTooShort {
            bump: derived.bump,
            len: seed_material.len(),
        })?;
    let data = match shape {
        PayloadShape::Raw => prefix.to_vec(),
        PayloadShape::Tagged { discriminator } => {
            let mut data = Vec::with_capacity(prefix.len() + 2);
            data.push(discriminator);
            data.push(derived.bump);
            data.extend_from_slice(prefix);
            data
        }
    };
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;

    fn derived(bump: u8) -> DerivedAddress {
        DerivedAddress {
            address: Pubkey::new_unique(),
            bump,
            canonical_bump: None,
        }
    }

    fn seed() -> Vec<u8> {
        (100u8..132).collect()
    }

    #[test]
    fn test_tagged_payload() {
        let seed = seed();
        let payload = build_payload(
            PayloadShape::Tagged { discriminator: 1 },
            &derived(7),
            &seed,
        )
        .unwrap();
        assert_eq!(payload, vec![1, 7, 100, 101, 102, 103, 104, 105, 106]);
    }

    #[test]
    fn test_raw_payload() {
        let seed = seed();
        let payload = build_payload(PayloadShape::Raw, &derived(7), &seed).unwrap();
        assert_eq!(payload, seed[..7].to_vec());
    }

    #[test]
    fn test_short_seed_is_an_error() {
        let short = [1u8; 10];
        for shape in [PayloadShape::Raw, PayloadShape::Tagged { discriminator: 1 }] {
            assert_eq!(
                build_payload(shape, &derived(32), &short),
                Err(DerivationError::SeedTooShort { bump: 32, len: 10 })
            );
        }
        assert_eq!(
            build_payload(PayloadShape::Raw, &derived(10), &short).unwrap(),
            short.to_vec()
        );
    }

    #[test]
    fn test_shape_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            payload: PayloadShape,
        }
        let tagged: Wrapper =
            toml::from_str("payload = { shape = \"tagged\", discriminator = 1 }").unwrap();
        assert_eq!(tagged.payload, PayloadShape::Tagged { discriminator: 1 });
        let raw: Wrapper = toml::from_str("payload = { shape = \"raw\" }").unwrap();
        assert_eq!(raw.payload, PayloadShape::Raw);
    }
}
