use solana_sdk::hash::hashv;
use solana_sdk::pubkey::Pubkey;

/// SHA-256 digest of an ordered list of public keys, used as the seed for
/// program address derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedMaterial([u8; 32]);

impl SeedMaterial {
    pub fn from_keys(keys: &[Pubkey]) -> Self {
        let chunks: Vec<&[u8]> = keys.iter().map(|key| key.as_ref()).collect();
        Self(hashv(&chunks).to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First `len` bytes, clamped to the digest length.
    pub fn prefix(&self, len: usize) -> &[u8] {
        &self.0[..len.min(self.0.len())]
    }
}

impl AsRef<[u8]> for SeedMaterial {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Concatenate the raw bytes of each key, in order.
pub fn concat_keys(keys: &[Pubkey]) -> Vec<u8> {
    let mut data = Vec::with_capacity(keys.len() * 32);
    for key in keys {
        data.extend_from_slice(&key.to_bytes());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::hash::hash;
    use solana_sdk::pubkey;

    const MEMBERS: [Pubkey; 3] = [
        pubkey!("9JeizzjvGCk3fyPXPCPYJass2JhfhKHXVAv9NDDxSDTj"),
        pubkey!("GKCGKYHPYkcQHEwNtK2SXveup5kGSL74TPz18gnmS2cJ"),
        pubkey!("Fy93VrzyyfBCx5yZbhgujTvJpMoQuKLCUw38biPuZag"),
    ];

    #[test]
    fn test_hash_matches_concatenation() {
        let seed = SeedMaterial::from_keys(&MEMBERS);
        let expected = hash(&concat_keys(&MEMBERS));
        assert_eq!(seed.as_bytes(), &expected.to_bytes());
    }

    #[test]
    fn test_order_matters() {
        let reversed = [MEMBERS[2], MEMBERS[1], MEMBERS[0]];
        assert_ne!(
            SeedMaterial::from_keys(&MEMBERS),
            SeedMaterial::from_keys(&reversed)
        );
    }

    #[test]
    fn test_prefix_is_clamped() {
        let seed = SeedMaterial::from_keys(&MEMBERS);
        assert_eq!(seed.prefix(10), &seed.as_bytes()[..10]);
        assert_eq!(seed.prefix(64).len(), 32);
    }

    #[test]
    fn test_concat_length() {
        assert_eq!(concat_keys(&MEMBERS).len(), 96);
    }
}
