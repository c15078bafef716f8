pub mod error;

pub mod config;

pub mod common;

pub mod seed;

pub mod deriver;

pub mod payload;

pub mod instruction;

pub mod processor;

pub mod transaction;

pub mod client {
    pub mod program_client;
}

pub use deriver::{AddressDeriver, DerivationMode, DerivationPrimitive, DerivedAddress};
pub use error::DerivationError;
pub use payload::{PayloadShape, build_payload};
pub use seed::SeedMaterial;
