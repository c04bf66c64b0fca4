pub mod error;
pub mod membership;
pub mod paillier;

pub use error::{Error, ParseError, Result};
pub use membership::{Commitment, Prover, Verifier};
pub use paillier::{Keypair, PublicKey};
