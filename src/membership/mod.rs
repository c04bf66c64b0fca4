//! Non-interactive proof that a Paillier ciphertext encrypts one of a public,
//! ordered set of candidate messages, without revealing which one.
//!
//! This is a disjunctive sigma protocol: the prover simulates every branch
//! except the one it holds a witness for, and the Fiat-Shamir challenge binds
//! the branches together by forcing the per-branch challenges to sum to the
//! hash of all first messages modulo 2^256.

pub mod crypto;

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ParseError, Result};
use crate::paillier::{self, PublicKey};

pub use crypto::CHALLENGE_BITS;

const ELEMENT_DELIMITER: char = ',';
const GROUP_DELIMITER: char = ';';

/// The proof transcript: one first message, challenge, and response per
/// candidate, index-aligned with the candidate set the prover was given.
/// Built once by the prover and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub a: Vec<BigUint>, // first messages
    pub e: Vec<BigUint>, // challenges, summing to the derived challenge mod 2^256
    pub z: Vec<BigUint>, // responses
}

impl Commitment {
    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

/// Canonical text form: three groups separated by `;`, each group the decimal
/// text of its values separated by `,`, with a trailing `,` after the final
/// element of every group:
///
/// ```text
/// <a1>,...,<aN>,;<e1>,...,<eN>,;<z1>,...,<zN>,;
/// ```
impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in [&self.a, &self.e, &self.z] {
            for value in group {
                write!(f, "{value}{ELEMENT_DELIMITER}")?;
            }
            write!(f, "{GROUP_DELIMITER}")?;
        }
        Ok(())
    }
}

fn parse_group(text: &str) -> Result<Vec<BigUint>> {
    let tokens: Vec<&str> = text.split(ELEMENT_DELIMITER).collect();
    match tokens.split_last() {
        Some((&"", elements)) => elements
            .iter()
            .map(|token| {
                token
                    .parse::<BigUint>()
                    .map_err(|_| ParseError::InvalidInteger(token.to_string()).into())
            })
            .collect(),
        _ => Err(ParseError::UnterminatedGroup.into()),
    }
}

impl FromStr for Commitment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let groups: Vec<&str> = s.split(GROUP_DELIMITER).collect();

        // a well-formed encoding ends with the group delimiter, leaving an
        // empty tail after the split
        let Some((&"", groups)) = groups.split_last() else {
            return Err(ParseError::GroupCount(groups.len()).into());
        };
        let &[a, e, z] = groups else {
            return Err(ParseError::GroupCount(groups.len()).into());
        };

        let a = parse_group(a)?;
        let e = parse_group(e)?;
        let z = parse_group(z)?;
        if a.len() != e.len() || a.len() != z.len() {
            return Err(ParseError::LengthMismatch.into());
        }

        Ok(Self { a, e, z })
    }
}

#[derive(Debug, Clone)]
pub struct Prover {
    pub key: PublicKey,
}

impl Prover {
    pub fn new(key: PublicKey) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` and produce a commitment proving the ciphertext
    /// encrypts one of `candidates`.
    ///
    /// Fails with [`Error::PlaintextNotInCandidates`] when the plaintext is
    /// absent from the candidate set. When it occurs at more than one
    /// position, the last occurrence is taken as the real branch.
    pub fn prove(
        &self,
        plaintext: &BigUint,
        candidates: &[BigUint],
    ) -> Result<(BigUint, Commitment)> {
        let real = candidates
            .iter()
            .rposition(|candidate| candidate == plaintext)
            .ok_or(Error::PlaintextNotInCandidates)?;

        let pk = &self.key;
        let (r, ciphertext) = paillier::encrypt(pk, plaintext);

        // masking value for the real branch
        let omega = paillier::generate_coprime(pk.n.bits(), &pk.n);

        let bases = crypto::branch_bases(pk, &ciphertext, candidates)?;

        let count = candidates.len();
        let mut a = vec![BigUint::zero(); count];
        let mut e = vec![BigUint::zero(); count];
        let mut z = vec![BigUint::zero(); count];

        for (i, base) in bases.iter().enumerate() {
            if i == real {
                a[i] = omega.modpow(&pk.n, &pk.n_sq);
            } else {
                (a[i], e[i], z[i]) = crypto::simulate_branch(pk, base, CHALLENGE_BITS)?;
            }
        }

        let challenge = crypto::derive_challenge(&a, CHALLENGE_BITS);

        // e[real] is still zero, so this sums exactly the simulated challenges
        let simulated_sum: BigUint = e.iter().sum();
        e[real] = crypto::forced_challenge(&challenge, &simulated_sum, CHALLENGE_BITS);
        z[real] = (&omega * r.modpow(&e[real], &pk.n)) % &pk.n;

        Ok((ciphertext, Commitment { a, e, z }))
    }
}

#[derive(Debug, Clone)]
pub struct Verifier {
    pub key: PublicKey,
}

impl Verifier {
    pub fn new(key: PublicKey) -> Self {
        Self { key }
    }

    /// Check a commitment against a ciphertext and candidate set. The
    /// candidate order must match the order the prover used; the index
    /// alignment is part of the protocol contract.
    ///
    /// A tampered or dishonestly constructed commitment yields `false`,
    /// never an error.
    pub fn verify(
        &self,
        ciphertext: &BigUint,
        candidates: &[BigUint],
        commitment: &Commitment,
    ) -> bool {
        let count = candidates.len();
        if commitment.a.len() != count
            || commitment.e.len() != count
            || commitment.z.len() != count
        {
            return false;
        }

        let pk = &self.key;
        let bases = match crypto::branch_bases(pk, ciphertext, candidates) {
            Ok(bases) => bases,
            // a statement that cannot be recomputed can never verify
            Err(_) => return false,
        };

        let challenge = crypto::derive_challenge(&commitment.a, CHALLENGE_BITS);
        if !crypto::challenges_sum_to(&challenge, &commitment.e, CHALLENGE_BITS) {
            return false;
        }

        for i in 0..count {
            let valid = crypto::verify_branch(
                pk,
                &bases[i],
                &commitment.a[i],
                &commitment.e[i],
                &commitment.z[i],
            );
            if !valid {
                return false;
            }
        }
        true
    }
}
