use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::paillier::{self, PublicKey};

/// Bit width of the Fiat-Shamir challenge space. Tied to the SHA-256 digest
/// used by `derive_challenge`.
pub const CHALLENGE_BITS: u64 = 256;

fn challenge_modulus(bits: u64) -> BigUint {
    BigUint::one() << bits
}

// u_i = c * (g^m_i)^-1 mod n², the value the i-th branch claims is an n-th
// residue. Both prover and verifier recompute these in candidate order.
pub fn branch_bases(
    pk: &PublicKey,
    ciphertext: &BigUint,
    candidates: &[BigUint],
) -> Result<Vec<BigUint>> {
    candidates
        .iter()
        .map(|candidate| {
            let g_m = pk.g.modpow(candidate, &pk.n_sq);
            let g_m_inv = paillier::mod_inverse(&g_m, &pk.n_sq)?;
            Ok((ciphertext * g_m_inv) % &pk.n_sq)
        })
        .collect()
}

/// Run the verification equation backward to manufacture a consistent
/// first message for a branch the prover holds no witness for: draw the
/// response and the challenge first, then solve for a = z^n * (u^e)^-1.
pub fn simulate_branch(
    pk: &PublicKey,
    base: &BigUint,
    bits: u64,
) -> Result<(BigUint, BigUint, BigUint)> {
    let mut rng = OsRng;
    let z = paillier::generate_coprime(pk.n.bits(), &pk.n);
    let e = rng.gen_biguint(bits);

    let u_e = base.modpow(&e, &pk.n_sq);
    let u_e_inv = paillier::mod_inverse(&u_e, &pk.n_sq)?;
    let a = (z.modpow(&pk.n, &pk.n_sq) * u_e_inv) % &pk.n_sq;

    Ok((a, e, z))
}

/// Hash the first messages in index order, each as its decimal text form,
/// and reduce the digest modulo 2^bits.
pub fn derive_challenge(first_messages: &[BigUint], bits: u64) -> BigUint {
    let mut hasher = Sha256::new();
    for message in first_messages {
        hasher.update(message.to_str_radix(10).as_bytes());
    }
    let hash = hasher.finalize();
    BigUint::from_bytes_be(&hash) % challenge_modulus(bits)
}

/// Challenge left over for the real branch once every simulated branch has
/// taken its share: (challenge - simulated_sum) mod 2^bits.
pub fn forced_challenge(challenge: &BigUint, simulated_sum: &BigUint, bits: u64) -> BigUint {
    let modulus = challenge_modulus(bits);
    (challenge + &modulus - simulated_sum % &modulus) % &modulus
}

pub fn challenges_sum_to(challenge: &BigUint, challenges: &[BigUint], bits: u64) -> bool {
    let sum: BigUint = challenges.iter().sum();
    sum % challenge_modulus(bits) == *challenge
}

/// The sigma-protocol verification equation for one branch:
/// z^n = a * u^e (mod n²).
pub fn verify_branch(
    pk: &PublicKey,
    base: &BigUint,
    a: &BigUint,
    e: &BigUint,
    z: &BigUint,
) -> bool {
    let left = z.modpow(&pk.n, &pk.n_sq);
    let right = (a * base.modpow(e, &pk.n_sq)) % &pk.n_sq;
    left == right
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_is_deterministic_and_bounded() {
        let messages = vec![BigUint::from(12u32), BigUint::from(345u32)];
        let first = derive_challenge(&messages, CHALLENGE_BITS);
        let second = derive_challenge(&messages, CHALLENGE_BITS);
        assert_eq!(first, second);
        assert!(first < challenge_modulus(CHALLENGE_BITS));
    }

    #[test]
    fn challenge_depends_on_message_order() {
        let forward = vec![BigUint::from(12u32), BigUint::from(345u32)];
        let backward = vec![BigUint::from(345u32), BigUint::from(12u32)];
        assert_ne!(
            derive_challenge(&forward, CHALLENGE_BITS),
            derive_challenge(&backward, CHALLENGE_BITS)
        );
    }

    #[test]
    fn forced_challenge_wraps_around() {
        // (5 - 10) mod 2^8 = 251
        let result = forced_challenge(&BigUint::from(5u32), &BigUint::from(10u32), 8);
        assert_eq!(result, BigUint::from(251u32));
    }

    #[test]
    fn forced_challenge_completes_the_sum() {
        let challenge = BigUint::from(200u32);
        let simulated = vec![BigUint::from(300u32), BigUint::from(77u32)];
        let simulated_sum: BigUint = simulated.iter().sum();
        let forced = forced_challenge(&challenge, &simulated_sum, 8);

        let mut all = simulated;
        all.push(forced);
        assert!(challenges_sum_to(&challenge, &all, 8));
    }
}
