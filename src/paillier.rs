use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub n: BigUint,    // modulus n = p * q
    pub g: BigUint,    // generator of Z*_{n²}, here n + 1
    pub n_sq: BigUint, // n² cached for ciphertext arithmetic
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keypair {
    pub public: PublicKey,
    pub lambda: BigUint, // (p - 1)(q - 1)
    pub mu: BigUint,     // lambda^-1 mod n
}

impl Keypair {
    /// Generate a Paillier keypair with a modulus of roughly `bits` bits.
    pub fn generate(bits: u64) -> Result<Self> {
        let p = generate_prime(bits / 2);
        let q = loop {
            let q = generate_prime(bits / 2);
            if q != p {
                break q;
            }
        };

        let n = &p * &q;
        let n_sq = &n * &n;
        let g = &n + BigUint::one();
        let lambda = (&p - BigUint::one()) * (&q - BigUint::one());
        let mu = mod_inverse(&lambda, &n)?;

        Ok(Self {
            public: PublicKey { n, g, n_sq },
            lambda,
            mu,
        })
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }
}

// Simple Miller-Rabin primality test
fn is_probably_prime(n: &BigUint, rounds: usize) -> bool {
    if n < &BigUint::from(2u32) {
        return false;
    }
    if n == &BigUint::from(2u32) || n == &BigUint::from(3u32) {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // Write n-1 as d * 2^r
    let mut d = n - 1u32;
    let mut r = 0;
    while d.is_even() {
        d >>= 1;
        r += 1;
    }

    let mut rng = OsRng;

    'witness_loop: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&BigUint::from(2u32), &(n - 1u32));
        let mut x = a.modpow(&d, n);

        if x.is_one() || x == n - 1u32 {
            continue 'witness_loop;
        }

        for _ in 0..r - 1 {
            x = x.modpow(&BigUint::from(2u32), n);
            if x == n - 1u32 {
                continue 'witness_loop;
            }
        }
        return false;
    }
    true
}

fn generate_prime(bits: u64) -> BigUint {
    let mut rng = OsRng;
    loop {
        let mut candidate = rng.gen_biguint(bits);
        // force exact bit length and oddness before testing
        candidate |= BigUint::one() << (bits - 1);
        candidate |= BigUint::one();

        if is_probably_prime(&candidate, 40) {
            return candidate;
        }
    }
}

/// Draw a value in (0, modulus) coprime to `modulus`, rejection-sampling
/// from the OS generator with draws bounded to `bits` bits.
pub fn generate_coprime(bits: u64, modulus: &BigUint) -> BigUint {
    let mut rng = OsRng;
    loop {
        let candidate = rng.gen_biguint(bits);
        if candidate.is_zero() || candidate >= *modulus {
            continue;
        }
        if candidate.gcd(modulus).is_one() {
            return candidate;
        }
    }
}

/// Modular inverse via the extended Euclidean algorithm.
/// Fails when `value` and `modulus` share a factor.
pub fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    let modulus_int = BigInt::from(modulus.clone());
    let mut r0 = modulus_int.clone();
    let mut r1 = BigInt::from(value.clone()) % &modulus_int;
    let mut t0 = BigInt::zero();
    let mut t1 = BigInt::one();

    while !r1.is_zero() {
        let quotient = &r0 / &r1;
        let r2 = &r0 - &quotient * &r1;
        let t2 = &t0 - &quotient * &t1;
        r0 = r1;
        r1 = r2;
        t0 = t1;
        t1 = t2;
    }

    if !r0.is_one() {
        return Err(Error::NotInvertible);
    }

    // mod_floor lands in [0, modulus), so the magnitude is the inverse
    let (_, inverse) = t0.mod_floor(&modulus_int).into_parts();
    Ok(inverse)
}

/// Randomized encryption: c = g^m * r^n mod n², with r coprime to n.
/// Returns the randomness alongside the ciphertext; the prover needs it
/// as part of its witness.
pub fn encrypt(pk: &PublicKey, plaintext: &BigUint) -> (BigUint, BigUint) {
    let r = generate_coprime(pk.n.bits(), &pk.n);
    let g_m = pk.g.modpow(plaintext, &pk.n_sq);
    let r_n = r.modpow(&pk.n, &pk.n_sq);
    let ciphertext = (g_m * r_n) % &pk.n_sq;
    (r, ciphertext)
}

/// m = L(c^lambda mod n²) * mu mod n, where L(u) = (u - 1) / n
pub fn decrypt(keypair: &Keypair, ciphertext: &BigUint) -> BigUint {
    let pk = &keypair.public;
    let x = ciphertext.modpow(&keypair.lambda, &pk.n_sq);
    let l = (x - BigUint::one()) / &pk.n;
    (l * &keypair.mu) % &pk.n
}

/// Homomorphic addition: the product of two ciphertexts encrypts the sum
/// of their plaintexts.
pub fn add_ciphertexts(pk: &PublicKey, c1: &BigUint, c2: &BigUint) -> BigUint {
    (c1 * c2) % &pk.n_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_keypair() -> Keypair {
        Keypair::generate(128).unwrap()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let keypair = test_keypair();
        let plaintext = BigUint::from(7261u32);
        let (_, ciphertext) = encrypt(keypair.public(), &plaintext);
        assert_eq!(decrypt(&keypair, &ciphertext), plaintext);
    }

    #[test]
    fn encryption_randomness_is_coprime() {
        let keypair = test_keypair();
        let n = &keypair.public.n;
        let (r, _) = encrypt(keypair.public(), &BigUint::from(3u32));
        assert!(r > BigUint::zero() && &r < n);
        assert!(r.gcd(n).is_one());
    }

    #[test]
    fn coprime_sampler_stays_in_range() {
        let keypair = test_keypair();
        let n = &keypair.public.n;
        for _ in 0..16 {
            let value = generate_coprime(n.bits(), n);
            assert!(value > BigUint::zero() && &value < n);
            assert!(value.gcd(n).is_one());
        }
    }

    #[test]
    fn mod_inverse_round_trip() {
        let modulus = BigUint::from(101u32);
        let value = BigUint::from(37u32);
        let inverse = mod_inverse(&value, &modulus).unwrap();
        assert_eq!((value * inverse) % modulus, BigUint::one());
    }

    #[test]
    fn mod_inverse_rejects_shared_factor() {
        let modulus = BigUint::from(100u32);
        let value = BigUint::from(35u32);
        assert_eq!(mod_inverse(&value, &modulus), Err(Error::NotInvertible));
    }

    #[test]
    fn ciphertexts_add_homomorphically() {
        let keypair = test_keypair();
        let (_, c1) = encrypt(keypair.public(), &BigUint::from(20u32));
        let (_, c2) = encrypt(keypair.public(), &BigUint::from(22u32));
        let sum = add_ciphertexts(keypair.public(), &c1, &c2);
        assert_eq!(decrypt(&keypair, &sum), BigUint::from(42u32));
    }
}
