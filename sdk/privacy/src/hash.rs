//! MiMC7 Commitment Hash
//!
//! Collision-resistant hash over field elements, used as commitment function,
//! PRF and nullifier derivation.
//!
//! ```text
//! E_k(x)      = r_91(...r_1(x)) + k,     r_i(x) = (x + k + c_i)^7
//! compress(l, r) = E_l(r) + l + r        (Miyaguchi-Preneel)
//!
//! H(m)            = compress(m, m)
//! H(m0, ..., mn)  = compress(...compress(m0, m1)..., mn)
//! ```

use num_bigint::BigUint;

use crate::error::{CryptoError, Result};
use crate::field::{Field, FieldElement};

/// Number of MiMC rounds
const MIMC_ROUNDS: usize = 91;

/// Largest number of inputs a single hash call accepts
const MAX_ARITY: usize = 3;

/// Hash capability over field elements of arity 1 to 3
pub trait FieldHasher: Send + Sync {
    /// `H(first, rest...)`; at least one input is required by construction
    fn fold(&self, first: &FieldElement, rest: &[FieldElement]) -> FieldElement;

    /// Hash a slice of 1 to 3 elements
    fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement> {
        match inputs {
            [first, rest @ ..] if inputs.len() <= MAX_ARITY => Ok(self.fold(first, rest)),
            _ => Err(CryptoError::HashArity(inputs.len())),
        }
    }

    fn hash1(&self, a: &FieldElement) -> FieldElement {
        self.fold(a, &[])
    }

    fn hash2(&self, a: &FieldElement, b: &FieldElement) -> FieldElement {
        self.fold(a, std::slice::from_ref(b))
    }

    fn hash3(&self, a: &FieldElement, b: &FieldElement, c: &FieldElement) -> FieldElement {
        self.fold(a, &[b.clone(), c.clone()])
    }
}

/// MiMC with exponent 7 over a runtime-selected field
#[derive(Debug, Clone)]
pub struct Mimc7 {
    field: Field,
    round_constants: Vec<FieldElement>,
    exponent: BigUint,
}

impl Mimc7 {
    pub fn new(field: &Field) -> Self {
        let round_constants = (0..MIMC_ROUNDS)
            .map(|i| Self::compute_round_constant(field, i))
            .collect();

        Self {
            field: field.clone(),
            round_constants,
            exponent: BigUint::from(7u32),
        }
    }

    /// RC[0] = 0, RC[i] = i^3 + i
    fn compute_round_constant(field: &Field, i: usize) -> FieldElement {
        if i == 0 {
            return field.zero();
        }
        let idx = field.from_u64(i as u64);
        &(&idx.square() * &idx) + &idx
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// MiMC block cipher: encrypts `x` under key `k`
    fn encipher(&self, x: &FieldElement, k: &FieldElement) -> FieldElement {
        let mut state = x.clone();
        for c in &self.round_constants {
            let t = &(&state + k) + c;
            state = t.pow(&self.exponent);
        }
        &state + k
    }

    fn compress(&self, left: &FieldElement, right: &FieldElement) -> FieldElement {
        let e = self.encipher(right, left);
        &(&e + left) + right
    }
}

impl FieldHasher for Mimc7 {
    fn fold(&self, first: &FieldElement, rest: &[FieldElement]) -> FieldElement {
        if rest.is_empty() {
            return self.compress(first, first);
        }
        rest.iter()
            .fold(first.clone(), |h, m| self.compress(&h, m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn field() -> Field {
        let p = BigUint::parse_bytes(
            b"21888242871839275222246405745257275088548364400416034343698204186575808495617",
            10,
        )
        .unwrap();
        Field::new(p)
    }

    #[test]
    fn test_mimc_deterministic() {
        let f = field();
        let mimc = Mimc7::new(&f);
        let a = f.from_u64(123);
        let b = f.from_u64(456);

        assert_eq!(mimc.hash2(&a, &b), mimc.hash2(&a, &b), "Hash should be deterministic");
    }

    #[test]
    fn test_mimc_order_matters() {
        let f = field();
        let mimc = Mimc7::new(&f);
        let a = f.from_u64(1);
        let b = f.from_u64(2);

        assert_ne!(mimc.hash2(&a, &b), mimc.hash2(&b, &a), "Hash should be order-sensitive");
    }

    #[test]
    fn test_mimc_folding() {
        let f = field();
        let mimc = Mimc7::new(&f);
        let a = f.from_u64(5);
        let b = f.from_u64(6);

        // a single input is compressed with itself
        assert_eq!(mimc.hash1(&a), mimc.hash2(&a, &a));
        let ab = mimc.hash2(&a, &b);
        assert_eq!(mimc.hash3(&a, &b, &a), mimc.hash2(&ab, &a));
        assert_ne!(mimc.hash3(&a, &b, &a), ab);
    }

    #[test]
    fn test_hash_arity_is_checked() {
        let f = field();
        let mimc = Mimc7::new(&f);
        let a = f.from_u64(7);
        let b = f.from_u64(8);

        assert_eq!(mimc.hash(&[]), Err(CryptoError::HashArity(0)));
        assert_eq!(
            mimc.hash(&[a.clone(), b.clone(), a.clone(), b.clone()]),
            Err(CryptoError::HashArity(4))
        );
        assert_eq!(mimc.hash(std::slice::from_ref(&a)).unwrap(), mimc.hash1(&a));
        assert_eq!(mimc.hash(&[a.clone(), b.clone()]).unwrap(), mimc.hash2(&a, &b));
        assert_eq!(
            mimc.hash(&[a.clone(), b.clone(), a.clone()]).unwrap(),
            mimc.hash3(&a, &b, &a)
        );
    }

    #[test]
    fn test_round_constants() {
        let f = field();
        let mimc = Mimc7::new(&f);
        assert_eq!(mimc.round_constants.len(), MIMC_ROUNDS);
        assert!(mimc.round_constants[0].is_zero());
        assert_eq!(mimc.round_constants[2], f.from_u64(10));
    }
}
