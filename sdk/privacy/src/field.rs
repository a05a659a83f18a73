//! Prime Field Arithmetic
//!
//! Field elements over a runtime-selected prime modulus. The modulus travels
//! with every element so results are always reduced into `[0, p)`.
//!
//! ```text
//! a + b  = (a + b) mod p
//! a / b  = a * b^(p-2) mod p        (b != 0)
//! sqrt a = Tonelli-Shanks            (a must be a quadratic residue)
//! ```

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;

use crate::error::{CryptoError, Result};

/// Width in hex digits of every field element on the wire
pub const FIELD_HEX_WIDTH: usize = 64;

/// A prime field `GF(p)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    modulus: Arc<BigUint>,
}

impl Field {
    pub fn new(modulus: BigUint) -> Self {
        Self {
            modulus: Arc::new(modulus),
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Same modulus, by pointer first
    pub fn same_as(&self, other: &Field) -> bool {
        Arc::ptr_eq(&self.modulus, &other.modulus) || self.modulus == other.modulus
    }

    /// Bit length of the modulus
    pub fn bits(&self) -> u64 {
        self.modulus.bits()
    }

    pub fn zero(&self) -> FieldElement {
        self.element(BigUint::zero())
    }

    pub fn one(&self) -> FieldElement {
        self.element(BigUint::one())
    }

    pub fn from_u64(&self, value: u64) -> FieldElement {
        self.reduce(BigUint::from(value))
    }

    /// Reduce an arbitrary integer into the field
    pub fn reduce(&self, value: BigUint) -> FieldElement {
        self.element(value % self.modulus.as_ref())
    }

    /// Accept an integer only if it is already below the modulus
    pub fn from_canonical(&self, value: BigUint) -> Result<FieldElement> {
        if &value >= self.modulus.as_ref() {
            return Err(CryptoError::NonCanonical(value.to_str_radix(16)));
        }
        Ok(self.element(value))
    }

    /// Parse a hex string, with or without `0x`, rejecting values `>= p`
    pub fn from_hex(&self, s: &str) -> Result<FieldElement> {
        let value = parse_hex(s)?;
        self.from_canonical(value)
    }

    /// Parse a big-endian byte string, rejecting values `>= p`
    pub fn from_be_bytes(&self, bytes: &[u8]) -> Result<FieldElement> {
        self.from_canonical(BigUint::from_bytes_be(bytes))
    }

    /// Uniformly random element in `[0, p)`
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> FieldElement {
        let value = rng.gen_biguint_below(&self.modulus);
        self.element(value)
    }

    fn element(&self, value: BigUint) -> FieldElement {
        FieldElement {
            value,
            field: self.clone(),
        }
    }
}

/// Parse a hex string into an integer. Empty strings and a bare `0x` are zero.
pub fn parse_hex(s: &str) -> Result<BigUint> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() {
        return Ok(BigUint::zero());
    }
    BigUint::parse_bytes(digits.as_bytes(), 16).ok_or_else(|| CryptoError::InvalidHex(s.to_string()))
}

/// Lowercase hex left-padded with zeros to `width` digits
pub fn pad_hex(value: &BigUint, width: usize) -> String {
    format!("{:0>width$}", value.to_str_radix(16), width = width)
}

/// An element of a prime field
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldElement {
    value: BigUint,
    field: Field,
}

impl FieldElement {
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn into_value(self) -> BigUint {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.value.is_one()
    }

    /// `self^exp mod p`
    pub fn pow(&self, exp: &BigUint) -> FieldElement {
        self.field.element(self.value.modpow(exp, &self.field.modulus))
    }

    /// Multiplicative inverse via Fermat's little theorem
    pub fn inverse(&self) -> Result<FieldElement> {
        if self.is_zero() {
            return Err(CryptoError::DivisionByZero);
        }
        let exp = self.field.modulus.as_ref() - 2u32;
        Ok(self.pow(&exp))
    }

    fn check_same_field(&self, other: &FieldElement) -> Result<()> {
        if !self.field.same_as(&other.field) {
            return Err(CryptoError::FieldMismatch);
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &FieldElement) -> Result<FieldElement> {
        self.check_same_field(other)?;
        Ok(self + other)
    }

    pub fn checked_sub(&self, other: &FieldElement) -> Result<FieldElement> {
        self.check_same_field(other)?;
        Ok(self - other)
    }

    pub fn checked_mul(&self, other: &FieldElement) -> Result<FieldElement> {
        self.check_same_field(other)?;
        Ok(self * other)
    }

    /// `self * other^-1`
    pub fn checked_div(&self, other: &FieldElement) -> Result<FieldElement> {
        self.check_same_field(other)?;
        Ok(self * &other.inverse()?)
    }

    pub fn square(&self) -> FieldElement {
        self * self
    }

    /// Euler's criterion: true for zero and quadratic residues
    pub fn is_square(&self) -> bool {
        if self.is_zero() {
            return true;
        }
        let exp = (self.field.modulus.as_ref() - 1u32) >> 1;
        self.pow(&exp).is_one()
    }

    /// Modular square root (Tonelli-Shanks)
    pub fn sqrt(&self) -> Result<FieldElement> {
        if self.is_zero() {
            return Ok(self.clone());
        }
        if !self.is_square() {
            return Err(CryptoError::NoSquareRoot);
        }

        let p = self.field.modulus.as_ref();
        let one = BigUint::one();
        let p_minus_one = p - 1u32;

        // p - 1 = q * 2^s with q odd
        let mut q = p_minus_one.clone();
        let mut s = 0u64;
        while !q.bit(0) {
            q >>= 1;
            s += 1;
        }

        if s == 1 {
            let exp = (p + 1u32) >> 2;
            return Ok(self.pow(&exp));
        }

        let mut z = self.field.from_u64(2);
        while z.is_square() {
            z = &z + &self.field.one();
        }

        let mut m = s;
        let mut c = z.pow(&q);
        let mut t = self.pow(&q);
        let mut r = self.pow(&((&q + &one) >> 1));

        while !t.is_one() {
            let mut i = 0u64;
            let mut t2i = t.clone();
            while !t2i.is_one() {
                t2i = t2i.square();
                i += 1;
                if i == m {
                    return Err(CryptoError::NoSquareRoot);
                }
            }
            let mut b = c.clone();
            for _ in 0..(m - i - 1) {
                b = b.square();
            }
            m = i;
            c = b.square();
            t = &t * &c;
            r = &r * &b;
        }
        Ok(r)
    }

    /// Lowercase hex without prefix or padding
    pub fn to_hex(&self) -> String {
        self.value.to_str_radix(16)
    }

    /// 64-digit zero-padded lowercase hex, no prefix
    pub fn to_padded_hex(&self) -> String {
        pad_hex(&self.value, FIELD_HEX_WIDTH)
    }

    /// `0x` + 64-digit zero-padded lowercase hex
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_padded_hex())
    }

    /// Big-endian bytes, left-padded to 32
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let bytes = self.value.to_bytes_be();
        let mut arr = [0u8; 32];
        let len = bytes.len().min(32);
        arr[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
        arr
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement(0x{})", self.to_hex())
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl<'a> Add<&'a FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &'a FieldElement) -> FieldElement {
        assert!(self.field.same_as(&rhs.field), "mixed field moduli");
        self.field.reduce(&self.value + &rhs.value)
    }
}

impl<'a> Sub<&'a FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: &'a FieldElement) -> FieldElement {
        assert!(self.field.same_as(&rhs.field), "mixed field moduli");
        let p = self.field.modulus.as_ref();
        self.field.reduce(&self.value + p - &rhs.value)
    }
}

impl<'a> Mul<&'a FieldElement> for &'a FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &'a FieldElement) -> FieldElement {
        assert!(self.field.same_as(&rhs.field), "mixed field moduli");
        self.field.reduce(&self.value * &rhs.value)
    }
}

impl Neg for &FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        if self.is_zero() {
            return self.clone();
        }
        self.field
            .element(self.field.modulus.as_ref() - &self.value)
    }
}

macro_rules! forward_owned_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<FieldElement> for FieldElement {
            type Output = FieldElement;

            fn $method(self, rhs: FieldElement) -> FieldElement {
                (&self).$method(&rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        -&self
    }
}
