//! Montgomery Curve Arithmetic
//!
//! Affine point arithmetic on curves of the form
//!
//! ```text
//! B * y^2 = x^3 + A * x^2 + x        over GF(p)
//!
//! double:  l  = (3x^2 + 2Ax + 1) / 2By
//!          x3 = B*l^2 - A - 2x
//!          y3 = (3x + A - B*l^2) * l - y
//!
//! add:     l  = (y1 - y2) / (x1 - x2)
//!          x3 = B*l^2 - A - x1 - x2
//!          y3 = l * (x1 - x3) - y1
//! ```
//!
//! The point at infinity is modelled explicitly as [`Point::Identity`].
//! Scalar multiplication is a Montgomery ladder over a fixed number of bits,
//! so the sequence of group operations does not depend on the scalar.

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};
use crate::field::{Field, FieldElement};

/// Supported curve parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Baby Jubjub, embedded in the BN254 scalar field
    #[default]
    BabyJubjub,
    /// Jubjub, embedded in the BLS12-381 scalar field
    Jubjub,
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveKind::BabyJubjub => write!(f, "baby_jubjub"),
            CurveKind::Jubjub => write!(f, "jubjub"),
        }
    }
}

impl FromStr for CurveKind {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "baby_jubjub" | "babyjubjub" | "ec_alt_bn128" | "bn128" => Ok(CurveKind::BabyJubjub),
            "jubjub" | "ec_bls12_381" | "bls12_381" => Ok(CurveKind::Jubjub),
            other => Err(CryptoError::InvalidCurvePoint(format!(
                "unknown curve parameter set: {other}"
            ))),
        }
    }
}

/// A point with affine coordinates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffinePoint {
    pub x: FieldElement,
    pub y: FieldElement,
}

impl AffinePoint {
    pub fn new(x: FieldElement, y: FieldElement) -> Self {
        Self { x, y }
    }

    /// `[x, y]` as 64-digit hex without prefix
    pub fn to_padded_hex(&self) -> [String; 2] {
        [self.x.to_padded_hex(), self.y.to_padded_hex()]
    }

    pub fn to_raw(&self) -> RawAffinePoint {
        RawAffinePoint {
            x: self.x.to_padded_hex(),
            y: self.y.to_padded_hex(),
        }
    }
}

/// Wire shape of an affine point before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAffinePoint {
    pub x: String,
    pub y: String,
}

/// A curve point: affine or the point at infinity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Point {
    Identity,
    Affine(AffinePoint),
}

impl Point {
    pub fn is_identity(&self) -> bool {
        matches!(self, Point::Identity)
    }

    /// Affine coordinates, failing on the point at infinity
    pub fn affine(&self) -> Result<&AffinePoint> {
        match self {
            Point::Affine(p) => Ok(p),
            Point::Identity => Err(CryptoError::PointAtInfinity),
        }
    }

    pub fn into_affine(self) -> Result<AffinePoint> {
        match self {
            Point::Affine(p) => Ok(p),
            Point::Identity => Err(CryptoError::PointAtInfinity),
        }
    }
}

impl From<AffinePoint> for Point {
    fn from(p: AffinePoint) -> Self {
        Point::Affine(p)
    }
}

/// A Montgomery curve with a distinguished generator of its prime subgroup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MontgomeryCurve {
    kind: CurveKind,
    field: Field,
    a: FieldElement,
    b: FieldElement,
    order: BigUint,
    generator: AffinePoint,
}

impl MontgomeryCurve {
    /// Build one of the supported parameter sets
    pub fn new(kind: CurveKind) -> Result<Self> {
        match kind {
            CurveKind::BabyJubjub => {
                let field = Field::new(dec(BN254_SCALAR_MODULUS)?);
                let a = field.from_u64(168_698);
                let b = field.one();
                Self::with_generator(kind, field, a, b, dec(BABY_JUBJUB_ORDER)?, BABY_JUBJUB_GX)
            }
            CurveKind::Jubjub => {
                let field = Field::new(hex(BLS12_381_SCALAR_MODULUS)?);
                let a = field.from_u64(40_962);
                let b = -field.from_u64(40_964);
                Self::with_generator(kind, field, a, b, hex(JUBJUB_ORDER)?, JUBJUB_GX)
            }
        }
    }

    pub fn baby_jubjub() -> Result<Self> {
        Self::new(CurveKind::BabyJubjub)
    }

    pub fn jubjub() -> Result<Self> {
        Self::new(CurveKind::Jubjub)
    }

    fn with_generator(
        kind: CurveKind,
        field: Field,
        a: FieldElement,
        b: FieldElement,
        order: BigUint,
        gx: &str,
    ) -> Result<Self> {
        let mut curve = Self {
            kind,
            field: field.clone(),
            a,
            b,
            order,
            generator: AffinePoint::new(field.zero(), field.zero()),
        };
        let x = field.reduce(dec(gx)?);
        let y = curve.compute_y_coord(&x)?;
        curve.generator = AffinePoint::new(x, y);
        curve.check_point_on_curve(&Point::Affine(curve.generator.clone()))?;
        Ok(curve)
    }

    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Order of the prime subgroup generated by [`Self::generator`]
    pub fn order(&self) -> &BigUint {
        &self.order
    }

    pub fn generator(&self) -> &AffinePoint {
        &self.generator
    }

    /// Random scalar in `[1, order)`
    pub fn random_scalar<R: Rng + ?Sized>(&self, rng: &mut R) -> FieldElement {
        let value = rng.gen_biguint_range(&BigUint::one(), &self.order);
        self.field.reduce(value)
    }

    /// Reject scalars outside `[1, order)`
    pub fn check_scalar(&self, scalar: &FieldElement) -> Result<()> {
        if scalar.is_zero() || scalar.value() >= &self.order {
            return Err(CryptoError::InvalidScalar(scalar.to_hex()));
        }
        Ok(())
    }

    /// Whether `B*y^2 == x^3 + A*x^2 + x`
    pub fn is_on_curve(&self, p: &AffinePoint) -> bool {
        let lhs = &self.b * &p.y.square();
        lhs == self.rhs(&p.x)
    }

    /// Self-validation of a computed point. The identity is always accepted.
    pub fn check_point_on_curve(&self, p: &Point) -> Result<()> {
        match p {
            Point::Identity => Ok(()),
            Point::Affine(a) if self.is_on_curve(a) => Ok(()),
            Point::Affine(a) => Err(CryptoError::InvalidCurvePoint(format!(
                "({}, {})",
                a.x, a.y
            ))),
        }
    }

    /// Recover a y-coordinate for `x`, failing when `x` is not on the curve
    pub fn compute_y_coord(&self, x: &FieldElement) -> Result<FieldElement> {
        let y_squared = self.rhs(x).checked_div(&self.b)?;
        y_squared.sqrt().map_err(|_| {
            CryptoError::InvalidCurvePoint(format!("no y-coordinate for x = {x}"))
        })
    }

    /// Parse and validate a point received from outside
    pub fn parse_point(&self, raw: &RawAffinePoint) -> Result<AffinePoint> {
        let p = AffinePoint::new(self.field.from_hex(&raw.x)?, self.field.from_hex(&raw.y)?);
        if !self.is_on_curve(&p) {
            return Err(CryptoError::InvalidCurvePoint(format!("({}, {})", raw.x, raw.y)));
        }
        if !self.in_subgroup(&p) {
            return Err(CryptoError::NotInSubgroup(format!("({}, {})", raw.x, raw.y)));
        }
        Ok(p)
    }

    /// Whether `order * p` is the identity
    pub fn in_subgroup(&self, p: &AffinePoint) -> bool {
        self.scalar_mul(&Point::Affine(p.clone()), &self.order).is_identity()
    }

    fn rhs(&self, x: &FieldElement) -> FieldElement {
        let x2 = x.square();
        let x3 = &x2 * x;
        &(&x3 + &(&self.a * &x2)) + x
    }

    pub fn neg(&self, p: &Point) -> Point {
        match p {
            Point::Identity => Point::Identity,
            Point::Affine(a) => Point::Affine(AffinePoint::new(a.x.clone(), -&a.y)),
        }
    }

    pub fn double(&self, p: &Point) -> Point {
        let p = match p {
            Point::Identity => return Point::Identity,
            Point::Affine(p) => p,
        };
        // 2-torsion points double to infinity
        if p.y.is_zero() {
            return Point::Identity;
        }

        let field = &self.field;
        let three = field.from_u64(3);
        let two = field.from_u64(2);

        let num = &(&(&three * &p.x.square()) + &(&(&two * &p.x) * &self.a)) + &field.one();
        let den = &(&two * &p.y) * &self.b;
        let l = match num.checked_div(&den) {
            Ok(l) => l,
            Err(_) => return Point::Identity,
        };
        let b_l2 = &self.b * &l.square();

        let x3 = &(&b_l2 - &self.a) - &(&two * &p.x);
        let y3 = &(&(&(&(&three * &p.x) + &self.a) - &b_l2) * &l) - &p.y;
        Point::Affine(AffinePoint::new(x3, y3))
    }

    pub fn add(&self, p1: &Point, p2: &Point) -> Point {
        let (a, b) = match (p1, p2) {
            (Point::Identity, q) | (q, Point::Identity) => return q.clone(),
            (Point::Affine(a), Point::Affine(b)) => (a, b),
        };
        if a.x == b.x {
            return if a.y == b.y {
                self.double(p1)
            } else {
                Point::Identity
            };
        }

        let dy = &a.y - &b.y;
        let dx = &a.x - &b.x;
        let l = match dy.checked_div(&dx) {
            Ok(l) => l,
            Err(_) => return Point::Identity,
        };
        let b_l2 = &self.b * &l.square();

        let x3 = &(&(&b_l2 - &self.a) - &a.x) - &b.x;
        let y3 = &(&l * &(&a.x - &x3)) - &a.y;
        Point::Affine(AffinePoint::new(x3, y3))
    }

    /// `p1 - p2`, the sum with the negation of `p2`
    pub fn sub(&self, p1: &Point, p2: &Point) -> Point {
        self.add(p1, &self.neg(p2))
    }

    /// `k * p` by Montgomery ladder
    ///
    /// The loop runs over `max(bits(p), bits(k))` bits and does exactly one
    /// addition and one doubling per bit. `0 * p` is [`Point::Identity`].
    pub fn scalar_mul(&self, p: &Point, k: &BigUint) -> Point {
        let bits = self.field.bits().max(k.bits());
        let mut r0 = Point::Identity;
        let mut r1 = p.clone();

        for i in (0..bits).rev() {
            if k.bit(i) {
                r0 = self.add(&r0, &r1);
                r1 = self.double(&r1);
            } else {
                r1 = self.add(&r0, &r1);
                r0 = self.double(&r0);
            }
        }
        r0
    }

    /// `k * G`
    pub fn base_point_mul(&self, k: &BigUint) -> Point {
        self.scalar_mul(&Point::Affine(self.generator.clone()), k)
    }

    /// `k * G` for a non-zero scalar, as affine coordinates
    pub fn public_point(&self, sk: &FieldElement) -> Result<AffinePoint> {
        self.base_point_mul(sk.value()).into_affine()
    }
}

fn dec(s: &str) -> Result<BigUint> {
    BigUint::parse_bytes(s.as_bytes(), 10).ok_or_else(|| CryptoError::InvalidHex(s.to_string()))
}

fn hex(s: &str) -> Result<BigUint> {
    crate::field::parse_hex(s)
}

/// BN254 scalar field modulus
const BN254_SCALAR_MODULUS: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";
const BABY_JUBJUB_ORDER: &str =
    "2736030358979909402780800718157159386076813972158567259200215660948447373041";
const BABY_JUBJUB_GX: &str =
    "7117928050407583618111176421555214756675765419608405867398403713213306743542";

/// BLS12-381 scalar field modulus
const BLS12_381_SCALAR_MODULUS: &str =
    "0x73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001";
const JUBJUB_ORDER: &str = "0x0e7db4ea6533afa906673b0101343b00a6682093ccc81082d0970e5ed6f72cb7";
const JUBJUB_GX: &str =
    "30187234280133485039913207787363171167738073313980369835052773791366842840325";

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_baby_jubjub_generator() {
        let curve = MontgomeryCurve::baby_jubjub().unwrap();
        let g = curve.generator();
        assert!(curve.is_on_curve(g));
        assert_eq!(
            g.y.value().to_str_radix(10),
            "14577268218881899420966779687690205425227431577728659819975198491127179315626"
        );
    }

    #[test]
    fn test_generator_has_subgroup_order() {
        for kind in [CurveKind::BabyJubjub, CurveKind::Jubjub] {
            let curve = MontgomeryCurve::new(kind).unwrap();
            let p = curve.base_point_mul(curve.order());
            assert!(p.is_identity(), "order * G should be the identity on {kind}");
        }
    }

    #[test]
    fn test_scalar_mul_zero_is_identity() {
        let curve = MontgomeryCurve::baby_jubjub().unwrap();
        assert_eq!(curve.base_point_mul(&BigUint::zero()), Point::Identity);
        assert!(curve.public_point(&curve.field().zero()).is_err());
    }

    #[test]
    fn test_scalar_mul_matches_repeated_addition() {
        let curve = MontgomeryCurve::baby_jubjub().unwrap();
        let g = Point::Affine(curve.generator().clone());
        let mut acc = Point::Identity;
        for k in 1u32..=6 {
            acc = curve.add(&acc, &g);
            assert_eq!(curve.scalar_mul(&g, &BigUint::from(k)), acc, "k = {k}");
        }
    }

    #[test]
    fn test_results_are_on_curve() {
        let mut rng = StdRng::seed_from_u64(3);
        for kind in [CurveKind::BabyJubjub, CurveKind::Jubjub] {
            let curve = MontgomeryCurve::new(kind).unwrap();
            for _ in 0..4 {
                let k = curve.random_scalar(&mut rng);
                let p = curve.base_point_mul(k.value());
                curve.check_point_on_curve(&p).unwrap();
                let d = curve.double(&p);
                curve.check_point_on_curve(&d).unwrap();
            }
        }
    }

    #[test]
    fn test_sub_inverts_add() {
        let mut rng = StdRng::seed_from_u64(5);
        let curve = MontgomeryCurve::baby_jubjub().unwrap();
        let p = curve.base_point_mul(curve.random_scalar(&mut rng).value());
        let q = curve.base_point_mul(curve.random_scalar(&mut rng).value());
        let sum = curve.add(&p, &q);
        assert_eq!(curve.sub(&sum, &q), p);
        assert_eq!(curve.sub(&p, &p), Point::Identity);
    }

    #[test]
    fn test_scalar_mul_distributes() {
        let mut rng = StdRng::seed_from_u64(9);
        let curve = MontgomeryCurve::jubjub().unwrap();
        let a = curve.random_scalar(&mut rng);
        let b = curve.random_scalar(&mut rng);
        let lhs = curve.base_point_mul(&(a.value() + b.value()));
        let rhs = curve.add(&curve.base_point_mul(a.value()), &curve.base_point_mul(b.value()));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_compute_y_rejects_off_curve_x() {
        let curve = MontgomeryCurve::baby_jubjub().unwrap();
        let mut rejected = 0;
        for x in 1u64..40 {
            if let Err(err) = curve.compute_y_coord(&curve.field().from_u64(x)) {
                assert!(matches!(err, CryptoError::InvalidCurvePoint(_)));
                rejected += 1;
            }
        }
        assert!(rejected > 0, "roughly half of all x should have no y");
    }

    #[test]
    fn test_parse_point_validates() {
        let curve = MontgomeryCurve::baby_jubjub().unwrap();
        let raw = curve.generator().to_raw();
        assert_eq!(&curve.parse_point(&raw).unwrap(), curve.generator());

        let bad = RawAffinePoint {
            x: raw.x.clone(),
            y: "01".into(),
        };
        assert!(curve.parse_point(&bad).is_err());
    }

    #[test]
    fn test_parse_point_rejects_small_order() {
        for curve in [MontgomeryCurve::baby_jubjub().unwrap(), MontgomeryCurve::jubjub().unwrap()] {
            // (0, 0) satisfies the curve equation and has order 2
            let torsion = RawAffinePoint {
                x: "00".into(),
                y: "00".into(),
            };
            assert!(matches!(
                curve.parse_point(&torsion),
                Err(CryptoError::NotInSubgroup(_))
            ));

            let g = curve.generator().clone();
            assert!(curve.in_subgroup(&g));
            let mixed = curve.add(&Point::Affine(g), &Point::Affine(AffinePoint::new(
                curve.field().zero(),
                curve.field().zero(),
            )));
            let mixed = mixed.into_affine().unwrap();
            assert!(curve.is_on_curve(&mixed));
            assert!(matches!(
                curve.parse_point(&mixed.to_raw()),
                Err(CryptoError::NotInSubgroup(_))
            ));
        }
    }

    #[test]
    fn test_curve_kind_from_str() {
        assert_eq!("baby-jubjub".parse::<CurveKind>().unwrap(), CurveKind::BabyJubjub);
        assert_eq!("EC_BLS12_381".parse::<CurveKind>().unwrap(), CurveKind::Jubjub);
        assert!("secp256k1".parse::<CurveKind>().is_err());
    }
}
