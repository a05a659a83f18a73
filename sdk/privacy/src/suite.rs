//! Curve + hash pairing shared by every shielded operation.

use std::sync::Arc;

use crate::curve::{CurveKind, MontgomeryCurve};
use crate::error::Result;
use crate::field::Field;
use crate::hash::{FieldHasher, Mimc7};

/// The curve parameter set and the commitment hash over its base field
#[derive(Clone)]
pub struct CryptoSuite {
    curve: MontgomeryCurve,
    hasher: Arc<dyn FieldHasher>,
}

impl CryptoSuite {
    /// Curve with MiMC7 over its base field
    pub fn new(kind: CurveKind) -> Result<Self> {
        let curve = MontgomeryCurve::new(kind)?;
        let hasher = Arc::new(Mimc7::new(curve.field()));
        Ok(Self { curve, hasher })
    }

    /// Curve with a caller-supplied hash
    pub fn with_hasher(curve: MontgomeryCurve, hasher: Arc<dyn FieldHasher>) -> Self {
        Self { curve, hasher }
    }

    pub fn curve(&self) -> &MontgomeryCurve {
        &self.curve
    }

    pub fn hasher(&self) -> &dyn FieldHasher {
        self.hasher.as_ref()
    }

    pub fn field(&self) -> &Field {
        self.curve.field()
    }
}

impl std::fmt::Debug for CryptoSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoSuite")
            .field("curve", &self.curve.kind())
            .finish_non_exhaustive()
    }
}
