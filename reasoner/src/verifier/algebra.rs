//! Exact rational-function arithmetic
//!
//! Every parsed expression evaluates to a quotient of two multivariate
//! polynomials with arbitrary-precision rational coefficients. Two
//! expressions are equal iff the numerator of their difference is the zero
//! polynomial, so the zero test is exact and needs no epsilon.
//!
//! Fractional powers are only taken of constants with an exact root
//! (`sqrt(16/9)`, `8^(1/3)`); anything irrational is reported as
//! [`SymbolicError::Unsupported`].

use crate::verifier::error::{SymbolicError, SymbolicResult};
use crate::verifier::expr::{Expr, Func};
use num_bigint::BigInt;
use num_integer::Roots;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::BTreeMap;

/// Largest integer exponent accepted.
const MAX_EXPONENT: i64 = 64;

/// Largest total degree a power may produce.
const MAX_DEGREE: u32 = 256;

/// Largest coefficient size, in bits of numerator or denominator, a power may produce.
const MAX_COEFFICIENT_BITS: u64 = 8192;

/// Symbol name → exponent. Exponents are always positive.
type Monomial = BTreeMap<String, u32>;

/// Values substituted for symbols during evaluation.
pub type Bindings = BTreeMap<String, RationalFunction>;

/// Sparse polynomial over the rationals. Zero coefficients are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Polynomial {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: BigRational) -> Self {
        let mut poly = Self::zero();
        poly.add_term(Monomial::new(), value);
        poly
    }

    pub fn symbol(name: &str) -> Self {
        let mut mono = Monomial::new();
        mono.insert(name.to_string(), 1);
        let mut poly = Self::zero();
        poly.add_term(mono, BigRational::one());
        poly
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// The value of a polynomial with no symbols.
    pub fn as_constant(&self) -> Option<BigRational> {
        match self.terms.len() {
            0 => Some(BigRational::zero()),
            1 => self
                .terms
                .get(&Monomial::new())
                .cloned(),
            _ => None,
        }
    }

    pub fn degree(&self) -> u32 {
        self.terms
            .keys()
            .map(|mono| mono.values().sum::<u32>())
            .max()
            .unwrap_or(0)
    }

    /// Bit length of the largest numerator or denominator among the coefficients.
    pub fn coefficient_bits(&self) -> u64 {
        self.terms
            .values()
            .map(|c| c.numer().bits().max(c.denom().bits()))
            .max()
            .unwrap_or(0)
    }

    fn add_term(&mut self, mono: Monomial, coeff: BigRational) {
        if coeff.is_zero() {
            return;
        }
        let slot = self.terms.entry(mono).or_insert_with(BigRational::zero);
        *slot += coeff;
        if slot.is_zero() {
            self.terms.retain(|_, c| !c.is_zero());
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (mono, coeff) in &other.terms {
            out.add_term(mono.clone(), coeff.clone());
        }
        out
    }

    pub fn neg(&self) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|(mono, coeff)| (mono.clone(), -coeff.clone()))
                .collect(),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn scale(&self, factor: &BigRational) -> Self {
        let mut out = Self::zero();
        for (mono, coeff) in &self.terms {
            out.add_term(mono.clone(), coeff * factor);
        }
        out
    }

    pub fn mul(&self, other: &Self) -> Self {
        let mut out = Self::zero();
        for (lm, lc) in &self.terms {
            for (rm, rc) in &other.terms {
                let mut mono = lm.clone();
                for (name, exp) in rm {
                    *mono.entry(name.clone()).or_insert(0) += exp;
                }
                out.add_term(mono, lc * rc);
            }
        }
        out
    }

    pub fn pow(&self, exponent: u32) -> Self {
        let mut result = Self::constant(BigRational::one());
        let mut base = self.clone();
        let mut n = exponent;
        while n > 0 {
            if n & 1 == 1 {
                result = result.mul(&base);
            }
            n >>= 1;
            if n > 0 {
                base = base.mul(&base);
            }
        }
        result
    }
}

/// `numerator / denominator` with a denominator that is never the zero polynomial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalFunction {
    numerator: Polynomial,
    denominator: Polynomial,
}

impl RationalFunction {
    pub fn constant(value: BigRational) -> Self {
        Self::from_polynomial(Polynomial::constant(value))
    }

    pub fn integer(value: i64) -> Self {
        Self::constant(BigRational::from_integer(BigInt::from(value)))
    }

    pub fn symbol(name: &str) -> Self {
        Self::from_polynomial(Polynomial::symbol(name))
    }

    pub fn from_polynomial(numerator: Polynomial) -> Self {
        Self {
            numerator,
            denominator: Polynomial::constant(BigRational::one()),
        }
    }

    fn from_parts(numerator: Polynomial, denominator: Polynomial) -> SymbolicResult<Self> {
        if denominator.is_zero() {
            return Err(SymbolicError::DivisionByZero);
        }
        Ok(Self {
            numerator,
            denominator,
        }
        .normalize())
    }

    /// Fold a constant denominator into the numerator.
    fn normalize(self) -> Self {
        match self.denominator.as_constant() {
            Some(c) if !c.is_one() => Self {
                numerator: self.numerator.scale(&c.recip()),
                denominator: Polynomial::constant(BigRational::one()),
            },
            _ => self,
        }
    }

    pub fn numerator(&self) -> &Polynomial {
        &self.numerator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    pub fn as_constant(&self) -> Option<BigRational> {
        let num = self.numerator.as_constant()?;
        let den = self.denominator.as_constant()?;
        Some(num / den)
    }

    pub fn neg(&self) -> Self {
        Self {
            numerator: self.numerator.neg(),
            denominator: self.denominator.clone(),
        }
    }

    pub fn add(&self, other: &Self) -> SymbolicResult<Self> {
        if self.denominator == other.denominator {
            return Self::from_parts(
                self.numerator.add(&other.numerator),
                self.denominator.clone(),
            );
        }
        Self::from_parts(
            self.numerator
                .mul(&other.denominator)
                .add(&other.numerator.mul(&self.denominator)),
            self.denominator.mul(&other.denominator),
        )
    }

    pub fn sub(&self, other: &Self) -> SymbolicResult<Self> {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Self) -> SymbolicResult<Self> {
        Self::from_parts(
            self.numerator.mul(&other.numerator),
            self.denominator.mul(&other.denominator),
        )
    }

    pub fn div(&self, other: &Self) -> SymbolicResult<Self> {
        if other.is_zero() {
            return Err(SymbolicError::DivisionByZero);
        }
        Self::from_parts(
            self.numerator.mul(&other.denominator),
            self.denominator.mul(&other.numerator),
        )
    }

    /// Integer power; negative exponents invert.
    pub fn powi(&self, exponent: i64) -> SymbolicResult<Self> {
        let n = u32::try_from(exponent.unsigned_abs())
            .ok()
            .filter(|n| i64::from(*n) <= MAX_EXPONENT)
            .ok_or_else(|| {
                SymbolicError::unsupported(format!("exponent {exponent} exceeds {MAX_EXPONENT}"))
            })?;
        let degree = self.numerator.degree().max(self.denominator.degree());
        if degree.saturating_mul(n) > MAX_DEGREE {
            return Err(SymbolicError::unsupported("power degree too large"));
        }
        let bits = self
            .numerator
            .coefficient_bits()
            .max(self.denominator.coefficient_bits());
        if bits.saturating_mul(u64::from(n)) > MAX_COEFFICIENT_BITS {
            return Err(SymbolicError::unsupported("power coefficients too large"));
        }
        if exponent < 0 {
            if self.is_zero() {
                return Err(SymbolicError::DivisionByZero);
            }
            return Self::from_parts(self.denominator.pow(n), self.numerator.pow(n));
        }
        Self::from_parts(self.numerator.pow(n), self.denominator.pow(n))
    }

    /// General power. The exponent must be a constant; a non-integer
    /// exponent additionally needs a constant base with an exact root.
    pub fn pow(&self, exponent: &Self) -> SymbolicResult<Self> {
        let exp = exponent
            .as_constant()
            .ok_or_else(|| SymbolicError::unsupported("symbolic exponent"))?;
        let p = exp
            .numer()
            .to_i64()
            .ok_or_else(|| SymbolicError::unsupported("exponent out of range"))?;
        let q = exp
            .denom()
            .to_u32()
            .ok_or_else(|| SymbolicError::unsupported("root index out of range"))?;
        if q == 1 {
            return self.powi(p);
        }
        let base = self
            .as_constant()
            .ok_or_else(|| SymbolicError::unsupported("fractional power of a symbolic base"))?;
        let root = exact_root(&base, q)?;
        Self::constant(root).powi(p)
    }

    fn abs(&self) -> SymbolicResult<Self> {
        let value = self
            .as_constant()
            .ok_or_else(|| SymbolicError::unsupported("abs of a symbolic value"))?;
        Ok(Self::constant(value.abs()))
    }
}

/// The exact `q`-th root of a rational, if there is one.
fn exact_root(value: &BigRational, q: u32) -> SymbolicResult<BigRational> {
    if value.is_negative() && q % 2 == 0 {
        return Err(SymbolicError::unsupported("even root of a negative number"));
    }
    let magnitude = value.abs();
    let root_of = |n: &BigInt| -> SymbolicResult<BigInt> {
        let r = n.nth_root(q);
        if r.pow(q) == *n {
            Ok(r)
        } else {
            Err(SymbolicError::unsupported(format!("irrational root of {value}")))
        }
    };
    let root = BigRational::new(root_of(magnitude.numer())?, root_of(magnitude.denom())?);
    Ok(if value.is_negative() { -root } else { root })
}

impl Expr {
    /// Evaluate to a rational function, replacing bound symbols by their values.
    pub fn evaluate(&self, bindings: &Bindings) -> SymbolicResult<RationalFunction> {
        match self {
            Expr::Number(value) => Ok(RationalFunction::constant(value.clone())),
            Expr::Symbol(name) => Ok(bindings
                .get(name)
                .cloned()
                .unwrap_or_else(|| RationalFunction::symbol(name))),
            Expr::Neg(inner) => Ok(inner.evaluate(bindings)?.neg()),
            Expr::Add(a, b) => a.evaluate(bindings)?.add(&b.evaluate(bindings)?),
            Expr::Sub(a, b) => a.evaluate(bindings)?.sub(&b.evaluate(bindings)?),
            Expr::Mul(a, b) => a.evaluate(bindings)?.mul(&b.evaluate(bindings)?),
            Expr::Div(a, b) => a.evaluate(bindings)?.div(&b.evaluate(bindings)?),
            Expr::Pow(base, exp) => base.evaluate(bindings)?.pow(&exp.evaluate(bindings)?),
            Expr::Call(Func::Sqrt, arg) => {
                let half = RationalFunction::constant(BigRational::new(
                    BigInt::one(),
                    BigInt::from(2),
                ));
                arg.evaluate(bindings)?.pow(&half)
            }
            Expr::Call(Func::Abs, arg) => arg.evaluate(bindings)?.abs(),
        }
    }
}
