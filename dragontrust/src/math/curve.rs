// Short Weierstrass curves y² = x³ + ax + b over a prime field.
//
// Affine coordinates throughout; every inversion goes through Fermat's little
// theorem. None of this is constant-time.

use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::{DragonflyError, Result};
use crate::math::{byte_len, sqrt, sub_mod};

/// A curve point: the group identity or an affine pair reduced below `p`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Point {
    /// The point at infinity (identity of the group law).
    Infinity,
    /// Affine coordinates, both in `[0, p)`.
    Affine { x: BigUint, y: BigUint },
}

impl Point {
    /// Wrap raw coordinates as given.
    ///
    /// No reduction happens here, so `new(x + p, y)` and `new(x, y)` compare
    /// unequal; use [`Curve::point`] or [`Curve::same_point`] when inputs may
    /// be unreduced.
    pub fn new(x: BigUint, y: BigUint) -> Self {
        Point::Affine { x, y }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    pub fn x(&self) -> Option<&BigUint> {
        match self {
            Point::Infinity => None,
            Point::Affine { x, .. } => Some(x),
        }
    }

    pub fn y(&self) -> Option<&BigUint> {
        match self {
            Point::Infinity => None,
            Point::Affine { y, .. } => Some(y),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Point::Infinity => write!(f, "Infinity"),
            Point::Affine { x, y } => write!(f, "({x:x}, {y:x})"),
        }
    }
}

/// Domain parameters of a prime-order Weierstrass curve.
///
/// `q` is the order of the subgroup the protocol works in. Curves are
/// immutable once built and are freely cloned into sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Curve {
    name: String,
    p: BigUint,
    a: BigUint,
    b: BigUint,
    q: BigUint,
}

impl Curve {
    /// Build a curve, rejecting parameters the arithmetic below cannot handle.
    pub fn new(
        name: impl Into<String>,
        a: BigUint,
        b: BigUint,
        p: BigUint,
        q: BigUint,
    ) -> Result<Self> {
        if p <= BigUint::from(3u32) || !p.bit(0) {
            return Err(DragonflyError::InvalidCurve(
                "field prime must be odd and greater than 3".into(),
            ));
        }
        if q < BigUint::from(2u32) {
            return Err(DragonflyError::InvalidCurve(
                "subgroup order must be at least 2".into(),
            ));
        }

        let a = a % &p;
        let b = b % &p;

        // 4a³ + 27b² ≢ 0 (mod p)
        let discriminant = (BigUint::from(4u32) * a.modpow(&BigUint::from(3u32), &p)
            + BigUint::from(27u32) * (&b * &b))
            % &p;
        if discriminant.is_zero() {
            return Err(DragonflyError::InvalidCurve("curve is singular".into()));
        }

        Ok(Self {
            name: name.into(),
            p,
            a,
            b,
            q,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field prime.
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn a(&self) -> &BigUint {
        &self.a
    }

    pub fn b(&self) -> &BigUint {
        &self.b
    }

    /// The subgroup order.
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Fixed width of a field element on the wire and in hash inputs.
    pub fn field_len(&self) -> usize {
        byte_len(&self.p)
    }

    /// Fixed width of a scalar on the wire and in hash inputs.
    pub fn scalar_len(&self) -> usize {
        byte_len(&self.q)
    }

    /// `x³ + ax + b mod p`.
    pub fn curve_equation(&self, x: &BigUint) -> BigUint {
        let x = x % &self.p;
        let x3 = x.modpow(&BigUint::from(3u32), &self.p);
        (x3 + &self.a * &x + &self.b) % &self.p
    }

    /// Whether `point` satisfies the curve equation with both coordinates below `p`.
    pub fn is_on_curve(&self, point: &Point) -> bool {
        match point {
            Point::Infinity => true,
            Point::Affine { x, y } => {
                if x >= &self.p || y >= &self.p {
                    return false;
                }
                (y * y) % &self.p == self.curve_equation(x)
            }
        }
    }

    /// Build an affine point from coordinates reduced mod `p`, failing with
    /// `InvalidPoint` if it is off the curve.
    pub fn point(&self, x: BigUint, y: BigUint) -> Result<Point> {
        let point = self.reduce(&Point::new(x, y));
        if self.is_on_curve(&point) {
            Ok(point)
        } else {
            Err(DragonflyError::InvalidPoint)
        }
    }

    /// Both coordinates taken mod `p`.
    pub fn reduce(&self, point: &Point) -> Point {
        match point {
            Point::Infinity => Point::Infinity,
            Point::Affine { x, y } => Point::Affine {
                x: x % &self.p,
                y: y % &self.p,
            },
        }
    }

    /// Point equality after reducing both operands mod `p`.
    pub fn same_point(&self, lhs: &Point, rhs: &Point) -> bool {
        self.reduce(lhs) == self.reduce(rhs)
    }

    pub fn is_quadratic_residue(&self, v: &BigUint) -> bool {
        sqrt::is_quadratic_residue(v, &self.p)
    }

    /// `x^(p-2) mod p`.
    pub fn invert(&self, x: &BigUint) -> Result<BigUint> {
        let x = x % &self.p;
        if x.is_zero() {
            return Err(DragonflyError::DivisionByZero);
        }
        let exponent = &self.p - 2u32;
        Ok(x.modpow(&exponent, &self.p))
    }

    pub fn negate(&self, point: &Point) -> Point {
        match point {
            Point::Infinity => Point::Infinity,
            Point::Affine { x, y } => Point::Affine {
                x: x % &self.p,
                y: sub_mod(&BigUint::zero(), y, &self.p),
            },
        }
    }

    /// Group law. Both inputs must be on the curve; the result is re-checked
    /// before it is returned.
    pub fn add(&self, lhs: &Point, rhs: &Point) -> Result<Point> {
        if !self.is_on_curve(lhs) || !self.is_on_curve(rhs) {
            return Err(DragonflyError::InvalidPoint);
        }

        let result = match (lhs, rhs) {
            (Point::Infinity, _) => rhs.clone(),
            (_, Point::Infinity) => lhs.clone(),
            (Point::Affine { x: x1, y: y1 }, Point::Affine { x: x2, y: y2 }) => {
                if *rhs == self.negate(lhs) {
                    Point::Infinity
                } else {
                    let p = &self.p;
                    let slope = if lhs == rhs {
                        // (3x² + a) / 2y
                        let numerator = (BigUint::from(3u32) * x1 * x1 + &self.a) % p;
                        let denominator = (BigUint::from(2u32) * y1) % p;
                        numerator * self.invert(&denominator)? % p
                    } else {
                        // (y2 - y1) / (x2 - x1)
                        let numerator = sub_mod(y2, y1, p);
                        let denominator = sub_mod(x2, x1, p);
                        numerator * self.invert(&denominator)? % p
                    };

                    let x3 = sub_mod(&(&slope * &slope), &(x1 + x2), p);
                    let y3 = sub_mod(&(&slope * sub_mod(x1, &x3, p)), y1, p);
                    Point::Affine { x: x3, y: y3 }
                }
            }
        };

        if !self.is_on_curve(&result) {
            return Err(DragonflyError::InvalidPoint);
        }
        Ok(result)
    }

    pub fn double(&self, point: &Point) -> Result<Point> {
        self.add(point, point)
    }

    /// Left-to-right double-and-add over the bits of `k`.
    ///
    /// The accumulator starts at `point` for the top bit; each lower bit costs
    /// one doubling plus one addition when the bit is set. Zero and the point
    /// at infinity both map to infinity.
    pub fn scalar_mul(&self, k: &BigUint, point: &Point) -> Result<Point> {
        if !self.is_on_curve(point) {
            return Err(DragonflyError::InvalidPoint);
        }
        if k.is_zero() || point.is_infinity() {
            return Ok(Point::Infinity);
        }

        let mut acc = point.clone();
        for bit in (0..k.bits() - 1).rev() {
            acc = self.double(&acc)?;
            if k.bit(bit) {
                acc = self.add(&acc, point)?;
            }
        }

        if !self.is_on_curve(&acc) {
            return Err(DragonflyError::InvalidPoint);
        }
        Ok(acc)
    }

    /// Both square roots of the curve equation at `x`, if any.
    pub fn lift_x(&self, x: &BigUint) -> Result<(BigUint, BigUint)> {
        let rhs = self.curve_equation(x);
        let y = sqrt::sqrt_mod(&rhs, &self.p)?;
        let other = sub_mod(&BigUint::zero(), &y, &self.p);
        Ok((y, other))
    }
}
