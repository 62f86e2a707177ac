//! Promotion-aware arithmetic and comparison dispatch.
//!
//! Binary operations promote both operands to the smallest common category
//! of the `integer < rational < decimal` lattice, with an overflow-checked
//! native fast path when both operands are inline integers. Any operand
//! that is `ERROR` or non-numeric yields `ERROR`; nothing here panics.

use core::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::arena::Arena;
use crate::heap::{self, HeapKind};
use crate::word::Value;

/// Numeric category on the promotion lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumCat {
    /// Inline or arbitrary-precision integer.
    Int,
    /// Canonicalized rational.
    Rational,
    /// Rational with a display scale.
    Decimal,
}

/// Binary operation selector for the shared dispatch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Numeric category of `value`, if it is numeric at all.
pub fn category(arena: &Arena, value: Value) -> Option<NumCat> {
    if value.is_small_int() {
        return Some(NumCat::Int);
    }
    match value.as_addr().map(|addr| heap::kind_of(arena, addr))? {
        HeapKind::BigInt => Some(NumCat::Int),
        HeapKind::Rational => Some(NumCat::Rational),
        HeapKind::Decimal => Some(NumCat::Decimal),
        _ => None,
    }
}

/// Whether `value` is numerically zero.
pub fn is_zero(arena: &Arena, value: Value) -> bool {
    if let Some(small) = value.as_small_int() {
        return small == 0;
    }
    match value.as_addr().map(|addr| (heap::kind_of(arena, addr), addr)) {
        Some((HeapKind::BigInt, addr)) => heap::read_bigint(arena, addr).is_zero(),
        Some((HeapKind::Rational, addr)) => {
            heap::read_rational(arena, addr).numer().is_zero()
        }
        Some((HeapKind::Decimal, addr)) => {
            heap::read_decimal(arena, addr).0.numer().is_zero()
        }
        _ => false,
    }
}

fn lift_rational(arena: &Arena, value: Value) -> Option<BigRational> {
    if let Some(small) = value.as_small_int() {
        return Some(BigRational::from_integer(BigInt::from(small)));
    }
    let addr = value.as_addr()?;
    match heap::kind_of(arena, addr) {
        HeapKind::BigInt => Some(BigRational::from_integer(heap::read_bigint(
            arena, addr,
        ))),
        HeapKind::Rational => Some(heap::read_rational(arena, addr)),
        HeapKind::Decimal => Some(heap::read_decimal(arena, addr).0),
        _ => None,
    }
}

fn scale_of(arena: &Arena, value: Value) -> i32 {
    value
        .as_addr()
        .filter(|addr| heap::kind_of(arena, *addr) == HeapKind::Decimal)
        .map(|addr| heap::read_decimal(arena, addr).1)
        .unwrap_or(0)
}

/// `a + b`.
pub fn add(arena: &mut Arena, a: Value, b: Value) -> Value {
    binary(arena, BinOp::Add, a, b)
}

/// `a - b`.
pub fn sub(arena: &mut Arena, a: Value, b: Value) -> Value {
    binary(arena, BinOp::Sub, a, b)
}

/// `a * b`.
pub fn mul(arena: &mut Arena, a: Value, b: Value) -> Value {
    binary(arena, BinOp::Mul, a, b)
}

/// `a / b`. An inexact integer quotient becomes a canonical rational.
pub fn div(arena: &mut Arena, a: Value, b: Value) -> Value {
    binary(arena, BinOp::Div, a, b)
}

/// Truncated remainder; the sign follows the dividend.
pub fn rem(arena: &mut Arena, a: Value, b: Value) -> Value {
    binary(arena, BinOp::Rem, a, b)
}

fn binary(arena: &mut Arena, op: BinOp, a: Value, b: Value) -> Value {
    if a.is_error() || b.is_error() {
        return Value::ERROR;
    }
    let (Some(ca), Some(cb)) = (category(arena, a), category(arena, b)) else {
        return Value::ERROR;
    };
    if matches!(op, BinOp::Div | BinOp::Rem) && is_zero(arena, b) {
        return Value::ERROR;
    }

    if let (Some(x), Some(y)) = (a.as_small_int(), b.as_small_int()) {
        if let Some(result) = small_fast_path(arena, op, x, y) {
            return result;
        }
        // Overflowed the native width; fall through to the big path.
    }

    match ca.max(cb) {
        NumCat::Int => int_slow_path(arena, op, a, b),
        NumCat::Rational => {
            let (Some(ra), Some(rb)) =
                (lift_rational(arena, a), lift_rational(arena, b))
            else {
                return Value::ERROR;
            };
            heap::alloc_rational(arena, &rational_op(op, &ra, &rb))
        }
        NumCat::Decimal => {
            let (Some(ra), Some(rb)) =
                (lift_rational(arena, a), lift_rational(arena, b))
            else {
                return Value::ERROR;
            };
            let (sa, sb) = (scale_of(arena, a), scale_of(arena, b));
            let scale = match op {
                BinOp::Add | BinOp::Sub | BinOp::Rem => sa.max(sb),
                BinOp::Mul => sa.saturating_add(sb),
                BinOp::Div => {
                    if sa == 0 && sb == 0 {
                        1
                    } else {
                        sa.max(sb)
                    }
                }
            };
            heap::alloc_decimal(arena, &rational_op(op, &ra, &rb), scale)
        }
    }
}

fn small_fast_path(arena: &mut Arena, op: BinOp, x: i64, y: i64) -> Option<Value> {
    match op {
        BinOp::Add => x.checked_add(y).map(|s| heap::from_i64(arena, s)),
        BinOp::Sub => x.checked_sub(y).map(|s| heap::from_i64(arena, s)),
        BinOp::Mul => x.checked_mul(y).map(|s| heap::from_i64(arena, s)),
        BinOp::Div => {
            if x.checked_rem(y)? == 0 {
                x.checked_div(y).map(|q| heap::from_i64(arena, q))
            } else {
                let ratio = BigRational::new(BigInt::from(x), BigInt::from(y));
                Some(heap::alloc_rational(arena, &ratio))
            }
        }
        BinOp::Rem => x.checked_rem(y).map(|r| heap::from_i64(arena, r)),
    }
}

fn int_slow_path(arena: &mut Arena, op: BinOp, a: Value, b: Value) -> Value {
    let (Some(na), Some(nb)) = (heap::lift_int(arena, a), heap::lift_int(arena, b))
    else {
        return Value::ERROR;
    };
    match op {
        BinOp::Add => heap::alloc_bigint(arena, &(na + nb)),
        BinOp::Sub => heap::alloc_bigint(arena, &(na - nb)),
        BinOp::Mul => heap::alloc_bigint(arena, &(na * nb)),
        BinOp::Div => {
            let (quot, remainder) = na.div_rem(&nb);
            if remainder.is_zero() {
                heap::alloc_bigint(arena, &quot)
            } else {
                heap::alloc_rational(arena, &BigRational::new(na, nb))
            }
        }
        BinOp::Rem => heap::alloc_bigint(arena, &(na % nb)),
    }
}

fn rational_op(op: BinOp, a: &BigRational, b: &BigRational) -> BigRational {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        // Truncated remainder extended to rationals.
        BinOp::Rem => a - (a / b).trunc() * b,
    }
}

/// `a ** b`. Only non-negative integer exponents are accepted.
pub fn pow(arena: &mut Arena, a: Value, b: Value) -> Value {
    if a.is_error() || b.is_error() {
        return Value::ERROR;
    }
    if category(arena, b) != Some(NumCat::Int) {
        return Value::ERROR;
    }
    let Some(exponent) = heap::lift_int(arena, b) else {
        return Value::ERROR;
    };
    if exponent.is_negative() {
        return Value::ERROR;
    }
    let Some(exp) = exponent.to_u32() else {
        // An exponent beyond u32 cannot yield a representable result.
        return Value::ERROR;
    };

    match category(arena, a) {
        Some(NumCat::Int) => {
            if let Some(x) = a.as_small_int() {
                if let Some(value) = x.checked_pow(exp) {
                    return heap::from_i64(arena, value);
                }
            }
            let Some(base) = heap::lift_int(arena, a) else {
                return Value::ERROR;
            };
            heap::alloc_bigint(arena, &num_traits::pow::pow(base, exp as usize))
        }
        Some(NumCat::Rational) => {
            let Some(base) = lift_rational(arena, a) else {
                return Value::ERROR;
            };
            heap::alloc_rational(arena, &num_traits::pow::pow(base, exp as usize))
        }
        Some(NumCat::Decimal) => {
            let Some(addr) = a.as_addr() else {
                return Value::ERROR;
            };
            let (base, base_scale) = heap::read_decimal(arena, addr);
            let Some(scale) = (base_scale as i64)
                .checked_mul(exp as i64)
                .and_then(|s| s.to_i32())
            else {
                return Value::ERROR;
            };
            heap::alloc_decimal(arena, &num_traits::pow::pow(base, exp as usize), scale)
        }
        None => Value::ERROR,
    }
}

/// Arithmetic negation.
pub fn neg(arena: &mut Arena, a: Value) -> Value {
    if a.is_error() {
        return Value::ERROR;
    }
    if let Some(x) = a.as_small_int() {
        if let Some(value) = x.checked_neg() {
            return heap::from_i64(arena, value);
        }
    }
    match category(arena, a) {
        Some(NumCat::Int) => match heap::lift_int(arena, a) {
            Some(n) => heap::alloc_bigint(arena, &-n),
            None => Value::ERROR,
        },
        Some(NumCat::Rational) => match lift_rational(arena, a) {
            Some(r) => heap::alloc_rational(arena, &-r),
            None => Value::ERROR,
        },
        Some(NumCat::Decimal) => match a.as_addr() {
            Some(addr) => {
                let (r, scale) = heap::read_decimal(arena, addr);
                heap::alloc_decimal(arena, &-r, scale)
            }
            None => Value::ERROR,
        },
        None => Value::ERROR,
    }
}

/// Universal numeric ordering: both operands promote to rationals.
pub fn compare(arena: &Arena, a: Value, b: Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_small_int(), b.as_small_int()) {
        return Some(x.cmp(&y));
    }
    let (ra, rb) = (lift_rational(arena, a)?, lift_rational(arena, b)?);
    Some(ra.cmp(&rb))
}

fn ordered(arena: &Arena, a: Value, b: Value, accept: fn(Ordering) -> bool) -> Value {
    if a.is_error() || b.is_error() {
        return Value::ERROR;
    }
    match compare(arena, a, b) {
        Some(ordering) => Value::from_bool(accept(ordering)),
        None => Value::ERROR,
    }
}

/// `a < b`.
pub fn lt(arena: &Arena, a: Value, b: Value) -> Value {
    ordered(arena, a, b, Ordering::is_lt)
}

/// `a <= b`.
pub fn le(arena: &Arena, a: Value, b: Value) -> Value {
    ordered(arena, a, b, Ordering::is_le)
}

/// `a > b`.
pub fn gt(arena: &Arena, a: Value, b: Value) -> Value {
    ordered(arena, a, b, Ordering::is_gt)
}

/// `a >= b`.
pub fn ge(arena: &Arena, a: Value, b: Value) -> Value {
    ordered(arena, a, b, Ordering::is_ge)
}

/// `a = b`: numeric equality, degrading to identity on non-numerics.
pub fn eq(arena: &Arena, a: Value, b: Value) -> Value {
    if a.is_error() || b.is_error() {
        return Value::ERROR;
    }
    match compare(arena, a, b) {
        Some(ordering) => Value::from_bool(ordering == Ordering::Equal),
        None => Value::from_bool(a == b),
    }
}

/// `a <> b`: negation of [`eq`].
pub fn ne(arena: &Arena, a: Value, b: Value) -> Value {
    match eq(arena, a, b) {
        Value::TRUE => Value::FALSE,
        Value::FALSE => Value::TRUE,
        other => other,
    }
}
