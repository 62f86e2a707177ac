//! Heap object layouts.
//!
//! Every heap object starts with an 8-byte header: kind byte, flags byte,
//! two pad bytes, and the total object size as a little-endian `u32`. The
//! payload layouts below are private to this crate; callers go through the
//! typed constructors and readers.

use bitflags::bitflags;
use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

use crate::arena::{Addr, Arena};
use crate::word::Value;

/// Size of the common object header.
pub const HEADER_SIZE: u32 = 8;

/// Heap object kind, stored in the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HeapKind {
    /// Arbitrary-precision integer.
    BigInt = 0x00,
    /// Canonicalized rational number.
    Rational = 0x01,
    /// Rational number with a display scale.
    Decimal = 0x02,
    /// Immutable UTF-8 string.
    Str = 0x03,
    /// Hybrid hash/array table.
    Table = 0x04,
    /// Function closure. Built by the evaluator, not by this crate.
    Closure = 0x05,
    /// Resource instance. Built by the evaluator, not by this crate.
    Resource = 0x06,
    /// Error object carrying a message.
    Error = 0x07,
}

impl HeapKind {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0x00 => Self::BigInt,
            0x01 => Self::Rational,
            0x02 => Self::Decimal,
            0x03 => Self::Str,
            0x04 => Self::Table,
            0x05 => Self::Closure,
            0x06 => Self::Resource,
            _ => Self::Error,
        }
    }
}

bitflags! {
    /// Per-object flags, stored in the second header byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObjFlags: u8 {
        /// String came from a raw (non-escaping) literal.
        const STR_RAW = 0b0000_0001;
        /// String came from a docstring literal.
        const STR_DOC = 0b0000_0010;
    }
}

/// Kind byte of the object at `addr`.
pub fn kind_of(arena: &Arena, addr: Addr) -> HeapKind {
    HeapKind::from_u8(arena.read_u8(addr))
}

/// Flags byte of the object at `addr`.
pub fn flags_of(arena: &Arena, addr: Addr) -> ObjFlags {
    ObjFlags::from_bits_truncate(arena.read_u8(addr.offset(1)))
}

/// Allocate an object with the common header and a zeroed payload.
fn alloc_object(
    arena: &mut Arena,
    kind: HeapKind,
    flags: ObjFlags,
    payload_len: u32,
) -> Option<Addr> {
    let total = HEADER_SIZE.checked_add(payload_len)?;
    let addr = arena.alloc(total as usize, 8);
    if addr.is_null() {
        return None;
    }
    arena.write_u8(addr, kind as u8);
    arena.write_u8(addr.offset(1), flags.bits());
    arena.write_u32(addr.offset(4), total);
    Some(addr)
}

fn sign_to_u8(sign: Sign) -> u8 {
    match sign {
        Sign::Minus => 0,
        Sign::NoSign => 1,
        Sign::Plus => 2,
    }
}

fn sign_from_u8(raw: u8) -> Sign {
    match raw {
        0 => Sign::Minus,
        1 => Sign::NoSign,
        _ => Sign::Plus,
    }
}

/// Wrap an `i64`, inline when it fits the small-int range.
pub fn from_i64(arena: &mut Arena, value: i64) -> Value {
    Value::from_small_int(value)
        .unwrap_or_else(|| alloc_bigint(arena, &BigInt::from(value)))
}

/// Wrap a big integer, normalizing back to the inline form when it fits.
pub fn alloc_bigint(arena: &mut Arena, value: &BigInt) -> Value {
    if let Some(small) = value.to_i64().and_then(Value::from_small_int) {
        return small;
    }
    let (sign, mag) = value.to_bytes_le();
    let payload = 8u32.saturating_add(mag.len() as u32);
    let Some(addr) = alloc_object(arena, HeapKind::BigInt, ObjFlags::empty(), payload)
    else {
        return Value::ERROR;
    };
    arena.write_u8(addr.offset(8), sign_to_u8(sign));
    arena.write_u32(addr.offset(12), mag.len() as u32);
    arena.write_bytes(addr.offset(16), &mag);
    Value::from_addr(addr)
}

/// Read the big integer at `addr`.
pub fn read_bigint(arena: &Arena, addr: Addr) -> BigInt {
    let sign = sign_from_u8(arena.read_u8(addr.offset(8)));
    let len = arena.read_u32(addr.offset(12)) as usize;
    BigInt::from_bytes_le(sign, arena.bytes(addr.offset(16), len))
}

/// Lift either integer representation to a `BigInt`.
pub fn lift_int(arena: &Arena, value: Value) -> Option<BigInt> {
    if let Some(small) = value.as_small_int() {
        return Some(BigInt::from(small));
    }
    let addr = value.as_addr()?;
    (kind_of(arena, addr) == HeapKind::BigInt).then(|| read_bigint(arena, addr))
}

/// Wrap a canonical rational. Integral rationals collapse to integers.
pub fn alloc_rational(arena: &mut Arena, value: &BigRational) -> Value {
    if value.is_integer() {
        return alloc_bigint(arena, value.numer());
    }
    debug_assert!(is_canonical(value));
    let (num_sign, num_mag) = value.numer().to_bytes_le();
    let (_, den_mag) = value.denom().to_bytes_le();
    let payload = 12u32
        .saturating_add(num_mag.len() as u32)
        .saturating_add(den_mag.len() as u32);
    let Some(addr) = alloc_object(arena, HeapKind::Rational, ObjFlags::empty(), payload)
    else {
        return Value::ERROR;
    };
    arena.write_u8(addr.offset(8), sign_to_u8(num_sign));
    arena.write_u32(addr.offset(12), num_mag.len() as u32);
    arena.write_u32(addr.offset(16), den_mag.len() as u32);
    arena.write_bytes(addr.offset(20), &num_mag);
    arena.write_bytes(addr.offset(20).offset(num_mag.len() as u64), &den_mag);
    Value::from_addr(addr)
}

/// Read the rational at `addr`.
pub fn read_rational(arena: &Arena, addr: Addr) -> BigRational {
    let sign = sign_from_u8(arena.read_u8(addr.offset(8)));
    let num_len = arena.read_u32(addr.offset(12)) as usize;
    let den_len = arena.read_u32(addr.offset(16)) as usize;
    let num = BigInt::from_bytes_le(sign, arena.bytes(addr.offset(20), num_len));
    let den = BigInt::from_bytes_le(
        Sign::Plus,
        arena.bytes(addr.offset(20).offset(num_len as u64), den_len),
    );
    BigRational::new_raw(num, den)
}

/// Wrap a rational with an explicit display scale as a decimal.
pub fn alloc_decimal(arena: &mut Arena, value: &BigRational, scale: i32) -> Value {
    let (num_sign, num_mag) = value.numer().to_bytes_le();
    let (_, den_mag) = value.denom().to_bytes_le();
    let payload = 16u32
        .saturating_add(num_mag.len() as u32)
        .saturating_add(den_mag.len() as u32);
    let Some(addr) = alloc_object(arena, HeapKind::Decimal, ObjFlags::empty(), payload)
    else {
        return Value::ERROR;
    };
    arena.write_i32(addr.offset(8), scale);
    arena.write_u8(addr.offset(12), sign_to_u8(num_sign));
    arena.write_u32(addr.offset(16), num_mag.len() as u32);
    arena.write_u32(addr.offset(20), den_mag.len() as u32);
    arena.write_bytes(addr.offset(24), &num_mag);
    arena.write_bytes(addr.offset(24).offset(num_mag.len() as u64), &den_mag);
    Value::from_addr(addr)
}

/// Read the decimal at `addr` as its rational and display scale.
pub fn read_decimal(arena: &Arena, addr: Addr) -> (BigRational, i32) {
    let scale = arena.read_i32(addr.offset(8));
    let sign = sign_from_u8(arena.read_u8(addr.offset(12)));
    let num_len = arena.read_u32(addr.offset(16)) as usize;
    let den_len = arena.read_u32(addr.offset(20)) as usize;
    let num = BigInt::from_bytes_le(sign, arena.bytes(addr.offset(24), num_len));
    let den = BigInt::from_bytes_le(
        Sign::Plus,
        arena.bytes(addr.offset(24).offset(num_len as u64), den_len),
    );
    (BigRational::new_raw(num, den), scale)
}

/// Parse a decimal digit string (optional sign, digits around one `.`).
///
/// The scale is the count of fractional digits; the denominator is
/// `10^scale`.
pub fn parse_decimal(arena: &mut Arena, digits: &str) -> Value {
    let (sign, body) = match digits.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, digits.strip_prefix('+').unwrap_or(digits)),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    let mut all = String::with_capacity(int_part.len().saturating_add(frac_part.len()));
    all.push_str(int_part);
    all.push_str(frac_part);
    let Ok(mut num) = all.parse::<BigInt>() else {
        return Value::ERROR;
    };
    if sign < 0 {
        num = -num;
    }
    let scale = frac_part.len() as i32;
    let den = pow10(scale);
    let value = BigRational::new(num, den);
    alloc_decimal(arena, &value, scale)
}

/// `10^scale` as a big integer (`scale` clamped at zero).
pub fn pow10(scale: i32) -> BigInt {
    let exp = scale.max(0) as u32;
    num_traits::pow::pow(BigInt::from(10), exp as usize)
}

/// Parse an integer digit string (optional sign) of any length.
///
/// This is what makes integer literals beyond the inline range work: the
/// token keeps its digits and the value lands on the heap.
pub fn parse_int(arena: &mut Arena, digits: &str) -> Value {
    match digits.parse::<BigInt>() {
        Ok(value) => alloc_bigint(arena, &value),
        Err(_) => Value::ERROR,
    }
}

/// Parse a rational from numerator and denominator digit strings.
///
/// A zero denominator yields `ERROR`; the result is canonicalized and
/// collapses to an integer when the denominator divides the numerator.
pub fn parse_rational(arena: &mut Arena, num: &str, den: &str) -> Value {
    let (Ok(num), Ok(den)) = (num.parse::<BigInt>(), den.parse::<BigInt>()) else {
        return Value::ERROR;
    };
    if den.is_zero() {
        return Value::ERROR;
    }
    alloc_rational(arena, &BigRational::new(num, den))
}

/// Allocate an immutable string with a precomputed codepoint count.
pub fn alloc_str(arena: &mut Arena, text: &str, flags: ObjFlags) -> Value {
    // Leader-byte walk: continuation bytes (10xxxxxx) do not start a
    // codepoint.
    let codepoints = text.bytes().filter(|b| b & 0xC0 != 0x80).count() as u32;
    let payload = 8u32.saturating_add(text.len() as u32);
    let Some(addr) = alloc_object(arena, HeapKind::Str, flags, payload) else {
        return Value::ERROR;
    };
    arena.write_u32(addr.offset(8), text.len() as u32);
    arena.write_u32(addr.offset(12), codepoints);
    arena.write_bytes(addr.offset(16), text.as_bytes());
    Value::from_addr(addr)
}

/// Byte length of the string at `addr`.
pub fn str_byte_len(arena: &Arena, addr: Addr) -> u32 {
    arena.read_u32(addr.offset(8))
}

/// Codepoint length of the string at `addr`.
pub fn str_codepoint_len(arena: &Arena, addr: Addr) -> u32 {
    arena.read_u32(addr.offset(12))
}

/// Borrow the string at `addr`.
pub fn read_str(arena: &Arena, addr: Addr) -> &str {
    let len = str_byte_len(arena, addr) as usize;
    core::str::from_utf8(arena.bytes(addr.offset(16), len))
        .expect("heap strings hold valid UTF-8")
}

fn is_kind(arena: &Arena, value: Value, kind: HeapKind) -> bool {
    value
        .as_addr()
        .is_some_and(|addr| kind_of(arena, addr) == kind)
}

/// Whether `value` is a heap string.
pub fn is_str(arena: &Arena, value: Value) -> bool {
    is_kind(arena, value, HeapKind::Str)
}

/// Whether `value` is a heap table.
pub fn is_table(arena: &Arena, value: Value) -> bool {
    is_kind(arena, value, HeapKind::Table)
}

/// Whether `value` is a heap big integer.
pub fn is_bigint(arena: &Arena, value: Value) -> bool {
    is_kind(arena, value, HeapKind::BigInt)
}

/// Whether `value` is a heap rational.
pub fn is_rational(arena: &Arena, value: Value) -> bool {
    is_kind(arena, value, HeapKind::Rational)
}

/// Whether `value` is a heap decimal.
pub fn is_decimal(arena: &Arena, value: Value) -> bool {
    is_kind(arena, value, HeapKind::Decimal)
}

/// Allocate an error object carrying a message string.
pub fn alloc_error(arena: &mut Arena, message: &str) -> Value {
    let payload = 4u32.saturating_add(message.len() as u32);
    let Some(addr) = alloc_object(arena, HeapKind::Error, ObjFlags::empty(), payload)
    else {
        return Value::ERROR;
    };
    arena.write_u32(addr.offset(8), message.len() as u32);
    arena.write_bytes(addr.offset(12), message.as_bytes());
    Value::from_addr(addr)
}

/// Message of the error object at `addr`.
pub fn read_error(arena: &Arena, addr: Addr) -> &str {
    let len = arena.read_u32(addr.offset(8)) as usize;
    core::str::from_utf8(arena.bytes(addr.offset(12), len))
        .expect("error messages hold valid UTF-8")
}

#[cfg(debug_assertions)]
fn is_canonical(value: &BigRational) -> bool {
    use num_integer::Integer;
    use num_traits::{One, Signed, Zero};
    value.denom().is_positive()
        && (value.numer().is_zero() || value.numer().gcd(value.denom()).is_one())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{SMALL_INT_MAX, SMALL_INT_MIN};
    use test_case::test_case;

    #[test]
    fn bigint_normalizes_to_small_int() {
        let mut arena = Arena::new();
        let v = alloc_bigint(&mut arena, &BigInt::from(42));
        assert_eq!(v.as_small_int(), Some(42));
    }

    #[test]
    fn bigint_outside_small_range_goes_to_heap() {
        let mut arena = Arena::new();
        let big = BigInt::from(SMALL_INT_MAX) + 1;
        let v = alloc_bigint(&mut arena, &big);
        assert!(v.is_heap());
        let addr = v.as_addr().unwrap();
        assert_eq!(kind_of(&arena, addr), HeapKind::BigInt);
        assert_eq!(read_bigint(&arena, addr), big);
    }

    #[test]
    fn negative_bigint_round_trip() {
        let mut arena = Arena::new();
        let big = BigInt::from(SMALL_INT_MIN) - 12345;
        let v = alloc_bigint(&mut arena, &big);
        let addr = v.as_addr().unwrap();
        assert_eq!(read_bigint(&arena, addr), big);
    }

    #[test]
    fn rational_is_canonical_and_collapses_when_integral() {
        let mut arena = Arena::new();
        let half = BigRational::new(BigInt::from(2), BigInt::from(4));
        let v = alloc_rational(&mut arena, &half);
        let addr = v.as_addr().unwrap();
        let back = read_rational(&arena, addr);
        assert_eq!(back.numer(), &BigInt::from(1));
        assert_eq!(back.denom(), &BigInt::from(2));

        let two = BigRational::new(BigInt::from(4), BigInt::from(2));
        assert_eq!(alloc_rational(&mut arena, &two).as_small_int(), Some(2));
    }

    #[test]
    fn negative_denominator_is_normalized() {
        let mut arena = Arena::new();
        let v = alloc_rational(
            &mut arena,
            &BigRational::new(BigInt::from(1), BigInt::from(-3)),
        );
        let back = read_rational(&arena, v.as_addr().unwrap());
        assert_eq!(back.numer(), &BigInt::from(-1));
        assert_eq!(back.denom(), &BigInt::from(3));
    }

    #[test_case("3.14", 2; "two fraction digits")]
    #[test_case("0.5", 1; "one fraction digit")]
    #[test_case("42", 0; "no point")]
    #[test_case("-1.250", 3; "trailing zero kept in scale")]
    fn decimal_scale_follows_fraction_digits(digits: &str, scale: i32) {
        let mut arena = Arena::new();
        let v = parse_decimal(&mut arena, digits);
        let (_, stored) = read_decimal(&arena, v.as_addr().unwrap());
        assert_eq!(stored, scale);
    }

    #[test]
    fn string_counts_codepoints_not_bytes() {
        let mut arena = Arena::new();
        let v = alloc_str(&mut arena, "héllo", ObjFlags::empty());
        let addr = v.as_addr().unwrap();
        assert_eq!(str_byte_len(&arena, addr), 6);
        assert_eq!(str_codepoint_len(&arena, addr), 5);
        assert_eq!(read_str(&arena, addr), "héllo");
    }

    #[test]
    fn string_flags_round_trip() {
        let mut arena = Arena::new();
        let v = alloc_str(&mut arena, "raw", ObjFlags::STR_RAW);
        let addr = v.as_addr().unwrap();
        assert_eq!(flags_of(&arena, addr), ObjFlags::STR_RAW);
    }

    #[test]
    fn error_object_round_trip() {
        let mut arena = Arena::new();
        let v = alloc_error(&mut arena, "division by zero");
        let addr = v.as_addr().unwrap();
        assert_eq!(kind_of(&arena, addr), HeapKind::Error);
        assert_eq!(read_error(&arena, addr), "division by zero");
    }

    #[test]
    fn parse_int_handles_any_length() {
        let mut arena = Arena::new();
        assert_eq!(parse_int(&mut arena, "-42").as_small_int(), Some(-42));

        let huge = "123456789012345678901234567890";
        let v = parse_int(&mut arena, huge);
        assert!(is_bigint(&arena, v));
        assert_eq!(read_bigint(&arena, v.as_addr().unwrap()).to_string(), huge);
    }

    #[test_case("1", "2", false; "proper fraction stays rational")]
    #[test_case("4", "2", true; "exact quotient collapses")]
    #[test_case("1", "-2", false; "signed denominator normalizes")]
    fn parse_rational_canonicalizes(num: &str, den: &str, collapses: bool) {
        let mut arena = Arena::new();
        let v = parse_rational(&mut arena, num, den);
        assert_eq!(v.as_small_int().is_some(), collapses);
        if !collapses {
            assert!(is_rational(&arena, v));
        }
    }

    #[test]
    fn parse_rational_rejects_zero_denominator() {
        let mut arena = Arena::new();
        assert_eq!(parse_rational(&mut arena, "1", "0"), Value::ERROR);
    }

    #[test]
    fn kind_predicates_discriminate() {
        let mut arena = Arena::new();
        let s = alloc_str(&mut arena, "s", ObjFlags::empty());
        let d = parse_decimal(&mut arena, "1.5");
        assert!(is_str(&arena, s) && !is_decimal(&arena, s));
        assert!(is_decimal(&arena, d) && !is_rational(&arena, d));
        assert!(!is_table(&arena, Value::TRUE));
    }
}
