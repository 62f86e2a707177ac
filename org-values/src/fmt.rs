//! Canonical printed forms of values.
//!
//! Numbers print their canonical digit strings (no trailing `.` on
//! integers, `num/den` for rationals, stored scale for decimals), strings
//! print quoted, tables print bracketed with space-separated elements, and
//! the error value prints as `Error`.

use itertools::Itertools;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;

use crate::arena::Arena;
use crate::heap::{self, HeapKind};
use crate::table::Table;
use crate::word::Value;

/// Render `value` in its canonical printed form.
pub fn display_value(arena: &Arena, value: Value) -> String {
    if let Some(small) = value.as_small_int() {
        return small.to_string();
    }
    match value {
        Value::TRUE => return "true".into(),
        Value::FALSE => return "false".into(),
        Value::ERROR => return "Error".into(),
        Value::UNUSED => return "unused".into(),
        _ => {}
    }
    let Some(addr) = value.as_addr() else {
        return "Error".into();
    };
    match heap::kind_of(arena, addr) {
        HeapKind::BigInt => heap::read_bigint(arena, addr).to_string(),
        HeapKind::Rational => {
            let r = heap::read_rational(arena, addr);
            format!("{}/{}", r.numer(), r.denom())
        }
        HeapKind::Decimal => {
            let (r, scale) = heap::read_decimal(arena, addr);
            decimal_string(&r, scale)
        }
        HeapKind::Str => format!("\"{}\"", heap::read_str(arena, addr)),
        HeapKind::Table => match Table::from_value(arena, value) {
            Some(table) => display_table(arena, table),
            None => "Error".into(),
        },
        HeapKind::Closure => "<fn>".into(),
        HeapKind::Resource => "<resource>".into(),
        HeapKind::Error => format!("Error({})", heap::read_error(arena, addr)),
    }
}

/// Render a rational at a fixed display scale.
fn decimal_string(value: &BigRational, scale: i32) -> String {
    let scaled = value * BigRational::from_integer(heap::pow10(scale));
    let rounded: BigInt = scaled.round().to_integer();
    if scale <= 0 {
        return rounded.to_string();
    }

    let scale = scale as usize;
    let negative = rounded.is_negative();
    let mut digits = rounded.abs().to_string();
    if digits.len() <= scale {
        let pad = scale.saturating_sub(digits.len()).saturating_add(1);
        digits.insert_str(0, &"0".repeat(pad));
    }
    let split = digits.len().saturating_sub(scale);
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&digits[..split]);
    out.push('.');
    out.push_str(&digits[split..]);
    out
}

fn display_table(arena: &Arena, table: Table) -> String {
    let mut parts = Vec::new();
    // Positional elements first, in insertion order.
    for index in 0..table.next_index(arena) {
        let Some(key) = Value::from_small_int(index) else {
            break;
        };
        if table.has(arena, key) {
            parts.push(display_value(arena, table.get(arena, key)));
        }
    }
    // Remaining entries print as key-value pairs in slot order.
    for (key, value) in table.entries(arena) {
        let positional = key
            .as_small_int()
            .is_some_and(|i| i >= 0 && i < table.next_index(arena));
        if positional {
            continue;
        }
        parts.push(format!(
            "({} : {})",
            display_value(arena, key),
            display_value(arena, value)
        ));
    }
    format!("[{}]", parts.iter().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::ObjFlags;
    use crate::num;
    use test_case::test_case;

    #[test]
    fn integers_print_bare() {
        let mut arena = Arena::new();
        let v = heap::from_i64(&mut arena, -42);
        assert_eq!(display_value(&arena, v), "-42");
    }

    #[test]
    fn rationals_print_num_slash_den() {
        let mut arena = Arena::new();
        let a = heap::from_i64(&mut arena, 6);
        let b = heap::from_i64(&mut arena, 4);
        let q = num::div(&mut arena, a, b);
        assert_eq!(display_value(&arena, q), "3/2");
    }

    #[test_case("3.14", "3.14"; "two places")]
    #[test_case("-1.250", "-1.250"; "trailing zero kept")]
    #[test_case("0.5", "0.5"; "leading zero")]
    #[test_case("42", "42"; "scale zero prints bare")]
    fn decimals_print_at_stored_scale(input: &str, expected: &str) {
        let mut arena = Arena::new();
        let v = heap::parse_decimal(&mut arena, input);
        assert_eq!(display_value(&arena, v), expected);
    }

    #[test]
    fn decimal_arithmetic_keeps_scale_in_print() {
        let mut arena = Arena::new();
        let a = heap::parse_decimal(&mut arena, "1.20");
        let b = heap::parse_decimal(&mut arena, "3.4");
        let sum = num::add(&mut arena, a, b);
        assert_eq!(display_value(&arena, sum), "4.60");
    }

    #[test]
    fn strings_print_quoted() {
        let mut arena = Arena::new();
        let v = heap::alloc_str(&mut arena, "hi", ObjFlags::empty());
        assert_eq!(display_value(&arena, v), "\"hi\"");
    }

    #[test]
    fn booleans_and_error() {
        let arena = Arena::new();
        assert_eq!(display_value(&arena, Value::TRUE), "true");
        assert_eq!(display_value(&arena, Value::FALSE), "false");
        assert_eq!(display_value(&arena, Value::ERROR), "Error");
    }

    #[test]
    fn tables_print_positionals_then_pairs() {
        let mut arena = Arena::new();
        let t = Table::alloc(&mut arena, 0).unwrap();
        for i in 1..=3i64 {
            let v = heap::from_i64(&mut arena, i);
            t.push(&mut arena, v);
        }
        let key = heap::alloc_str(&mut arena, "name", ObjFlags::empty());
        let val = heap::from_i64(&mut arena, 9);
        t.set(&mut arena, key, val);
        assert_eq!(
            display_value(&arena, t.as_value()),
            "[1 2 3 (\"name\" : 9)]"
        );
    }
}
