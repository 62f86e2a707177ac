//! Eager literal values.
//!
//! The parser keeps digit strings in the tree; this module turns literal
//! nodes into tagged values the moment something downstream wants them.
//! It also assembles the top-level table of a literal-only program: a
//! source file denotes the same construct as a `[ ... ]` table literal,
//! with positional elements for expression results and named bindings for
//! the identifiers introduced by `:`. Anything that needs evaluation
//! proper lands as `ERROR` until the evaluator exists.

use org_syntax::{Expr, Program};
use org_values::heap::{self, ObjFlags};
use org_values::{Arena, Table, Value};

/// Build the value of a literal node, or `None` for anything that needs
/// the evaluator.
pub fn literal_value(arena: &mut Arena, expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Integer(digits) => Some(heap::parse_int(arena, digits)),
        Expr::Decimal(digits) => Some(heap::parse_decimal(arena, digits)),
        Expr::Rational { num, den } => Some(heap::parse_rational(arena, num, den)),
        Expr::Boolean(value) => Some(Value::from_bool(*value)),
        Expr::Str { text, is_doc, is_raw } => {
            let mut flags = ObjFlags::empty();
            if *is_doc {
                flags |= ObjFlags::STR_DOC;
            }
            if *is_raw {
                flags |= ObjFlags::STR_RAW;
            }
            Some(heap::alloc_str(arena, text, flags))
        }
        Expr::Group(inner) => literal_value(arena, inner),
        _ => None,
    }
}

/// Assemble the top-level table of a program, eagerly filling in literal
/// results: positional slots for expression statements, string keys for
/// `name : literal` bindings. Non-literal statements land as `ERROR`.
pub fn program_table(arena: &mut Arena, program: &Program) -> Value {
    let Some(table) = Table::alloc(arena, program.statements.len() as u32) else {
        return Value::ERROR;
    };
    for statement in &program.statements {
        match statement {
            Expr::Binding { name, value } => {
                let value = literal_value(arena, value).unwrap_or(Value::ERROR);
                if let Expr::Name(name) = name.as_ref() {
                    let key = heap::alloc_str(arena, name, ObjFlags::empty());
                    table.set(arena, key, value);
                } else {
                    table.push(arena, value);
                }
            }
            other => {
                let value = literal_value(arena, other).unwrap_or(Value::ERROR);
                table.push(arena, value);
            }
        }
    }
    table.as_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use org_syntax::Parser;
    use org_values::fmt::display_value;

    fn table_of(src: &str) -> (Arena, Value) {
        let mut arena = Arena::new();
        let (program, errors) = Parser::parse(src);
        assert!(errors.is_empty(), "{errors:?}");
        let table = program_table(&mut arena, &program);
        (arena, table)
    }

    #[test]
    fn literal_statements_fill_positional_slots() {
        let (arena, table) = table_of("1; 2.5; 3/6; true;");
        assert_eq!(display_value(&arena, table), "[1 2.5 1/2 true]");
    }

    #[test]
    fn bindings_become_string_keys() {
        let (arena, table) = table_of("x : 42; \"hi\";");
        let t = Table::from_value(&arena, table).unwrap();
        assert_eq!(t.get_by_str(&arena, "x").as_small_int(), Some(42));
        assert_eq!(t.len(&arena), 2);
    }

    #[test]
    fn big_literals_survive_the_trip() {
        let (arena, table) = table_of("123456789012345678901234567890;");
        let t = Table::from_value(&arena, table).unwrap();
        let first = t.get(&arena, Value::from_small_int(0).unwrap());
        assert_eq!(
            display_value(&arena, first),
            "123456789012345678901234567890"
        );
    }

    #[test]
    fn unevaluable_statements_land_as_error() {
        let (arena, table) = table_of("a : 1; a.b;");
        assert!(display_value(&arena, table).contains("Error"));
    }

    #[test]
    fn string_flags_follow_the_quoting() {
        let mut arena = Arena::new();
        let raw = Expr::Str {
            text: "r".into(),
            is_doc: false,
            is_raw: true,
        };
        let v = literal_value(&mut arena, &raw).unwrap();
        let flags = heap::flags_of(&arena, v.as_addr().unwrap());
        assert!(flags.contains(ObjFlags::STR_RAW));
    }
}
