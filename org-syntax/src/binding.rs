//! The mutable binding-power table.
//!
//! One map from exact lexeme to binding entry. The parser consults it for
//! every identifier and mutates it when a binding statement defines a new
//! operator, so entries registered early in a parse govern tokens later in
//! the same parse.

use hashbrown::HashMap;
use tracing::debug;

/// Binding power assigned to identifiers absent from the table when they
/// appear in infix position.
pub const DEFAULT_BP: u32 = 100;

/// Binding power of prefix operators lacking an explicit declaration.
pub const DEFAULT_PREFIX_BP: u32 = 900;

/// Binding powers and role flags for one lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Left binding power: when the main loop consumes the operator.
    pub lbp: u32,
    /// Right binding power: how far the right operand extends.
    /// `rbp == lbp` is left-associative, `rbp == lbp - 1` right-associative.
    pub rbp: u32,
    /// Binding power in prefix position, for prefix-capable entries.
    pub prefix_bp: Option<u32>,
    /// Whether the lexeme may begin an expression as a prefix operator.
    pub is_prefix: bool,
    /// Whether the lexeme may extend an expression as an infix operator.
    pub is_infix: bool,
}

impl Binding {
    fn infix(lbp: u32, rbp: u32) -> Self {
        Self {
            lbp,
            rbp,
            prefix_bp: None,
            is_prefix: false,
            is_infix: true,
        }
    }

    fn prefix(bp: u32) -> Self {
        Self {
            lbp: 0,
            rbp: 0,
            prefix_bp: Some(bp),
            is_prefix: true,
            is_infix: false,
        }
    }

    fn nullary() -> Self {
        Self {
            lbp: 0,
            rbp: 0,
            prefix_bp: None,
            is_prefix: false,
            is_infix: false,
        }
    }
}

/// Lexeme-keyed table of binding entries, preloaded with the default
/// precedence rows and mutated by the parser during its own traversal.
#[derive(Debug, Clone)]
pub struct BindingTable {
    entries: HashMap<String, Binding>,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingTable {
    /// Table holding the default precedence rows.
    pub fn new() -> Self {
        let mut entries = HashMap::new();

        let mut infix = |names: &[&str], lbp: u32, rbp: u32| {
            for name in names {
                entries.insert((*name).into(), Binding::infix(lbp, rbp));
            }
        };

        // Right-associative binders.
        infix(&[":", "@:"], 80, 79);
        infix(&[","], 60, 60);
        infix(&["->", "-<", "-<>"], 50, 50);
        infix(&["=", "<>", "~=", "<", ">", "<=", ">="], 150, 150);
        infix(&["+"], 200, 200);
        infix(&["*", "/", "%", "&"], 300, 300);
        infix(&["|>", "o"], 400, 400);
        infix(&["**"], 500, 499);
        infix(&["?:", "??"], 125, 125);
        infix(&["."], 800, 800);

        for name in ["!", "~", "++", "--"] {
            entries.insert(name.into(), Binding::prefix(900));
        }

        // Dual-role entries: one lexeme, both positions.
        entries.insert(
            "-".into(),
            Binding {
                lbp: 200,
                rbp: 200,
                prefix_bp: Some(900),
                is_prefix: true,
                is_infix: true,
            },
        );
        entries.insert(
            "@".into(),
            Binding {
                lbp: 900,
                rbp: 900,
                prefix_bp: Some(900),
                is_prefix: true,
                is_infix: true,
            },
        );

        Self { entries }
    }

    /// Entry for `lexeme`, if registered.
    pub fn get(&self, lexeme: &str) -> Option<&Binding> {
        self.entries.get(lexeme)
    }

    /// Whether `lexeme` has any entry at all.
    pub fn contains(&self, lexeme: &str) -> bool {
        self.entries.contains_key(lexeme)
    }

    /// Register `lexeme` as an infix operator.
    pub fn register_infix(&mut self, lexeme: &str, lbp: u32, rbp: u32) {
        debug!(lexeme, lbp, rbp, "registered infix operator");
        self.entries.insert(lexeme.into(), Binding::infix(lbp, rbp));
    }

    /// Register `lexeme` as a prefix operator.
    pub fn register_prefix(&mut self, lexeme: &str, bp: u32) {
        debug!(lexeme, bp, "registered prefix operator");
        self.entries.insert(lexeme.into(), Binding::prefix(bp));
    }

    /// Register `lexeme` as a nullary value binding.
    pub fn register_value(&mut self, lexeme: &str) {
        debug!(lexeme, "registered value binding");
        self.entries.insert(lexeme.into(), Binding::nullary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(":", 80, 79; "colon is right associative")]
    #[test_case("@:", 80, 79; "at colon matches colon")]
    #[test_case(",", 60, 60; "comma")]
    #[test_case("->", 50, 50; "flow")]
    #[test_case("=", 150, 150; "comparison")]
    #[test_case("+", 200, 200; "additive")]
    #[test_case("*", 300, 300; "multiplicative")]
    #[test_case("|>", 400, 400; "pipe")]
    #[test_case("**", 500, 499; "power is right associative")]
    #[test_case("?:", 125, 125; "elvis")]
    #[test_case("??", 125, 125; "error fallback")]
    #[test_case(".", 800, 800; "lookup")]
    fn default_infix_rows(lexeme: &str, lbp: u32, rbp: u32) {
        let table = BindingTable::new();
        let entry = table.get(lexeme).unwrap();
        assert!(entry.is_infix);
        assert_eq!((entry.lbp, entry.rbp), (lbp, rbp));
    }

    #[test]
    fn prefix_only_rows() {
        let table = BindingTable::new();
        for op in ["!", "~", "++", "--"] {
            let entry = table.get(op).unwrap();
            assert!(entry.is_prefix, "{op}");
            assert!(!entry.is_infix, "{op}");
            assert_eq!(entry.prefix_bp, Some(900), "{op}");
        }
    }

    #[test]
    fn minus_and_at_are_dual_role() {
        let table = BindingTable::new();
        let minus = table.get("-").unwrap();
        assert!(minus.is_prefix && minus.is_infix);
        assert_eq!((minus.lbp, minus.prefix_bp), (200, Some(900)));

        let at = table.get("@").unwrap();
        assert!(at.is_prefix && at.is_infix);
        assert_eq!((at.lbp, at.prefix_bp), (900, Some(900)));
    }

    #[test]
    fn registration_overrides_defaults() {
        let mut table = BindingTable::new();
        table.register_infix("+", 42, 42);
        assert_eq!(table.get("+").unwrap().lbp, 42);
    }

    #[test]
    fn unknown_lexemes_are_absent() {
        let table = BindingTable::new();
        assert!(table.get("frobnicate").is_none());
        assert!(!table.contains("frobnicate"));
    }
}
