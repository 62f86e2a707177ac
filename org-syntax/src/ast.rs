//! Abstract syntax tree and its canonical printed form.
//!
//! Every non-literal expression prints parenthesized; programs print as
//! statements joined by newlines. The printed form is the golden-test
//! surface of the parser.

use core::fmt;

use itertools::Itertools;

/// An expression. Every expression is also a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Integer literal digits, sign included when glued.
    Integer(String),
    /// Decimal literal digits.
    Decimal(String),
    /// Rational literal as numerator and denominator digit strings.
    Rational {
        /// Numerator digits.
        num: String,
        /// Denominator digits, optionally signed.
        den: String,
    },
    /// String literal with its decoded text.
    Str {
        /// Decoded text: no quotes, escapes resolved.
        text: String,
        /// Triple-quoted docstring.
        is_doc: bool,
        /// Raw (single-quoted) literal.
        is_raw: bool,
    },
    /// Boolean literal.
    Boolean(bool),
    /// Bare name.
    Name(String),
    /// Prefix operator application.
    Prefix {
        /// Operator lexeme.
        op: String,
        /// Operand.
        right: Box<Expr>,
    },
    /// Infix operator application.
    Infix {
        /// Left operand.
        left: Box<Expr>,
        /// Operator lexeme.
        op: String,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Juxtaposition: applying an expression to a single atom.
    Apply {
        /// The expression being applied.
        left: Box<Expr>,
        /// The argument atom.
        arg: Box<Expr>,
    },
    /// Member lookup `left.key`.
    Dot {
        /// Receiver.
        left: Box<Expr>,
        /// Key expression.
        key: Box<Expr>,
    },
    /// Binding `name : value`.
    Binding {
        /// Bound name (usually a `Name`).
        name: Box<Expr>,
        /// Bound value.
        value: Box<Expr>,
    },
    /// Resource definition `name @: value`.
    ResourceDef {
        /// Resource name.
        name: Box<Expr>,
        /// Resource body.
        value: Box<Expr>,
    },
    /// Resource instantiation `@ name`.
    ResourceInst {
        /// Resource reference.
        name: Box<Expr>,
    },
    /// Elvis `left ?: right`.
    Elvis {
        /// Tested operand.
        left: Box<Expr>,
        /// Fallback operand.
        right: Box<Expr>,
    },
    /// Comma pair `left , right`.
    Comma {
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Parenthesized group.
    Group(Box<Expr>),
    /// Table literal `[ ... ]`.
    TableLiteral(Vec<Expr>),
    /// Function literal with optional binding-power suffixes.
    FunctionLiteral {
        /// Leading (left) binding power digits, when adjacent.
        lbp: Option<String>,
        /// Body statements.
        body: Vec<Expr>,
        /// Trailing (right) binding power digits, when adjacent.
        rbp: Option<String>,
    },
    /// Recoverable parse failure.
    Error(String),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(digits) | Expr::Decimal(digits) => write!(f, "{digits}"),
            Expr::Rational { num, den } => write!(f, "{num}/{den}"),
            Expr::Str { text, is_doc, is_raw } => {
                let quote = match (*is_doc, *is_raw) {
                    (false, false) => "\"",
                    (true, false) => "\"\"\"",
                    (false, true) => "'",
                    (true, true) => "'''",
                };
                write!(f, "{quote}{text}{quote}")
            }
            Expr::Boolean(value) => write!(f, "{value}"),
            Expr::Name(name) => write!(f, "{name}"),
            Expr::Prefix { op, right } => write!(f, "({op} {right})"),
            Expr::Infix { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::Apply { left, arg } => write!(f, "({left} {arg})"),
            Expr::Dot { left, key } => write!(f, "({left}.{key})"),
            Expr::Binding { name, value } => write!(f, "({name} : {value})"),
            Expr::ResourceDef { name, value } => write!(f, "({name} @: {value})"),
            Expr::ResourceInst { name } => write!(f, "(@ {name})"),
            Expr::Elvis { left, right } => write!(f, "({left} ?: {right})"),
            Expr::Comma { left, right } => write!(f, "({left} , {right})"),
            Expr::Group(inner) => write!(f, "({inner})"),
            Expr::TableLiteral(elements) => {
                write!(f, "[{}]", elements.iter().join(" "))
            }
            Expr::FunctionLiteral { lbp, body, rbp } => {
                if let Some(power) = lbp {
                    write!(f, "{power}")?;
                }
                if body.is_empty() {
                    write!(f, "{{ }}")?;
                } else {
                    write!(f, "{{ {} }}", body.iter().join("; "))?;
                }
                if let Some(power) = rbp {
                    write!(f, "{power}")?;
                }
                Ok(())
            }
            Expr::Error(message) => write!(f, "<error: {message}>"),
        }
    }
}

/// A parsed program: an ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Top-level statements in source order.
    pub statements: Vec<Expr>,
}

impl Program {
    /// Wrap a statement list.
    pub fn new(statements: Vec<Expr>) -> Self {
        Self { statements }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statements.iter().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> Box<Expr> {
        Box::new(Expr::Name(n.into()))
    }

    fn int(digits: &str) -> Box<Expr> {
        Box::new(Expr::Integer(digits.into()))
    }

    #[test]
    fn infix_prints_parenthesized() {
        let expr = Expr::Infix {
            left: int("1"),
            op: "+".into(),
            right: int("2"),
        };
        assert_eq!(expr.to_string(), "(1 + 2)");
    }

    #[test]
    fn group_adds_its_own_parentheses() {
        let inner = Expr::Infix {
            left: int("5"),
            op: "+".into(),
            right: int("5"),
        };
        assert_eq!(Expr::Group(Box::new(inner)).to_string(), "((5 + 5))");
    }

    #[test]
    fn function_literal_with_binding_powers() {
        let body = Expr::Infix {
            left: name("left"),
            op: "**".into(),
            right: name("right"),
        };
        let lit = Expr::FunctionLiteral {
            lbp: Some("600".into()),
            body: vec![body],
            rbp: Some("601".into()),
        };
        assert_eq!(lit.to_string(), "600{ (left ** right) }601");
    }

    #[test]
    fn empty_function_literal() {
        let lit = Expr::FunctionLiteral {
            lbp: None,
            body: vec![],
            rbp: None,
        };
        assert_eq!(lit.to_string(), "{ }");
    }

    #[test]
    fn strings_keep_their_quoting() {
        let plain = Expr::Str {
            text: "hi".into(),
            is_doc: false,
            is_raw: false,
        };
        let rawdoc = Expr::Str {
            text: "hi".into(),
            is_doc: true,
            is_raw: true,
        };
        assert_eq!(plain.to_string(), "\"hi\"");
        assert_eq!(rawdoc.to_string(), "'''hi'''");
    }

    #[test]
    fn program_joins_statements_with_newlines() {
        let program = Program::new(vec![
            Expr::Binding {
                name: name("a"),
                value: int("1"),
            },
            Expr::Dot {
                left: name("a"),
                key: name("b"),
            },
        ]);
        assert_eq!(program.to_string(), "(a : 1)\n(a.b)");
    }
}
