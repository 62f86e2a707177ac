//! Pratt parser over a mutable binding-power table.
//!
//! The driver is conventional: a null-denotation handler begins an
//! expression, then infix handlers extend it while the next token's left
//! binding power exceeds the minimum. What is not conventional is that the
//! table those powers come from belongs to the parse itself: finishing a
//! binding whose value is a function literal registers the bound name as a
//! prefix or infix operator, visible to every later token of the same
//! parse.
//!
//! Errors never unwind. Each failure is recorded with its `line:column`
//! and becomes an `Error` node; parsing resumes at the next statement
//! boundary.

use crate::ast::{Expr, Program};
use crate::binding::{BindingTable, DEFAULT_BP, DEFAULT_PREFIX_BP};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Pratt parser with a two-token lookahead buffer.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
    peek: Token,
    bindings: BindingTable,
    errors: Vec<ParseError>,
    /// Depth of enclosing table literals; suspended inside groups and
    /// function bodies.
    table_depth: u32,
    /// Depth of enclosing function literal bodies. Names in a body
    /// resolve at call time, so unknown identifiers are accepted there.
    fn_depth: u32,
}

impl<'a> Parser<'a> {
    /// Parser over `src` with the default binding table.
    pub fn new(src: &'a str) -> Self {
        let mut lexer = Lexer::new(src);
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            cur,
            peek,
            bindings: BindingTable::new(),
            errors: Vec::new(),
            table_depth: 0,
            fn_depth: 0,
        }
    }

    /// Parse `src` to a program plus its recorded errors.
    pub fn parse(src: &'a str) -> (Program, Vec<ParseError>) {
        let mut parser = Self::new(src);
        let program = parser.parse_program();
        (program, parser.errors)
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// The live binding table.
    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    fn advance(&mut self) {
        self.cur = core::mem::replace(&mut self.peek, self.lexer.next_token());
    }

    fn record_error(&mut self, line: u32, column: u32, message: impl Into<String>) -> Expr {
        let message = message.into();
        self.errors.push(ParseError {
            line,
            column,
            message: message.clone(),
        });
        Expr::Error(message)
    }

    /// Consume statements until `EOF`, skipping stray terminators.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while self.cur.kind != TokenKind::Eof {
            if self.cur.kind == TokenKind::Semicolon {
                self.advance();
                continue;
            }
            statements.push(self.parse_expression(0));
            if self.cur.kind == TokenKind::Semicolon {
                self.advance();
            }
        }
        Program::new(statements)
    }

    /// Core Pratt loop: null denotation, then extend while the next
    /// token binds tighter than `min_bp`.
    pub fn parse_expression(&mut self, min_bp: u32) -> Expr {
        let mut left = self.parse_nud();
        loop {
            let lbp = self.left_bp(&self.cur);
            if lbp <= min_bp {
                break;
            }
            left = self.parse_led(left);
        }
        left
    }

    /// Left binding power of `token` in the current mode. Terminators,
    /// closing brackets, and `EOF` all answer zero and stop the loop.
    fn left_bp(&self, token: &Token) -> u32 {
        match token.kind {
            TokenKind::Colon | TokenKind::AtColon => 80,
            TokenKind::Comma => 60,
            TokenKind::Elvis => 125,
            TokenKind::Dot => 800,
            TokenKind::At => 900,
            TokenKind::Identifier => {
                // Inside a table literal, bare identifiers stop binding
                // as infix operators; `:` and `,` stay live.
                if self.table_depth > 0 {
                    return 0;
                }
                match self.bindings.get(&token.literal) {
                    Some(entry) if entry.is_infix => entry.lbp,
                    Some(_) => 0,
                    None => DEFAULT_BP,
                }
            }
            TokenKind::Integer
            | TokenKind::Decimal
            | TokenKind::Rational
            | TokenKind::Str
            | TokenKind::Docstring
            | TokenKind::RawString
            | TokenKind::RawDoc
            | TokenKind::Boolean => {
                // Juxtaposition applies the expression so far to a
                // literal atom, as in `10 |> + 5`.
                if self.table_depth > 0 {
                    0
                } else {
                    DEFAULT_BP
                }
            }
            _ => 0,
        }
    }

    fn parse_nud(&mut self) -> Expr {
        let token = self.cur.clone();
        match token.kind {
            TokenKind::Integer => {
                if self.peek.kind == TokenKind::LBrace && token.adjacent_to(&self.peek) {
                    self.advance();
                    self.parse_function_literal(Some(token.literal))
                } else {
                    self.advance();
                    Expr::Integer(token.literal)
                }
            }
            TokenKind::Decimal => {
                self.advance();
                Expr::Decimal(token.literal)
            }
            TokenKind::Rational => {
                self.advance();
                match token.literal.split_once('/') {
                    Some((num, den)) => Expr::Rational {
                        num: num.into(),
                        den: den.into(),
                    },
                    None => self.record_error(
                        token.line,
                        token.column,
                        "malformed rational literal",
                    ),
                }
            }
            TokenKind::Str | TokenKind::Docstring | TokenKind::RawString | TokenKind::RawDoc => {
                self.advance();
                Expr::Str {
                    text: token.literal,
                    is_doc: matches!(token.kind, TokenKind::Docstring | TokenKind::RawDoc),
                    is_raw: matches!(token.kind, TokenKind::RawString | TokenKind::RawDoc),
                }
            }
            TokenKind::Boolean => {
                self.advance();
                Expr::Boolean(token.literal == "true")
            }
            TokenKind::Keyword => {
                self.advance();
                Expr::Name(token.literal)
            }
            TokenKind::LParen => self.parse_group(),
            TokenKind::LBrace => self.parse_function_literal(None),
            TokenKind::LBracket => self.parse_table_literal(),
            TokenKind::At => {
                self.advance();
                let bp = self
                    .bindings
                    .get("@")
                    .and_then(|entry| entry.prefix_bp)
                    .unwrap_or(DEFAULT_PREFIX_BP);
                let name = self.parse_expression(bp);
                Expr::ResourceInst {
                    name: Box::new(name),
                }
            }
            TokenKind::Identifier => self.parse_name(token),
            TokenKind::Illegal => {
                self.advance();
                self.record_error(token.line, token.column, token.literal)
            }
            TokenKind::Eof => self.record_error(
                token.line,
                token.column,
                "unexpected end of input",
            ),
            TokenKind::Semicolon => {
                // Leave the terminator where it is; the statement loop
                // resynchronizes on it.
                self.record_error(token.line, token.column, "expected an expression")
            }
            _ => {
                self.advance();
                self.record_error(
                    token.line,
                    token.column,
                    format!("unexpected token '{}'", token.literal),
                )
            }
        }
    }

    /// An identifier beginning an expression: a registered prefix
    /// operator, a known name, or a forward declaration in front of a
    /// binding operator. Anything else is an error node.
    fn parse_name(&mut self, token: Token) -> Expr {
        let entry = self.bindings.get(&token.literal).copied();
        if let Some(entry) = entry {
            if entry.is_prefix {
                self.advance();
                let bp = entry.prefix_bp.unwrap_or(DEFAULT_PREFIX_BP);
                let right = self.parse_expression(bp);
                return Expr::Prefix {
                    op: token.literal,
                    right: Box::new(right),
                };
            }
            self.advance();
            return Expr::Name(token.literal);
        }
        // Table elements are data, and function bodies defer name
        // resolution to call time: accept bare names in both.
        if self.table_depth > 0 || self.fn_depth > 0 {
            self.advance();
            return Expr::Name(token.literal);
        }
        // Forward declaration: `name : ...` or `name @: ...`.
        if matches!(self.peek.kind, TokenKind::Colon | TokenKind::AtColon) {
            self.advance();
            return Expr::Name(token.literal);
        }
        self.advance();
        self.record_error(
            token.line,
            token.column,
            format!("unknown identifier '{}'", token.literal),
        )
    }

    fn parse_group(&mut self) -> Expr {
        self.advance();
        let saved = core::mem::take(&mut self.table_depth);
        let inner = self.parse_expression(0);
        self.table_depth = saved;
        if self.cur.kind == TokenKind::RParen {
            self.advance();
        } else {
            let (line, column) = (self.cur.line, self.cur.column);
            self.record_error(line, column, "expected ')'");
        }
        Expr::Group(Box::new(inner))
    }

    /// `{ statements }`, optionally wearing adjacent binding-power
    /// integers: a leading one consumed by the caller, a trailing one
    /// consumed here.
    fn parse_function_literal(&mut self, lbp: Option<String>) -> Expr {
        self.advance();
        let saved = core::mem::take(&mut self.table_depth);
        self.fn_depth += 1;
        let mut body = Vec::new();
        while !matches!(self.cur.kind, TokenKind::RBrace | TokenKind::Eof) {
            if self.cur.kind == TokenKind::Semicolon {
                self.advance();
                continue;
            }
            body.push(self.parse_expression(0));
            if self.cur.kind == TokenKind::Semicolon {
                self.advance();
            }
        }
        self.fn_depth -= 1;
        self.table_depth = saved;

        let mut rbp = None;
        if self.cur.kind == TokenKind::RBrace {
            let close = self.cur.clone();
            self.advance();
            // Trailing binding power must touch the closing brace.
            if self.cur.kind == TokenKind::Integer && close.adjacent_to(&self.cur) {
                rbp = Some(self.cur.literal.clone());
                self.advance();
            }
        } else {
            let (line, column) = (self.cur.line, self.cur.column);
            self.record_error(line, column, "expected '}' to close function literal");
        }
        Expr::FunctionLiteral { lbp, body, rbp }
    }

    /// `[ elements ]`: inside the brackets identifiers stop acting as
    /// infix operators, so `[a b c]` is three elements while `,` and `:`
    /// keep binding.
    fn parse_table_literal(&mut self) -> Expr {
        self.advance();
        self.table_depth += 1;
        let mut elements = Vec::new();
        while !matches!(self.cur.kind, TokenKind::RBracket | TokenKind::Eof) {
            if self.cur.kind == TokenKind::Semicolon {
                self.advance();
                continue;
            }
            elements.push(self.parse_expression(0));
        }
        self.table_depth -= 1;
        if self.cur.kind == TokenKind::RBracket {
            self.advance();
        } else {
            let (line, column) = (self.cur.line, self.cur.column);
            self.record_error(line, column, "expected ']' to close table literal");
        }
        Expr::TableLiteral(elements)
    }

    fn parse_led(&mut self, left: Expr) -> Expr {
        let token = self.cur.clone();
        match token.kind {
            TokenKind::Colon => {
                self.advance();
                let value = self.parse_expression(79);
                self.register_from_binding(&left, &value);
                Expr::Binding {
                    name: Box::new(left),
                    value: Box::new(value),
                }
            }
            TokenKind::AtColon => {
                self.advance();
                let value = self.parse_expression(79);
                if let Expr::Name(name) = &left {
                    self.bindings.register_value(name);
                }
                Expr::ResourceDef {
                    name: Box::new(left),
                    value: Box::new(value),
                }
            }
            TokenKind::Dot => {
                self.advance();
                let key = self.parse_expression(800);
                Expr::Dot {
                    left: Box::new(left),
                    key: Box::new(key),
                }
            }
            TokenKind::Comma => {
                self.advance();
                let right = self.parse_expression(60);
                Expr::Comma {
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            TokenKind::Elvis => {
                self.advance();
                let right = self.parse_expression(125);
                Expr::Elvis {
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            TokenKind::At => {
                self.advance();
                let right = self.parse_expression(900);
                Expr::Infix {
                    left: Box::new(left),
                    op: "@".into(),
                    right: Box::new(right),
                }
            }
            TokenKind::Identifier if token.literal == "|>" || token.literal == "o" => {
                self.advance();
                let right = self.parse_atom();
                Expr::Infix {
                    left: Box::new(left),
                    op: token.literal,
                    right: Box::new(right),
                }
            }
            TokenKind::Identifier => {
                let rbp = self
                    .bindings
                    .get(&token.literal)
                    .filter(|entry| entry.is_infix)
                    .map(|entry| entry.rbp)
                    .unwrap_or(DEFAULT_BP);
                self.advance();
                let right = self.parse_expression(rbp);
                Expr::Infix {
                    left: Box::new(left),
                    op: token.literal,
                    right: Box::new(right),
                }
            }
            _ => {
                // Literal in operand position: application of one atom.
                let arg = self.parse_nud();
                Expr::Apply {
                    left: Box::new(left),
                    arg: Box::new(arg),
                }
            }
        }
    }

    /// Exactly one atom: a literal, a balanced group, a function literal,
    /// or a bare identifier. The right operand of `|>` and `o` is an atom,
    /// not a full expression.
    fn parse_atom(&mut self) -> Expr {
        let token = self.cur.clone();
        match token.kind {
            TokenKind::Integer => {
                self.advance();
                Expr::Integer(token.literal)
            }
            TokenKind::Decimal => {
                self.advance();
                Expr::Decimal(token.literal)
            }
            TokenKind::Rational => {
                self.advance();
                match token.literal.split_once('/') {
                    Some((num, den)) => Expr::Rational {
                        num: num.into(),
                        den: den.into(),
                    },
                    None => self.record_error(
                        token.line,
                        token.column,
                        "malformed rational literal",
                    ),
                }
            }
            TokenKind::Str | TokenKind::Docstring | TokenKind::RawString | TokenKind::RawDoc => {
                self.advance();
                Expr::Str {
                    text: token.literal,
                    is_doc: matches!(token.kind, TokenKind::Docstring | TokenKind::RawDoc),
                    is_raw: matches!(token.kind, TokenKind::RawString | TokenKind::RawDoc),
                }
            }
            TokenKind::Boolean => {
                self.advance();
                Expr::Boolean(token.literal == "true")
            }
            TokenKind::LParen => self.parse_group(),
            TokenKind::LBrace => self.parse_function_literal(None),
            TokenKind::Identifier | TokenKind::Keyword => {
                self.advance();
                Expr::Name(token.literal)
            }
            _ => {
                if token.kind != TokenKind::Eof {
                    self.advance();
                }
                self.record_error(token.line, token.column, "expected an atom")
            }
        }
    }

    /// Operator self-registration: when a binding's value is a function
    /// literal and its name is plain, inspect the body for free `left` /
    /// `right` references and install the matching entry.
    fn register_from_binding(&mut self, left: &Expr, value: &Expr) {
        let Expr::Name(name) = left else {
            return;
        };
        let Expr::FunctionLiteral { lbp, body, rbp } = value else {
            self.bindings.register_value(name);
            return;
        };

        let uses_left = body.iter().any(|stmt| refs_name(stmt, "left"));
        let uses_right = body.iter().any(|stmt| refs_name(stmt, "right"));

        let declared_lbp = lbp.as_deref().and_then(parse_power);
        let declared_rbp = rbp.as_deref().and_then(parse_power);

        if uses_left {
            let lbp = declared_lbp.unwrap_or(DEFAULT_BP);
            let rbp = declared_rbp.unwrap_or(lbp);
            self.bindings.register_infix(name, lbp, rbp);
        } else if uses_right {
            self.bindings.register_prefix(name, declared_lbp.unwrap_or(DEFAULT_BP));
        } else {
            self.bindings.register_value(name);
        }
    }
}

fn parse_power(digits: &str) -> Option<u32> {
    digits.parse().ok()
}

/// Whether `expr` contains a free reference to `name`. Nested function
/// literals bind their own `left`/`right`, so the walk does not descend
/// into them.
fn refs_name(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Name(n) => n == name,
        Expr::FunctionLiteral { .. } => false,
        Expr::Prefix { right, .. } => refs_name(right, name),
        Expr::Infix { left, right, .. } => refs_name(left, name) || refs_name(right, name),
        Expr::Apply { left, arg } => refs_name(left, name) || refs_name(arg, name),
        Expr::Dot { left, key } => refs_name(left, name) || refs_name(key, name),
        Expr::Binding { name: n, value } | Expr::ResourceDef { name: n, value } => {
            refs_name(n, name) || refs_name(value, name)
        }
        Expr::ResourceInst { name: n } => refs_name(n, name),
        Expr::Elvis { left, right } | Expr::Comma { left, right } => {
            refs_name(left, name) || refs_name(right, name)
        }
        Expr::Group(inner) => refs_name(inner, name),
        Expr::TableLiteral(elements) => elements.iter().any(|e| refs_name(e, name)),
        Expr::Integer(_)
        | Expr::Decimal(_)
        | Expr::Rational { .. }
        | Expr::Str { .. }
        | Expr::Boolean(_)
        | Expr::Error(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn printed(src: &str) -> String {
        let (program, _) = Parser::parse(src);
        program.to_string()
    }

    fn errors(src: &str) -> Vec<ParseError> {
        Parser::parse(src).1
    }

    #[test_case("5 + 5 * 2;", "(5 + (5 * 2))"; "mul binds tighter than add")]
    #[test_case("(5 + 5) * 2;", "(((5 + 5)) * 2)"; "group forces order")]
    #[test_case(
        "a:1; b:2; a.b;",
        "(a : 1)\n(b : 2)\n(a.b)";
        "bindings then lookup"
    )]
    #[test_case(
        "a:1; b:2; c:3; a : b : c;",
        "(a : 1)\n(b : 2)\n(c : 3)\n(a : (b : c))";
        "colon is right associative"
    )]
    #[test_case(
        "pow_op : 600{ left ** right }601; res : 2 pow_op 3 * 2;",
        "(pow_op : 600{ (left ** right) }601)\n(res : ((2 pow_op 3) * 2))";
        "registered operator binds tighter than mul"
    )]
    #[test_case("[1, 2];", "[(1 , 2)]"; "comma stays infix inside brackets")]
    fn golden_scenarios(src: &str, expected: &str) {
        assert_eq!(printed(src), expected);
    }

    #[test]
    fn registered_infix_defaults_to_left_associative_100() {
        let src = "add : { left + right }; r : 1 add 2 add 3;";
        assert_eq!(
            printed(src),
            "(add : { (left + right) })\n(r : ((1 add 2) add 3))"
        );
    }

    #[test]
    fn registered_prefix_from_right_only_body() {
        let src = "sq : { right * right }; r : sq 5;";
        assert_eq!(printed(src), "(sq : { (right * right) })\n(r : (sq 5))");
    }

    #[test]
    fn nullary_binding_registers_a_plain_name() {
        let src = "v : { 1 + 2 }; v;";
        assert_eq!(printed(src), "(v : { (1 + 2) })\nv");
    }

    #[test]
    fn registration_with_explicit_powers_is_left_associative() {
        let src = "pw : 600{ left ** right }601; r : 2 pw 3 pw 2;";
        assert_eq!(
            printed(src),
            "(pw : 600{ (left ** right) }601)\n(r : ((2 pw 3) pw 2))"
        );
    }

    #[test]
    fn nested_function_literals_do_not_leak_left_right() {
        // The inner literal uses `right`; the outer body does not.
        let src = "f : { { right } }; f;";
        assert_eq!(printed(src), "(f : { { right } })\nf");
        let (_, errs) = Parser::parse(src);
        assert!(errs.is_empty(), "{errs:?}");
    }

    #[test]
    fn spaced_integer_is_not_a_binding_power() {
        assert_eq!(printed("700 { };"), "700\n{ }");
    }

    #[test]
    fn adjacent_suffixes_require_touching_columns() {
        // Spaced, the trailing integer is not a binding power; it applies
        // to the literal like any other juxtaposed atom.
        assert_eq!(printed("700{ x } 800;"), "(700{ x } 800)");
        assert_eq!(printed("700{ x }800;"), "700{ x }800");
    }

    #[test]
    fn power_operator_is_right_associative() {
        assert_eq!(printed("a:1;b:2;c:3; a ** b ** c;").lines().last(), Some("(a ** (b ** c))"));
    }

    #[test]
    fn pipe_takes_a_single_atom() {
        assert_eq!(printed("10 |> + 5;"), "((10 |> +) 5)");
    }

    #[test]
    fn compose_takes_a_single_atom() {
        assert_eq!(printed("f:1;g:2; f o g;").lines().last(), Some("(f o g)"));
    }

    #[test]
    fn table_mode_disables_identifier_infix() {
        assert_eq!(printed("[a b c];"), "[a b c]");
    }

    #[test]
    fn table_mode_is_suspended_inside_groups() {
        assert_eq!(printed("[(1 + 2) 3];"), "[((1 + 2)) 3]");
    }

    #[test]
    fn key_value_pairs_inside_tables() {
        assert_eq!(printed("[x : 1 y : 2];"), "[(x : 1) (y : 2)]");
    }

    #[test]
    fn resource_definition_and_instantiation() {
        let src = "db @: { 1 }; @db;";
        assert_eq!(printed(src), "(db @: { 1 })\n(@ db)");
    }

    #[test]
    fn prefix_operators_apply_at_high_power() {
        assert_eq!(printed("x:1; ! x;").lines().last(), Some("(! x)"));
        assert_eq!(printed("x:1; - x + 2;").lines().last(), Some("((- x) + 2)"));
    }

    #[test]
    fn elvis_and_error_fallback() {
        assert_eq!(printed("x:1;y:2; x ?: y;").lines().last(), Some("(x ?: y)"));
        assert_eq!(printed("x:1;y:2; x ?? y;").lines().last(), Some("(x ?? y)"));
    }

    #[test]
    fn unknown_identifier_yields_error_node() {
        let errs = errors("mystery;");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("unknown identifier"));
        assert_eq!((errs[0].line, errs[0].column), (1, 1));
    }

    #[test]
    fn missing_rparen_is_recorded_not_thrown() {
        let errs = errors("(1 + 2;");
        assert!(errs.iter().any(|e| e.message.contains("expected ')'")));
    }

    #[test]
    fn missing_rbrace_is_recorded() {
        let errs = errors("{ 1 + 2;");
        assert!(errs.iter().any(|e| e.message.contains("close function literal")));
    }

    #[test]
    fn illegal_token_surfaces_as_error_node() {
        let (program, errs) = Parser::parse("\"never;");
        assert!(matches!(program.statements[0], Expr::Error(_)));
        assert!(!errs.is_empty());
    }

    #[test]
    fn parser_always_reaches_eof() {
        // A pathological soup must not loop or panic.
        let (_, errs) = Parser::parse("); ] } : , . ?: @: 1/2 )");
        assert!(!errs.is_empty());
    }

    #[test]
    fn registration_is_visible_to_later_statements_only_after_binding() {
        let errs = errors("r : 1 add 2; add : { left + right };");
        // `add` parses as infix via the unknown-identifier default even
        // before registration; no errors either way.
        assert!(errs.is_empty(), "{errs:?}");
    }

    #[test]
    fn stray_semicolons_are_skipped() {
        assert_eq!(printed(";;1;;2;;"), "1\n2");
    }

    #[test]
    fn unspaced_operators_parse_like_spaced_ones() {
        assert_eq!(printed("5+5*2;"), "(5 + (5 * 2))");
        assert_eq!(printed("x:1; !x;").lines().last(), Some("(! x)"));
        assert_eq!(printed("a:1;b:2; a**b;").lines().last(), Some("(a ** b)"));
    }

    #[test]
    fn recovery_resumes_at_the_statement_boundary() {
        let (program, errs) = Parser::parse("1 + ; 2;");
        assert_eq!(program.statements.len(), 2);
        assert_eq!(program.statements[1].to_string(), "2");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn registration_updates_the_live_table() {
        let mut parser = Parser::new(
            "pow_op : 600{ left ** right }601; sq : { right * right }; a : 1;",
        );
        let _ = parser.parse_program();

        let pow = parser.bindings().get("pow_op").unwrap();
        assert!(pow.is_infix && !pow.is_prefix);
        assert_eq!((pow.lbp, pow.rbp), (600, 601));

        let sq = parser.bindings().get("sq").unwrap();
        assert!(sq.is_prefix && !sq.is_infix);
        assert_eq!(sq.prefix_bp, Some(100));

        let a = parser.bindings().get("a").unwrap();
        assert!(!a.is_prefix && !a.is_infix);
    }

    #[test]
    fn redefining_a_default_operator_takes_effect() {
        // `+` re-registered at a power below `*` flips the usual nesting.
        let src = "+ : 350{ left - right }350; r : 1 + 2 * 3;";
        let out = printed(src);
        assert!(out.ends_with("(r : ((1 + 2) * 3))"), "{out}");
    }

    #[test]
    fn docstring_literal_parses_as_doc_string() {
        let (program, errs) = Parser::parse("\"\"\"\n  text\n  \"\"\";");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(
            program.statements[0],
            Expr::Str {
                text: "text".into(),
                is_doc: true,
                is_raw: false,
            }
        );
    }
}
