//! UTF-8 lexical scanner.
//!
//! One pass over the source, dispatching on the next codepoint after
//! skipping whitespace and comments. The scanner remembers the kind of the
//! previously emitted token to decide whether a `+`/`-` before a digit
//! glues onto the number literal or stands alone as an identifier.

use crate::token::{Token, TokenKind};

/// ASCII symbols that form operator-class identifiers. Runs of these
/// never merge with adjacent word characters or digits.
const OPERATOR_CHARS: &str = "+-*/%?!&|^~<>=$";

/// Bytes that `:` fuses with into a compound-assignment identifier.
const COMPOUND_ASSIGN: &str = "+-*/%&^|~";

/// Demand-driven lexer over a UTF-8 source buffer.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    prev: Option<TokenKind>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Lexer positioned at the start of `src`.
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            prev: None,
            finished: false,
        }
    }

    /// Drain the whole source, `EOF` token included.
    pub fn tokens(src: &'a str) -> Vec<Token> {
        Self::new(src).collect()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume the rest of the current line, newline included.
    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn at_block_comment_fence(&self) -> bool {
        self.peek() == Some('#') && self.peek_at(1) == Some('#') && self.peek_at(2) == Some('#')
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    if self.column == 1 && self.at_block_comment_fence() {
                        // Opening fence line, then everything up to and
                        // including the next line that begins with ###.
                        self.skip_line();
                        while self.peek().is_some() {
                            if self.column == 1 && self.at_block_comment_fence() {
                                self.skip_line();
                                break;
                            }
                            self.skip_line();
                        }
                    } else {
                        self.skip_line();
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token. After `EOF` is reached, returns `EOF`
    /// tokens forever.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let (line, column) = (self.line, self.column);

        let Some(c) = self.peek() else {
            self.finished = true;
            return Token::new(TokenKind::Eof, "", line, column);
        };

        let (kind, literal) = match c {
            '(' => self.single(TokenKind::LParen, c),
            ')' => self.single(TokenKind::RParen, c),
            '[' => self.single(TokenKind::LBracket, c),
            ']' => self.single(TokenKind::RBracket, c),
            '{' => self.single(TokenKind::LBrace, c),
            '}' => self.single(TokenKind::RBrace, c),
            ';' => self.single(TokenKind::Semicolon, c),
            '.' => self.single(TokenKind::Dot, c),
            ',' => self.single(TokenKind::Comma, c),
            '@' => self.scan_at(),
            ':' => self.scan_colon(),
            '"' => self.scan_string('"'),
            '\'' => self.scan_string('\''),
            c if c.is_ascii_digit() => self.scan_number(false),
            '+' | '-'
                if self.peek_at(1).is_some_and(|d| d.is_ascii_digit())
                    && self.glue_context() =>
            {
                self.scan_number(true)
            }
            c if is_ident_start(c) => self.scan_identifier(),
            other => {
                self.bump();
                (TokenKind::Illegal, format!("unexpected character '{other}'"))
            }
        };

        self.prev = Some(kind);
        Token::new(kind, literal, line, column)
    }

    fn single(&mut self, kind: TokenKind, c: char) -> (TokenKind, String) {
        self.bump();
        (kind, c.to_string())
    }

    fn scan_at(&mut self) -> (TokenKind, String) {
        self.bump();
        if self.peek() == Some(':') {
            self.bump();
            (TokenKind::AtColon, "@:".into())
        } else {
            (TokenKind::At, "@".into())
        }
    }

    fn scan_colon(&mut self) -> (TokenKind, String) {
        self.bump();
        match self.peek() {
            Some('>') if self.peek_at(1) == Some('>') => {
                self.bump();
                self.bump();
                (TokenKind::Identifier, ":>>".into())
            }
            Some('<') if self.peek_at(1) == Some('<') => {
                self.bump();
                self.bump();
                (TokenKind::Identifier, ":<<".into())
            }
            Some(c) if COMPOUND_ASSIGN.contains(c) => {
                self.bump();
                (TokenKind::Identifier, format!(":{c}"))
            }
            _ => (TokenKind::Colon, ":".into()),
        }
    }

    /// Sign gluing: a sign binds to the following digits only where the
    /// previous token suggests an operand position, not a continuation.
    fn glue_context(&self) -> bool {
        matches!(
            self.prev,
            None | Some(
                TokenKind::LParen
                    | TokenKind::LBracket
                    | TokenKind::LBrace
                    | TokenKind::Semicolon
                    | TokenKind::Comma
                    | TokenKind::At
                    | TokenKind::AtColon
                    | TokenKind::Colon
                    | TokenKind::Dot
                    | TokenKind::Elvis
            )
        )
    }

    fn scan_number(&mut self, signed: bool) -> (TokenKind, String) {
        let mut literal = String::new();
        if signed {
            if let Some(sign) = self.bump() {
                literal.push(sign);
            }
        }
        self.take_digits(&mut literal);

        match self.peek() {
            // A `.` only joins the literal when a digit follows;
            // otherwise it is left for the next token.
            Some('.') if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                literal.push('.');
                self.bump();
                self.take_digits(&mut literal);
                (TokenKind::Decimal, literal)
            }
            Some('/') => {
                let after = self.peek_at(1);
                let signed_den = matches!(after, Some('+' | '-'))
                    && self.peek_at(2).is_some_and(|d| d.is_ascii_digit());
                if after.is_some_and(|d| d.is_ascii_digit()) || signed_den {
                    literal.push('/');
                    self.bump();
                    if signed_den {
                        if let Some(sign) = self.bump() {
                            literal.push(sign);
                        }
                    }
                    self.take_digits(&mut literal);
                    (TokenKind::Rational, literal)
                } else {
                    (TokenKind::Integer, literal)
                }
            }
            _ => (TokenKind::Integer, literal),
        }
    }

    fn take_digits(&mut self, into: &mut String) {
        while let Some(d) = self.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            into.push(d);
            self.bump();
        }
    }

    /// Identifiers come in two classes that never mix: runs of the ASCII
    /// operator symbols, and word identifiers (underscore, letters,
    /// Unicode letter/number/symbol codepoints, plus ASCII digits after
    /// the first character). `a+b` is three tokens, not one.
    fn scan_identifier(&mut self) -> (TokenKind, String) {
        let symbolic = self.peek().is_some_and(is_operator_char);
        let mut literal = String::new();
        while let Some(c) = self.peek() {
            let continues = if symbolic {
                is_operator_char(c)
            } else {
                is_word_start(c) || c.is_ascii_digit()
            };
            if !continues {
                break;
            }
            literal.push(c);
            self.bump();
        }

        if literal == "?" && self.peek() == Some(':') {
            self.bump();
            return (TokenKind::Elvis, "?:".into());
        }
        match literal.as_str() {
            "true" | "false" => (TokenKind::Boolean, literal),
            "this" | "left" | "right" => (TokenKind::Keyword, literal),
            _ => (TokenKind::Identifier, literal),
        }
    }

    fn scan_string(&mut self, quote: char) -> (TokenKind, String) {
        let raw = quote == '\'';
        self.bump();
        if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
            self.bump();
            self.bump();
            return self.scan_docstring(quote);
        }

        let mut body = String::new();
        loop {
            match self.bump() {
                None => {
                    return (TokenKind::Illegal, "unterminated string".into());
                }
                Some(c) if c == quote => break,
                Some('\\') if !raw => {
                    body.push('\\');
                    match self.bump() {
                        Some(next) => body.push(next),
                        None => {
                            return (TokenKind::Illegal, "unterminated string".into());
                        }
                    }
                }
                Some(c) => body.push(c),
            }
        }

        if raw {
            (TokenKind::RawString, body)
        } else {
            match process_escapes(&body) {
                Ok(text) => (TokenKind::Str, text),
                Err(message) => (TokenKind::Illegal, message),
            }
        }
    }

    fn scan_docstring(&mut self, quote: char) -> (TokenKind, String) {
        let raw = quote == '\'';
        let mut body = String::new();
        loop {
            if self.peek().is_none() {
                return (TokenKind::Illegal, "unterminated docstring".into());
            }
            if self.peek() == Some(quote)
                && self.peek_at(1) == Some(quote)
                && self.peek_at(2) == Some(quote)
            {
                self.bump();
                self.bump();
                self.bump();
                break;
            }
            if let Some(c) = self.bump() {
                body.push(c);
            }
        }

        let stripped = strip_indent(&body);
        if raw {
            (TokenKind::RawDoc, stripped)
        } else {
            match process_escapes(&stripped) {
                Ok(text) => (TokenKind::Docstring, text),
                Err(message) => (TokenKind::Illegal, message),
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        Some(self.next_token())
    }
}

fn is_operator_char(c: char) -> bool {
    OPERATOR_CHARS.contains(c)
}

/// Word-class identifier start: underscore, letters, and the Unicode
/// Letter, Number, and Symbol categories. Punctuation is excluded.
fn is_word_start(c: char) -> bool {
    if c.is_ascii() {
        c == '_' || c.is_ascii_alphabetic()
    } else {
        c.is_alphanumeric() || is_unicode_symbol(c)
    }
}

fn is_ident_start(c: char) -> bool {
    is_word_start(c) || is_operator_char(c)
}

/// The Unicode Symbol categories, by block: the Latin-1 symbol
/// codepoints, currency signs, letterlike symbols, and the arrow /
/// mathematical / technical / pictographic ranges.
fn is_unicode_symbol(c: char) -> bool {
    matches!(
        c,
        '\u{00A2}'..='\u{00A6}'
            | '\u{00A8}'
            | '\u{00A9}'
            | '\u{00AC}'
            | '\u{00AE}'
            | '\u{00AF}'
            | '\u{00B0}'
            | '\u{00B1}'
            | '\u{00B4}'
            | '\u{00B8}'
            | '\u{00D7}'
            | '\u{00F7}'
            | '\u{20A0}'..='\u{20CF}'
            | '\u{2100}'..='\u{214F}'
            | '\u{2190}'..='\u{2BFF}'
            | '\u{1F000}'..='\u{1FAFF}'
    )
}

/// Resolve the escape sequences of a plain string or docstring body.
fn process_escapes(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('0') => out.push('\0'),
            Some('u') => out.push(decode_unicode_escape(&mut chars)?),
            Some(other) => return Err(format!("unknown escape '\\{other}'")),
            None => return Err("unterminated escape".into()),
        }
    }
    Ok(out)
}

/// `\uXXXX` (exactly four hex digits) or `\u{H...}` (one to six).
fn decode_unicode_escape(chars: &mut core::str::Chars) -> Result<char, String> {
    let mut digits = String::new();
    let mut rest = chars.clone();
    if rest.next() == Some('{') {
        *chars = rest;
        loop {
            match chars.next() {
                Some('}') => break,
                Some(d) if d.is_ascii_hexdigit() && digits.len() < 6 => digits.push(d),
                _ => return Err("malformed unicode escape".into()),
            }
        }
        if digits.is_empty() {
            return Err("empty unicode escape".into());
        }
    } else {
        for _ in 0..4 {
            match chars.next() {
                Some(d) if d.is_ascii_hexdigit() => digits.push(d),
                _ => return Err("malformed unicode escape".into()),
            }
        }
    }
    let code = u32::from_str_radix(&digits, 16)
        .map_err(|_| String::from("malformed unicode escape"))?;
    char::from_u32(code).ok_or_else(|| "unicode escape out of range".into())
}

/// Docstring indent stripping: drop a leading and a trailing blank line,
/// then remove the common leading whitespace of the remaining lines.
fn strip_indent(body: &str) -> String {
    let mut lines: Vec<&str> = body.split('\n').collect();
    if lines.first().is_some_and(|l| is_blank(l)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| is_blank(l)) {
        lines.pop();
    }
    let indent = lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| l.chars().take_while(|c| *c == ' ' || *c == '\t').count())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            let cut = l
                .char_indices()
                .nth(indent.min(l.chars().count()))
                .map(|(i, _)| i)
                .unwrap_or(l.len());
            &l[cut..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_blank(line: &str) -> bool {
    line.chars().all(|c| c == ' ' || c == '\t')
}
