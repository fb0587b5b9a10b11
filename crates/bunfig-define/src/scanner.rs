//! JavaScript/TypeScript token scanner.
//!
//! Produces the token stream identifier substitution works on. Whitespace and
//! comments are dropped; every token keeps its byte offset so callers can
//! rebuild the source around it. The scanner does not validate syntax beyond
//! what it needs to find token boundaries.

use crate::error::ScanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident,
    /// `#name` class member.
    PrivateName,
    Number,
    String,
    /// Template literal without substitutions.
    Template,
    /// `` `text${ ``
    TemplateHead,
    /// `}text${`
    TemplateMiddle,
    /// `` }text` ``
    TemplateTail,
    Regex,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
}

impl Token<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == word
    }
}

/// Multi-character punctuators, longest first.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>",
];

/// Keywords after which `/` starts a regular expression instead of a division.
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Split `source` into tokens.
pub fn scan(source: &str) -> Result<Vec<Token<'_>>, ScanError> {
    Scanner::new(source).run()
}

/// Keywords whose parenthesised header is followed by a statement.
const CONTROL_HEADER_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    /// Block statement or function/class body.
    Block,
    /// Object literal or other expression-level brace.
    Expression,
    Template,
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token<'a>>,
    braces: Vec<Brace>,
    /// One entry per open `(`: whether it opened a control statement header.
    parens: Vec<bool>,
    /// The last token is a `)` or `}` that ends a statement header or block,
    /// so a following `/` starts a regex.
    statement_closed: bool,
}

fn is_ident_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '$' || c == '_' || c == '\u{200c}' || c == '\u{200d}' || c.is_alphanumeric()
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            braces: Vec::new(),
            parens: Vec::new(),
            statement_closed: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, ScanError> {
        if self.src.starts_with("#!") {
            self.skip_line();
        }

        loop {
            self.skip_trivia()?;
            let Some(c) = self.peek_char() else {
                break;
            };
            let start = self.pos;

            match c {
                '\'' | '"' => self.string(start)?,
                '`' => self.template_chunk(start, true)?,
                '}' if self.braces.last() == Some(&Brace::Template) => {
                    self.braces.pop();
                    self.template_chunk(start, false)?;
                }
                '{' => {
                    let brace = if self.opens_block() {
                        Brace::Block
                    } else {
                        Brace::Expression
                    };
                    self.braces.push(brace);
                    self.push(TokenKind::Punct, start, start + 1);
                }
                '}' => {
                    let closed = self.braces.pop();
                    self.push(TokenKind::Punct, start, start + 1);
                    self.statement_closed = closed == Some(Brace::Block);
                }
                '#' if self.src[start + 1..].chars().next().is_some_and(is_ident_start) => {
                    let end = self.ident_end(start + 1);
                    self.push(TokenKind::PrivateName, start, end);
                }
                c if is_ident_start(c) => {
                    let end = self.ident_end(start);
                    self.push(TokenKind::Ident, start, end);
                }
                '0'..='9' => self.number(start),
                '.' if self.byte_at(start + 1).is_some_and(|b| b.is_ascii_digit()) => {
                    self.number(start)
                }
                '/' if self.regex_allowed() => self.regex(start)?,
                _ => self.punct(start, c),
            }
        }

        Ok(self.tokens)
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn byte_at(&self, i: usize) -> Option<u8> {
        self.bytes.get(i).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            text: &self.src[start..end],
            start,
        });
        self.pos = end;
        self.statement_closed = false;
    }

    fn skip_line(&mut self) {
        while let Some(b) = self.byte_at(self.pos) {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ScanError> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    self.pos += c.len_utf8();
                }
                Some('/') if self.byte_at(self.pos + 1) == Some(b'/') => {
                    self.skip_line();
                }
                Some('/') if self.byte_at(self.pos + 1) == Some(b'*') => {
                    let start = self.pos;
                    match self.src[start + 2..].find("*/") {
                        Some(offset) => self.pos = start + 2 + offset + 2,
                        None => return Err(ScanError::UnterminatedComment(start)),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn ident_end(&self, from: usize) -> usize {
        let mut end = from;
        for c in self.src[from..].chars() {
            if !is_ident_continue(c) {
                break;
            }
            end += c.len_utf8();
        }
        end
    }

    fn string(&mut self, start: usize) -> Result<(), ScanError> {
        let quote = self.bytes[start];
        let mut i = start + 1;
        loop {
            match self.byte_at(i) {
                None | Some(b'\n') => return Err(ScanError::UnterminatedString(start)),
                Some(b'\\') => {
                    if self.byte_at(i + 1) == Some(b'\r') && self.byte_at(i + 2) == Some(b'\n') {
                        i += 3;
                    } else {
                        i += 2;
                    }
                }
                Some(b) if b == quote => {
                    i += 1;
                    break;
                }
                Some(_) => i += 1,
            }
        }
        self.push(TokenKind::String, start, i);
        Ok(())
    }

    /// Scan template text starting at the opening `` ` `` or the `}` that
    /// closes a substitution, up to the closing `` ` `` or the next `${`.
    fn template_chunk(&mut self, start: usize, opened: bool) -> Result<(), ScanError> {
        let mut i = start + 1;
        let kind = loop {
            match self.byte_at(i) {
                None => return Err(ScanError::UnterminatedTemplate(start)),
                Some(b'\\') => i += 2,
                Some(b'`') => {
                    i += 1;
                    break if opened {
                        TokenKind::Template
                    } else {
                        TokenKind::TemplateTail
                    };
                }
                Some(b'$') if self.byte_at(i + 1) == Some(b'{') => {
                    i += 2;
                    self.braces.push(Brace::Template);
                    break if opened {
                        TokenKind::TemplateHead
                    } else {
                        TokenKind::TemplateMiddle
                    };
                }
                Some(_) => i += 1,
            }
        };
        self.push(kind, start, i.min(self.src.len()));
        Ok(())
    }

    fn number(&mut self, start: usize) {
        let hex = self.src[start..].starts_with("0x") || self.src[start..].starts_with("0X");
        let mut i = start;
        while let Some(b) = self.byte_at(i) {
            let exponent_sign = (b == b'+' || b == b'-')
                && !hex
                && i > start
                && matches!(self.bytes[i - 1], b'e' | b'E');
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign {
                i += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, start, i);
    }

    fn regex_allowed(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(t) => match t.kind {
                TokenKind::Punct => match t.text {
                    ")" | "}" => self.statement_closed,
                    "]" | "++" | "--" => false,
                    _ => true,
                },
                TokenKind::Ident => REGEX_PREFIX_KEYWORDS.contains(&t.text),
                TokenKind::TemplateHead | TokenKind::TemplateMiddle => true,
                _ => false,
            },
        }
    }

    /// Whether a `{` at the current position opens a block rather than an
    /// object literal.
    fn opens_block(&self) -> bool {
        match self.tokens.last() {
            None => true,
            Some(t) => match t.kind {
                TokenKind::Punct => matches!(t.text, ")" | ";" | "}" | "{" | "=>"),
                TokenKind::Ident => {
                    t.text == "do" || t.text == "else" || !REGEX_PREFIX_KEYWORDS.contains(&t.text)
                }
                _ => false,
            },
        }
    }

    /// Whether a `(` at the current position opens an `if`/`while`/`for`/
    /// `with` header.
    fn opens_control_header(&self) -> bool {
        let n = self.tokens.len();
        match self.tokens.last() {
            Some(t) if t.kind == TokenKind::Ident && CONTROL_HEADER_KEYWORDS.contains(&t.text) => true,
            // `for await (`
            Some(t) if t.is_word("await") => n >= 2 && self.tokens[n - 2].is_word("for"),
            _ => false,
        }
    }

    fn regex(&mut self, start: usize) -> Result<(), ScanError> {
        let mut i = start + 1;
        let mut in_class = false;
        loop {
            match self.byte_at(i) {
                None | Some(b'\n') => return Err(ScanError::UnterminatedRegex(start)),
                Some(b'\\') => i += 2,
                Some(b'[') => {
                    in_class = true;
                    i += 1;
                }
                Some(b']') => {
                    in_class = false;
                    i += 1;
                }
                Some(b'/') if !in_class => {
                    i += 1;
                    break;
                }
                Some(_) => i += 1,
            }
        }
        while self.byte_at(i).is_some_and(|b| b.is_ascii_alphabetic()) {
            i += 1;
        }
        self.push(TokenKind::Regex, start, i.min(self.src.len()));
        Ok(())
    }

    fn punct(&mut self, start: usize, c: char) {
        let rest = &self.src[start..];
        let multi = PUNCTUATORS.iter().find(|p| {
            rest.starts_with(**p)
                && !(**p == "?." && self.byte_at(start + 2).is_some_and(|b| b.is_ascii_digit()))
        });
        let len = multi.map_or(c.len_utf8(), |p| p.len());
        match c {
            '(' => {
                let header = self.opens_control_header();
                self.parens.push(header);
                self.push(TokenKind::Punct, start, start + len);
            }
            ')' => {
                let header = self.parens.pop().unwrap_or(false);
                self.push(TokenKind::Punct, start, start + len);
                self.statement_closed = header;
            }
            _ => self.push(TokenKind::Punct, start, start + len),
        }
    }
}
