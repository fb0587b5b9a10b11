//! Identifier substitution.
//!
//! Rewrites free identifier references that match a define key with the
//! define's raw expression text. Works on the token stream from
//! [`scan`](crate::scanner::scan) and copies everything between tokens
//! (whitespace, comments) through untouched.
//!
//! A reference is left alone when it is:
//! - a property name (`a.caterpillar`, `a?.caterpillar`, `{ caterpillar: 1 }`),
//! - inside a string, template text, comment or regex literal,
//! - bound by an enclosing declaration (variables, functions, classes,
//!   parameters, catch clauses, imports),
//! - the target of an assignment or update,
//! - a label, or a class member name,
//! - an element of an object or array pattern being assigned to.
//!
//! Scopes are approximated by braces. `let`, `const` and `class` bind in the
//! enclosing block, or in the loop when declared in a `for` header. `var` and
//! function declarations bind in the enclosing function body.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::define::{DefineMap, RawExpr};
use crate::error::ScanError;
use crate::scanner::{scan, Token, TokenKind};

/// Result of substituting defines into one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Rewritten source text.
    pub code: String,
    /// Number of references replaced.
    pub replaced: usize,
}

/// Words that are never treated as identifier references.
const RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "super", "switch",
    "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Keywords that start a new statement; used to stop scanning a declarator
/// list when semicolons are omitted.
const STATEMENT_KEYWORDS: &[&str] = &[
    "const", "let", "var", "if", "for", "while", "do", "return", "import", "export", "switch",
    "try", "throw", "break", "continue",
];

/// Words followed by a parenthesised condition rather than a parameter list.
const CONTROL_KEYWORDS: &[&str] = &["if", "for", "while", "switch", "with"];

/// Keywords after which `{` opens an object literal.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "yield", "await", "in", "of", "void", "delete", "throw",
    "default",
];

/// Class member modifiers.
const MEMBER_MODIFIERS: &[&str] = &[
    "static", "get", "set", "async", "readonly", "public", "private", "protected", "declare",
    "override", "accessor", "abstract",
];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=",
    "||=", "??=", "++", "--",
];

/// Replace free references to define keys in `source`.
///
/// Each define is applied once; a replacement's text is never scanned for
/// further defines.
pub fn substitute(source: &str, defines: &DefineMap) -> Result<Substitution, ScanError> {
    let tokens = scan(source)?;
    let substituter = Substituter::new(&tokens, defines);
    let substitution = substituter.rewrite(source);
    tracing::debug!(
        tokens = tokens.len(),
        replaced = substitution.replaced,
        "substituted defines"
    );
    Ok(substitution)
}

struct Rule<'d> {
    segments: Vec<&'d str>,
    expr: &'d RawExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternLevel {
    /// Parameter list or array pattern.
    List,
    Object,
}

struct Substituter<'t, 'a, 'd> {
    tokens: &'t [Token<'a>],
    /// Matching bracket for every `(`, `[`, `{` and closer.
    pairs: Vec<Option<usize>>,
    /// Innermost enclosing `{` for every token.
    block_of: Vec<Option<usize>>,
    /// Innermost enclosing `(`, `[` or `{` for every token.
    bracket_of: Vec<Option<usize>>,
    bindings: HashMap<&'a str, Vec<Range<usize>>>,
    class_bodies: HashSet<usize>,
    /// `{` tokens opening a function or method body.
    function_bodies: HashSet<usize>,
    rules: HashMap<&'d str, Vec<Rule<'d>>>,
}

impl<'t, 'a, 'd> Substituter<'t, 'a, 'd> {
    fn new(tokens: &'t [Token<'a>], defines: &'d DefineMap) -> Self {
        let mut rules: HashMap<&'d str, Vec<Rule<'d>>> = HashMap::new();
        for (key, expr) in defines {
            let segments: Vec<&str> = key.split('.').collect();
            rules.entry(segments[0]).or_default().push(Rule { segments, expr });
        }
        for candidates in rules.values_mut() {
            candidates.sort_by(|a, b| b.segments.len().cmp(&a.segments.len()));
        }

        let pairs = match_brackets(tokens);
        let block_of = enclosing(tokens, &pairs, &["{"]);
        let bracket_of = enclosing(tokens, &pairs, &["(", "[", "{"]);

        let mut substituter = Self {
            tokens,
            pairs,
            block_of,
            bracket_of,
            bindings: HashMap::new(),
            class_bodies: HashSet::new(),
            function_bodies: HashSet::new(),
            rules,
        };
        if !substituter.rules.is_empty() {
            substituter.collect_function_bodies();
            substituter.collect_bindings();
        }
        substituter
    }

    fn rewrite(&self, source: &str) -> Substitution {
        let mut code = String::with_capacity(source.len());
        let mut last = 0;
        let mut replaced = 0;
        let mut i = 0;

        while i < self.tokens.len() {
            let Some((end, expr, shorthand)) = self.match_at(i) else {
                i += 1;
                continue;
            };
            let token = &self.tokens[i];
            code.push_str(&source[last..token.start]);
            if shorthand {
                code.push_str(token.text);
                code.push_str(": ");
            }
            code.push_str(expr.as_str());
            tracing::trace!(reference = token.text, offset = token.start, "replaced define");

            last = self.tokens[end].end();
            replaced += 1;
            i = end + 1;
        }

        code.push_str(&source[last..]);
        Substitution { code, replaced }
    }

    /// Try to match a define at token `i`. Returns the index of the last
    /// token consumed, the replacement, and whether the reference is an
    /// object shorthand property.
    fn match_at(&self, i: usize) -> Option<(usize, &'d RawExpr, bool)> {
        let token = &self.tokens[i];
        if token.kind != TokenKind::Ident {
            return None;
        }
        let candidates = self.rules.get(token.text)?;
        if RESERVED.contains(&token.text) || self.is_bound(token.text, i) {
            return None;
        }
        if !self.is_reference_position(i) {
            return None;
        }

        let rule = candidates.iter().find(|rule| self.chain_matches(i, &rule.segments))?;
        let end = i + 2 * (rule.segments.len() - 1);

        if let Some(next) = self.tokens.get(end + 1) {
            if next.kind == TokenKind::Punct && ASSIGNMENT_OPERATORS.contains(&next.text) {
                return None;
            }
        }
        if self.is_pattern_target(i, end) {
            return None;
        }

        let shorthand = rule.segments.len() == 1 && self.is_shorthand_property(i);
        Some((end, rule.expr, shorthand))
    }

    fn chain_matches(&self, i: usize, segments: &[&str]) -> bool {
        (1..segments.len()).all(|m| {
            self.tokens.get(i + 2 * m - 1).is_some_and(|t| t.is_punct("."))
                && self.tokens.get(i + 2 * m).is_some_and(|t| t.is_word(segments[m]))
        })
    }

    fn is_bound(&self, name: &str, i: usize) -> bool {
        self.bindings
            .get(name)
            .is_some_and(|scopes| scopes.iter().any(|scope| scope.contains(&i)))
    }

    fn is_reference_position(&self, i: usize) -> bool {
        let prev = i.checked_sub(1).map(|p| &self.tokens[p]);
        let next = self.tokens.get(i + 1);

        if let Some(prev) = prev {
            if prev.is_punct(".") || prev.is_punct("?.") {
                return false;
            }
            if prev.is_punct("++") || prev.is_punct("--") {
                return false;
            }
            if prev.is_word("break") || prev.is_word("continue") {
                return false;
            }
        }

        let block = self.direct_brace(i);
        let in_object = block.is_some_and(|b| self.is_object_literal(b));
        let after_separator = prev.map_or(true, |p| p.is_punct("{") || p.is_punct(","));
        let next_is = |p: &str| next.is_some_and(|n| n.is_punct(p));

        if in_object {
            // `{ key: value }` and `{ key() {} }`
            if after_separator && (next_is(":") || next_is("(")) {
                return false;
            }
            if prev.is_some_and(|p| p.is_word("get") || p.is_word("set") || p.is_word("async"))
                && next_is("(")
            {
                return false;
            }
        } else if next_is(":") && prev.map_or(true, |p| p.is_punct(";") || p.is_punct("{") || p.is_punct("}")) {
            // label
            return false;
        }

        if let Some(b) = block {
            if self.class_bodies.contains(&b) {
                let member_start = prev.map_or(true, |p| {
                    p.is_punct("{")
                        || p.is_punct("}")
                        || p.is_punct(";")
                        || p.is_punct("*")
                        || (p.kind == TokenKind::Ident && MEMBER_MODIFIERS.contains(&p.text))
                });
                if member_start {
                    return false;
                }
            }
            // `export { a, b as c }` / `import { a } from`
            if let Some(opener) = b.checked_sub(1).map(|p| &self.tokens[p]) {
                if opener.is_word("export") || opener.is_word("import") {
                    return false;
                }
            }
        }

        true
    }

    /// The `{` directly enclosing token `i`, if no `(` or `[` sits between
    /// them.
    fn direct_brace(&self, i: usize) -> Option<usize> {
        let block = self.block_of[i]?;
        (self.bracket_of[i] == Some(block)).then_some(block)
    }

    fn is_shorthand_property(&self, i: usize) -> bool {
        let Some(block) = self.direct_brace(i) else {
            return false;
        };
        if !self.is_object_literal(block) {
            return false;
        }
        let prev = &self.tokens[i - 1];
        let after_separator = prev.is_punct("{") || prev.is_punct(",");
        let before_separator = self
            .tokens
            .get(i + 1)
            .is_some_and(|n| n.is_punct(",") || n.is_punct("}"));
        after_separator && before_separator
    }

    /// Whether the `{` at index `k` opens an object literal rather than a block.
    fn is_object_literal(&self, k: usize) -> bool {
        let Some(prev) = k.checked_sub(1).map(|p| &self.tokens[p]) else {
            return false;
        };
        match prev.kind {
            TokenKind::Punct => match prev.text {
                ")" | ";" | "}" | "{" | "=>" => false,
                ":" => {
                    let case_label = k >= 3 && self.tokens[k - 3].is_word("case");
                    let default_label = k >= 2 && self.tokens[k - 2].is_word("default");
                    !(case_label || default_label)
                }
                _ => true,
            },
            TokenKind::Ident => EXPRESSION_KEYWORDS.contains(&prev.text),
            TokenKind::TemplateHead | TokenKind::TemplateMiddle => true,
            _ => false,
        }
    }

    /// Whether the `[` at index `k` opens an array literal rather than an
    /// index access.
    fn is_array_literal(&self, k: usize) -> bool {
        let Some(prev) = k.checked_sub(1).map(|p| &self.tokens[p]) else {
            return true;
        };
        match prev.kind {
            TokenKind::Punct => !matches!(prev.text, ")" | "]"),
            TokenKind::Ident => {
                RESERVED.contains(&prev.text) || EXPRESSION_KEYWORDS.contains(&prev.text)
            }
            TokenKind::TemplateHead | TokenKind::TemplateMiddle => true,
            _ => false,
        }
    }

    /// Whether tokens `i..=end` form an element of an object or array
    /// pattern that is being assigned to, as in `({ a } = obj)` or
    /// `[a, b] = pair`.
    fn is_pattern_target(&self, i: usize, end: usize) -> bool {
        let Some(prev) = i.checked_sub(1).map(|p| &self.tokens[p]) else {
            return false;
        };
        let element_end = self
            .tokens
            .get(end + 1)
            .is_some_and(|n| [",", "}", "]", "="].iter().any(|p| n.is_punct(p)));
        if !starts_element(prev) || !element_end {
            return false;
        }

        let mut level = self.bracket_of[i];
        while let Some(k) = level {
            let literal = match self.tokens[k].text {
                "{" => self.is_object_literal(k),
                "[" => self.is_array_literal(k),
                _ => false,
            };
            if !literal {
                return false;
            }
            let Some(close) = self.pairs[k] else {
                return false;
            };
            if self.tokens.get(close + 1).is_some_and(|t| t.is_punct("=")) {
                return true;
            }
            // a nested pattern must itself be an element of the outer one
            if !k.checked_sub(1).is_some_and(|p| starts_element(&self.tokens[p])) {
                return false;
            }
            level = self.bracket_of[k];
        }
        false
    }

    /// Range of tokens covered by the block opened at `k`, or the whole unit.
    fn scope_of(&self, block: Option<usize>) -> Range<usize> {
        match block {
            Some(k) => k..self.pairs[k].map_or(self.tokens.len(), |p| p + 1),
            None => 0..self.tokens.len(),
        }
    }

    /// Scope of a `var` or hoisted function declaration at token `i`: the
    /// nearest enclosing function body, or the whole unit.
    fn function_scope_of(&self, i: usize) -> Range<usize> {
        let mut block = self.block_of[i];
        while let Some(k) = block {
            if self.function_bodies.contains(&k) {
                return self.scope_of(Some(k));
            }
            block = self.block_of[k];
        }
        0..self.tokens.len()
    }

    /// `(` opening a `for` header when token `i` directly follows it.
    fn for_header(&self, i: usize) -> Option<usize> {
        let open = i.checked_sub(1)?;
        if !self.tokens[open].is_punct("(") {
            return None;
        }
        let keyword = open.checked_sub(1).map(|k| &self.tokens[k])?;
        let is_for = keyword.is_word("for")
            || (keyword.is_word("await") && open >= 2 && self.tokens[open - 2].is_word("for"));
        is_for.then_some(open)
    }

    /// Header plus body of the loop whose header opens at `open`.
    fn loop_scope(&self, open: usize) -> Range<usize> {
        let Some(close) = self.pairs[open] else {
            return open..self.tokens.len();
        };
        let body = close + 1;
        let end = if self.tokens.get(body).is_some_and(|t| t.is_punct("{")) {
            self.scope_of(Some(body)).end
        } else {
            (self.expression_end(body) + 1).min(self.tokens.len())
        };
        open..end
    }

    fn is_function_declaration(&self, i: usize) -> bool {
        let mut start = i;
        if start > 0 && self.tokens[start - 1].is_word("async") {
            start -= 1;
        }
        match start.checked_sub(1).map(|p| &self.tokens[p]) {
            None => true,
            Some(prev) => {
                prev.is_punct(";")
                    || prev.is_punct("{")
                    || prev.is_punct("}")
                    || prev.is_word("export")
                    || prev.is_word("default")
            }
        }
    }

    fn bind(&mut self, names: Vec<&'a str>, scope: Range<usize>) {
        for name in names {
            if self.rules.contains_key(name) {
                self.bindings.entry(name).or_default().push(scope.clone());
            }
        }
    }

    fn collect_bindings(&mut self) {
        let tokens = self.tokens;
        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Ident => match token.text {
                    "let" | "const" | "var" => {
                        let starts_binding = tokens.get(i + 1).is_some_and(|n| {
                            (n.kind == TokenKind::Ident && !RESERVED.contains(&n.text))
                                || n.is_punct("{")
                                || n.is_punct("[")
                        });
                        if starts_binding {
                            let mut names = Vec::new();
                            self.declarator_names(i + 1, &mut names);
                            let scope = if token.text == "var" {
                                self.function_scope_of(i)
                            } else if let Some(open) = self.for_header(i) {
                                self.loop_scope(open)
                            } else {
                                self.scope_of(self.block_of[i])
                            };
                            self.bind(names, scope);
                        }
                    }
                    "function" => {
                        let name = match tokens.get(i + 1) {
                            Some(n) if n.is_punct("*") => tokens.get(i + 2),
                            other => other,
                        };
                        if let Some(name) = name.filter(|n| n.kind == TokenKind::Ident) {
                            let scope = if self.is_function_declaration(i) {
                                self.function_scope_of(i)
                            } else {
                                self.scope_of(self.block_of[i])
                            };
                            self.bind(vec![name.text], scope);
                        }
                    }
                    "class" => self.class_declaration(i),
                    "import" => self.import_bindings(i),
                    _ => {}
                },
                TokenKind::Punct => match token.text {
                    "(" => self.parameter_list(i),
                    "=>" => self.arrow_parameters(i),
                    _ => {}
                },
                _ => {}
            }
        }
    }

    fn class_declaration(&mut self, i: usize) {
        let tokens = self.tokens;
        if let Some(name) = tokens.get(i + 1) {
            if name.kind == TokenKind::Ident && name.text != "extends" && name.text != "implements" {
                let scope = self.scope_of(self.block_of[i]);
                self.bind(vec![name.text], scope);
            }
        }

        let mut j = i + 1;
        while let Some(t) = tokens.get(j) {
            if t.is_punct("{") {
                self.class_bodies.insert(j);
                return;
            }
            if t.is_punct(";") || t.is_punct("}") {
                return;
            }
            if t.is_punct("(") || t.is_punct("[") {
                match self.pairs[j] {
                    Some(p) => j = p + 1,
                    None => return,
                }
                continue;
            }
            j += 1;
        }
    }

    fn import_bindings(&mut self, i: usize) {
        let tokens = self.tokens;
        if tokens
            .get(i + 1)
            .is_some_and(|n| n.is_punct("(") || n.is_punct("."))
        {
            return;
        }

        let mut names = Vec::new();
        let mut k = i + 1;
        while let Some(t) = tokens.get(k) {
            if t.kind == TokenKind::String || t.is_word("from") || t.is_punct(";") {
                break;
            }
            let renamed = tokens.get(k + 1).is_some_and(|n| n.is_word("as"));
            if t.kind == TokenKind::Ident && !renamed && t.text != "as" && t.text != "type" {
                names.push(t.text);
            }
            k += 1;
        }
        self.bind(names, 0..tokens.len());
    }

    fn collect_function_bodies(&mut self) {
        let tokens = self.tokens;
        for (i, token) in tokens.iter().enumerate() {
            if token.is_punct("(") {
                let is_catch = i > 0 && tokens[i - 1].is_word("catch");
                if let Some(body) = self.function_body(i).filter(|_| !is_catch) {
                    self.function_bodies.insert(body);
                }
            } else if token.is_punct("=>") && tokens.get(i + 1).is_some_and(|t| t.is_punct("{")) {
                self.function_bodies.insert(i + 1);
            }
        }
    }

    /// The `{` opening the body whose parameter list starts at the `(` at
    /// `p`, if `p` opens a parameter list.
    fn function_body(&self, p: usize) -> Option<usize> {
        let tokens = self.tokens;
        let q = self.pairs[p]?;
        let function_like = p.checked_sub(1).is_some_and(|b| {
            let before = &tokens[b];
            match before.kind {
                TokenKind::Ident => !CONTROL_KEYWORDS.contains(&before.text),
                TokenKind::PrivateName => true,
                TokenKind::Punct => before.text == "*",
                _ => false,
            }
        });
        if !function_like {
            return None;
        }

        let mut body = q + 1;
        if tokens.get(body).is_some_and(|t| t.is_punct(":")) {
            // return type annotation
            while let Some(t) = tokens.get(body) {
                if t.is_punct("{") {
                    break;
                }
                if t.is_punct(";") || t.is_punct("=>") || t.is_punct("}") {
                    return None;
                }
                body += 1;
            }
        }
        tokens.get(body).is_some_and(|t| t.is_punct("{")).then_some(body)
    }

    /// `(` opening a parameter list: function declarations and expressions,
    /// methods, and catch clauses. Parameters are scoped to the body block.
    fn parameter_list(&mut self, p: usize) {
        let (Some(q), Some(body)) = (self.pairs[p], self.function_body(p)) else {
            return;
        };

        let mut names = Vec::new();
        self.pattern_names(p + 1..q, PatternLevel::List, &mut names);
        let scope = p..self.scope_of(Some(body)).end;
        self.bind(names, scope);
    }

    fn arrow_parameters(&mut self, a: usize) {
        let tokens = self.tokens;
        let Some(prev) = a.checked_sub(1).map(|p| &tokens[p]) else {
            return;
        };

        let mut names = Vec::new();
        let start = if prev.is_punct(")") {
            let Some(open) = self.pairs[a - 1] else {
                return;
            };
            self.pattern_names(open + 1..a - 1, PatternLevel::List, &mut names);
            open
        } else if prev.kind == TokenKind::Ident {
            names.push(prev.text);
            a - 1
        } else {
            return;
        };

        let end = if tokens.get(a + 1).is_some_and(|t| t.is_punct("{")) {
            self.scope_of(Some(a + 1)).end
        } else {
            self.expression_end(a + 1)
        };
        self.bind(names, start..end);
    }

    /// Names bound by `let`/`const`/`var` declarators starting at token `j`.
    fn declarator_names(&self, mut j: usize, out: &mut Vec<&'a str>) {
        let tokens = self.tokens;
        loop {
            let Some(t) = tokens.get(j) else {
                return;
            };
            if t.kind == TokenKind::Ident && !RESERVED.contains(&t.text) {
                out.push(t.text);
                j += 1;
            } else if t.is_punct("{") || t.is_punct("[") {
                let level = if t.is_punct("{") {
                    PatternLevel::Object
                } else {
                    PatternLevel::List
                };
                let close = self.pairs[j].unwrap_or(tokens.len());
                self.pattern_names(j + 1..close, level, out);
                j = close + 1;
            } else {
                return;
            }

            // skip the type annotation and initializer
            loop {
                let Some(t) = tokens.get(j) else {
                    return;
                };
                match t.kind {
                    TokenKind::Punct => match t.text {
                        "(" | "[" | "{" => match self.pairs[j] {
                            Some(p) => {
                                j = p + 1;
                                continue;
                            }
                            None => return,
                        },
                        ")" | "]" | "}" | ";" => return,
                        "," => {
                            j += 1;
                            break;
                        }
                        _ => {}
                    },
                    TokenKind::Ident
                        if t.text == "in" || t.text == "of" || STATEMENT_KEYWORDS.contains(&t.text) =>
                    {
                        return
                    }
                    _ => {}
                }
                j += 1;
            }
        }
    }

    /// Names bound by a destructuring pattern or parameter list.
    fn pattern_names(&self, range: Range<usize>, top: PatternLevel, out: &mut Vec<&'a str>) {
        let tokens = self.tokens;
        let mut levels = vec![top];
        let mut k = range.start;

        while k < range.end {
            let t = &tokens[k];
            let level = levels.last().copied().unwrap_or(top);
            match t.kind {
                TokenKind::Punct => match t.text {
                    "{" => {
                        levels.push(PatternLevel::Object);
                        k += 1;
                    }
                    "[" => {
                        levels.push(PatternLevel::List);
                        k += 1;
                    }
                    "}" | "]" => {
                        levels.pop();
                        k += 1;
                    }
                    "(" => k = self.pairs[k].map_or(range.end, |p| p + 1),
                    "=" => k = self.skip_to_separator(k + 1, range.end, false),
                    _ => k += 1,
                },
                TokenKind::Ident => {
                    let next = tokens.get(k + 1).filter(|_| k + 1 < range.end);
                    let next_is = |p: &str| next.is_some_and(|n| n.is_punct(p));
                    match level {
                        PatternLevel::Object => {
                            if next_is(":") {
                                // `key: target`; the binding is the target
                                k += 2;
                                continue;
                            }
                            if next.is_none() || next_is(",") || next_is("}") || next_is("=") {
                                out.push(t.text);
                            }
                            k += 1;
                        }
                        PatternLevel::List => {
                            if next.is_none() || next_is(",") || next_is("]") || next_is("=") {
                                out.push(t.text);
                                k += 1;
                            } else if next_is(":") || next_is("?") {
                                out.push(t.text);
                                k = self.skip_to_separator(k + 1, range.end, true);
                            } else {
                                k += 1;
                            }
                        }
                    }
                }
                _ => k += 1,
            }
        }
    }

    /// Index of the next `,` (or `=` when `stop_at_default`) at the current
    /// nesting level, or of the closer ending that level.
    fn skip_to_separator(&self, mut k: usize, end: usize, stop_at_default: bool) -> usize {
        while k < end {
            let t = &self.tokens[k];
            if t.kind == TokenKind::Punct {
                match t.text {
                    "(" | "[" | "{" => {
                        k = self.pairs[k].map_or(end, |p| p + 1);
                        continue;
                    }
                    "," | ")" | "]" | "}" => return k,
                    "=" if stop_at_default => return k,
                    _ => {}
                }
            }
            k += 1;
        }
        end
    }

    /// End of an arrow function's expression body starting at `j`.
    fn expression_end(&self, mut j: usize) -> usize {
        while let Some(t) = self.tokens.get(j) {
            if t.kind == TokenKind::Punct {
                match t.text {
                    "(" | "[" | "{" => {
                        j = self.pairs[j].map_or(self.tokens.len(), |p| p + 1);
                        continue;
                    }
                    ")" | "]" | "}" | "," | ";" => return j,
                    _ => {}
                }
            }
            j += 1;
        }
        self.tokens.len()
    }
}

/// Whether a pattern element can start right after `t`.
fn starts_element(t: &Token<'_>) -> bool {
    [",", "{", "[", ":", "..."].iter().any(|p| t.is_punct(p))
}

fn match_brackets(tokens: &[Token<'_>]) -> Vec<Option<usize>> {
    let mut pairs = vec![None; tokens.len()];
    let mut open: Vec<usize> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Punct {
            continue;
        }
        let opener = match token.text {
            "(" | "[" | "{" => {
                open.push(i);
                continue;
            }
            ")" => "(",
            "]" => "[",
            "}" => "{",
            _ => continue,
        };
        if let Some(&top) = open.last() {
            if tokens[top].text == opener {
                open.pop();
                pairs[top] = Some(i);
                pairs[i] = Some(top);
            }
        }
    }

    pairs
}

/// Innermost enclosing opener from `openers` for every token. A closer maps
/// to its own opener.
fn enclosing(tokens: &[Token<'_>], pairs: &[Option<usize>], openers: &[&str]) -> Vec<Option<usize>> {
    let mut enclosing_of = Vec::with_capacity(tokens.len());
    let mut open: Vec<usize> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if pairs[i].is_some() && open.last().copied() == pairs[i] && pairs[i] < Some(i) {
            enclosing_of.push(open.pop());
            continue;
        }
        enclosing_of.push(open.last().copied());
        if token.kind == TokenKind::Punct && openers.contains(&token.text) {
            open.push(i);
        }
    }

    enclosing_of
}
