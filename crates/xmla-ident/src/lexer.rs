//! Identifier lexer.
//!
//! A single-pass state machine over the characters of the input. It never
//! backtracks; every finished segment, member and tuple is reported to an
//! [`IdentifierBuilder`] as soon as it is recognized.
//!
//! ```text
//!            '['                      ']' (not "]]")
//! BEFORE ─────────► IN_BRACKETED ───────────────────► AFTER
//!   │  ▲                                               │ │
//!   │  └──────────────── '.' / '&' ────────────────────┘ │
//!   │ other                                              │ , ) } end
//!   ▼                 . , ) } & end                      ▼
//! IN_UNQUOTED ───────────────────────────► AFTER     member complete
//! ```
//!
//! Key syntax is tracked alongside the state: `&` after a name starts a
//! key (`FIRST_KEY`), further `&` continue it (`NEXT_KEY`), and `.` resets
//! to `NAME`. Key parts are buffered and reported as one [`Segment::Key`]
//! when the next name or key starts, or when the identifier ends.

use crate::builder::{Assembler, IdentifierBuilder};
use crate::error::{IdentError, IdentResult};
use crate::segment::{Identifier, NameSegment, Segment, Tuple};

/// What shape of text to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// A single identifier: `[Time].[1997].[Q3]`
    Identifier,
    /// A comma-separated list of identifiers, optionally in braces.
    MemberList,
    /// A single parenthesized tuple: `([Time].[1997], [Store].[USA])`
    Tuple,
    /// A comma-separated list of tuples, optionally in braces.
    TupleList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeforeSegment,
    InBracketedSegment,
    InUnquotedSegment,
    AfterSegment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Name,
    FirstKey,
    NextKey,
}

#[derive(Debug, Clone, Copy)]
enum Element {
    Member,
    Tuple,
}

/// Parses a single identifier.
///
/// # Examples
///
/// ```rust
/// use xmla_ident::{parse_identifier, Segment};
///
/// let id = parse_identifier("[Time].1997.[Q3]").unwrap();
/// assert_eq!(id.segments, vec![
///     Segment::quoted("Time"),
///     Segment::unquoted("1997"),
///     Segment::quoted("Q3"),
/// ]);
/// ```
pub fn parse_identifier(input: &str) -> IdentResult<Identifier> {
    if input.trim().is_empty() {
        return Err(IdentError::EmptyIdentifier);
    }
    let mut assembler = Assembler::new();
    parse_with(input, ParseMode::Identifier, &mut assembler)?;
    assembler
        .into_identifiers()
        .into_iter()
        .next()
        .ok_or(IdentError::EmptyIdentifier)
}

/// Parses a list of identifiers: `{[a].[b], c}` or `[a].[b], c`.
pub fn parse_member_list(input: &str) -> IdentResult<Vec<Identifier>> {
    let mut assembler = Assembler::new();
    parse_with(input, ParseMode::MemberList, &mut assembler)?;
    Ok(assembler.into_identifiers())
}

/// Parses a single tuple: `([Time].[1997], [Store].[USA])`.
pub fn parse_tuple(input: &str) -> IdentResult<Tuple> {
    let mut assembler = Assembler::new();
    parse_with(input, ParseMode::Tuple, &mut assembler)?;
    assembler
        .into_tuples()
        .into_iter()
        .next()
        .ok_or(IdentError::EmptyIdentifier)
}

/// Parses a list of tuples: `{(a, b), (c, d)}` or `(a, b), (c, d)`.
pub fn parse_tuple_list(input: &str) -> IdentResult<Vec<Tuple>> {
    let mut assembler = Assembler::new();
    parse_with(input, ParseMode::TupleList, &mut assembler)?;
    Ok(assembler.into_tuples())
}

/// Parses `input` in the given mode, reporting events to `builder`.
///
/// All state is local to the call. On error the builder may have received
/// events for the part of the input before the error.
pub fn parse_with(
    input: &str,
    mode: ParseMode,
    builder: &mut dyn IdentifierBuilder,
) -> IdentResult<()> {
    let mut lexer = Lexer::new(input, builder);
    match mode {
        ParseMode::Identifier => {
            lexer.skip_ws();
            lexer.identifier()?;
            lexer.expect_end()
        }
        ParseMode::Tuple => {
            lexer.skip_ws();
            lexer.tuple()?;
            lexer.expect_end()
        }
        ParseMode::MemberList => lexer.list(Element::Member),
        ParseMode::TupleList => lexer.list(Element::Tuple),
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | ',' | ')' | '}' | '&')
}

struct Lexer<'a, 'b> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
    builder: &'b mut dyn IdentifierBuilder,
}

impl<'a, 'b> Lexer<'a, 'b> {
    fn new(input: &'a str, builder: &'b mut dyn IdentifierBuilder) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
            builder,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn error_at(&self, position: usize, message: impl Into<String>) -> IdentError {
        IdentError::ParseError {
            position,
            message: message.into(),
            input: self.input.to_string(),
        }
    }

    fn error(&self, message: impl Into<String>) -> IdentError {
        self.error_at(self.pos, message)
    }

    fn expect_end(&mut self) -> IdentResult<()> {
        self.skip_ws();
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("unexpected '{}' after end of expression", c))),
        }
    }

    // =========================================================================
    // Identifier
    // =========================================================================

    fn identifier(&mut self) -> IdentResult<()> {
        let mut state = State::BeforeSegment;
        let mut syntax = Syntax::Name;
        let mut body = String::new();
        let mut key: Vec<NameSegment> = Vec::new();
        let mut open_bracket = self.pos;

        loop {
            let c = self.peek();
            match state {
                State::BeforeSegment => match c {
                    None => {
                        return Err(self.error("expected identifier segment, found end of input"))
                    }
                    Some(c) if c.is_whitespace() => self.pos += 1,
                    Some('[') => {
                        open_bracket = self.pos;
                        self.pos += 1;
                        body.clear();
                        state = State::InBracketedSegment;
                    }
                    Some('&') => {
                        if syntax != Syntax::Name {
                            return Err(self.error("unexpected '&'"));
                        }
                        syntax = Syntax::FirstKey;
                        self.pos += 1;
                    }
                    Some(c) if is_terminator(c) || matches!(c, '(' | '{' | ']') => {
                        return Err(self.error(format!(
                            "unexpected '{}' where an identifier segment was expected",
                            c
                        )));
                    }
                    Some(_) => {
                        body.clear();
                        state = State::InUnquotedSegment;
                    }
                },

                State::InBracketedSegment => match c {
                    None => {
                        return Err(self.error_at(open_bracket, "unterminated bracket: missing ']'"))
                    }
                    Some(']') if self.peek_at(1) == Some(']') => {
                        body.push(']');
                        self.pos += 2;
                    }
                    Some(']') => {
                        self.pos += 1;
                        self.segment_complete(NameSegment::quoted(body.as_str()), syntax, &mut key);
                        state = State::AfterSegment;
                    }
                    Some(c) => {
                        body.push(c);
                        self.pos += 1;
                    }
                },

                State::InUnquotedSegment => match c {
                    Some(c) if !is_terminator(c) => {
                        body.push(c);
                        self.pos += 1;
                    }
                    _ => {
                        let name = body.trim();
                        self.segment_complete(NameSegment::unquoted(name), syntax, &mut key);
                        state = State::AfterSegment;
                    }
                },

                State::AfterSegment => match c {
                    Some(c) if c.is_whitespace() => self.pos += 1,
                    Some('.') => {
                        self.pos += 1;
                        syntax = Syntax::Name;
                        state = State::BeforeSegment;
                    }
                    Some('&') => {
                        self.pos += 1;
                        syntax = match syntax {
                            Syntax::Name => Syntax::FirstKey,
                            Syntax::FirstKey | Syntax::NextKey => Syntax::NextKey,
                        };
                        state = State::BeforeSegment;
                    }
                    _ => {
                        self.flush_key(&mut key);
                        self.builder.member_complete();
                        return Ok(());
                    }
                },
            }
        }
    }

    fn segment_complete(&mut self, part: NameSegment, syntax: Syntax, key: &mut Vec<NameSegment>) {
        match syntax {
            Syntax::Name => {
                self.flush_key(key);
                self.builder.segment_complete(Segment::Name(part));
            }
            Syntax::FirstKey => {
                self.flush_key(key);
                key.push(part);
            }
            Syntax::NextKey => key.push(part),
        }
    }

    fn flush_key(&mut self, key: &mut Vec<NameSegment>) {
        if !key.is_empty() {
            self.builder.segment_complete(Segment::Key(std::mem::take(key)));
        }
    }

    // =========================================================================
    // Tuples and lists
    // =========================================================================

    fn tuple(&mut self) -> IdentResult<()> {
        let open = self.pos;
        match self.peek() {
            Some('(') => self.pos += 1,
            Some(c) => return Err(self.error(format!("expected '(' to open a tuple, found '{}'", c))),
            None => return Err(self.error("expected '(' to open a tuple, found end of input")),
        }

        loop {
            self.skip_ws();
            self.identifier()?;
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.error_at(open, "unterminated tuple: missing ')'")),
                Some(c) => return Err(self.error(format!("unexpected '{}' in tuple", c))),
            }
        }

        self.builder.tuple_complete();
        Ok(())
    }

    fn element(&mut self, element: Element) -> IdentResult<()> {
        match element {
            Element::Member => self.identifier(),
            Element::Tuple => self.tuple(),
        }
    }

    fn list(&mut self, element: Element) -> IdentResult<()> {
        self.skip_ws();
        let open = self.pos;
        let braced = self.peek() == Some('{');
        if braced {
            self.pos += 1;
            self.skip_ws();
        }

        match self.peek() {
            None if braced => {
                return Err(self.error_at(open, "mismatched braces: missing closing '}'"))
            }
            None => return Ok(()),
            Some('}') if braced => {
                self.pos += 1;
                return self.expect_end();
            }
            _ => {}
        }

        loop {
            self.element(element)?;
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if matches!(self.peek(), None | Some('}')) {
                        return Err(self.error("trailing ',' in list"));
                    }
                }
                Some('}') if braced => {
                    self.pos += 1;
                    return self.expect_end();
                }
                Some('}') => {
                    return Err(self.error("mismatched braces: '}' without opening '{'"))
                }
                None if braced => {
                    return Err(self.error_at(open, "mismatched braces: missing closing '}'"))
                }
                None => return Ok(()),
                Some(c) => return Err(self.error(format!("unexpected '{}' in list", c))),
            }
        }
    }
}
