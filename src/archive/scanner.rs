//! Pull-based streaming JSON scanner.
//!
//! [`Scanner`] walks a JSON document one token at a time over any
//! [`BufRead`] source. Callers drive it: they ask for the next token, peek
//! at what comes next, skip whole values they do not care about, or have a
//! single value decoded into a typed record with serde.
//!
//! Only the bytes of the value currently being decoded are buffered, so
//! memory use is bounded by the largest value passed to
//! [`Scanner::decode_next`], not by the size of the document.
//!
//! Commas and colons are consumed implicitly; callers only ever see
//! structural tokens, keys and scalar values.
//!
//! # Failure domains
//!
//! A [`ScanError`] means the input is not valid JSON at the cursor. The
//! scanner cannot resynchronize after one, so the rest of the document is
//! lost. [`DecodeError::Malformed`] means the value was valid JSON but did
//! not fit the requested type; the cursor is already past that value and
//! scanning can continue with the next one.
//!
//! # Examples
//!
//! ```
//! use chat_role_audit::archive::scanner::{Scanner, Token};
//!
//! let mut scanner = Scanner::new(r#"{"skip": [1, 2], "keep": "x"}"#.as_bytes());
//! assert_eq!(scanner.next_token().unwrap(), Some(Token::BeginObject));
//! assert_eq!(scanner.next_token().unwrap(), Some(Token::Key("skip".into())));
//! scanner.skip_value().unwrap();
//! assert_eq!(scanner.next_token().unwrap(), Some(Token::Key("keep".into())));
//! let keep: String = scanner.decode_next().unwrap();
//! assert_eq!(keep, "x");
//! ```

use serde::de::DeserializeOwned;
use std::fmt;
use std::io::{self, BufRead};
use thiserror::Error;

/// A lexical token produced by [`Scanner::next_token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    /// Object member name (unescaped)
    Key(String),
    /// String value (unescaped)
    Str(String),
    /// Number, `true`, `false` or `null`, as written in the source
    Literal(String),
}

/// The kind of the next token, as reported by [`Scanner::peek_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Key,
    Str,
    Literal,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::BeginObject => TokenKind::BeginObject,
            Self::EndObject => TokenKind::EndObject,
            Self::BeginArray => TokenKind::BeginArray,
            Self::EndArray => TokenKind::EndArray,
            Self::Key(_) => TokenKind::Key,
            Self::Str(_) => TokenKind::Str,
            Self::Literal(_) => TokenKind::Literal,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::BeginObject => "'{'",
            Self::EndObject => "'}'",
            Self::BeginArray => "'['",
            Self::EndArray => "']'",
            Self::Key => "object key",
            Self::Str => "string",
            Self::Literal => "literal",
        };
        f.write_str(text)
    }
}

/// The input is not valid JSON at the cursor (or could not be read).
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: u64 },

    #[error("unexpected {} at byte {offset}, expected {expected}", describe_byte(.found))]
    Unexpected {
        found: u8,
        offset: u64,
        expected: &'static str,
    },

    #[error("expected a value at byte {offset}, found {found}")]
    ExpectedValue { found: TokenKind, offset: u64 },

    #[error("invalid escape sequence at byte {offset}")]
    InvalidEscape { offset: u64 },

    #[error("string ending at byte {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: u64 },

    #[error("unescaped control character in string at byte {offset}")]
    ControlCharacter { offset: u64 },

    #[error("malformed literal {text:?} at byte {offset}")]
    InvalidLiteral { text: String, offset: u64 },

    #[error("trailing data after the top-level value at byte {offset}")]
    TrailingData { offset: u64 },
}

/// Failure of [`Scanner::decode_next`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The cursor is desynchronized; nothing after this point can be read.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The value was skipped over cleanly but did not match the target type.
    #[error("value does not match the expected shape: {0}")]
    Malformed(#[source] serde_json::Error),
}

fn describe_byte(b: &u8) -> String {
    if b.is_ascii_graphic() {
        format!("'{}'", *b as char)
    } else {
        format!("byte 0x{:02X}", b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

/// What the grammar allows at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    TopValue,
    Finished,
    /// Just after `[`: a value or `]`
    FirstElement,
    /// Just after a `,` in an array: a value
    Element,
    /// After an array element: `,` or `]`
    AfterElement,
    /// Just after `{`: a key or `}`
    FirstKey,
    /// Just after a `,` in an object: a key
    Key,
    /// After a key and its `:`: a value
    MemberValue,
    /// After a member value: `,` or `}`
    AfterMember,
}

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Forward-only, single-pass JSON tokenizer over a buffered reader.
pub struct Scanner<R> {
    reader: R,
    offset: u64,
    stack: Vec<Container>,
    expect: Expect,
    /// Bytes of the value being captured for [`Scanner::decode_next`]
    capture: Option<Vec<u8>>,
    spare: Vec<u8>,
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            stack: Vec::new(),
            expect: Expect::TopValue,
            capture: None,
            spare: Vec::new(),
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next token.
    ///
    /// Returns `Ok(None)` once the top-level value is complete and only
    /// whitespace remains, or for an empty document.
    pub fn next_token(&mut self) -> Result<Option<Token>, ScanError> {
        self.step(true)
    }

    /// Report the kind of the next token without consuming it.
    pub fn peek_kind(&mut self) -> Result<Option<TokenKind>, ScanError> {
        let Some(b) = self.prepare()? else {
            return Ok(None);
        };
        let kind = match b {
            b'"' if matches!(self.expect, Expect::FirstKey | Expect::Key) => TokenKind::Key,
            b'"' => TokenKind::Str,
            b'{' => TokenKind::BeginObject,
            b'}' => TokenKind::EndObject,
            b'[' => TokenKind::BeginArray,
            b']' => TokenKind::EndArray,
            b if is_literal_start(b) => TokenKind::Literal,
            b => return Err(self.unexpected(b, "a JSON value")),
        };
        Ok(Some(kind))
    }

    /// Whether the currently open array or object has another element.
    ///
    /// Does not consume the element. At the top level this reports whether
    /// any value remains.
    pub fn has_more(&mut self) -> Result<bool, ScanError> {
        Ok(!matches!(self.prepare()?, None | Some(b'}') | Some(b']')))
    }

    /// Skip exactly one value of any shape, leaving the cursor just past
    /// its last byte.
    pub fn skip_value(&mut self) -> Result<(), ScanError> {
        self.require_value_position()?;
        let depth = self.stack.len();
        match self.step(false)? {
            Some(Token::BeginObject | Token::BeginArray) => {
                while self.stack.len() > depth {
                    if self.step(false)?.is_none() {
                        return Err(self.eof());
                    }
                }
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(self.eof()),
        }
    }

    /// Decode exactly one value into `T`.
    ///
    /// The value's bytes are buffered and handed to `serde_json`. A shape
    /// mismatch is reported as [`DecodeError::Malformed`] with the cursor
    /// already positioned after the value.
    pub fn decode_next<T: DeserializeOwned>(&mut self) -> Result<T, DecodeError> {
        let raw = self.capture_value()?;
        let decoded = serde_json::from_slice(&raw).map_err(DecodeError::Malformed);
        self.spare = raw;
        decoded
    }

    fn capture_value(&mut self) -> Result<Vec<u8>, ScanError> {
        self.require_value_position()?;
        let mut buf = std::mem::take(&mut self.spare);
        buf.clear();
        self.capture = Some(buf);
        let skipped = self.skip_value();
        let buf = self.capture.take().unwrap_or_default();
        skipped.map(|()| buf)
    }

    fn require_value_position(&mut self) -> Result<(), ScanError> {
        match self.peek_kind()? {
            None => Err(self.eof()),
            Some(kind @ (TokenKind::Key | TokenKind::EndObject | TokenKind::EndArray)) => {
                Err(ScanError::ExpectedValue {
                    found: kind,
                    offset: self.offset,
                })
            }
            Some(_) => Ok(()),
        }
    }

    /// Consume whitespace and separators up to the start of the next token
    /// and return its first byte. Idempotent.
    fn prepare(&mut self) -> Result<Option<u8>, ScanError> {
        if self.offset == 0 && self.expect == Expect::TopValue {
            self.skip_bom()?;
        }
        loop {
            self.skip_whitespace()?;
            let b = match self.peek_byte()? {
                Some(b) => b,
                None if self.stack.is_empty() => return Ok(None),
                None => return Err(self.eof()),
            };
            match self.expect {
                Expect::Finished => return Err(ScanError::TrailingData { offset: self.offset }),
                Expect::AfterElement => match b {
                    b',' => {
                        self.bump(b);
                        self.expect = Expect::Element;
                    }
                    b']' => return Ok(Some(b)),
                    _ => return Err(self.unexpected(b, "',' or ']'")),
                },
                Expect::AfterMember => match b {
                    b',' => {
                        self.bump(b);
                        self.expect = Expect::Key;
                    }
                    b'}' => return Ok(Some(b)),
                    _ => return Err(self.unexpected(b, "',' or '}'")),
                },
                _ => return Ok(Some(b)),
            }
        }
    }

    fn step(&mut self, materialize: bool) -> Result<Option<Token>, ScanError> {
        let Some(b) = self.prepare()? else {
            return Ok(None);
        };
        match self.expect {
            Expect::FirstKey | Expect::Key => match b {
                b'"' => {
                    let key = self.read_string(materialize)?;
                    self.skip_whitespace()?;
                    match self.peek_byte()? {
                        Some(b':') => self.bump(b':'),
                        Some(other) => return Err(self.unexpected(other, "':'")),
                        None => return Err(self.eof()),
                    }
                    self.expect = Expect::MemberValue;
                    Ok(Some(Token::Key(key)))
                }
                b'}' if self.expect == Expect::FirstKey => {
                    self.bump(b);
                    self.close();
                    Ok(Some(Token::EndObject))
                }
                _ => Err(self.unexpected(b, "an object key")),
            },
            Expect::FirstElement if b == b']' => {
                self.bump(b);
                self.close();
                Ok(Some(Token::EndArray))
            }
            // prepare() only stops on the closing bracket in these states
            Expect::AfterElement => {
                self.bump(b);
                self.close();
                Ok(Some(Token::EndArray))
            }
            Expect::AfterMember => {
                self.bump(b);
                self.close();
                Ok(Some(Token::EndObject))
            }
            _ => self.read_value(b, materialize).map(Some),
        }
    }

    fn read_value(&mut self, first: u8, materialize: bool) -> Result<Token, ScanError> {
        match first {
            b'{' => {
                self.bump(first);
                self.stack.push(Container::Object);
                self.expect = Expect::FirstKey;
                Ok(Token::BeginObject)
            }
            b'[' => {
                self.bump(first);
                self.stack.push(Container::Array);
                self.expect = Expect::FirstElement;
                Ok(Token::BeginArray)
            }
            b'"' => {
                let s = self.read_string(materialize)?;
                self.end_value();
                Ok(Token::Str(s))
            }
            b if is_literal_start(b) => {
                let text = self.read_literal()?;
                self.end_value();
                Ok(Token::Literal(text))
            }
            b => Err(self.unexpected(b, "a JSON value")),
        }
    }

    fn close(&mut self) {
        self.stack.pop();
        self.end_value();
    }

    fn end_value(&mut self) {
        self.expect = match self.stack.last() {
            Some(Container::Object) => Expect::AfterMember,
            Some(Container::Array) => Expect::AfterElement,
            None => Expect::Finished,
        };
    }

    /// Read a string starting at its opening quote. Returns an empty
    /// string without allocating when `materialize` is false.
    fn read_string(&mut self, materialize: bool) -> Result<String, ScanError> {
        self.bump(b'"');
        let mut out = Vec::new();
        loop {
            let b = self.require_byte()?;
            match b {
                b'"' => break,
                b'\\' => self.read_escape(materialize.then_some(&mut out))?,
                0x00..=0x1F => {
                    return Err(ScanError::ControlCharacter {
                        offset: self.offset - 1,
                    })
                }
                _ if materialize => out.push(b),
                _ => {}
            }
        }
        if !materialize {
            return Ok(String::new());
        }
        String::from_utf8(out).map_err(|_| ScanError::InvalidUtf8 {
            offset: self.offset,
        })
    }

    /// Read the escape following a backslash and append its character to
    /// `out`, if any.
    fn read_escape(&mut self, mut out: Option<&mut Vec<u8>>) -> Result<(), ScanError> {
        let at = self.offset - 1;
        let ch = match self.require_byte()? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.read_unicode_escape(at, out),
            _ => return Err(ScanError::InvalidEscape { offset: at }),
        };
        push_char(&mut out, ch);
        Ok(())
    }

    /// `\uXXXX`, joining surrogate pairs. Any four hex digits are valid
    /// JSON; an unpaired surrogate decodes to U+FFFD.
    fn read_unicode_escape(
        &mut self,
        at: u64,
        mut out: Option<&mut Vec<u8>>,
    ) -> Result<(), ScanError> {
        let mut code = self.read_hex4(at)?;
        if out.is_none() {
            return Ok(());
        }
        while (0xD800..=0xDBFF).contains(&code) {
            if self.peek_byte()? != Some(b'\\') {
                push_char(&mut out, char::REPLACEMENT_CHARACTER);
                return Ok(());
            }
            self.bump(b'\\');
            let next_at = self.offset - 1;
            if self.peek_byte()? != Some(b'u') {
                push_char(&mut out, char::REPLACEMENT_CHARACTER);
                return self.read_escape(out);
            }
            self.bump(b'u');
            let low = self.read_hex4(next_at)?;
            if (0xDC00..=0xDFFF).contains(&low) {
                code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                break;
            }
            // Lone high surrogate; decode the second escape on its own
            push_char(&mut out, char::REPLACEMENT_CHARACTER);
            code = low;
        }
        push_char(
            &mut out,
            char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
        );
        Ok(())
    }

    fn read_hex4(&mut self, at: u64) -> Result<u32, ScanError> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = (self.require_byte()? as char)
                .to_digit(16)
                .ok_or(ScanError::InvalidEscape { offset: at })?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn read_literal(&mut self) -> Result<String, ScanError> {
        let start = self.offset;
        let mut text = Vec::new();
        while let Some(b) = self.peek_byte()? {
            if !(b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')) {
                break;
            }
            self.bump(b);
            text.push(b);
        }
        let valid = match text.as_slice() {
            b"true" | b"false" | b"null" => true,
            number => is_json_number(number),
        };
        let text = String::from_utf8_lossy(&text).into_owned();
        if valid {
            Ok(text)
        } else {
            Err(ScanError::InvalidLiteral {
                text,
                offset: start,
            })
        }
    }

    fn skip_bom(&mut self) -> Result<(), ScanError> {
        if self.reader.fill_buf()?.starts_with(&UTF8_BOM) {
            self.reader.consume(UTF8_BOM.len());
            self.offset += UTF8_BOM.len() as u64;
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) -> Result<(), ScanError> {
        while let Some(b) = self.peek_byte()? {
            if !matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                break;
            }
            self.bump(b);
        }
        Ok(())
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, ScanError> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Consume `b`, which the caller has just peeked.
    fn bump(&mut self, b: u8) {
        self.reader.consume(1);
        self.offset += 1;
        if let Some(capture) = self.capture.as_mut() {
            capture.push(b);
        }
    }

    fn require_byte(&mut self) -> Result<u8, ScanError> {
        match self.peek_byte()? {
            Some(b) => {
                self.bump(b);
                Ok(b)
            }
            None => Err(self.eof()),
        }
    }

    fn eof(&self) -> ScanError {
        ScanError::UnexpectedEof {
            offset: self.offset,
        }
    }

    fn unexpected(&self, found: u8, expected: &'static str) -> ScanError {
        ScanError::Unexpected {
            found,
            offset: self.offset,
            expected,
        }
    }
}

fn push_char(out: &mut Option<&mut Vec<u8>>, ch: char) {
    if let Some(out) = out.as_deref_mut() {
        let mut utf8 = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
    }
}

fn is_literal_start(b: u8) -> bool {
    matches!(b, b'-' | b'0'..=b'9' | b't' | b'f' | b'n')
}

fn is_json_number(s: &[u8]) -> bool {
    let digits_from = |mut i: usize| {
        while matches!(s.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
        i
    };

    let mut i = usize::from(s.first() == Some(&b'-'));
    match s.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i = digits_from(i + 1),
        _ => return false,
    }
    if s.get(i) == Some(&b'.') {
        let end = digits_from(i + 1);
        if end == i + 1 {
            return false;
        }
        i = end;
    }
    if matches!(s.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(s.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let end = digits_from(i);
        if end == i {
            return false;
        }
        i = end;
    }
    i == s.len()
}
