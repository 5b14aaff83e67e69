//! Line-oriented field tokenizer.
//!
//! Turns a character stream into tagged fields. A field starts at a line
//! beginning with `:<tag>:`; every following line that is not a field marker
//! continues it. Lines are pulled from the reader one at a time, so
//! multi-message files never have to be buffered whole.
//!
//! ```
//! use swift_mt::tokenizer::{FieldTokenizer, Token};
//!
//! let mut tokens = FieldTokenizer::new(":1:fizz\n:2:multi\r\nline".as_bytes());
//! match tokens.next() {
//!     Some(Ok(Token::Field(field))) => assert_eq!(field.content(), "fizz"),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use crate::error::{Error, Result};
use std::io::BufRead;
use tracing::{trace, warn};

/// A tagged field as found in the source, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    tag: String,
    content: String,
    line: usize,
    source: String,
}

impl RawField {
    /// Build a field directly. An empty `tag` fails with `MissingFieldTag`.
    pub fn new(tag: impl Into<String>, content: impl Into<String>, line: usize) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(Error::MissingFieldTag { line });
        }
        let content = content.into();
        let source = format!(":{}:{}\n", tag, content);
        Ok(RawField {
            tag,
            content,
            line,
            source,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Content after the marker, continuation lines joined with `\n`.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// 1-based line of the field marker.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The original lines of this field, line endings included.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Tokenizer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Field(RawField),
    /// A `-` or `-}` line closing the current message.
    EndOfMessage { line: usize },
}

/// Lazy iterator of [`Token`]s over a buffered reader.
///
/// Fused after the first error.
pub struct FieldTokenizer<R> {
    reader: R,
    line: usize,
    current: Option<RawField>,
    queued: Option<Token>,
    finished: bool,
}

impl<R: BufRead> FieldTokenizer<R> {
    pub fn new(reader: R) -> Self {
        FieldTokenizer {
            reader,
            line: 0,
            current: None,
            queued: None,
            finished: false,
        }
    }

    /// Number of lines read so far.
    pub fn line(&self) -> usize {
        self.line
    }

    fn read_line(&mut self) -> Result<Option<(String, String)>> {
        let mut bytes = Vec::new();
        if self.reader.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        let raw = decode_line(bytes);
        let text = raw.trim_end_matches('\n').trim_end_matches('\r').to_string();
        Ok(Some((raw, text)))
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(token) = self.queued.take() {
            return Ok(Some(token));
        }

        loop {
            let Some((raw, text)) = self.read_line()? else {
                return Ok(self.current.take().map(|field| Token::Field(finish(field))));
            };

            if let Some((tag, content)) = split_field_marker(&text) {
                let field = RawField {
                    tag: tag.to_string(),
                    content: content.to_string(),
                    line: self.line,
                    source: raw,
                };
                trace!(tag, line = self.line, "field marker");
                if let Some(previous) = self.current.replace(field) {
                    return Ok(Some(Token::Field(finish(previous))));
                }
                continue;
            }

            if is_message_trailer(&text) {
                let end = Token::EndOfMessage { line: self.line };
                return Ok(Some(match self.current.take() {
                    Some(previous) => {
                        self.queued = Some(end);
                        Token::Field(finish(previous))
                    }
                    None => end,
                }));
            }

            match self.current.as_mut() {
                Some(field) => {
                    field.content.push('\n');
                    field.content.push_str(&text);
                    field.source.push_str(&raw);
                }
                None if text.trim().is_empty() => {}
                None if is_envelope_header(&text) => {
                    warn!(line = self.line, "skipping SWIFT envelope header");
                }
                None => return Err(Error::MissingFieldTag { line: self.line }),
            }
        }
    }
}

impl<R: BufRead> Iterator for FieldTokenizer<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Lines that are not valid UTF-8 are read as Latin-1, one char per byte.
fn decode_line(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| e.into_bytes().into_iter().map(char::from).collect())
}

fn finish(mut field: RawField) -> RawField {
    let trimmed = field.content.trim_end_matches('\n').len();
    field.content.truncate(trimmed);
    field
}

/// Split `:<tag>:content` into tag and content.
fn split_field_marker(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix(':')?;
    let end = rest.find(':')?;
    let tag = &rest[..end];
    if tag.is_empty() || tag.len() > 5 || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((tag, &rest[end + 1..]))
}

fn is_message_trailer(line: &str) -> bool {
    let line = line.trim_end();
    line == "-" || line.starts_with("-}")
}

fn is_envelope_header(line: &str) -> bool {
    line.starts_with('{') && line.trim_end().ends_with("{4:")
}
