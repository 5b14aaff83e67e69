//! Page assembler.
//!
//! Groups tokenized fields into pages, one complete message each, by walking
//! the message type's [`PageGrammar`] with one token of lookahead. A page
//! ends at a `-` trailer line or when the grammar is complete.
//!
//! Any violation is terminal for the reader: the error names the expected
//! tags, the tag actually found and its line, and later calls yield nothing.

use crate::error::{Error, Result};
use crate::grammar::{Cardinality, ElementKind, GrammarElement, PageGrammar};
use crate::tokenizer::{FieldTokenizer, RawField, Token};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// One complete message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    message_type: &'static str,
    line: usize,
    fields: Vec<RawField>,
    source: String,
}

impl Page {
    /// Build a page from already tokenized fields.
    pub fn new(message_type: &'static str, fields: Vec<RawField>) -> Self {
        let line = fields.first().map(RawField::line).unwrap_or(1);
        let source = fields.iter().map(RawField::source).collect();
        Page {
            message_type,
            line,
            fields,
            source,
        }
    }

    /// Name of the grammar this page was read with, e.g. `MT940`.
    pub fn message_type(&self) -> &'static str {
        self.message_type
    }

    /// 1-based line of the first field.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn fields(&self) -> &[RawField] {
        &self.fields
    }

    /// First field with `tag`.
    pub fn field(&self, tag: &str) -> Option<&RawField> {
        self.fields.iter().find(|f| f.tag() == tag)
    }

    /// First field with any of `tags`.
    pub fn field_any(&self, tags: &[&str]) -> Option<&RawField> {
        self.fields.iter().find(|f| tags.contains(&f.tag()))
    }

    pub fn fields_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a RawField> + 'a {
        self.fields.iter().filter(move |f| f.tag() == tag)
    }

    /// The original text of the message.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Fail with [`Error::UnexpectedField`] unless `field` carries one of `expected`.
pub fn ensure_valid_field(field: &RawField, expected: &BTreeSet<&str>) -> Result<()> {
    if expected.contains(field.tag()) {
        return Ok(());
    }
    Err(Error::UnexpectedField {
        line: field.line(),
        expected: expected.iter().map(|t| t.to_string()).collect(),
        actual: field.tag().to_string(),
    })
}

enum Peeked {
    Field(String),
    EndOfMessage,
    EndOfInput,
}

/// Fields of the page being assembled, plus the optional tags skipped since
/// the last accepted field; those are part of what could have come next.
#[derive(Default)]
struct PageBuilder {
    fields: Vec<RawField>,
    skipped: BTreeSet<&'static str>,
}

impl PageBuilder {
    fn accept(&mut self, field: RawField) {
        self.skipped.clear();
        self.fields.push(field);
    }

    fn skip(&mut self, element: &GrammarElement) {
        self.skipped.extend(element.first_tags());
    }

    fn expected(&self, tags: BTreeSet<&'static str>) -> BTreeSet<&'static str> {
        self.skipped.union(&tags).copied().collect()
    }
}

/// Reads pages of one message type from a buffered reader.
///
/// ```
/// use swift_mt::grammar::MT940;
/// use swift_mt::page::PageReader;
///
/// let input = ":20:REF\n:25:ACC\n:28C:1/1\n:60F:C230101EUR1,\n:62F:C230102EUR1,\n-\n";
/// let pages = PageReader::new(input.as_bytes(), &MT940).read_all()?;
/// assert_eq!(pages.len(), 1);
/// assert_eq!(pages[0].fields().len(), 5);
/// # Ok::<(), swift_mt::Error>(())
/// ```
pub struct PageReader<R> {
    tokens: FieldTokenizer<R>,
    grammar: &'static PageGrammar,
    lookahead: Option<Token>,
    failed: bool,
}

impl PageReader<BufReader<File>> {
    /// Open `path` for reading. The file is closed when the reader is dropped.
    pub fn open<P: AsRef<Path>>(path: P, grammar: &'static PageGrammar) -> Result<Self> {
        let file = File::open(path)?;
        Ok(PageReader::new(BufReader::new(file), grammar))
    }
}

impl<R: BufRead> PageReader<R> {
    pub fn new(reader: R, grammar: &'static PageGrammar) -> Self {
        PageReader {
            tokens: FieldTokenizer::new(reader),
            grammar,
            lookahead: None,
            failed: false,
        }
    }

    pub fn grammar(&self) -> &'static PageGrammar {
        self.grammar
    }

    /// Read the next page, or `None` at end of input.
    pub fn read(&mut self) -> Result<Option<Page>> {
        if self.failed {
            return Ok(None);
        }
        let result = self.read_page();
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    /// Read every remaining page.
    pub fn read_all(mut self) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        while let Some(page) = self.read()? {
            pages.push(page);
        }
        Ok(pages)
    }

    fn read_page(&mut self) -> Result<Option<Page>> {
        loop {
            match self.peek()? {
                Peeked::EndOfInput => return Ok(None),
                Peeked::EndOfMessage => {
                    self.advance()?;
                }
                Peeked::Field(_) => break,
            }
        }

        let mut builder = PageBuilder::default();
        self.sequence(self.grammar.elements, &mut builder)?;

        match self.peek()? {
            Peeked::EndOfMessage => {
                self.advance()?;
            }
            Peeked::Field(tag) if !self.grammar.opening_tags().contains(tag.as_str()) => {
                let expected = builder.expected(self.grammar.opening_tags());
                if let Some(Token::Field(field)) = self.advance()? {
                    ensure_valid_field(&field, &expected)?;
                }
            }
            _ => {}
        }

        let page = Page::new(self.grammar.name, builder.fields);
        debug!(
            message_type = page.message_type,
            line = page.line,
            fields = page.fields.len(),
            "page assembled"
        );
        Ok(Some(page))
    }

    fn peek(&mut self) -> Result<Peeked> {
        if self.lookahead.is_none() {
            self.lookahead = self.tokens.next().transpose()?;
        }
        Ok(match &self.lookahead {
            Some(Token::Field(field)) => Peeked::Field(field.tag().to_string()),
            Some(Token::EndOfMessage { .. }) => Peeked::EndOfMessage,
            None => Peeked::EndOfInput,
        })
    }

    fn advance(&mut self) -> Result<Option<Token>> {
        match self.lookahead.take() {
            Some(token) => Ok(Some(token)),
            None => self.tokens.next().transpose(),
        }
    }

    fn starts(&mut self, element: &GrammarElement) -> Result<bool> {
        Ok(match self.peek()? {
            Peeked::Field(tag) => element.starts_with(&tag),
            _ => false,
        })
    }

    fn sequence(&mut self, elements: &'static [GrammarElement], builder: &mut PageBuilder) -> Result<()> {
        for element in elements {
            self.element(element, builder)?;
        }
        Ok(())
    }

    fn element(&mut self, element: &'static GrammarElement, builder: &mut PageBuilder) -> Result<()> {
        match element.cardinality {
            Cardinality::Mandatory => self.once(element, builder),
            Cardinality::Optional => {
                if self.starts(element)? {
                    self.once(element, builder)
                } else {
                    builder.skip(element);
                    Ok(())
                }
            }
            Cardinality::Repeatable => {
                self.once(element, builder)?;
                while self.starts(element)? {
                    self.once(element, builder)?;
                }
                builder.skip(element);
                Ok(())
            }
            Cardinality::ZeroOrMore => {
                while self.starts(element)? {
                    self.once(element, builder)?;
                }
                builder.skip(element);
                Ok(())
            }
        }
    }

    fn once(&mut self, element: &'static GrammarElement, builder: &mut PageBuilder) -> Result<()> {
        match element.kind {
            ElementKind::Tag(_) => {
                let expected = builder.expected(element.first_tags());
                let field = self.expect_field(&expected)?;
                builder.accept(field);
                Ok(())
            }
            ElementKind::Group(elements) => self.sequence(elements, builder),
        }
    }

    fn expect_field(&mut self, expected: &BTreeSet<&'static str>) -> Result<RawField> {
        let missing = |line| Error::UnexpectedEndOfMessage {
            line,
            expected: expected.iter().map(|t| t.to_string()).collect(),
        };

        match self.advance()? {
            Some(Token::Field(field)) => {
                ensure_valid_field(&field, expected)?;
                Ok(field)
            }
            Some(Token::EndOfMessage { line }) => Err(missing(line)),
            None => Err(missing(self.tokens.line().max(1))),
        }
    }
}

impl<R: BufRead> Iterator for PageReader<R> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{MT103, MT940, MT942};
    use pretty_assertions::assert_eq;

    const STATEMENT: &str = "\
:20:STARTUMS
:25:DE44500105175407324931
:28C:101/1
:60F:C230101EUR1000,00
:61:2301020102DR12,50NTRFNONREF//B1
:86:166?00SEPA
:61:2301030103C100,NMSCNONREF
:62F:C230103EUR1087,50
-
";

    fn tags(page: &Page) -> Vec<&str> {
        page.fields().iter().map(RawField::tag).collect()
    }

    #[test]
    fn test_reads_one_page() {
        let pages = PageReader::new(STATEMENT.as_bytes(), &MT940).read_all().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(
            tags(&pages[0]),
            vec!["20", "25", "28C", "60F", "61", "86", "61", "62F"]
        );
        assert_eq!(pages[0].line(), 1);
        assert_eq!(pages[0].message_type(), "MT940");
        assert!(pages[0].source().starts_with(":20:STARTUMS\n:25:"));
        assert!(pages[0].source().ends_with(":62F:C230103EUR1087,50\n"));
    }

    #[test]
    fn test_pages_split_by_grammar_completion() {
        let input = ":20:A\n:25:X\n:28C:1\n:60F:C230101EUR1,\n:62F:C230101EUR1,\n\
                     :20:B\n:25:X\n:28C:2\n:60F:C230101EUR1,\n:62F:C230101EUR1,\n:86:done\n";
        let mut reader = PageReader::new(input.as_bytes(), &MT940);
        let first = reader.read().unwrap().unwrap();
        let second = reader.read().unwrap().unwrap();
        assert_eq!(first.field("20").unwrap().content(), "A");
        assert_eq!(second.field("20").unwrap().content(), "B");
        assert_eq!(second.field("86").unwrap().content(), "done");
        assert_eq!(second.line(), 6);
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn test_unexpected_field_reports_expected_set_and_line() {
        let input = ":20:A\n:28C:1\n";
        let err = PageReader::new(input.as_bytes(), &MT940).read().unwrap_err();
        match err {
            Error::UnexpectedField { line, expected, actual } => {
                assert_eq!(line, 2);
                assert_eq!(expected, vec!["21", "25", "25P"]);
                assert_eq!(actual, "28C");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_message_is_end_of_message() {
        let err = PageReader::new(":20:A\n".as_bytes(), &MT940).read().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEndOfMessage { line: 1, .. }), "{err}");
    }

    #[test]
    fn test_trailer_mid_grammar_is_end_of_message() {
        let input = ":20:A\n:25:X\n:28C:1\n-\n";
        let err = PageReader::new(input.as_bytes(), &MT940).read().unwrap_err();
        match err {
            Error::UnexpectedEndOfMessage { line, expected } => {
                assert_eq!(line, 4);
                assert_eq!(expected, vec!["60F", "60M"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_field_after_completion_must_open_a_page() {
        let input = ":20:A\n:25:X\n:28C:1\n:60F:C230101EUR1,\n:62F:C230101EUR1,\n:61:2301010101C1,NMSCX\n";
        let err = PageReader::new(input.as_bytes(), &MT940).read().unwrap_err();
        match err {
            Error::UnexpectedField { line, expected, actual } => {
                assert_eq!(line, 6);
                assert_eq!(expected, vec!["20", "64", "65", "86"]);
                assert_eq!(actual, "61");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reader_stops_after_failure() {
        let input = ":25:X\n:20:A\n";
        let mut reader = PageReader::new(input.as_bytes(), &MT940);
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_empty_input_and_stray_trailers() {
        assert!(PageReader::new("".as_bytes(), &MT940).read().unwrap().is_none());
        assert!(PageReader::new("-\n\n-\n".as_bytes(), &MT940).read().unwrap().is_none());
    }

    #[test]
    fn test_mt942_grammar() {
        let input = ":20:R\n:25:X\n:28C:1\n:34F:EURD100,\n:34F:EURC200,\n:13D:2301021200+0100\n:90D:0EUR0,\n-\n";
        let pages = PageReader::new(input.as_bytes(), &MT942).read_all().unwrap();
        assert_eq!(tags(&pages[0]), vec!["20", "25", "28C", "34F", "34F", "13D", "90D"]);
    }

    #[test]
    fn test_mt103_grammar() {
        let input = ":20:REF\n:23B:CRED\n:32A:230102EUR100,\n:50K:JOHN\n:59:JANE\n:71A:SHA\n-\n";
        let pages = PageReader::new(input.as_bytes(), &MT103).read_all().unwrap();
        assert_eq!(tags(&pages[0]), vec!["20", "23B", "32A", "50K", "59", "71A"]);
    }

    #[test]
    fn test_ensure_valid_field() {
        let field = RawField::new("61", "x", 9).unwrap();
        let expected: BTreeSet<&str> = ["62F", "62M"].into_iter().collect();
        let err = ensure_valid_field(&field, &expected).unwrap_err();
        assert_eq!(err.line(), Some(9));
        assert!(ensure_valid_field(&RawField::new("62M", "x", 9).unwrap(), &expected).is_ok());
    }
}
