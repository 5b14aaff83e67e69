//! SWIFT field notation engine.
//!
//! A notation such as `6!n[4!n]2a[1!a]15d` describes how the content of a
//! field splits into subfields:
//!
//! - `n!c` exactly `n` characters of charset `c`
//! - `nc` one up to `n` characters
//! - `n*mc` up to `n` lines of at most `m` characters, kept as one subfield
//! - `[...]` an optional group
//! - any other character is a literal delimiter
//!
//! Charsets are `a` (upper-case letters), `n` (digits), `c` (upper-case
//! letters and digits), `d` (decimal with a comma separator) and `x` (any
//! character except a line break).
//!
//! Matching is greedy and single-pass. A variable-length subfield stops at
//! its maximum length, at the first character outside its charset, or where
//! the next literal delimiter begins. Notations must be unambiguous under
//! those rules; nothing is ever backtracked.

use crate::error::{Error, Result};
use std::fmt;

/// Character class of a subfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Alpha,
    Numeric,
    Alphanumeric,
    Decimal,
    Any,
}

impl Charset {
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'a' => Some(Charset::Alpha),
            'n' => Some(Charset::Numeric),
            'c' => Some(Charset::Alphanumeric),
            'd' => Some(Charset::Decimal),
            'x' => Some(Charset::Any),
            _ => None,
        }
    }

    /// Notation symbol of this charset.
    pub fn symbol(self) -> char {
        match self {
            Charset::Alpha => 'a',
            Charset::Numeric => 'n',
            Charset::Alphanumeric => 'c',
            Charset::Decimal => 'd',
            Charset::Any => 'x',
        }
    }

    /// Whether `c` may appear in a subfield of this charset.
    pub fn accepts(self, c: char) -> bool {
        match self {
            Charset::Alpha => c.is_ascii_uppercase(),
            Charset::Numeric => c.is_ascii_digit(),
            Charset::Alphanumeric => c.is_ascii_uppercase() || c.is_ascii_digit(),
            Charset::Decimal => c.is_ascii_digit() || c == ',',
            Charset::Any => c != '\n' && c != '\r',
        }
    }
}

/// Length rule of a subfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Exact(usize),
    UpTo(usize),
    Lines { lines: usize, width: usize },
}

/// One subfield of a compiled notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subfield {
    pub charset: Charset,
    pub length: Length,
    /// Set for subfields inside an optional group.
    pub optional: bool,
}

impl Subfield {
    /// Multi-line subfields repeat their line pattern.
    pub fn is_repeatable(&self) -> bool {
        matches!(self.length, Length::Lines { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Element {
    Literal(String),
    Subfield(Subfield),
    Group(Vec<Element>),
}

/// A compiled notation. Immutable once built and safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notation {
    pattern: String,
    elements: Vec<Element>,
    subfields: Vec<Subfield>,
}

/// Ordered subfield values produced by [`Notation::parse`].
///
/// Absent optional subfields are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subfields(Vec<Option<String>>);

impl Subfields {
    /// Value of the subfield at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<String>] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Option<String>> {
        self.0
    }
}

impl From<Vec<Option<String>>> for Subfields {
    fn from(values: Vec<Option<String>>) -> Self {
        Subfields(values)
    }
}

/// Compile a notation string.
pub fn compile(pattern: &str) -> Result<Notation> {
    Notation::compile(pattern)
}

/// Split `text` into subfields according to `notation`.
pub fn parse(text: &str, notation: &Notation) -> Result<Subfields> {
    notation.parse(text)
}

impl Notation {
    /// Compile a notation string such as `"3!a15d"`.
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut compiler = Compiler {
            pattern,
            chars: pattern.chars().collect(),
            pos: 0,
        };
        let elements = compiler.sequence(false)?;
        if count_subfields(&elements) == 0 {
            return Err(compiler.invalid("no subfields"));
        }

        let mut subfields = Vec::new();
        collect_subfields(&elements, false, &mut subfields);

        Ok(Notation {
            pattern: pattern.to_string(),
            elements,
            subfields,
        })
    }

    /// The notation string this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Flattened subfields, in output order.
    pub fn subfields(&self) -> &[Subfield] {
        &self.subfields
    }

    /// Split the whole of `text` into subfields.
    ///
    /// Fails with [`Error::NotationMismatch`] if any text remains after the
    /// last subfield.
    pub fn parse(&self, text: &str) -> Result<Subfields> {
        let mut matcher = Matcher::new(self, text);
        matcher.sequence(&self.elements, None)?;
        if matcher.pos < matcher.chars.len() {
            let rest: String = matcher.chars[matcher.pos..].iter().collect();
            return Err(matcher.mismatch(format!(
                "unconsumed text '{}' at position {}",
                rest.escape_debug(),
                matcher.pos
            )));
        }
        Ok(Subfields(matcher.values))
    }

    /// Match a leading part of `text`, returning the subfields and the rest.
    pub fn parse_prefix<'t>(&self, text: &'t str) -> Result<(Subfields, &'t str)> {
        let mut matcher = Matcher::new(self, text);
        matcher.sequence(&self.elements, None)?;
        let offset = text
            .char_indices()
            .nth(matcher.pos)
            .map(|(byte, _)| byte)
            .unwrap_or(text.len());
        Ok((Subfields(matcher.values), &text[offset..]))
    }

    /// Rebuild field content from subfield values and the literal delimiters.
    ///
    /// An optional group is written only when one of its subfields is present.
    pub fn assemble(&self, subfields: &Subfields) -> String {
        let mut out = String::new();
        let mut index = 0;
        write_elements(&self.elements, subfields.as_slice(), &mut index, &mut out);
        out
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

struct Compiler<'a> {
    pattern: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Compiler<'_> {
    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidNotation {
            notation: self.pattern.to_string(),
            message: message.into(),
        }
    }

    fn sequence(&mut self, nested: bool) -> Result<Vec<Element>> {
        let mut elements = Vec::new();

        while let Some(&c) = self.chars.get(self.pos) {
            match c {
                '[' => {
                    self.pos += 1;
                    let group = self.sequence(true)?;
                    if count_subfields(&group) == 0 {
                        return Err(self.invalid("optional group without subfields"));
                    }
                    elements.push(Element::Group(group));
                }
                ']' if nested => {
                    self.pos += 1;
                    return Ok(elements);
                }
                ']' => return Err(self.invalid(format!("unbalanced ']' at position {}", self.pos))),
                c if c.is_ascii_digit() => elements.push(Element::Subfield(self.subfield()?)),
                c => {
                    self.pos += 1;
                    match elements.last_mut() {
                        Some(Element::Literal(text)) => text.push(c),
                        _ => elements.push(Element::Literal(c.to_string())),
                    }
                }
            }
        }

        if nested {
            return Err(self.invalid("unclosed '['"));
        }
        Ok(elements)
    }

    fn number(&mut self) -> Result<usize> {
        let start = self.pos;
        while self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        match digits.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.invalid(format!("invalid length '{}' at position {}", digits, start))),
        }
    }

    fn subfield(&mut self) -> Result<Subfield> {
        let count = self.number()?;
        let length = match self.chars.get(self.pos) {
            Some('!') => {
                self.pos += 1;
                Length::Exact(count)
            }
            Some('*') => {
                self.pos += 1;
                let width = self.number()?;
                Length::Lines { lines: count, width }
            }
            _ => Length::UpTo(count),
        };

        let charset = self
            .chars
            .get(self.pos)
            .copied()
            .and_then(Charset::from_symbol)
            .ok_or_else(|| self.invalid(format!("expected charset at position {}", self.pos)))?;
        self.pos += 1;

        Ok(Subfield {
            charset,
            length,
            optional: false,
        })
    }
}

struct Matcher<'a> {
    notation: &'a Notation,
    chars: Vec<char>,
    pos: usize,
    values: Vec<Option<String>>,
}

impl<'a> Matcher<'a> {
    fn new(notation: &'a Notation, text: &str) -> Self {
        Matcher {
            notation,
            chars: text.chars().collect(),
            pos: 0,
            values: Vec::with_capacity(notation.subfields.len()),
        }
    }

    fn mismatch(&self, message: String) -> Error {
        Error::NotationMismatch {
            line: None,
            notation: self.notation.pattern.clone(),
            message,
        }
    }

    fn starts_with(&self, literal: &str) -> bool {
        let mut at = self.pos;
        for expected in literal.chars() {
            if self.chars.get(at) != Some(&expected) {
                return false;
            }
            at += 1;
        }
        true
    }

    fn sequence(&mut self, elements: &[Element], follow: Option<&str>) -> Result<()> {
        for (i, element) in elements.iter().enumerate() {
            let rest = &elements[i + 1..];
            let stop = if rest.is_empty() { follow } else { leading_literal(rest) };

            match element {
                Element::Literal(literal) => self.literal(literal)?,
                Element::Subfield(subfield) => self.subfield(subfield, stop)?,
                Element::Group(group) => {
                    if self.enters(group) {
                        self.sequence(group, stop)?;
                    } else {
                        self.values
                            .extend(std::iter::repeat(None).take(count_subfields(group)));
                    }
                }
            }
        }
        Ok(())
    }

    fn enters(&self, group: &[Element]) -> bool {
        match group.first() {
            Some(Element::Literal(literal)) => self.starts_with(literal),
            Some(Element::Subfield(subfield)) => self
                .chars
                .get(self.pos)
                .is_some_and(|c| subfield.charset.accepts(*c)),
            Some(Element::Group(inner)) => self.enters(inner),
            None => false,
        }
    }

    fn literal(&mut self, literal: &str) -> Result<()> {
        if !self.starts_with(literal) {
            return Err(self.mismatch(format!(
                "expected '{}' at position {}",
                literal.escape_debug(),
                self.pos
            )));
        }
        self.pos += literal.chars().count();
        Ok(())
    }

    fn subfield(&mut self, subfield: &Subfield, stop: Option<&str>) -> Result<()> {
        let start = self.pos;
        let symbol = subfield.charset.symbol();

        match subfield.length {
            Length::Exact(n) => {
                let remaining = self.chars.len() - self.pos;
                if remaining < n {
                    return Err(self.mismatch(format!(
                        "expected {}!{} at position {}, only {} characters left",
                        n, symbol, start, remaining
                    )));
                }
                for offset in 0..n {
                    let c = self.chars[self.pos + offset];
                    if !subfield.charset.accepts(c) {
                        return Err(self.mismatch(format!(
                            "invalid character '{}' at position {} for {}!{}",
                            c.escape_debug(),
                            self.pos + offset,
                            n,
                            symbol
                        )));
                    }
                }
                self.pos += n;
            }
            Length::UpTo(n) => {
                self.take_run(subfield.charset, n, stop);
                if self.pos == start {
                    return Err(self.empty_subfield(start, &format!("{}{}", n, symbol)));
                }
            }
            Length::Lines { lines, width } => {
                let mut count = 0;
                loop {
                    let line_start = self.pos;
                    self.take_run(subfield.charset, width, stop);
                    if self.pos == line_start {
                        if count == 0 {
                            return Err(self.empty_subfield(start, &format!("{}*{}{}", lines, width, symbol)));
                        }
                        // give the line break back, it belongs to what follows
                        self.pos -= 1;
                        break;
                    }
                    count += 1;
                    if count == lines
                        || self.chars.get(self.pos) != Some(&'\n')
                        || self.pos + 1 >= self.chars.len()
                    {
                        break;
                    }
                    self.pos += 1;
                }
            }
        }

        let value: String = self.chars[start..self.pos].iter().collect();
        if subfield.charset == Charset::Decimal && value.starts_with(',') {
            return Err(self.mismatch(format!("decimal '{}' at position {} has no integer part", value, start)));
        }
        self.values.push(Some(value));
        Ok(())
    }

    fn empty_subfield(&self, at: usize, token: &str) -> Error {
        match self.chars.get(at) {
            Some(c) => self.mismatch(format!(
                "invalid character '{}' at position {} for {}",
                c.escape_debug(),
                at,
                token
            )),
            None => self.mismatch(format!("missing {} at position {}", token, at)),
        }
    }

    fn take_run(&mut self, charset: Charset, max: usize, stop: Option<&str>) {
        let mut taken = 0;
        let mut separators = 0;
        while taken < max {
            let Some(&c) = self.chars.get(self.pos) else {
                break;
            };
            if !charset.accepts(c) || stop.is_some_and(|s| self.starts_with(s)) {
                break;
            }
            if charset == Charset::Decimal && c == ',' {
                if separators == 1 {
                    break;
                }
                separators += 1;
            }
            self.pos += 1;
            taken += 1;
        }
    }
}

fn leading_literal(elements: &[Element]) -> Option<&str> {
    match elements.first() {
        Some(Element::Literal(literal)) => Some(literal),
        Some(Element::Group(group)) => leading_literal(group),
        _ => None,
    }
}

fn count_subfields(elements: &[Element]) -> usize {
    elements
        .iter()
        .map(|e| match e {
            Element::Literal(_) => 0,
            Element::Subfield(_) => 1,
            Element::Group(group) => count_subfields(group),
        })
        .sum()
}

fn collect_subfields(elements: &[Element], optional: bool, out: &mut Vec<Subfield>) {
    for element in elements {
        match element {
            Element::Literal(_) => {}
            Element::Subfield(subfield) => out.push(Subfield {
                optional,
                ..*subfield
            }),
            Element::Group(group) => collect_subfields(group, true, out),
        }
    }
}

fn write_elements(elements: &[Element], values: &[Option<String>], index: &mut usize, out: &mut String) {
    for element in elements {
        match element {
            Element::Literal(literal) => out.push_str(literal),
            Element::Subfield(_) => {
                if let Some(Some(value)) = values.get(*index) {
                    out.push_str(value);
                }
                *index += 1;
            }
            Element::Group(group) => {
                let n = count_subfields(group);
                let end = (*index + n).min(values.len());
                let present = values
                    .get(*index..end)
                    .is_some_and(|group_values| group_values.iter().any(Option::is_some));
                if present {
                    write_elements(group, values, index, out);
                } else {
                    *index += n;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn values(subfields: &Subfields) -> Vec<Option<&str>> {
        subfields.as_slice().iter().map(|v| v.as_deref()).collect()
    }

    #[test]
    fn test_compile_flattens_subfields() {
        let notation = Notation::compile("6!n[4!n]2a15d").unwrap();
        let subfields = notation.subfields();
        assert_eq!(subfields.len(), 4);
        assert_eq!(subfields[0].length, Length::Exact(6));
        assert!(!subfields[0].optional);
        assert!(subfields[1].optional);
        assert_eq!(subfields[2].charset, Charset::Alpha);
        assert_eq!(subfields[3].length, Length::UpTo(15));
    }

    #[test]
    fn test_compile_multi_line() {
        let notation = Notation::compile("4*35x").unwrap();
        assert_eq!(notation.subfields()[0].length, Length::Lines { lines: 4, width: 35 });
        assert!(notation.subfields()[0].is_repeatable());
    }

    #[rstest]
    #[case::unclosed_group("3!a[1!a")]
    #[case::unbalanced_bracket("3!a]")]
    #[case::unknown_charset("3!q")]
    #[case::zero_length("0!n")]
    #[case::literal_only("//")]
    #[case::empty_group("3!a[/]")]
    fn test_compile_rejects(#[case] pattern: &str) {
        assert!(matches!(
            Notation::compile(pattern),
            Err(Error::InvalidNotation { .. })
        ));
    }

    #[rstest]
    #[case("6!n4!n2a1!a15d", "2301150115CRN123,45", vec![Some("230115"), Some("0115"), Some("CR"), Some("N"), Some("123,45")])]
    #[case("5n[/5n]", "12/3", vec![Some("12"), Some("3")])]
    #[case("5n[/5n]", "00012", vec![Some("00012"), None])]
    #[case("3!a[1!a]15d", "EURD5,", vec![Some("EUR"), Some("D"), Some("5,")])]
    #[case("3!a[1!a]15d", "EUR100,5", vec![Some("EUR"), None, Some("100,5")])]
    #[case("16x[//16x]", "NONREF//8327000090", vec![Some("NONREF"), Some("8327000090")])]
    #[case("16x[//16x]", "MY REF", vec![Some("MY REF"), None])]
    #[case("[/34x\n]4*35x", "/DE44500105175407324931\nJOHN DOE\nMAIN ST 1", vec![Some("DE44500105175407324931"), Some("JOHN DOE\nMAIN ST 1")])]
    #[case("[/34x\n]4*35x", "JOHN DOE", vec![None, Some("JOHN DOE")])]
    fn test_parse_and_reassemble(#[case] pattern: &str, #[case] text: &str, #[case] expected: Vec<Option<&str>>) {
        let notation = compile(pattern).unwrap();
        let subfields = parse(text, &notation).unwrap();
        assert_eq!(values(&subfields), expected);
        assert_eq!(notation.assemble(&subfields), text);
    }

    #[rstest]
    #[case::too_short("6!n", "2301")]
    #[case::charset_violation("6!n", "23A115")]
    #[case::trailing_text("3!a", "EURX")]
    #[case::lowercase_alpha("3!a", "eur")]
    #[case::missing_group_delimiter("5n[/5n]", "12-3")]
    #[case::empty_bounded("3!a15d", "EUR")]
    #[case::leading_separator("15d", ",5")]
    #[case::double_separator("15d", "1,2,3")]
    #[case::line_too_long("2*3x", "ABCD")]
    #[case::too_many_lines("2*3x", "A\nB\nC")]
    fn test_parse_mismatch(#[case] pattern: &str, #[case] text: &str) {
        let notation = compile(pattern).unwrap();
        let err = notation.parse(text).unwrap_err();
        assert!(matches!(err, Error::NotationMismatch { line: None, .. }), "{err}");
    }

    #[test]
    fn test_entered_group_is_required() {
        // the digit opens the optional date group, which then needs all four
        let notation = compile("6!n[4!n]1!a").unwrap();
        assert!(notation.parse("23011501C").is_err());
        assert_eq!(values(&notation.parse("230115C").unwrap()), vec![Some("230115"), None, Some("C")]);
    }

    #[test]
    fn test_parse_prefix_returns_rest() {
        let notation = compile("6!n[4!n]").unwrap();
        let (subfields, rest) = notation.parse_prefix("2301150116RD12,00").unwrap();
        assert_eq!(values(&subfields), vec![Some("230115"), Some("0116")]);
        assert_eq!(rest, "RD12,00");
    }

    #[test]
    fn test_multi_line_keeps_line_breaks() {
        let notation = compile("3*5x").unwrap();
        let subfields = notation.parse("AB\nCD E\nF").unwrap();
        assert_eq!(subfields.get(0), Some("AB\nCD E\nF"));
    }

    #[test]
    fn test_mismatch_mentions_notation() {
        let err = compile("3!a").unwrap().parse("EU").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Notation mismatch for '3!a': expected 3!a at position 0, only 2 characters left"
        );
    }

    #[test]
    fn test_notation_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Notation>();
    }
}
