//! Structured `:86:` narratives (BCS).
//!
//! A BCS narrative starts with a three or four character business
//! transaction code followed by `<delimiter><id><content>` groups, where the
//! id is two digits. The delimiter is whatever character follows the code,
//! usually `?`.
//!
//! ```
//! use swift_mt::narrative::BcsMessage;
//!
//! let bcs = BcsMessage::parse("166?00GUTSCHRIFT?20EREF+123\n?32JANE DOE")?;
//! assert_eq!(bcs.business_transaction_code(), "166");
//! assert_eq!(bcs.booking_text(), Some("GUTSCHRIFT"));
//! assert_eq!(bcs.counterparty_name().as_deref(), Some("JANE DOE"));
//! # Ok::<(), swift_mt::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::notation::Notation;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

static CODE: Lazy<Notation> = Lazy::new(|| Notation::compile("4c").expect("static notation"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BcsMessage {
    business_transaction_code: String,
    fields: BTreeMap<String, String>,
}

impl BcsMessage {
    /// Decode a narrative. Line breaks are not significant and are removed
    /// before decoding.
    pub fn parse(text: &str) -> Result<Self> {
        let text: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();

        let (code, rest) = CODE.parse_prefix(&text)?;
        let code = code.get(0).unwrap_or_default();
        if code.len() < 3 {
            return Err(Error::NotationMismatch {
                line: None,
                notation: CODE.as_str().to_string(),
                message: format!("business transaction code '{}' is shorter than 3 characters", code),
            });
        }

        let mut fields = BTreeMap::new();
        if let Some(delimiter) = rest.chars().next() {
            let mut offset = 0;
            // every piece after the first (empty) one is an `<id><content>` group
            for group in rest.split(delimiter).skip(1) {
                let remainder = &rest[offset..];
                offset += delimiter.len_utf8() + group.len();

                let id = group.get(0..2).filter(|id| id.chars().all(|c| c.is_ascii_digit()));
                let Some(id) = id else {
                    return Err(Error::UnparsedRemainder {
                        line: None,
                        remainder: remainder.to_string(),
                    });
                };
                if fields.insert(id.to_string(), group[2..].to_string()).is_some() {
                    return Err(Error::DuplicateField {
                        line: None,
                        id: id.to_string(),
                    });
                }
            }
        }

        trace!(code, fields = fields.len(), "decoded BCS narrative");
        Ok(BcsMessage {
            business_transaction_code: code.to_string(),
            fields,
        })
    }

    pub fn business_transaction_code(&self) -> &str {
        &self.business_transaction_code
    }

    /// Content of the group with the two-digit `id`.
    pub fn field(&self, id: &str) -> Option<&str> {
        self.fields.get(id).map(String::as_str)
    }

    /// All groups, ordered by id.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Posting text (`00`).
    pub fn booking_text(&self) -> Option<&str> {
        self.field("00")
    }

    /// Remittance information, groups `20` to `29` joined in order.
    pub fn purpose(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .fields
            .range("20".to_string()..="29".to_string())
            .map(|(_, content)| content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    }

    pub fn counterparty_bic(&self) -> Option<&str> {
        self.field("30")
    }

    pub fn counterparty_account(&self) -> Option<&str> {
        self.field("31")
    }

    /// Counterparty name, spread over groups `32` and `33`.
    pub fn counterparty_name(&self) -> Option<String> {
        match (self.field("32"), self.field("33")) {
            (None, None) => None,
            (first, second) => Some(format!("{}{}", first.unwrap_or_default(), second.unwrap_or_default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_groups() {
        let bcs = BcsMessage::parse("166?00GUTSCHRIFT?109075/629?20EREF+174?21SVWZ+Invoice 1").unwrap();
        assert_eq!(bcs.business_transaction_code(), "166");
        assert_eq!(bcs.fields().len(), 4);
        assert_eq!(bcs.field("10"), Some("9075/629"));
        assert_eq!(bcs.purpose().as_deref(), Some("EREF+174SVWZ+Invoice 1"));
    }

    #[test]
    fn test_line_breaks_are_removed() {
        let bcs = BcsMessage::parse("051?00UEBERWEIS\nUNG?20PART\nONE").unwrap();
        assert_eq!(bcs.booking_text(), Some("UEBERWEISUNG"));
        assert_eq!(bcs.field("20"), Some("PARTONE"));
    }

    #[test]
    fn test_delimiter_is_taken_from_text() {
        let bcs = BcsMessage::parse("NMSC/30DEUTDEFF/31DE44500105175407324931").unwrap();
        assert_eq!(bcs.business_transaction_code(), "NMSC");
        assert_eq!(bcs.counterparty_bic(), Some("DEUTDEFF"));
        assert_eq!(bcs.counterparty_account(), Some("DE44500105175407324931"));
    }

    #[test]
    fn test_code_only() {
        let bcs = BcsMessage::parse("835").unwrap();
        assert!(bcs.fields().is_empty());
        assert_eq!(bcs.purpose(), None);
        assert_eq!(bcs.counterparty_name(), None);
    }

    #[test]
    fn test_duplicate_id() {
        let err = BcsMessage::parse("166?20A?20B").unwrap_err();
        assert!(matches!(err, Error::DuplicateField { ref id, .. } if id == "20"), "{err}");
    }

    #[rstest]
    #[case("166?00OK?X1BAD", "?X1BAD")]
    #[case("166?00OK?", "?")]
    #[case("166?2", "?2")]
    fn test_unparsed_remainder(#[case] text: &str, #[case] remainder: &str) {
        match BcsMessage::parse(text) {
            Err(Error::UnparsedRemainder { remainder: actual, .. }) => assert_eq!(actual, remainder),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_short_code() {
        assert!(matches!(
            BcsMessage::parse("16?00X"),
            Err(Error::NotationMismatch { .. })
        ));
    }
}
