//! International Bank Account Number.
//!
//! The check digits are never trusted: every constructor recomputes them from
//! the country code and BBAN and rejects the value on disagreement.

use crate::error::{Error, Result};
use crate::notation::Notation;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

static IBAN: Lazy<Notation> = Lazy::new(|| Notation::compile("2!a2!n30c").expect("static notation"));

/// A validated IBAN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Iban {
    country: String,
    check_digits: String,
    bban: String,
}

impl Iban {
    /// Build an IBAN from its parts, validating the check digits.
    pub fn new(country: &str, check_digits: &str, bban: &str) -> Result<Self> {
        let expected = calculate_check_digits(country, bban)?;
        if expected != check_digits {
            return Err(Error::ChecksumMismatch {
                line: None,
                expected,
                actual: check_digits.to_string(),
            });
        }
        Ok(Iban {
            country: country.to_string(),
            check_digits: check_digits.to_string(),
            bban: bban.to_string(),
        })
    }

    /// Parse an IBAN, ignoring any whitespace such as the usual groups of four.
    ///
    /// # Examples
    ///
    /// ```
    /// use swift_mt::iban::Iban;
    ///
    /// let iban = Iban::of("DE44 5001 0517 5407 3249 31")?;
    /// assert_eq!(iban.country(), "DE");
    /// assert_eq!(iban.bban(), "500105175407324931");
    /// # Ok::<(), swift_mt::Error>(())
    /// ```
    pub fn of(text: &str) -> Result<Self> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let subfields = IBAN.parse(&compact)?;
        Iban::new(
            subfields.get(0).unwrap_or_default(),
            subfields.get(1).unwrap_or_default(),
            subfields.get(2).unwrap_or_default(),
        )
    }

    /// Check a compact IBAN without keeping the value.
    pub fn ensure_valid(text: &str) -> Result<()> {
        let subfields = IBAN.parse(text)?;
        let country = subfields.get(0).unwrap_or_default();
        let actual = subfields.get(1).unwrap_or_default();
        let expected = calculate_check_digits(country, subfields.get(2).unwrap_or_default())?;
        if expected != actual {
            return Err(Error::ChecksumMismatch {
                line: None,
                expected,
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn check_digits(&self) -> &str {
        &self.check_digits
    }

    pub fn bban(&self) -> &str {
        &self.bban
    }

    /// Print form: groups of four characters separated by spaces.
    pub fn formatted(&self) -> String {
        let compact = self.to_string();
        compact
            .as_bytes()
            .chunks(4)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Iban {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.country, self.check_digits, self.bban)
    }
}

impl FromStr for Iban {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Iban::of(s)
    }
}

/// Compute the two check digits for `country` and `bban`.
///
/// The rearranged string `bban ++ country ++ "00"` is read as a number with
/// letters standing for `10..=35`; the digits are `98 - (number mod 97)`.
pub fn calculate_check_digits(country: &str, bban: &str) -> Result<String> {
    let mut remainder: u32 = 0;
    for c in bban.chars().chain(country.chars()).chain("00".chars()) {
        remainder = match c {
            '0'..='9' => (remainder * 10 + c as u32 - '0' as u32) % 97,
            'A'..='Z' => (remainder * 100 + c as u32 - 55) % 97,
            _ => {
                return Err(Error::NotationMismatch {
                    line: None,
                    notation: IBAN.as_str().to_string(),
                    message: format!("invalid IBAN character '{}'", c.escape_debug()),
                })
            }
        };
    }
    Ok(format!("{:02}", 98 - remainder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_of_strips_whitespace() {
        let iban = Iban::of("DE44 5001 0517 5407 3249 31").unwrap();
        assert_eq!(iban.country(), "DE");
        assert_eq!(iban.check_digits(), "44");
        assert_eq!(iban.bban(), "500105175407324931");
        assert_eq!(iban.to_string(), "DE44500105175407324931");
        assert_eq!(iban.formatted(), "DE44 5001 0517 5407 3249 31");
    }

    #[rstest]
    #[case("GB", "NWBK60161331926819", "29")]
    #[case("DE", "500105175407324931", "44")]
    #[case("NL", "ABNA0417164300", "91")]
    fn test_calculate_check_digits(#[case] country: &str, #[case] bban: &str, #[case] digits: &str) {
        assert_eq!(calculate_check_digits(country, bban).unwrap(), digits);
    }

    #[rstest]
    #[case("FR", "30006000011234567890189")]
    #[case("BE", "539007547034")]
    #[case("CH", "0076201162385295")]
    fn test_checksum_round_trip(#[case] country: &str, #[case] bban: &str) {
        let digits = calculate_check_digits(country, bban).unwrap();
        let iban = Iban::of(&format!("{}{}{}", country, digits, bban)).unwrap();
        assert_eq!(iban.check_digits(), digits);
    }

    #[test]
    fn test_wrong_check_digits_rejected() {
        let err = Iban::of("DE45500105175407324931").unwrap_err();
        match err {
            Error::ChecksumMismatch { expected, actual, .. } => {
                assert_eq!(expected, "44");
                assert_eq!(actual, "45");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(Iban::ensure_valid("DE45500105175407324931").is_err());
        assert!(Iban::ensure_valid("DE44500105175407324931").is_ok());
    }

    #[test]
    fn test_malformed_iban_is_notation_mismatch() {
        assert!(matches!(Iban::of("D144500105"), Err(Error::NotationMismatch { .. })));
        assert!(matches!("".parse::<Iban>(), Err(Error::NotationMismatch { .. })));
    }

    #[test]
    fn test_new_validates() {
        assert!(Iban::new("GB", "29", "NWBK60161331926819").is_ok());
        assert!(Iban::new("GB", "28", "NWBK60161331926819").is_err());
    }
}
