//! Domain records decoded from statement messages.

use crate::error::{Error, Result};
use crate::narrative::BcsMessage;
use crate::transaction_code::TransactionTypeCode;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Debit/Credit indicator of balances and floor limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebitCredit {
    /// Debit (outgoing).
    Debit,
    /// Credit (incoming).
    Credit,
}

impl FromStr for DebitCredit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "D" => Ok(DebitCredit::Debit),
            "C" => Ok(DebitCredit::Credit),
            _ => Err(format!("Invalid debit/credit indicator: {}", s)),
        }
    }
}

impl DebitCredit {
    /// SWIFT code of the indicator.
    pub fn code(&self) -> &'static str {
        match self {
            DebitCredit::Debit => "D",
            DebitCredit::Credit => "C",
        }
    }
}

/// Debit/credit mark of a statement line.
///
/// The reversal marks map crosswise: `RC` is a reversal debit and `RD` a
/// reversal credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebitCreditMark {
    Debit,
    Credit,
    ReversalDebit,
    ReversalCredit,
}

impl FromStr for DebitCreditMark {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "D" => Ok(DebitCreditMark::Debit),
            "C" => Ok(DebitCreditMark::Credit),
            "RC" => Ok(DebitCreditMark::ReversalDebit),
            "RD" => Ok(DebitCreditMark::ReversalCredit),
            _ => Err(Error::NotationMismatch {
                line: None,
                notation: "2a".to_string(),
                message: format!("invalid debit/credit mark '{}'", s),
            }),
        }
    }
}

impl DebitCreditMark {
    pub fn code(&self) -> &'static str {
        match self {
            DebitCreditMark::Debit => "D",
            DebitCreditMark::Credit => "C",
            DebitCreditMark::ReversalDebit => "RC",
            DebitCreditMark::ReversalCredit => "RD",
        }
    }
}

/// Kind of balance, derived from the field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceType {
    /// `:60F:`
    Opening,
    /// `:60M:`, opening balance of a continuation page.
    IntermediateOpening,
    /// `:62F:`
    Closing,
    /// `:62M:`
    IntermediateClosing,
    /// `:64:`
    ClosingAvailable,
    /// `:65:`
    ForwardAvailable,
}

impl BalanceType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "60F" => Some(BalanceType::Opening),
            "60M" => Some(BalanceType::IntermediateOpening),
            "62F" => Some(BalanceType::Closing),
            "62M" => Some(BalanceType::IntermediateClosing),
            "64" => Some(BalanceType::ClosingAvailable),
            "65" => Some(BalanceType::ForwardAvailable),
            _ => None,
        }
    }
}

/// Account statement balance information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Balance type (opening, closing, etc.).
    pub balance_type: BalanceType,

    /// Balance amount, never negative.
    pub amount: Decimal,

    /// Currency code.
    pub currency: String,

    /// Debit/Credit indicator.
    pub debit_credit: DebitCredit,

    /// Date of the balance.
    pub date: NaiveDate,
}

impl Balance {
    /// Amount with debit balances negated.
    pub fn signed_amount(&self) -> Decimal {
        match self.debit_credit {
            DebitCredit::Debit => -self.amount,
            DebitCredit::Credit => self.amount,
        }
    }
}

/// A date without its year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// February 29th is accepted; whether it exists depends on the year.
    pub fn new(month: u32, day: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(Error::InvalidDate {
                line: None,
                value: format!("{:02}{:02}", month, day),
            });
        }
        Ok(MonthDay { month, day })
    }

    /// Parse the `MMDD` form used in statement lines.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidDate {
            line: None,
            value: text.to_string(),
        };
        if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let month = text.get(0..2).and_then(|m| m.parse().ok()).ok_or_else(invalid)?;
        let day = text.get(2..4).and_then(|d| d.parse().ok()).ok_or_else(invalid)?;
        MonthDay::new(month, day)
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// The full date in `year`, if it exists.
    pub fn with_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

impl From<NaiveDate> for MonthDay {
    fn from(date: NaiveDate) -> Self {
        MonthDay {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Entry (booking) date of a statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryDate {
    /// As written in the message; the year still has to be resolved.
    MonthDay(MonthDay),
    Date(NaiveDate),
}

impl EntryDate {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            EntryDate::Date(date) => Some(*date),
            EntryDate::MonthDay(_) => None,
        }
    }
}

/// One decoded `:61:` statement line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// Value date, `YYMMDD` in the message.
    pub value_date: NaiveDate,
    /// Optional `MMDD` booking date, resolved to a full date by
    /// [`adjust_entry_dates`](crate::entry_date::adjust_entry_dates).
    pub entry_date: Option<EntryDate>,
    /// Debit, credit or one of the reversal marks.
    pub mark: DebitCreditMark,
    /// Third character of the currency code, when given.
    pub funds_code: Option<char>,
    /// Always non-negative; the direction is carried by `mark`.
    pub amount: Decimal,
    /// `N`/`F` plus a three-letter code, or `S` plus a message type.
    pub transaction_type: TransactionTypeCode,
    /// Reference for the account owner, `NONREF` when there is none.
    pub reference_owner: String,
    /// Reference of the servicing institution, after `//`.
    pub reference_bank: Option<String>,
    /// Free text on the line following the statement line.
    pub supplementary_details: Option<String>,
}

/// A `:86:` text together with the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    pub line: usize,
}

impl Narrative {
    /// Decode the text as a structured BCS message.
    pub fn bcs(&self) -> Result<BcsMessage> {
        BcsMessage::parse(&self.text).map_err(|e| e.at_line(self.line))
    }
}

/// A statement line and the narrative that follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionGroup {
    entry: TransactionEntry,
    narrative: Option<Narrative>,
}

impl TransactionGroup {
    pub fn new(entry: TransactionEntry, narrative: Option<Narrative>) -> Self {
        TransactionGroup { entry, narrative }
    }

    pub fn entry(&self) -> &TransactionEntry {
        &self.entry
    }

    pub fn narrative(&self) -> Option<&Narrative> {
        self.narrative.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_debit_credit() {
        assert_eq!("D".parse::<DebitCredit>().ok(), Some(DebitCredit::Debit));
        assert_eq!("C".parse::<DebitCredit>().ok(), Some(DebitCredit::Credit));
        assert!("X".parse::<DebitCredit>().is_err());
    }

    #[test]
    fn test_reversal_marks_are_crossed() {
        assert_eq!("RC".parse::<DebitCreditMark>().unwrap(), DebitCreditMark::ReversalDebit);
        assert_eq!("RD".parse::<DebitCreditMark>().unwrap(), DebitCreditMark::ReversalCredit);
        assert_eq!(DebitCreditMark::ReversalDebit.code(), "RC");
        assert!("R".parse::<DebitCreditMark>().is_err());
    }

    #[test]
    fn test_month_day() {
        let md = MonthDay::parse("0229").unwrap();
        assert_eq!(md.to_string(), "02-29");
        assert_eq!(md.with_year(2023), None);
        assert_eq!(md.with_year(2024), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(MonthDay::parse("1301").is_err());
        assert!(MonthDay::parse("0431").is_err());
        assert!(MonthDay::parse("12").is_err());
        assert!(MonthDay::parse("+101").is_err());
        assert!(MonthDay::parse("01+1").is_err());
    }

    #[test]
    fn test_signed_balance() {
        let balance = Balance {
            balance_type: BalanceType::Closing,
            amount: Decimal::new(1250, 2),
            currency: "EUR".into(),
            debit_credit: DebitCredit::Debit,
            date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        };
        assert_eq!(balance.signed_amount(), Decimal::new(-1250, 2));
    }

    #[test]
    fn test_balance_type_from_tag() {
        assert_eq!(BalanceType::from_tag("60M"), Some(BalanceType::IntermediateOpening));
        assert_eq!(BalanceType::from_tag("65"), Some(BalanceType::ForwardAvailable));
        assert_eq!(BalanceType::from_tag("61"), None);
    }
}
