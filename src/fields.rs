//! Decoders for the simpler tagged fields.
//!
//! Each decoder takes a [`RawField`] and reports failures at its line.

use crate::bic::Bic;
use crate::error::{Error, Result};
use crate::iban::Iban;
use crate::notation::{Notation, Subfields};
use crate::tokenizer::RawField;
use crate::types::{Balance, BalanceType, DebitCredit};
use chrono::{DateTime, FixedOffset, NaiveDate};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

fn notation(pattern: &str) -> Notation {
    Notation::compile(pattern).expect("static notation")
}

static REFERENCE: Lazy<Notation> = Lazy::new(|| notation("16x"));
static ACCOUNT: Lazy<Notation> = Lazy::new(|| notation("35x"));
static STATEMENT_NUMBER: Lazy<Notation> = Lazy::new(|| notation("5n[/5n]"));
static BALANCE: Lazy<Notation> = Lazy::new(|| notation("1!a6!n3!a15d"));
static FLOOR_LIMIT: Lazy<Notation> = Lazy::new(|| notation("3!a[1!a]15d"));
static DATE_TIME: Lazy<Notation> = Lazy::new(|| notation("6!n4!n1!x4!n"));
static ENTRY_SUMMARY: Lazy<Notation> = Lazy::new(|| notation("5n3!a15d"));
static VALUE_DATE_AMOUNT: Lazy<Notation> = Lazy::new(|| notation("6!n3!a15d"));
static CURRENCY_AMOUNT: Lazy<Notation> = Lazy::new(|| notation("3!a15d"));
static PARTY: Lazy<Notation> = Lazy::new(|| notation("[/34x\n]4*35x"));
static BANK_OPERATION: Lazy<Notation> = Lazy::new(|| notation("4!c"));
static CHARGES: Lazy<Notation> = Lazy::new(|| notation("3!a"));
static NARRATIVE: Lazy<Notation> = Lazy::new(|| notation("6*65x"));

/// Run `decode` on the field content, attaching the field line to errors.
fn at_field<T>(field: &RawField, decode: impl FnOnce(&str) -> Result<T>) -> Result<T> {
    decode(field.content()).map_err(|e| e.at_line(field.line()))
}

fn required<'a>(subfields: &'a Subfields, index: usize) -> &'a str {
    subfields.get(index).unwrap_or_default()
}

/// Parse a `YYMMDD` date. Years below 50 fall in the 2000s.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let invalid = || Error::InvalidDate {
        line: None,
        value: text.to_string(),
    };
    if text.len() != 6 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let number = |range: std::ops::Range<usize>| text.get(range).and_then(|s| s.parse::<u32>().ok());
    let (Some(year), Some(month), Some(day)) = (number(0..2), number(2..4), number(4..6)) else {
        return Err(invalid());
    };
    let year = year as i32;
    let full_year = if year < 50 { 2000 + year } else { 1900 + year };
    NaiveDate::from_ymd_opt(full_year, month, day).ok_or_else(invalid)
}

/// Parse a SWIFT decimal such as `1234,56` or `100,`.
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let normalized = text.replace(',', ".");
    let normalized = normalized.strip_suffix('.').unwrap_or(&normalized);
    Decimal::from_str(normalized).map_err(|_| Error::InvalidAmount {
        line: None,
        value: text.to_string(),
    })
}

/// `:20:` / `:21:` reference.
pub fn reference(field: &RawField) -> Result<String> {
    at_field(field, |content| Ok(required(&REFERENCE.parse(content)?, 0).to_string()))
}

/// `:25:` account identification.
pub fn account(field: &RawField) -> Result<String> {
    at_field(field, |content| Ok(required(&ACCOUNT.parse(content)?, 0).to_string()))
}

/// `:28C:` statement number with optional sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementNumber {
    pub number: String,
    pub sequence: Option<String>,
}

impl StatementNumber {
    pub fn parse(text: &str) -> Result<Self> {
        let subfields = STATEMENT_NUMBER.parse(text)?;
        Ok(StatementNumber {
            number: required(&subfields, 0).to_string(),
            sequence: subfields.get(1).map(str::to_string),
        })
    }
}

/// `number/sequence`, or the number alone.
impl fmt::Display for StatementNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sequence {
            Some(sequence) => write!(f, "{}/{}", self.number, sequence),
            None => f.write_str(&self.number),
        }
    }
}

pub fn statement_number(field: &RawField) -> Result<StatementNumber> {
    at_field(field, StatementNumber::parse)
}

/// Balance fields `:60F:`, `:60M:`, `:62F:`, `:62M:`, `:64:` and `:65:`.
pub fn balance(field: &RawField) -> Result<Balance> {
    at_field(field, |content| {
        let balance_type = BalanceType::from_tag(field.tag()).ok_or_else(|| Error::NotationMismatch {
            line: None,
            notation: BALANCE.as_str().to_string(),
            message: format!(":{}: is not a balance field", field.tag()),
        })?;
        let subfields = BALANCE.parse(content)?;
        Ok(Balance {
            balance_type,
            debit_credit: debit_credit(required(&subfields, 0), &BALANCE)?,
            date: parse_date(required(&subfields, 1))?,
            currency: required(&subfields, 2).to_string(),
            amount: parse_amount(required(&subfields, 3))?,
        })
    })
}

fn debit_credit(code: &str, notation: &Notation) -> Result<DebitCredit> {
    code.parse().map_err(|message| Error::NotationMismatch {
        line: None,
        notation: notation.as_str().to_string(),
        message,
    })
}

/// `:34F:` floor limit indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorLimit {
    pub currency: String,
    /// Absent when the limit applies to debits and credits alike.
    pub debit_credit: Option<DebitCredit>,
    pub amount: Decimal,
}

pub fn floor_limit(field: &RawField) -> Result<FloorLimit> {
    at_field(field, |content| {
        let subfields = FLOOR_LIMIT.parse(content)?;
        Ok(FloorLimit {
            currency: required(&subfields, 0).to_string(),
            debit_credit: subfields.get(1).map(|m| debit_credit(m, &FLOOR_LIMIT)).transpose()?,
            amount: parse_amount(required(&subfields, 2))?,
        })
    })
}

/// `:13D:` date/time indication, `YYMMDDHHMM±HHMM`.
pub fn date_time_indication(field: &RawField) -> Result<DateTime<FixedOffset>> {
    at_field(field, |content| {
        let subfields = DATE_TIME.parse(content)?;
        let invalid = || Error::InvalidDate {
            line: None,
            value: content.to_string(),
        };
        let date = parse_date(required(&subfields, 0))?;
        let hhmm = |text: &str| -> Option<(u32, u32)> {
            Some((text.get(0..2)?.parse().ok()?, text.get(2..4)?.parse().ok()?))
        };
        let (hour, minute) = hhmm(required(&subfields, 1)).ok_or_else(invalid)?;
        let (offset_hours, offset_minutes) = hhmm(required(&subfields, 3)).ok_or_else(invalid)?;
        let offset_seconds = (offset_hours * 3600 + offset_minutes * 60) as i32;
        let offset = match required(&subfields, 2) {
            "+" => FixedOffset::east_opt(offset_seconds),
            "-" => FixedOffset::west_opt(offset_seconds),
            _ => None,
        }
        .ok_or_else(invalid)?;
        date.and_hms_opt(hour, minute, 0)
            .and_then(|local| local.and_local_timezone(offset).single())
            .ok_or_else(invalid)
    })
}

/// `:90D:` / `:90C:` number and sum of entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub count: u32,
    pub currency: String,
    pub amount: Decimal,
}

pub fn entry_summary(field: &RawField) -> Result<EntrySummary> {
    at_field(field, |content| {
        let subfields = ENTRY_SUMMARY.parse(content)?;
        let count = required(&subfields, 0);
        Ok(EntrySummary {
            count: count.parse().map_err(|_| Error::InvalidAmount {
                line: None,
                value: count.to_string(),
            })?,
            currency: required(&subfields, 1).to_string(),
            amount: parse_amount(required(&subfields, 2))?,
        })
    })
}

/// `:32A:` value date, currency and interbank settled amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDateAmount {
    pub value_date: NaiveDate,
    pub currency: String,
    pub amount: Decimal,
}

pub fn value_date_amount(field: &RawField) -> Result<ValueDateAmount> {
    at_field(field, |content| {
        let subfields = VALUE_DATE_AMOUNT.parse(content)?;
        Ok(ValueDateAmount {
            value_date: parse_date(required(&subfields, 0))?,
            currency: required(&subfields, 1).to_string(),
            amount: parse_amount(required(&subfields, 2))?,
        })
    })
}

/// `:33B:` currency and instructed amount.
pub fn currency_amount(field: &RawField) -> Result<(String, Decimal)> {
    at_field(field, |content| {
        let subfields = CURRENCY_AMOUNT.parse(content)?;
        Ok((required(&subfields, 0).to_string(), parse_amount(required(&subfields, 1))?))
    })
}

/// Ordering customer, beneficiary or institution: optional `/account` line
/// followed by up to four lines of name, address or BIC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Party {
    pub account: Option<String>,
    pub lines: Vec<String>,
}

impl Party {
    /// The account as an IBAN, when it is one.
    pub fn account_iban(&self) -> Option<Iban> {
        self.account.as_deref().and_then(|a| Iban::of(a).ok())
    }

    pub fn name(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }
}

pub fn party(field: &RawField) -> Result<Party> {
    at_field(field, |content| {
        let subfields = PARTY.parse(content)?;
        Ok(Party {
            account: subfields.get(0).map(str::to_string),
            lines: required(&subfields, 1).split('\n').map(str::to_string).collect(),
        })
    })
}

/// BIC of an `A`-option institution field (`:52A:`, `:57A:`, ...).
pub fn institution_bic(field: &RawField) -> Result<Bic> {
    let party = party(field)?;
    let last = party.lines.last().map(String::as_str).unwrap_or_default();
    Bic::of(last).map_err(|e| e.at_line(field.line()))
}

/// `:23B:` bank operation code such as `CRED`.
pub fn bank_operation_code(field: &RawField) -> Result<String> {
    at_field(field, |content| Ok(required(&BANK_OPERATION.parse(content)?, 0).to_string()))
}

/// Who bears the transfer charges (`:71A:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChargeBearer {
    /// `OUR`
    Ordering,
    /// `SHA`
    Shared,
    /// `BEN`
    Beneficiary,
}

pub fn charges(field: &RawField) -> Result<ChargeBearer> {
    at_field(field, |content| {
        let subfields = CHARGES.parse(content)?;
        match required(&subfields, 0) {
            "OUR" => Ok(ChargeBearer::Ordering),
            "SHA" => Ok(ChargeBearer::Shared),
            "BEN" => Ok(ChargeBearer::Beneficiary),
            other => Err(Error::NotationMismatch {
                line: None,
                notation: CHARGES.as_str().to_string(),
                message: format!("unknown charge code '{}'", other),
            }),
        }
    })
}

/// Free text of up to six lines (`:86:` at statement level, `:70:`, `:72:`).
pub fn narrative(field: &RawField) -> Result<String> {
    at_field(field, |content| Ok(required(&NARRATIVE.parse(content)?, 0).to_string()))
}

/// Fetch a mandatory field from a page or fail with [`Error::MissingField`].
pub(crate) fn mandatory<'p>(page: &'p crate::page::Page, tags: &[&str]) -> Result<&'p RawField> {
    page.field_any(tags).ok_or_else(|| Error::MissingField {
        line: page.line(),
        tag: tags.join("/"),
    })
}
