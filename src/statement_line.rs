//! `:61:` statement line decoder.
//!
//! Layout: `6!n[4!n]2a[1!a]15d1!a3!c16x[//16x]` with an optional second
//! line `34x`. The debit/credit mark is one or two letters and is followed
//! by an optional one-letter funds code, which no greedy notation can split.
//! The mark is therefore read by hand between two notations.

use crate::error::{Error, Result};
use crate::fields::{parse_amount, parse_date};
use crate::notation::Notation;
use crate::tokenizer::RawField;
use crate::transaction_code::TransactionTypeCode;
use crate::types::{DebitCreditMark, EntryDate, MonthDay, Narrative, TransactionEntry, TransactionGroup};
use once_cell::sync::Lazy;
use tracing::trace;

static DATES: Lazy<Notation> = Lazy::new(|| Notation::compile("6!n[4!n]").expect("static notation"));
static DETAILS: Lazy<Notation> =
    Lazy::new(|| Notation::compile("[1!a]15d1!a3!c16x[//16x]").expect("static notation"));
static SUPPLEMENTARY: Lazy<Notation> = Lazy::new(|| Notation::compile("34x").expect("static notation"));

/// Decode a `:61:` field, reporting errors at its line.
pub fn decode(field: &RawField) -> Result<TransactionEntry> {
    decode_content(field.content()).map_err(|e| e.at_line(field.line()))
}

/// Decode the content of a statement line.
///
/// ```
/// use swift_mt::statement_line::decode_content;
/// use swift_mt::types::DebitCreditMark;
///
/// let entry = decode_content("2302010202D150,00NTRFNONREF//B1\nRENT FEB")?;
/// assert_eq!(entry.mark, DebitCreditMark::Debit);
/// assert_eq!(entry.reference_bank.as_deref(), Some("B1"));
/// assert_eq!(entry.supplementary_details.as_deref(), Some("RENT FEB"));
/// # Ok::<(), swift_mt::Error>(())
/// ```
pub fn decode_content(content: &str) -> Result<TransactionEntry> {
    let (first, second) = match content.split_once('\n') {
        Some((first, second)) => (first, Some(second)),
        None => (content, None),
    };

    let (dates, rest) = DATES.parse_prefix(first)?;
    let value_date = parse_date(dates.get(0).unwrap_or_default())?;
    let entry_date = dates
        .get(1)
        .map(MonthDay::parse)
        .transpose()?
        .map(EntryDate::MonthDay);

    let mark_len = if rest.starts_with('R') { 2 } else { 1 };
    let Some(mark) = rest.get(..mark_len) else {
        return Err(Error::NotationMismatch {
            line: None,
            notation: "2a".to_string(),
            message: format!("missing debit/credit mark in '{}'", first),
        });
    };
    let mark: DebitCreditMark = mark.parse()?;

    let details = DETAILS.parse(&rest[mark_len..])?;
    let transaction_type: TransactionTypeCode = format!(
        "{}{}",
        details.get(2).unwrap_or_default(),
        details.get(3).unwrap_or_default()
    )
    .parse()?;

    let supplementary_details = second
        .map(|line| SUPPLEMENTARY.parse(line))
        .transpose()?
        .and_then(|subfields| subfields.get(0).map(str::to_string));

    let entry = TransactionEntry {
        value_date,
        entry_date,
        mark,
        funds_code: details.get(0).and_then(|code| code.chars().next()),
        amount: parse_amount(details.get(1).unwrap_or_default())?,
        transaction_type,
        reference_owner: details.get(4).unwrap_or_default().to_string(),
        reference_bank: details.get(5).map(str::to_string),
        supplementary_details,
    };
    trace!(%value_date, amount = %entry.amount, "decoded statement line");
    Ok(entry)
}

/// Pair each `:61:` of a page with the `:86:` directly following it.
///
/// Other fields are ignored, so a statement-level `:86:` after the closing
/// balance never becomes a transaction narrative.
pub(crate) fn transaction_groups(fields: &[RawField]) -> Result<Vec<TransactionGroup>> {
    let mut groups = Vec::new();
    let mut fields = fields.iter().peekable();
    while let Some(field) = fields.next() {
        if field.tag() != "61" {
            continue;
        }
        let entry = decode(field)?;
        let narrative = fields.next_if(|next| next.tag() == "86").map(|next| Narrative {
            text: next.content().to_string(),
            line: next.line(),
        });
        groups.push(TransactionGroup::new(entry, narrative));
    }
    Ok(groups)
}

/// The `:86:` of a page that does not belong to a statement line.
pub(crate) fn statement_information(fields: &[RawField]) -> Option<&RawField> {
    fields
        .windows(2)
        .filter(|pair| pair[1].tag() == "86" && pair[0].tag() != "61")
        .map(|pair| &pair[1])
        .last()
}
