//! MT942 interim transaction report.
//!
//! Intraday counterpart of MT940: no balances, but floor limits, a creation
//! timestamp and optional debit and credit entry summaries.

use crate::entry_date::{adjust_entry_dates, EntryDateResolver};
use crate::error::Result;
use crate::fields::{self, mandatory, EntrySummary, FloorLimit, StatementNumber};
use crate::grammar::{PageGrammar, MT942};
use crate::iban::Iban;
use crate::message::{Message, MessageReader};
use crate::page::Page;
use crate::statement_line::{statement_information, transaction_groups};
use crate::types::{DebitCredit, TransactionGroup};
use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::debug;

/// One page of an MT942 report.
#[derive(Debug, Clone, PartialEq)]
pub struct Mt942Report {
    page: Page,
    transaction_reference: String,
    related_reference: Option<String>,
    account: String,
    statement_number: StatementNumber,
    floor_limits: Vec<FloorLimit>,
    created_at: DateTime<FixedOffset>,
    transactions: Vec<TransactionGroup>,
    debit_summary: Option<EntrySummary>,
    credit_summary: Option<EntrySummary>,
    information: Option<String>,
}

pub type Mt942Reader<R> = MessageReader<R, Mt942Report>;

impl Message for Mt942Report {
    fn grammar() -> &'static PageGrammar {
        &MT942
    }

    fn from_page(page: Page) -> Result<Self> {
        let report = Mt942Report {
            transaction_reference: fields::reference(mandatory(&page, &["20"])?)?,
            related_reference: page.field("21").map(fields::reference).transpose()?,
            account: fields::account(mandatory(&page, &["25", "25P"])?)?,
            statement_number: fields::statement_number(mandatory(&page, &["28C"])?)?,
            floor_limits: page
                .fields_with_tag("34F")
                .map(fields::floor_limit)
                .collect::<Result<_>>()?,
            created_at: fields::date_time_indication(mandatory(&page, &["13D"])?)?,
            transactions: transaction_groups(page.fields())?,
            debit_summary: page.field("90D").map(fields::entry_summary).transpose()?,
            credit_summary: page.field("90C").map(fields::entry_summary).transpose()?,
            information: statement_information(page.fields())
                .map(fields::narrative)
                .transpose()?,
            page,
        };
        debug!(
            reference = %report.transaction_reference,
            transactions = report.transactions.len(),
            "MT942 report decoded"
        );
        Ok(report)
    }
}

impl Mt942Report {
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn source(&self) -> &str {
        self.page.source()
    }

    pub fn transaction_reference(&self) -> &str {
        &self.transaction_reference
    }

    pub fn related_reference(&self) -> Option<&str> {
        self.related_reference.as_deref()
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn account_iban(&self) -> Option<Iban> {
        Iban::of(&self.account).ok()
    }

    pub fn statement_number(&self) -> &StatementNumber {
        &self.statement_number
    }

    /// Floor limit applying to `direction`.
    ///
    /// A single `:34F:` without a mark applies to debits and credits alike.
    pub fn floor_limit(&self, direction: DebitCredit) -> Option<&FloorLimit> {
        self.floor_limits
            .iter()
            .find(|limit| limit.debit_credit == Some(direction))
            .or_else(|| self.floor_limits.iter().find(|limit| limit.debit_credit.is_none()))
    }

    /// Currency of the report, taken from the first floor limit.
    pub fn currency(&self) -> &str {
        self.floor_limits.first().map(|limit| limit.currency.as_str()).unwrap_or_default()
    }

    /// Creation time from `:13D:`.
    pub fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    /// Date the report refers to: the local date of `:13D:`.
    pub fn statement_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn transactions(&self) -> &[TransactionGroup] {
        &self.transactions
    }

    pub fn adjusted_transactions(&self, resolver: &dyn EntryDateResolver) -> Result<Vec<TransactionGroup>> {
        adjust_entry_dates(&self.transactions, self.statement_date(), resolver)
    }

    pub fn debit_summary(&self) -> Option<&EntrySummary> {
        self.debit_summary.as_ref()
    }

    pub fn credit_summary(&self) -> Option<&EntrySummary> {
        self.credit_summary.as_ref()
    }

    pub fn information(&self) -> Option<&str> {
        self.information.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_date::ShortestDelta;
    use crate::error::Error;
    use crate::types::EntryDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const REPORT: &str = "\
:20:INTRADAY1
:25:DE44500105175407324931
:28C:12/1
:34F:EURD10,
:34F:EURC20,
:13D:2301021530+0100
:61:2301020102C500,NTRFPAYIN
:86:166?00GUTSCHRIFT
:61:2301020102D80,NCHGFEES
:90D:1EUR80,
:90C:1EUR500,
:86:END OF REPORT
-
";

    fn read(input: &str) -> Result<Vec<Mt942Report>> {
        Mt942Reader::new(input.as_bytes()).read_all()
    }

    #[test]
    fn test_decode_report() {
        let report = read(REPORT).unwrap().remove(0);
        assert_eq!(report.transaction_reference(), "INTRADAY1");
        assert_eq!(report.statement_number().to_string(), "12/1");
        assert_eq!(report.floor_limit(DebitCredit::Credit).map(|l| l.amount), Some(Decimal::from(20)));
        assert_eq!(report.currency(), "EUR");
        assert_eq!(report.statement_date(), NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(report.transactions().len(), 2);
        assert_eq!(report.debit_summary().map(|s| s.count), Some(1));
        assert_eq!(report.credit_summary().map(|s| s.amount), Some(Decimal::from(500)));
        assert_eq!(report.information(), Some("END OF REPORT"));
    }

    #[test]
    fn test_single_floor_limit_applies_both_ways() {
        let input = REPORT.replace(":34F:EURD10,\n:34F:EURC20,\n", ":34F:EUR0,\n");
        let report = read(&input).unwrap().remove(0);
        assert_eq!(report.floor_limit(DebitCredit::Debit), report.floor_limit(DebitCredit::Credit));
        assert!(report.floor_limit(DebitCredit::Debit).is_some());
    }

    #[test]
    fn test_adjusted_against_creation_date() {
        let report = read(REPORT).unwrap().remove(0);
        let adjusted = report.adjusted_transactions(&ShortestDelta).unwrap();
        assert_eq!(
            adjusted[1].entry().entry_date,
            Some(EntryDate::Date(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()))
        );
    }

    #[test]
    fn test_missing_date_time_indication() {
        let input = REPORT.replace(":13D:2301021530+0100\n", "");
        let err = read(&input).unwrap_err();
        assert!(
            matches!(err, Error::UnexpectedField { ref expected, ref actual, .. } if actual == "61" && expected.contains(&"13D".to_string())),
            "{err}"
        );
    }
}
