//! CSV export of statement lines.
//!
//! One row per `:61:` entry, with the narrative decoded as BCS when possible.

use crate::error::Result;
use crate::mt940_format::Mt940Statement;
use crate::mt942_format::Mt942Report;
use crate::types::{EntryDate, TransactionGroup};
use csv::Writer;
use serde::Serialize;
use std::io::Write;

/// Statement lines of one account, ready to be written as CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvStatement {
    pub account: String,
    pub currency: String,
    pub transactions: Vec<TransactionGroup>,
}

/// CSV transaction record structure.
#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    #[serde(rename = "Account")]
    account: &'a str,
    #[serde(rename = "Value Date")]
    value_date: String,
    #[serde(rename = "Entry Date")]
    entry_date: String,
    #[serde(rename = "Mark")]
    mark: &'static str,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Currency")]
    currency: &'a str,
    #[serde(rename = "Transaction Type")]
    transaction_type: String,
    #[serde(rename = "Reference")]
    reference: &'a str,
    #[serde(rename = "Bank Reference")]
    bank_reference: &'a str,
    #[serde(rename = "Purpose")]
    purpose: String,
    #[serde(rename = "Counterparty")]
    counterparty: String,
    #[serde(rename = "Counterparty Account")]
    counterparty_account: String,
}

impl CsvStatement {
    /// Write the statement lines to any destination implementing `Write`.
    ///
    /// # Examples
    ///
    /// ```
    /// use swift_mt::csv_format::CsvStatement;
    /// use swift_mt::mt940_format::Mt940Reader;
    ///
    /// let input = ":20:S1\n:25:ACC\n:28C:1\n:60F:C230101EUR1,\n:61:230101C1,NTRFREF\n:62F:C230101EUR2,\n-\n";
    /// let statement = Mt940Reader::new(input.as_bytes()).read_all()?.remove(0);
    /// let mut out = Vec::new();
    /// CsvStatement::from(&statement).write_to(&mut out)?;
    /// assert_eq!(String::from_utf8_lossy(&out).lines().count(), 2);
    /// # Ok::<(), swift_mt::Error>(())
    /// ```
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_transactions(writer, &self.account, &self.currency, &self.transactions)
    }
}

impl From<&Mt940Statement> for CsvStatement {
    fn from(statement: &Mt940Statement) -> Self {
        CsvStatement {
            account: statement.account().to_string(),
            currency: statement.currency().to_string(),
            transactions: statement.transactions().to_vec(),
        }
    }
}

impl From<&Mt942Report> for CsvStatement {
    fn from(report: &Mt942Report) -> Self {
        CsvStatement {
            account: report.account().to_string(),
            currency: report.currency().to_string(),
            transactions: report.transactions().to_vec(),
        }
    }
}

/// Write `groups` as CSV rows with a header line.
pub fn write_transactions<W: Write>(
    writer: &mut W,
    account: &str,
    currency: &str,
    groups: &[TransactionGroup],
) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    write_rows(&mut csv_writer, account, currency, groups)?;
    csv_writer.flush()?;
    Ok(())
}

/// Write several statements under a single header line.
pub fn write_statements<W: Write>(writer: &mut W, statements: &[CsvStatement]) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    for statement in statements {
        write_rows(&mut csv_writer, &statement.account, &statement.currency, &statement.transactions)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn write_rows<W: Write>(
    csv_writer: &mut Writer<W>,
    account: &str,
    currency: &str,
    groups: &[TransactionGroup],
) -> Result<()> {
    for group in groups {
        let entry = group.entry();
        // narratives that are not BCS go to the purpose column verbatim
        let bcs = group.narrative().and_then(|n| n.bcs().ok());
        let purpose = match (&bcs, group.narrative()) {
            (Some(bcs), _) => bcs.purpose().unwrap_or_default(),
            (None, Some(narrative)) => narrative.text.replace('\n', " "),
            (None, None) => String::new(),
        };

        let record = CsvRecord {
            account,
            value_date: entry.value_date.format("%Y-%m-%d").to_string(),
            entry_date: match entry.entry_date {
                Some(EntryDate::Date(date)) => date.format("%Y-%m-%d").to_string(),
                Some(EntryDate::MonthDay(month_day)) => month_day.to_string(),
                None => String::new(),
            },
            mark: entry.mark.code(),
            amount: entry.amount.to_string(),
            currency,
            transaction_type: entry.transaction_type.to_string(),
            reference: &entry.reference_owner,
            bank_reference: entry.reference_bank.as_deref().unwrap_or_default(),
            purpose,
            counterparty: bcs.as_ref().and_then(|b| b.counterparty_name()).unwrap_or_default(),
            counterparty_account: bcs
                .as_ref()
                .and_then(|b| b.counterparty_account())
                .unwrap_or_default()
                .to_string(),
        };

        csv_writer.serialize(record)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement_line::decode_content;
    use crate::types::Narrative;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn group(content: &str, narrative: Option<&str>) -> TransactionGroup {
        TransactionGroup::new(
            decode_content(content).unwrap(),
            narrative.map(|text| Narrative {
                text: text.to_string(),
                line: 1,
            }),
        )
    }

    fn written(groups: &[TransactionGroup]) -> Vec<String> {
        let mut out = Vec::new();
        write_transactions(&mut out, "DE44500105175407324931", "EUR", groups).unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_header_and_bcs_row() {
        let lines = written(&[group(
            "2301020102D150,00NTRFNONREF//B1",
            Some("166?00UEBERWEISUNG?20INVOICE 42?31DE89370400440532013000?32ACME GMBH"),
        )]);
        assert_eq!(
            lines[0],
            "Account,Value Date,Entry Date,Mark,Amount,Currency,Transaction Type,Reference,Bank Reference,Purpose,Counterparty,Counterparty Account"
        );
        assert_eq!(
            lines[1],
            "DE44500105175407324931,2023-01-02,01-02,D,150.00,EUR,NTRF,NONREF,B1,INVOICE 42,ACME GMBH,DE89370400440532013000"
        );
    }

    #[test]
    fn test_free_text_narrative_and_resolved_date() {
        let mut entry = decode_content("230102RC5,S103REF").unwrap();
        entry.entry_date = Some(EntryDate::Date(NaiveDate::from_ymd_opt(2023, 1, 3).unwrap()));
        let groups = vec![
            TransactionGroup::new(entry, None),
            group("230102C7,NTRFX", Some("PLAIN\nTEXT")),
        ];
        let lines = written(&groups);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(",2023-01-03,RC,5,EUR,S103,REF,,,,"), "{}", lines[1]);
        assert!(lines[2].contains(",PLAIN TEXT,"), "{}", lines[2]);
    }

    #[test]
    fn test_statements_share_one_header() {
        let statements = vec![
            CsvStatement {
                account: "A1".into(),
                currency: "EUR".into(),
                transactions: vec![group("230102C7,NTRFX", None)],
            },
            CsvStatement {
                account: "A2".into(),
                currency: "USD".into(),
                transactions: vec![group("230103D8,NCHGY", None)],
            },
        ];
        let mut out = Vec::new();
        write_statements(&mut out, &statements).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("A1,2023-01-02,,C,7,EUR,"));
        assert!(lines[2].starts_with("A2,2023-01-03,,D,8,USD,"));
    }
}
