//! MT940 customer statement.
//!
//! MT940 is the SWIFT end-of-day account statement. Each page carries the
//! opening and closing balance plus one `:61:` line per booked transaction,
//! optionally followed by a `:86:` narrative.

use crate::entry_date::{adjust_entry_dates, EntryDateResolver};
use crate::error::Result;
use crate::fields::{self, mandatory, StatementNumber};
use crate::grammar::{PageGrammar, MT940};
use crate::iban::Iban;
use crate::message::{Message, MessageReader};
use crate::page::Page;
use crate::statement_line::{statement_information, transaction_groups};
use crate::types::{Balance, TransactionGroup};
use chrono::NaiveDate;
use tracing::debug;

/// One page of an MT940 statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Mt940Statement {
    page: Page,
    transaction_reference: String,
    related_reference: Option<String>,
    account: String,
    statement_number: StatementNumber,
    opening_balance: Balance,
    transactions: Vec<TransactionGroup>,
    closing_balance: Balance,
    closing_available_balance: Option<Balance>,
    forward_available_balances: Vec<Balance>,
    information: Option<String>,
}

/// Reads MT940 statements one page at a time.
///
/// ```
/// use swift_mt::mt940_format::Mt940Reader;
///
/// let input = "\
/// :20:STMT1
/// :25:DE44500105175407324931
/// :28C:7/1
/// :60F:C230131EUR100,
/// :61:2302010201D25,NTRFNONREF
/// :86:166?00MIETE
/// :62F:C230201EUR75,
/// -
/// ";
/// let statements = Mt940Reader::new(input.as_bytes()).read_all()?;
/// assert_eq!(statements[0].statement_number().to_string(), "7/1");
/// assert_eq!(statements[0].transactions().len(), 1);
/// # Ok::<(), swift_mt::Error>(())
/// ```
pub type Mt940Reader<R> = MessageReader<R, Mt940Statement>;

impl Message for Mt940Statement {
    fn grammar() -> &'static PageGrammar {
        &MT940
    }

    fn from_page(page: Page) -> Result<Self> {
        let closing = mandatory(&page, &["62F", "62M"])?;
        let information = statement_information(page.fields()).map(fields::narrative).transpose()?;

        let statement = Mt940Statement {
            transaction_reference: fields::reference(mandatory(&page, &["20"])?)?,
            related_reference: page.field("21").map(fields::reference).transpose()?,
            account: fields::account(mandatory(&page, &["25", "25P"])?)?,
            statement_number: fields::statement_number(mandatory(&page, &["28C", "28"])?)?,
            opening_balance: fields::balance(mandatory(&page, &["60F", "60M"])?)?,
            transactions: transaction_groups(page.fields())?,
            closing_balance: fields::balance(closing)?,
            closing_available_balance: page.field("64").map(fields::balance).transpose()?,
            forward_available_balances: page
                .fields_with_tag("65")
                .map(fields::balance)
                .collect::<Result<_>>()?,
            information,
            page,
        };
        debug!(
            reference = %statement.transaction_reference,
            transactions = statement.transactions.len(),
            "MT940 statement decoded"
        );
        Ok(statement)
    }
}

impl Mt940Statement {
    /// The page this statement was decoded from.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Original message text.
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

    /// The account as an IBAN, when it is one.
    pub fn account_iban(&self) -> Option<Iban> {
        Iban::of(&self.account).ok()
    }

    pub fn statement_number(&self) -> &StatementNumber {
        &self.statement_number
    }

    pub fn opening_balance(&self) -> &Balance {
        &self.opening_balance
    }

    pub fn closing_balance(&self) -> &Balance {
        &self.closing_balance
    }

    pub fn closing_available_balance(&self) -> Option<&Balance> {
        self.closing_available_balance.as_ref()
    }

    pub fn forward_available_balances(&self) -> &[Balance] {
        &self.forward_available_balances
    }

    /// Statement-level `:86:` after the closing balance.
    pub fn information(&self) -> Option<&str> {
        self.information.as_deref()
    }

    /// Statement lines with entry dates as written.
    pub fn transactions(&self) -> &[TransactionGroup] {
        &self.transactions
    }

    /// Currency of the statement, taken from the opening balance.
    pub fn currency(&self) -> &str {
        &self.opening_balance.currency
    }

    /// Date the statement refers to: the closing balance date.
    pub fn statement_date(&self) -> NaiveDate {
        self.closing_balance.date
    }

    /// Statement lines with every entry date resolved against [`Self::statement_date`].
    pub fn adjusted_transactions(&self, resolver: &dyn EntryDateResolver) -> Result<Vec<TransactionGroup>> {
        adjust_entry_dates(&self.transactions, self.statement_date(), resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_date::ShortestDelta;
    use crate::error::Error;
    use crate::types::{BalanceType, DebitCredit, DebitCreditMark, EntryDate};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const STATEMENT: &str = "\
{1:F01BANKDEFFAXXX0000000000}{2:I940BANKDEFFXXXXN}{4:
:20:STARTUMSE
:21:REL1
:25:DE44500105175407324931
:28C:00101/001
:60F:C161230EUR1000,00
:61:1701020102D150,00NTRFNONREF//B1
SUPPLIER INVOICE
:86:166?00UEBERWEISUNG?20INVOICE 42?32ACME GMBH
:61:1612311231CR200,NCHKCHEQUE
:62F:C170102EUR1050,00
:64:C170102EUR1050,00
:65:C170103EUR1050,00
:65:C170104EUR1050,00
:86:STATEMENT INFO
-}
";

    fn read(input: &str) -> Result<Vec<Mt940Statement>> {
        Mt940Reader::new(input.as_bytes()).read_all()
    }

    #[test]
    fn test_decode_statement() {
        let statements = read(STATEMENT).unwrap();
        assert_eq!(statements.len(), 1);
        let statement = &statements[0];

        assert_eq!(statement.transaction_reference(), "STARTUMSE");
        assert_eq!(statement.related_reference(), Some("REL1"));
        assert_eq!(statement.account_iban().unwrap().country(), "DE");
        assert_eq!(statement.statement_number().to_string(), "00101/001");
        assert_eq!(statement.opening_balance().amount, Decimal::from(1000));
        assert_eq!(statement.closing_balance().balance_type, BalanceType::Closing);
        assert_eq!(statement.closing_balance().debit_credit, DebitCredit::Credit);
        assert_eq!(statement.closing_available_balance().map(|b| b.balance_type), Some(BalanceType::ClosingAvailable));
        assert_eq!(statement.forward_available_balances().len(), 2);
        assert_eq!(statement.information(), Some("STATEMENT INFO"));
        assert_eq!(statement.currency(), "EUR");
        assert_eq!(statement.statement_date(), NaiveDate::from_ymd_opt(2017, 1, 2).unwrap());
        assert!(statement.source().starts_with(":20:STARTUMSE\n"));
    }

    #[test]
    fn test_transactions_and_narratives() {
        let statement = read(STATEMENT).unwrap().remove(0);
        let transactions = statement.transactions();
        assert_eq!(transactions.len(), 2);

        let first = &transactions[0];
        assert_eq!(first.entry().supplementary_details.as_deref(), Some("SUPPLIER INVOICE"));
        let bcs = first.narrative().unwrap().bcs().unwrap();
        assert_eq!(bcs.purpose().as_deref(), Some("INVOICE 42"));
        assert_eq!(bcs.counterparty_name().as_deref(), Some("ACME GMBH"));

        let second = &transactions[1];
        assert_eq!(second.entry().mark, DebitCreditMark::Credit);
        assert_eq!(second.entry().funds_code, Some('R'));
        assert_eq!(second.narrative(), None);
    }

    #[test]
    fn test_adjusted_transactions_cross_year_end() {
        let statement = read(STATEMENT).unwrap().remove(0);
        let adjusted = statement.adjusted_transactions(&ShortestDelta).unwrap();
        let dates: Vec<_> = adjusted.iter().map(|g| g.entry().entry_date).collect();
        assert_eq!(
            dates,
            vec![
                Some(EntryDate::Date(NaiveDate::from_ymd_opt(2017, 1, 2).unwrap())),
                Some(EntryDate::Date(NaiveDate::from_ymd_opt(2016, 12, 31).unwrap())),
            ]
        );
        assert!(matches!(statement.transactions()[0].entry().entry_date, Some(EntryDate::MonthDay(_))));
    }

    #[test]
    fn test_bad_balance_reports_line() {
        let input = STATEMENT.replace(":62F:C170102", ":62F:X170102");
        let err = read(&input).unwrap_err();
        assert!(matches!(err, Error::NotationMismatch { line: Some(11), .. }), "{err}");
    }
}
