//! MT103 single customer credit transfer.

use crate::bic::Bic;
use crate::error::{Error, Result};
use crate::fields::{self, mandatory, ChargeBearer, Party, ValueDateAmount};
use crate::grammar::{PageGrammar, MT103};
use crate::iban::Iban;
use crate::message::{Message, MessageReader};
use crate::page::Page;
use crate::tokenizer::RawField;
use rust_decimal::Decimal;
use tracing::debug;

/// One MT103 transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Mt103Transfer {
    page: Page,
    sender_reference: String,
    time_indications: Vec<String>,
    bank_operation_code: String,
    instruction_codes: Vec<String>,
    transaction_type_code: Option<String>,
    settlement: ValueDateAmount,
    instructed_amount: Option<(String, Decimal)>,
    exchange_rate: Option<Decimal>,
    ordering_customer: Party,
    ordering_institution: Option<Party>,
    account_with_institution: Option<Party>,
    beneficiary: Party,
    remittance_information: Option<String>,
    charges: ChargeBearer,
    sender_charges: Vec<(String, Decimal)>,
    receiver_charges: Option<(String, Decimal)>,
    sender_to_receiver_information: Option<String>,
}

pub type Mt103Reader<R> = MessageReader<R, Mt103Transfer>;

fn content(field: &RawField) -> String {
    field.content().to_string()
}

fn exchange_rate(field: &RawField) -> Result<Decimal> {
    fields::parse_amount(field.content()).map_err(|e| e.at_line(field.line()))
}

impl Message for Mt103Transfer {
    fn grammar() -> &'static PageGrammar {
        &MT103
    }

    fn from_page(page: Page) -> Result<Self> {
        let transfer = Mt103Transfer {
            sender_reference: fields::reference(mandatory(&page, &["20"])?)?,
            time_indications: page.fields_with_tag("13C").map(content).collect(),
            bank_operation_code: fields::bank_operation_code(mandatory(&page, &["23B"])?)?,
            instruction_codes: page.fields_with_tag("23E").map(content).collect(),
            transaction_type_code: page.field("26T").map(content),
            settlement: fields::value_date_amount(mandatory(&page, &["32A"])?)?,
            instructed_amount: page.field("33B").map(fields::currency_amount).transpose()?,
            exchange_rate: page.field("36").map(exchange_rate).transpose()?,
            ordering_customer: fields::party(mandatory(&page, &["50A", "50F", "50K"])?)?,
            ordering_institution: page.field_any(&["52A", "52D"]).map(fields::party).transpose()?,
            account_with_institution: page
                .field_any(&["57A", "57B", "57C", "57D"])
                .map(fields::party)
                .transpose()?,
            beneficiary: fields::party(mandatory(&page, &["59", "59A", "59F"])?)?,
            remittance_information: page.field("70").map(fields::narrative).transpose()?,
            charges: fields::charges(mandatory(&page, &["71A"])?)?,
            sender_charges: page
                .fields_with_tag("71F")
                .map(fields::currency_amount)
                .collect::<Result<_>>()?,
            receiver_charges: page.field("71G").map(fields::currency_amount).transpose()?,
            sender_to_receiver_information: page.field("72").map(fields::narrative).transpose()?,
            page,
        };
        debug!(reference = %transfer.sender_reference, "MT103 transfer decoded");
        Ok(transfer)
    }
}

impl Mt103Transfer {
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn source(&self) -> &str {
        self.page.source()
    }

    pub fn sender_reference(&self) -> &str {
        &self.sender_reference
    }

    /// Raw `:13C:` time indications.
    pub fn time_indications(&self) -> &[String] {
        &self.time_indications
    }

    pub fn bank_operation_code(&self) -> &str {
        &self.bank_operation_code
    }

    /// Raw `:23E:` instruction codes.
    pub fn instruction_codes(&self) -> &[String] {
        &self.instruction_codes
    }

    pub fn transaction_type_code(&self) -> Option<&str> {
        self.transaction_type_code.as_deref()
    }

    /// Value date, currency and interbank settled amount from `:32A:`.
    pub fn settlement(&self) -> &ValueDateAmount {
        &self.settlement
    }

    pub fn instructed_amount(&self) -> Option<(&str, Decimal)> {
        self.instructed_amount.as_ref().map(|(currency, amount)| (currency.as_str(), *amount))
    }

    pub fn exchange_rate(&self) -> Option<Decimal> {
        self.exchange_rate
    }

    pub fn ordering_customer(&self) -> &Party {
        &self.ordering_customer
    }

    pub fn ordering_institution(&self) -> Option<&Party> {
        self.ordering_institution.as_ref()
    }

    pub fn account_with_institution(&self) -> Option<&Party> {
        self.account_with_institution.as_ref()
    }

    /// BIC of the account with institution, when given in option A.
    pub fn account_with_institution_bic(&self) -> Result<Option<Bic>> {
        self.page.field("57A").map(fields::institution_bic).transpose()
    }

    pub fn beneficiary(&self) -> &Party {
        &self.beneficiary
    }

    pub fn remittance_information(&self) -> Option<&str> {
        self.remittance_information.as_deref()
    }

    pub fn charges(&self) -> ChargeBearer {
        self.charges
    }

    pub fn sender_charges(&self) -> &[(String, Decimal)] {
        &self.sender_charges
    }

    pub fn receiver_charges(&self) -> Option<&(String, Decimal)> {
        self.receiver_charges.as_ref()
    }

    pub fn sender_to_receiver_information(&self) -> Option<&str> {
        self.sender_to_receiver_information.as_deref()
    }

    /// Fail unless the beneficiary account is a valid IBAN.
    pub fn ensure_beneficiary_iban(&self) -> Result<()> {
        let line = self.page.field_any(&["59", "59A", "59F"]).map(RawField::line).unwrap_or(self.page.line());
        match &self.beneficiary.account {
            Some(account) => Iban::ensure_valid(account).map_err(|e| e.at_line(line)),
            None => Err(Error::MissingField {
                line,
                tag: "59 account".to_string(),
            }),
        }
    }
}
