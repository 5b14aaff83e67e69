//! Transaction type identification codes of statement lines.
//!
//! The code is one category letter followed by three characters: `N` or `F`
//! with a business code from the closed [`TransactionCode`] table, or `S`
//! with the number of the SWIFT message that caused the entry.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! transaction_codes {
    ($($variant:ident => ($code:literal, $description:literal),)+) => {
        /// Business transaction codes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum TransactionCode {
            $($variant,)+
        }

        impl TransactionCode {
            /// Every code, in table order.
            pub const ALL: &'static [TransactionCode] = &[$(TransactionCode::$variant,)+];

            pub fn code(&self) -> &'static str {
                match self {
                    $(TransactionCode::$variant => $code,)+
                }
            }

            pub fn description(&self) -> &'static str {
                match self {
                    $(TransactionCode::$variant => $description,)+
                }
            }
        }
    };
}

transaction_codes! {
    Bnk => ("BNK", "Securities related item - bank fees"),
    Boe => ("BOE", "Bill of exchange"),
    Brf => ("BRF", "Brokerage fee"),
    Car => ("CAR", "Securities related item - corporate actions related"),
    Cas => ("CAS", "Securities related item - cash in lieu"),
    Chg => ("CHG", "Charges and other expenses"),
    Chk => ("CHK", "Cheques"),
    Clr => ("CLR", "Cash letters/cheques remittance"),
    Cmi => ("CMI", "Cash management item - no detail"),
    Cmn => ("CMN", "Cash management item - notional pooling"),
    Cmp => ("CMP", "Compensation claims"),
    Cms => ("CMS", "Cash management item - sweeping"),
    Cmt => ("CMT", "Cash management item - topping"),
    Cmz => ("CMZ", "Cash management item - zero balancing"),
    Col => ("COL", "Collections"),
    Com => ("COM", "Commission"),
    Cpn => ("CPN", "Securities related item - coupon payments"),
    Dcr => ("DCR", "Documentary credit"),
    Ddt => ("DDT", "Direct debit item"),
    Dis => ("DIS", "Securities related item - gains disbursement"),
    Div => ("DIV", "Securities related item - dividends"),
    Eqa => ("EQA", "Equivalent amount"),
    Ext => ("EXT", "Securities related item - external transfer for own account"),
    Fex => ("FEX", "Foreign exchange"),
    Int => ("INT", "Interest"),
    Lbx => ("LBX", "Lock box"),
    Ldp => ("LDP", "Loan deposit"),
    Mar => ("MAR", "Securities related item - margin payments/receipts"),
    Mat => ("MAT", "Securities related item - maturity"),
    Mgt => ("MGT", "Securities related item - management fees"),
    Msc => ("MSC", "Miscellaneous"),
    Nwi => ("NWI", "Securities related item - new issues distribution"),
    Odc => ("ODC", "Overdraft charge"),
    Opt => ("OPT", "Securities related item - options"),
    Pch => ("PCH", "Securities related item - purchase"),
    Pop => ("POP", "Securities related item - pair-off proceeds"),
    Prn => ("PRN", "Securities related item - principal pay-down/pay-up"),
    Rec => ("REC", "Securities related item - tax reclaim"),
    Red => ("RED", "Securities related item - redemption/withdrawal"),
    Rig => ("RIG", "Securities related item - rights"),
    Rti => ("RTI", "Returned item"),
    Sal => ("SAL", "Securities related item - sale"),
    Sec => ("SEC", "Securities"),
    Sle => ("SLE", "Securities related item - securities lending related"),
    Sto => ("STO", "Standing order"),
    Stp => ("STP", "Securities related item - stamp duty"),
    Sub => ("SUB", "Securities related item - subscription"),
    Swp => ("SWP", "Securities related item - SWAP payment"),
    Tax => ("TAX", "Securities related item - withholding tax payment"),
    Tck => ("TCK", "Travellers cheques"),
    Tcm => ("TCM", "Securities related item - tripartite collateral management"),
    Tra => ("TRA", "Securities related item - internal transfer for own account"),
    Trf => ("TRF", "Transfer"),
    Trn => ("TRN", "Securities related item - transaction fee"),
    Uwc => ("UWC", "Securities related item - underwriting commission"),
    Vda => ("VDA", "Value date adjustment"),
    War => ("WAR", "Securities related item - warrant"),
}

impl TransactionCode {
    /// Look up a three-letter code. Unknown codes yield `None`.
    pub fn lookup(code: &str) -> Option<Self> {
        TransactionCode::ALL.iter().copied().find(|value| value.code() == code)
    }
}

/// Transaction type identification code of a `:61:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionTypeCode {
    /// `N`: non-SWIFT transfer.
    NonSwift(TransactionCode),
    /// `F`: first advice.
    FirstAdvice(TransactionCode),
    /// `S`: caused by a SWIFT message of this type.
    Swift(u16),
}

impl TransactionTypeCode {
    pub fn business_code(&self) -> Option<TransactionCode> {
        match self {
            TransactionTypeCode::NonSwift(code) | TransactionTypeCode::FirstAdvice(code) => Some(*code),
            TransactionTypeCode::Swift(_) => None,
        }
    }
}

impl FromStr for TransactionTypeCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || Error::UnknownTransactionCode {
            line: None,
            code: s.to_string(),
        };

        let mut chars = s.chars();
        let category = chars.next().ok_or_else(unknown)?;
        let rest = chars.as_str();
        if rest.len() != 3 {
            return Err(unknown());
        }

        match category {
            'N' => TransactionCode::lookup(rest).map(TransactionTypeCode::NonSwift).ok_or_else(unknown),
            'F' => TransactionCode::lookup(rest).map(TransactionTypeCode::FirstAdvice).ok_or_else(unknown),
            'S' => match rest.parse::<u16>() {
                Ok(mt) if (100..=999).contains(&mt) => Ok(TransactionTypeCode::Swift(mt)),
                _ => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    }
}

impl fmt::Display for TransactionTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionTypeCode::NonSwift(code) => write!(f, "N{}", code.code()),
            TransactionTypeCode::FirstAdvice(code) => write!(f, "F{}", code.code()),
            TransactionTypeCode::Swift(mt) => write!(f, "S{:03}", mt),
        }
    }
}
