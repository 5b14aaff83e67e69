//! SWIFT MT Statement Decoder Library
//!
//! A library for reading SWIFT MT940, MT942 and MT103 messages from text
//! files into typed values.
//!
//! # Layers
//!
//! - [`notation`]: the SWIFT field notation engine (`6!n[4!n]2a...`)
//! - [`tokenizer`]: splits the input into `:<tag>:` fields
//! - [`page`] and [`grammar`]: assemble fields into one page per message
//! - [`fields`], [`statement_line`], [`narrative`]: decode field contents
//! - [`entry_date`]: resolves the year of month-day entry dates
//!
//! # Examples
//!
//! ## Reading an MT940 file
//!
//! ```no_run
//! use swift_mt::entry_date::ShortestDelta;
//! use swift_mt::mt940_format::Mt940Reader;
//!
//! for statement in Mt940Reader::open("statement.sta")? {
//!     let statement = statement?;
//!     println!("{} {}", statement.account(), statement.statement_number());
//!     for group in statement.adjusted_transactions(&ShortestDelta)? {
//!         println!("  {:?} {}", group.entry().mark, group.entry().amount);
//!     }
//! }
//! # Ok::<(), swift_mt::Error>(())
//! ```
//!
//! ## Validating an IBAN
//!
//! ```
//! use swift_mt::iban::Iban;
//!
//! assert!(Iban::ensure_valid("DE44500105175407324931").is_ok());
//! assert!(Iban::ensure_valid("DE45500105175407324931").is_err());
//! ```

pub mod error;
pub mod notation;
pub mod iban;
pub mod bic;
pub mod tokenizer;
pub mod grammar;
pub mod page;
pub mod types;
pub mod transaction_code;
pub mod fields;
pub mod statement_line;
pub mod narrative;
pub mod entry_date;
pub mod message;
pub mod mt940_format;
pub mod mt942_format;
pub mod mt103_format;
pub mod csv_format;

use grammar::PageGrammar;
use std::str::FromStr;

// Re-export commonly used types
pub use error::{Error, Result};
pub use message::{Message, MessageReader};
pub use page::{Page, PageReader};
pub use tokenizer::RawField;
pub use types::{Balance, DebitCredit, DebitCreditMark, TransactionEntry, TransactionGroup};

/// Supported SWIFT message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// MT940 customer statement
    Mt940,
    /// MT942 interim transaction report
    Mt942,
    /// MT103 single customer credit transfer
    Mt103,
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mt940" | "mt-940" | "940" => Ok(MessageType::Mt940),
            "mt942" | "mt-942" | "942" => Ok(MessageType::Mt942),
            "mt103" | "mt-103" | "103" => Ok(MessageType::Mt103),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

impl MessageType {
    /// Page grammar of this message type.
    pub fn grammar(&self) -> &'static PageGrammar {
        match self {
            MessageType::Mt940 => &grammar::MT940,
            MessageType::Mt942 => &grammar::MT942,
            MessageType::Mt103 => &grammar::MT103,
        }
    }

    pub fn name(&self) -> &'static str {
        self.grammar().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_from_str() {
        assert_eq!("mt940".parse::<MessageType>().unwrap(), MessageType::Mt940);
        assert_eq!("MT942".parse::<MessageType>().unwrap(), MessageType::Mt942);
        assert_eq!("103".parse::<MessageType>().unwrap(), MessageType::Mt103);
        assert!("camt053".parse::<MessageType>().is_err());
    }

    #[test]
    fn test_message_type_name() {
        assert_eq!(MessageType::Mt940.name(), "MT940");
        assert_eq!(MessageType::Mt942.name(), "MT942");
        assert_eq!(MessageType::Mt103.name(), "MT103");
    }
}
