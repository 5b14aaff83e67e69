//! Business Identifier Code (SWIFT address).

use crate::error::{Error, Result};
use crate::notation::Notation;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

static BIC: Lazy<Notation> = Lazy::new(|| Notation::compile("4!a2!a2!c[3!c]").expect("static notation"));

/// A structurally valid BIC. There is no checksum to verify.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Bic {
    institution: String,
    country: String,
    location: String,
    branch: Option<String>,
}

impl Bic {
    /// Decode an 8 or 11 character BIC.
    pub fn of(text: &str) -> Result<Self> {
        let subfields = BIC.parse(text.trim())?;
        Ok(Bic {
            institution: subfields.get(0).unwrap_or_default().to_string(),
            country: subfields.get(1).unwrap_or_default().to_string(),
            location: subfields.get(2).unwrap_or_default().to_string(),
            branch: subfields.get(3).map(str::to_string),
        })
    }

    pub fn institution(&self) -> &str {
        &self.institution
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// True when the code addresses the head office (no branch or `XXX`).
    pub fn is_primary_office(&self) -> bool {
        matches!(self.branch.as_deref(), None | Some("XXX"))
    }
}

impl fmt::Display for Bic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.institution, self.country, self.location)?;
        if let Some(ref branch) = self.branch {
            f.write_str(branch)?;
        }
        Ok(())
    }
}

impl FromStr for Bic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Bic::of(s)
    }
}
