//! Parsing of the currency selection carried in a request path.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::currency::{lookup, supported_currencies, Currency};
use crate::error::ValidationError;

/// Path value that selects every supported currency.
pub const LIST_SENTINEL: &str = "LIST";

static SELECTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/?[A-Z]{3})*$").expect("selection pattern compiles"));

/// The ordered set of currencies a caller asked to convert into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencySelection {
    currencies: Vec<Currency>,
    everything: bool,
}

impl CurrencySelection {
    /// Parse a raw request path such as `/usd/eur/` or `/LIST`.
    ///
    /// One leading and one trailing slash are stripped and the rest is
    /// uppercased before matching.
    pub fn parse(path: &str) -> Result<Self, ValidationError> {
        let normalized = normalize(path);

        if normalized == LIST_SENTINEL {
            return Ok(Self::all());
        }

        if normalized.is_empty() || !SELECTION_PATTERN.is_match(&normalized) {
            return Err(ValidationError::Malformed);
        }

        let currencies = normalized
            .split('/')
            .map(|code| {
                lookup(code)
                    .map(Currency::new)
                    .ok_or_else(|| ValidationError::Unsupported(code.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            currencies,
            everything: false,
        })
    }

    /// Select the whole reference set.
    pub fn all() -> Self {
        Self {
            currencies: supported_currencies().collect(),
            everything: true,
        }
    }

    /// Build a selection from already validated currencies.
    pub fn from_currencies(currencies: Vec<Currency>) -> Self {
        Self {
            currencies,
            everything: false,
        }
    }

    /// Requested currencies, in request order.
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// Whether the selection came from the `LIST` sentinel.
    pub fn is_all(&self) -> bool {
        self.everything
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.to_uppercase()
}
