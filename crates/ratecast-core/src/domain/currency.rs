use std::fmt::{Display, Formatter};

use crate::ValidationError;

/// Normalized 3-letter currency code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and normalize a currency code to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();
        let is_valid =
            normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

        if !is_valid {
            return Err(ValidationError::InvalidCurrency {
                value: input.to_owned(),
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of currencies retained in every daily report.
///
/// Built once before the hub starts and owned by the aggregator; it is never
/// mutated while requests are being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestSet {
    codes: Vec<CurrencyCode>,
}

impl Default for InterestSet {
    fn default() -> Self {
        Self {
            codes: vec![
                CurrencyCode(String::from("EUR")),
                CurrencyCode(String::from("USD")),
            ],
        }
    }
}

impl InterestSet {
    /// An interest set holding exactly `codes`, in order, without duplicates.
    pub fn new(codes: impl IntoIterator<Item = CurrencyCode>) -> Self {
        let mut set = Self { codes: Vec::new() };
        for code in codes {
            set.insert(code);
        }
        set
    }

    /// Default set extended with `extra` codes parsed from configuration.
    pub fn with_extra<I, S>(extra: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for raw in extra {
            set.insert(CurrencyCode::parse(raw.as_ref())?);
        }
        Ok(set)
    }

    pub fn with_currency(mut self, code: CurrencyCode) -> Self {
        self.insert(code);
        self
    }

    fn insert(&mut self, code: CurrencyCode) {
        if !self.codes.contains(&code) {
            self.codes.push(code);
        }
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.codes.contains(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.codes.iter()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
