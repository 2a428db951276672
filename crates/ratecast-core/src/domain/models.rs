use std::fmt::{Display, Formatter};

use crate::{CurrencyCode, InterestSet, ReportDate, ValidationError};

/// Sale and purchase rates for one currency on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    currency: CurrencyCode,
    sale: f64,
    purchase: f64,
}

impl Quote {
    pub fn new(currency: CurrencyCode, sale: f64, purchase: f64) -> Result<Self, ValidationError> {
        validate_non_negative("sale", sale)?;
        validate_non_negative("purchase", purchase)?;

        Ok(Self {
            currency,
            sale,
            purchase,
        })
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub const fn sale(&self) -> f64 {
        self.sale
    }

    pub const fn purchase(&self) -> f64 {
        self.purchase
    }
}

impl Display for Quote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {{sale: {}, purchase: {}}}",
            self.currency, self.sale, self.purchase
        )
    }
}

/// Every currency record a rate source returned for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRates {
    pub date: ReportDate,
    pub quotes: Vec<Quote>,
}

impl DailyRates {
    pub fn quote(&self, currency: &CurrencyCode) -> Option<&Quote> {
        self.quotes.iter().find(|quote| quote.currency() == currency)
    }
}

/// Interest-set quotes for one date, in interest-set order.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    date: ReportDate,
    quotes: Vec<Quote>,
}

impl DailyReport {
    /// Narrow `rates` to `interest`. Returns the codes the source did not
    /// supply when any tracked currency is missing.
    pub fn filter(rates: &DailyRates, interest: &InterestSet) -> Result<Self, Vec<CurrencyCode>> {
        let mut quotes = Vec::with_capacity(interest.len());
        let mut missing = Vec::new();

        for code in interest.iter() {
            match rates.quote(code) {
                Some(quote) => quotes.push(quote.clone()),
                None => missing.push(code.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(Self {
            date: rates.date,
            quotes,
        })
    }

    pub const fn date(&self) -> ReportDate {
        self.date
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn get(&self, currency: &CurrencyCode) -> Option<&Quote> {
        self.quotes.iter().find(|quote| quote.currency() == currency)
    }
}

impl Display for DailyReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.date)?;
        for quote in &self.quotes {
            write!(f, "\n{quote}")?;
        }
        Ok(())
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
