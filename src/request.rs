//! Parse-then-validate step turning raw form fields into a typed [`LoanRequest`].

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::CalculatorConfig;
use crate::error::LoanError;

/// The basic calculator always works with monthly payments.
pub const BASIC_PAYMENTS_PER_YEAR: u32 = 12;

/// Smallest loan amount accepted: one cent.
pub const MIN_PRINCIPAL: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Which calculator the form belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Amount, rate and term only; monthly payments.
    Basic,
    /// Adds payment frequency, extra payments and a start date.
    Extended,
}

/// Raw form fields exactly as the user typed them.
///
/// Optional fields that are absent or blank fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoanForm {
    pub amount: String,
    pub interest_rate: String,
    pub term_years: String,
    pub payments_per_year: Option<String>,
    pub extra_payment: Option<String>,
    pub start_date: Option<String>,
}

impl LoanForm {
    pub fn new(amount: &str, interest_rate: &str, term_years: &str) -> Self {
        Self {
            amount: amount.to_string(),
            interest_rate: interest_rate.to_string(),
            term_years: term_years.to_string(),
            ..Self::default()
        }
    }
}

/// A validated loan request. Only obtainable through [`validate`] or
/// [`LoanRequest::new`], so every instance satisfies the field constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanRequest {
    principal: Decimal,
    annual_interest_rate_percent: Decimal,
    term_years: Decimal,
    payments_per_year: u32,
    scheduled_payment_count: u32,
    extra_payment_per_period: Option<Decimal>,
    start_date: Option<NaiveDate>,
}

impl LoanRequest {
    /// Builds a request from already-typed values, applying the same checks as [`validate`].
    pub fn new(
        principal: Decimal,
        annual_interest_rate_percent: Decimal,
        term_years: Decimal,
        payments_per_year: u32,
    ) -> Result<Self, LoanError> {
        check_principal(principal)?;
        check_rate(annual_interest_rate_percent, false)?;
        check_term(term_years)?;
        if payments_per_year == 0 {
            return Err(LoanError::frequency("must be greater than zero"));
        }
        let scheduled_payment_count = period_count(term_years, payments_per_year)?;

        Ok(Self {
            principal,
            annual_interest_rate_percent,
            term_years,
            payments_per_year,
            scheduled_payment_count,
            extra_payment_per_period: None,
            start_date: None,
        })
    }

    /// Adds a flat extra payment per period. Zero means no acceleration.
    pub fn with_extra_payment(mut self, extra: Decimal) -> Result<Self, LoanError> {
        if extra < Decimal::ZERO {
            return Err(LoanError::extra_payment("cannot be negative"));
        }
        self.extra_payment_per_period = if extra.is_zero() { None } else { Some(extra) };
        Ok(self)
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn annual_interest_rate_percent(&self) -> Decimal {
        self.annual_interest_rate_percent
    }

    pub fn term_years(&self) -> Decimal {
        self.term_years
    }

    pub fn payments_per_year(&self) -> u32 {
        self.payments_per_year
    }

    /// `term_years * payments_per_year`, rounded half away from zero.
    pub fn scheduled_payment_count(&self) -> u32 {
        self.scheduled_payment_count
    }

    pub fn extra_payment_per_period(&self) -> Option<Decimal> {
        self.extra_payment_per_period
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Interest rate per period as a fraction (13% monthly is 0.13 / 12).
    pub fn periodic_rate(&self) -> Decimal {
        periodic_rate(self.annual_interest_rate_percent, self.payments_per_year)
    }
}

/// Validates a submitted form for the given calculator variant.
///
/// Fields are checked in form order (amount, rate, term, frequency, extra
/// payment, start date) and the first violation is returned. The basic
/// variant ignores the extended-only fields.
pub fn validate(
    form: &LoanForm,
    variant: Variant,
    config: &CalculatorConfig,
) -> Result<LoanRequest, LoanError> {
    let principal = parse_required(&form.amount).map_err(LoanError::amount)?;
    check_principal(principal)?;

    let rate = parse_required(&form.interest_rate).map_err(LoanError::rate)?;
    check_rate(rate, config.strict_rate)?;

    let term_years = parse_required(&form.term_years).map_err(LoanError::term)?;
    check_term(term_years)?;

    let payments_per_year = match variant {
        Variant::Basic => BASIC_PAYMENTS_PER_YEAR,
        Variant::Extended => parse_frequency(
            form.payments_per_year.as_deref(),
            config.default_payments_per_year,
        )?,
    };
    let scheduled_payment_count = period_count(term_years, payments_per_year)?;

    let mut request = LoanRequest {
        principal,
        annual_interest_rate_percent: rate,
        term_years,
        payments_per_year,
        scheduled_payment_count,
        extra_payment_per_period: None,
        start_date: None,
    };

    if variant == Variant::Extended {
        if let Some(extra) = parse_optional(form.extra_payment.as_deref()) {
            let extra = extra.map_err(|_| LoanError::extra_payment("is not a number"))?;
            request = request.with_extra_payment(extra)?;
        }
        if let Some(raw) = non_blank(form.start_date.as_deref()) {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| LoanError::start_date("expected a date like 2025-01-31"))?;
            request = request.with_start_date(date);
        }
    }

    Ok(request)
}

pub(crate) fn periodic_rate(annual_interest_rate_percent: Decimal, payments_per_year: u32) -> Decimal {
    annual_interest_rate_percent / Decimal::ONE_HUNDRED / Decimal::from(payments_per_year)
}

/// Number of whole payment periods in `term_years`.
pub(crate) fn period_count(term_years: Decimal, payments_per_year: u32) -> Result<u32, LoanError> {
    let periods = term_years
        .checked_mul(Decimal::from(payments_per_year))
        .ok_or_else(|| LoanError::term("is too long"))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    match periods.to_u32() {
        Some(0) => Err(LoanError::term("is shorter than one payment period")),
        Some(count) => Ok(count),
        None => Err(LoanError::term("is too long")),
    }
}

fn check_principal(principal: Decimal) -> Result<(), LoanError> {
    if principal <= Decimal::ZERO {
        return Err(LoanError::amount("must be greater than zero"));
    }
    if principal < MIN_PRINCIPAL {
        return Err(LoanError::amount("must be at least one cent"));
    }
    Ok(())
}

fn check_rate(rate: Decimal, strict: bool) -> Result<(), LoanError> {
    if rate < Decimal::ZERO {
        return Err(LoanError::rate("cannot be negative"));
    }
    if strict && rate.is_zero() {
        return Err(LoanError::rate("must be greater than zero"));
    }
    Ok(())
}

fn check_term(term_years: Decimal) -> Result<(), LoanError> {
    if term_years <= Decimal::ZERO {
        return Err(LoanError::term("must be greater than zero"));
    }
    Ok(())
}

fn parse_frequency(raw: Option<&str>, default: u32) -> Result<u32, LoanError> {
    let Some(value) = parse_optional(raw) else {
        return Ok(default);
    };
    let value = value.map_err(|_| LoanError::frequency("is not a number"))?;

    if value <= Decimal::ZERO {
        return Err(LoanError::frequency("must be greater than zero"));
    }
    if !value.fract().is_zero() {
        return Err(LoanError::frequency("must be a whole number of payments"));
    }
    value
        .to_u32()
        .ok_or_else(|| LoanError::frequency("is too large"))
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn parse_required(raw: &str) -> Result<Decimal, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("is required");
    }
    parse_number(raw).ok_or("is not a number")
}

/// `None` when blank, otherwise the parse outcome.
fn parse_optional(raw: Option<&str>) -> Option<Result<Decimal, ()>> {
    non_blank(raw).map(|s| parse_number(s).ok_or(()))
}
