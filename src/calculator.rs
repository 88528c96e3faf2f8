//! Fixed-term and extended loan payment calculations.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::LoanError;
use crate::format::round_money;
use crate::request::{BASIC_PAYMENTS_PER_YEAR, LoanRequest, period_count, periodic_rate};

/// Shown in place of a start date the user did not enter.
pub const NOT_SPECIFIED: &str = "Not specified";

// Period counts coming out of `ln` are rounded to this many places before
// taking the ceiling, so 50.000000000001 stays 50.
const PERIOD_COUNT_DP: u32 = 8;

/// The start date as shown back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDateEcho {
    Date(NaiveDate),
    NotSpecified,
}

impl From<Option<NaiveDate>> for StartDateEcho {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map_or(StartDateEcho::NotSpecified, StartDateEcho::Date)
    }
}

impl fmt::Display for StartDateEcho {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartDateEcho::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            StartDateEcho::NotSpecified => f.write_str(NOT_SPECIFIED),
        }
    }
}

impl Serialize for StartDateEcho {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of a loan calculation. Monetary fields are rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanResult {
    /// Amount due each period under the standard schedule.
    pub periodic_payment: Decimal,
    /// Number of periods in the standard schedule.
    pub scheduled_payment_count: u32,
    /// Interest over the standard schedule.
    pub total_interest: Decimal,
    /// Payments over the standard schedule (basic calculator only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<Decimal>,
    /// Periods needed once extra payments are applied (extended calculator only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_payment_count: Option<u32>,
    /// Extra principal contributed over the schedule (extended calculator only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_early_payment_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date_echo: Option<StartDateEcho>,
}

/// Standard amortized payment: `P * i(1 + i)^n / ((1 + i)^n - 1)`.
///
/// A zero rate reduces to `P / n`, avoiding the 0/0 form of the formula.
///
/// # Errors
///
/// `ComputationUndefined` when `periods` is zero or the growth factor overflows.
pub fn amortized_payment(principal: Decimal, rate: Decimal, periods: u32) -> Result<Decimal, LoanError> {
    if periods == 0 {
        return Err(LoanError::undefined("payment schedule has no periods"));
    }
    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let growth = (Decimal::ONE + rate)
        .checked_powu(periods.into())
        .ok_or_else(|| LoanError::undefined("compound growth factor overflowed"))?;
    let denominator = growth - Decimal::ONE;
    if denominator <= Decimal::ZERO {
        return Err(LoanError::undefined("compound growth factor is not above one"));
    }

    rate.checked_mul(growth)
        .and_then(|factor| principal.checked_mul(factor))
        .and_then(|numerator| numerator.checked_div(denominator))
        .ok_or_else(|| LoanError::undefined("payment amount overflowed"))
}

/// Periods needed to retire `principal` when `payment` is paid each period:
/// `ceil(ln(A / (A - P*i)) / ln(1 + i))`, or `ceil(P / A)` when `ln(1 + i)`
/// is zero.
///
/// # Errors
///
/// `ComputationUndefined` when the payment does not exceed the interest on
/// `principal`, since the logarithm has no real value there.
pub fn payoff_period_count(principal: Decimal, payment: Decimal, rate: Decimal) -> Result<u32, LoanError> {
    if payment <= Decimal::ZERO {
        return Err(LoanError::undefined("payment must be positive to retire the loan"));
    }

    // Rates too small to register in `ln(1 + i)` take the zero-rate limit.
    let growth_ln = (Decimal::ONE + rate)
        .checked_ln()
        .filter(|ln| *ln > Decimal::ZERO);

    let periods = match growth_ln {
        None => principal / payment,
        Some(denominator) => {
            let interest = principal
                .checked_mul(rate)
                .ok_or_else(|| LoanError::undefined("interest on adjusted principal overflowed"))?;
            let headroom = payment - interest;
            if headroom <= Decimal::ZERO {
                return Err(LoanError::undefined(
                    "payment does not cover the interest on the adjusted principal",
                ));
            }
            let numerator = (payment / headroom)
                .checked_ln()
                .ok_or_else(|| LoanError::undefined("logarithm of payment ratio"))?;
            numerator / denominator
        }
    };

    periods
        .round_dp(PERIOD_COUNT_DP)
        .ceil()
        .to_u32()
        .ok_or_else(|| LoanError::undefined("payoff period count out of range"))
}

/// Fixed-term monthly calculation: payment, total interest and total cost.
///
/// Always uses 12 payments per year regardless of the request's frequency.
/// Extra payments and the start date are ignored.
///
/// # Errors
///
/// `InvalidTerm` when the term is shorter than a month, `ComputationUndefined`
/// when the arithmetic overflows.
pub fn compute_basic_schedule(request: &LoanRequest) -> Result<LoanResult, LoanError> {
    let periods = period_count(request.term_years(), BASIC_PAYMENTS_PER_YEAR)?;
    let rate = periodic_rate(request.annual_interest_rate_percent(), BASIC_PAYMENTS_PER_YEAR);
    let principal = request.principal();

    let payment = amortized_payment(principal, rate, periods).inspect_err(log_undefined)?;
    let total_cost = scheduled_total(payment, periods)?;
    let total_interest = (total_cost - principal).max(Decimal::ZERO);

    debug!(
        %principal,
        %rate,
        periods,
        %payment,
        "computed basic loan schedule"
    );

    Ok(LoanResult {
        periodic_payment: round_money(payment),
        scheduled_payment_count: periods,
        total_interest: round_money(total_interest),
        total_cost: Some(round_money(total_cost)),
        actual_payment_count: None,
        total_early_payment_amount: None,
        start_date_echo: None,
    })
}

/// Calculation with configurable frequency and optional flat extra payments.
///
/// The extra payments are aggregated as `extra * scheduled_payment_count` and
/// subtracted from the principal up front; the payoff period count is then
/// solved for that reduced principal at the original payment. This is an
/// approximation: see [`crate::schedule::simulate_accelerated_payoff`] for
/// the period-by-period model.
///
/// # Errors
///
/// `ComputationUndefined` when the arithmetic overflows or the payoff
/// logarithm has no real value.
pub fn compute_extended_schedule(request: &LoanRequest) -> Result<LoanResult, LoanError> {
    let periods = request.scheduled_payment_count();
    let rate = request.periodic_rate();
    let principal = request.principal();

    let payment = amortized_payment(principal, rate, periods).inspect_err(log_undefined)?;
    let total_interest = (scheduled_total(payment, periods)? - principal).max(Decimal::ZERO);

    let (actual_payment_count, total_early_payments) = match request.extra_payment_per_period() {
        Some(extra) => {
            let total_early_payments = scheduled_total(extra, periods)?;
            let adjusted_principal = principal - total_early_payments;
            let actual = if adjusted_principal > Decimal::ZERO {
                payoff_period_count(adjusted_principal, payment, rate).inspect_err(log_undefined)?
            } else {
                0
            };
            (actual, total_early_payments)
        }
        None => (periods, Decimal::ZERO),
    };

    debug!(
        %principal,
        %rate,
        periods,
        %payment,
        actual_payment_count,
        "computed extended loan schedule"
    );

    Ok(LoanResult {
        periodic_payment: round_money(payment),
        scheduled_payment_count: periods,
        total_interest: round_money(total_interest),
        total_cost: None,
        actual_payment_count: Some(actual_payment_count),
        total_early_payment_amount: Some(round_money(total_early_payments)),
        start_date_echo: Some(request.start_date().into()),
    })
}

fn scheduled_total(per_period: Decimal, periods: u32) -> Result<Decimal, LoanError> {
    per_period
        .checked_mul(Decimal::from(periods))
        .ok_or_else(|| LoanError::undefined("scheduled total overflowed"))
}

fn log_undefined(error: &LoanError) {
    warn!(%error, "loan calculation undefined");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn request(principal: Decimal, rate: Decimal, years: Decimal, per_year: u32) -> LoanRequest {
        LoanRequest::new(principal, rate, years, per_year).unwrap()
    }

    #[rstest]
    #[case(dec!(10000), dec!(12), dec!(1), dec!(888.49), dec!(661.85), dec!(10661.85))]
    #[case(dec!(10000), dec!(5.5), dec!(5), dec!(191.01), dec!(1460.70), dec!(11460.70))]
    #[case(dec!(250000), dec!(6), dec!(30), dec!(1498.88), dec!(289595.47), dec!(539595.47))]
    #[case(dec!(10000), dec!(12), dec!(2.5), dec!(387.48), dec!(1624.43), dec!(11624.43))]
    fn test_basic_schedule_matches_amortization_tables(
        #[case] principal: Decimal,
        #[case] rate: Decimal,
        #[case] years: Decimal,
        #[case] payment: Decimal,
        #[case] interest: Decimal,
        #[case] cost: Decimal,
    ) {
        let result = compute_basic_schedule(&request(principal, rate, years, 12)).unwrap();

        assert_eq!(result.periodic_payment, payment);
        assert_eq!(result.total_interest, interest);
        assert_eq!(result.total_cost, Some(cost));
        assert_eq!(result.actual_payment_count, None);
    }

    #[test]
    fn test_basic_schedule_zero_rate() {
        let result = compute_basic_schedule(&request(dec!(12000), dec!(0), dec!(2), 12)).unwrap();

        assert_eq!(
            result,
            LoanResult {
                periodic_payment: dec!(500.00),
                scheduled_payment_count: 24,
                total_interest: dec!(0),
                total_cost: Some(dec!(12000)),
                actual_payment_count: None,
                total_early_payment_amount: None,
                start_date_echo: None,
            }
        );
    }

    #[test]
    fn test_basic_schedule_always_monthly() {
        let quarterly = request(dec!(10000), dec!(12), dec!(1), 4);
        let result = compute_basic_schedule(&quarterly).unwrap();

        assert_eq!(result.scheduled_payment_count, 12);
        assert_eq!(result.periodic_payment, dec!(888.49));
    }

    #[test]
    fn test_basic_schedule_rejects_term_under_a_month() {
        let weekly = request(dec!(1000), dec!(5), dec!(0.02), 52);
        assert!(matches!(
            compute_basic_schedule(&weekly),
            Err(LoanError::InvalidTerm { .. })
        ));
    }

    #[test]
    fn test_extended_schedule_other_frequencies() {
        let biweekly = compute_extended_schedule(&request(dec!(5000), dec!(7), dec!(2), 26)).unwrap();
        assert_eq!(biweekly.periodic_payment, dec!(103.17));
        assert_eq!(biweekly.total_interest, dec!(364.88));
        assert_eq!(biweekly.scheduled_payment_count, 52);

        let quarterly = compute_extended_schedule(&request(dec!(1000), dec!(10), dec!(2), 4)).unwrap();
        assert_eq!(quarterly.periodic_payment, dec!(139.47));
        assert_eq!(quarterly.total_interest, dec!(115.74));
    }

    #[test]
    fn test_extended_schedule_without_extra_payment() {
        let result = compute_extended_schedule(&request(dec!(10000), dec!(12), dec!(1), 12)).unwrap();

        assert_eq!(
            result,
            LoanResult {
                periodic_payment: dec!(888.49),
                scheduled_payment_count: 12,
                total_interest: dec!(661.85),
                total_cost: None,
                actual_payment_count: Some(12),
                total_early_payment_amount: Some(dec!(0)),
                start_date_echo: Some(StartDateEcho::NotSpecified),
            }
        );
    }

    #[test]
    fn test_extended_schedule_extra_payment_shortens_term() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let accelerated = request(dec!(100000), dec!(13), dec!(5), 12)
            .with_extra_payment(dec!(200))
            .unwrap()
            .with_start_date(start);

        let result = compute_extended_schedule(&accelerated).unwrap();

        assert_eq!(result.periodic_payment, dec!(2275.31));
        assert_eq!(result.total_interest, dec!(36518.44));
        assert_eq!(result.scheduled_payment_count, 60);
        assert_eq!(result.total_early_payment_amount, Some(dec!(12000)));
        assert_eq!(result.actual_payment_count, Some(51));
        assert_eq!(result.start_date_echo, Some(StartDateEcho::Date(start)));
    }

    #[rstest]
    #[case(dec!(2000))]
    #[case(dec!(1666.67))]
    fn test_extended_schedule_extra_payments_cover_principal(#[case] extra: Decimal) {
        let accelerated = request(dec!(100000), dec!(13), dec!(5), 12)
            .with_extra_payment(extra)
            .unwrap();

        let result = compute_extended_schedule(&accelerated).unwrap();
        assert_eq!(result.actual_payment_count, Some(0));
    }

    #[test]
    fn test_extended_schedule_zero_rate_with_extra_payment() {
        let accelerated = request(dec!(12000), dec!(0), dec!(2), 12)
            .with_extra_payment(dec!(100))
            .unwrap();

        let result = compute_extended_schedule(&accelerated).unwrap();

        assert_eq!(result.periodic_payment, dec!(500));
        assert_eq!(result.total_interest, dec!(0));
        assert_eq!(result.total_early_payment_amount, Some(dec!(2400)));
        // 9600 left at 500 per period
        assert_eq!(result.actual_payment_count, Some(20));
    }

    #[test]
    fn test_payoff_period_count_undefined_when_payment_only_covers_interest() {
        let result = payoff_period_count(dec!(100000), dec!(1000), dec!(0.01));
        assert!(matches!(result, Err(LoanError::ComputationUndefined { .. })));

        let result = payoff_period_count(dec!(100000), dec!(500), dec!(0.01));
        assert!(matches!(result, Err(LoanError::ComputationUndefined { .. })));
    }

    #[test]
    fn test_extended_schedule_daily_over_thirty_years() {
        let daily = compute_extended_schedule(&request(dec!(100000), dec!(13), dec!(30), 365)).unwrap();

        assert_eq!(daily.scheduled_payment_count, 10_950);
        assert_eq!(daily.actual_payment_count, Some(10_950));
        assert!(daily.periodic_payment > Decimal::ZERO);
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(0.0000000000000000000000000001))]
    fn test_payoff_period_count_vanishing_rate_divides_evenly(#[case] rate: Decimal) {
        // 9600 at 500 per period is 19.2 periods
        assert_eq!(payoff_period_count(dec!(9600), dec!(500), rate).unwrap(), 20);
    }

    #[test]
    fn test_extended_schedule_vanishing_rate_with_extra_payment() {
        let accelerated = request(dec!(12000), dec!(0.0000000000000000000000001), dec!(2), 12)
            .with_extra_payment(dec!(100))
            .unwrap();

        let result = compute_extended_schedule(&accelerated).unwrap();

        assert_eq!(result.periodic_payment, dec!(500));
        assert_eq!(result.total_early_payment_amount, Some(dec!(2400)));
        assert_eq!(result.actual_payment_count, Some(20));
    }

    #[test]
    fn test_payoff_period_count_recovers_full_schedule() {
        let rate = dec!(0.01);
        let payment = amortized_payment(dec!(10000), rate, 12).unwrap();
        assert_eq!(payoff_period_count(dec!(10000), payment, rate).unwrap(), 12);
    }

    #[test]
    fn test_amortized_payment_zero_periods() {
        assert!(matches!(
            amortized_payment(dec!(1000), dec!(0.01), 0),
            Err(LoanError::ComputationUndefined { .. })
        ));
    }

    #[test]
    fn test_amortized_payment_overflow_is_reported() {
        let result = amortized_payment(dec!(1000), dec!(50), 10_000);
        assert!(matches!(result, Err(LoanError::ComputationUndefined { .. })));
    }

    #[test]
    fn test_start_date_echo_serializes_as_text() {
        let date = StartDateEcho::Date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(serde_json::to_value(date).unwrap(), "2025-03-01");
        assert_eq!(serde_json::to_value(StartDateEcho::NotSpecified).unwrap(), "Not specified");
    }

    #[test]
    fn test_repeated_calculation_is_identical() {
        let accelerated = request(dec!(100000), dec!(13), dec!(5), 12)
            .with_extra_payment(dec!(200))
            .unwrap();

        assert_eq!(
            compute_extended_schedule(&accelerated).unwrap(),
            compute_extended_schedule(&accelerated).unwrap()
        );
    }
}
