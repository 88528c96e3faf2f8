//! Period-by-period amortization tables.
//!
//! [`amortization_schedule`] lists the standard schedule row by row.
//! [`simulate_accelerated_payoff`] applies the extra payment against the
//! balance every period, so interest shrinks along with the balance. The
//! extended calculator's flat model does not, and reports fewer periods.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::calculator::amortized_payment;
use crate::error::LoanError;
use crate::format::round_money;
use crate::request::LoanRequest;

/// Longest table the schedule operations will build.
pub const MAX_SCHEDULE_ROWS: u32 = 100_000;

/// One row of an amortization table, rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulePeriod {
    /// 1-based period number.
    pub period: u32,
    /// Due date, when the request carries a start date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    /// Scheduled payment made this period (interest plus principal).
    pub payment: Decimal,
    pub interest: Decimal,
    pub principal: Decimal,
    pub extra_payment: Decimal,
    /// Balance left after this period's payments.
    pub balance: Decimal,
}

/// Result of paying the extra amount every period until the loan is retired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoffSimulation {
    pub payment_count: u32,
    /// Periods saved against the standard schedule.
    pub periods_saved: u32,
    pub total_interest: Decimal,
    /// Interest saved against the standard schedule.
    pub interest_saved: Decimal,
    pub total_extra_paid: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date: Option<NaiveDate>,
    pub schedule: Vec<SchedulePeriod>,
}

struct ScheduleRun {
    rows: Vec<SchedulePeriod>,
    total_interest: Decimal,
    total_extra: Decimal,
}

/// Standard amortization table for the request, ignoring extra payments.
///
/// The last row absorbs rounding so the balance closes at exactly zero.
pub fn amortization_schedule(request: &LoanRequest) -> Result<Vec<SchedulePeriod>, LoanError> {
    let payment = amortized_payment(
        request.principal(),
        request.periodic_rate(),
        request.scheduled_payment_count(),
    )?;
    Ok(run_schedule(request, payment, Decimal::ZERO)?.rows)
}

/// Simulates paying the request's extra payment on top of every scheduled
/// payment, with interest recomputed on the reduced balance each period.
///
/// Without an extra payment this is the standard schedule and nothing is saved.
pub fn simulate_accelerated_payoff(request: &LoanRequest) -> Result<PayoffSimulation, LoanError> {
    let periods = request.scheduled_payment_count();
    let payment = amortized_payment(request.principal(), request.periodic_rate(), periods)?;
    let standard_interest = payment
        .checked_mul(Decimal::from(periods))
        .map(|total| total - request.principal())
        .ok_or_else(|| LoanError::undefined("scheduled total overflowed"))?;

    let extra = request.extra_payment_per_period().unwrap_or(Decimal::ZERO);
    let run = run_schedule(request, payment, extra)?;
    let payment_count = run.rows.len() as u32;

    debug!(
        periods,
        payment_count,
        total_interest = %run.total_interest,
        "simulated accelerated payoff"
    );

    Ok(PayoffSimulation {
        payment_count,
        periods_saved: periods - payment_count,
        total_interest: round_money(run.total_interest),
        interest_saved: round_money((standard_interest - run.total_interest).max(Decimal::ZERO)),
        total_extra_paid: round_money(run.total_extra),
        payoff_date: run.rows.last().and_then(|row| row.payment_date),
        schedule: run.rows,
    })
}

fn run_schedule(request: &LoanRequest, payment: Decimal, extra: Decimal) -> Result<ScheduleRun, LoanError> {
    let periods = request.scheduled_payment_count();
    if periods > MAX_SCHEDULE_ROWS {
        return Err(LoanError::undefined(format!(
            "schedule of {periods} periods is longer than the {MAX_SCHEDULE_ROWS} rows a table can list"
        )));
    }
    let rate = request.periodic_rate();
    let mut balance = request.principal();
    let mut rows = Vec::with_capacity(periods as usize);
    let mut total_interest = Decimal::ZERO;
    let mut total_extra = Decimal::ZERO;

    for period in 1..=periods {
        if balance <= Decimal::ZERO {
            break;
        }

        let interest = balance * rate;
        let mut amortization = payment - interest;
        if period == periods || amortization > balance {
            amortization = balance;
        }
        let extra_payment = extra.min(balance - amortization);
        balance -= amortization + extra_payment;
        total_interest += interest;
        total_extra += extra_payment;

        rows.push(SchedulePeriod {
            period,
            payment_date: payment_date(request.start_date(), request.payments_per_year(), period),
            payment: round_money(interest + amortization),
            interest: round_money(interest),
            principal: round_money(amortization),
            extra_payment: round_money(extra_payment),
            balance: round_money(balance),
        });
    }

    Ok(ScheduleRun {
        rows,
        total_interest,
        total_extra,
    })
}

/// Due date of `period`, one period after `start` for period 1.
///
/// Frequencies dividing a year into whole months step by calendar months;
/// others step by `365 / payments_per_year` days.
fn payment_date(start: Option<NaiveDate>, payments_per_year: u32, period: u32) -> Option<NaiveDate> {
    let start = start?;
    if 12 % payments_per_year == 0 {
        start.checked_add_months(Months::new(period * (12 / payments_per_year)))
    } else {
        let days = u64::from(period) * 365 / u64::from(payments_per_year);
        start.checked_add_days(Days::new(days))
    }
}
