//! `sosser_calculator` is the loan calculator behind the Sosser cooperative website.
//!
//! It offers two calculators over the standard amortized-payment formula:
//! - **Basic**: amount, annual rate and term in years, paid monthly. Reports the
//!   monthly payment, total interest and total cost.
//! - **Extended**: adds the payment frequency, a flat extra payment per period and
//!   a start date. Reports how many periods the extra payments save.
//!
//! Form fields arrive as text and go through [`validate`] first, which returns
//! either a typed [`LoanRequest`] or a [`LoanError`] naming the offending field.
//! The [`schedule`] module expands a request into a full amortization table.
//!
//! ## Usage
//!
//! ```rust
//! use sosser_calculator::{compute_basic_schedule, validate, CalculatorConfig, LoanForm, Variant};
//! use rust_decimal_macros::dec;
//!
//! fn main() {
//!     let form = LoanForm::new("10000", "12", "1");
//!
//!     let outcome = validate(&form, Variant::Basic, &CalculatorConfig::default())
//!         .and_then(|request| compute_basic_schedule(&request));
//!
//!     match outcome {
//!         Ok(result) => {
//!             println!("Monthly Payment:     {:.2}", result.periodic_payment);
//!             println!("Total Interest Paid: {:.2}", result.total_interest);
//!             assert_eq!(result.periodic_payment, dec!(888.49));
//!         }
//!         Err(e) => {
//!             eprintln!("{} (field: {:?})", e, e.field());
//!         }
//!     }
//! }
//! ```

pub mod calculator;
pub mod config;
pub mod error;
pub mod format;
pub mod request;
pub mod schedule;

pub use calculator::{
    LoanResult, StartDateEcho, amortized_payment, compute_basic_schedule, compute_extended_schedule,
    payoff_period_count,
};
pub use config::CalculatorConfig;
pub use error::LoanError;
pub use format::{format_currency, format_money, round_money};
pub use request::{LoanForm, LoanRequest, MIN_PRINCIPAL, Variant, validate};
pub use schedule::{
    MAX_SCHEDULE_ROWS, PayoffSimulation, SchedulePeriod, amortization_schedule, simulate_accelerated_payoff,
};
