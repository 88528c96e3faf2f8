//! Presentation helpers for monetary figures.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders an amount with two decimals and comma thousands separators: `10,661.85`.
pub fn format_money(amount: Decimal) -> String {
    let fixed = format!("{:.2}", round_money(amount));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, cents) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{cents}")
}

/// [`format_money`] with a currency prefix, sign first: `-$1,000.00`.
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let money = format_money(amount);
    match money.strip_prefix('-') {
        Some(rest) => format!("-{symbol}{rest}"),
        None => format!("{symbol}{money}"),
    }
}
