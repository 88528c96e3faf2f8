//! Calculator defaults, overridable from the environment.
//!
//! | Variable                     | Default | Meaning                                      |
//! |------------------------------|---------|----------------------------------------------|
//! | `SOSSER_PAYMENTS_PER_YEAR`   | `12`    | frequency used when the form leaves it blank |
//! | `SOSSER_STRICT_RATE`         | `false` | reject a 0% rate instead of special-casing it |
//! | `SOSSER_CURRENCY_SYMBOL`     | `$`     | prefix used when rendering money             |

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

pub const PAYMENTS_PER_YEAR_VAR: &str = "SOSSER_PAYMENTS_PER_YEAR";
pub const STRICT_RATE_VAR: &str = "SOSSER_STRICT_RATE";
pub const CURRENCY_SYMBOL_VAR: &str = "SOSSER_CURRENCY_SYMBOL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Payments per year assumed when the form does not supply one.
    pub default_payments_per_year: u32,
    /// When set, a 0% rate is rejected as `InvalidRate`.
    pub strict_rate: bool,
    pub currency_symbol: String,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            default_payments_per_year: 12,
            strict_rate: false,
            currency_symbol: "$".to_string(),
        }
    }
}

impl CalculatorConfig {
    /// Reads the `SOSSER_*` variables from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(PAYMENTS_PER_YEAR_VAR) {
            let value: u32 = raw
                .trim()
                .parse()
                .with_context(|| format!("{PAYMENTS_PER_YEAR_VAR} must be a positive integer, got {raw:?}"))?;
            if value == 0 {
                bail!("{PAYMENTS_PER_YEAR_VAR} must be greater than zero");
            }
            config.default_payments_per_year = value;
        }

        if let Some(raw) = lookup(STRICT_RATE_VAR) {
            config.strict_rate = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => bail!("{STRICT_RATE_VAR} must be a boolean, got {raw:?}"),
            };
        }

        if let Some(raw) = lookup(CURRENCY_SYMBOL_VAR) {
            config.currency_symbol = raw;
        }

        Ok(config)
    }
}
