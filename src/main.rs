use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::Table;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use sosser_calculator::{
    CalculatorConfig, LoanForm, LoanResult, PayoffSimulation, Variant, compute_basic_schedule,
    compute_extended_schedule, format_currency, simulate_accelerated_payoff, validate,
};

/// Loan payment calculator for Sosser members
#[derive(Parser)]
#[command(
    name = "sosser-calc",
    version,
    about = "Loan payment calculator for Sosser members",
    long_about = "Estimates loan payments the way the Sosser website calculator does. \
                  Defaults can be set with SOSSER_PAYMENTS_PER_YEAR, SOSSER_STRICT_RATE \
                  and SOSSER_CURRENCY_SYMBOL, from the environment or a .env file."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment, total interest and total cost
    Basic(LoanArgs),
    /// Payment with custom frequency and extra payments
    Extended(ExtendedArgs),
    /// Period-by-period table, applying extra payments every period
    Schedule(ExtendedArgs),
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Args)]
struct LoanArgs {
    /// Loan amount
    #[arg(long, allow_hyphen_values = true)]
    amount: String,
    /// Annual interest rate in percent, e.g. 5.5
    #[arg(long, allow_hyphen_values = true)]
    rate: String,
    /// Loan term in years
    #[arg(long, allow_hyphen_values = true)]
    term: String,
}

#[derive(Args)]
struct ExtendedArgs {
    #[command(flatten)]
    loan: LoanArgs,
    /// Payments per year
    #[arg(long, allow_hyphen_values = true)]
    frequency: Option<String>,
    /// Extra amount paid towards principal each period
    #[arg(long, allow_hyphen_values = true)]
    extra: Option<String>,
    /// First payment is one period after this date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,
}

impl From<&LoanArgs> for LoanForm {
    fn from(args: &LoanArgs) -> Self {
        LoanForm::new(&args.amount, &args.rate, &args.term)
    }
}

impl From<&ExtendedArgs> for LoanForm {
    fn from(args: &ExtendedArgs) -> Self {
        LoanForm {
            payments_per_year: args.frequency.clone(),
            extra_payment: args.extra.clone(),
            start_date: args.start_date.clone(),
            ..LoanForm::from(&args.loan)
        }
    }
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CalculatorConfig::from_env().context("invalid calculator configuration")?;
    tracing::debug!(?config, "loaded calculator configuration");

    match &cli.command {
        Commands::Basic(args) => {
            let request = validate(&args.into(), Variant::Basic, &config)?;
            let result = compute_basic_schedule(&request)?;
            emit(&cli.output, &result, || summary_table(&result, "Monthly Payment", &config))
        }
        Commands::Extended(args) => {
            let request = validate(&args.into(), Variant::Extended, &config)?;
            let result = compute_extended_schedule(&request)?;
            emit(&cli.output, &result, || summary_table(&result, "Payment per Period", &config))
        }
        Commands::Schedule(args) => {
            let request = validate(&args.into(), Variant::Extended, &config)?;
            let simulation = simulate_accelerated_payoff(&request)?;
            emit(&cli.output, &simulation, || schedule_table(&simulation, &config))
        }
    }
}

fn emit<T, F>(format: &OutputFormat, value: &T, render_table: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("failed to serialize result")?;
            println!("{json}");
        }
        OutputFormat::Table => println!("{}", render_table()),
    }
    Ok(())
}

fn summary_table(result: &LoanResult, payment_label: &str, config: &CalculatorConfig) -> String {
    let money = |amount| format_currency(amount, &config.currency_symbol);

    let mut builder = Builder::default();
    builder.push_record(["Item", "Value"]);
    builder.push_record([payment_label, &money(result.periodic_payment)]);
    builder.push_record(["Number of Payments", &result.scheduled_payment_count.to_string()]);
    builder.push_record(["Total Interest Paid", &money(result.total_interest)]);
    if let Some(total_cost) = result.total_cost {
        builder.push_record(["Total Cost of Loan", &money(total_cost)]);
    }
    if let Some(actual) = result.actual_payment_count {
        builder.push_record(["Payments with Extra", &actual.to_string()]);
    }
    if let Some(early) = result.total_early_payment_amount {
        builder.push_record(["Total Early Payments", &money(early)]);
    }
    if let Some(start) = &result.start_date_echo {
        builder.push_record(["Start Date", &start.to_string()]);
    }

    Table::from(builder).with(Style::rounded()).to_string()
}

fn schedule_table(simulation: &PayoffSimulation, config: &CalculatorConfig) -> String {
    let money = |amount| format_currency(amount, &config.currency_symbol);

    let mut rows = Builder::default();
    rows.push_record(["#", "Date", "Payment", "Interest", "Principal", "Extra", "Balance"]);
    for row in &simulation.schedule {
        let date = row
            .payment_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        rows.push_record([
            row.period.to_string(),
            date,
            money(row.payment),
            money(row.interest),
            money(row.principal),
            money(row.extra_payment),
            money(row.balance),
        ]);
    }

    let mut summary = Builder::default();
    summary.push_record(["Item", "Value"]);
    summary.push_record(["Payments".to_string(), simulation.payment_count.to_string()]);
    summary.push_record(["Payments Saved".to_string(), simulation.periods_saved.to_string()]);
    summary.push_record(["Total Interest Paid".to_string(), money(simulation.total_interest)]);
    summary.push_record(["Interest Saved".to_string(), money(simulation.interest_saved)]);
    summary.push_record(["Total Extra Paid".to_string(), money(simulation.total_extra_paid)]);

    format!(
        "{}\n{}",
        Table::from(rows).with(Style::rounded()),
        Table::from(summary).with(Style::rounded())
    )
}
