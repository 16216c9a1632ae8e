use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use loan_calculator::{
    error::LoanError,
    loan::{AmortizationSchedule, LoanTerms},
    report,
};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{fs, io, path::Path, process};

/// Fixed-rate loan / mortgage calculator
#[derive(Parser, Debug)]
#[command(
    name = "loan-calc",
    version,
    about = "Loan/Mortgage Calculator",
    long_about = "Computes the fixed monthly payment of a loan and its full amortization \
                  schedule, printed as a table with a remaining-balance chart, or exported \
                  as CSV or JSON."
)]
struct Cli {
    /// Loan amount ($)
    #[arg(long, default_value_t = 250000.0)]
    amount: f64,

    /// Annual interest rate (%)
    #[arg(long, default_value_t = 5.0)]
    rate: f64,

    /// Loan term (years)
    #[arg(long, default_value_t = 30)]
    years: u32,

    /// Read loan terms from a JSON file ({"principal", "annual_rate", "term_years"})
    #[arg(long)]
    input: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Skip the balance chart in table output
    #[arg(long)]
    no_chart: bool,

    #[arg(long, default_value_t = report::DEFAULT_CHART_WIDTH)]
    chart_width: usize,

    #[arg(long, default_value_t = report::DEFAULT_CHART_HEIGHT)]
    chart_height: usize,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!("logger init failed: {}", e);
    }

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), LoanError> {
    let terms = match cli.input {
        Some(ref path) => read_terms(path)?,
        None => LoanTerms::new(cli.amount, cli.rate, cli.years)?,
    };
    info!(
        "calculating {} at {}% over {} years",
        terms.principal(),
        terms.annual_rate(),
        terms.term_years()
    );

    let pmt_amount = terms.monthly_payment();
    let schedule = terms.schedule();

    match cli.output {
        OutputFormat::Table => print_report(cli, &terms, pmt_amount, &schedule),
        OutputFormat::Csv => report::write_csv(&schedule, io::stdout().lock())?,
        OutputFormat::Json => println!("{}", report::to_json(pmt_amount, &schedule)?),
        OutputFormat::Minimal => println!("{}", report::format_currency(pmt_amount)),
    }
    Ok(())
}

fn print_report(cli: &Cli, terms: &LoanTerms, pmt_amount: f64, schedule: &AmortizationSchedule) {
    println!("{}", "Loan/Mortgage Calculator".bold());
    println!();
    print!("{}", report::render_summary(terms, pmt_amount, schedule));
    println!();
    println!("Amortization Schedule");
    println!("{}", report::render_table(schedule));
    if !cli.no_chart {
        println!();
        print!(
            "{}",
            report::render_balance_chart(schedule, cli.chart_width, cli.chart_height)
        );
    }
}

fn read_terms(path: &str) -> Result<LoanTerms, LoanError> {
    let p = Path::new(path);
    if !p.is_file() {
        return Err(LoanError::invalid_input(
            "input",
            format!("'{}' is not a readable file", p.display()),
        ));
    }
    let contents = fs::read_to_string(p)?;
    Ok(serde_json::from_str(&contents)?)
}

// verifies that types can implement the gated traits below
#[allow(dead_code)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<LoanTerms>();
    is_normal::<loan_calculator::loan::AmortizationRow>();
    is_normal::<AmortizationSchedule>();
}

#[test]
fn cli_defaults_match_form() {
    let cli = Cli::parse_from(["loan-calc"]);
    assert_eq!(cli.amount, 250000.0);
    assert_eq!(cli.rate, 5.0);
    assert_eq!(cli.years, 30);
    assert!(matches!(cli.output, OutputFormat::Table));
}

#[test]
fn read_terms_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loan.json");
    fs::write(&path, r#"{"principal": 10000.0, "annual_rate": 0.0, "term_years": 1}"#).unwrap();

    let terms = read_terms(path.to_str().unwrap()).unwrap();
    assert_eq!(terms, LoanTerms::new(10000., 0., 1).unwrap());
}

#[test]
fn read_terms_rejects_bad_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        read_terms(missing.to_str().unwrap()),
        Err(LoanError::InvalidInput { .. })
    ));

    let malformed = dir.path().join("malformed.json");
    fs::write(&malformed, "{ not json").unwrap();
    assert!(matches!(
        read_terms(malformed.to_str().unwrap()),
        Err(LoanError::Serialization(_))
    ));

    let negative = dir.path().join("negative.json");
    fs::write(&negative, r#"{"principal": -1.0, "annual_rate": 5.0, "term_years": 30}"#).unwrap();
    assert!(read_terms(negative.to_str().unwrap()).is_err());
}

#[test]
fn run_validates_flags() {
    let cli = Cli::parse_from(["loan-calc", "--output", "minimal"]);
    assert!(run(&cli).is_ok());

    let cli = Cli::parse_from(["loan-calc", "--years", "0", "--output", "minimal"]);
    match run(&cli) {
        Err(LoanError::InvalidInput { field, .. }) => assert_eq!(field, "term_years"),
        other => panic!("expected invalid term, got {:?}", other),
    }
}
