//! basic_cleaning CLI - clean a listings dataset artifact
//!
//! ```bash
//! basic_cleaning \
//!     --input_artifact sample.csv:latest \
//!     --output_artifact clean_sample.csv \
//!     --output_type clean_sample \
//!     --output_description "Data with outliers and null values removed" \
//!     --min_price 10 \
//!     --max_price 350
//! ```
//!
//! The artifact store is picked from the environment (see `config`).

use std::path::PathBuf;
use std::process::ExitCode;

use basic_cleaning::clean::{run, CleaningOptions, OutputSpec, PriceRange};
use basic_cleaning::store::{validate_name, ArtifactRef, Store};
use basic_cleaning::{logging, Config};
use clap::{ArgAction, Parser};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "basic_cleaning", version)]
#[command(about = "A very basic data cleaning", long_about = None)]
struct Cli {
    /// Input artifact reference (e.g. sample.csv:latest)
    #[arg(long = "input_artifact")]
    input_artifact: ArtifactRef,

    /// Output artifact name (e.g. clean_sample.csv)
    #[arg(long = "output_artifact", value_parser = parse_artifact_name)]
    output_artifact: String,

    /// Output artifact type
    #[arg(long = "output_type")]
    output_type: String,

    /// Output artifact description
    #[arg(long = "output_description")]
    output_description: String,

    /// Minimum price to keep (inclusive, e.g. 10)
    #[arg(long = "min_price", value_parser = parse_price, allow_negative_numbers = true)]
    min_price: f64,

    /// Maximum price to keep (inclusive, e.g. 350)
    #[arg(long = "max_price", value_parser = parse_price, allow_negative_numbers = true)]
    max_price: f64,

    /// Local file for the cleaned CSV (default: ./<output_artifact>)
    #[arg(long = "output_path")]
    output_path: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn options(&self) -> CleaningOptions {
        let mut output = OutputSpec::new(
            self.output_artifact.clone(),
            self.output_type.clone(),
            self.output_description.clone(),
        );
        if let Some(ref path) = self.output_path {
            output = output.with_local_path(path.clone());
        }

        CleaningOptions {
            input_artifact: self.input_artifact.clone(),
            output,
            price_range: PriceRange::new(self.min_price, self.max_price),
        }
    }
}

fn parse_artifact_name(s: &str) -> Result<String, String> {
    validate_name(s)
        .map(|_| s.to_string())
        .map_err(|e| e.to_string())
}

fn parse_price(s: &str) -> Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|_| format!("'{}' is not a number", s))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", s));
    }
    Ok(value)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.log_format, logging::level_override(cli.verbose, cli.quiet));

    match execute(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: &Cli, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::from_config(&config.store)?;
    let options = cli.options();

    let report = run(&store, &options).await?;

    info!(
        input = %report.input,
        output = %report.output.reference(),
        rows_in = report.rows_in,
        rows_after_price_filter = report.rows_after_price_filter,
        rows_out = report.rows_out,
        "Cleaning finished: kept {} of {} rows",
        report.rows_out,
        report.rows_in
    );
    Ok(())
}
