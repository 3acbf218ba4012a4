use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use dieta_core::{Catalog, DietError, EncodingPolicy, ErrorClass, LoaderConfig, Outcome};
use dieta_solver::Simplex;

#[derive(Parser)]
#[command(name = "dieta")]
#[command(about = "Least-cost diet formulation from nutrient and food tables", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the diet problem and print the cheapest diet
    Solve {
        #[command(flatten)]
        inputs: Inputs,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        /// Simplex pivot limit
        #[arg(long, default_value_t = 10000)]
        max_iterations: usize,
        /// Simplex pivot and feasibility tolerance
        #[arg(long, default_value_t = 1e-9)]
        tolerance: f64,
    },
    /// Check both tables for errors
    Check {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Print the standard-form LP built from the tables
    Model {
        #[command(flatten)]
        inputs: Inputs,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ModelFormat::Pretty)]
        format: ModelFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModelFormat {
    Pretty,
    Json,
}

#[derive(Args)]
struct Inputs {
    /// Nutrient table (columns: nutrients, minimum)
    #[arg(short, long, default_value = "nutrientes.csv")]
    nutrients: PathBuf,
    /// Food table (columns: ingrediente, quantidade, preco, one per nutrient)
    #[arg(long, default_value = "ingrediente.csv")]
    foods: PathBuf,
    /// Encoding of the food table (utf-8, latin-1, utf-8-or-latin-1)
    #[arg(long, default_value = "utf-8-or-latin-1")]
    encoding: EncodingPolicy,
    /// Encoding of the nutrient table
    #[arg(long, default_value = "utf-8")]
    nutrient_encoding: EncodingPolicy,
    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,
}

const HINT: &str = "Check that both CSV files exist at the given paths and that their first line holds the expected column names.";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            inputs,
            format,
            max_iterations,
            tolerance,
        } => {
            let catalog = load(&inputs);
            let solver = Simplex::new()
                .with_max_iterations(max_iterations)
                .with_tolerance(tolerance);
            let report = match dieta_core::solve(&catalog, &solver) {
                Ok(r) => r,
                Err(e) => fail(e.into()),
            };

            if format == ReportFormat::Json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing report: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print!("{}", report);
            }

            let code = outcome_code(report.outcome());
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Check { inputs } => {
            let catalog = load(&inputs);
            if let Err(e) = catalog.formulate() {
                eprintln!("✗ {} does not cover every nutrient:", inputs.foods.display());
                fail(e.into());
            }

            println!(
                "✓ {} and {} are valid",
                inputs.nutrients.display(),
                inputs.foods.display()
            );
            println!("  {} nutrients", catalog.nutrients().len());
            println!("  {} foods", catalog.foods().len());
        }
        Commands::Model { inputs, format } => {
            let catalog = load(&inputs);
            let model = match catalog.formulate() {
                Ok(m) => m,
                Err(e) => fail(e.into()),
            };

            if format == ModelFormat::Json {
                match serde_json::to_string_pretty(&model) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing model: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print!("{}", model);
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(inputs: &Inputs) -> Catalog {
    let delimiter = match u8::try_from(inputs.delimiter) {
        Ok(b) if b.is_ascii() => b,
        _ => {
            eprintln!("Error: delimiter must be a single ASCII character, got '{}'", inputs.delimiter);
            std::process::exit(2);
        }
    };

    let config = LoaderConfig::default()
        .with_delimiter(delimiter)
        .with_food_encoding(inputs.encoding)
        .with_nutrient_encoding(inputs.nutrient_encoding);

    match dieta_core::load_catalog(&inputs.nutrients, &inputs.foods, &config) {
        Ok(c) => c,
        Err(e) => fail(e.into()),
    }
}

fn fail(err: DietError) -> ! {
    eprintln!("Error: {}", err);
    eprintln!();
    eprintln!("{}", HINT);
    std::process::exit(exit_code(err.class()));
}

fn exit_code(class: ErrorClass) -> i32 {
    match class {
        ErrorClass::Io => 1,
        ErrorClass::SourceNotFound => 3,
        ErrorClass::Encoding => 4,
        ErrorClass::Structural => 5,
        ErrorClass::Type => 6,
    }
}

fn outcome_code(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Optimal => 0,
        Outcome::Infeasible => 7,
        Outcome::SolverFailure => 8,
    }
}
