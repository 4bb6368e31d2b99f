use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use stand_projection::{
    forward::{ExecutionStep, ForwardEngine},
    io::{self, PolygonReader},
    models::PolygonBank,
    site_index::{
        age_from_height, convert, height_from_age, site_index_from_height,
        site_index_with_estimated_y2bh, years_to_breast_height, AgeType, EquationRegistry,
        SiteCurve,
    },
    visualization::{print_bank_table, print_curve_catalogue, print_ranking_summary},
    ProjectionConfig,
};

#[derive(Parser)]
#[command(
    name = "stand-projector",
    about = "Stand Projector - site-index equations and forward polygon processing",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the forward stages over every polygon of a layer file
    Process {
        /// Path to input file (CSV or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Last stage to run, overriding the configuration
        #[arg(short, long)]
        last_step: Option<ExecutionStep>,

        /// Write processed banks to this file (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Print only the ranking summary, not every bank
        #[arg(long)]
        summary: bool,
    },

    /// Age at which a tree reaches a height
    Age {
        #[arg(short, long)]
        curve: SiteCurve,

        /// Height (m)
        #[arg(long)]
        height: f64,

        #[arg(short, long)]
        site_index: f64,

        #[arg(short, long, default_value = "breast_height")]
        age_type: AgeType,

        /// Years to breast height; estimated from the curve when omitted
        #[arg(long)]
        y2bh: Option<f64>,
    },

    /// Height of a tree at an age
    Height {
        #[arg(short, long)]
        curve: SiteCurve,

        #[arg(long)]
        age: f64,

        #[arg(short, long)]
        site_index: f64,

        #[arg(short, long, default_value = "breast_height")]
        age_type: AgeType,

        #[arg(long)]
        y2bh: Option<f64>,
    },

    /// Site index implied by a height at an age
    SiteIndex {
        #[arg(short, long)]
        curve: SiteCurve,

        #[arg(long)]
        age: f64,

        /// Height (m)
        #[arg(long)]
        height: f64,

        #[arg(short, long, default_value = "breast_height")]
        age_type: AgeType,

        /// Years to breast height (total-age inputs only); estimated from
        /// the curve when omitted
        #[arg(long)]
        y2bh: Option<f64>,
    },

    /// Convert a site index from one curve to another
    Convert {
        #[arg(short, long)]
        from: SiteCurve,

        #[arg(short, long)]
        to: SiteCurve,

        #[arg(short, long)]
        site_index: f64,
    },

    /// Years a tree takes to reach breast height
    Y2bh {
        #[arg(short, long)]
        curve: SiteCurve,

        #[arg(short, long)]
        site_index: f64,
    },

    /// List every known site curve
    Curves,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn write_banks(banks: &[PolygonBank], output: &Path, pretty: bool) -> Result<()> {
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::create(output)
                .with_context(|| format!("creating {}", output.display()))?;
            io::write_banks_csv(banks, file)?;
        }
        "json" => std::fs::write(output, io::banks_to_json(banks, pretty)?)?,
        _ => anyhow::bail!("Unsupported output format: .{ext}. Use .csv or .json"),
    }
    Ok(())
}

fn y2bh_or_estimate(curve: SiteCurve, site_index: f64, y2bh: Option<f64>) -> Result<f64> {
    match y2bh {
        Some(value) => Ok(value),
        None => Ok(years_to_breast_height(curve, site_index)?),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            config,
            last_step,
            output,
            pretty,
            summary,
        } => {
            let config = match config {
                Some(path) => ProjectionConfig::load(&path)
                    .with_context(|| format!("loading configuration {}", path.display()))?,
                None => ProjectionConfig::default(),
            };
            let engine = ForwardEngine::from_config(&config);
            let last_step = last_step.unwrap_or(engine.last_step());

            let polygons = io::reader_for(&input).read(&input)?;
            println!(
                "\n{}",
                format!("Forward processing: {} ({} polygons)", input.display(), polygons.len())
                    .bold()
                    .cyan()
            );

            let engine = ForwardEngine::new(engine.context().clone(), last_step);
            let mut banks = Vec::with_capacity(polygons.len());
            let mut failures = 0usize;
            for (polygon, result) in polygons.iter().zip(engine.process_polygons(&polygons)) {
                match result {
                    Ok(bank) => banks.push(bank),
                    Err(e) => {
                        failures += 1;
                        eprintln!("{} polygon {}: {e}", "Warning:".yellow(), polygon.description);
                    }
                }
            }

            if !summary {
                for bank in &banks {
                    print_bank_table(bank);
                }
            }
            print_ranking_summary(&banks);

            if let Some(output) = output {
                write_banks(&banks, &output, pretty)?;
                println!(
                    "{} Wrote {} banks -> {}",
                    "Success:".green().bold(),
                    banks.len(),
                    output.display()
                );
            }

            if failures > 0 {
                println!("{} of {} polygons failed", failures, polygons.len());
            }
        }

        Commands::Age {
            curve,
            height,
            site_index,
            age_type,
            y2bh,
        } => {
            let y2bh = y2bh_or_estimate(curve, site_index, y2bh)?;
            let age = age_from_height(curve, height, age_type, site_index, y2bh)?;
            println!("{age:.2}");
        }

        Commands::Height {
            curve,
            age,
            site_index,
            age_type,
            y2bh,
        } => {
            let y2bh = y2bh_or_estimate(curve, site_index, y2bh)?;
            let height = height_from_age(curve, age, age_type, site_index, y2bh)?;
            println!("{height:.2}");
        }

        Commands::SiteIndex {
            curve,
            age,
            height,
            age_type,
            y2bh,
        } => {
            let si = match y2bh {
                Some(y2bh) => site_index_from_height(curve, age, age_type, height, y2bh)?,
                None => site_index_with_estimated_y2bh(curve, age, age_type, height)?,
            };
            println!("{si:.2}");
        }

        Commands::Convert {
            from,
            to,
            site_index,
        } => {
            let si = convert(from, site_index, to)?;
            println!("{si:.2}");
        }

        Commands::Y2bh { curve, site_index } => {
            let years = years_to_breast_height(curve, site_index)?;
            println!("{years:.2}");
        }

        Commands::Curves => print_curve_catalogue(EquationRegistry::all()),
    }

    Ok(())
}
