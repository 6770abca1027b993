//! Beam Planning CLI
//!
//! Assigns satellite beams to users from a scenario file.
//!
//! Usage:
//!   plan-beams scenarios/test_case.txt
//!   plan-beams scenarios/test_case.txt --colors A,B,C,D --max-beams 32 --format json
//!   plan-beams scenarios/test_case.txt --config planner.json --sequential -o plan.txt

use anyhow::{Context, Result};
use beam_planning::{
    loader, report, BeamPlanner, Color, ExecutionMode, IterationOrder, PlannerConfig,
};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Order {
    AsLoaded,
    ById,
}

impl From<Order> for IterationOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::AsLoaded => IterationOrder::AsLoaded,
            Order::ById => IterationOrder::ById,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "plan-beams",
    about = "Assign satellite beams to ground users under capacity and separation limits"
)]
struct Args {
    /// Scenario file (`user|sat|interferer <id> <x> <y> <z>` per line)
    input: PathBuf,

    /// JSON planner configuration; command-line limits override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Beam capacity per satellite
    #[arg(long)]
    max_beams: Option<usize>,

    /// Minimum same-color separation at the satellite, degrees
    #[arg(long)]
    same_color_limit: Option<f64>,

    /// Minimum interferer separation at the user, degrees
    #[arg(long)]
    interferer_limit: Option<f64>,

    /// Maximum beam tilt from the user's vertical, degrees
    #[arg(long)]
    user_sat_limit: Option<f64>,

    /// Comma-separated color labels
    #[arg(long, value_delimiter = ',')]
    colors: Option<Vec<String>>,

    /// Worker threads for the color passes
    #[arg(long)]
    workers: Option<usize>,

    /// Run color passes one after another in palette order
    #[arg(long)]
    sequential: bool,

    /// Visiting order of satellites and users
    #[arg(long, value_enum)]
    order: Option<Order>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn planner_config(&self) -> Result<PlannerConfig> {
        let mut config = match &self.config {
            Some(path) => PlannerConfig::from_json_file(path)
                .with_context(|| format!("reading config {:?}", path))?,
            None => PlannerConfig::default(),
        };

        if let Some(n) = self.max_beams {
            config = config.with_max_beams(n);
        }
        if let Some(deg) = self.same_color_limit {
            config = config.with_same_color_limit(deg);
        }
        if let Some(deg) = self.interferer_limit {
            config = config.with_interferer_limit(deg);
        }
        if let Some(deg) = self.user_sat_limit {
            config = config.with_user_sat_limit(deg);
        }
        if let Some(labels) = &self.colors {
            config = config.with_colors(labels.iter().map(|l| Color::new(l.trim())).collect());
        }
        if let Some(n) = self.workers {
            config = config.with_workers(n);
        }
        if self.sequential {
            config = config.with_execution(ExecutionMode::Sequential);
        }
        if let Some(order) = self.order {
            config = config.with_order(order.into());
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so the listing on stdout stays clean
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.planner_config()?;
    let planner = BeamPlanner::new(config)?;

    let constellation = loader::load_file(&args.input)
        .with_context(|| format!("loading scenario {:?}", args.input))?;
    let plan = planner.plan(constellation)?;

    let out: Box<dyn Write> = match &args.output {
        Some(path) => {
            info!("Writing output to {:?}", path);
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    match args.format {
        OutputFormat::Text => report::write_listing(&plan, out)?,
        OutputFormat::Json => report::write_json(&plan, planner.config(), out)?,
    }

    let summary = plan.report();
    info!(
        "{} beams across {} satellites, {} of {} users served",
        summary.total_beams,
        plan.satellites().len(),
        summary.connected_users,
        plan.users().len()
    );
    if summary.degenerate_evaluations > 0 {
        info!(
            "{} candidate evaluations hit degenerate geometry (coincident entities?)",
            summary.degenerate_evaluations
        );
    }

    Ok(())
}
