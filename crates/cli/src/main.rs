//! panelcut command-line tool.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use panelcut_cabinet::{
    parse_panels, BrandResult, OptimizeRequest, Optimizer, OptimizerConfig, RawPanel,
};
use panelcut_cli::{group_report, read_json, run_report, write_json, KitchenGenerator};
use panelcut_core::{Config, Part, Sheet, Solver, Strategy};
use panelcut_sheet::SheetNester;
use panelcut_worker::PartRequest;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "panelcut")]
#[command(about = "2D sheet cutting-stock optimizer for cabinet panels")]
#[command(version)]
struct Cli {
    /// Log search statistics (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize raw cabinet panels grouped by material
    Optimize {
        /// JSON array of raw panels
        input: PathBuf,

        /// Mark a laminate grain sensitive (repeatable)
        #[arg(short, long)]
        grain: Vec<String>,

        #[command(flatten)]
        solver: SolverArgs,

        /// Output file for results (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Pack already mapped parts on one material
    Pack {
        /// JSON array of parts ({id, width, height, quantity?, rotateAllowed?})
        input: PathBuf,

        #[command(flatten)]
        solver: SolverArgs,

        /// Output file for results (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Insert extra panels into a sheet of an earlier optimize result
    Insert {
        /// Results JSON written by `optimize`
        results: PathBuf,

        /// Target sheet id, e.g. "century ply|||walnut::0"
        #[arg(short, long)]
        target: String,

        /// JSON array of raw panels to insert
        #[arg(short, long)]
        panels: PathBuf,

        #[command(flatten)]
        solver: SolverArgs,

        /// Output file for results (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Optimize a synthetic kitchen run
    Demo {
        /// Number of base cabinets
        #[arg(short, long, default_value = "6")]
        cabinets: usize,

        /// Generator seed
        #[arg(long, default_value = "42")]
        demo_seed: u64,

        #[command(flatten)]
        solver: SolverArgs,

        /// Output file for results (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SolverArgs {
    /// Sheet width in mm
    #[arg(long, default_value = "1220")]
    sheet_width: f64,

    /// Sheet height in mm
    #[arg(long, default_value = "2440")]
    sheet_height: f64,

    /// Saw kerf in mm
    #[arg(short, long, default_value = "4")]
    kerf: f64,

    /// Search budget per material group in milliseconds
    #[arg(long, default_value = "80")]
    time_ms: u64,

    /// Stop after this many search iterations
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Free-rectangle scoring heuristic
    #[arg(short, long, value_enum, default_value = "baf")]
    strategy: StrategyArg,

    /// PRNG seed (random when omitted; the used seed is reported)
    #[arg(long)]
    seed: Option<u32>,

    /// Pack material groups one after another
    #[arg(long)]
    sequential: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Best Area Fit
    Baf,
    /// Best Short Side Fit
    Bssf,
    /// Best Long Side Fit
    Blsf,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Baf => Strategy::BestAreaFit,
            StrategyArg::Bssf => Strategy::BestShortSideFit,
            StrategyArg::Blsf => Strategy::BestLongSideFit,
        }
    }
}

impl SolverArgs {
    fn sheet(&self) -> Sheet {
        Sheet::new(self.sheet_width, self.sheet_height, self.kerf)
    }

    fn config(&self) -> Config {
        let mut config = Config::new()
            .with_strategy(self.strategy.into())
            .with_time_limit(self.time_ms);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(iterations) = self.max_iterations {
            config = config.with_max_iterations(iterations);
        }
        config
    }

    fn optimizer_config(&self, grain: &[String]) -> OptimizerConfig {
        grain.iter().fold(
            OptimizerConfig::new()
                .with_sheet(self.sheet())
                .with_solver(self.config())
                .with_parallel(!self.sequential),
            |config, laminate| config.with_grain_preference(laminate, true),
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Optimize {
            input,
            grain,
            solver,
            output,
        } => {
            let raw: serde_json::Value = read_json(&input)?;
            let panels = parse_panels(&raw);
            let results = run_optimize(panels, solver.optimizer_config(&grain))?;
            finish_groups(&results, output)?;
        }

        Commands::Pack {
            input,
            solver,
            output,
        } => {
            let requests: Vec<PartRequest> = read_json(&input)?;
            let parts: Vec<Part> = requests.into_iter().map(Part::from).collect();
            let result = SheetNester::new(solver.config())
                .solve(&parts, &solver.sheet())
                .context("Packing failed")?;
            eprintln!("{}", run_report(&result));
            write_json(&result, output.as_deref())?;
        }

        Commands::Insert {
            results,
            target,
            panels,
            solver,
            output,
        } => {
            let existing: Vec<BrandResult> = read_json(&results)?;
            let raw: serde_json::Value = read_json(&panels)?;
            let updated = Optimizer::new(solver.optimizer_config(&[]))
                .insert_manual(&existing, &target, &parse_panels(&raw))
                .with_context(|| format!("Insertion into {} failed", target))?;
            finish_groups(&updated, output)?;
        }

        Commands::Demo {
            cabinets,
            demo_seed,
            solver,
            output,
        } => {
            let panels = KitchenGenerator::with_seed(demo_seed).cabinets(cabinets);
            eprintln!("Generated {} panel(s) for {} cabinet(s)", panels.len(), cabinets);
            let results = run_optimize(panels, solver.optimizer_config(&[]))?;
            finish_groups(&results, output)?;
        }
    }

    Ok(())
}

fn run_optimize(panels: Vec<RawPanel>, config: OptimizerConfig) -> Result<Vec<BrandResult>> {
    Optimizer::new(config)
        .optimize(&OptimizeRequest::new(panels))
        .context("Optimization failed")
}

fn finish_groups(results: &[BrandResult], output: Option<PathBuf>) -> Result<()> {
    eprint!("{}", group_report(results));
    write_json(&results, output.as_deref())
}
