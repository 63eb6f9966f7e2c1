use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dg_entity::Factory;
use dg_signal::ValueRegistry;
use dg_sim::{SimOptions, SimResult};

#[derive(Parser)]
#[command(name = "dg-cli")]
#[command(about = "Dynamic graph CLI - build and run entity graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entity classes known to the factory
    Classes {
        /// Also show the signals and commands of each class
        #[arg(short, long)]
        verbose: bool,
    },
    /// Check a graph file against the factory
    Validate {
        /// Path to the graph YAML file
        graph_path: PathBuf,
    },
    /// Build a graph and describe its entities
    Inspect {
        /// Path to the graph YAML file
        graph_path: PathBuf,
    },
    /// Build a graph, run its step actions and print recorded signals as CSV
    Run {
        /// Path to the graph YAML file
        graph_path: PathBuf,
        /// Number of steps (overrides the graph file)
        #[arg(long)]
        steps: Option<usize>,
        /// Record every N-th step (overrides the graph file)
        #[arg(long)]
        record_every: Option<usize>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> SimResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    dg_tutorial::init()?;

    let cli = Cli::parse();
    let factory = Factory::global();
    let registry = ValueRegistry::global();

    match cli.command {
        Commands::Classes { verbose } => cmd_classes(factory, verbose),
        Commands::Validate { graph_path } => cmd_validate(&graph_path, factory),
        Commands::Inspect { graph_path } => cmd_inspect(&graph_path, factory, registry),
        Commands::Run {
            graph_path,
            steps,
            record_every,
            output,
        } => cmd_run(
            &graph_path,
            factory,
            registry,
            steps,
            record_every,
            output.as_deref(),
        ),
    }
}

fn cmd_classes(factory: &Factory, verbose: bool) -> SimResult<()> {
    for class in factory.class_names() {
        if verbose {
            let sample = factory.create(&class, "sample")?;
            println!("{}", sample.display());
        } else {
            println!("{class}");
        }
    }
    Ok(())
}

fn cmd_validate(graph_path: &Path, factory: &Factory) -> SimResult<()> {
    println!("Validating graph: {}", graph_path.display());
    let graph = dg_sim::load_yaml(graph_path)?;
    dg_sim::validate(&graph, factory)?;
    println!("✓ Graph is valid");
    Ok(())
}

fn cmd_inspect(graph_path: &Path, factory: &Factory, registry: &ValueRegistry) -> SimResult<()> {
    let graph = dg_sim::load_yaml(graph_path)?;
    let pool = dg_sim::build(&graph, factory, registry)?;

    println!("Graph: {}", graph.name);
    for entity in pool.entities() {
        println!("{}", entity.display());
    }
    Ok(())
}

fn cmd_run(
    graph_path: &Path,
    factory: &Factory,
    registry: &ValueRegistry,
    steps: Option<usize>,
    record_every: Option<usize>,
    output: Option<&Path>,
) -> SimResult<()> {
    let graph = dg_sim::load_yaml(graph_path)?;
    let pool = dg_sim::build(&graph, factory, registry)?;

    let mut opts = SimOptions::from(graph.run.clone());
    if let Some(steps) = steps {
        opts.steps = steps;
    }
    if let Some(record_every) = record_every {
        opts.record_every = record_every;
    }

    info!(graph = %graph.name, steps = opts.steps, "running");
    let record = dg_sim::run_sim(&pool, &graph, registry, &opts)?;

    match output {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            record.write_csv(&mut out)?;
            out.flush()?;
            eprintln!("✓ Wrote {} samples to {}", record.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            record.write_csv(&mut out)?;
        }
    }
    Ok(())
}
