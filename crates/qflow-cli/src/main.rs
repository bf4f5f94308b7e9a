//! qflow CLI: run, validate and explain YAML pipelines over JSON files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use qflow_core::cancel::CancellationSignal;
use qflow_core::config::EngineConfig;
use qflow_exec::Engine;
use qflow_planner::{lower_to_physical, parse_yaml_pipeline, ParsedPipeline};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "qflow")]
#[command(
    about = "qflow: lazy, cancellable query pipelines over JSON documents",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline and print one JSON document per result
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Named input: `name=path` (JSON array or JSON lines). Repeatable.
        #[arg(short, long = "data", value_name = "NAME=PATH")]
        data: Vec<String>,

        /// Lookup element cap (overrides config)
        #[arg(long)]
        max_lookup_elements: Option<usize>,

        /// Trace every yielded element (overrides config)
        #[arg(long)]
        trace_elements: bool,

        /// Print the enumeration report to stderr when done
        #[arg(long)]
        report: bool,
    },

    /// Validate a pipeline YAML file (syntax check)
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the plan tree and plan hash for a pipeline (EXPLAIN)
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            data,
            max_lookup_elements,
            trace_elements,
            report,
        } => {
            if let Err(e) =
                run_pipeline(&pipeline, &data, max_lookup_elements, trace_elements, report).await
            {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { pipeline } => {
            if let Err(e) = validate_pipeline(&pipeline) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Pipeline is valid");
        }
        Commands::Explain { pipeline } => {
            if let Err(e) = explain_pipeline(&pipeline) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run_pipeline(
    pipeline_path: &Path,
    data: &[String],
    max_lookup_elements: Option<usize>,
    trace_elements: bool,
    report: bool,
) -> CliResult<()> {
    let parsed = load_pipeline(pipeline_path)?;

    let mut sources = HashMap::new();
    for arg in data {
        let (name, path) = parse_data_arg(arg)?;
        sources.insert(name.to_string(), read_documents(Path::new(path))?);
    }
    for name in parsed.source_names() {
        if !sources.contains_key(name) {
            return Err(format!("no --data given for source `{}`", name).into());
        }
    }

    let config = apply_cli_overrides(
        parsed.engine_config(EngineConfig::from_env()),
        max_lookup_elements,
        trace_elements,
    );
    let engine = Engine::new(config)?;
    let query = parsed.build(&sources)?;

    // Ctrl-C cancels cooperatively; the in-flight element finishes first.
    let cancel = CancellationSignal::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if report {
        let (rows, report) = engine.run(&query, &cancel).await?;
        for row in &rows {
            println!("{}", row);
        }
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let mut stream = engine.stream(&query, &cancel)?;
        while let Some(row) = stream.try_next().await? {
            println!("{}", row);
        }
    }
    Ok(())
}

fn validate_pipeline(pipeline_path: &Path) -> CliResult<()> {
    let _ = load_pipeline(pipeline_path)?;
    Ok(())
}

fn explain_pipeline(pipeline_path: &Path) -> CliResult<()> {
    let parsed = load_pipeline(pipeline_path)?;
    // Building never reads the sources, so empty placeholders are enough.
    let sources: HashMap<String, Vec<Value>> = parsed
        .source_names()
        .into_iter()
        .map(|n| (n.to_string(), Vec::new()))
        .collect();
    let query = parsed.build(&sources)?;
    let program = lower_to_physical(&query)?;
    let config = parsed.engine_config(EngineConfig::from_env());

    println!("Pipeline Plan");
    println!("=============");
    println!();
    print!("{}", program.plan.render());
    println!();
    println!("Nodes: {}", program.plan.len());
    println!("Depth: {}", program.plan.depth());
    println!("Plan hash: {}", program.plan_hash);
    match config.max_lookup_elements {
        Some(limit) => println!("Lookup limit: {} elements", limit),
        None => println!("Lookup limit: unbounded"),
    }
    Ok(())
}

/// Flags win over the pipeline's `config:` block, which wins over env.
fn apply_cli_overrides(
    mut config: EngineConfig,
    max_lookup_elements: Option<usize>,
    trace_elements: bool,
) -> EngineConfig {
    if let Some(limit) = max_lookup_elements {
        config.max_lookup_elements = Some(limit);
    }
    if trace_elements {
        config.trace_elements = true;
    }
    config
}

fn load_pipeline(path: &Path) -> CliResult<ParsedPipeline> {
    let yaml_content = fs::read_to_string(path)?;
    Ok(parse_yaml_pipeline(&yaml_content)?)
}

fn parse_data_arg(arg: &str) -> CliResult<(&str, &str)> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name, path)),
        _ => Err(format!("expected NAME=PATH, got `{}`", arg).into()),
    }
}

/// A JSON array, or one JSON document per non-empty line.
fn parse_documents(text: &str) -> CliResult<Vec<Value>> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
        return Ok(items);
    }
    let mut out = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        out.push(serde_json::from_str(line)?);
    }
    Ok(out)
}

fn read_documents(path: &Path) -> CliResult<Vec<Value>> {
    parse_documents(&fs::read_to_string(path)?)
}
