//! smerge CLI: run, check, and explain sorted merges.

use clap::{Args, Parser, Subcommand};
use smerge_core::config::MergeConfig;
use smerge_exec::Engine;
use smerge_operators::CancelToken;
use smerge_planner::dsl::yaml::{to_schema, FieldDef, InputSpec, SinkSpec};
use smerge_planner::{
    explain, parse_yaml_pipeline, ParsedPipeline, PipelineConfig, SinkFormat,
    SortedMergeDescriptor, TransformMeta,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "smerge")]
#[command(about = "Order-preserving k-way merge of pre-sorted CSV streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of environment and pipeline settings.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Verify that every input arrives in key order
    #[arg(long)]
    check_sorted: Option<bool>,

    /// Reject descriptor ascending tokens other than Y/N
    #[arg(long)]
    strict_descriptor: Option<bool>,

    /// Rows buffered per upstream reader thread
    #[arg(long)]
    channel_capacity: Option<usize>,

    /// Rows written between sink flushes
    #[arg(long)]
    batch_size: Option<usize>,
}

impl ConfigArgs {
    fn apply(&self, cfg: &mut MergeConfig) {
        PipelineConfig {
            check_sorted: self.check_sorted,
            strict_descriptor: self.strict_descriptor,
            channel_capacity: self.channel_capacity,
            batch_size: self.batch_size,
        }
        .apply(cfg);
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Merge CSV files using a descriptor XML file
    Merge {
        /// Descriptor XML with the <fields> key list
        #[arg(short, long)]
        descriptor: PathBuf,

        /// Input CSV file (repeat; order decides tie-breaking)
        #[arg(short, long = "input", required = true)]
        inputs: Vec<PathBuf>,

        /// YAML list of {name, type} column definitions shared by all inputs
        #[arg(short, long)]
        schema: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: csv or jsonl
        #[arg(long, default_value = "csv")]
        format: String,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Execute a merge pipeline from a YAML file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Check a pipeline's keys against its inputs
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the merge plan for a pipeline
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Merge {
            descriptor,
            inputs,
            schema,
            output,
            format,
            config,
        } => merge_files(&descriptor, &inputs, &schema, &output, &format, &config),
        Commands::Run { pipeline, config } => run_pipeline(&pipeline, &config),
        Commands::Validate { pipeline } => validate_pipeline(&pipeline),
        Commands::Explain { pipeline, config } => explain_pipeline(&pipeline, &config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// defaults < environment < pipeline `config:` < command line
fn resolve_config(pipeline: Option<&PipelineConfig>, args: &ConfigArgs) -> MergeConfig {
    let mut cfg = MergeConfig::from_env();
    if let Some(p) = pipeline {
        p.apply(&mut cfg);
    }
    args.apply(&mut cfg);
    cfg
}

fn load_pipeline(path: &Path) -> CliResult<ParsedPipeline> {
    let yaml_content = fs::read_to_string(path)?;
    Ok(parse_yaml_pipeline(&yaml_content)?)
}

fn execute(pipeline: &ParsedPipeline, cfg: MergeConfig) -> CliResult<()> {
    let mut engine = Engine::new(cfg);
    let manifest = engine.run_pipeline(pipeline, &CancelToken::new())?;

    if manifest.canceled {
        println!("Merge stopped early");
    } else {
        println!("✓ Merge completed");
    }
    println!("  Rows: {}", manifest.rows_emitted);
    println!("  Duration: {}ms", manifest.duration_ms());
    println!("  Descriptor hash: {}", manifest.descriptor_hash);
    let json = serde_json::to_string_pretty(&manifest)?;
    tracing::debug!("run manifest:\n{json}");
    Ok(())
}

fn merge_files(
    descriptor: &Path,
    inputs: &[PathBuf],
    schema: &Path,
    output: &Path,
    format: &str,
    args: &ConfigArgs,
) -> CliResult<()> {
    let cfg = resolve_config(None, args);

    let xml = fs::read_to_string(descriptor)?;
    let descriptor = SortedMergeDescriptor::deserialize(&xml, cfg.strict_descriptor)?;

    let fields: Vec<FieldDef> = serde_yaml::from_str(&fs::read_to_string(schema)?)?;
    let schema = to_schema(&fields)?;

    let format =
        SinkFormat::parse(format).ok_or_else(|| format!("unknown output format '{format}'"))?;

    let pipeline = ParsedPipeline {
        descriptor,
        inputs: inputs
            .iter()
            .map(|p| InputSpec {
                source: p.display().to_string(),
                schema: schema.clone(),
            })
            .collect(),
        sink: SinkSpec {
            destination: output.display().to_string(),
            format,
        },
        config: PipelineConfig::default(),
    };
    execute(&pipeline, cfg)
}

fn run_pipeline(path: &Path, args: &ConfigArgs) -> CliResult<()> {
    let pipeline = load_pipeline(path)?;
    let cfg = resolve_config(Some(&pipeline.config), args);
    execute(&pipeline, cfg)
}

fn validate_pipeline(path: &Path) -> CliResult<()> {
    let pipeline = load_pipeline(path)?;
    let remarks = pipeline
        .descriptor
        .validate(pipeline.reference_schema(), &pipeline.input_names());
    for remark in &remarks {
        println!("{}", remark);
    }
    let errors = remarks.iter().filter(|r| r.is_error()).count();
    if errors > 0 {
        return Err(format!("{errors} check(s) failed").into());
    }
    println!("✓ Pipeline is valid");
    Ok(())
}

fn explain_pipeline(path: &Path, args: &ConfigArgs) -> CliResult<()> {
    let pipeline = load_pipeline(path)?;
    let cfg = resolve_config(Some(&pipeline.config), args);
    print!("{}", explain(&pipeline, &cfg));
    Ok(())
}
