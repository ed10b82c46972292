use anyhow::Context;
use attrsweep::{
    table, ClassLabels, ColumnLayout, Evaluator, ExperimentPlan, ExperimentRunner, ReportParser,
    ResultSet, SweepConfig, ToolConfig,
};
use clap::Parser;
use env_logger::{Builder, Env};
use log::{info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ARFF data file every experiment is evaluated on
    #[arg(short, long)]
    data: PathBuf,

    /// JSON experiment plan; the built-in plan is used when omitted
    #[arg(short, long)]
    plan: Option<PathBuf>,

    /// Java executable (defaults to $JAVA_HOME/bin/java or the macOS Weka bundle)
    #[arg(long)]
    java: Option<PathBuf>,

    /// Classpath entry, repeatable (defaults to $WEKA_HOME/weka.jar or the macOS Weka bundle)
    #[arg(long = "classpath", value_name = "PATH")]
    classpath: Vec<PathBuf>,

    /// Maximum number of Weka processes running at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Per-experiment time limit in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Label of the positive class in the report
    #[arg(long, default_value = "ACL")]
    positive_class: String,

    /// Label of the negative class in the report
    #[arg(long, default_value = "nonACL")]
    negative_class: String,

    /// Read reports from Weka releases without the MCC column
    #[arg(long)]
    legacy_columns: bool,

    /// Where to write the CSV table
    #[arg(short, long, default_value = "results.csv")]
    output: PathBuf,

    /// Print the configuration and command lines without running anything
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn sweep_config(&self) -> SweepConfig {
        let mut tool = ToolConfig::default();
        if let Some(java) = &self.java {
            tool.java = java.clone();
        }
        if !self.classpath.is_empty() {
            tool.search_path = self.classpath.clone();
        }

        let mut config = SweepConfig::new(tool, &self.data);
        config.labels = ClassLabels::new(&self.positive_class, &self.negative_class);
        if self.legacy_columns {
            config.layout = ColumnLayout::legacy();
        }
        config.runner.max_parallel = self.jobs;
        config.runner.task_timeout = self.timeout_secs.map(Duration::from_secs);
        config
    }
}

fn print_summary(results: &ResultSet) {
    println!("\nResults:");
    for result in results {
        let metric =
            |v: Option<f64>| v.map_or_else(|| table::MISSING.to_string(), |v| format!("{:.3}", v));
        let status = match result.failure() {
            None => "ok".to_string(),
            Some(failure) => format!("failed: {}", failure),
        };
        println!(
            "  [{:>3}] {:<40} FPR {:>6}  FNR {:>6}  ROC {:>6}  ({})",
            result.id,
            result.config.label(),
            metric(result.metrics.false_positive_rate),
            metric(result.metrics.false_negative_rate),
            metric(result.metrics.roc_area),
            status
        );
    }
    println!(
        "\n{} experiments: {} succeeded, {} failed",
        results.len(),
        results.succeeded(),
        results.failed()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("=== Starting Weka Attribute Selection Sweep ===");

    let plan = match &args.plan {
        Some(path) => ExperimentPlan::from_file(path)
            .with_context(|| format!("Failed to load plan {:?}", path))?,
        None => {
            info!("No plan given, using the built-in plan");
            ExperimentPlan::default()
        }
    };
    let configs = plan
        .space()
        .and_then(|space| space.build())
        .context("Invalid experiment plan")?;
    let config = args.sweep_config();

    if args.dry_run {
        print!("{}", config.describe(&configs));
        return Ok(());
    }

    config.validate().context("Invalid sweep configuration")?;

    let runner = ExperimentRunner::new(
        Evaluator::with_java(&config.tool.java),
        ReportParser::new(config.labels.clone(), config.layout),
        config.runner.clone(),
    )?;

    let cancel = runner.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping remaining experiments...");
            cancel.cancel();
        }
    });

    let start_time = Instant::now();
    let results = runner.run(&configs, &config.data_file, &config.tool.search_path).await;
    info!("=== Sweep Complete (took {:.2?}) ===", start_time.elapsed());

    print_summary(&results);
    table::write_csv(&args.output, &results)
        .with_context(|| format!("Failed to write results to {:?}", args.output))?;
    println!("Table written to {}", args.output.display());

    Ok(())
}
