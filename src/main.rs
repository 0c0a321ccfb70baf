use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use asthma_io::{ArtifactName, ArtifactWriter, EXAMPLE_RECORD, SurveyReader};
use asthma_resample::{Smote, StratifiedSplit};
use asthma_rf::{
    Aggregation, ClassificationReport, RandomForestConfig, RankedFeature, SplitCriterion,
    TrainingMetadata,
};
use asthma_serve::{Language, ModelArtifacts, Prediction, PredictionService};

#[derive(Parser)]
#[command(name = "asthma")]
#[command(about = "Asthma risk classification: SMOTE + Random Forest training and prediction API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for resampling, splitting and training
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Where a run's artifacts live.
#[derive(Args, Debug, Clone)]
struct ArtifactArgs {
    /// Directory holding `{name}_model.bin` and `{name}_features.json`
    #[arg(long, env = "ASTHMA_ARTIFACTS", default_value = ".")]
    artifacts: PathBuf,

    /// Artifact name prefix (must match [a-zA-Z0-9_-]+)
    #[arg(long, default_value = "asthma")]
    name: String,
}

#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the Random Forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// Maximum tree depth (unlimited if not set)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Split impurity: "gini" or "entropy"
    #[arg(long, default_value = "gini")]
    criterion: String,

    /// Tree vote aggregation: "majority" or "soft"
    #[arg(long, default_value = "majority")]
    aggregation: String,
}

#[derive(Subcommand)]
enum Command {
    /// Balance, split, train and evaluate on a survey CSV, then write artifacts
    Train {
        /// Path to the survey CSV file
        #[arg(long, env = "ASTHMA_DATA")]
        data: PathBuf,

        /// Output directory for artifact files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Artifact name prefix (must match [a-zA-Z0-9_-]+)
        #[arg(long, default_value = "asthma")]
        name: String,

        /// Nearest neighbors considered when synthesizing minority rows
        #[arg(long, default_value_t = 5)]
        k_neighbors: usize,

        /// Fraction of the balanced data held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,

        /// Value reported for precision/recall with a zero denominator
        #[arg(long, default_value_t = ClassificationReport::DEFAULT_ZERO_DIVISION)]
        zero_division: f64,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Predict one patient from comma-separated values in feature order
    Predict {
        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Feature values, e.g. 25,6,6,7,5,4,8
        #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
        values: Vec<f64>,

        /// Report language: "english" or "hindi"
        #[arg(long, default_value = "english")]
        language: Language,

        /// Also write the text report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Serve the prediction API over HTTP
    Serve {
        #[command(flatten)]
        artifacts: ArtifactArgs,

        /// Socket address to listen on
        #[arg(long, env = "ASTHMA_BIND", default_value = "127.0.0.1:5000")]
        bind: String,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput<'a> {
    artifact: &'a str,
    model_path: PathBuf,
    n_samples: usize,
    n_synthetic: usize,
    n_train: usize,
    n_test: usize,
    accuracy: f64,
    top_feature: Option<&'a str>,
    example_prediction: Prediction,
}

#[derive(Serialize)]
struct EvaluationSummary<'a> {
    class_distribution: Vec<ClassShare>,
    n_synthetic: usize,
    n_train: usize,
    n_test: usize,
    seed: u64,
    training: &'a TrainingMetadata,
    feature_importances: &'a [RankedFeature],
    report: &'a ClassificationReport,
}

#[derive(Serialize)]
struct ClassShare {
    label: usize,
    share: f64,
}

#[derive(Serialize)]
struct PredictOutput {
    #[serde(flatten)]
    prediction: Prediction,
    report_path: Option<PathBuf>,
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    match s {
        "gini" => Ok(SplitCriterion::Gini),
        "entropy" => Ok(SplitCriterion::Entropy),
        other => anyhow::bail!("unknown criterion: {other} (expected gini or entropy)"),
    }
}

fn parse_aggregation(s: &str) -> Result<Aggregation> {
    match s {
        "majority" => Ok(Aggregation::MajorityVote),
        "soft" => Ok(Aggregation::SoftVote),
        other => anyhow::bail!("unknown aggregation: {other} (expected majority or soft)"),
    }
}

fn load_service(args: &ArtifactArgs) -> Result<PredictionService> {
    let name = ArtifactName::new(args.name.clone())?;
    let service = ModelArtifacts::load(&args.artifacts, &name)
        .with_context(|| format!("failed to load artifacts from {}", args.artifacts.display()))?
        .into_service()?;
    Ok(service)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for ctrl-c; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            output_dir,
            name,
            k_neighbors,
            test_fraction,
            zero_division,
            forest,
        } => {
            let artifact_name = ArtifactName::new(name)?;

            // 1. Load the selected survey columns
            let dataset = SurveyReader::new(&data)
                .read()
                .context("failed to read survey CSV")?;
            let class_distribution: Vec<ClassShare> = dataset
                .class_distribution()
                .into_iter()
                .map(|(label, share)| ClassShare { label, share })
                .collect();
            for c in &class_distribution {
                info!(label = c.label, share = c.share, "class distribution");
            }
            let n_samples = dataset.n_samples();
            let (feature_order, features, labels) = dataset.into_parts();

            // 2. Balance classes
            let balanced = Smote::new(k_neighbors)?
                .with_seed(cli.seed)
                .fit_resample(&features, &labels)
                .context("class balancing failed")?;

            // 3. Stratified holdout
            let split = StratifiedSplit::new(test_fraction)?
                .with_seed(cli.seed)
                .split(&balanced.labels)
                .context("train/test split failed")?
                .apply(&balanced.features, &balanced.labels);
            info!(
                n_train = split.y_train.len(),
                n_test = split.y_test.len(),
                "stratified split complete"
            );

            // 4. Train
            let rf_config = RandomForestConfig::new(forest.n_trees)?
                .with_max_depth(forest.max_depth)
                .with_criterion(parse_criterion(&forest.criterion)?)
                .with_aggregation(parse_aggregation(&forest.aggregation)?)
                .with_seed(cli.seed);
            let train_result = rf_config
                .fit(&split.x_train, &split.y_train, feature_order.names())
                .context("model training failed")?;

            // 5. Evaluate on the held-out set
            let report = ClassificationReport::evaluate(
                train_result.forest(),
                &split.x_test,
                &split.y_test,
                zero_division,
            )
            .context("evaluation failed")?;
            info!("classification report\n{report}");

            // 6. Write artifacts
            let writer = ArtifactWriter::new(&output_dir, artifact_name)?;
            train_result
                .forest()
                .save(writer.model_path())
                .context("failed to save model")?;
            writer.write_feature_order(&feature_order)?;
            writer.write_evaluation(&EvaluationSummary {
                class_distribution,
                n_synthetic: balanced.n_synthetic,
                n_train: split.y_train.len(),
                n_test: split.y_test.len(),
                seed: cli.seed,
                training: train_result.metadata(),
                feature_importances: train_result.importances(),
                report: &report,
            })?;

            // 7. Smoke test on the example patient
            let service =
                PredictionService::new(Arc::new(train_result.forest().clone()), feature_order)?;
            let example_prediction = service
                .predict_proba(&EXAMPLE_RECORD)
                .context("smoke-test prediction failed")?;
            info!(
                prediction = example_prediction.prediction,
                probabilities = ?example_prediction.probabilities,
                "example patient predicted"
            );

            // 8. Print summary
            let output = TrainOutput {
                artifact: writer.name().as_str(),
                model_path: writer.model_path(),
                n_samples,
                n_synthetic: balanced.n_synthetic,
                n_train: split.y_train.len(),
                n_test: split.y_test.len(),
                accuracy: report.accuracy,
                top_feature: train_result.importances().first().map(|f| f.name.as_str()),
                example_prediction,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            artifacts,
            values,
            language,
            report,
        } => {
            let service = load_service(&artifacts)?;
            let (prediction, text) = service
                .report(&values, language)
                .context("prediction failed")?;

            if let Some(path) = &report {
                std::fs::write(path, text.to_string())
                    .with_context(|| format!("failed to write report {}", path.display()))?;
                info!(path = %path.display(), "report written");
            }

            let output = PredictOutput {
                prediction,
                report_path: report,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Serve { artifacts, bind } => {
            let service = load_service(&artifacts)?;
            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(async {
                let listener = tokio::net::TcpListener::bind(&bind)
                    .await
                    .with_context(|| format!("failed to bind {bind}"))?;
                asthma_serve::serve(listener, service, shutdown_signal()).await?;
                anyhow::Ok(())
            })?;
        }
    }

    Ok(())
}
