use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use propensity::io;
use propensity::metrics::{classification_report, roc_auc_score, BinaryConfusion};
use propensity::models::{
    Classifier, LogisticParams, LogisticRegression, MlpClassifier, MlpParams,
    ProbabilisticClassifier, Svc, SvcParams,
};
use propensity::pipeline::{PipelineConfig, PreprocessPipeline};
use propensity::preprocess::{train_test_split, LabelEncoder};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Train campaign-response classifiers and label an unlabeled table"
)]
struct Args {
    /// Training CSV carrying the target column
    train: PathBuf,

    /// Unlabeled CSV to predict
    test: PathBuf,

    /// Name of the target column in the training table
    #[arg(long, default_value = "responded")]
    target: String,

    /// Where to write the prediction CSV
    #[arg(long, default_value = "predictions.csv")]
    output: PathBuf,

    /// JSON file overriding pipeline and model hyperparameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Persist the fitted pipeline and models as JSON
    #[arg(long)]
    save_model: Option<PathBuf>,
}

/// Everything tunable about a run, overridable section by section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RunConfig {
    pipeline: PipelineConfig,
    logistic: LogisticParams,
    svc: SvcParams,
    mlp: MlpParams,
}

/// Fitted artifacts written by `--save-model`.
#[derive(Serialize)]
struct ModelBundle<'a> {
    pipeline: &'a PreprocessPipeline,
    labels: &'a LabelEncoder,
    best: &'a str,
    logistic: &'a LogisticRegression,
    mlp: &'a MlpClassifier,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config: RunConfig = match &args.config {
        Some(path) => io::load_json(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => RunConfig::default(),
    };

    let mut train_frame = io::read_frame(&args.train)
        .with_context(|| format!("reading training table {}", args.train.display()))?;
    let test_frame = io::read_frame(&args.test)
        .with_context(|| format!("reading test table {}", args.test.display()))?;
    info!(
        train_rows = train_frame.n_rows(),
        test_rows = test_frame.n_rows(),
        "loaded tables"
    );

    let target = train_frame
        .take_column(&args.target)
        .with_context(|| format!("target column {:?}", args.target))?;
    let mut labels = LabelEncoder::new();
    labels.fit_column(&target)?;
    let y = labels.transform_column(&target)?;

    let (pipeline, x_full) = PreprocessPipeline::fit(config.pipeline.clone(), &train_frame)?;
    let x_holdout = pipeline.transform(&test_frame)?;

    let (x_train, x_val, y_train, y_val) = train_test_split(
        &x_full,
        &y,
        config.pipeline.test_ratio,
        Some(config.pipeline.seed),
    )?;
    info!(
        train = x_train.rows(),
        validation = x_val.rows(),
        features = x_train.cols(),
        "split training data"
    );

    println!("Logistic Regression result");
    let mut logistic = LogisticRegression::new(config.logistic);
    logistic.fit(&x_train, &y_train)?;
    let logistic_auc = report_probabilistic(&logistic, &x_val, &y_val)?;

    println!("results for SVM classifier");
    let mut svc = Svc::new(config.svc);
    svc.fit(&x_train, &y_train)?;
    let svc_pred = svc.predict(&x_val)?;
    println!("{}", classification_report(&y_val, &svc_pred));

    println!("results for back propagation classifier");
    let mut mlp = MlpClassifier::new(config.mlp);
    mlp.fit(&x_train, &y_train)?;
    let mlp_auc = report_probabilistic(&mlp, &x_val, &y_val)?;

    // Label the unlabeled table with the stronger probabilistic model.
    let (best, encoded) = if mlp_auc > logistic_auc {
        ("mlp", mlp.predict(&x_holdout)?)
    } else {
        ("logistic", logistic.predict(&x_holdout)?)
    };
    info!(best, rows = encoded.len(), "predicting holdout table");

    let predicted = labels.inverse_transform(&encoded);
    io::write_predictions(&args.output, &args.target, &predicted)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(output = %args.output.display(), "wrote predictions");

    if let Some(path) = &args.save_model {
        let bundle = ModelBundle {
            pipeline: &pipeline,
            labels: &labels,
            best,
            logistic: &logistic,
            mlp: &mlp,
        };
        io::save_json(&bundle, path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "saved fitted models");
    }

    Ok(())
}

/// Score a probabilistic classifier on the validation split and print the
/// confusion summary; returns the ROC-AUC used for model selection.
fn report_probabilistic(
    model: &impl ProbabilisticClassifier,
    x_val: &propensity::core::Matrix,
    y_val: &[f64],
) -> Result<f64> {
    let scores = model.predict_log_proba(x_val)?;
    let auc = roc_auc_score(y_val, &scores).context("scoring validation split")?;
    println!("ras: {:.6}", auc);

    let pred = model.predict(x_val)?;
    let confusion = BinaryConfusion::from_predictions(y_val, &pred);
    println!(
        "tp={} tn={} fp={} fn={} sensitivity={:.4} specificity={:.4}",
        confusion.tp,
        confusion.tn,
        confusion.fp,
        confusion.fn_,
        confusion.sensitivity(),
        confusion.specificity()
    );
    Ok(auc)
}
