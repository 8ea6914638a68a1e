use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, anyhow, bail};
use headline_bias::{
    classification::LexiconSet,
    config::Config,
    evaluation::{evaluate_classifier, evaluate_pipeline, load_dataset},
    model::{BiasClassifier, DEFAULT_MAX_TOKEN_LENGTH, ModelBackend, ModelSettings},
    observability::init_cli_tracing,
    pipeline::PipelineOrchestrator,
};
use tracing::info;

struct EvaluateArgs {
    dataset: PathBuf,
    gated: bool,
    limit: Option<usize>,
    settings: ModelSettings,
    lexicon: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the JSON report.
    init_cli_tracing()?;
    let args = parse_args()?;

    let mut dataset = load_dataset(&args.dataset)
        .with_context(|| format!("failed to load dataset {}", args.dataset.display()))?;
    info!(
        samples = dataset.len(),
        skipped_empty = dataset.skipped_empty,
        skipped_unknown = dataset.skipped_unknown,
        "dataset loaded"
    );
    if let Some(limit) = args.limit {
        dataset.samples.truncate(limit);
    }
    if dataset.is_empty() {
        bail!("dataset {} has no usable rows", args.dataset.display());
    }

    let summary = if args.gated {
        let lexicons =
            LexiconSet::load(args.lexicon.as_deref()).context("failed to load keyword lexicon")?;
        let pipeline = PipelineOrchestrator::initialize(&lexicons, &args.settings)
            .context("failed to initialize headline pipeline")?;
        evaluate_pipeline(&pipeline, &dataset.samples).context("gated evaluation failed")?
    } else {
        let classifier =
            BiasClassifier::load(&args.settings).context("failed to load bias model")?;
        evaluate_classifier(&classifier, &dataset.samples).context("classifier evaluation failed")?
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn parse_args() -> Result<EvaluateArgs> {
    let mut dataset = None;
    let mut gated = false;
    let mut limit = None;
    let mut model = None;
    let mut backend = None;
    let mut lexicon = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dataset" => {
                let value = args.next().context("--dataset requires a path argument")?;
                dataset = Some(PathBuf::from(value));
            }
            "--gated" => {
                gated = true;
            }
            "--limit" => {
                let value = args.next().context("--limit requires a count")?;
                let parsed = value
                    .parse::<usize>()
                    .context("--limit must be an integer")?;
                limit = Some(parsed);
            }
            "--model" => {
                let value = args.next().context("--model requires a path argument")?;
                model = Some(PathBuf::from(value));
            }
            "--backend" => {
                let value = args
                    .next()
                    .context("--backend requires transformer or linear")?;
                backend = Some(value.parse::<ModelBackend>()?);
            }
            "--lexicon" => {
                let value = args.next().context("--lexicon requires a path argument")?;
                lexicon = Some(PathBuf::from(value));
            }
            "--help" => {
                print_usage();
                process::exit(0);
            }
            _ => {
                bail!("unknown argument: {}", arg);
            }
        }
    }

    let dataset = dataset.ok_or_else(|| anyhow!("--dataset is required"))?;

    // Without --model everything comes from the service environment.
    let (settings, lexicon) = match model {
        Some(model_path) => (
            ModelSettings {
                backend: backend.unwrap_or(ModelBackend::Transformer),
                model_path,
                tokenizer_path: None,
                max_token_length: NonZeroUsize::new(DEFAULT_MAX_TOKEN_LENGTH)
                    .context("default token length is zero")?,
            },
            lexicon,
        ),
        None => {
            let config = Config::from_env()
                .context("BIAS_MODEL_PATH is required via --model or environment")?;
            let mut settings = config.model_settings();
            if let Some(backend) = backend {
                settings.backend = backend;
            }
            let lexicon = lexicon.or_else(|| config.lexicon_path().map(PathBuf::from));
            (settings, lexicon)
        }
    };

    Ok(EvaluateArgs {
        dataset,
        gated,
        limit,
        settings,
        lexicon,
    })
}

fn print_usage() {
    eprintln!(
        "Usage: evaluate_headlines --dataset <csv> [--gated] [--limit N] [--model <path>] [--backend transformer|linear] [--lexicon <yaml>]"
    );
}
