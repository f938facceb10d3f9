use clap::Parser;
use gemini_experiment::logging::{self, prefix};
use gemini_experiment::{
    generate_datasets, render_records, render_summary, summarize, CancelToken, GeminiConfig,
    Report, Runner,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "gemini")]
#[command(about = "GEMINI analysis: viscosity of dimensionality reductions")]
#[command(version)]
struct Args {
    /// JSON configuration file (flags below override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of trials
    #[arg(long)]
    trials: Option<usize>,

    /// Rows per synthetic dataset
    #[arg(long)]
    samples: Option<usize>,

    /// Features per synthetic dataset
    #[arg(long)]
    features: Option<usize>,

    /// Comma separated perplexity sweep, e.g. 5,10,30
    #[arg(long, value_delimiter = ',')]
    perplexities: Option<Vec<u32>>,

    /// Retained components for the viscoelasticity round trip
    #[arg(long)]
    pca_components: Option<usize>,

    /// Dataset generation seed
    #[arg(long)]
    seed: Option<u64>,

    /// t-SNE gradient descent iterations
    #[arg(long)]
    tsne_iter: Option<usize>,

    /// Print one JSON document instead of tables
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn load_config(&self) -> gemini_experiment::Result<GeminiConfig> {
        let mut config = match &self.config {
            Some(path) => GeminiConfig::from_json_file(path)?,
            None => GeminiConfig::default(),
        };

        if let Some(trials) = self.trials {
            config.run.n_trials = trials;
        }
        if let Some(samples) = self.samples {
            config.datasets.n_samples = samples;
        }
        if let Some(features) = self.features {
            config.datasets.n_features = features;
        }
        if let Some(perplexities) = &self.perplexities {
            config.run.perplexities = perplexities.clone();
        }
        if let Some(components) = self.pca_components {
            config.run.pca_components = components;
        }
        if let Some(seed) = self.seed {
            config.datasets.seed = seed;
        }
        if let Some(n_iter) = self.tsne_iter {
            config.run.tsne.n_iter = n_iter;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level);

    info!("{} GEMINI analysis", prefix::START);
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));

    let config = args.load_config()?;
    info!(
        "  Trials: {}, perplexities: {:?}, PCA components: {}",
        config.run.n_trials, config.run.perplexities, config.run.pca_components
    );

    let datasets = generate_datasets(&config.datasets)?;
    let runner = Runner::new(config.run)?;

    // The run is CPU bound; Ctrl+C flips the token and the runner stops
    // before its next protocol step.
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let mut run = tokio::task::spawn_blocking(move || runner.run(&datasets, &token));

    let results = tokio::select! {
        joined = &mut run => joined??,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, cancelling after the current step");
            cancel.cancel();
            run.await??
        }
    };

    if args.json {
        println!("{}", Report::new(&results).to_json()?);
    } else {
        println!("{}", render_records(&results));
        println!("{}", render_summary(&summarize(&results)));
    }

    Ok(())
}
