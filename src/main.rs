use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ethprofile::config::{FetcherConfig, ModelPaths};
use ethprofile::etherscan::EtherscanClient;
use ethprofile::intelligence::{train, ProfessionalClassifier, TrainerConfig};
use ethprofile::models::Feature;
use ethprofile::services::run_transfer_fetch;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the classifier and write the model/scaler pair
    Train {
        /// Labeled CSV (six feature columns plus `labels`)
        #[arg(long)]
        dataset: Option<PathBuf>,

        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(long)]
        scaler: Option<PathBuf>,

        /// Number of trees (default 200)
        #[arg(long)]
        trees: Option<usize>,
    },

    /// Classify a single address from its six features
    Predict {
        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(long)]
        scaler: Option<PathBuf>,

        /// JSON object mapping feature names to numbers
        #[arg(long)]
        input: Option<PathBuf>,

        #[arg(long)]
        balance_ether: Option<f64>,
        #[arg(long)]
        total_transactions: Option<f64>,
        #[arg(long)]
        sent: Option<f64>,
        #[arg(long)]
        received: Option<f64>,
        #[arg(long)]
        n_contracts_sent: Option<f64>,
        #[arg(long)]
        n_contracts_received: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch ERC-20 transfers for a token and append them to a CSV
    Fetch {
        /// Token contract address
        #[arg(long)]
        contract: Option<String>,

        /// Output CSV path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Explorer API key (overrides ETHERSCAN_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            dataset,
            model,
            scaler,
            trees,
        } => {
            let paths = override_paths(ModelPaths::from_env(), dataset, model, scaler);
            let mut config = TrainerConfig::default();
            if let Some(n) = trees {
                config.forest.n_trees = n;
            }

            tracing::info!(dataset = %paths.dataset.display(), "Training classifier");
            let report = train(&paths, &config)?;

            println!("Model and scaler saved");
            println!("Rows:              {}", report.rows);
            println!(
                "Classes (neg/pos): {}/{} -> {}/{} after oversampling",
                report.class_counts.0,
                report.class_counts.1,
                report.resampled_counts.0,
                report.resampled_counts.1,
            );
            println!("Training accuracy: {:.4}", report.training_accuracy);
        }

        Commands::Predict {
            model,
            scaler,
            input,
            balance_ether,
            total_transactions,
            sent,
            received,
            n_contracts_sent,
            n_contracts_received,
            json,
        } => {
            let paths = override_paths(ModelPaths::from_env(), None, model, scaler);
            let classifier = ProfessionalClassifier::from_files(&paths.model, &paths.scaler)?;

            let features: HashMap<String, f64> = match input {
                Some(path) => serde_json::from_str(&std::fs::read_to_string(&path)?)?,
                None => [
                    (Feature::BalanceEther, balance_ether),
                    (Feature::TotalTransactions, total_transactions),
                    (Feature::Sent, sent),
                    (Feature::Received, received),
                    (Feature::NContractsSent, n_contracts_sent),
                    (Feature::NContractsReceived, n_contracts_received),
                ]
                .into_iter()
                .filter_map(|(f, v)| v.map(|v| (f.as_str().to_string(), v)))
                .collect(),
            };

            let prediction = classifier.predict(&features)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                println!("{prediction}");
            }
        }

        Commands::Fetch {
            contract,
            output,
            api_key,
        } => {
            let mut config = FetcherConfig::from_env(api_key)?;
            if let Some(contract) = contract {
                config.contract_address = contract;
            }
            if let Some(output) = output {
                config.output_path = output;
            }

            let client = EtherscanClient::new(reqwest::Client::new(), &config);
            let report = run_transfer_fetch(&client, &config).await?;

            println!(
                "Fetched {} transfers over {} page(s) ({})",
                report.fetched, report.pages, report.stop_reason
            );
            println!(
                "Saved {} rows to {} ({} skipped)",
                report.written,
                config.output_path.display(),
                report.skipped
            );
            println!();
            println!("{}", report.summary);
        }
    }

    Ok(())
}

fn override_paths(
    mut paths: ModelPaths,
    dataset: Option<PathBuf>,
    model: Option<PathBuf>,
    scaler: Option<PathBuf>,
) -> ModelPaths {
    if let Some(p) = dataset {
        paths.dataset = p;
    }
    if let Some(p) = model {
        paths.model = p;
    }
    if let Some(p) = scaler {
        paths.scaler = p;
    }
    paths
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ethprofile=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
