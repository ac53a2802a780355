use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.etherscan.io/api";
/// Chainlink (LINK) token contract.
const DEFAULT_CONTRACT: &str = "0x514910771af9ca656af840dff83e8264ecf986ca";
const DEFAULT_OUTPUT: &str = "LINK.csv";
const DEFAULT_END_BLOCK: u64 = 9_999_999_999;

/// Etherscan caps `offset` at 100 for `tokentx`.
pub const PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Everything one fetch run needs. Built once and passed in explicitly so
/// several token fetches can be configured side by side.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub api_key: String,
    pub base_url: String,
    pub contract_address: String,
    pub output_path: PathBuf,
    pub start_block: u64,
    pub end_block: u64,
    pub sort: SortOrder,
    pub page_size: u32,
    pub page_delay: Duration,
}

impl FetcherConfig {
    pub fn new(api_key: impl Into<String>, contract_address: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            contract_address: contract_address.into(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            start_block: 0,
            end_block: DEFAULT_END_BLOCK,
            sort: SortOrder::Asc,
            page_size: PAGE_SIZE,
            page_delay: Duration::from_millis(500),
        }
    }

    /// Read the fetch settings from the environment. An explicit `api_key`
    /// takes precedence over `ETHERSCAN_API_KEY`.
    pub fn from_env(api_key: Option<String>) -> anyhow::Result<Self> {
        Self::from_lookup(api_key, |name| env::var(name).ok())
    }

    /// Build from any variable source. Unparseable numeric values are errors.
    pub fn from_lookup<F>(api_key: Option<String>, var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = match api_key {
            Some(key) => key,
            None => var("ETHERSCAN_API_KEY")
                .ok_or_else(|| anyhow::anyhow!("ETHERSCAN_API_KEY must be set"))?,
        };
        let contract = var("TOKEN_CONTRACT").unwrap_or_else(|| DEFAULT_CONTRACT.into());
        let defaults = Self::new(api_key, contract);

        Ok(Self {
            base_url: var("ETHERSCAN_BASE_URL").unwrap_or(defaults.base_url.clone()),
            output_path: var("TRANSFERS_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path.clone()),
            start_block: parse_var(&var, "START_BLOCK", defaults.start_block)?,
            end_block: parse_var(&var, "END_BLOCK", defaults.end_block)?,
            sort: var("SORT_ORDER")
                .map(|s| SortOrder::from_str(&s))
                .unwrap_or(defaults.sort),
            page_delay: Duration::from_millis(parse_var(&var, "PAGE_DELAY_MS", 500)?),
            ..defaults
        })
    }
}

fn parse_var<F, T>(var: &F, name: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {name}={raw:?}: {e}")),
        None => Ok(default),
    }
}

/// Locations of the training dataset and the artifact pair.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub dataset: PathBuf,
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("dataset_mylabels_2020.csv"),
            model: PathBuf::from("eth_user_classifier.json"),
            scaler: PathBuf::from("eth_scaler.json"),
        }
    }
}

impl ModelPaths {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dataset: env::var("TRAINING_DATASET")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset),
            model: env::var("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model),
            scaler: env::var("SCALER_PATH").map(PathBuf::from).unwrap_or(defaults.scaler),
        }
    }
}
