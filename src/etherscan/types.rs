use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status flag Etherscan uses for a successful call.
pub const STATUS_OK: &str = "1";
pub const NO_TRANSACTIONS: &str = "No transactions found";

// ---------------------------------------------------------------------------
// Token transfer (account/tokentx)
// ---------------------------------------------------------------------------

/// One ERC-20 transfer as returned by the explorer. Every field is a string
/// on the wire; missing ones are caught during normalization. Records are
/// decoded one at a time (`from_record`) so a single bad record never fails
/// the whole page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiTokenTransfer {
    #[serde(default, rename = "blockNumber")]
    pub block_number: Option<String>,
    #[serde(default, rename = "timeStamp")]
    pub time_stamp: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, rename = "tokenDecimal")]
    pub token_decimal: Option<String>,
    #[serde(default, rename = "tokenSymbol")]
    pub token_symbol: Option<String>,
    #[serde(default, rename = "contractAddress")]
    pub contract_address: Option<String>,
}

impl ApiTokenTransfer {
    pub fn from_record(record: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(record)
    }
}

/// On errors Etherscan puts a message string in `result` instead of a list.
/// List entries stay undecoded until normalization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TokenTxResult {
    Records(Vec<Value>),
    Message(String),
}

impl Default for TokenTxResult {
    fn default() -> Self {
        TokenTxResult::Records(Vec::new())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenTxResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: TokenTxResult,
}

impl TokenTxResponse {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Consume the response, keeping only the raw transfer records.
    pub fn into_records(self) -> Vec<Value> {
        match self.result {
            TokenTxResult::Records(records) => records,
            TokenTxResult::Message(_) => Vec::new(),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("unknown error")
    }
}
