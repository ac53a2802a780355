use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use serde_json::Value;

use ethprofile::errors::EtherscanError;
use ethprofile::etherscan::types::TokenTxResult;
use ethprofile::etherscan::{ApiTokenTransfer, TokenTxResponse, TransferSource};

/// Serves a fixed sequence of responses and records which pages were asked for.
pub struct ScriptedSource {
    pages: Mutex<Vec<Result<TokenTxResponse, EtherscanError>>>,
    pub requested: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Result<TokenTxResponse, EtherscanError>>) -> Self {
        let mut pages = pages;
        pages.reverse();
        Self {
            pages: Mutex::new(pages),
            requested: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }
}

#[async_trait]
impl TransferSource for ScriptedSource {
    async fn fetch_page(&self, page: u32, offset: u32) -> Result<TokenTxResponse, EtherscanError> {
        self.requested.lock().unwrap().push((page, offset));
        self.pages
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(ok_page(Vec::new())))
    }
}

#[allow(dead_code)]
pub fn ok_page(transfers: Vec<ApiTokenTransfer>) -> TokenTxResponse {
    raw_page(transfers.iter().map(to_record).collect())
}

/// A successful page carrying arbitrary JSON records.
#[allow(dead_code)]
pub fn raw_page(records: Vec<Value>) -> TokenTxResponse {
    TokenTxResponse {
        status: "1".into(),
        message: Some("OK".into()),
        result: TokenTxResult::Records(records),
    }
}

#[allow(dead_code)]
pub fn to_record(transfer: &ApiTokenTransfer) -> Value {
    serde_json::to_value(transfer).unwrap()
}

#[allow(dead_code)]
pub fn error_page(message: &str) -> TokenTxResponse {
    TokenTxResponse {
        status: "0".into(),
        message: Some(message.into()),
        result: TokenTxResult::Message(message.into()),
    }
}

/// A well-formed 18-decimal LINK transfer.
#[allow(dead_code)]
pub fn make_transfer(n: u64, value: &str) -> ApiTokenTransfer {
    ApiTokenTransfer {
        block_number: Some((4_281_611 + n).to_string()),
        time_stamp: Some((1_513_240_363 + n as i64).to_string()),
        hash: Some(format!("0xhash{n}")),
        from: Some("0xfrom".into()),
        to: Some("0xto".into()),
        value: Some(value.into()),
        token_decimal: Some("18".into()),
        token_symbol: Some("LINK".into()),
        contract_address: Some("0x514910771af9ca656af840dff83e8264ecf986ca".into()),
    }
}

#[allow(dead_code)]
pub fn make_transfers(range: std::ops::Range<u64>) -> Vec<ApiTokenTransfer> {
    range.map(|n| make_transfer(n, "1000000000000000000")).collect()
}

/// Write a labeled training CSV: every third row is professional (large
/// activity), the rest are unlabeled.
#[allow(dead_code)]
pub fn write_dataset(path: &Path, rows: usize) {
    let mut out = String::from(
        "address,balance_ether,total_transactions,sent,received,n_contracts_sent,n_contracts_received,labels\n",
    );
    for i in 0..rows {
        let (sent, label) = if i % 3 == 0 {
            (500.0 + i as f64 * 7.0, "Miner")
        } else {
            (i as f64 % 5.0, "No label")
        };
        out.push_str(&format!(
            "0x{i:040x},{},{},{},{},{},{},{}\n",
            1.5 + i as f64,
            sent * 2.0,
            sent,
            sent,
            i % 4,
            i % 3,
            label
        ));
    }
    std::fs::write(path, out).unwrap();
}

#[allow(dead_code)]
pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
