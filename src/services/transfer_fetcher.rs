use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::config::FetcherConfig;
use crate::errors::SinkError;
use crate::etherscan::types::NO_TRANSACTIONS;
use crate::etherscan::TransferSource;
use crate::ingestion::normalize_batch;
use crate::models::{TokenAmount, TransferRow};
use crate::sink::append_rows;

/// Why pagination ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// API answered "No transactions found".
    NoTransactions,
    /// API answered with a non-success status and some other message.
    ApiError(String),
    /// A page came back with an empty result list.
    EmptyPage,
    /// A page came back with fewer records than the page size.
    ShortPage,
    /// HTTP status, transport or decode failure.
    RequestFailed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::NoTransactions => write!(f, "no transactions found"),
            StopReason::ApiError(msg) => write!(f, "api error: {msg}"),
            StopReason::EmptyPage => write!(f, "empty page"),
            StopReason::ShortPage => write!(f, "last page"),
            StopReason::RequestFailed(msg) => write!(f, "request failed: {msg}"),
        }
    }
}

#[derive(Debug)]
pub struct FetchOutcome {
    /// Raw records, decoded one by one during normalization.
    pub records: Vec<Value>,
    /// Pages that returned records.
    pub pages: u32,
    pub stop_reason: StopReason,
}

/// Page through all transfers in order, one request at a time.
///
/// Stops on a non-success API status, an empty page, a short page, or a
/// request failure. Records collected before the stop are always kept.
pub async fn fetch_all_transfers<S>(source: &S, page_size: u32, delay: Duration) -> FetchOutcome
where
    S: TransferSource + Sync + ?Sized,
{
    let mut records: Vec<Value> = Vec::new();
    let mut page: u32 = 1;
    let mut pages: u32 = 0;

    let stop_reason = loop {
        let resp = match source.fetch_page(page, page_size).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error = %e, page, "Transfer page request failed");
                break StopReason::RequestFailed(e.to_string());
            }
        };

        if !resp.is_ok() {
            let message = resp.message().to_string();
            if message == NO_TRANSACTIONS {
                tracing::info!(page, "No transactions found");
                break StopReason::NoTransactions;
            }
            tracing::warn!(page, message = %message, "Explorer API returned an error");
            break StopReason::ApiError(message);
        }

        let batch = resp.into_records();
        if batch.is_empty() {
            tracing::info!(page, "All transfers fetched");
            break StopReason::EmptyPage;
        }

        let batch_len = batch.len();
        records.extend(batch);
        pages += 1;
        tracing::info!(page, records = batch_len, total = records.len(), "Fetched transfer page");

        if batch_len < page_size as usize {
            break StopReason::ShortPage; // No more pages
        }

        page += 1;
        tokio::time::sleep(delay).await;
    };

    tracing::info!(
        total = records.len(),
        pages,
        reason = %stop_reason,
        "Fetched {} transfers",
        records.len(),
    );

    FetchOutcome {
        records,
        pages,
        stop_reason,
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TransferSummary {
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    /// `None` when the sum overflows uint256.
    pub total_value: Option<TokenAmount>,
}

impl TransferSummary {
    pub fn from_rows(rows: &[TransferRow]) -> Self {
        let total_value = rows
            .iter()
            .try_fold(TokenAmount::ZERO, |acc, r| acc.checked_add(&r.value));

        Self {
            first_timestamp: rows.first().map(|r| r.timestamp),
            last_timestamp: rows.last().map(|r| r.timestamp),
            total_value,
        }
    }
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_none<T: fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map(|x| x.to_string()).unwrap_or_else(|| "none".into())
        }
        writeln!(f, "Earliest transfer timestamp: {}", or_none(&self.first_timestamp))?;
        writeln!(f, "Latest transfer timestamp:   {}", or_none(&self.last_timestamp))?;
        match &self.total_value {
            Some(total) => write!(f, "Total value:                 {total}"),
            None => write!(f, "Total value:                 overflow"),
        }
    }
}

// ---------------------------------------------------------------------------
// Full run: fetch → normalize → append
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FetchReport {
    pub pages: u32,
    pub fetched: usize,
    pub written: usize,
    pub skipped: usize,
    pub stop_reason: StopReason,
    pub summary: TransferSummary,
}

/// Run one fetch: page through the source, normalize every record and
/// append the rows to `config.output_path`.
///
/// Only a CSV write failure is an error; request failures just end the
/// pagination early.
pub async fn run_transfer_fetch<S>(
    source: &S,
    config: &FetcherConfig,
) -> Result<FetchReport, SinkError>
where
    S: TransferSource + Sync + ?Sized,
{
    tracing::info!(
        contract = %config.contract_address,
        output = %config.output_path.display(),
        "Starting token transfer fetch"
    );

    let outcome = fetch_all_transfers(source, config.page_size, config.page_delay).await;
    let (rows, skipped) = normalize_batch(&outcome.records);
    let written = append_rows(&config.output_path, &rows)?;

    tracing::info!(
        written,
        skipped,
        output = %config.output_path.display(),
        "Transfers saved"
    );

    Ok(FetchReport {
        pages: outcome.pages,
        fetched: outcome.records.len(),
        written,
        skipped,
        stop_reason: outcome.stop_reason,
        summary: TransferSummary::from_rows(&rows),
    })
}
