pub mod transfer_fetcher;

pub use transfer_fetcher::{
    fetch_all_transfers, run_transfer_fetch, FetchOutcome, FetchReport, StopReason, TransferSummary,
};
