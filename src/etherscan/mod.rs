pub mod client;
pub mod types;

pub use client::{EtherscanClient, TransferSource};
pub use types::{ApiTokenTransfer, TokenTxResponse};
