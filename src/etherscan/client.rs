use async_trait::async_trait;
use reqwest::{Client, Request};

use super::types::TokenTxResponse;
use crate::config::FetcherConfig;
use crate::errors::EtherscanError;

/// A paged source of token transfers. Implemented by `EtherscanClient`;
/// tests substitute scripted pages.
#[async_trait]
pub trait TransferSource {
    /// Fetch one page (1-based) of `offset` records.
    async fn fetch_page(&self, page: u32, offset: u32) -> Result<TokenTxResponse, EtherscanError>;
}

#[derive(Debug, Clone)]
pub struct EtherscanClient {
    http: Client,
    base_url: String,
    api_key: String,
    contract_address: String,
    start_block: u64,
    end_block: u64,
    sort: &'static str,
}

impl EtherscanClient {
    pub fn new(http: Client, config: &FetcherConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            contract_address: config.contract_address.clone(),
            start_block: config.start_block,
            end_block: config.end_block,
            sort: config.sort.as_str(),
        }
    }

    /// Build the `account/tokentx` request for one page.
    fn request(&self, page: u32, offset: u32) -> reqwest::Result<Request> {
        let start_block = self.start_block.to_string();
        let end_block = self.end_block.to_string();
        let page = page.to_string();
        let offset = offset.to_string();

        self.http
            .get(&self.base_url)
            .query(&[
                ("module", "account"),
                ("action", "tokentx"),
                ("contractaddress", self.contract_address.as_str()),
                ("startblock", start_block.as_str()),
                ("endblock", end_block.as_str()),
                ("sort", self.sort),
                ("apikey", self.api_key.as_str()),
                ("page", page.as_str()),
                ("offset", offset.as_str()),
            ])
            .build()
    }

    /// Fetch a page of ERC-20 transfers for the configured token contract.
    pub async fn get_token_transfers(
        &self,
        page: u32,
        offset: u32,
    ) -> Result<TokenTxResponse, EtherscanError> {
        let request = self.request(page, offset)?;
        let resp = self.http.execute(request).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EtherscanError::Status(status.as_u16()));
        }

        let body: TokenTxResponse = resp.json().await?;
        Ok(body)
    }
}

#[async_trait]
impl TransferSource for EtherscanClient {
    async fn fetch_page(&self, page: u32, offset: u32) -> Result<TokenTxResponse, EtherscanError> {
        self.get_token_transfers(page, offset).await
    }
}
