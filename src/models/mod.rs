pub mod transfer;

pub use transfer::{TokenAmount, TransferRow};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Feature: the six on-chain aggregates describing one address
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    BalanceEther,
    TotalTransactions,
    Sent,
    Received,
    NContractsSent,
    NContractsReceived,
}

impl Feature {
    /// Canonical training order. Model columns are laid out in this order.
    pub const ALL: [Feature; 6] = [
        Feature::BalanceEther,
        Feature::TotalTransactions,
        Feature::Sent,
        Feature::Received,
        Feature::NContractsSent,
        Feature::NContractsReceived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::BalanceEther => "balance_ether",
            Feature::TotalTransactions => "total_transactions",
            Feature::Sent => "sent",
            Feature::Received => "received",
            Feature::NContractsSent => "n_contracts_sent",
            Feature::NContractsReceived => "n_contracts_received",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    /// Column names in canonical order, as stored in the model artifacts.
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.as_str().to_string()).collect()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FeatureVector: one address, features in canonical order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub balance_ether: f64,
    pub total_transactions: f64,
    pub sent: f64,
    pub received: f64,
    pub n_contracts_sent: f64,
    pub n_contracts_received: f64,
}

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::BalanceEther => self.balance_ether,
            Feature::TotalTransactions => self.total_transactions,
            Feature::Sent => self.sent,
            Feature::Received => self.received,
            Feature::NContractsSent => self.n_contracts_sent,
            Feature::NContractsReceived => self.n_contracts_received,
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        Feature::ALL.map(|f| self.get(f))
    }

    /// Named mapping accepted by `ProfessionalClassifier::predict`.
    pub fn to_map(&self) -> std::collections::HashMap<String, f64> {
        Feature::ALL
            .iter()
            .map(|f| (f.as_str().to_string(), self.get(*f)))
            .collect()
    }
}
