use std::fmt;

use alloy::primitives::U256;
use serde::{Serialize, Serializer};

/// CSV header, in output column order.
pub const TRANSFER_CSV_HEADER: [&str; 9] = [
    "block_number",
    "transaction_hash",
    "from_address",
    "to_address",
    "value",
    "timestamp",
    "token_symbol",
    "token_address",
    "datetime",
];

// ---------------------------------------------------------------------------
// TokenAmount: exact uint256 amount with its decimal scale
// ---------------------------------------------------------------------------

/// A raw on-chain integer amount and the number of decimals it is scaled by.
///
/// Covers the full uint256 range at any ERC-20 decimals; nothing goes
/// through floating point. Displays as a plain decimal with trailing zeros
/// stripped (`1500000000000000000` at 18 decimals is `1.5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    raw: U256,
    decimals: u8,
}

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount {
        raw: U256::ZERO,
        decimals: 0,
    };

    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Exact sum. Amounts with different decimals are aligned to the larger
    /// scale first. `None` when the result leaves uint256.
    pub fn checked_add(&self, other: &TokenAmount) -> Option<TokenAmount> {
        let decimals = self.decimals.max(other.decimals);
        let a = self.rescaled(decimals)?;
        let b = other.rescaled(decimals)?;
        Some(TokenAmount {
            raw: a.checked_add(b)?,
            decimals,
        })
    }

    fn rescaled(&self, decimals: u8) -> Option<U256> {
        let factor = U256::from(10u64).checked_pow(U256::from(decimals - self.decimals))?;
        self.raw.checked_mul(factor)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.raw.to_string();
        let scale = usize::from(self.decimals);
        if scale == 0 {
            return f.write_str(&digits);
        }

        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        let (int, frac) = padded.split_at(padded.len() - scale);
        let frac = frac.trim_end_matches('0');

        if frac.is_empty() {
            f.write_str(int)
        } else {
            write!(f, "{int}.{frac}")
        }
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// TransferRow
// ---------------------------------------------------------------------------

/// One normalized ERC-20 transfer, ready to be appended to the CSV.
///
/// Field order matches `TRANSFER_CSV_HEADER`; the csv crate serializes
/// struct fields in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRow {
    pub block_number: String,
    pub transaction_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub value: TokenAmount,
    pub timestamp: i64,
    pub token_symbol: String,
    pub token_address: String,
    /// `%Y-%m-%d %H:%M:%S`, UTC.
    pub datetime: String,
}
