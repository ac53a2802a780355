use alloy::primitives::U256;
use chrono::DateTime;
use serde_json::Value;

use crate::errors::NormalizeError;
use crate::etherscan::ApiTokenTransfer;
use crate::models::{TokenAmount, TransferRow};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decode one raw explorer record. Any field that is present must be a string.
pub fn decode_transfer(record: &Value) -> Result<ApiTokenTransfer, NormalizeError> {
    ApiTokenTransfer::from_record(record).map_err(NormalizeError::Decode)
}

/// Turn a raw explorer record into a CSV row:
/// 1. Scale the integer `value` by `10^tokenDecimal` (exact, no floats)
/// 2. Render `timeStamp` as a UTC datetime string
/// 3. Copy the identifying fields through unchanged
pub fn normalize_transfer(tx: &ApiTokenTransfer) -> Result<TransferRow, NormalizeError> {
    let raw_value = required(&tx.value, "value")?;
    let decimals = parse_int::<u8>(required(&tx.token_decimal, "tokenDecimal")?, "tokenDecimal")?;
    let value = scale_value(raw_value, decimals)?;

    let timestamp = parse_int::<i64>(required(&tx.time_stamp, "timeStamp")?, "timeStamp")?;
    let datetime = format_utc(timestamp)?;

    Ok(TransferRow {
        block_number: required(&tx.block_number, "blockNumber")?.to_string(),
        transaction_hash: required(&tx.hash, "hash")?.to_string(),
        from_address: required(&tx.from, "from")?.to_string(),
        to_address: required(&tx.to, "to")?.to_string(),
        value,
        timestamp,
        token_symbol: required(&tx.token_symbol, "tokenSymbol")?.to_string(),
        token_address: required(&tx.contract_address, "contractAddress")?.to_string(),
        datetime,
    })
}

/// Normalize a fetched batch of raw records, skipping the ones that fail.
/// Returns the rows and the number of skipped records.
pub fn normalize_batch(records: &[Value]) -> (Vec<TransferRow>, usize) {
    let mut rows = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in records {
        match decode_transfer(record).and_then(|tx| normalize_transfer(&tx)) {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    error = %e,
                    hash = record.get("hash").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
                    "Skipping malformed transfer"
                );
            }
        }
    }

    (rows, skipped)
}

/// Parse a raw on-chain uint256 amount and attach its decimals.
///
/// Displays normalized, so `1500000000000000000` at 18 decimals is `1.5`
/// and not `1.500000000000000000`.
pub fn scale_value(raw: &str, decimals: u8) -> Result<TokenAmount, NormalizeError> {
    let raw = raw.trim();
    if !is_integer_literal(raw) {
        return Err(NormalizeError::NotInteger {
            field: "value",
            value: raw.to_string(),
        });
    }

    let amount = U256::from_str_radix(raw, 10)
        .map_err(|_| NormalizeError::ValueOutOfRange(raw.to_string()))?;

    Ok(TokenAmount::new(amount, decimals))
}

/// Unix seconds to `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_utc(timestamp: i64) -> Result<String, NormalizeError> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        .ok_or(NormalizeError::TimestampOutOfRange(timestamp))
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, NormalizeError> {
    field.as_deref().ok_or(NormalizeError::MissingField(name))
}

fn parse_int<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, NormalizeError> {
    value.trim().parse().map_err(|_| NormalizeError::NotInteger {
        field,
        value: value.to_string(),
    })
}

fn is_integer_literal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_transfer(value: &str, decimals: &str, ts: &str) -> ApiTokenTransfer {
        ApiTokenTransfer {
            block_number: Some("4730207".into()),
            time_stamp: Some(ts.into()),
            hash: Some("0xabc".into()),
            from: Some("0xfrom".into()),
            to: Some("0xto".into()),
            value: Some(value.into()),
            token_decimal: Some(decimals.into()),
            token_symbol: Some("LINK".into()),
            contract_address: Some("0x514910771af9ca656af840dff83e8264ecf986ca".into()),
        }
    }

    #[test]
    fn test_scale_value_eighteen_decimals() {
        let v = scale_value("1500000000000000000", 18).unwrap();
        assert_eq!(v.to_string(), "1.5");
    }

    #[test]
    fn test_scale_value_strips_trailing_zeros() {
        assert_eq!(scale_value("1000000000000000000", 18).unwrap().to_string(), "1");
        assert_eq!(scale_value("25000000", 6).unwrap().to_string(), "25");
        assert_eq!(scale_value("0", 18).unwrap().to_string(), "0");
    }

    #[test]
    fn test_scale_value_keeps_full_precision() {
        // 123456789.123456789123456789 LINK; an f64 would drop the tail
        let v = scale_value("123456789123456789123456789", 18).unwrap();
        assert_eq!(v.to_string(), "123456789.123456789123456789");
    }

    #[test]
    fn test_scale_value_zero_decimals() {
        assert_eq!(scale_value("42", 0).unwrap().to_string(), "42");
    }

    #[test]
    fn test_scale_value_rejects_garbage() {
        assert!(matches!(
            scale_value("12abc", 18),
            Err(NormalizeError::NotInteger { .. })
        ));
        assert!(matches!(
            scale_value("-5", 18),
            Err(NormalizeError::NotInteger { .. })
        ));
        assert!(matches!(scale_value("", 18), Err(NormalizeError::NotInteger { .. })));
    }

    #[test]
    fn test_scale_value_large_amounts() {
        assert_eq!(
            scale_value("1000000000000000000000000000000000", 18).unwrap().to_string(),
            "1000000000000000"
        );
        assert_eq!(
            scale_value("100000000000000000000000000000", 18).unwrap().to_string(),
            "100000000000"
        );
    }

    #[test]
    fn test_scale_value_wide_decimals() {
        assert_eq!(
            scale_value("1500000000000000000000000000000000000", 36).unwrap().to_string(),
            "1.5"
        );
        assert_eq!(scale_value("1", 40).unwrap().to_string(), format!("0.{}1", "0".repeat(39)));
    }

    #[test]
    fn test_scale_value_past_uint256() {
        // 2^256
        let too_big = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(matches!(
            scale_value(too_big, 18),
            Err(NormalizeError::ValueOutOfRange(_))
        ));
    }

    #[test]
    fn test_format_utc() {
        assert_eq!(format_utc(0).unwrap(), "1970-01-01 00:00:00");
        assert_eq!(format_utc(1513240363).unwrap(), "2017-12-14 08:32:43");
    }

    #[test]
    fn test_normalize_transfer() {
        let row = normalize_transfer(&make_transfer("1500000000000000000", "18", "1513240363")).unwrap();
        assert_eq!(row.value.to_string(), "1.5");
        assert_eq!(row.timestamp, 1513240363);
        assert_eq!(row.datetime, "2017-12-14 08:32:43");
        assert_eq!(row.block_number, "4730207");
        assert_eq!(row.token_symbol, "LINK");
    }

    #[test]
    fn test_normalize_transfer_missing_field() {
        let mut tx = make_transfer("1", "18", "1513240363");
        tx.token_symbol = None;
        assert!(matches!(
            normalize_transfer(&tx),
            Err(NormalizeError::MissingField("tokenSymbol"))
        ));
    }

    fn record(tx: &ApiTokenTransfer) -> Value {
        serde_json::to_value(tx).unwrap()
    }

    #[test]
    fn test_normalize_transfer_thirty_six_decimals() {
        let row = normalize_transfer(&make_transfer(
            "2500000000000000000000000000000000000000",
            "36",
            "1513240363",
        ))
        .unwrap();
        assert_eq!(row.value.to_string(), "2500");
        assert_eq!(row.value.decimals(), 36);
    }

    #[test]
    fn test_normalize_batch_keeps_huge_transfer() {
        let batch = vec![record(&make_transfer(
            "1000000000000000000000000000000000",
            "18",
            "1513240363",
        ))];
        let (rows, skipped) = normalize_batch(&batch);
        assert_eq!(skipped, 0);
        assert_eq!(rows[0].value.to_string(), "1000000000000000");
    }

    #[test]
    fn test_normalize_batch_skips_bad_records() {
        let mut broken = make_transfer("1", "18", "1513240363");
        broken.value = None;
        let batch = vec![
            record(&make_transfer("1500000000000000000", "18", "1513240363")),
            record(&broken),
            serde_json::json!({"hash": "0xnum", "value": 1, "tokenDecimal": "18"}),
            record(&make_transfer("2", "0", "1513240400")),
        ];

        let (rows, skipped) = normalize_batch(&batch);
        assert_eq!(skipped, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].value.to_string(), "2");
    }

    #[test]
    fn test_decode_transfer_rejects_numeric_field() {
        let rec = serde_json::json!({"hash": "0xnum", "value": 1});
        assert!(matches!(decode_transfer(&rec), Err(NormalizeError::Decode(_))));
    }

    #[test]
    fn test_normalize_transfer_bad_timestamp() {
        let tx = make_transfer("1", "18", "yesterday");
        assert!(matches!(
            normalize_transfer(&tx),
            Err(NormalizeError::NotInteger { field: "timeStamp", .. })
        ));
    }
}
