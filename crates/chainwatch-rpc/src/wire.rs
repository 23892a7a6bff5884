//! Raw JSON shapes returned by EVM nodes and their conversion into core types.

use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256};
use chainwatch_core::{LogEntry, LogFilter, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A raw EVM log as returned by `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: Option<String>,
    pub transaction_hash: Option<String>,
    pub transaction_index: Option<String>,
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

/// A raw transaction as returned by `eth_getTransactionByHash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub hash: String,
    pub input: String,
    pub block_number: Option<String>,
}

/// Parse a hex quantity (with or without `0x`) to u64.
pub fn parse_hex_u64(s: &str) -> Result<u64, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| format!("bad hex quantity '{s}': {e}"))
}

pub fn parse_bytes(s: &str) -> Result<Bytes, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| format!("bad hex data: {e}"))
}

pub fn parse_b256(s: &str) -> Result<B256, String> {
    B256::from_str(s).map_err(|e| format!("bad 32-byte hash '{s}': {e}"))
}

fn required<'a>(field: &'static str, v: &'a Option<String>) -> Result<&'a str, String> {
    v.as_deref().ok_or_else(|| format!("missing {field} (pending log?)"))
}

impl TryFrom<RawLog> for LogEntry {
    type Error = String;

    fn try_from(raw: RawLog) -> Result<Self, Self::Error> {
        Ok(LogEntry {
            address: Address::from_str(&raw.address).map_err(|e| format!("bad address '{}': {e}", raw.address))?,
            topics: raw
                .topics
                .iter()
                .map(|t| parse_b256(t))
                .collect::<Result<_, _>>()?,
            data: parse_bytes(&raw.data)?,
            block_number: parse_hex_u64(required("blockNumber", &raw.block_number)?)?,
            tx_index: parse_hex_u64(required("transactionIndex", &raw.transaction_index)?)?,
            log_index: parse_hex_u64(required("logIndex", &raw.log_index)?)?,
            tx_hash: parse_b256(required("transactionHash", &raw.transaction_hash)?)?,
        })
    }
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = String;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        Ok(Transaction {
            hash: parse_b256(&raw.hash)?,
            input: parse_bytes(&raw.input)?,
            block_number: raw.block_number.as_deref().map(parse_hex_u64).transpose()?,
        })
    }
}

/// Build the single `eth_getLogs` filter object for `filter`.
pub fn log_filter_params(filter: &LogFilter) -> Value {
    let addresses: Vec<String> = filter.addresses.iter().map(|a| format!("{a:#x}")).collect();
    let topic0: Vec<String> = filter.topic0.iter().map(|t| format!("{t:#x}")).collect();
    json!({
        "fromBlock": format!("{:#x}", filter.from_block),
        "toBlock": format!("{:#x}", filter.to_block),
        "address": addresses,
        "topics": [topic0],
    })
}
