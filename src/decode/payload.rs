//! Nested values packed into a single binary cell
//!
//! `withdrawals`, `access_list` and `trace_address` arrive as bincode-encoded lists.
//! Scalars inside withdrawals and access lists are `0x`-prefixed hex strings.

use crate::error::DecodeError;
use crate::types::{AccessListItem, Withdrawal};
use alloy_primitives::{Address, B256, U256};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct WireWithdrawal {
    pub index: Option<String>,
    pub validator_index: Option<String>,
    pub address: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct WireAccessListItem {
    pub address: Option<String>,
    pub storage_keys: Option<Vec<String>>,
}

fn malformed(column: &str, message: impl Into<String>) -> DecodeError {
    DecodeError::Payload {
        column: column.to_string(),
        message: message.into(),
    }
}

fn unpack<T: DeserializeOwned>(column: &str, bytes: &[u8]) -> Result<T, DecodeError> {
    bincode::deserialize(bytes).map_err(|e| malformed(column, e.to_string()))
}

fn hex_digits<'s>(column: &str, value: &'s str) -> Result<&'s str, DecodeError> {
    value
        .strip_prefix("0x")
        .ok_or_else(|| malformed(column, format!("expected 0x-prefixed hex, got {value:?}")))
}

fn hex_u64(column: &str, value: Option<String>) -> Result<Option<u64>, DecodeError> {
    value
        .map(|v| {
            u64::from_str_radix(hex_digits(column, &v)?, 16)
                .map_err(|e| malformed(column, format!("{v:?}: {e}")))
        })
        .transpose()
}

fn hex_quantity(column: &str, value: Option<String>) -> Result<Option<U256>, DecodeError> {
    value
        .map(|v| {
            U256::from_str_radix(hex_digits(column, &v)?, 16)
                .map_err(|e| malformed(column, format!("{v:?}: {e}")))
        })
        .transpose()
}

fn hex_address(column: &str, value: Option<String>) -> Result<Option<Address>, DecodeError> {
    value
        .map(|v| {
            hex_digits(column, &v)?;
            v.parse::<Address>()
                .map_err(|e| malformed(column, format!("{v:?}: {e}")))
        })
        .transpose()
}

fn hex_hash(column: &str, value: &str) -> Result<B256, DecodeError> {
    hex_digits(column, value)?;
    value
        .parse::<B256>()
        .map_err(|e| malformed(column, format!("{value:?}: {e}")))
}

pub(crate) fn withdrawals(column: &str, bytes: &[u8]) -> Result<Vec<Withdrawal>, DecodeError> {
    unpack::<Vec<WireWithdrawal>>(column, bytes)?
        .into_iter()
        .map(|w| {
            Ok(Withdrawal {
                index: hex_u64(column, w.index)?,
                validator_index: hex_u64(column, w.validator_index)?,
                address: hex_address(column, w.address)?,
                amount: hex_quantity(column, w.amount)?,
            })
        })
        .collect()
}

pub(crate) fn access_list(column: &str, bytes: &[u8]) -> Result<Vec<AccessListItem>, DecodeError> {
    unpack::<Vec<WireAccessListItem>>(column, bytes)?
        .into_iter()
        .map(|item| {
            let storage_keys = item
                .storage_keys
                .map(|keys| {
                    keys.iter()
                        .map(|key| hex_hash(column, key))
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?;
            Ok(AccessListItem {
                address: hex_address(column, item.address)?,
                storage_keys,
            })
        })
        .collect()
}

/// Position of a trace in the call tree, root first
pub(crate) fn trace_address(column: &str, bytes: &[u8]) -> Result<Vec<u64>, DecodeError> {
    unpack(column, bytes)
}
