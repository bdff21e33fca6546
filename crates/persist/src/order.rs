//! Persisted display-order records.
//!
//! A record lives under `ghboard.order.v1.<collection>` and holds a JSON array
//! of item ids in display order. Absent and malformed records both read back
//! as an empty order.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use ghboard_core::{ItemId, OrderRecordError};
use metrics::counter;
use tracing::{debug, warn};

use crate::KvStore;

const ORDER_KEY_PREFIX: &str = "ghboard.order.v1.";

pub fn order_key(collection: &str) -> String {
    format!("{}{}", ORDER_KEY_PREFIX, collection)
}

pub fn encode_order(ids: &[ItemId]) -> Result<Vec<u8>> {
    serde_json::to_vec(ids).context("encoding order record")
}

/// Strict decoder: anything but a JSON array of strings is rejected.
pub fn decode_order(bytes: &[u8]) -> Result<Vec<ItemId>, OrderRecordError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let arr = match value {
        serde_json::Value::Array(arr) => arr,
        serde_json::Value::Null => return Err(OrderRecordError::NotArray("null")),
        serde_json::Value::Bool(_) => return Err(OrderRecordError::NotArray("bool")),
        serde_json::Value::Number(_) => return Err(OrderRecordError::NotArray("number")),
        serde_json::Value::String(_) => return Err(OrderRecordError::NotArray("string")),
        serde_json::Value::Object(_) => return Err(OrderRecordError::NotArray("object")),
    };
    arr.into_iter()
        .enumerate()
        .map(|(index, v)| match v {
            serde_json::Value::String(s) => Ok(s),
            _ => Err(OrderRecordError::NonString { index }),
        })
        .collect()
}

/// Read the stored order for `collection`. Never fails: storage errors and
/// malformed records are logged and read as an empty order.
pub fn load_order(store: &dyn KvStore, collection: &str) -> Vec<ItemId> {
    let key = order_key(collection);
    let bytes = match store.get(&key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            debug!(key = %key, "no stored order");
            return Vec::new();
        }
        Err(e) => {
            warn!(key = %key, error = ?e, "reading stored order failed; using source order");
            counter!("order_load_fallback_total", 1u64);
            return Vec::new();
        }
    };
    match decode_order(&bytes) {
        Ok(ids) => {
            debug!(key = %key, ids = ids.len(), "loaded stored order");
            ids
        }
        Err(e) => {
            warn!(key = %key, error = %e, "stored order is malformed; using source order");
            counter!("order_load_fallback_total", 1u64);
            Vec::new()
        }
    }
}

pub fn save_order(store: &dyn KvStore, collection: &str, ids: &[ItemId]) -> Result<()> {
    let key = order_key(collection);
    let bytes = encode_order(ids)?;
    store.set(&key, &bytes).with_context(|| format!("saving order for {}", collection))
}

pub fn clear_order(store: &dyn KvStore, collection: &str) -> Result<()> {
    store.remove(&order_key(collection)).with_context(|| format!("clearing order for {}", collection))
}
