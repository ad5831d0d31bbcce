//! Canonical JSON encoding for human-readable reports.

use crate::errors::TypesResult;
use serde::Serialize;

/// Serialize `msg` as compact JSON with object keys in lexicographic order.
///
/// Goes through `serde_json::Value`, whose map type is ordered, so the output
/// does not depend on struct field order.
pub fn to_canonical_json<T: Serialize>(msg: &T) -> TypesResult<Vec<u8>> {
    let value = serde_json::to_value(msg)?;
    Ok(serde_json::to_vec(&value)?)
}
