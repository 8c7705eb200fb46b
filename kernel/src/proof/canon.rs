//! Canonical JSON bytes for digests.
//!
//! Every digest in the workspace (discovery plans, suite reports) hashes
//! bytes produced here and nowhere else.
//!
//! # Rules
//!
//! 1. Object keys sorted by byte order, at every depth.
//! 2. Compact form, no whitespace.
//! 3. Integers only. Floats are rejected so formatting cannot drift
//!    between platforms.

/// Error type for canonical JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonError {
    /// A number was not representable as `i64` or `u64`.
    NonIntegerNumber { raw: String },
    /// The serializer itself failed.
    Serialize { detail: String },
}

impl std::fmt::Display for CanonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonIntegerNumber { raw } => {
                write!(f, "non-integer number in canonical JSON: {raw}")
            }
            Self::Serialize { detail } => write!(f, "canonical JSON serialization: {detail}"),
        }
    }
}

impl std::error::Error for CanonError {}

/// Produce canonical JSON bytes from a `serde_json::Value`.
///
/// # Errors
///
/// Returns [`CanonError::NonIntegerNumber`] if any number is not an
/// integer.
pub fn canonical_json_bytes(value: &serde_json::Value) -> Result<Vec<u8>, CanonError> {
    let sorted = sorted_copy(value)?;
    serde_json::to_vec(&sorted).map_err(|e| CanonError::Serialize {
        detail: e.to_string(),
    })
}

/// Rebuild `value` with keys inserted in sorted order and integers checked.
fn sorted_copy(value: &serde_json::Value) -> Result<serde_json::Value, CanonError> {
    Ok(match value {
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                value.clone()
            } else {
                return Err(CanonError::NonIntegerNumber { raw: n.to_string() });
            }
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(
            items.iter().map(sorted_copy).collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for key in keys {
                out.insert(key.clone(), sorted_copy(&map[key])?);
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Null | serde_json::Value::Bool(_) | serde_json::Value::String(_) => {
            value.clone()
        }
    })
}
