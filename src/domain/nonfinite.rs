//! Serde helpers for `f64` fields that may legitimately be non-finite.
//!
//! JSON has no infinity or NaN, and `serde_json` writes both as `null` but
//! refuses to read `null` back into an `f64`. These helpers write any
//! non-finite value as `null` and restore a fixed value on read.

use serde::{Deserialize, Deserializer, Serializer};

fn serialize_finite_or_null<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

/// Uncertainties: `null` reads back as `+∞` (no constraint on the parameter).
pub mod unbounded {
    use super::*;

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_finite_or_null(value, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// Statistics that can be undefined: `null` reads back as NaN.
pub mod undefined {
    use super::*;

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_finite_or_null(value, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
