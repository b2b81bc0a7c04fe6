//! CBOR encoding for persistence.
//!
//! Dates are written as tag 1 (epoch seconds as a float) and read back
//! with millisecond precision.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use ciborium::value::{Integer, Value as Cbor};

const EPOCH_TAG: u64 = 1;

/// Encode a value to CBOR bytes.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn to_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&to_cbor_value(value), &mut bytes)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(bytes)
}

/// Decode a value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR, hold an integer
/// outside the `i64` range, or use non-text map keys.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let cbor: Cbor = ciborium::de::from_reader(bytes)
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    from_cbor_value(cbor)
}

#[allow(clippy::cast_precision_loss)]
fn to_cbor_value(value: &Value) -> Cbor {
    match value {
        Value::Null => Cbor::Null,
        Value::Bool(b) => Cbor::Bool(*b),
        Value::Integer(n) => Cbor::Integer(Integer::from(*n)),
        Value::Float(f) => Cbor::Float(*f),
        Value::Text(s) => Cbor::Text(s.clone()),
        Value::Date(millis) => Cbor::Tag(EPOCH_TAG, Box::new(Cbor::Float(*millis as f64 / 1000.0))),
        Value::Bytes(b) => Cbor::Bytes(b.clone()),
        Value::Array(items) => Cbor::Array(items.iter().map(to_cbor_value).collect()),
        Value::Map(fields) => Cbor::Map(
            fields
                .iter()
                .map(|(k, v)| (Cbor::Text(k.clone()), to_cbor_value(v)))
                .collect(),
        ),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn from_cbor_value(cbor: Cbor) -> CodecResult<Value> {
    Ok(match cbor {
        Cbor::Null => Value::Null,
        Cbor::Bool(b) => Value::Bool(b),
        Cbor::Integer(n) => Value::Integer(i64::try_from(n).map_err(|_| CodecError::IntegerOverflow)?),
        Cbor::Float(f) => Value::Float(f),
        Cbor::Text(s) => Value::Text(s),
        Cbor::Bytes(b) => Value::Bytes(b),
        Cbor::Tag(EPOCH_TAG, inner) => match *inner {
            Cbor::Float(secs) => Value::Date((secs * 1000.0).round() as i64),
            Cbor::Integer(secs) => {
                let secs = i64::try_from(secs).map_err(|_| CodecError::IntegerOverflow)?;
                Value::Date(secs.saturating_mul(1000))
            }
            other => return Err(CodecError::decoding_failed(format!(
                "epoch tag wraps unsupported item {other:?}"
            ))),
        },
        Cbor::Tag(_, inner) => from_cbor_value(*inner)?,
        Cbor::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_cbor_value)
                .collect::<CodecResult<_>>()?,
        ),
        Cbor::Map(pairs) => {
            let mut fields = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                let Cbor::Text(key) = key else {
                    return Err(CodecError::unsupported_type("non-text map key"));
                };
                fields.push((key, from_cbor_value(value)?));
            }
            Value::Map(fields)
        }
        other => return Err(CodecError::unsupported_type(format!("{other:?}"))),
    })
}
