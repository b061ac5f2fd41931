use serde_json::Value;

/// Error returned when a value cannot be canonicalized.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Fractional numbers have no single canonical spelling across readers.
    #[error("fractional number at {0}")]
    FractionalNumber(String),
    /// Encoder failure.
    #[error("canonical encoding failed: {0}")]
    Encoding(String),
}

/// RFC 8785 canonical JSON encoder.
///
/// Ledger payloads carry amounts as strings and times as integers, so any
/// fractional number reaching the encoder is rejected with its JSON path.
#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer;

impl Canonicalizer {
    /// Creates a canonicalizer.
    pub fn new() -> Self {
        Self
    }

    /// Produces canonical UTF-8 bytes for `value`.
    pub fn canonicalize(&self, value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
        reject_fractions(value, &mut vec!["$".to_string()])?;
        let canonical = canonical_json::to_string(value)
            .map_err(|err| CanonicalizationError::Encoding(err.to_string()))?;
        Ok(canonical.into_bytes())
    }
}

fn reject_fractions(value: &Value, path: &mut Vec<String>) -> Result<(), CanonicalizationError> {
    match value {
        Value::Number(num) if num.is_f64() => {
            Err(CanonicalizationError::FractionalNumber(path.join(".")))
        }
        Value::Object(map) => {
            for (key, child) in map {
                path.push(key.clone());
                reject_fractions(child, path)?;
                path.pop();
            }
            Ok(())
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                path.push(format!("[{}]", idx));
                reject_fractions(item, path)?;
                path.pop();
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_and_strips_whitespace() {
        let bytes = Canonicalizer::new()
            .canonicalize(&json!({"b": 1, "a": {"z": [1, 2], "y": "x"}}))
            .unwrap();
        assert_eq!(bytes, br#"{"a":{"y":"x","z":[1,2]},"b":1}"#.to_vec());
    }

    #[test]
    fn reports_path_of_fractional_number() {
        let err = Canonicalizer::new()
            .canonicalize(&json!({"outer": {"items": [1, 2.5]}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "fractional number at $.outer.items.[1]");
    }
}
