//! Content-derived event identifiers.
//!
//! `event_id = sha256(EVENT_DOMAIN_SEPARATOR || canonical_json(event \ event_id))`,
//! encoded base64url without padding.

use crate::{Canonicalizer, Digest};
use serde::Serialize;
use serde_json::Value;

/// Domain separator mixed into every event hash.
pub const EVENT_DOMAIN_SEPARATOR: &[u8] = b"tablestake:event:v1\0";

/// Computes the event id of any serializable event object.
///
/// A top-level `event_id` field, if present, is removed before hashing so an
/// event can be re-hashed after its id has been attached.
///
/// # Errors
///
/// Returns [`EventIdError`] if the event does not serialize to canonical JSON.
pub fn compute_event_id<T: Serialize>(
    event: &T,
    canonicalizer: &Canonicalizer,
) -> Result<Digest, EventIdError> {
    let mut value =
        serde_json::to_value(event).map_err(|e| EventIdError::Serialization(e.to_string()))?;

    match &mut value {
        Value::Object(map) => {
            map.remove("event_id");
        }
        _ => return Err(EventIdError::NotAnObject),
    }

    let bytes = canonicalizer.canonicalize(&value)?;
    Ok(Digest::sha256([EVENT_DOMAIN_SEPARATOR, bytes.as_slice()]))
}

/// Checks a claimed id against the recomputed one.
pub fn verify_event_id<T: Serialize>(
    event: &T,
    claimed_id: &Digest,
    canonicalizer: &Canonicalizer,
) -> Result<bool, EventIdError> {
    Ok(compute_event_id(event, canonicalizer)? == *claimed_id)
}

/// Error during event id computation.
#[derive(thiserror::Error, Debug)]
pub enum EventIdError {
    /// Serialization to JSON failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Events must serialize to JSON objects.
    #[error("event is not a JSON object")]
    NotAnObject,
    /// Canonical encoding failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] crate::CanonicalizationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_ignores_existing_event_id_field() {
        let canonicalizer = Canonicalizer::new();
        let bare = json!({"event_type": "checked_in", "reservation_id": 1});
        let id = compute_event_id(&bare, &canonicalizer).unwrap();

        let mut stamped = bare.clone();
        stamped["event_id"] = serde_json::to_value(&id).unwrap();
        assert!(verify_event_id(&stamped, &id, &canonicalizer).unwrap());
    }

    #[test]
    fn id_is_key_order_independent() {
        let canonicalizer = Canonicalizer::new();
        let a: Value = serde_json::from_str(r#"{"a":1,"b":"x"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"b":"x","a":1}"#).unwrap();
        assert_eq!(
            compute_event_id(&a, &canonicalizer).unwrap(),
            compute_event_id(&b, &canonicalizer).unwrap()
        );
    }

    #[test]
    fn any_field_change_changes_id() {
        let canonicalizer = Canonicalizer::new();
        let a = compute_event_id(&json!({"amount": "100"}), &canonicalizer).unwrap();
        let b = compute_event_id(&json!({"amount": "101"}), &canonicalizer).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn scalars_are_rejected() {
        assert!(matches!(
            compute_event_id(&json!(42), &Canonicalizer::new()),
            Err(EventIdError::NotAnObject)
        ));
    }
}
