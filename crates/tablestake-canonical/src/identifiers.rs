use crate::validation::ValidationError;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses a validated identifier from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                static PATTERN: OnceLock<Regex> = OnceLock::new();
                let s = value.into();
                let re = PATTERN.get_or_init(|| Regex::new($pattern).expect("invalid regex"));
                if !re.is_match(&s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    AccountId,
    "Opaque caller identity (`kind:name`, lowercase). The ledger only ever compares these.",
    r"^(user|venue|ledger|service):[a-z][a-z0-9_.-]{0,62}$"
);
newtype!(
    Timestamp,
    "UTC RFC3339 timestamp with `Z` suffix.",
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?Z$"
);

impl AccountId {
    /// Returns the `kind` half of the identifier (`user`, `venue`, ...).
    pub fn kind(&self) -> &str {
        self.0.split_once(':').map(|(kind, _)| kind).unwrap_or("")
    }
}

impl Timestamp {
    /// Builds a timestamp from unix seconds.
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, ValidationError> {
        let instant = DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| {
            ValidationError::OutOfBounds {
                field: "Timestamp",
                value: seconds.to_string(),
            }
        })?;
        Ok(Self(instant.to_rfc3339_opts(SecondsFormat::Secs, true)))
    }

    /// Converts back to unix seconds (sub-second precision is dropped).
    pub fn to_unix_seconds(&self) -> Result<i64, ValidationError> {
        DateTime::parse_from_rfc3339(&self.0)
            .map(|dt| dt.timestamp())
            .map_err(|_| ValidationError::PatternMismatch {
                field: "Timestamp",
                value: self.0.clone(),
            })
    }
}
