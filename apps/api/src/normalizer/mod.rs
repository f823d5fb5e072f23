//! Response Normalizer: turns free-form model output into a `NormalizedRecord`.
//!
//! Pipeline: collapse line breaks → outermost `{...}` region → repair →
//! strict JSON parse → field defaulting.
//!
//! Contract:
//! - a malformed region always degrades to the fallback record (raw text under
//!   the narrative field); a parse error never reaches the caller
//! - a response with no region degrades the same way under
//!   `NoPayloadPolicy::Fallback`, and is `NormalizeError::NoStructuredPayload`
//!   under `NoPayloadPolicy::Strict`
//!
//! Pure and synchronous. Safe to share across request tasks.

pub mod record;
pub mod repair;

use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub use record::{FallbackReason, NormalizedRecord, RecordOrigin, RecordValue};
use repair::{collapse_line_breaks, outermost_brace_region, repair};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("no structured payload found in model response")]
    NoStructuredPayload,
}

/// What to do when the response contains no brace region at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoPayloadPolicy {
    /// Wrap the raw text as the narrative field. Prose answers are accepted.
    #[default]
    Fallback,
    /// Fail with `NormalizeError::NoStructuredPayload`.
    Strict,
}

impl FromStr for NoPayloadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(NoPayloadPolicy::Fallback),
            "strict" => Ok(NoPayloadPolicy::Strict),
            other => Err(format!(
                "unknown no-payload policy '{other}' (expected 'fallback' or 'strict')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer {
    policy: NoPayloadPolicy,
}

impl ResponseNormalizer {
    pub fn new(policy: NoPayloadPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> NoPayloadPolicy {
        self.policy
    }

    pub fn normalize(&self, raw: &str) -> Result<NormalizedRecord, NormalizeError> {
        let collapsed = collapse_line_breaks(raw);

        let Some(region) = outermost_brace_region(&collapsed) else {
            return match self.policy {
                NoPayloadPolicy::Fallback => {
                    debug!("No brace region in response; wrapping raw text");
                    Ok(NormalizedRecord::fallback(
                        raw,
                        FallbackReason::NoStructuredPayload,
                    ))
                }
                NoPayloadPolicy::Strict => Err(NormalizeError::NoStructuredPayload),
            };
        };

        let repaired = repair(region);

        match serde_json::from_str::<Value>(&repaired) {
            Ok(Value::Object(map)) => {
                let fields = map
                    .into_iter()
                    .map(|(k, v)| (k, RecordValue::from(v)))
                    .collect();
                Ok(NormalizedRecord::structured(fields))
            }
            Ok(_) => {
                warn!("Brace region parsed to a non-object value; falling back to raw text");
                Ok(NormalizedRecord::fallback(raw, FallbackReason::MalformedPayload))
            }
            Err(e) => {
                warn!(
                    "Brace region unparsable after repair ({e}); falling back to raw text ({} chars)",
                    raw.len()
                );
                Ok(NormalizedRecord::fallback(raw, FallbackReason::MalformedPayload))
            }
        }
    }
}
