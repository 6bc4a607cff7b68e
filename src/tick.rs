use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One observation of an instrument, in the exact shape the engine's gateway parses.
///
/// Field order matters: it is the key order of the encoded JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tick {
    pub timestamp_ms: i64,
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode tick for {symbol}")]
    Encode {
        symbol: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("payload does not match the tick schema")]
    Decode(#[source] serde_json::Error),
}

impl Tick {
    /// Encodes the tick as one compact JSON object:
    /// `{"timestamp_ms":..,"symbol":..,"price":..,"volume":..}`.
    pub fn to_wire(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(|source| WireError::Encode {
            symbol: self.symbol.clone(),
            source,
        })
    }

    pub fn from_wire(payload: &str) -> Result<Self, WireError> {
        serde_json::from_str(payload).map_err(WireError::Decode)
    }
}
