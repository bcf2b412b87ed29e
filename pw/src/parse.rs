//! Itinerary payload extraction

use tracing::debug;

/// Delimiter the planner prints before the final itinerary payload.
///
/// This is a textual contract with both planner tiers: everything after the
/// last occurrence is the payload, everything before it is preamble noise
/// (progress logs, agent chatter).
pub const ITINERARY_DELIMITER: &str = "=== Final Itinerary (Markdown) ===";

/// Strategy for extracting the itinerary payload from raw planner output.
///
/// Kept behind a trait so alternative framing (e.g. a structured payload
/// envelope) can replace delimiter scanning without touching the dispatcher.
pub trait PayloadParser: Send + Sync {
    /// Extract the payload from raw output. Never fails: empty input yields
    /// empty output, which the caller treats as a soft failure.
    fn extract(&self, raw: &str) -> String;
}

/// Delimiter-based parser tolerant of planners that omit the marker
#[derive(Debug, Clone)]
pub struct DelimiterParser {
    delimiter: &'static str,
}

impl DelimiterParser {
    pub fn new() -> Self {
        Self {
            delimiter: ITINERARY_DELIMITER,
        }
    }
}

impl Default for DelimiterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadParser for DelimiterParser {
    fn extract(&self, raw: &str) -> String {
        // Last occurrence wins, so an echo of the marker inside upstream log
        // noise cannot truncate the payload.
        match raw.rfind(self.delimiter) {
            Some(idx) => {
                debug!(idx, "DelimiterParser::extract: delimiter found");
                raw[idx + self.delimiter.len()..].trim().to_string()
            }
            None => {
                debug!("DelimiterParser::extract: no delimiter, using whole output");
                raw.trim().to_string()
            }
        }
    }
}
