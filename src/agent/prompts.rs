//! Fixed questions asked about every competitor, and parsing of the answers.

use serde_json::{Map, Value};

/// Compares the latest snapshot with stored history.
pub const HISTORICAL_QUERY: &str = "What are the main changes in terms of:
1. Pricing
2. Products
3. Partnerships
4. Funding
5. Positioning
Compare with historical data and identify significant changes.";

/// Asks for the current state as JSON keyed by finding category.
pub const CURRENT_STATE_QUERY: &str = "Analyze the latest content and identify:
1. Current pricing information
2. Product offerings
3. Recent partnerships
4. Funding news
5. Market positioning
Provide the analysis in JSON format.";

/// Parse a model answer as a JSON object of findings.
///
/// The answer may be wrapped in a single Markdown code fence. Anything that
/// is not a JSON object yields `None`.
pub fn parse_findings(answer: &str) -> Option<Map<String, Value>> {
    let body = strip_code_fence(answer.trim());
    match serde_json::from_str::<Value>(body).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    match inner.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => inner.trim(),
    }
}
