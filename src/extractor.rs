use serde_json::Value;

use crate::error::{AnalyzerError, Result};

/// Returns the slice from the first `{` through the last `}` of `text`.
///
/// `None` when either brace is missing or the last `}` comes before the
/// first `{`. Braces inside surrounding prose are not skipped, so
/// `"score > {5} ... {real}"` yields a span that starts at `{5}`.
pub fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Extracts the JSON object a model embedded in free-form reply text.
///
/// Leading and trailing commentary (including markdown fences) is dropped by
/// [`brace_span`]; the span itself is parsed strictly. The parsed value is
/// returned untouched.
pub fn extract_json(reply: &str) -> Result<Value> {
    let span = brace_span(reply).ok_or(AnalyzerError::NoJsonFound)?;
    serde_json::from_str(span).map_err(AnalyzerError::MalformedJson)
}
