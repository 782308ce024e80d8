//! Webhook response interpretation.
//!
//! The n8n workflow behind the banner webhook is not under our control and
//! its response shape drifts: sometimes JSON with a well-named field,
//! sometimes a bare URL in text, sometimes HTML with an execution id buried
//! in it. The extractors here are tolerant by construction — they prefer
//! semantically named fields, fall back to an exhaustive search, and treat
//! "nothing found" as a normal value rather than an error. All of them are
//! pure and total.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^\s"'<>]+"#).expect("URL regex"));

// Canonical 8-4-4-4-12 form, version nibble 1-5, variant nibble 8/9/a/b.
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}")
        .expect("UUID regex")
});

/// Keys checked first when hunting for a result URL, in order of preference.
const URL_PRIORITY_KEYS: [&str; 6] = [
    "banner_url",
    "url_final",
    "final_url",
    "url",
    "image_url",
    "result_url",
];

/// Keys that may carry a job identifier, in order of preference.
const JOB_ID_KEYS: [&str; 4] = ["job_id", "executionId", "execution_id", "id"];

/// Tagged outcome of interpreting a webhook response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedResult {
    /// A fully-qualified result URL.
    ResultUrl(String),
    /// A job identifier to poll with.
    JobId(String),
    /// Nothing usable; the caller decides what that means.
    NotFound,
}

/// Extracts a result URL from a response body.
///
/// JSON is tried first when the declared content type says so or the body
/// merely looks like JSON; within parsed JSON the priority keys win over an
/// exhaustive depth-first search. Otherwise (or when JSON yields nothing)
/// the raw text is scanned for the first URL-shaped substring. Returns
/// `None` when nothing matches; never fails.
pub fn extract_url(body: &str, content_type: Option<&str>) -> Option<String> {
    let declared_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false);

    if declared_json || looks_like_json(body) {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            if let Some(url) = url_in_value(&value) {
                return Some(url);
            }
        }
    }

    URL_RE.find(body).map(|m| clean_url(m.as_str()))
}

/// Extracts a job identifier from a response body.
///
/// A JSON object is checked against the known id keys (first UUID-bearing
/// string value wins, no recursion into nested values); any other body —
/// including HTML the workflow sometimes returns — is scanned for the first
/// embedded UUID. Returns `None` when nothing matches; never fails.
pub fn extract_job_id(body: &str) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in JOB_ID_KEYS {
            if let Some(Value::String(value)) = map.get(key) {
                if let Some(m) = UUID_RE.find(value) {
                    return Some(m.as_str().to_string());
                }
            }
        }
    }
    UUID_RE.find(body).map(|m| m.as_str().to_string())
}

/// Interprets a response body, preferring a result URL over a job id.
pub fn interpret(body: &str, content_type: Option<&str>) -> ExtractedResult {
    if let Some(url) = extract_url(body, content_type) {
        return ExtractedResult::ResultUrl(url);
    }
    if let Some(job_id) = extract_job_id(body) {
        return ExtractedResult::JobId(job_id);
    }
    ExtractedResult::NotFound
}

/// One status-poll response: `(status, banner_url)`, either of which may be
/// absent. Terminal once `banner_url` is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStatus {
    pub status: Option<String>,
    pub banner_url: Option<String>,
}

impl PollStatus {
    /// True once the poll carries a result URL.
    pub fn is_terminal(&self) -> bool {
        self.banner_url.is_some()
    }
}

/// Parses a status-poll body, best-effort. Anything that is not a JSON
/// object with the expected string fields yields the empty pair — a failed
/// poll is not a fatal condition, the next tick may succeed.
pub fn parse_poll_body(body: &str) -> PollStatus {
    let Ok(Value::Object(map)) = serde_json::from_str(body) else {
        return PollStatus::default();
    };
    let field = |key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    PollStatus {
        status: field("status"),
        banner_url: field("banner_url"),
    }
}

fn looks_like_json(text: &str) -> bool {
    let t = text.trim();
    (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']'))
}

/// Recursive priority-then-exhaustive search for a URL-shaped string.
fn url_in_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => URL_RE.find(s).map(|m| clean_url(m.as_str())),
        Value::Object(map) => {
            for key in URL_PRIORITY_KEYS {
                if let Some(inner) = map.get(key) {
                    if let Some(url) = url_in_value(inner) {
                        return Some(url);
                    }
                }
            }
            map.values().find_map(url_in_value)
        }
        Value::Array(items) => items.iter().find_map(url_in_value),
        _ => None,
    }
}

/// Drops sentence punctuation that the permissive URL pattern drags along
/// when the URL is embedded in prose ("... https://x/a.jpg, thanks").
fn clean_url(matched: &str) -> String {
    matched.trim_end_matches([',', '.', ';', ':', '!', '?']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_banner_url_wins_over_siblings() {
        let body = r#"{"status":"done","other_url":"https://bad.example/x","banner_url":"https://cdn.example.com/banner.png"}"#;
        assert_eq!(
            extract_url(body, Some("application/json")),
            Some("https://cdn.example.com/banner.png".to_string())
        );
    }

    #[test]
    fn priority_key_order_is_respected() {
        let body = r#"{"url":"https://second.example/b.jpg","url_final":"https://first.example/a.jpg"}"#;
        assert_eq!(
            extract_url(body, Some("application/json")),
            Some("https://first.example/a.jpg".to_string())
        );
    }

    #[test]
    fn nested_non_priority_keys_are_searched_exhaustively() {
        let body = r#"{"result":{"payload":{"location":"https://cdn.example.com/deep.jpg"}}}"#;
        assert_eq!(
            extract_url(body, Some("application/json")),
            Some("https://cdn.example.com/deep.jpg".to_string())
        );
    }

    #[test]
    fn arrays_are_searched_in_order() {
        let body = r#"[{"note":"nothing"},{"link":"https://cdn.example.com/from-array.png"}]"#;
        assert_eq!(
            extract_url(body, None),
            Some("https://cdn.example.com/from-array.png".to_string())
        );
    }

    #[test]
    fn plain_text_url_is_found_without_trailing_punctuation() {
        let body = "Result ready: https://cdn.example.com/a.jpg, thanks";
        assert_eq!(
            extract_url(body, Some("text/plain")),
            Some("https://cdn.example.com/a.jpg".to_string())
        );
    }

    #[test]
    fn declared_json_that_fails_to_parse_falls_back_to_text_scan() {
        let body = "{not json at all https://cdn.example.com/raw.jpg}";
        assert_eq!(
            extract_url(body, Some("application/json")),
            Some("https://cdn.example.com/raw.jpg".to_string())
        );
    }

    #[test]
    fn absence_is_none_not_an_error() {
        assert_eq!(extract_url("all done, no link here", None), None);
        assert_eq!(extract_url(r#"{"status":"ok"}"#, Some("application/json")), None);
        assert_eq!(extract_url("", None), None);
    }

    #[test]
    fn job_id_keys_are_checked_in_order() {
        let body = r#"{"id":"aaaaaaaa-bbbb-1ccc-8ddd-eeeeeeeeeeee","job_id":"9f8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d"}"#;
        assert_eq!(
            extract_job_id(body),
            Some("9f8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d".to_string())
        );
    }

    #[test]
    fn id_key_with_non_uuid_value_falls_through() {
        // "id" exists but is not UUID-shaped; no other key, no embedded UUID.
        assert_eq!(extract_job_id(r#"{"id":"12345"}"#), None);
        // The raw-text fallback still finds a UUID elsewhere in the body.
        let body = r#"{"id":"12345","note":"run 9f8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d"}"#;
        assert_eq!(
            extract_job_id(body),
            Some("9f8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d".to_string())
        );
    }

    #[test]
    fn uuid_embedded_in_html_is_found() {
        let body = "<html><body>Workflow started: 9f8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d</body></html>";
        assert_eq!(
            extract_job_id(body),
            Some("9f8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d".to_string())
        );
    }

    #[test]
    fn uuid_version_and_variant_nibbles_are_enforced() {
        // version nibble 0 -> rejected
        assert_eq!(extract_job_id("00000000-0000-0000-8000-000000000000"), None);
        // variant nibble 7 -> rejected
        assert_eq!(extract_job_id("9f8b7c6d-5e4f-4a3b-7c2d-1e0f9a8b7c6d"), None);
        // versions 1-5 with variant 8/9/a/b -> accepted
        for (version, variant) in [('1', '8'), ('3', '9'), ('4', 'a'), ('5', 'b')] {
            let id = format!("9f8b7c6d-5e4f-{version}a3b-{variant}c2d-1e0f9a8b7c6d");
            assert_eq!(extract_job_id(&id), Some(id.clone()), "{id}");
        }
    }

    #[test]
    fn uppercase_uuids_are_accepted() {
        let body = r#"{"job_id":"9F8B7C6D-5E4F-4A3B-8C2D-1E0F9A8B7C6D"}"#;
        assert_eq!(
            extract_job_id(body),
            Some("9F8B7C6D-5E4F-4A3B-8C2D-1E0F9A8B7C6D".to_string())
        );
    }

    #[test]
    fn interpret_prefers_url_over_job_id() {
        let body = r#"{"job_id":"9f8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d","banner_url":"https://cdn.example.com/done.jpg"}"#;
        assert_eq!(
            interpret(body, Some("application/json")),
            ExtractedResult::ResultUrl("https://cdn.example.com/done.jpg".to_string())
        );
        assert_eq!(interpret("nothing here", None), ExtractedResult::NotFound);
    }

    #[test]
    fn poll_body_without_url_is_not_terminal() {
        let poll = parse_poll_body(r#"{"status":"processing"}"#);
        assert_eq!(poll.status.as_deref(), Some("processing"));
        assert!(!poll.is_terminal());
    }

    #[test]
    fn poll_body_with_url_is_terminal() {
        let poll = parse_poll_body(r#"{"status":"done","banner_url":"https://x/y.jpg"}"#);
        assert!(poll.is_terminal());
        assert_eq!(poll.banner_url.as_deref(), Some("https://x/y.jpg"));
    }

    #[test]
    fn empty_banner_url_does_not_terminate_polling() {
        let poll = parse_poll_body(r#"{"status":"queued","banner_url":""}"#);
        assert!(!poll.is_terminal());
    }

    #[test]
    fn malformed_poll_bodies_yield_the_empty_pair() {
        assert_eq!(parse_poll_body("<html>oops</html>"), PollStatus::default());
        assert_eq!(parse_poll_body("[1,2,3]"), PollStatus::default());
        assert_eq!(parse_poll_body(""), PollStatus::default());
    }
}
