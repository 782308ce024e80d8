//! Service clients for the OptiCore backends.
//!
//! Everything here is reqwest-based HTTP glue: the banner webhook with its
//! sync/async/poll reconciliation, the Gemini complaint classifier, the
//! product-vision endpoint, and the Supabase complaint table.

pub mod banner;
pub mod classifier;
pub mod store;
pub mod vision;
pub mod webhook;

pub use banner::{BannerClient, BannerOutcome, BannerRequest};
pub use classifier::{Classification, GeminiClassifier};
pub use store::{ComplaintFilter, ComplaintStore};
pub use vision::{VisionClient, unwrap_envelope};
pub use webhook::{ExtractedResult, PollStatus};

/// Truncates a response body for error messages, respecting char boundaries.
pub(crate) fn truncate_body(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let truncated: String = text.chars().take(limit).collect();
    format!("{truncated}…")
}
