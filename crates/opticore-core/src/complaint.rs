//! Complaint domain model: row shapes, identifier generation and sentiment
//! normalization.
//!
//! Column names are fixed by the hosted `reclamos` table and serialized
//! verbatim (`Id_reclamo`, `DNI`, ...); the Rust side keeps snake_case field
//! names underneath.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved value signalling a failed classification. Rows carrying it are
/// reported to the caller and never persisted.
pub const SENTIMENT_SENTINEL: &str = "FALLO_GEMINI";

/// A complaint row as written to the store. `Fecha` is generated server-side
/// and intentionally absent here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    #[serde(rename = "Id_reclamo")]
    pub id_reclamo: String,
    #[serde(rename = "Id_chat")]
    pub id_chat: String,
    #[serde(rename = "DNI")]
    pub dni: Option<i64>,
    #[serde(rename = "Det_reclamo")]
    pub det_reclamo: String,
    #[serde(rename = "Sentimiento")]
    pub sentimiento: String,
    #[serde(rename = "Clasificacion")]
    pub clasificacion: String,
}

/// A complaint row as read back from the store, including the
/// server-generated timestamp.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredComplaint {
    #[serde(rename = "Id_reclamo")]
    pub id_reclamo: String,
    #[serde(rename = "Id_chat", default)]
    pub id_chat: Option<String>,
    #[serde(rename = "DNI", default)]
    pub dni: Option<i64>,
    #[serde(rename = "Det_reclamo", default)]
    pub det_reclamo: String,
    #[serde(rename = "Sentimiento", default)]
    pub sentimiento: String,
    #[serde(rename = "Clasificacion", default)]
    pub clasificacion: String,
    #[serde(rename = "Fecha", default)]
    pub fecha: Option<DateTime<Utc>>,
}

/// Normalizes a sentiment label to `positivo`, `neutral` or `negativo`.
///
/// The classifier occasionally answers with near-synonyms (`bueno`, `mala`,
/// `neutro`); anything unrecognized folds to `neutral`. The failure sentinel
/// is preserved verbatim so batch loops can still detect it after
/// normalization.
pub fn normalize_sentiment(value: &str) -> String {
    let s = value.trim().to_lowercase();
    if s == "fallo_gemini" {
        return SENTIMENT_SENTINEL.to_string();
    }
    match s.as_str() {
        "malo" | "mala" | "negativo" => "negativo",
        "bueno" | "buena" | "positivo" => "positivo",
        "neutral" | "neutro" => "neutral",
        _ => "neutral",
    }
    .to_string()
}

/// Generates a K-sortable unique id: `PREFIX-<epoch millis>-<8 hex chars>`.
pub fn ksid(prefix: &str) -> String {
    let epoch_ms = Utc::now().timestamp_millis();
    let rand8: u32 = rand::random();
    format!("{prefix}-{epoch_ms:013}-{rand8:08x}")
}

/// Generates a complaint id from the customer's DNI and a timestamp
/// (`<dni>_<YYYY-MM-DD_HH:MM:SS>`, UTC). Falls back to a `ksid("R")` when no
/// DNI is available.
pub fn complaint_id(dni: Option<i64>, at: DateTime<Utc>) -> String {
    match dni {
        Some(dni) => format!("{dni}_{}", at.format("%Y-%m-%d_%H:%M:%S")),
        None => ksid("R"),
    }
}

/// Generates a chat id for manually entered complaints.
pub fn chat_id() -> String {
    ksid("CHAT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sentiment_synonyms_are_folded() {
        assert_eq!(normalize_sentiment("Buena"), "positivo");
        assert_eq!(normalize_sentiment("bueno"), "positivo");
        assert_eq!(normalize_sentiment("MALA"), "negativo");
        assert_eq!(normalize_sentiment("malo"), "negativo");
        assert_eq!(normalize_sentiment("neutro"), "neutral");
        assert_eq!(normalize_sentiment(" negativo "), "negativo");
    }

    #[test]
    fn unknown_or_empty_sentiment_defaults_to_neutral() {
        assert_eq!(normalize_sentiment(""), "neutral");
        assert_eq!(normalize_sentiment("entusiasmado"), "neutral");
    }

    #[test]
    fn sentinel_survives_normalization() {
        assert_eq!(normalize_sentiment("FALLO_GEMINI"), SENTIMENT_SENTINEL);
        assert_eq!(normalize_sentiment("fallo_gemini"), SENTIMENT_SENTINEL);
    }

    #[test]
    fn ksid_has_prefix_millis_and_hex_suffix() {
        let id = ksid("CHAT");
        let parts: Vec<&str> = id.splitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CHAT");
        assert_eq!(parts[1].len(), 13);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn complaint_id_uses_dni_and_utc_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 8, 20, 14, 30, 5).unwrap();
        assert_eq!(
            complaint_id(Some(12345678), at),
            "12345678_2025-08-20_14:30:05"
        );
    }

    #[test]
    fn complaint_id_without_dni_falls_back_to_ksid() {
        let id = complaint_id(None, Utc::now());
        assert!(id.starts_with("R-"));
    }

    #[test]
    fn record_serializes_with_store_column_names() {
        let record = ComplaintRecord {
            id_reclamo: "12345678_2025-08-20_14:30:05".into(),
            id_chat: "CHAT-0000000000001-deadbeef".into(),
            dni: Some(12345678),
            det_reclamo: "La entrega llegó tarde".into(),
            sentimiento: "negativo".into(),
            clasificacion: "entrega".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["Id_reclamo"], "12345678_2025-08-20_14:30:05");
        assert_eq!(value["DNI"], 12345678);
        assert_eq!(value["Sentimiento"], "negativo");
        // Null DNI must still serialize as an explicit null so bulk upserts
        // keep a uniform key set across rows.
        let anonymous = ComplaintRecord { dni: None, ..record };
        let value = serde_json::to_value(&anonymous).unwrap();
        assert!(value["DNI"].is_null());
    }
}
