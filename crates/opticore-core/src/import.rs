//! CSV intake for complaint batches.
//!
//! Operators export complaints from several chat tools, so headers arrive
//! under different names and ids are often missing. This module maps known
//! header aliases onto the canonical columns and autogenerates
//! `Id_reclamo`/`Id_chat`/timestamps where absent. Rows without complaint
//! text are rejected individually; the batch continues.

use crate::complaint::{chat_id, complaint_id};
use crate::error::{OptiCoreError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::io::Read;

const DNI_ALIASES: [&str; 4] = ["dni", "id_cliente", "customer_id", "documento"];
const TEXT_ALIASES: [&str; 5] = ["det_reclamo", "descripcion", "comment", "feedback", "mensaje"];
const ID_ALIASES: [&str; 3] = ["id_reclamo", "id", "reclamo_id"];
const CHAT_ALIASES: [&str; 2] = ["id_chat", "chat_id"];
const DATE_ALIASES: [&str; 2] = ["fecha", "fecha_local"];

/// A complaint parsed from CSV, not yet classified.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftComplaint {
    pub id_reclamo: String,
    pub id_chat: String,
    pub dni: Option<i64>,
    pub det_reclamo: String,
    /// Timestamp used for id generation only; the store assigns `Fecha` itself.
    pub fecha: DateTime<Utc>,
}

/// Result of reading a CSV batch: usable drafts plus per-row rejection
/// messages for the caller to surface.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub drafts: Vec<DraftComplaint>,
    pub rejected: Vec<String>,
}

/// Reads a complaint batch from CSV. Fails only on unreadable input or a
/// missing complaint-text column; individual bad rows land in
/// [`ImportOutcome::rejected`].
pub fn read_complaints<R: Read>(reader: R) -> Result<ImportOutcome> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let find = |aliases: &[&str]| aliases.iter().find_map(|a| headers.iter().position(|h| h == a));
    let text_col = find(&TEXT_ALIASES).ok_or_else(|| {
        OptiCoreError::invalid_request(
            "CSV must contain a complaint text column (Det_reclamo or an alias)",
        )
    })?;
    let dni_col = find(&DNI_ALIASES);
    let id_col = find(&ID_ALIASES);
    let chat_col = find(&CHAT_ALIASES);
    let date_col = find(&DATE_ALIASES);

    let mut outcome = ImportOutcome::default();
    for (index, row) in csv_reader.records().enumerate() {
        let row = row?;
        // Header line is row 1, so data rows start at 2.
        let line = index + 2;
        let get = |col: Option<usize>| {
            col.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let Some(text) = get(Some(text_col)) else {
            outcome.rejected.push(format!("row {line}: complaint text is empty"));
            continue;
        };

        // An unparseable DNI is coerced to null; the complaint text is the
        // payload and the id generation falls back to a ksid.
        let dni = get(dni_col).and_then(|raw| raw.parse::<i64>().ok());

        let fecha = get(date_col).and_then(parse_date).unwrap_or_else(Utc::now);
        let id_chat = get(chat_col).map(str::to_string).unwrap_or_else(chat_id);
        let id_reclamo = get(id_col)
            .map(str::to_string)
            .unwrap_or_else(|| complaint_id(dni, fecha));

        outcome.drafts.push(DraftComplaint {
            id_reclamo,
            id_chat,
            dni,
            det_reclamo: text.to_string(),
            fecha,
        });
    }

    Ok(outcome)
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
