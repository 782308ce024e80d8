use anyhow::{Result, bail};
use chrono::Utc;
use opticore_core::complaint::{ComplaintRecord, chat_id, complaint_id};
use opticore_services::{ComplaintStore, GeminiClassifier};

pub async fn run(text: &str, dni: Option<i64>) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        bail!("complaint text is empty");
    }

    let classifier = GeminiClassifier::try_from_env()?;
    let (classification, detail) = classifier.classify(text).await;
    if classification.failed() {
        // Sentinel rows never reach the store.
        bail!(
            "classification failed, nothing stored: {}",
            detail.unwrap_or_else(|| "no detail".to_string())
        );
    }

    let record = ComplaintRecord {
        id_reclamo: complaint_id(dni, Utc::now()),
        id_chat: chat_id(),
        dni,
        det_reclamo: text.to_string(),
        sentimiento: classification.sentimiento,
        clasificacion: classification.clasificacion,
    };

    let store = ComplaintStore::try_from_env()?;
    store.upsert(std::slice::from_ref(&record)).await?;
    println!(
        "Stored {} ({} / {})",
        record.id_reclamo, record.sentimiento, record.clasificacion
    );
    Ok(())
}
