use anyhow::{Context, Result};
use opticore_core::complaint::ComplaintRecord;
use opticore_core::import::read_complaints;
use opticore_services::{ComplaintStore, GeminiClassifier};
use std::fs::File;
use std::path::Path;
use tracing::warn;

pub async fn run(input: &Path, dry_run: bool) -> Result<()> {
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let outcome = read_complaints(file)?;
    for rejection in &outcome.rejected {
        warn!(%rejection, "skipping row");
    }
    if outcome.drafts.is_empty() {
        println!("No usable rows in {}", input.display());
        return Ok(());
    }

    let classifier = GeminiClassifier::try_from_env()?;
    let texts: Vec<String> = outcome
        .drafts
        .iter()
        .map(|d| d.det_reclamo.clone())
        .collect();
    let results = classifier.classify_batch(&texts).await;

    let mut rows = Vec::new();
    let mut failures = Vec::new();
    for (draft, (classification, detail)) in outcome.drafts.iter().zip(results) {
        if classification.failed() {
            let detail = detail.unwrap_or_else(|| "classification failed".to_string());
            failures.push(format!("{}: {detail}", draft.id_reclamo));
            continue;
        }
        rows.push(ComplaintRecord {
            id_reclamo: draft.id_reclamo.clone(),
            id_chat: draft.id_chat.clone(),
            dni: draft.dni,
            det_reclamo: draft.det_reclamo.clone(),
            sentimiento: classification.sentimiento,
            clasificacion: classification.clasificacion,
        });
    }

    if dry_run {
        for row in &rows {
            println!("{}\t{}\t{}", row.id_reclamo, row.sentimiento, row.clasificacion);
        }
        println!("Dry run: {} rows classified, nothing stored", rows.len());
    } else if rows.is_empty() {
        println!("Nothing to store");
    } else {
        let store = ComplaintStore::try_from_env()?;
        let stored = store.upsert(&rows).await?;
        println!("Stored {stored} classified complaints");
    }

    if !failures.is_empty() {
        eprintln!("{} rows failed classification and were not stored:", failures.len());
        for failure in &failures {
            eprintln!("  {failure}");
        }
    }
    Ok(())
}
