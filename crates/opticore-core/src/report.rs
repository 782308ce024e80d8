//! Trend aggregation over stored complaints.
//!
//! Pure counting over rows fetched from the store; the numbers behind the
//! dashboard charts. `BTreeMap`s keep the output deterministically ordered.

use crate::complaint::StoredComplaint;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Aggregated complaint counts for a fetched window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    /// Count per sentiment label.
    pub by_sentiment: BTreeMap<String, usize>,
    /// Count per day. Rows without a server timestamp are omitted here (they
    /// still count toward `total` and the other breakdowns).
    pub by_day: BTreeMap<NaiveDate, usize>,
    /// Sentiment breakdown per category.
    pub by_category: BTreeMap<String, BTreeMap<String, usize>>,
}

impl ReportSummary {
    pub fn from_rows(rows: &[StoredComplaint]) -> Self {
        let mut summary = Self {
            total: rows.len(),
            ..Self::default()
        };
        for row in rows {
            *summary
                .by_sentiment
                .entry(row.sentimiento.clone())
                .or_default() += 1;
            if let Some(fecha) = row.fecha {
                *summary.by_day.entry(fecha.date_naive()).or_default() += 1;
            }
            let category = if row.clasificacion.is_empty() {
                "otros".to_string()
            } else {
                row.clasificacion.clone()
            };
            *summary
                .by_category
                .entry(category)
                .or_default()
                .entry(row.sentimiento.clone())
                .or_default() += 1;
        }
        summary
    }

    pub fn positives(&self) -> usize {
        self.by_sentiment.get("positivo").copied().unwrap_or(0)
    }

    pub fn negatives(&self) -> usize {
        self.by_sentiment.get("negativo").copied().unwrap_or(0)
    }
}
