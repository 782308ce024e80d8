//! Complaint row storage on Supabase.
//!
//! Speaks PostgREST directly over reqwest: bulk upsert keyed on
//! `Id_reclamo`, reads filtered by sentiment and date window, newest first.
//! Durability and the `Fecha` timestamp are the database's job.

use crate::truncate_body;
use chrono::{Days, NaiveDate};
use opticore_core::complaint::{ComplaintRecord, StoredComplaint};
use opticore_core::config::StoreConfig;
use opticore_core::{OptiCoreError, Result};
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tracing::info;

/// Read filter: sentiment labels plus an inclusive date window.
#[derive(Debug, Clone, Default)]
pub struct ComplaintFilter {
    /// Keep only these sentiment labels; empty means all.
    pub sentiments: Vec<String>,
    /// Inclusive lower bound (day granularity).
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound (day granularity).
    pub to: Option<NaiveDate>,
}

impl ComplaintFilter {
    /// PostgREST query parameters for this filter, newest rows first.
    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "Fecha.desc".to_string()),
        ];
        if !self.sentiments.is_empty() {
            params.push((
                "Sentimiento".to_string(),
                format!("in.({})", self.sentiments.join(",")),
            ));
        }
        if let Some(from) = self.from {
            params.push(("Fecha".to_string(), format!("gte.{from}T00:00:00+00:00")));
        }
        if let Some(to) = self.to {
            // Exclusive upper bound at the start of the next day keeps the
            // requested day fully included.
            let next_day = to.checked_add_days(Days::new(1)).unwrap_or(to);
            params.push(("Fecha".to_string(), format!("lt.{next_day}T00:00:00+00:00")));
        }
        params
    }
}

/// Client for the hosted complaint table.
#[derive(Clone)]
pub struct ComplaintStore {
    client: Client,
    base_url: String,
    service_key: String,
    table: String,
}

impl ComplaintStore {
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            service_key: service_key.into(),
            table: table.into(),
        }
    }

    /// Loads credentials from the environment (`SUPABASE_URL`,
    /// `SUPABASE_SERVICE_KEY`).
    pub fn try_from_env() -> Result<Self> {
        let config = StoreConfig::from_env()?;
        Ok(Self::new(config.base_url, config.service_key, config.table))
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.service_key.clone(),
            config.table.clone(),
        )
    }

    /// Upserts rows keyed on `Id_reclamo`; existing rows are merged. Returns
    /// the number of rows sent.
    pub async fn upsert(&self, rows: &[ComplaintRecord]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let response = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "Id_reclamo")])
            .header("apikey", &self.service_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header("Prefer", "resolution=merge-duplicates")
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OptiCoreError::store(format!(
                "upsert failed with HTTP {status}: {}",
                truncate_body(&body, 400)
            )));
        }

        info!(rows = rows.len(), table = %self.table, "complaints upserted");
        Ok(rows.len())
    }

    /// Fetches rows matching the filter, ordered by `Fecha` descending.
    pub async fn fetch(&self, filter: &ComplaintFilter) -> Result<Vec<StoredComplaint>> {
        let response = self
            .client
            .get(self.table_url())
            .query(&filter.query_params())
            .header("apikey", &self.service_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.service_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OptiCoreError::store(format!(
                "fetch failed with HTTP {status}: {}",
                truncate_body(&body, 400)
            )));
        }

        response
            .json::<Vec<StoredComplaint>>()
            .await
            .map_err(|err| OptiCoreError::store(format!("failed to decode rows: {err}")))
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            self.table
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_tolerates_trailing_slash() {
        let store = ComplaintStore::new("https://proj.supabase.co/", "key", "reclamos");
        assert_eq!(store.table_url(), "https://proj.supabase.co/rest/v1/reclamos");
        let store = ComplaintStore::new("https://proj.supabase.co", "key", "reclamos");
        assert_eq!(store.table_url(), "https://proj.supabase.co/rest/v1/reclamos");
    }

    #[test]
    fn empty_filter_selects_everything_newest_first() {
        let params = ComplaintFilter::default().query_params();
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "Fecha.desc".to_string()),
            ]
        );
    }

    #[test]
    fn sentiment_filter_uses_postgrest_in_syntax() {
        let filter = ComplaintFilter {
            sentiments: vec!["positivo".into(), "negativo".into()],
            ..Default::default()
        };
        let params = filter.query_params();
        assert!(params.contains(&(
            "Sentimiento".to_string(),
            "in.(positivo,negativo)".to_string()
        )));
    }

    #[test]
    fn date_window_is_inclusive_of_the_last_day() {
        let filter = ComplaintFilter {
            sentiments: vec![],
            from: NaiveDate::from_ymd_opt(2025, 8, 1),
            to: NaiveDate::from_ymd_opt(2025, 8, 31),
        };
        let params = filter.query_params();
        assert!(params.contains(&("Fecha".to_string(), "gte.2025-08-01T00:00:00+00:00".to_string())));
        assert!(params.contains(&("Fecha".to_string(), "lt.2025-09-01T00:00:00+00:00".to_string())));
    }
}
