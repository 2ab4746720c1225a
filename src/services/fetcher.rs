//! Results service client
//!
//! The only asynchronous boundary in the system: one blocking request per
//! period selection, returning a JSON array of raw observation records.
//! A file-backed source serves offline use and fixtures.

use crate::services::config::Config;
use crate::services::normalizer::{normalize_rows, RawRecord};
use crate::types::{Observation, PeriodChoice, Result, RunstatError};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Blocking HTTP client for the results service.
#[derive(Clone)]
pub struct ResultsClient {
    base_url: String,
    since_date: chrono::NaiveDate,
    client: reqwest::blocking::Client,
}

impl ResultsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RunstatError::Fetch(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            since_date: config.since_date,
            client,
        })
    }

    /// Fetch the raw observation set for a period selection.
    pub fn fetch(&self, period: PeriodChoice) -> Result<Vec<Observation>> {
        let url = format!("{}/results", self.base_url);
        let mut request = self.client.get(&url).query(&[("period", period.query_key())]);
        if period == PeriodChoice::SinceDate {
            request = request.query(&[("since", self.since_date.format("%Y-%m-%d").to_string())]);
        }

        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| RunstatError::Fetch(e.to_string()))?;
        let bytes = response
            .bytes()
            .map_err(|e| RunstatError::Fetch(e.to_string()))?;
        parse_payload(bytes.to_vec())
    }
}

/// Parse a fetched JSON payload (array of raw records) into observations.
pub fn parse_payload(mut bytes: Vec<u8>) -> Result<Vec<Observation>> {
    let records: Vec<RawRecord> =
        simd_json::from_slice(&mut bytes).map_err(|e| RunstatError::Parse(e.to_string()))?;
    Ok(normalize_rows(&records))
}

/// Load observations from a local JSON file of raw records.
pub fn load_file(path: &Path) -> Result<Vec<Observation>> {
    let bytes = std::fs::read(path)?;
    parse_payload(bytes)
}

/// Where rows come from: the remote service or a local file.
#[derive(Clone)]
pub enum DataSource {
    Remote(ResultsClient),
    File(PathBuf),
}

impl DataSource {
    pub fn load(&self, period: PeriodChoice) -> Result<Vec<Observation>> {
        match self {
            Self::Remote(client) => client.fetch(period),
            Self::File(path) => load_file(path),
        }
    }
}
