use std::collections::BTreeMap;

use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::DateWindow;
use crate::sources::{SourceDescriptor, SourceName};

/// Raw payload per source; `None` means the source delivered nothing usable.
pub type RawSources = BTreeMap<SourceName, Option<Value>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SourceOutcome {
    Ok,
    HttpStatus(u16),
    Transport(String),
    Decode(String),
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, SourceOutcome::Ok)
    }
}

impl std::fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceOutcome::Ok => write!(f, "ok"),
            SourceOutcome::HttpStatus(code) => write!(f, "http {code}"),
            SourceOutcome::Transport(detail) => write!(f, "transport error: {detail}"),
            SourceOutcome::Decode(detail) => write!(f, "decode error: {detail}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub outcomes: BTreeMap<SourceName, SourceOutcome>,
}

impl FetchReport {
    pub fn is_partial(&self) -> bool {
        self.outcomes.values().any(|outcome| !outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SourceName, &SourceOutcome)> {
        self.outcomes.iter().filter(|(_, outcome)| !outcome.is_ok())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchedBatch {
    pub payloads: RawSources,
    pub report: FetchReport,
}

impl FetchedBatch {
    pub fn record(&mut self, name: SourceName, result: Result<Value, SourceOutcome>) {
        match result {
            Ok(payload) => {
                self.payloads.insert(name, Some(payload));
                self.report.outcomes.insert(name, SourceOutcome::Ok);
            }
            Err(outcome) => {
                self.payloads.insert(name, None);
                self.report.outcomes.insert(name, outcome);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    client: Client,
    base_url: String,
}

impl AnalyticsClient {
    pub fn new(config: &ApiConfig) -> PipelineResult<Self> {
        let base = config.parsed_base()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("portfolio-analytics/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PipelineError::InvalidConfig(format!("failed to create HTTP client: {e}"))
            })?;

        let base_url = base.as_str().trim_end_matches('/').to_string();
        info!(
            "Created AnalyticsClient for base_url: {}, timeout: {}ms",
            base_url, config.timeout_ms
        );

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_sources(
        &self,
        window: &DateWindow,
        descriptors: &[SourceDescriptor],
    ) -> FetchedBatch {
        let requests = descriptors.iter().map(|descriptor| async move {
            let result = self.fetch_one(window, descriptor).await;
            (descriptor.name, result)
        });
        let settled = join_all(requests).await;

        let mut batch = FetchedBatch::default();
        for (name, result) in settled {
            if let Err(outcome) = &result {
                warn!(source = %name, window = %window, "source degraded: {}", outcome);
            }
            batch.record(name, result);
        }
        batch
    }

    async fn fetch_one(
        &self,
        window: &DateWindow,
        descriptor: &SourceDescriptor,
    ) -> Result<Value, SourceOutcome> {
        let url = format!("{}{}", self.base_url, descriptor.path);
        let mut request = self.client.get(&url);
        if descriptor.dated {
            request = request.query(&[
                ("start_date", window.start().format("%Y-%m-%d").to_string()),
                ("end_date", window.end().format("%Y-%m-%d").to_string()),
            ]);
        }

        debug!(source = %descriptor.name, url = %url, "fetching");
        let response = request
            .send()
            .await
            .map_err(|e| SourceOutcome::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceOutcome::HttpStatus(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                SourceOutcome::Decode(e.to_string())
            } else {
                SourceOutcome::Transport(e.to_string())
            }
        })
    }
}
