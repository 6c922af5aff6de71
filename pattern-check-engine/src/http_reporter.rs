use async_trait::async_trait;
use pattern_check_core::config::PluginConfig;
use pattern_check_protocol::execution::Platform;
use pattern_check_protocol::step::StepUpdate;
use reqwest::header::AUTHORIZATION;
use tracing::debug;
use url::Url;

use crate::reporter::{ReporterError, StepReporter};

/// Header carrying the platform tag of the invocation.
pub const PLATFORM_HEADER: &str = "X-Platform";

/// Typed HTTP client that forwards step updates to the execution backend.
#[derive(Clone)]
pub struct HttpStepReporter {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpStepReporter {
    /// Creates a new reporter bound to the provided backend base URL.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ReporterError> {
        let mut url = Url::parse(base_url).map_err(|err| ReporterError::InvalidUrl {
            url: base_url.to_string(),
            source: err,
        })?;

        if !url.path().ends_with('/') {
            let mut path = url.path().trim_end_matches('/').to_string();
            path.push('/');
            url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: url,
            api_key,
        })
    }

    /// Builds the reporter from the plugin configuration.
    pub fn from_config(config: &PluginConfig) -> anyhow::Result<Self> {
        let base_url = config.require_backend_url()?;
        Ok(Self::new(base_url, config.api_key.clone())?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn step_url(&self, update: &StepUpdate) -> Result<Url, ReporterError> {
        let relative = format!(
            "api/v1/executions/{}/steps/{}",
            update.execution_id, update.step_id
        );
        self.base_url
            .join(&relative)
            .map_err(|err| ReporterError::InvalidUrl {
                url: format!("{}{}", self.base_url, relative),
                source: err,
            })
    }
}

#[async_trait]
impl StepReporter for HttpStepReporter {
    async fn report(&self, update: &StepUpdate, platform: &Platform) -> Result<(), ReporterError> {
        let url = self.step_url(update)?;

        let mut request = self
            .http
            .put(url)
            .header(PLATFORM_HEADER, platform.as_str())
            .json(update);
        if let Some(api_key) = &self.api_key {
            request = request.header(AUTHORIZATION, api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ReporterError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ReporterError::UnexpectedStatus {
                status: response.status(),
            });
        }

        debug!(
            execution_id = %update.execution_id,
            step_id = %update.step_id,
            status = ?update.status,
            "step update delivered"
        );
        Ok(())
    }
}
