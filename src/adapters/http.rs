use crate::domain::model::EnsembleOutput;
use crate::domain::ports::EnsembleDetector;
use crate::utils::error::{NutriError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    image_base64: &'a str,
    use_ensemble: bool,
}

/// 透過 HTTP 呼叫遠端的整合偵測服務
#[derive(Debug, Clone)]
pub struct HttpEnsembleDetector {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpEnsembleDetector {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EnsembleDetector for HttpEnsembleDetector {
    async fn detect(&self, image_base64: &str, use_ensemble: bool) -> Result<EnsembleOutput> {
        tracing::debug!(
            "POST {} (image {} bytes, use_ensemble={})",
            self.endpoint,
            image_base64.len(),
            use_ensemble
        );

        let mut request = self.client.post(&self.endpoint).json(&DetectRequest {
            image_base64,
            use_ensemble,
        });

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Detector response status: {}", status);

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("❌ Detector request failed with status {}", status);
            return Err(NutriError::DetectorError {
                status: status.as_u16(),
                message,
            });
        }

        let output: EnsembleOutput = response.json().await?;
        tracing::debug!(
            "Detector returned {} fused items and {} portions",
            output.fused.len(),
            output.portions.len()
        );
        Ok(output)
    }
}
