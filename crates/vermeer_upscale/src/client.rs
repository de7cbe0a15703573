//! HTTP client for the running enhancement server.

use crate::UpscaleConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use vermeer_error::{UpscaleError, UpscaleErrorKind};

/// Timeout for the lightweight liveness probe.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one enhancement request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpscaleOutcome {
    /// Whether the server reported success
    pub success: bool,
    /// Human-readable server message
    pub message: String,
    /// Enhanced image bytes, present on success
    pub image: Option<Vec<u8>>,
    /// Output width in pixels
    pub width: Option<u32>,
    /// Output height in pixels
    pub height: Option<u32>,
}

/// Client for interacting with the local enhancement server.
#[derive(Debug, Clone)]
pub struct UpscaleClient {
    base_url: String,
    request_timeout: Duration,
    enhance: crate::EnhanceDefaults,
    client: reqwest::Client,
}

impl UpscaleClient {
    /// Create a new client for the configured server address.
    pub fn new(config: &UpscaleConfig) -> Self {
        Self {
            base_url: config.base_url(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            enhance: config.enhance.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Check if the server is running and has finished loading.
    ///
    /// The server reports `"starting"` while its models load; only
    /// `"healthy"` counts as ready.
    #[instrument(skip(self))]
    pub async fn is_healthy(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        let response = match self
            .client
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Health probe failed: {}", e);
                return false;
            }
        };
        if !response.status().is_success() {
            debug!("Health probe returned status: {}", response.status());
            return false;
        }
        match response.json::<HealthDto>().await {
            Ok(health) => health.status == "healthy",
            Err(e) => {
                debug!("Health payload unreadable: {}", e);
                false
            }
        }
    }

    /// Send one enhancement request.
    ///
    /// The caller is responsible for serialization; the server handles one
    /// request at a time.
    #[instrument(skip(self, image), fields(bytes = image.len(), resolution))]
    pub async fn upscale(
        &self,
        image: &[u8],
        resolution: Option<u32>,
    ) -> Result<UpscaleOutcome, UpscaleError> {
        let url = format!("{}/upscale", self.base_url);
        let request = UpscaleRequestDto {
            name: String::new(),
            resolution: resolution.unwrap_or(self.enhance.resolution),
            max_resolution: self.enhance.max_resolution,
            seed: self.enhance.seed,
            color_correction: self.enhance.color_correction.clone(),
            input_noise_scale: self.enhance.input_noise_scale,
            latent_noise_scale: self.enhance.latent_noise_scale,
            image_base64: BASE64.encode(image),
        };

        debug!("Sending enhancement request to {}", url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| {
                UpscaleError::new(UpscaleErrorKind::Http(format!("Request failed: {}", e)))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(UpscaleError::new(UpscaleErrorKind::Api(format!(
                "Server returned {}: {}",
                status, detail
            ))));
        }

        let dto: UpscaleResponseDto = response.json().await.map_err(|e| {
            UpscaleError::new(UpscaleErrorKind::Decode(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        let image = match dto.image_base64 {
            Some(encoded) => Some(BASE64.decode(encoded.as_bytes()).map_err(|e| {
                UpscaleError::new(UpscaleErrorKind::Decode(format!(
                    "Image payload is not valid base64: {}",
                    e
                )))
            })?),
            None => None,
        };

        Ok(UpscaleOutcome {
            success: dto.success,
            message: dto.message,
            image,
            width: dto.width,
            height: dto.height,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HealthDto {
    status: String,
}

#[derive(Debug, Serialize)]
struct UpscaleRequestDto {
    name: String,
    resolution: u32,
    max_resolution: u32,
    seed: u32,
    color_correction: String,
    input_noise_scale: f64,
    latent_noise_scale: f64,
    image_base64: String,
}

#[derive(Debug, Deserialize)]
struct UpscaleResponseDto {
    success: bool,
    message: String,
    image_base64: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}
