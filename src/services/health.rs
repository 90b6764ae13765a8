// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the platform health service.
//!
//! The health service is the authoritative "steps since midnight"
//! counter that keeps accumulating while the app process is dead. The
//! step adapter reads it for reconciliation and for the
//! health-integration display source.
//!
//! Every call has a bounded timeout; callers treat failures as "no
//! update this cycle", never as fatal.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;
use crate::time_utils::date_key;

/// Health service client.
#[derive(Clone)]
pub struct HealthClient {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Http {
        http: reqwest::Client,
        base_url: String,
        api_token: String,
    },
    /// Offline backend for tests: per-user canned readings. A user with
    /// no reading behaves like an unavailable service.
    Mock { readings: Arc<DashMap<String, u64>> },
}

/// Daily steps response from the health service.
#[derive(Debug, Clone, Deserialize)]
struct DailyStepsResponse {
    steps: u64,
}

impl HealthClient {
    /// Create a new client with the configured base URL and timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.health_timeout_secs))
            .build()
            .map_err(|e| AppError::HealthApi(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            backend: Backend::Http {
                http,
                base_url: config.health_api_base_url.trim_end_matches('/').to_string(),
                api_token: config.health_api_token.clone(),
            },
        })
    }

    /// Create a mock client for testing (offline mode).
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Mock {
                readings: Arc::new(DashMap::new()),
            },
        }
    }

    /// Set the canned reading for a user (mock backend only).
    pub fn set_mock_reading(&self, user_id: &str, steps: u64) {
        if let Backend::Mock { readings } = &self.backend {
            readings.insert(user_id.to_string(), steps);
        }
    }

    /// Remove a user's canned reading so calls fail (mock backend only).
    pub fn clear_mock_reading(&self, user_id: &str) {
        if let Backend::Mock { readings } = &self.backend {
            readings.remove(user_id);
        }
    }

    /// Point-in-time "steps since midnight" for a user and calendar day.
    pub async fn steps_since_midnight(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<u64, AppError> {
        match &self.backend {
            Backend::Mock { readings } => readings
                .get(user_id)
                .map(|entry| *entry.value())
                .ok_or_else(|| AppError::HealthApi("no mock reading".to_string())),
            Backend::Http {
                http,
                base_url,
                api_token,
            } => {
                let url = format!("{}/v1/users/{}/steps/daily", base_url, user_id);

                let response = http
                    .get(&url)
                    .bearer_auth(api_token)
                    .query(&[("date", date_key(date))])
                    .send()
                    .await
                    .map_err(|e| {
                        if e.is_timeout() {
                            AppError::HealthApi(AppError::HEALTH_TIMEOUT.to_string())
                        } else {
                            AppError::HealthApi(e.to_string())
                        }
                    })?;

                let parsed: DailyStepsResponse = Self::check_response_json(response).await?;
                Ok(parsed.steps)
            }
        }
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::HealthApi(
                    AppError::HEALTH_TOKEN_ERROR.to_string(),
                ));
            }

            if status.as_u16() == 429 {
                tracing::warn!("Health service rate limit hit (429)");
            }

            return Err(AppError::HealthApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::HealthApi(format!("JSON parse error: {}", e)))
    }
}
