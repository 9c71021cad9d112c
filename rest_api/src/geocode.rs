// rest_api/src/geocode.rs
//
// Host-address lookup against a Nominatim-style endpoint. The upstream
// usage policy caps request rate, so outbound calls keep a minimum
// spacing: a last-call timestamp guarded by an async mutex, not a queue.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Extension, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use models::{DomainError, DomainResult, Role};
use security::AuthContext;

use crate::envelope;
use crate::error::ApiResult;
use crate::AppState;

const MIN_SPACING: Duration = Duration::from_millis(1100);

pub struct GeocodeClient {
    http: reqwest::Client,
    base_url: String,
    last_call: Mutex<Option<Instant>>,
}

impl GeocodeClient {
    pub fn new(base_url: String) -> Arc<Self> {
        Arc::new(GeocodeClient {
            http: reqwest::Client::new(),
            base_url,
            last_call: Mutex::new(None),
        })
    }

    async fn throttle(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < MIN_SPACING {
                tokio::time::sleep(MIN_SPACING - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn lookup(&self, address: &str) -> DomainResult<Value> {
        self.throttle().await;
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, "language-limousine")
            .send()
            .await
            .map_err(|e| DomainError::Internal(format!("geocode request failed: {}", e)))?;
        response
            .json::<Value>()
            .await
            .map_err(|e| DomainError::Internal(format!("geocode response unreadable: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub address: String,
}

pub async fn lookup_handler(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<GeocodeQuery>,
) -> ApiResult<Json<Value>> {
    security::require_role(&ctx, &[Role::Admin])?;
    if query.address.trim().is_empty() {
        return Err(DomainError::invalid_field("address", "address is required").into());
    }
    let result = state.geocoder.lookup(&query.address).await?;
    Ok(envelope::ok(result))
}
