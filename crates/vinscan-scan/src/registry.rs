// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vehicle registry client speaking the vPIC `DecodeVinValues` JSON format.
//
// The first element of `Results` supplies Make, Model and ModelYear. HTTPS
// goes through reqwest with rustls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use vinscan_bridge::traits::VehicleRegistry;
use vinscan_core::error::{Result, VinScanError};
use vinscan_core::types::RegistryRecord;
use vinscan_core::vin::Vin;

/// Timeout for establishing the connection. The whole lookup is bounded by
/// the validator's lookup timeout.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// `DecodeVinValues` response body. Only the fields we read.
#[derive(Debug, Deserialize)]
struct DecodeVinValues {
    #[serde(rename = "Results", default)]
    results: Vec<VpicResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VpicResult {
    make: Option<String>,
    model: Option<String>,
    model_year: Option<String>,
}

impl DecodeVinValues {
    /// Blank fields are dropped; a record with nothing usable is `None`.
    fn into_record(self) -> Option<RegistryRecord> {
        let first = self.results.into_iter().next()?;
        let text = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let record = RegistryRecord {
            make: text(first.make),
            model: text(first.model),
            year: text(first.model_year).and_then(|y| y.parse().ok()),
        };
        record.is_usable().then_some(record)
    }
}

/// `VehicleRegistry` over a vPIC-compatible HTTP(S) service.
#[derive(Debug, Clone)]
pub struct HttpVehicleRegistry {
    client: reqwest::Client,
    /// Scheme and authority, e.g. `https://vpic.nhtsa.dot.gov`.
    base_url: String,
    /// Request path with a `{vin}` placeholder.
    path_template: String,
}

impl HttpVehicleRegistry {
    pub fn new(base_url: impl Into<String>, path_template: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("vinscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VinScanError::Registry(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            path_template: path_template.into(),
        })
    }

    fn url_for(&self, vin: &Vin) -> String {
        let path = self.path_template.replace("{vin}", vin.as_str());
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[async_trait]
impl VehicleRegistry for HttpVehicleRegistry {
    #[instrument(skip(self), fields(base_url = %self.base_url, vin = %vin))]
    async fn decode(&self, vin: &Vin) -> Result<Option<RegistryRecord>> {
        let url = self.url_for(vin);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| VinScanError::Registry(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        debug!(status = status.as_u16(), "registry responded");
        if !status.is_success() {
            return Err(VinScanError::Registry(format!(
                "registry returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: DecodeVinValues = response
            .json()
            .await
            .map_err(|e| VinScanError::Registry(format!("invalid registry JSON: {e}")))?;
        let record = body.into_record();
        match &record {
            Some(r) => info!(make = ?r.make, model = ?r.model, year = ?r.year, "registry decoded VIN"),
            None => info!("registry has no data for VIN"),
        }
        Ok(record)
    }
}

/// Read Make, Model and ModelYear from a `DecodeVinValues` body.
pub fn parse_vpic_response(body: &[u8]) -> Result<Option<RegistryRecord>> {
    let parsed: DecodeVinValues = serde_json::from_slice(body)
        .map_err(|e| VinScanError::Registry(format!("invalid registry JSON: {e}")))?;
    Ok(parsed.into_record())
}
