//! Shipment tracking against the Delhivery packages API.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum CourierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("courier returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("no shipment found for waybill {0}")]
    NotFound(String),

    #[error("invalid courier base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<CourierError> for AppError {
    fn from(value: CourierError) -> Self {
        match value {
            CourierError::NotFound(_) => AppError::NotFound,
            other => AppError::Upstream(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ShipmentStatus {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "StatusDateTime")]
    pub status_date_time: Option<String>,
    #[serde(rename = "StatusLocation")]
    pub status_location: Option<String>,
    #[serde(rename = "Instructions")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScanDetail {
    #[serde(rename = "Scan")]
    pub scan: String,
    #[serde(rename = "ScanDateTime")]
    pub scan_date_time: Option<String>,
    #[serde(rename = "ScannedLocation")]
    pub scanned_location: Option<String>,
    #[serde(rename = "Instructions")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScanEnvelope {
    #[serde(rename = "ScanDetail")]
    scan_detail: ScanDetail,
}

#[derive(Debug, Clone, Deserialize)]
struct RawShipment {
    #[serde(rename = "AWB")]
    awb: Option<String>,
    #[serde(rename = "Status")]
    status: ShipmentStatus,
    #[serde(rename = "Scans", default)]
    scans: Vec<ScanEnvelope>,
}

#[derive(Debug, Deserialize)]
struct ShipmentEnvelope {
    #[serde(rename = "Shipment")]
    shipment: RawShipment,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    #[serde(rename = "ShipmentData", default)]
    shipment_data: Vec<ShipmentEnvelope>,
}

/// Current state of one shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    pub waybill: String,
    pub status: ShipmentStatus,
    pub scans: Vec<ScanDetail>,
}

#[derive(Clone)]
pub struct CourierClient {
    client: Client,
    api_token: SecretString,
    base_url: Url,
}

impl CourierClient {
    /// The base URL comes from configuration; tests point it at a mock server.
    pub fn with_base_url(
        api_token: SecretString,
        base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, CourierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| CourierError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            api_token,
            base_url,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn track(&self, waybill: &str) -> Result<Shipment, CourierError> {
        let mut url = self
            .base_url
            .join("api/v1/packages/json/")
            .map_err(|e| CourierError::InvalidBaseUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("waybill", waybill);

        let response = self
            .client
            .get(url)
            .header(
                header::AUTHORIZATION,
                format!("Token {}", self.api_token.expose_secret()),
            )
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::Status { status, body });
        }

        let parsed: TrackResponse = response.json().await?;
        let envelope = parsed
            .shipment_data
            .into_iter()
            .next()
            .ok_or_else(|| CourierError::NotFound(waybill.to_string()))?;

        let RawShipment { awb, status, scans } = envelope.shipment;
        Ok(Shipment {
            waybill: awb.unwrap_or_else(|| waybill.to_string()),
            status,
            scans: scans.into_iter().map(|s| s.scan_detail).collect(),
        })
    }
}
