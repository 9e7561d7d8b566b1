use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::neighbor::HardwareAddress;

pub const DEFAULT_ENDPOINT: &str = "https://www.macvendorlookup.com/api/v2";

/// The block of hardware addresses a vendor record covers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressRange {
    pub start_hex: String,
    pub end_hex: String,
    pub start_dec: String,
    pub end_dec: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VendorRecord {
    #[serde(flatten)]
    pub range: AddressRange,
    pub company: String,
    #[serde(rename = "addressL1")]
    pub address_line1: String,
    #[serde(rename = "addressL2")]
    pub address_line2: String,
    #[serde(rename = "addressL3")]
    pub address_line3: String,
    pub country: String,
    #[serde(rename = "type")]
    pub record_type: String,
}

/// Resolves a hardware address to the vendor that registered it.
#[allow(async_fn_in_trait)]
pub trait VendorLookup {
    async fn lookup(&self, address: &HardwareAddress) -> Result<VendorRecord, LookupError>;
}

/// Client for the macvendorlookup.com v2 API.
pub struct MacVendorClient {
    http: reqwest::Client,
    endpoint: String,
}

impl MacVendorClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, address: &HardwareAddress) -> String {
        format!("{}/{}", self.endpoint, address)
    }
}

impl VendorLookup for MacVendorClient {
    async fn lookup(&self, address: &HardwareAddress) -> Result<VendorRecord, LookupError> {
        let url = self.url_for(address);
        log::debug!("GET {url}");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Err(LookupError::NotFound(address.to_string()));
        }
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        decode_vendor_response(address, &body)
    }
}

/// Decodes the service's JSON array and keeps its first record.
pub fn decode_vendor_response(
    address: &HardwareAddress,
    body: &str,
) -> Result<VendorRecord, LookupError> {
    if body.trim().is_empty() {
        return Err(LookupError::NotFound(address.to_string()));
    }
    let records: Vec<VendorRecord> = serde_json::from_str(body)?;
    records
        .into_iter()
        .next()
        .ok_or_else(|| LookupError::NotFound(address.to_string()))
}

/// Looks up every address in order, keeping failures alongside successes.
pub async fn lookup_all<L: VendorLookup>(
    lookup: &L,
    addresses: &[HardwareAddress],
) -> Vec<(HardwareAddress, Result<VendorRecord, LookupError>)> {
    let mut results = Vec::with_capacity(addresses.len());
    for address in addresses {
        let result = lookup.lookup(address).await;
        if let Err(e) = &result {
            log::warn!("vendor lookup for {address} failed: {e}");
        }
        results.push((address.clone(), result));
    }
    results
}
