//! Record type and its JSON codec
//!
//! A [`Record`] is one parking facility entry. Six of its fields drive
//! indexing (see [`crate::keys`]); the rest ride along untouched. Field
//! names on the wire match the upstream open-data export exactly, so the
//! serialized payload stays interoperable with anything else reading the
//! same key space.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single stored record
///
/// Every field defaults when absent from the input, matching how upstream
/// exports occasionally omit the `_en` mirror fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// Unique across all records; indexed under `global_id:`
    #[serde(rename = "global_id")]
    pub global_id: i64,
    /// Primary key; the full record is stored under this exact string
    #[serde(rename = "system_object_id")]
    pub system_object_id: String,
    /// Unique across all records; indexed under `id:`
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "AdmArea")]
    pub adm_area: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Longitude_WGS84")]
    pub longitude_wgs84: String,
    #[serde(rename = "Latitude_WGS84")]
    pub latitude_wgs84: String,
    #[serde(rename = "CarCapacity")]
    pub car_capacity: i64,
    /// Shared by many records; list-indexed under `mode:`
    #[serde(rename = "Mode")]
    pub mode: String,
    /// Unique across all records; indexed under `id_en:`
    #[serde(rename = "ID_en")]
    pub id_en: i64,
    #[serde(rename = "Name_en")]
    pub name_en: String,
    #[serde(rename = "AdmArea_en")]
    pub adm_area_en: String,
    #[serde(rename = "District_en")]
    pub district_en: String,
    #[serde(rename = "Address_en")]
    pub address_en: String,
    #[serde(rename = "Longitude_WGS84_en")]
    pub longitude_wgs84_en: String,
    #[serde(rename = "Latitude_WGS84_en")]
    pub latitude_wgs84_en: String,
    #[serde(rename = "CarCapacity_en")]
    pub car_capacity_en: i64,
    /// Shared by many records; list-indexed under `mode_en:`
    #[serde(rename = "Mode_en")]
    pub mode_en: String,
}

impl Record {
    /// The primary key this record is stored under
    pub fn primary_key(&self) -> &str {
        &self.system_object_id
    }
}

/// Serialize a record to its stored payload
pub fn encode(record: &Record) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

/// Deserialize a stored payload back into a record
pub fn decode(bytes: &[u8]) -> Result<Record> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Deserialize an upload: a JSON array of records
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Record>> {
    Ok(serde_json::from_slice(bytes)?)
}
