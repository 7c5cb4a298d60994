//! Flattening of lookup payloads into facility records.

use serde_json::Value;
use tracing::warn;

use crate::error::LookupError;
use crate::models::{FacilityRecord, SamplePoint};

const ID_KEY: &str = "id";
const NAME_KEY: &str = "tesis_adi";
const PROVINCE_KEY: &str = "il_adi";
const STREET_KEY: &str = "sokak_adi";
const DISTRICT_KEY: &str = "ilce_adi";
const NEIGHBORHOOD_KEY: &str = "mahalle_adi";

/// Records found in one payload, each with its index in the `features` array
#[derive(Debug, Default)]
pub struct Extracted {
    pub records: Vec<(usize, FacilityRecord)>,
    /// Features skipped for lacking properties or an id
    pub malformed: usize,
}

/// Extract facility records from one lookup payload.
///
/// A payload without a `features` array is malformed as a whole; a single
/// feature without an id is skipped and counted.
pub fn extract_records(point: SamplePoint, payload: &Value) -> Result<Extracted, LookupError> {
    let features = payload
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            LookupError::MalformedPayload(format!("no 'features' array in {}", fragment(payload)))
        })?;

    let mut extracted = Extracted::default();

    for (index, feature) in features.iter().enumerate() {
        let properties = match feature.get("properties").and_then(Value::as_object) {
            Some(p) => p,
            None => {
                warn!("Feature without properties: {}", fragment(feature));
                extracted.malformed += 1;
                continue;
            }
        };

        let id = match properties.get(ID_KEY).and_then(identifier) {
            Some(id) => id,
            None => {
                warn!("Feature without usable id: {}", fragment(feature));
                extracted.malformed += 1;
                continue;
            }
        };

        let field = |key: &str| properties.get(key).map(text).unwrap_or_default();

        extracted.records.push((
            index,
            FacilityRecord {
                name: field(NAME_KEY),
                province: field(PROVINCE_KEY),
                street: field(STREET_KEY),
                district: field(DISTRICT_KEY),
                neighborhood: field(NEIGHBORHOOD_KEY),
                lon: point.lon,
                lat: point.lat,
                id,
            },
        ));
    }

    Ok(extracted)
}

fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Short excerpt of a JSON value for log lines
fn fragment(value: &Value) -> String {
    let mut s = value.to_string();
    if s.chars().count() > 200 {
        s = s.chars().take(200).collect::<String>() + "...";
    }
    s
}
