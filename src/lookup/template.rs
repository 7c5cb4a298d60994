//! Request template captured from a browser session.
//!
//! The template fixes endpoint, headers and base form payload; only the
//! coordinate fields change from one lookup to the next.

use regex::Regex;
use url::form_urlencoded;
use url::Url;

use crate::error::{Result, SweepError};
use crate::models::SamplePoint;

const DEFAULT_LAT_FIELD: &str = "lat";
const DEFAULT_LON_FIELD: &str = "lng";

/// Endpoint, headers and form payload for facility lookups
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub lat_field: String,
    pub lon_field: String,
}

impl RequestTemplate {
    pub fn new(
        url: &str,
        headers: Vec<(String, String)>,
        form: Vec<(String, String)>,
    ) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| SweepError::Template(format!("invalid URL '{}': {}", url, e)))?;
        Ok(Self {
            url,
            headers,
            form,
            lat_field: DEFAULT_LAT_FIELD.to_string(),
            lon_field: DEFAULT_LON_FIELD.to_string(),
        })
    }

    /// Override the names of the coordinate form fields
    pub fn with_coordinate_fields(mut self, lat_field: &str, lon_field: &str) -> Self {
        self.lat_field = lat_field.to_string();
        self.lon_field = lon_field.to_string();
        self
    }

    /// Parse a "copy as cURL" command line.
    ///
    /// Reads the single-quoted URL, every `-H 'Name: value'` header and the
    /// `--data-raw`/`--data`/`-d` body, percent-decoding the form values.
    pub fn from_curl(command: &str) -> Result<Self> {
        let url_re = Regex::new(r"curl\s+'([^']*)'").map_err(regex_err)?;
        let header_re = Regex::new(r"(?:-H|--header)\s+'([^:']+):\s*([^']*)'").map_err(regex_err)?;
        let data_re = Regex::new(r"(?:--data-raw|--data|-d)\s+'([^']*)'").map_err(regex_err)?;

        let url = url_re
            .captures(command)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| SweepError::Template("URL not found in curl command".to_string()))?;

        let headers = header_re
            .captures_iter(command)
            .filter_map(|c| {
                let name = c.get(1)?.as_str().trim();
                let value = c.get(2)?.as_str();
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        let form = data_re
            .captures(command)
            .and_then(|c| c.get(1))
            .map(|m| {
                form_urlencoded::parse(m.as_str().as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        Self::new(url, headers, form)
    }

    /// Form payload for one point, with the coordinate fields overridden.
    ///
    /// Coordinate fields missing from the base payload are appended.
    pub fn form_for(&self, point: SamplePoint) -> Vec<(String, String)> {
        let mut form = self.form.clone();
        set_field(&mut form, &self.lat_field, point.lat.to_string());
        set_field(&mut form, &self.lon_field, point.lon.to_string());
        form
    }

    /// Encoded request body for one point
    pub fn body_for(&self, point: SamplePoint) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form_for(point))
            .finish()
    }
}

fn set_field(form: &mut Vec<(String, String)>, key: &str, value: String) {
    match form.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => form.push((key.to_string(), value)),
    }
}

fn regex_err(e: regex::Error) -> SweepError {
    SweepError::Template(e.to_string())
}
