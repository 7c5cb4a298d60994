use anyhow::{bail, Context, Result};
use gridsweep::lookup::RequestTemplate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub global: GlobalConfig,
    pub request: RequestConfig,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalConfig {
    pub boundary_file: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_spacing")]
    pub spacing_meters: f64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Timeout of a single HTTP attempt
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Deadline for one point including retries; defaults to the retry budget
    pub lookup_timeout_secs: Option<u64>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

/// Either a captured curl command or explicit url/headers/form tables
#[derive(Debug, Deserialize, Clone)]
pub struct RequestConfig {
    pub curl_file: Option<PathBuf>,
    pub url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub form: BTreeMap<String, String>,
    #[serde(default = "default_lat_field")]
    pub lat_field: String,
    #[serde(default = "default_lng_field")]
    pub lng_field: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegionConfig {
    pub name: String,
    pub spacing_meters: Option<f64>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}
fn default_spacing() -> f64 {
    100.0
}
fn default_concurrency() -> usize {
    1
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_preview_rows() -> usize {
    10
}
fn default_lat_field() -> String {
    "lat".to_string()
}
fn default_lng_field() -> String {
    "lng".to_string()
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        Ok(config)
    }
}

impl RequestConfig {
    /// Build the request template; a curl file takes precedence over `url`
    pub fn to_template(&self) -> Result<RequestTemplate> {
        let template = if let Some(path) = &self.curl_file {
            let command = fs::read_to_string(path)
                .with_context(|| format!("Failed to read curl file {}", path.display()))?;
            RequestTemplate::from_curl(&command)?
        } else if let Some(url) = &self.url {
            RequestTemplate::new(
                url,
                self.headers
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                self.form
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )?
        } else {
            bail!("[request] needs either curl_file or url");
        };

        Ok(template.with_coordinate_fields(&self.lat_field, &self.lng_field))
    }
}
