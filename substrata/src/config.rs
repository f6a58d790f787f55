//! Persisted configuration (§4.P): a TOML file merged under CLI overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_port() -> u16 {
    7600
}
fn default_load_distance() -> f32 {
    500.0
}
fn default_max_num_concurrent_downloads() -> usize {
    10
}
fn default_num_download_workers() -> usize {
    4
}
fn default_num_upload_workers() -> usize {
    2
}
fn default_stale_ownership_threshold_s() -> f64 {
    20.0
}
fn default_ownership_renewal_period_s() -> f64 {
    10.0
}
fn default_script_proximity_radius_m() -> f64 {
    20.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstrataConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub world: Option<String>,
    #[serde(default = "default_load_distance")]
    pub load_distance: f32,
    #[serde(default = "default_max_num_concurrent_downloads")]
    pub max_num_concurrent_downloads: usize,
    #[serde(default = "default_num_download_workers")]
    pub num_download_workers: usize,
    #[serde(default = "default_num_upload_workers")]
    pub num_upload_workers: usize,
    #[serde(default)]
    pub app_data_dir: Option<PathBuf>,
    #[serde(default = "default_stale_ownership_threshold_s")]
    pub stale_ownership_threshold_s: f64,
    #[serde(default = "default_ownership_renewal_period_s")]
    pub ownership_renewal_period_s: f64,
    #[serde(default = "default_script_proximity_radius_m")]
    pub script_proximity_radius_m: f64,
}

impl SubstrataConfig {
    /// Reads and parses a TOML config file.
    pub fn load_from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// The directory substrata stores downloaded resources, screenshots,
    /// and lightmaps in, falling back to a platform-appropriate user-data
    /// path when unset.
    pub fn resolved_app_data_dir(&self) -> PathBuf {
        self.app_data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("substrata")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_in_defaults() {
        let cfg: SubstrataConfig = toml::from_str("host = \"sub.example.com\"").unwrap();
        assert_eq!(cfg.port, 7600);
        assert_eq!(cfg.load_distance, 500.0);
        assert_eq!(cfg.num_download_workers, 4);
        assert_eq!(cfg.num_upload_workers, 2);
        assert_eq!(cfg.stale_ownership_threshold_s, 20.0);
        assert_eq!(cfg.ownership_renewal_period_s, 10.0);
        assert_eq!(cfg.script_proximity_radius_m, 20.0);
    }

    #[test]
    fn app_data_dir_falls_back_when_unset() {
        let cfg: SubstrataConfig = toml::from_str("host = \"sub.example.com\"").unwrap();
        assert!(cfg.resolved_app_data_dir().ends_with("substrata"));
    }
}
