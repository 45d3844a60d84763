use std::{collections::HashMap, fs};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://api.escuelajs.co/api/v1";
const SETTINGS_FILE: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub uniqueness_batch: usize,
    pub max_image_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            page_size: 10,
            request_timeout_secs: 15,
            uniqueness_batch: 100,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

/// Applies a flat `key = "value"` table. Unparseable files are ignored.
pub fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };

    if let Some(v) = file_cfg.get("api_base_url") {
        settings.api_base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("page_size") {
        set_parsed(&mut settings.page_size, v);
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        set_parsed(&mut settings.request_timeout_secs, v);
    }
    if let Some(v) = file_cfg.get("uniqueness_batch") {
        set_parsed(&mut settings.uniqueness_batch, v);
    }
    if let Some(v) = file_cfg.get("max_image_bytes") {
        set_parsed(&mut settings.max_image_bytes, v);
    }
    clamp(settings);
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CATALOG_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__PAGE_SIZE") {
        set_parsed(&mut settings.page_size, &v);
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        set_parsed(&mut settings.request_timeout_secs, &v);
    }
    if let Some(v) = lookup("APP__UNIQUENESS_BATCH") {
        set_parsed(&mut settings.uniqueness_batch, &v);
    }
    if let Some(v) = lookup("APP__MAX_IMAGE_BYTES") {
        set_parsed(&mut settings.max_image_bytes, &v);
    }
    clamp(settings);
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, raw: &str) {
    if let Ok(parsed) = raw.trim().parse::<T>() {
        *slot = parsed;
    }
}

fn clamp(settings: &mut Settings) {
    settings.page_size = settings.page_size.max(1);
    settings.uniqueness_batch = settings.uniqueness_batch.max(1);
}

/// Validates the API root and strips any trailing slash so that endpoint
/// paths can be appended with `format!`.
pub fn normalize_api_base_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_API_BASE_URL.to_string());
    }

    let url = Url::parse(raw).with_context(|| format!("invalid API base url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported API base url scheme '{}'", url.scheme());
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
