use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{DEFAULT_MAP_ZOOM, MAX_ZOOM, MIN_ZOOM, SINGLE_MARKER_ZOOM};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("data url {url:?} is invalid: {reason}")]
    InvalidDataUrl { url: String, reason: String },
    #[error("data url scheme {0:?} is not supported, expected http or https")]
    UnsupportedScheme(String),
    #[error("{field} {value} is outside [{MIN_ZOOM}, {MAX_ZOOM}]")]
    InvalidZoom { field: &'static str, value: f64 },
}

/// Passed along with every draw so the shell needs no settings of its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapOptions {
    pub zoom: f64,
    /// Used instead of fitting bounds when exactly one marker is drawn.
    pub single_marker_zoom: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_MAP_ZOOM,
            single_marker_zoom: SINGLE_MARKER_ZOOM,
        }
    }
}

impl MapOptions {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("zoom", self.zoom),
            ("single_marker_zoom", self.single_marker_zoom),
        ] {
            if !value.is_finite() || !(MIN_ZOOM..=MAX_ZOOM).contains(&value) {
                return Err(ConfigError::InvalidZoom { field, value });
            }
        }
        Ok(())
    }
}

/// Host-supplied settings for one widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortletConfig {
    pub data_url: String,
    #[serde(default)]
    pub map_options: MapOptions,
}

impl PortletConfig {
    #[must_use]
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
            map_options: MapOptions::default(),
        }
    }

    /// Check the settings and return the parsed data url.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.data_url.trim()).map_err(|e| ConfigError::InvalidDataUrl {
            url: self.data_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
        }
        self.map_options.validate()?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_url() {
        let config = PortletConfig::new("https://example.com/locations.json");
        let url = config.validate().unwrap();
        assert_eq!(url.path(), "/locations.json");
    }

    #[test]
    fn rejects_relative_url() {
        let config = PortletConfig::new("/locations.json");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDataUrl { .. })
        ));
    }

    #[test]
    fn rejects_other_schemes() {
        let config = PortletConfig::new("file:///tmp/locations.json");
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnsupportedScheme("file".into()))
        );
    }

    #[test]
    fn rejects_zoom_out_of_range() {
        let mut config = PortletConfig::new("http://localhost/data");
        config.map_options.single_marker_zoom = 40.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidZoom {
                field: "single_marker_zoom",
                ..
            })
        ));
    }

    #[test]
    fn map_options_default_when_absent() {
        let config: PortletConfig =
            serde_json::from_str(r#"{"dataUrl":"https://example.com/data"}"#).unwrap();
        assert_eq!(config.map_options, MapOptions::default());

        let config: PortletConfig = serde_json::from_str(
            r#"{"dataUrl":"https://example.com/data","mapOptions":{"zoom":9}}"#,
        )
        .unwrap();
        assert_eq!(config.map_options.zoom, 9.0);
        assert_eq!(config.map_options.single_marker_zoom, SINGLE_MARKER_ZOOM);
    }
}
