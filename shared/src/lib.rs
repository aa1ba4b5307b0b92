// lib.rs - location map core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod event;
pub mod geo;
pub mod match_set;
pub mod model;
pub mod navigation;
pub mod search;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use catalog::{Catalog, CatalogError, CatalogResponse, Location, LocationId};
pub use config::{ConfigError, MapOptions, PortletConfig};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use geo::{distance_km, format_distance, CoordinateError, Coordinates};
pub use match_set::{Match, MatchSet};
pub use model::Model;
pub use navigation::{FooterTab, NavigationError, Screen, ScreenGroup};
pub use view::ViewModel;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Distance given to a match-set member without coordinates.
pub const UNMAPPABLE_DISTANCE: f64 = -1.0;
pub const HISTORY_LIMIT: usize = 3;
pub const SEARCH_CACHE_CAPACITY: usize = 32;
pub const DEFAULT_MAP_ZOOM: f64 = 12.0;
pub const SINGLE_MARKER_ZOOM: f64 = 17.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    DataLoad,
    NotFound,
    InvalidArgument,
    Configuration,
    Validation,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DataLoad => "DATA_LOAD_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::DataLoad => ErrorSeverity::Transient,
            Self::NotFound | Self::InvalidArgument | Self::Validation | Self::Configuration => {
                ErrorSeverity::Permanent
            }
            Self::Internal => ErrorSeverity::Fatal,
        }
    }

    /// Only a load can succeed on a second attempt; the user triggers it.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::DataLoad)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::DataLoad => {
                "Locations could not be loaded. Please try again later.".into()
            }
            ErrorKind::NotFound => "The requested location could not be found.".into(),
            ErrorKind::InvalidArgument | ErrorKind::Validation => self.message.clone(),
            ErrorKind::Configuration => {
                "The location map is not set up correctly. Please contact the site administrator."
                    .into()
            }
            ErrorKind::Internal => {
                "An unexpected error occurred. Please reload the page.".into()
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        Self::new(ErrorKind::Validation, e.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        Self::new(ErrorKind::DataLoad, "Location data is malformed")
            .with_internal(e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::new(ErrorKind::Configuration, e.to_string())
    }
}

impl From<NavigationError> for AppError {
    fn from(e: NavigationError) -> Self {
        Self::new(ErrorKind::InvalidArgument, e.to_string())
    }
}

impl From<catalog::InvalidLocationId> for AppError {
    fn from(e: catalog::InvalidLocationId) -> Self {
        Self::new(ErrorKind::InvalidArgument, e.to_string()).with_context("raw_id", e.0)
    }
}

/// Tells widget instances on the same page apart in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
