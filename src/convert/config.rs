use super::error::Error;
use serde::Deserialize;
use std::sync::OnceLock;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../../resources/default.settings.toml");

static DEFAULT_SETTINGS: OnceLock<RunSettings> = OnceLock::new();

/// Options controlling deck conversion.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Turn root cells with zero neutron importance into vacuum boundaries.
    pub vacuum_from_importance: bool,
    /// Replace general planes whose normal is a coordinate axis with the
    /// matching axis plane.
    pub reduce_axis_planes: bool,
    /// Make cells share one surface where several cards describe the same
    /// surface.
    pub merge_duplicate_surfaces: bool,
    pub settings: RunSettings,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            vacuum_from_importance: true,
            reduce_axis_planes: true,
            merge_duplicate_surfaces: false,
            settings: default_settings().clone(),
        }
    }
}

/// Run parameters written to the settings file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_batches")]
    pub batches: u32,
    #[serde(default = "default_inactive")]
    pub inactive: u32,
    #[serde(default = "default_particles")]
    pub particles: u64,
    #[serde(default = "default_summary")]
    pub summary: bool,
    /// Point source location; centred on the root geometry when absent.
    #[serde(default)]
    pub source: Option<[f64; 3]>,
}

fn default_batches() -> u32 {
    40
}
fn default_inactive() -> u32 {
    20
}
fn default_particles() -> u64 {
    100
}
fn default_summary() -> bool {
    true
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            batches: default_batches(),
            inactive: default_inactive(),
            particles: default_particles(),
            summary: default_summary(),
            source: None,
        }
    }
}

impl RunSettings {
    /// Parses settings from TOML; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let settings: RunSettings = toml::from_str(text)?;
        Ok(settings)
    }
}

pub fn load_settings(custom_toml: Option<&str>) -> Result<RunSettings, Error> {
    match custom_toml {
        Some(text) => RunSettings::from_toml_str(text),
        None => Ok(default_settings().clone()),
    }
}

pub fn default_settings() -> &'static RunSettings {
    DEFAULT_SETTINGS.get_or_init(|| {
        toml::from_str(DEFAULT_SETTINGS_TOML)
            .expect("Failed to parse embedded default settings. This is a library bug.")
    })
}
