use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Runtime settings of the report service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the TTF files of `font_family`.
    pub fonts_dir: PathBuf,
    pub font_family: String,
    /// Upper bound for the sum of all uploaded parts of one request.
    pub max_upload_bytes: usize,
    /// How many authors the per-source ranking slides keep.
    pub top_authors: usize,
    pub deck_title: String,
    /// Pixel size of the chart rasters embedded in the deck.
    pub chart_width_px: u32,
    pub chart_height_px: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            fonts_dir: PathBuf::from("./fonts"),
            font_family: "DejaVuSans".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
            top_authors: 10,
            deck_title: "Media Monitoring Report".to_string(),
            chart_width_px: 960,
            chart_height_px: 540,
        }
    }
}

/// Loads `.env` (if any) and reads the configuration from the environment.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Builds the configuration from an arbitrary lookup so tests never touch the
/// process environment. Unset variables fall back to [`AppConfig::default`].
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = AppConfig::default();

    let port = parse_var(&lookup, "REPORT_PORT", defaults.port)?;
    let max_upload_bytes = parse_var(&lookup, "REPORT_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?;
    if max_upload_bytes == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "REPORT_MAX_UPLOAD_BYTES".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let chart_width_px = parse_var(&lookup, "REPORT_CHART_WIDTH", defaults.chart_width_px)?;
    let chart_height_px = parse_var(&lookup, "REPORT_CHART_HEIGHT", defaults.chart_height_px)?;
    if chart_width_px < MIN_CHART_WIDTH_PX || chart_height_px < MIN_CHART_HEIGHT_PX {
        return Err(ConfigError::InvalidEnvVar {
            var: "REPORT_CHART_WIDTH/REPORT_CHART_HEIGHT".to_string(),
            reason: format!(
                "charts need at least {}x{} pixels",
                MIN_CHART_WIDTH_PX, MIN_CHART_HEIGHT_PX
            ),
        });
    }

    Ok(AppConfig {
        host: lookup("REPORT_HOST").unwrap_or(defaults.host),
        port,
        fonts_dir: lookup("REPORT_FONTS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.fonts_dir),
        font_family: lookup("REPORT_FONT_FAMILY").unwrap_or(defaults.font_family),
        max_upload_bytes,
        top_authors: parse_var(&lookup, "REPORT_TOP_AUTHORS", defaults.top_authors)?,
        deck_title: lookup("REPORT_DECK_TITLE").unwrap_or(defaults.deck_title),
        chart_width_px,
        chart_height_px,
    })
}

const MIN_CHART_WIDTH_PX: u32 = 320;
const MIN_CHART_HEIGHT_PX: u32 = 180;

fn parse_var<T, F>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    match lookup(var) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
