//! Rendering options
//!
//! Options arrive as JSON from the calling application. Every field has a
//! default so a partial object (or `{}`) is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RendererError, RendererResult};
use crate::types::{page_size, Orientation, PageFormat, Size};

/// Per-image upper bound on fetched or read bytes.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_VERIFICATION_BASE_URL: &str = "https://verify.schoolbulletin.app/verify";

/// Label language. `Primary` is French, `Secondary` is English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Primary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    pub include_comments: bool,
    pub include_rankings: bool,
    pub include_statistics: bool,
    pub include_performance_levels: bool,
    #[serde(rename = "includeQRCode")]
    pub include_qr_code: bool,
    pub include_signatures: bool,
    /// Pixel size of the rendered scannable code.
    #[serde(rename = "qrCodeSize")]
    pub qr_code_size: u32,
    pub logo_max_width: f64,
    pub logo_max_height: f64,
    pub photo_max_width: f64,
    pub photo_max_height: f64,
    pub language: Language,
    pub page_format: PageFormat,
    pub orientation: Orientation,
    pub verification_base_url: String,
    pub fetch_timeout_secs: u64,
    pub max_image_bytes: u64,
    pub user_agent: String,
    pub font_regular_path: Option<String>,
    pub font_bold_path: Option<String>,
    /// Use synthesized discipline/effort/remark content when the record has none.
    pub placeholder_content: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_comments: true,
            include_rankings: true,
            include_statistics: false,
            include_performance_levels: false,
            include_qr_code: true,
            include_signatures: true,
            qr_code_size: 120,
            logo_max_width: 60.0,
            logo_max_height: 60.0,
            photo_max_width: 70.0,
            photo_max_height: 85.0,
            language: Language::Primary,
            page_format: PageFormat::A4,
            orientation: Orientation::Portrait,
            verification_base_url: DEFAULT_VERIFICATION_BASE_URL.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            user_agent: concat!("school-pdf-renderer/", env!("CARGO_PKG_VERSION")).to_string(),
            font_regular_path: None,
            font_bold_path: None,
            placeholder_content: false,
        }
    }
}

impl RenderOptions {
    /// Parse options from JSON, applying defaults for missing fields.
    pub fn from_json(json: &str) -> RendererResult<Self> {
        let options: RenderOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Defaults suited to the weekly timetable (landscape, no per-row extras).
    pub fn timetable_defaults() -> Self {
        Self {
            orientation: Orientation::Landscape,
            include_comments: false,
            include_rankings: false,
            include_signatures: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> RendererResult<()> {
        if !(40..=400).contains(&self.qr_code_size) {
            return Err(RendererError::InvalidValue(
                "qrCodeSize".to_string(),
                format!("{} is outside 40..=400", self.qr_code_size),
            ));
        }
        for (name, value) in [
            ("logoMaxWidth", self.logo_max_width),
            ("logoMaxHeight", self.logo_max_height),
            ("photoMaxWidth", self.photo_max_width),
            ("photoMaxHeight", self.photo_max_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RendererError::InvalidValue(
                    name.to_string(),
                    format!("expected a positive size, got {}", value),
                ));
            }
        }
        if self.fetch_timeout_secs == 0 {
            return Err(RendererError::InvalidValue(
                "fetchTimeoutSecs".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if self.verification_base_url.trim().is_empty() {
            return Err(RendererError::MissingField("verificationBaseUrl".to_string()));
        }
        Ok(())
    }

    pub fn page_size(&self) -> Size {
        page_size(self.page_format, self.orientation)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let options = RenderOptions::from_json("{}").unwrap();
        assert_eq!(options, RenderOptions::default());
        assert_eq!(options.max_image_bytes, 5 * 1024 * 1024);
        assert_eq!(options.fetch_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_camel_case_flags() {
        let options = RenderOptions::from_json(
            r#"{"includeQRCode": false, "qrCodeSize": 90, "language": "secondary",
                "pageFormat": "letter", "orientation": "landscape", "includeRankings": false}"#,
        )
        .unwrap();
        assert!(!options.include_qr_code);
        assert!(!options.include_rankings);
        assert_eq!(options.qr_code_size, 90);
        assert_eq!(options.language, Language::Secondary);
        assert_eq!(options.page_size(), Size::new(792.0, 612.0));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(RenderOptions::from_json(r#"{"qrCodeSize": 5}"#).is_err());
        assert!(RenderOptions::from_json(r#"{"photoMaxWidth": 0}"#).is_err());
        assert!(RenderOptions::from_json(r#"{"verificationBaseUrl": " "}"#).is_err());
    }
}
