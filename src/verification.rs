//! Verification code, content hash, verification URL and QR rendering
//!
//! The short code is random and only identifies the document for humans and
//! for the URL. The hash is derived from the document's identifying fields
//! so the server can detect a tampered copy; it is never put in the URL.

use std::io::Cursor;

use image::{GrayImage, Luma};
use log::warn;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{RendererError, RendererResult};

pub const CODE_LENGTH: usize = 8;
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Bytes of a v4 uuid that carry the version and variant bits.
const UUID_FIXED_BYTES: [usize; 2] = [6, 8];

/// Random code of `CODE_LENGTH` characters from `CODE_ALPHABET`.
pub fn generate_code() -> String {
    // Largest multiple of 36 below 256; higher bytes are rejected to keep
    // the distribution uniform.
    const LIMIT: u8 = 252;
    let mut code = String::with_capacity(CODE_LENGTH);
    while code.len() < CODE_LENGTH {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        for (i, byte) in bytes.into_iter().enumerate() {
            if UUID_FIXED_BYTES.contains(&i) || byte >= LIMIT || code.len() == CODE_LENGTH {
                continue;
            }
            code.push(CODE_ALPHABET[(byte % 36) as usize] as char);
        }
    }
    code
}

pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

/// Fields a verification hash is bound to, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationKey {
    pub entity_id: u64,
    pub organization_id: u64,
    pub period_id: String,
    pub academic_year_id: String,
    /// Aggregate formatted with two decimals, e.g. "15.30".
    pub aggregate_score: String,
}

impl VerificationKey {
    pub fn new(
        entity_id: u64,
        organization_id: u64,
        period_id: &str,
        academic_year_id: &str,
        aggregate: f64,
    ) -> Self {
        Self {
            entity_id,
            organization_id,
            period_id: period_id.trim().to_string(),
            academic_year_id: academic_year_id.trim().to_string(),
            aggregate_score: format!("{:.2}", aggregate),
        }
    }

    pub fn canonical(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.entity_id,
            self.organization_id,
            self.period_id,
            self.academic_year_id,
            self.aggregate_score
        )
    }

    /// Lowercase hex SHA-256 of the canonical form.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical().as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }
}

pub fn verification_url(base_url: &str, code: &str) -> String {
    format!("{}?code={}", base_url.trim().trim_end_matches('?'), code)
}

/// Render `payload` as a two-tone QR code of `size_px` square pixels.
pub fn render_scannable(payload: &str, size_px: u32) -> RendererResult<GrayImage> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| RendererError::Verification(format!("QR encoding failed: {}", e)))?;
    Ok(code
        .render::<Luma<u8>>()
        .dark_color(Luma([0u8]))
        .light_color(Luma([255u8]))
        .quiet_zone(true)
        .min_dimensions(size_px, size_px)
        .max_dimensions(size_px, size_px)
        .build())
}

pub fn encode_png(image: &GrayImage) -> RendererResult<Vec<u8>> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageLuma8(image.clone())
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .map_err(|e| RendererError::Verification(format!("PNG encoding failed: {}", e)))?;
    Ok(buf)
}

/// What the caller persists for later verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMetadata {
    pub code: String,
    pub hash: String,
    pub url: String,
}

/// Created once per generated document and never modified.
#[derive(Debug, Clone)]
pub struct VerificationRecord {
    pub code: String,
    pub hash: String,
    pub url: String,
    /// Decoded QR raster for the footer; `None` when rendering failed.
    pub scannable: Option<GrayImage>,
    /// PNG encoding of `scannable`.
    pub scannable_png: Option<Vec<u8>>,
}

impl VerificationRecord {
    pub fn metadata(&self) -> VerificationMetadata {
        VerificationMetadata {
            code: self.code.clone(),
            hash: self.hash.clone(),
            url: self.url.clone(),
        }
    }
}

/// Build the verification record. A QR failure only drops the raster.
pub fn build_verification(key: &VerificationKey, base_url: &str, qr_size: Option<u32>) -> VerificationRecord {
    let code = generate_code();
    let url = verification_url(base_url, &code);

    let scannable = qr_size.and_then(|size| match render_scannable(&url, size) {
        Ok(image) => Some(image),
        Err(err) => {
            warn!("verification code {} will be printed without QR: {}", code, err);
            None
        }
    });
    let scannable_png = scannable.as_ref().and_then(|image| match encode_png(image) {
        Ok(png) => Some(png),
        Err(err) => {
            warn!("could not encode QR for {}: {}", code, err);
            None
        }
    });

    VerificationRecord {
        hash: key.hash(),
        code,
        url,
        scannable,
        scannable_png,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(avg: &str) -> VerificationKey {
        VerificationKey {
            entity_id: 1,
            organization_id: 1,
            period_id: "T1".to_string(),
            academic_year_id: "2024-2025".to_string(),
            aggregate_score: avg.to_string(),
        }
    }

    #[test]
    fn test_hash_is_deterministic_and_sensitive() {
        let a = key("15.30").hash();
        assert_eq!(a, key("15.30").hash());
        assert_eq!(a.len(), 64);
        assert_ne!(a, key("15.31").hash());

        let mut other = key("15.30");
        other.period_id = "T2".to_string();
        assert_ne!(a, other.hash());
    }

    #[test]
    fn test_key_formats_aggregate() {
        let k = VerificationKey::new(1, 1, " T1 ", "2024-2025", 15.3);
        assert_eq!(k, key("15.30"));
        assert_eq!(k.canonical(), "1|1|T1|2024-2025|15.30");
    }

    #[test]
    fn test_code_shape() {
        for _ in 0..50 {
            let code = generate_code();
            assert!(is_valid_code(&code), "{}", code);
        }
        assert!(!is_valid_code("abc12345"));
        assert!(!is_valid_code("ABC1234"));
    }

    #[test]
    fn test_code_characters_are_uniform_at_every_position() {
        const SAMPLES: usize = 20_000;
        let mut counts = [[0usize; 36]; CODE_LENGTH];
        for _ in 0..SAMPLES {
            for (pos, b) in generate_code().bytes().enumerate() {
                let idx = CODE_ALPHABET.iter().position(|c| *c == b).unwrap();
                counts[pos][idx] += 1;
            }
        }
        let expected = SAMPLES as f64 / 36.0;
        for (pos, row) in counts.iter().enumerate() {
            for (idx, n) in row.iter().enumerate() {
                let ratio = *n as f64 / expected;
                assert!(
                    (0.7..1.3).contains(&ratio),
                    "position {} char {} seen {:.2}x the expected rate",
                    pos + 1,
                    CODE_ALPHABET[idx] as char,
                    ratio
                );
            }
        }
    }

    #[test]
    fn test_url_shape() {
        let record = build_verification(&key("12.00"), "https://school.test/verify", None);
        let (base, code) = record.url.split_once("?code=").unwrap();
        assert_eq!(base, "https://school.test/verify");
        assert_eq!(code, record.code);
        assert!(is_valid_code(code));
        assert!(record.scannable.is_none());
        assert_eq!(record.metadata().hash, key("12.00").hash());
    }

    #[test]
    fn test_scannable_rendering() {
        let record = build_verification(&key("12.00"), "https://school.test/verify", Some(120));
        let image = record.scannable.as_ref().unwrap();
        assert_eq!(image.width(), image.height());
        let png = record.scannable_png.unwrap();
        assert!(png.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
    }

    #[test]
    fn test_oversize_payload_degrades() {
        let payload = "X".repeat(8000);
        assert!(render_scannable(&payload, 120).is_err());
        let record = build_verification(&key("1.00"), &format!("https://s.test/{}", payload), Some(120));
        assert!(record.scannable.is_none());
        assert!(is_valid_code(&record.code));
    }
}
