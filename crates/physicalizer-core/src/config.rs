// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PhysicalizerError, Result};
use crate::types::{ExportPreference, PaperSize};

/// Capture and export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalizerConfig {
    /// Paper size for exported PDFs.
    pub paper_size: PaperSize,
    /// Whether captures export as a table, a summary, or whichever fits.
    pub export: ExportPreference,
    /// Title embedded in exported PDF metadata.
    pub document_title: String,
    /// Frame preprocessing parameters.
    pub normalizer: NormalizerSettings,
}

impl Default for PhysicalizerConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            export: ExportPreference::Auto,
            document_title: "Physicalizer Capture".to_string(),
            normalizer: NormalizerSettings::default(),
        }
    }
}

impl PhysicalizerConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.normalizer.validate()
    }
}

/// Fixed parameters of the frame normalization pipeline.
///
/// The defaults were picked empirically for webcam captures of printed and
/// handwritten tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    /// CLAHE histogram clip limit, relative to a uniform histogram.
    pub clahe_clip_limit: f32,
    /// CLAHE tiles per axis.
    pub clahe_tile_grid: u32,
    /// Upscale factor applied before recognition.
    pub upscale_factor: f32,
    /// Gaussian blur sigma (1.1 matches a 5x5 kernel).
    pub blur_sigma: f32,
    /// Adaptive threshold neighbourhood radius (block size = 2r + 1).
    pub threshold_block_radius: u32,
    /// Constant subtracted from the local mean before thresholding.
    pub threshold_offset: i32,
    /// Closing structuring element radius (1 = 3x3 square).
    pub closing_radius: u8,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 2.0,
            clahe_tile_grid: 8,
            upscale_factor: 2.0,
            blur_sigma: 1.1,
            threshold_block_radius: 5,
            threshold_offset: 2,
            closing_radius: 1,
        }
    }
}

impl NormalizerSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.clahe_clip_limit > 0.0) {
            return Err(PhysicalizerError::Config(format!(
                "clahe_clip_limit must be positive, got {}",
                self.clahe_clip_limit
            )));
        }
        if self.clahe_tile_grid == 0 {
            return Err(PhysicalizerError::Config(
                "clahe_tile_grid must be at least 1".to_string(),
            ));
        }
        // Upscaling must never shrink the frame.
        if !(self.upscale_factor >= 1.0) {
            return Err(PhysicalizerError::Config(format!(
                "upscale_factor must be >= 1.0, got {}",
                self.upscale_factor
            )));
        }
        if !(self.blur_sigma > 0.0) {
            return Err(PhysicalizerError::Config(format!(
                "blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.threshold_block_radius == 0 {
            return Err(PhysicalizerError::Config(
                "threshold_block_radius must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PhysicalizerConfig::default().validate().is_ok());
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config = PhysicalizerConfig::from_json(r#"{ "export": "summary" }"#).expect("parses");
        assert_eq!(config.export, ExportPreference::Summary);
        assert_eq!(config.normalizer, NormalizerSettings::default());
        assert_eq!(config.paper_size, PaperSize::A4);
    }

    #[test]
    fn from_json_rejects_shrinking_scale() {
        let err = PhysicalizerConfig::from_json(r#"{ "normalizer": { "upscale_factor": 0.5 } }"#)
            .expect_err("should reject");
        assert!(matches!(err, PhysicalizerError::Config(_)));
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        let err = PhysicalizerConfig::from_json("{ not json").expect_err("should reject");
        assert!(matches!(err, PhysicalizerError::Serialization(_)));
    }

    #[test]
    fn zero_tile_grid_is_rejected() {
        let settings = NormalizerSettings {
            clahe_tile_grid: 0,
            ..NormalizerSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
