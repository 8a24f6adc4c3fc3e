// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture pipeline: frame in, exported document out.
//
// frame -> enhance (saved) -> prepare_for_ocr -> recognizer -> infer_table
//       -> table or summary export

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::DynamicImage;
use physicalizer_core::config::{NormalizerSettings, PhysicalizerConfig};
use physicalizer_core::error::{PhysicalizerError, Result};
use physicalizer_core::types::{ExportMode, ExportPreference, Table};
use tracing::{info, instrument, warn};

use crate::image::ImageNormalizer;
use crate::pdf::{DocumentRenderer, ExportContent, PdfWriter};
use crate::scan::TextRecognizer;
use crate::table::infer_table;

/// Pick the export mode for a capture.
///
/// A requested table with nothing to show degrades to a summary.
pub fn choose_mode(preference: ExportPreference, has_table: bool) -> ExportMode {
    match (preference, has_table) {
        (ExportPreference::Summary, _) => ExportMode::Summary,
        (ExportPreference::Auto | ExportPreference::Table, true) => ExportMode::Table,
        (ExportPreference::Auto | ExportPreference::Table, false) => ExportMode::Summary,
    }
}

/// Everything produced for one capture.
#[derive(Debug, Clone)]
pub struct Capture {
    /// Contrast-enhanced colour frame, when the capture started from an image.
    pub frame: Option<DynamicImage>,
    /// Raw recognizer output.
    pub text: String,
    pub table: Option<Table>,
    pub mode: ExportMode,
    /// Rendered document.
    pub document: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

/// Paths written by [`Capture::save_to_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCapture {
    pub frame_path: Option<PathBuf>,
    pub text_path: PathBuf,
    pub document_path: PathBuf,
}

impl Capture {
    /// `capture_<YYYYmmdd_HHMMSS>` in UTC.
    pub fn file_stem(&self) -> String {
        format!("capture_{}", self.captured_at.format("%Y%m%d_%H%M%S"))
    }

    /// Write the enhanced frame (PNG), the raw text and the PDF into `dir`.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<SavedCapture> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let stem = self.file_stem();

        let frame_path = match &self.frame {
            Some(frame) => {
                let path = dir.join(format!("{stem}.png"));
                frame.save(&path).map_err(|err| {
                    PhysicalizerError::ImageError(format!(
                        "failed to save frame to {}: {}",
                        path.display(),
                        err
                    ))
                })?;
                Some(path)
            }
            None => None,
        };

        let text_path = dir.join(format!("{stem}.txt"));
        std::fs::write(&text_path, &self.text)?;

        let document_path = dir.join(format!("{stem}.pdf"));
        std::fs::write(&document_path, &self.document)?;

        info!(stem = %stem, mode = ?self.mode, "Capture saved");
        Ok(SavedCapture {
            frame_path,
            text_path,
            document_path,
        })
    }
}

/// Runs captures through normalization, recognition, inference and export.
pub struct CapturePipeline<R, D> {
    recognizer: R,
    renderer: D,
    settings: NormalizerSettings,
    preference: ExportPreference,
}

impl<R: TextRecognizer> CapturePipeline<R, PdfWriter> {
    /// Pipeline exporting through a [`PdfWriter`] configured from `config`.
    pub fn with_pdf_writer(recognizer: R, config: &PhysicalizerConfig) -> Result<Self> {
        let mut writer = PdfWriter::new(config.paper_size);
        writer.set_title(config.document_title.clone());
        Self::new(recognizer, writer, config)
    }
}

impl<R: TextRecognizer, D: DocumentRenderer> CapturePipeline<R, D> {
    pub fn new(recognizer: R, renderer: D, config: &PhysicalizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            recognizer,
            renderer,
            settings: config.normalizer.clone(),
            preference: config.export,
        })
    }

    /// Process an encoded frame (JPEG, PNG, ...).
    pub fn process_bytes(&self, data: &[u8]) -> Result<Capture> {
        let normalizer = ImageNormalizer::from_bytes(data, self.settings.clone())?;
        self.run(normalizer)
    }

    /// Process an already-decoded frame.
    pub fn process_frame(&self, frame: DynamicImage) -> Result<Capture> {
        let normalizer = ImageNormalizer::from_dynamic(frame, self.settings.clone())?;
        self.run(normalizer)
    }

    #[instrument(skip_all, fields(recognizer = self.recognizer.name()))]
    fn run(&self, normalizer: ImageNormalizer) -> Result<Capture> {
        let enhanced = normalizer.enhance();
        let frame = enhanced.as_dynamic().clone();
        let ocr_ready = enhanced.prepare_for_ocr().into_dynamic();

        let text = self.recognizer.recognize(&ocr_ready)?;
        info!(chars = text.len(), lines = text.lines().count(), "Frame recognized");

        let mut capture = self.export_text(text)?;
        capture.frame = Some(frame);
        Ok(capture)
    }

    /// Infer and export text recognized elsewhere.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn export_text(&self, text: String) -> Result<Capture> {
        let table = infer_table(&text);
        let mode = choose_mode(self.preference, table.is_some());
        if self.preference == ExportPreference::Table && table.is_none() {
            warn!("Table export requested but no table structure found; exporting summary");
        }

        let content = match (&table, mode) {
            (Some(table), ExportMode::Table) => ExportContent::Table(table),
            _ => ExportContent::Summary(&text),
        };
        let document = self.renderer.render(&content)?;
        info!(?mode, bytes = document.len(), "Capture exported");

        Ok(Capture {
            frame: None,
            text,
            table,
            mode,
            document,
            captured_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn summary_preference_always_wins() {
        assert_eq!(choose_mode(ExportPreference::Summary, true), ExportMode::Summary);
        assert_eq!(choose_mode(ExportPreference::Summary, false), ExportMode::Summary);
    }

    #[test]
    fn table_preference_degrades_without_table() {
        assert_eq!(choose_mode(ExportPreference::Table, true), ExportMode::Table);
        assert_eq!(choose_mode(ExportPreference::Table, false), ExportMode::Summary);
    }

    #[test]
    fn auto_follows_inference() {
        assert_eq!(choose_mode(ExportPreference::Auto, true), ExportMode::Table);
        assert_eq!(choose_mode(ExportPreference::Auto, false), ExportMode::Summary);
    }

    #[test]
    fn file_stem_uses_utc_timestamp() {
        let capture = Capture {
            frame: None,
            text: String::new(),
            table: None,
            mode: ExportMode::Summary,
            document: Vec::new(),
            captured_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 5, 7).unwrap(),
        };
        assert_eq!(capture.file_stem(), "capture_20260314_090507");
    }
}
