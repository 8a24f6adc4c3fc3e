// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// physicalizer-document: Capture processing for the Data Physicalizer.
//
// Provides frame normalization for OCR (CLAHE, upscaling, adaptive
// binarization, closing), a recognizer capability with an optional `ocrs`
// engine, heuristic table inference over OCR text, PDF export of summaries and
// tables, and the capture pipeline tying them together.

pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod scan;
pub mod table;

// Re-export the primary items so callers can use `physicalizer_document::infer_table` etc.
pub use image::{ImageNormalizer, normalize};
pub use pdf::{DocumentRenderer, ExportContent, PdfWriter};
pub use pipeline::{Capture, CapturePipeline, SavedCapture, choose_mode};
pub use scan::TextRecognizer;
pub use table::infer_table;

#[cfg(feature = "ocr")]
pub use scan::ocr::{OcrConfig, OcrEngine};
