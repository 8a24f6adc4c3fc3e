// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the Physicalizer.

use thiserror::Error;

/// Top-level error type for all Physicalizer operations.
///
/// "No table found" is not an error: table inference returns `Option::None`
/// and the caller falls back to a summary export.
#[derive(Debug, Error)]
pub enum PhysicalizerError {
    // -- Capture / image errors --
    #[error("unreadable image: {0}")]
    ImageRead(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Recognition --
    #[error("OCR failed: {0}")]
    Ocr(String),

    // -- Export --
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PhysicalizerError>;
