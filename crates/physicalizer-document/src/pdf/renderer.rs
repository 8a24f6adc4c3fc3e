// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Renderer capability: finished text or table in, document bytes out.

use physicalizer_core::error::Result;
use physicalizer_core::types::{ExportMode, Table};

/// What gets exported for one capture.
#[derive(Debug, Clone, Copy)]
pub enum ExportContent<'a> {
    /// Raw OCR text, rendered as one bullet per non-blank line.
    Summary(&'a str),
    /// A reconstructed table, header first.
    Table(&'a Table),
}

impl ExportContent<'_> {
    pub fn mode(&self) -> ExportMode {
        match self {
            Self::Summary(_) => ExportMode::Summary,
            Self::Table(_) => ExportMode::Table,
        }
    }
}

/// Anything that can turn export content into a document.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, content: &ExportContent<'_>) -> Result<Vec<u8>>;
}
