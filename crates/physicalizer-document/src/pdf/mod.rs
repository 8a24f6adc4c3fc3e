// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: the renderer capability and a `printpdf` writer for bulleted
// summaries and tables.

pub mod renderer;
pub mod writer;

pub use renderer::{DocumentRenderer, ExportContent};
pub use writer::PdfWriter;
