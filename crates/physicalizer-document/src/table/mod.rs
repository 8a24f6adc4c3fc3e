// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table module: heuristic reconstruction of tables from OCR text.

pub mod infer;

pub use infer::{Delimiter, infer_table};
