// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: frame normalization for OCR (CLAHE on luma, upscaling,
// adaptive binarization, morphological closing).

pub mod clahe;
pub mod normalizer;

pub use normalizer::{ImageNormalizer, normalize};
