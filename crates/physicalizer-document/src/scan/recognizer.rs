// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognizer capability: image in, raw text out.

use image::DynamicImage;
use physicalizer_core::error::Result;

/// Anything that turns a normalized frame into raw text.
///
/// Implementations receive the binarized output of
/// [`ImageNormalizer::normalize`](crate::image::ImageNormalizer::normalize)
/// and return the recognized lines joined by `\n`. Errors are reported as
/// [`PhysicalizerError::Ocr`](physicalizer_core::PhysicalizerError::Ocr) and
/// are not retried.
pub trait TextRecognizer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        (**self).recognize(image)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        (**self).recognize(image)
    }
}
