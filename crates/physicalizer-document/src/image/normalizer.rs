// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame normalization pipeline: local contrast enhancement on luma, then the
// OCR preparation path: upscale, grayscale, blur, adaptive binarization, and
// morphological closing.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use physicalizer_core::NormalizerSettings;
use physicalizer_core::error::{PhysicalizerError, Result};
use tracing::{debug, info, instrument};

use super::clahe::equalize_adaptive;

/// Cleans up a captured camera frame for character recognition.
///
/// Stages are split in two halves. [`enhance`](Self::enhance) boosts local
/// contrast while keeping colour; this is the image worth saving.
/// [`prepare_for_ocr`](Self::prepare_for_ocr) produces the binarized,
/// upscaled image handed to the recognizer. [`normalize`](Self::normalize)
/// runs both.
///
/// ```ignore
/// let ocr_ready = ImageNormalizer::open("capture.jpg", NormalizerSettings::default())?
///     .normalize()
///     .into_dynamic();
/// ```
pub struct ImageNormalizer {
    /// The working image.
    image: DynamicImage,
    settings: NormalizerSettings,
}

impl ImageNormalizer {
    // -- Construction ---------------------------------------------------------

    /// Decode a frame from encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data, settings), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], settings: NormalizerSettings) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| {
            PhysicalizerError::ImageRead(format!("failed to decode frame: {}", err))
        })?;
        Self::from_dynamic(image, settings)
    }

    /// Load a frame from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>, settings: NormalizerSettings) -> Result<Self> {
        let image = image::open(path.as_ref()).map_err(|err| {
            PhysicalizerError::ImageRead(format!(
                "failed to open frame {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        Self::from_dynamic(image, settings)
    }

    /// Wrap an already-decoded frame. Fails on a zero-sized frame or
    /// out-of-range settings.
    pub fn from_dynamic(image: DynamicImage, settings: NormalizerSettings) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PhysicalizerError::ImageRead(format!(
                "frame is empty ({}x{})",
                image.width(),
                image.height()
            )));
        }
        settings.validate()?;
        info!(
            width = image.width(),
            height = image.height(),
            "Frame loaded"
        );
        Ok(Self { image, settings })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the current working image.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the normalizer and return the underlying image.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    fn with_image(self, image: DynamicImage) -> Self {
        Self {
            image,
            settings: self.settings,
        }
    }

    // -- Enhancement ----------------------------------------------------------

    /// Apply CLAHE to the luma channel only and convert back to RGB.
    ///
    /// Chroma is carried through untouched so colours do not shift.
    #[instrument(skip(self))]
    pub fn enhance(self) -> Self {
        let NormalizerSettings {
            clahe_clip_limit,
            clahe_tile_grid,
            ..
        } = self.settings;
        info!(clahe_clip_limit, clahe_tile_grid, "Enhancing local contrast");

        let rgb = self.image.to_rgb8();
        let (luma, chroma) = split_ycbcr(&rgb);
        let equalized = equalize_adaptive(&luma, clahe_clip_limit, clahe_tile_grid);
        let merged = merge_ycbcr(&equalized, &chroma);

        debug!("Contrast enhancement complete");
        self.with_image(DynamicImage::ImageRgb8(merged))
    }

    // -- OCR preparation ------------------------------------------------------

    /// Upscale by the configured factor with bicubic (Catmull-Rom)
    /// interpolation.
    #[instrument(skip(self))]
    pub fn upscale(self) -> Self {
        let factor = self.settings.upscale_factor;
        let (width, height) = scaled_dimensions(self.width(), self.height(), factor);
        info!(
            from_w = self.width(),
            from_h = self.height(),
            width,
            height,
            "Upscaling frame"
        );

        let resized = match &self.image {
            DynamicImage::ImageLuma8(gray) => {
                DynamicImage::ImageLuma8(imageops::resize(gray, width, height, FilterType::CatmullRom))
            }
            other => DynamicImage::ImageRgb8(imageops::resize(
                &other.to_rgb8(),
                width,
                height,
                FilterType::CatmullRom,
            )),
        };
        self.with_image(resized)
    }

    /// Grayscale, blur away speckle, and binarize against the local mean.
    #[instrument(skip(self))]
    pub fn binarize(self) -> Self {
        let NormalizerSettings {
            blur_sigma,
            threshold_block_radius,
            threshold_offset,
            ..
        } = self.settings;
        info!(
            blur_sigma,
            threshold_block_radius, threshold_offset, "Applying adaptive binarization"
        );

        let gray = self.image.to_luma8();
        let blurred = gaussian_blur_f32(&gray, blur_sigma);
        debug!("Gaussian blur applied");

        let binary = adaptive_threshold(&blurred, threshold_block_radius, threshold_offset);
        debug!("Binarization complete");
        self.with_image(DynamicImage::ImageLuma8(binary))
    }

    /// Morphological closing (dilate then erode) with a square element to
    /// reconnect broken strokes.
    #[instrument(skip(self))]
    pub fn close_gaps(self) -> Self {
        let radius = self.settings.closing_radius;
        if radius == 0 {
            return self;
        }
        info!(radius, "Closing stroke gaps");
        let closed = close(&self.image.to_luma8(), Norm::LInf, radius);
        self.with_image(DynamicImage::ImageLuma8(closed))
    }

    /// Upscale, binarize and close. Run right before recognition.
    #[instrument(skip(self))]
    pub fn prepare_for_ocr(self) -> Self {
        self.upscale().binarize().close_gaps()
    }

    /// Run the whole pipeline: [`enhance`](Self::enhance) then
    /// [`prepare_for_ocr`](Self::prepare_for_ocr).
    #[instrument(skip(self))]
    pub fn normalize(self) -> Self {
        info!("Running full frame normalization pipeline");
        self.enhance().prepare_for_ocr()
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| PhysicalizerError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            PhysicalizerError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Normalize a frame for recognition in one call.
///
/// Fails on an empty frame or invalid settings.
pub fn normalize(frame: DynamicImage, settings: &NormalizerSettings) -> Result<DynamicImage> {
    Ok(ImageNormalizer::from_dynamic(frame, settings.clone())?
        .normalize()
        .into_dynamic())
}

fn scaled_dimensions(width: u32, height: u32, factor: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f32 * factor).round() as u32).max(v).max(1);
    (scale(width), scale(height))
}

// -- Colour space helpers -----------------------------------------------------

/// Split an RGB image into its BT.601 luma plane and (Cb, Cr) chroma pairs.
fn split_ycbcr(rgb: &RgbImage) -> (GrayImage, Vec<(f32, f32)>) {
    let (width, height) = rgb.dimensions();
    let mut luma = GrayImage::new(width, height);
    let mut chroma = Vec::with_capacity((width * height) as usize);

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0.map(f32::from);
        let y_val = 0.299 * r + 0.587 * g + 0.114 * b;
        let cb = 128.0 + 0.564 * (b - y_val);
        let cr = 128.0 + 0.713 * (r - y_val);
        luma.put_pixel(x, y, Luma([y_val.round().clamp(0.0, 255.0) as u8]));
        chroma.push((cb, cr));
    }

    (luma, chroma)
}

/// Inverse of [`split_ycbcr`], clipping each channel to 0..=255.
fn merge_ycbcr(luma: &GrayImage, chroma: &[(f32, f32)]) -> RgbImage {
    let width = luma.width();
    RgbImage::from_fn(width, luma.height(), |x, y| {
        let y_val = luma.get_pixel(x, y).0[0] as f32;
        let (cb, cr) = chroma[(y * width + x) as usize];
        let r = y_val + 1.403 * (cr - 128.0);
        let g = y_val - 0.714 * (cr - 128.0) - 0.344 * (cb - 128.0);
        let b = y_val + 1.773 * (cb - 128.0);
        Rgb([r, g, b].map(|c| c.round().clamp(0.0, 255.0) as u8))
    })
}

// -- Adaptive threshold -------------------------------------------------------

/// Binarize against the local mean of a `(2r + 1)`-square neighbourhood.
///
/// A pixel turns white when it is brighter than `mean - offset` and black
/// otherwise, so text darker than its surroundings survives uneven lighting.
fn adaptive_threshold(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = compute_integral_image(gray);

    GrayImage::from_fn(width, height, |x, y| {
        let local_mean = region_mean(&integral, width, height, x, y, block_radius);
        let threshold = local_mean - offset as f64;
        let value = gray.get_pixel(x, y).0[0] as f64;
        Luma([if value > threshold { 255u8 } else { 0u8 }])
    })
}

/// Summed-area table of a grayscale image with a zero-padded border.
///
/// `table[y * (width + 1) + x]` is the sum of all pixels in `[0, x) x [0, y)`.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value of the square of `radius` centred on (cx, cy), clamped to
/// the image bounds.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = (cx as usize + radius as usize + 1).min(img_width as usize);
    let y2 = (cy as usize + radius as usize + 1).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

// -- Tests --------------------------------------------------------------------
