//! Geometric transforms that turn a decoded upload into derivative rasters.

use image::imageops::FilterType;
use image::{ColorType, DynamicImage};

use super::ImageError;

/// Resampling filter used for every derivative.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Pixel region of a source raster, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Target geometry of a derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// Centered square crop resized to `edge x edge`.
    Square(u32),
    /// Aspect-preserving scale into a bounding box.
    Fit { width: u32, height: u32 },
}

/// Largest centered square inside a `width x height` raster.
///
/// Landscape sources are cropped horizontally, everything else vertically.
/// A square source yields the full frame.
///
/// # Examples
///
/// ```
/// use storefront::images::transform::center_square;
///
/// let b = center_square(400, 300);
/// assert_eq!((b.left, b.top, b.right, b.bottom), (50, 0, 350, 300));
/// ```
pub fn center_square(width: u32, height: u32) -> CropBox {
    if width > height {
        let left = (width - height) / 2;
        CropBox {
            left,
            top: 0,
            right: left + height,
            bottom: height,
        }
    } else {
        let top = (height - width) / 2;
        CropBox {
            left: 0,
            top,
            right: width,
            bottom: top + width,
        }
    }
}

/// Dimensions of a `width x height` raster scaled to fit `max_width x max_height`.
///
/// Sources smaller than the box are scaled up. Returns `None` when either
/// resulting dimension would be zero.
///
/// # Examples
///
/// ```
/// use storefront::images::transform::fit_within;
///
/// assert_eq!(fit_within(400, 300, 600, 400), Some((533, 400)));
/// assert_eq!(fit_within(400, 300, 800, 600), Some((800, 600)));
/// ```
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let new_width = (f64::from(width) * scale).floor() as u32;
    let new_height = (f64::from(height) * scale).floor() as u32;
    if new_width == 0 || new_height == 0 {
        return None;
    }
    Some((new_width, new_height))
}

/// Drop alpha channels, palettes and high bit depths.
///
/// 8-bit RGB and 8-bit luma are kept; everything else becomes RGB8 so every
/// encoder (JPEG in particular) accepts the result.
pub fn normalize_color(img: DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::Rgb8 | ColorType::L8 => img,
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}

/// Produce the raster for one geometry.
pub fn render(source: &DynamicImage, geometry: Geometry) -> Result<DynamicImage, ImageError> {
    match geometry {
        Geometry::Square(edge) => Ok(square_thumbnail(source, edge)),
        Geometry::Fit { width, height } => fit(source, width, height),
    }
}

/// Center-crop to a square, then resize to `edge x edge`.
pub fn square_thumbnail(source: &DynamicImage, edge: u32) -> DynamicImage {
    let b = center_square(source.width(), source.height());
    source
        .crop_imm(b.left, b.top, b.width(), b.height())
        .resize_exact(edge, edge, RESAMPLE_FILTER)
}

/// Scale into `max_width x max_height` preserving the aspect ratio.
pub fn fit(source: &DynamicImage, max_width: u32, max_height: u32) -> Result<DynamicImage, ImageError> {
    let (width, height) = fit_within(source.width(), source.height(), max_width, max_height)
        .ok_or_else(|| {
            ImageError::Processing(format!(
                "cannot fit {}x{} image within {}x{}",
                source.width(),
                source.height(),
                max_width,
                max_height
            ))
        })?;
    Ok(source.resize_exact(width, height, RESAMPLE_FILTER))
}
