//! Image resizing
//!
//! Decodes an image, applies one of the CSS-style fit modes, and re-encodes
//! in the source format.

use std::io::Cursor;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// How an image is fitted into the target width/height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FitMode {
    /// Fill the target box, cropping overflow. Aspect ratio preserved.
    #[default]
    Cover,
    /// Fit entirely within the target box. Aspect ratio preserved, output
    /// may be smaller than the box on one axis.
    Contain,
    /// Stretch to exactly the target dimensions, ignoring aspect ratio.
    Fill,
    /// Like Contain, but never upscale.
    Inside,
    /// Scale so both dimensions are at least the target, preserving aspect
    /// ratio. Output may be larger than the box on one axis.
    Outside,
}

impl FromStr for FitMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cover" => Ok(FitMode::Cover),
            "contain" => Ok(FitMode::Contain),
            "fill" => Ok(FitMode::Fill),
            "inside" => Ok(FitMode::Inside),
            "outside" => Ok(FitMode::Outside),
            other => Err(anyhow!("Unknown fit mode '{}'", other)),
        }
    }
}

/// Pick a resampling filter: Lanczos for downscaling, Catmull-Rom for
/// upscaling.
fn select_filter(img: &DynamicImage, width: u32, height: u32) -> FilterType {
    let (iw, ih) = img.dimensions();
    if width <= iw && height <= ih {
        FilterType::Lanczos3
    } else {
        FilterType::CatmullRom
    }
}

fn apply_fit(img: &DynamicImage, width: u32, height: u32, fit: FitMode) -> DynamicImage {
    let filter = select_filter(img, width, height);

    match fit {
        FitMode::Cover => img.resize_to_fill(width, height, filter),
        FitMode::Contain => img.resize(width, height, filter),
        FitMode::Fill => img.resize_exact(width, height, filter),
        FitMode::Inside => {
            let (iw, ih) = img.dimensions();
            if iw <= width && ih <= height {
                img.clone()
            } else {
                img.resize(width, height, filter)
            }
        }
        FitMode::Outside => {
            let (iw, ih) = img.dimensions();
            let scale = f64::max(width as f64 / iw as f64, height as f64 / ih as f64);
            let out_w = ((iw as f64 * scale).round() as u32).max(width);
            let out_h = ((ih as f64 * scale).round() as u32).max(height);
            img.resize_exact(out_w, out_h, filter)
        }
    }
}

/// Resize an encoded image, re-encoding in its source format.
pub fn resize(data: &[u8], width: u32, height: u32, fit: FitMode) -> Result<Bytes, anyhow::Error> {
    if width == 0 || height == 0 {
        bail!("Resize dimensions must be non-zero");
    }

    let reader = image::ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let format = reader.format().unwrap_or(ImageFormat::Png);
    let img = reader.decode()?;

    let resized = apply_fit(&img, width, height, fit);

    let (out_w, out_h) = resized.dimensions();
    tracing::debug!(
        width = out_w,
        height = out_h,
        fit = ?fit,
        format = ?format,
        "Resized image"
    );

    let estimated_size = (out_w * out_h * 3) as usize;
    let mut buffer = Vec::with_capacity(estimated_size);
    resized.write_to(&mut Cursor::new(&mut buffer), format)?;

    Ok(Bytes::from(buffer))
}
