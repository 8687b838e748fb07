//! Conversions to and from the `image` crate, plus file loading and saving.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{Image, ImageView, OwnedImage, PixelLayout};
use crate::util::{TallyMatchError, TallyMatchResult};
use std::path::Path;

fn io_err(err: image::ImageError) -> TallyMatchError {
    TallyMatchError::ImageIo {
        reason: err.to_string(),
    }
}

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &image::GrayImage) -> TallyMatchResult<ImageView<'_, u8>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Creates an owned [`Image`] from a dynamic image.
///
/// Luma inputs stay single-channel; everything else is reduced to RGB8.
pub fn image_from_dynamic(img: &image::DynamicImage) -> TallyMatchResult<Image> {
    match img {
        image::DynamicImage::ImageLuma8(gray) => Image::new(
            gray.as_raw().clone(),
            gray.width() as usize,
            gray.height() as usize,
            PixelLayout::Gray,
        ),
        other => {
            let rgb = other.to_rgb8();
            let (w, h) = (rgb.width() as usize, rgb.height() as usize);
            Image::new(rgb.into_raw(), w, h, PixelLayout::Rgb)
        }
    }
}

/// Converts an [`Image`] into an RGB8 buffer for encoding or drawing.
pub fn to_rgb_image(img: &Image) -> TallyMatchResult<image::RgbImage> {
    let width = img.width() as u32;
    let height = img.height() as u32;
    let data = match img.layout() {
        PixelLayout::Rgb => img.as_bytes().to_vec(),
        PixelLayout::Bgr => img
            .as_bytes()
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
        PixelLayout::Gray => img.as_bytes().iter().flat_map(|&v| [v, v, v]).collect(),
    };
    image::RgbImage::from_raw(width, height, data).ok_or(TallyMatchError::BufferTooSmall {
        needed: img.width() * img.height() * 3,
        got: img.as_bytes().len(),
    })
}

/// Loads an image file, keeping its colour channels.
pub fn load_image<P: AsRef<Path>>(path: P) -> TallyMatchResult<Image> {
    let img = image::open(path).map_err(io_err)?;
    image_from_dynamic(&img)
}

/// Loads an image file and reduces it to grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> TallyMatchResult<OwnedImage> {
    let img = image::open(path).map_err(io_err)?;
    let gray = img.to_luma8();
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    OwnedImage::new(gray.into_raw(), w, h)
}

/// Encodes an image to disk; the format follows the file extension.
pub fn save_image<P: AsRef<Path>>(img: &Image, path: P) -> TallyMatchResult<()> {
    match img.layout() {
        PixelLayout::Gray => {
            let gray = image::GrayImage::from_raw(
                img.width() as u32,
                img.height() as u32,
                img.as_bytes().to_vec(),
            )
            .ok_or(TallyMatchError::InvalidDimensions {
                width: img.width(),
                height: img.height(),
            })?;
            gray.save(path).map_err(io_err)
        }
        PixelLayout::Rgb | PixelLayout::Bgr => to_rgb_image(img)?.save(path).map_err(io_err),
    }
}
