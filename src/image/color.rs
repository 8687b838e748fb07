//! Interleaved multi-channel frames and luminance reduction.

use crate::image::OwnedImage;
use crate::util::math::luma;
use crate::util::{TallyMatchError, TallyMatchResult};

/// Byte layout of an interleaved pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// One luminance sample per pixel.
    Gray,
    /// Red, green, blue.
    Rgb,
    /// Blue, green, red (camera drivers commonly deliver this order).
    Bgr,
}

impl PixelLayout {
    /// Number of interleaved samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb | PixelLayout::Bgr => 3,
        }
    }
}

/// Owned frame or patch with 1 or 3 interleaved channels.
///
/// Captured frames are never mutated by the detectors; every detector reads
/// them and allocates its own grayscale copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    data: Vec<u8>,
    width: usize,
    height: usize,
    layout: PixelLayout,
}

impl Image {
    /// Wraps an interleaved buffer of exactly `width * height * channels` bytes.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> TallyMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(TallyMatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(layout.channels()))
            .ok_or(TallyMatchError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(TallyMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    /// Builds an image from a raw buffer and a channel count (1 = gray, 3 = BGR).
    pub fn from_raw_channels(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> TallyMatchResult<Self> {
        let layout = match channels {
            1 => PixelLayout::Gray,
            3 => PixelLayout::Bgr,
            other => return Err(TallyMatchError::InvalidChannels { channels: other }),
        };
        Self::new(data, width, height, layout)
    }

    /// Creates an image where every pixel equals `pixel` (length = channel count).
    pub fn filled(
        width: usize,
        height: usize,
        layout: PixelLayout,
        pixel: &[u8],
    ) -> TallyMatchResult<Self> {
        if pixel.len() != layout.channels() {
            return Err(TallyMatchError::InvalidChannels {
                channels: pixel.len(),
            });
        }
        let count = width
            .checked_mul(height)
            .ok_or(TallyMatchError::InvalidDimensions { width, height })?;
        let data = pixel.repeat(count);
        Self::new(data, width, height, layout)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel layout.
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Returns the interleaved byte buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the samples of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels();
        let start = (y * self.width + x) * c;
        self.data.get(start..start + c)
    }

    /// Overwrites the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: usize, y: usize, pixel: &[u8]) {
        if x >= self.width || y >= self.height || pixel.len() != self.channels() {
            return;
        }
        let c = self.channels();
        let start = (y * self.width + x) * c;
        self.data[start..start + c].copy_from_slice(pixel);
    }

    /// Copies the `width x height` block whose top-left corner is `(x, y)`.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> TallyMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(TallyMatchError::InvalidDimensions { width, height });
        }
        let fits_x = x.checked_add(width).is_some_and(|end| end <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|end| end <= self.height);
        if !fits_x || !fits_y {
            return Err(TallyMatchError::RoiOutOfBounds {
                x,
                y,
                width,
                height,
                img_width: self.width,
                img_height: self.height,
            });
        }

        let c = self.channels();
        let mut data = Vec::with_capacity(width * height * c);
        for row in y..y + height {
            let start = (row * self.width + x) * c;
            data.extend_from_slice(&self.data[start..start + width * c]);
        }
        Self::new(data, width, height, self.layout)
    }

    /// Reduces the image to a single luminance channel.
    ///
    /// Gray inputs are copied unchanged.
    pub fn to_gray(&self) -> OwnedImage {
        let data = match self.layout {
            PixelLayout::Gray => self.data.clone(),
            PixelLayout::Rgb => self
                .data
                .chunks_exact(3)
                .map(|px| luma(px[0], px[1], px[2]))
                .collect(),
            PixelLayout::Bgr => self
                .data
                .chunks_exact(3)
                .map(|px| luma(px[2], px[1], px[0]))
                .collect(),
        };
        OwnedImage {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

impl From<OwnedImage> for Image {
    fn from(value: OwnedImage) -> Self {
        let width = value.width();
        let height = value.height();
        Self {
            data: value.into_vec(),
            width,
            height,
            layout: PixelLayout::Gray,
        }
    }
}
