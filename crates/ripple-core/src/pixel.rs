//! Packed RGBA pixel buffers.
//!
//! Pixels are stored row-major as `u32` values in `0xRRGGBBAA` order, one
//! per pixel, so a buffer of `width * height` entries can be indexed with
//! `x + y * width` exactly like the height grids.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::RippleError;

/// Pack four 8-bit channels into a `0xRRGGBBAA` pixel.
#[inline]
pub fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a as u32
}

/// Split a `0xRRGGBBAA` pixel into `[r, g, b, a]`.
#[inline]
pub fn unpack_rgba(pixel: u32) -> [u8; 4] {
    pixel.to_be_bytes()
}

/// Width and height of an image, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl ImageSize {
    /// Create a size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, RippleError> {
        if width == 0 || height == 0 {
            return Err(RippleError::invalid_argument(format!(
                "image size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether `(x, y)` lies inside the image.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Linear index of `(x, y)`. The caller guarantees the point is inside.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        x as usize + y as usize * self.width as usize
    }
}

/// A flat, row-major buffer of packed RGBA pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    size: ImageSize,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Wrap an existing pixel vector.
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::InvalidArgument`] if either dimension is zero
    /// or `pixels.len() != width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, RippleError> {
        let size = ImageSize::new(width, height)?;
        if pixels.len() != size.pixel_count() {
            return Err(RippleError::invalid_argument(format!(
                "pixel count {} does not match {width}x{height}",
                pixels.len()
            )));
        }
        Ok(Self { size, pixels })
    }

    /// A buffer of the given size with every pixel set to `color`.
    pub fn filled(size: ImageSize, color: u32) -> Self {
        Self {
            size,
            pixels: vec![color; size.pixel_count()],
        }
    }

    /// Build a buffer from interleaved 8-bit RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::InvalidArgument`] if the byte count is not
    /// `width * height * 4` or a dimension is zero.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, RippleError> {
        let size = ImageSize::new(width, height)?;
        if bytes.len() != size.pixel_count() * 4 {
            return Err(RippleError::invalid_argument(format!(
                "byte count {} does not match {width}x{height} RGBA",
                bytes.len()
            )));
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| pack_rgba(c[0], c[1], c[2], c[3]))
            .collect();
        Ok(Self { size, pixels })
    }

    /// Convert from an `image` RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RippleError::InvalidArgument`] for an empty image.
    pub fn from_image(img: &RgbaImage) -> Result<Self, RippleError> {
        let (width, height) = img.dimensions();
        let size = ImageSize::new(width, height)?;
        let pixels = img
            .pixels()
            .map(|p| pack_rgba(p[0], p[1], p[2], p[3]))
            .collect();
        Ok(Self { size, pixels })
    }

    /// Decode into an `image` RGBA buffer for display or encoding.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.size.width, self.size.height, |x, y| {
            Rgba(unpack_rgba(self.pixels[self.size.index(x, y)]))
        })
    }

    /// Interleaved 8-bit RGBA bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&p| unpack_rgba(p)).collect()
    }

    /// Nearest-neighbour resample to `size`.
    ///
    /// Returns a clone when the size already matches.
    pub fn resized_nearest(&self, size: ImageSize) -> Self {
        if size == self.size {
            return self.clone();
        }
        let scaled = imageops::resize(&self.to_image(), size.width, size.height, FilterType::Nearest);
        let pixels = scaled
            .pixels()
            .map(|p| pack_rgba(p[0], p[1], p[2], p[3]))
            .collect();
        Self { size, pixels }
    }

    /// Dimensions of the buffer.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Pixel at `(x, y)`, or `None` outside the buffer.
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if self.size.contains(x, y) {
            Some(self.pixels[self.size.index(x, y)])
        } else {
            None
        }
    }

    /// The packed pixels, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable access to the packed pixels.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Consume the buffer, returning its pixel vector.
    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pack_unpack_channels() {
        let p = pack_rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!(p, 0x1234_5678);
        assert_eq!(unpack_rgba(p), [0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn new_rejects_length_mismatch() {
        assert!(PixelBuffer::new(2, 2, vec![0; 3]).is_err());
        assert!(PixelBuffer::new(0, 2, vec![]).is_err());
        assert!(PixelBuffer::new(2, 2, vec![0; 4]).is_ok());
    }

    #[test]
    fn rgba8_bytes_are_row_major() {
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8];
        let buf = PixelBuffer::from_rgba8(2, 1, &bytes).unwrap();
        assert_eq!(buf.get(0, 0), Some(0x0102_0304));
        assert_eq!(buf.get(1, 0), Some(0x0506_0708));
        assert_eq!(buf.get(2, 0), None);
        assert_eq!(buf.to_rgba8(), bytes);
    }

    #[test]
    fn image_conversion_preserves_pixels() {
        let buf = PixelBuffer::new(3, 2, (0..6).map(|i| i * 0x0101_0101).collect()).unwrap();
        let img = buf.to_image();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(1, 1).0, [4, 4, 4, 4]);
        assert_eq!(PixelBuffer::from_image(&img).unwrap(), buf);
    }

    #[test]
    fn resize_to_same_size_is_identity() {
        let buf = PixelBuffer::new(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(buf.resized_nearest(buf.size()), buf);
    }

    #[test]
    fn upscale_solid_stays_solid() {
        let size = ImageSize::new(2, 2).unwrap();
        let buf = PixelBuffer::filled(size, 0xff00_00ff);
        let big = buf.resized_nearest(ImageSize::new(5, 7).unwrap());
        assert!(big.pixels().iter().all(|&p| p == 0xff00_00ff));
    }

    proptest! {
        #[test]
        fn resample_produces_requested_size(
            sw in 1u32..24, sh in 1u32..24, dw in 1u32..24, dh in 1u32..24,
        ) {
            let src = PixelBuffer::new(sw, sh, (0..sw * sh).collect()).unwrap();
            let target = ImageSize::new(dw, dh).unwrap();
            let out = src.resized_nearest(target);
            prop_assert_eq!(out.size(), target);
            prop_assert_eq!(out.pixels().len(), target.pixel_count());
        }
    }
}
