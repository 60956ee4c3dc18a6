use crate::utils::color::{expand565, ColorFormat};
use crate::utils::error::{ConvertError, ConvertResult};
use image::RgbaImage;

#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    Rgb565(Vec<u16>),
    Argb8565(Vec<u32>),
}

impl PixelData {
    pub fn color_format(&self) -> ColorFormat {
        match self {
            PixelData::Rgb565(_) => ColorFormat::Rgb565,
            PixelData::Argb8565(_) => ColorFormat::Argb8565,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PixelData::Rgb565(pixels) => pixels.len(),
            PixelData::Argb8565(pixels) => pixels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the pixel at `index` widened to `u32`.
    pub fn get(&self, index: usize) -> Option<u32> {
        match self {
            PixelData::Rgb565(pixels) => pixels.get(index).map(|&p| p as u32),
            PixelData::Argb8565(pixels) => pixels.get(index).copied(),
        }
    }

    /// Iterates over all pixels widened to `u32`, in storage order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            PixelData::Rgb565(pixels) => Box::new(pixels.iter().map(|&p| p as u32)),
            PixelData::Argb8565(pixels) => Box::new(pixels.iter().copied()),
        }
    }

    /// Expands the packed pixels back to RGBA8 bytes.
    pub fn as_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() * 4);

        for pixel in self.iter() {
            let (r, g, b) = expand565((pixel & 0xFFFF) as u16);
            let a = match self {
                PixelData::Rgb565(_) => 255,
                PixelData::Argb8565(_) => (pixel >> 16) as u8,
            };

            out.extend_from_slice(&[r, g, b, a]);
        }

        out
    }
}

/// A decoded image: `width * height` packed pixels, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: PixelData,
}

impl Image {
    pub fn from_pixels(width: u32, height: u32, pixels: PixelData) -> Image {
        Image { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    /// Converts the pixels to `format`. RGB565 pixels become fully opaque
    /// ARGB8565 pixels, ARGB8565 pixels lose their alpha.
    pub fn with_color_format(self, format: ColorFormat) -> Image {
        let (width, height) = (self.width, self.height);
        let pixels = match (self.pixels, format) {
            (PixelData::Rgb565(pixels), ColorFormat::Argb8565) => {
                PixelData::Argb8565(pixels.into_iter().map(|p| 0xFF_0000 | p as u32).collect())
            }
            (PixelData::Argb8565(pixels), ColorFormat::Rgb565) => {
                PixelData::Rgb565(pixels.into_iter().map(|p| (p & 0xFFFF) as u16).collect())
            }
            (pixels, _) => pixels,
        };

        Image { width, height, pixels }
    }

    /// Expands the image to RGBA8 so it can be resampled or saved.
    pub fn to_rgba_image(&self) -> ConvertResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.as_rgba8()).ok_or(
            ConvertError::InvalidDimensions {
                width: self.width,
                height: self.height,
            },
        )
    }

    pub fn color_format(&self) -> ColorFormat {
        self.pixels.color_format()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Returns the pixel at column `x` of row `y` (row 0 is the top row).
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }

        self.pixels.get(y as usize * self.width as usize + x as usize)
    }

    /// Iterates over the image row by row, top row first.
    pub fn rows(&self) -> impl Iterator<Item = Vec<u32>> + '_ {
        let width = self.width as usize;
        let all: Vec<u32> = self.pixels.iter().collect();

        (0..self.height as usize).map(move |y| all[y * width..(y + 1) * width].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_lookup_is_row_major() {
        let image = Image::from_pixels(2, 2, PixelData::Rgb565(vec![1, 2, 3, 4]));

        assert_eq!(image.pixel(0, 0), Some(1));
        assert_eq!(image.pixel(1, 0), Some(2));
        assert_eq!(image.pixel(0, 1), Some(3));
        assert_eq!(image.pixel(2, 0), None);
        assert_eq!(image.rows().collect::<Vec<_>>(), vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn color_format_conversion() {
        let image = Image::from_pixels(2, 1, PixelData::Rgb565(vec![0xF800, 0x001F]));

        let argb = image.with_color_format(ColorFormat::Argb8565);
        assert_eq!(argb.pixels(), &PixelData::Argb8565(vec![0xFFF800, 0xFF001F]));

        let rgb = argb.with_color_format(ColorFormat::Rgb565);
        assert_eq!(rgb.pixels(), &PixelData::Rgb565(vec![0xF800, 0x001F]));
    }

    #[test]
    fn rgba_image_has_image_dimensions() {
        let image = Image::from_pixels(2, 1, PixelData::Argb8565(vec![0x40F800, 0xFF07E0]));
        let rgba = image.to_rgba_image().unwrap();

        assert_eq!(rgba.dimensions(), (2, 1));
        assert_eq!(rgba.get_pixel(0, 0).0, [255, 0, 0, 0x40]);
        assert_eq!(rgba.get_pixel(1, 0).0, [0, 255, 0, 0xFF]);

        let short = Image::from_pixels(3, 1, PixelData::Rgb565(vec![0]));
        assert!(short.to_rgba_image().is_err());
    }

    #[test]
    fn rgba8_expansion_keeps_alpha() {
        let pixels = PixelData::Argb8565(vec![0x80F800]);
        assert_eq!(pixels.as_rgba8(), vec![255, 0, 0, 0x80]);

        let pixels = PixelData::Rgb565(vec![0x001F]);
        assert_eq!(pixels.as_rgba8(), vec![0, 0, 255, 255]);
    }
}
