use crate::utils::color::{quantize565, quantize8565, ColorFormat};
use crate::utils::error::{ConvertError, ConvertResult};
use crate::{Image, PixelData};
use image::imageops::FilterType;
use image::{ImageReader, RgbaImage};
use log::debug;
use std::io::{BufRead, Seek};
use std::path::{Path, PathBuf};

/// How to resample an image before quantizing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resize {
    /// Multiply both dimensions, truncating toward zero
    Scale(f64),
    /// Set the dimensions directly
    Exact(u32, u32),
}

impl Resize {
    pub fn target(&self, width: u32, height: u32) -> ConvertResult<(u32, u32)> {
        let (new_width, new_height) = match *self {
            Resize::Scale(factor) => {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(ConvertError::InvalidArgument(format!(
                        "scale factor must be positive, got {}",
                        factor
                    )));
                }

                ((width as f64 * factor) as u32, (height as f64 * factor) as u32)
            }
            Resize::Exact(w, h) => (w, h),
        };

        if new_width == 0 || new_height == 0 {
            return Err(ConvertError::InvalidDimensions {
                width: new_width,
                height: new_height,
            });
        }

        Ok((new_width, new_height))
    }
}

/// Decodes any format supported by the `image` crate into RGBA8 and
/// quantizes the result.
pub struct ExternalDecoder<R: BufRead + Seek> {
    reader: R,
    resize: Option<Resize>,
    save_path: Option<PathBuf>,
}

impl<R: BufRead + Seek> ExternalDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            resize: None,
            save_path: None,
        }
    }

    pub fn with_resize(mut self, resize: Option<Resize>) -> Self {
        self.resize = resize;
        self
    }

    /// Saves the (possibly resized) RGBA image to `path` before quantizing.
    pub fn with_save_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        self.save_path = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    pub fn decode_rgba(self) -> ConvertResult<RgbaImage> {
        let reader = ImageReader::new(self.reader).with_guessed_format()?;
        debug!("External decoder guessed format {:?}", reader.format());

        let rgba = reader.decode()?.to_rgba8();

        resample(rgba, self.resize, self.save_path.as_deref())
    }

    pub fn decode(self, format: ColorFormat) -> ConvertResult<Image> {
        let rgba = self.decode_rgba()?;
        Ok(quantize_rgba(&rgba, format))
    }
}

/// Applies the optional resize, then the optional save, to a decoded image.
pub fn resample(mut rgba: RgbaImage, resize: Option<Resize>, save_path: Option<&Path>) -> ConvertResult<RgbaImage> {
    if let Some(resize) = resize {
        let (width, height) = resize.target(rgba.width(), rgba.height())?;
        debug!("Resizing {}x{} to {}x{}", rgba.width(), rgba.height(), width, height);

        rgba = image::imageops::resize(&rgba, width, height, FilterType::CatmullRom);
    }

    if let Some(path) = save_path {
        rgba.save(path)?;
        debug!("Saved resized image to {}", path.display());
    }

    Ok(rgba)
}

/// Quantizes every pixel of an RGBA image, top row first.
pub fn quantize_rgba(rgba: &RgbaImage, format: ColorFormat) -> Image {
    let pixels = match format {
        ColorFormat::Rgb565 => PixelData::Rgb565(
            rgba.pixels()
                .map(|p| {
                    let [r, g, b, _] = p.0;
                    quantize565(r, g, b)
                })
                .collect(),
        ),
        ColorFormat::Argb8565 => PixelData::Argb8565(
            rgba.pixels()
                .map(|p| {
                    let [r, g, b, a] = p.0;
                    quantize8565(r, g, b, a)
                })
                .collect(),
        ),
    };

    Image::from_pixels(rgba.width(), rgba.height(), pixels)
}
