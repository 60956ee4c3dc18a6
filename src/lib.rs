mod decoders;
mod utils;

pub use decoders::bmp::{
    BitmapCompression, BitmapFileHeader, BitmapInfoHeader, BmpDecoder, RowGeometry, FILE_HEADER_SIZE,
    INFO_HEADER_SIZE,
};
pub use decoders::external::{quantize_rgba, resample, ExternalDecoder, Resize};
pub use utils::color::{expand565, quantize565, quantize8565, ColorFormat};
pub use utils::error::{ConvertError, ConvertResult};
pub use utils::image::{Image, PixelData};
pub use utils::info::BmpInfo;
pub use utils::logger::Logger;
pub use utils::writer::{c_identifier, HeaderWriter};

use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Container format detected from the first bytes of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Bmp,
    Png,
    Jpeg,
    Gif,
    Unknown,
}

/// Settings of one conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Output color format. `None` picks RGB565 for BMP input and ARGB8565
    /// for everything else.
    pub format: Option<ColorFormat>,
    pub resize: Option<Resize>,
    /// Where to store the resized RGBA image, if anywhere
    pub save_resized: Option<PathBuf>,
}

pub struct Converter<R: BufRead + Seek> {
    reader: R,
    format: SourceFormat,
}

impl Converter<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> ConvertResult<Self> {
        let file = File::open(path)?;
        Converter::new(BufReader::new(file))
    }
}

impl<R: BufRead + Seek> Converter<R> {
    pub fn new(mut reader: R) -> ConvertResult<Converter<R>> {
        let format = Converter::try_guess_format(&mut reader)?;
        debug!("Detected source format {:?}", format);

        Ok(Converter { reader, format })
    }

    pub fn source_format(&self) -> SourceFormat {
        self.format
    }

    /// Color format `decode` produces for the given options.
    pub fn output_format(&self, options: &ConvertOptions) -> ColorFormat {
        options.format.unwrap_or(match self.format {
            SourceFormat::Bmp => ColorFormat::Rgb565,
            _ => ColorFormat::Argb8565,
        })
    }

    /// Decodes the whole input into packed pixels.
    ///
    /// BMP input always goes through [`BmpDecoder`]. ARGB8565 output from a
    /// BMP is fully opaque, and resizing works on the RGBA expansion of the
    /// decoded pixels. Every other container goes through [`ExternalDecoder`].
    pub fn decode(&mut self, options: &ConvertOptions) -> ConvertResult<Image> {
        let color_format = self.output_format(options);
        self.reader.seek(SeekFrom::Start(0))?;

        if self.format != SourceFormat::Bmp {
            debug!("Using the external decoder for {:?} -> {:?}", self.format, color_format);
            return ExternalDecoder::new(&mut self.reader)
                .with_resize(options.resize)
                .with_save_path(options.save_resized.as_ref())
                .decode(color_format);
        }

        debug!("Using the BMP decoder -> {:?}", color_format);
        let image = BmpDecoder::new(&mut self.reader).decode()?;

        if options.resize.is_none() && options.save_resized.is_none() {
            return Ok(image.with_color_format(color_format));
        }

        let rgba = resample(image.to_rgba_image()?, options.resize, options.save_resized.as_deref())?;
        Ok(quantize_rgba(&rgba, color_format))
    }

    /// Parses the BMP headers without decoding any pixel.
    pub fn bmp_info(&mut self) -> ConvertResult<BmpInfo> {
        if self.format != SourceFormat::Bmp {
            return Err(ConvertError::InvalidArgument(format!(
                "header info is only available for BMP files, got {:?}",
                self.format
            )));
        }

        self.reader.seek(SeekFrom::Start(0))?;

        let mut decoder = BmpDecoder::new(&mut self.reader);
        decoder.read_headers()?;
        decoder
            .get_info()
            .ok_or_else(|| ConvertError::format("missing bitmap headers"))
    }

    fn try_guess_format(reader: &mut R) -> ConvertResult<SourceFormat> {
        let mut header = Vec::with_capacity(8);
        reader.by_ref().take(8).read_to_end(&mut header)?;
        reader.seek(SeekFrom::Start(0))?;

        // PNG
        if header.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Ok(SourceFormat::Png);
        }

        // JPEG
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Ok(SourceFormat::Jpeg);
        }

        // GIF87a and GIF89a
        if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
            return Ok(SourceFormat::Gif);
        }

        // BMP
        if header.starts_with(b"BM") {
            return Ok(SourceFormat::Bmp);
        }

        Ok(SourceFormat::Unknown)
    }
}
