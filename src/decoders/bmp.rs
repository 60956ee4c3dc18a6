use crate::utils::bytereader::ByteReader;
use crate::utils::color::quantize565;
use crate::utils::error::{ConvertError, ConvertResult};
use crate::utils::info::BmpInfo;
use crate::utils::traits::SafeAccess;
use crate::{Image, PixelData};
use log::{debug, warn};
use std::fmt::Debug;
use std::io::{Read, Seek};

pub const FILE_HEADER_SIZE: u32 = 14;
pub const INFO_HEADER_SIZE: u32 = 40;

const SIGNATURE: [u8; 2] = *b"BM";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BitmapCompression {
    BiRgb,
    BiRle8,
    BiRle4,
    BiBitfields,
    BiJpeg,
    BiPng,
    BiAlphaBitfields,
    Unknown(u32),
}

impl BitmapCompression {
    fn from_u32(value: u32) -> Self {
        match value {
            0 => BitmapCompression::BiRgb,
            1 => BitmapCompression::BiRle8,
            2 => BitmapCompression::BiRle4,
            3 => BitmapCompression::BiBitfields,
            4 => BitmapCompression::BiJpeg,
            5 => BitmapCompression::BiPng,
            6 => BitmapCompression::BiAlphaBitfields,
            other => BitmapCompression::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitmapFileHeader {
    pub signature: [u8; 2],
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitmapInfoHeader {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: BitmapCompression,
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub important_colors: u32,
}

/// Byte layout of one stored row.
///
/// `stride` is the number of meaningful bytes, `padded` the number of bytes the
/// row occupies on disk. `padded` is always a multiple of 4 and exceeds
/// `stride` by at most 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowGeometry {
    pub stride: usize,
    pub padded: usize,
}

impl RowGeometry {
    pub fn new(width: u32, bits_per_pixel: u16) -> ConvertResult<Self> {
        let bits = (width as u64)
            .checked_mul(bits_per_pixel as u64)
            .ok_or_else(|| ConvertError::format("row size overflows"))?;
        let stride = usize::try_from(bits.div_ceil(8))
            .map_err(|_| ConvertError::format("row size overflows"))?;
        let padded = stride
            .checked_add(3)
            .map(|s| s & !3)
            .ok_or_else(|| ConvertError::format("row size overflows"))?;

        Ok(RowGeometry { stride, padded })
    }

    pub fn padding(&self) -> usize {
        self.padded - self.stride
    }
}

pub struct BmpDecoder<R: Read + Seek> {
    width: u32,
    height: u32,
    file_header: Option<BitmapFileHeader>,
    info_header: Option<BitmapInfoHeader>,
    palette: Vec<u16>,
    reader: ByteReader<R>,
}

impl<R: Read + Seek> Debug for BmpDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BmpDecoder")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("file_header", &self.file_header)
            .field("info_header", &self.info_header)
            .field("palette_len", &self.palette.len())
            .finish()
    }
}

impl<R: Read + Seek> BmpDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            width: 0,
            height: 0,
            file_header: None,
            info_header: None,
            palette: Vec::new(),
            reader: ByteReader::new(reader),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits_per_pixel(&self) -> Option<u16> {
        self.info_header.as_ref().map(|h| h.bits_per_pixel)
    }

    /// Returns a snapshot of the parsed headers, or `None` before
    /// [`read_headers`](Self::read_headers) succeeded.
    pub fn get_info(&self) -> Option<BmpInfo> {
        Some(BmpInfo {
            width: self.width,
            height: self.height,
            file_header: self.file_header.clone()?,
            info_header: self.info_header.clone()?,
            palette: self.palette.clone(),
        })
    }

    /// Reads and validates the file header, the info header and, for indexed
    /// bit depths, the color table. Calling it again is a no-op.
    pub fn read_headers(&mut self) -> ConvertResult<()> {
        if self.info_header.is_some() {
            return Ok(());
        }

        let file_header = self.read_file_header()?;
        let info_header = self.read_info_header()?;

        debug!(
            "BMP header: {}x{}, {} bpp, pixel data at offset {}",
            info_header.width, info_header.height, info_header.bits_per_pixel, file_header.pixel_offset
        );

        self.file_header = Some(file_header);
        self.info_header = Some(info_header);

        if let Some(bpp @ (1 | 4 | 8)) = self.bits_per_pixel() {
            // The color table sits right after the info header
            self.palette = self.read_color_table(bpp)?;
            debug!("Read color table with {} entries", self.palette.len());
        }

        Ok(())
    }

    fn read_file_header(&mut self) -> ConvertResult<BitmapFileHeader> {
        let signature = self.reader.read_array::<2>("file header signature")?;

        if signature != SIGNATURE {
            return Err(ConvertError::format(format!(
                "invalid signature 0x{:02X}{:02X}, expected \"BM\"",
                signature[0], signature[1]
            )));
        }

        Ok(BitmapFileHeader {
            signature,
            file_size: self.reader.read_u32()?,
            reserved1: self.reader.read_u16()?,
            reserved2: self.reader.read_u16()?,
            pixel_offset: self.reader.read_u32()?,
        })
    }

    fn read_info_header(&mut self) -> ConvertResult<BitmapInfoHeader> {
        let header = BitmapInfoHeader {
            header_size: self.reader.read_u32()?,
            width: self.reader.read_i32()?,
            height: self.reader.read_i32()?,
            planes: self.reader.read_u16()?,
            bits_per_pixel: self.reader.read_u16()?,
            compression: BitmapCompression::from_u32(self.reader.read_u32()?),
            image_size: self.reader.read_u32()?,
            x_pixels_per_meter: self.reader.read_i32()?,
            y_pixels_per_meter: self.reader.read_i32()?,
            colors_used: self.reader.read_u32()?,
            important_colors: self.reader.read_u32()?,
        };

        if header.header_size != INFO_HEADER_SIZE {
            warn!(
                "Info header declares {} bytes, only the first {} are interpreted",
                header.header_size, INFO_HEADER_SIZE
            );
        }

        if header.compression != BitmapCompression::BiRgb {
            warn!("Compression {:?} is not supported, decoding as uncompressed", header.compression);
        }

        if header.height < 0 {
            warn!("Negative height {} ignored, rows are read bottom-up", header.height);
        }

        self.width = header.width.unsigned_abs();
        self.height = header.height.unsigned_abs();

        if self.width == 0 || self.height == 0 {
            return Err(ConvertError::format(format!(
                "image has no pixels ({}x{})",
                self.width, self.height
            )));
        }

        Ok(header)
    }

    /// Reads exactly `2^bpp` (blue, green, red, reserved) records and
    /// quantizes each one to RGB565.
    fn read_color_table(&mut self, bits_per_pixel: u16) -> ConvertResult<Vec<u16>> {
        let num_colors = 1usize << bits_per_pixel;
        let mut palette = Vec::with_capacity(num_colors);

        for _ in 0..num_colors {
            let [blue, green, red, _reserved] = self.reader.read_array::<4>("color table")?;
            palette.push(quantize565(red, green, blue));
        }

        Ok(palette)
    }

    /// Fails early when the stream cannot hold `height` rows, so that no
    /// output buffer is allocated for a truncated file.
    fn check_pixel_data_size(&mut self, geometry: &RowGeometry) -> ConvertResult<usize> {
        let pixel_count = (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or_else(|| ConvertError::format("pixel count overflows"))?;

        // the last row is allowed to miss its padding
        let required = (geometry.padded as u64)
            .checked_mul(self.height as u64 - 1)
            .and_then(|n| n.checked_add(geometry.stride as u64))
            .ok_or_else(|| ConvertError::format("pixel data size overflows"))?;

        let available = self.reader.bytes_left()?;
        if available < required {
            return Err(ConvertError::format(format!(
                "truncated pixel data: {} bytes required, {} available",
                required, available
            )));
        }

        Ok(pixel_count)
    }

    /// Reads `height` rows of `geometry.stride` bytes, skipping the padding
    /// after each one, and hands every row to `decode_row`.
    fn read_rows<F>(&mut self, geometry: RowGeometry, mut decode_row: F) -> ConvertResult<Vec<u16>>
    where
        F: FnMut(&[u8], &mut Vec<u16>) -> ConvertResult<()>,
    {
        let pixel_count = self.check_pixel_data_size(&geometry)?;
        let mut pixels = Vec::with_capacity(pixel_count);
        let mut row = vec![0u8; geometry.stride];

        debug!(
            "Reading {} rows of {} bytes ({} padded) at offset {}",
            self.height,
            geometry.stride,
            geometry.padded,
            self.reader.position()?
        );

        for _ in 0..self.height {
            self.reader.read_exact(&mut row, "pixel row")?;
            self.reader.skip(geometry.padding() as u64)?;

            decode_row(&row, &mut pixels)?;
        }

        Self::flip_v(&mut pixels, self.width as usize, self.height as usize);

        Ok(pixels)
    }

    /// Reverses the row order in place, turning bottom-up storage into a
    /// top-down image.
    fn flip_v<T>(data: &mut [T], width: usize, height: usize) {
        for y in 0..height / 2 {
            let (top, bottom) = data.split_at_mut((height - 1 - y) * width);
            top[y * width..(y + 1) * width].swap_with_slice(&mut bottom[..width]);
        }
    }

    fn decode_indexed(&mut self, bits_per_pixel: u16) -> ConvertResult<Vec<u16>> {
        let geometry = RowGeometry::new(self.width, bits_per_pixel)?;
        let width = self.width as usize;
        let palette = std::mem::take(&mut self.palette);
        // grows on the first row, after the data size was checked
        let mut indices = Vec::new();

        let result = self.read_rows(geometry, |row, pixels| {
            unpack_indices(row, bits_per_pixel, width, &mut indices);

            for &index in &indices {
                let &color = palette.get_safe(index as usize).map_err(|_| {
                    ConvertError::format(format!("palette index {} out of range ({} colors)", index, palette.len()))
                })?;
                pixels.push(color);
            }

            Ok(())
        });

        self.palette = palette;
        result
    }

    fn decode_24bit(&mut self) -> ConvertResult<Vec<u16>> {
        let geometry = RowGeometry::new(self.width, 24)?;

        self.read_rows(geometry, |row, pixels| {
            // Stored as (blue, green, red)
            pixels.extend(row.chunks_exact(3).map(|bgr| quantize565(bgr[2], bgr[1], bgr[0])));
            Ok(())
        })
    }

    fn decode_32bit(&mut self) -> ConvertResult<Vec<u16>> {
        let geometry = RowGeometry::new(self.width, 32)?;

        self.read_rows(geometry, |row, pixels| {
            // Read as (red, green, blue, alpha); alpha is not kept
            pixels.extend(row.chunks_exact(4).map(|rgba| quantize565(rgba[0], rgba[1], rgba[2])));
            Ok(())
        })
    }

    pub fn decode(&mut self) -> ConvertResult<Image> {
        self.read_headers()?;

        let (bits_per_pixel, pixel_offset) = match (&self.info_header, &self.file_header) {
            (Some(info), Some(file)) => (info.bits_per_pixel, file.pixel_offset),
            _ => return Err(ConvertError::format("missing bitmap headers")),
        };

        let pixels = match bits_per_pixel {
            // Pixel rows follow the color table directly
            1 | 4 | 8 => self.decode_indexed(bits_per_pixel)?,
            24 => {
                self.reader.seek_to(pixel_offset as u64)?;
                self.decode_24bit()?
            }
            32 => {
                self.reader.seek_to(pixel_offset as u64)?;
                self.decode_32bit()?
            }
            other => {
                return Err(ConvertError::format(format!("unsupported bit depth {}", other)));
            }
        };

        Ok(Image::from_pixels(self.width, self.height, PixelData::Rgb565(pixels)))
    }
}

/// Splits one row of packed palette indices, most significant bits first,
/// and keeps only the first `width` of them.
///
/// A 1-bit byte yields 8 indices (bit 7 down to bit 0), a 4-bit byte 2
/// (high nibble, then low nibble), an 8-bit byte is the index itself.
pub(crate) fn unpack_indices(row: &[u8], bits_per_pixel: u16, width: usize, out: &mut Vec<u8>) {
    out.clear();

    match bits_per_pixel {
        1 => {
            for &byte in row {
                out.extend((0..8).rev().map(|shift| (byte >> shift) & 0x01));
            }
        }
        4 => {
            for &byte in row {
                out.push((byte >> 4) & 0x0F);
                out.push(byte & 0x0F);
            }
        }
        _ => out.extend_from_slice(row),
    }

    out.truncate(width);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unpack(row: &[u8], bpp: u16, width: usize) -> Vec<u8> {
        let mut out = Vec::new();
        unpack_indices(row, bpp, width, &mut out);
        out
    }

    #[test]
    fn one_bit_indices_are_msb_first_and_truncated() {
        assert_eq!(unpack(&[0b1011_0000], 1, 3), vec![1, 0, 1]);
        assert_eq!(unpack(&[0b1011_0000], 1, 8), vec![1, 0, 1, 1, 0, 0, 0, 0]);
        assert_eq!(unpack(&[0xFF, 0b1000_0000], 1, 9), vec![1; 9]);
    }

    #[test]
    fn four_bit_indices_are_high_nibble_first() {
        assert_eq!(unpack(&[0xA3], 4, 2), vec![0xA, 0x3]);
        assert_eq!(unpack(&[0xA3, 0x5F], 4, 3), vec![0xA, 0x3, 0x5]);
    }

    #[test]
    fn eight_bit_indices_are_the_bytes() {
        assert_eq!(unpack(&[7, 200, 13], 8, 3), vec![7, 200, 13]);
    }

    #[test]
    fn row_geometry_pads_to_four_bytes() {
        assert_eq!(RowGeometry::new(3, 24).unwrap(), RowGeometry { stride: 9, padded: 12 });
        assert_eq!(RowGeometry::new(34, 4).unwrap(), RowGeometry { stride: 18, padded: 20 });
        assert_eq!(RowGeometry::new(3, 1).unwrap(), RowGeometry { stride: 1, padded: 4 });
        assert_eq!(RowGeometry::new(5, 32).unwrap(), RowGeometry { stride: 20, padded: 20 });

        for width in 1..64 {
            for bpp in [1, 4, 8, 24, 32] {
                let geometry = RowGeometry::new(width, bpp).unwrap();
                assert_eq!(geometry.padded % 4, 0);
                assert!(geometry.padding() <= 3);
            }
        }
    }

    #[test]
    fn flip_v_reverses_rows() {
        let mut data = vec![1, 1, 2, 2, 3, 3];
        BmpDecoder::<std::io::Cursor<Vec<u8>>>::flip_v(&mut data, 2, 3);
        assert_eq!(data, vec![3, 3, 2, 2, 1, 1]);

        let mut data = vec![1, 2, 3, 4];
        BmpDecoder::<std::io::Cursor<Vec<u8>>>::flip_v(&mut data, 1, 4);
        assert_eq!(data, vec![4, 3, 2, 1]);
    }
}
