use crate::utils::error::{ConvertError, ConvertResult};
use crate::Image;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes images as C headers holding one `const` array per image.
pub struct HeaderWriter {}

impl HeaderWriter {
    pub fn write_file<P: AsRef<Path>>(output_path: P, image: &Image, name: &str) -> ConvertResult<()> {
        let mut file = BufWriter::new(File::create(output_path)?);
        HeaderWriter::write(&mut file, image, name)?;
        file.flush()?;

        Ok(())
    }

    /// Writes `image` as a header with include guard, width/height constants,
    /// and the pixel array, one image row per line.
    pub fn write<W: Write>(out: &mut W, image: &Image, name: &str) -> ConvertResult<()> {
        HeaderWriter::validate_pixel_count(image)?;

        let name = c_identifier(name);
        let guard = format!("__{}_H", name.to_uppercase());
        let format = image.color_format();
        let digits = format.hex_digits();

        writeln!(out, "#ifndef {}", guard)?;
        writeln!(out, "#define {}", guard)?;
        writeln!(out)?;
        writeln!(out, "#include <stdint.h>")?;
        writeln!(out)?;
        writeln!(out, "const uint16_t {}_width = {};", name, image.width())?;
        writeln!(out, "const uint16_t {}_height = {};", name, image.height())?;
        writeln!(out)?;
        writeln!(out, "const {} {}[] = {{", format.c_type(), name)?;

        for row in image.rows() {
            let line = row
                .iter()
                .map(|px| format!("0x{:0width$X},", px, width = digits))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(out, "\t{}", line)?;
        }

        writeln!(out, "}};")?;
        writeln!(out)?;
        writeln!(out, "#endif")?;

        Ok(())
    }

    fn validate_pixel_count(image: &Image) -> ConvertResult<()> {
        let expected = image.width() as usize * image.height() as usize;

        if image.len() != expected {
            return Err(ConvertError::InvalidArgument(format!(
                "invalid pixel data size for {}x{} image: expected {} pixels, got {}",
                image.width(),
                image.height(),
                expected,
                image.len()
            )));
        }

        if image.width() > u16::MAX as u32 || image.height() > u16::MAX as u32 {
            return Err(ConvertError::InvalidDimensions {
                width: image.width(),
                height: image.height(),
            });
        }

        Ok(())
    }
}

/// Turns an arbitrary name (usually a file stem) into a C identifier:
/// lower case, every character outside `[a-z0-9_]` replaced by `_`, and an
/// `_` prefix when it would start with a digit.
pub fn c_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }

    ident
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelData;

    #[test]
    fn identifiers_are_sanitized() {
        assert_eq!(c_identifier("pacman"), "pacman");
        assert_eq!(c_identifier("Ghost-Red.v2"), "ghost_red_v2");
        assert_eq!(c_identifier("8ball"), "_8ball");
        assert_eq!(c_identifier(""), "_");
    }

    #[test]
    fn writes_rgb565_header() {
        let image = Image::from_pixels(2, 2, PixelData::Rgb565(vec![0xF800, 0x07E0, 0x001F, 0xFFFF]));
        let mut out = Vec::new();

        HeaderWriter::write(&mut out, &image, "Tile").unwrap();

        let expected = "#ifndef __TILE_H\n\
                        #define __TILE_H\n\
                        \n\
                        #include <stdint.h>\n\
                        \n\
                        const uint16_t tile_width = 2;\n\
                        const uint16_t tile_height = 2;\n\
                        \n\
                        const uint16_t tile[] = {\n\
                        \t0xF800, 0x07E0,\n\
                        \t0x001F, 0xFFFF,\n\
                        };\n\
                        \n\
                        #endif\n";

        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn writes_argb8565_as_uint32() {
        let image = Image::from_pixels(1, 1, PixelData::Argb8565(vec![0x80F800]));
        let mut out = Vec::new();

        HeaderWriter::write(&mut out, &image, "dot").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("const uint32_t dot[] = {\n\t0x80F800,\n};"));
    }

    #[test]
    fn rejects_mismatched_pixel_count() {
        let image = Image::from_pixels(3, 1, PixelData::Rgb565(vec![0, 0]));
        assert!(HeaderWriter::write(&mut Vec::new(), &image, "bad").is_err());
    }
}
