use crate::decoders::bmp::{BitmapFileHeader, BitmapInfoHeader};
use std::fmt::{Display, Formatter, UpperHex};

fn print_matrix<T: UpperHex>(f: &mut Formatter<'_>, values: &[T], width: usize) -> std::fmt::Result {
    if values.is_empty() {
        writeln!(f, "  []")?;
        return Ok(());
    }

    for chunk in values.chunks(width) {
        write!(f, " ")?;
        for value in chunk {
            write!(f, " {:04X}", value)?;
        }

        writeln!(f)?;
    }

    Ok(())
}

/// Parsed headers of a BMP file, printed by `--info`.
#[derive(Debug, Clone)]
pub struct BmpInfo {
    pub width: u32,
    pub height: u32,
    pub file_header: BitmapFileHeader,
    pub info_header: BitmapInfoHeader,
    /// Color table quantized to RGB565, empty for direct-color images
    pub palette: Vec<u16>,
}

impl Display for BmpInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let file = &self.file_header;
        let info = &self.info_header;

        writeln!(f, "Dimensions: {}x{}", self.width, self.height)?;
        writeln!(f, "====================")?;
        writeln!(f, "File header:")?;
        writeln!(f, "  Signature: {}", String::from_utf8_lossy(&file.signature))?;
        writeln!(f, "  File size: {}", file.file_size)?;
        writeln!(f, "  Reserved: {} {}", file.reserved1, file.reserved2)?;
        writeln!(f, "  Pixel offset: {}", file.pixel_offset)?;
        writeln!(f, "====================")?;
        writeln!(f, "Info header:")?;
        writeln!(f, "  Header size: {}", info.header_size)?;
        writeln!(f, "  Width: {}", info.width)?;
        writeln!(f, "  Height: {}", info.height)?;
        writeln!(f, "  Planes: {}", info.planes)?;
        writeln!(f, "  Bits per pixel: {}", info.bits_per_pixel)?;
        writeln!(f, "  Compression: {:?}", info.compression)?;
        writeln!(f, "  Image size: {}", info.image_size)?;
        writeln!(f, "  Resolution: {}x{} px/m", info.x_pixels_per_meter, info.y_pixels_per_meter)?;
        writeln!(f, "  Colors used: {}", info.colors_used)?;
        writeln!(f, "  Important colors: {}", info.important_colors)?;

        if !self.palette.is_empty() {
            writeln!(f, "====================")?;
            writeln!(f, "Color table ({} entries, RGB565):", self.palette.len())?;
            print_matrix(f, &self.palette, 8)?;
        }

        Ok(())
    }
}
