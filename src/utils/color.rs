//! Packing of 8-bit-per-channel colors into the compact formats consumed by
//! 16-bit LCD controllers.
//!
//! - RGB565: `RRRRR GGGGGG BBBBB`, 16 bits
//! - ARGB8565: `AAAAAAAA RRRRR GGGGGG BBBBB`, 24 bits stored in a `u32`

/// Output color format of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    Rgb565,
    Argb8565,
}

impl ColorFormat {
    /// Name of the C integer type the format is stored in.
    pub fn c_type(&self) -> &'static str {
        match self {
            ColorFormat::Rgb565 => "uint16_t",
            ColorFormat::Argb8565 => "uint32_t",
        }
    }

    /// Number of hex digits needed to print one pixel.
    pub fn hex_digits(&self) -> usize {
        match self {
            ColorFormat::Rgb565 => 4,
            ColorFormat::Argb8565 => 6,
        }
    }
}

/// Truncates each channel to its high bits and packs them as RGB565.
#[inline]
pub fn quantize565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r >> 3) as u16 & 0x1F;
    let g6 = (g >> 2) as u16 & 0x3F;
    let b5 = (b >> 3) as u16 & 0x1F;

    (r5 << 11) | (g6 << 5) | b5
}

/// Packs an RGBA color as ARGB8565. Alpha is stored unscaled in bits 16..24.
#[inline]
pub fn quantize8565(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 16) | quantize565(r, g, b) as u32
}

/// Expands an RGB565 color back to 8 bits per channel by replicating the
/// top bits into the vacated low bits.
#[inline]
pub fn expand565(color: u16) -> (u8, u8, u8) {
    let r5 = ((color >> 11) & 0x1F) as u8;
    let g6 = ((color >> 5) & 0x3F) as u8;
    let b5 = (color & 0x1F) as u8;

    ((r5 << 3) | (r5 >> 2), (g6 << 2) | (g6 >> 4), (b5 << 3) | (b5 >> 2))
}
