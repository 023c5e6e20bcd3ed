//! # Conversión de Imágenes a ASCII
//! src/image/mod.rs
//!
//! Implementa la función de conversión que usa el motor de tareas:
//!
//! ```text
//! bytes PNG → decode → LumaImage → to_ascii → String
//! ```
//!
//! Cada pixel se convierte en un caracter de la rampa ` .,:;i1tfLCG08@`
//! (oscuro → claro); las filas se separan con `\n`.

pub mod png;

pub use png::{DecodeError, DEFAULT_MAX_DECODED_BYTES};

/// Rampa de caracteres por defecto, de oscuro a claro
pub const DEFAULT_RAMP: &str = " .,:;i1tfLCG08@";

/// Imagen en escala de grises (un byte por pixel)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl LumaImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Error del paso de conversión a ASCII
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    PixelCount { expected: usize, actual: usize },

    #[error("character ramp is empty")]
    EmptyRamp,
}

/// Función de conversión usada por las tareas.
///
/// Debe ser pura y segura de llamar concurrentemente desde varias tareas.
pub trait ImageConverter: Send + Sync {
    /// Decodifica los bytes de entrada a una representación interna
    fn decode(&self, bytes: &[u8]) -> Result<LumaImage, DecodeError>;

    /// Convierte la imagen decodificada a texto ASCII
    fn to_ascii(&self, image: &LumaImage) -> Result<String, ConvertError>;
}

/// Convertidor PNG → ASCII, un caracter por pixel
#[derive(Debug, Clone)]
pub struct AsciiConverter {
    ramp: Vec<char>,
    max_decoded_bytes: usize,
}

impl AsciiConverter {
    pub fn new() -> Self {
        Self::with_ramp(DEFAULT_RAMP)
    }

    /// Usa una rampa personalizada (primer caracter = más oscuro)
    pub fn with_ramp(ramp: &str) -> Self {
        Self {
            ramp: ramp.chars().collect(),
            max_decoded_bytes: DEFAULT_MAX_DECODED_BYTES,
        }
    }

    /// Tope de bytes inflados por imagen; más grande → `DecodeError::Unsupported`
    pub fn with_max_decoded_bytes(mut self, limit: usize) -> Self {
        self.max_decoded_bytes = limit;
        self
    }

    fn char_for(&self, luma: u8) -> char {
        let last = self.ramp.len() - 1;
        let index = (luma as usize * last + 127) / 255;
        self.ramp[index.min(last)]
    }
}

impl Default for AsciiConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageConverter for AsciiConverter {
    fn decode(&self, bytes: &[u8]) -> Result<LumaImage, DecodeError> {
        png::decode_with_limit(bytes, self.max_decoded_bytes)
    }

    fn to_ascii(&self, image: &LumaImage) -> Result<String, ConvertError> {
        if self.ramp.is_empty() {
            return Err(ConvertError::EmptyRamp);
        }

        let width = image.width() as usize;
        let height = image.height() as usize;
        let expected = width * height;
        if image.pixels().len() != expected {
            return Err(ConvertError::PixelCount {
                expected,
                actual: image.pixels().len(),
            });
        }
        if expected == 0 {
            return Ok(String::new());
        }

        let mut out = String::with_capacity((width + 1) * height);
        for (i, row) in image.pixels().chunks(width).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.extend(row.iter().map(|&luma| self.char_for(luma)));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_extremes() {
        let converter = AsciiConverter::new();
        assert_eq!(converter.char_for(0), ' ');
        assert_eq!(converter.char_for(255), '@');
    }

    #[test]
    fn test_to_ascii_rows() {
        let converter = AsciiConverter::new();
        let image = LumaImage::new(3, 2, vec![0, 128, 255, 255, 128, 0]);

        let text = converter.to_ascii(&image).unwrap();
        let rows: Vec<&str> = text.split('\n').collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].chars().count(), 3);
        assert!(rows[0].starts_with(' '));
        assert!(rows[0].ends_with('@'));
        assert!(rows[1].starts_with('@'));
    }

    #[test]
    fn test_to_ascii_pixel_count_mismatch() {
        let converter = AsciiConverter::new();
        let image = LumaImage::new(4, 4, vec![0; 3]);
        assert!(matches!(
            converter.to_ascii(&image),
            Err(ConvertError::PixelCount { expected: 16, actual: 3 })
        ));
    }

    #[test]
    fn test_empty_ramp() {
        let converter = AsciiConverter::with_ramp("");
        let image = LumaImage::new(1, 1, vec![0]);
        assert_eq!(converter.to_ascii(&image), Err(ConvertError::EmptyRamp));
    }

    #[test]
    fn test_decode_then_convert() {
        let converter = AsciiConverter::new();
        let png = png::tests::build_png(2, 1, 8, 0, &[0, 0, 255]);

        let image = converter.decode(&png).unwrap();
        assert_eq!(converter.to_ascii(&image).unwrap(), " @");
    }

    #[test]
    fn test_converter_decoded_size_limit() {
        let png = png::tests::build_png(2, 1, 8, 0, &[0, 0, 255]);

        let strict = AsciiConverter::new().with_max_decoded_bytes(2);
        assert!(matches!(strict.decode(&png), Err(DecodeError::Unsupported(_))));

        let exact = AsciiConverter::new().with_max_decoded_bytes(3);
        assert!(exact.decode(&png).is_ok());
    }

    #[test]
    fn test_converter_is_deterministic() {
        let converter = AsciiConverter::new();
        let image = LumaImage::new(2, 2, vec![10, 90, 170, 250]);
        assert_eq!(converter.to_ascii(&image), converter.to_ascii(&image));
    }
}
