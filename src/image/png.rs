//! # Decoder PNG
//! src/image/png.rs
//!
//! Decodifica PNG no entrelazados a una imagen de luminancia.
//!
//! ## Formato
//!
//! ```text
//! 89 50 4E 47 0D 0A 1A 0A            firma
//! [len u32][tipo 4B][datos][crc u32] chunks: IHDR, PLTE?, tRNS?, IDAT+, IEND
//! ```
//!
//! Los IDAT se concatenan, se inflan con zlib (flate2) y cada scanline se
//! des-filtra (None, Sub, Up, Average, Paeth) antes de convertir a luminancia.

use std::io::Read;

use flate2::read::ZlibDecoder;
use flate2::Crc;

use super::LumaImage;

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Tope por defecto de bytes inflados (scanlines con byte de filtro)
pub const DEFAULT_MAX_DECODED_BYTES: usize = 64 * 1024 * 1024;

/// Dimensión máxima aceptada por lado
const MAX_DIMENSION: u32 = 16_384;

/// Errores de decodificación
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("not a png image: bad signature")]
    BadSignature,

    #[error("truncated png data")]
    Truncated,

    #[error("crc mismatch in {chunk} chunk")]
    CrcMismatch { chunk: String },

    #[error("missing {0} chunk")]
    MissingChunk(&'static str),

    #[error("invalid IHDR: {0}")]
    InvalidHeader(String),

    #[error("unsupported png: {0}")]
    Unsupported(String),

    #[error("inflate failed: {0}")]
    Inflate(String),

    #[error("invalid filter type {0}")]
    InvalidFilter(u8),

    #[error("image data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Tipo de color del IHDR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorType {
    Gray,
    Rgb,
    Indexed,
    GrayAlpha,
    Rgba,
}

impl ColorType {
    fn from_byte(b: u8) -> Result<Self, DecodeError> {
        match b {
            0 => Ok(ColorType::Gray),
            2 => Ok(ColorType::Rgb),
            3 => Ok(ColorType::Indexed),
            4 => Ok(ColorType::GrayAlpha),
            6 => Ok(ColorType::Rgba),
            other => Err(DecodeError::InvalidHeader(format!("color type {}", other))),
        }
    }

    fn channels(self) -> usize {
        match self {
            ColorType::Gray | ColorType::Indexed => 1,
            ColorType::GrayAlpha => 2,
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
        }
    }

    fn allows_depth(self, depth: u8) -> bool {
        match self {
            ColorType::Gray => matches!(depth, 1 | 2 | 4 | 8 | 16),
            ColorType::Indexed => matches!(depth, 1 | 2 | 4 | 8),
            ColorType::Rgb | ColorType::GrayAlpha | ColorType::Rgba => matches!(depth, 8 | 16),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Header {
    width: u32,
    height: u32,
    bit_depth: u8,
    color: ColorType,
}

impl Header {
    fn parse(data: &[u8], max_decoded: usize) -> Result<Self, DecodeError> {
        if data.len() != 13 {
            return Err(DecodeError::InvalidHeader(format!("length {}", data.len())));
        }
        let width = be_u32(&data[0..4]);
        let height = be_u32(&data[4..8]);
        let bit_depth = data[8];
        let color = ColorType::from_byte(data[9])?;

        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidHeader("zero dimension".to_string()));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(DecodeError::Unsupported(format!(
                "dimensions {}x{} exceed {}",
                width, height, MAX_DIMENSION
            )));
        }
        if !color.allows_depth(bit_depth) {
            return Err(DecodeError::InvalidHeader(format!(
                "bit depth {} not allowed for {:?}",
                bit_depth, color
            )));
        }
        if data[10] != 0 || data[11] != 0 {
            return Err(DecodeError::Unsupported("compression/filter method".to_string()));
        }
        if data[12] != 0 {
            return Err(DecodeError::Unsupported("interlaced images".to_string()));
        }

        let header = Self { width, height, bit_depth, color };
        // El decode hace varias copias de este tamaño: se rechaza antes de inflar
        if header.raw_len() > max_decoded {
            return Err(DecodeError::Unsupported(format!(
                "image {}x{} decodes to {} bytes, limit is {}",
                width,
                height,
                header.raw_len(),
                max_decoded
            )));
        }

        Ok(header)
    }

    fn bits_per_pixel(&self) -> usize {
        self.color.channels() * self.bit_depth as usize
    }

    /// Bytes por scanline (sin el byte de filtro)
    fn stride(&self) -> usize {
        (self.width as usize * self.bits_per_pixel()).div_ceil(8)
    }

    /// Bytes inflados esperados: cada scanline más su byte de filtro
    fn raw_len(&self) -> usize {
        (self.stride() + 1).saturating_mul(self.height as usize)
    }

    /// Distancia en bytes al pixel "izquierdo" para los filtros (mínimo 1)
    fn filter_step(&self) -> usize {
        self.bits_per_pixel().div_ceil(8).max(1)
    }
}

/// Decodifica un PNG completo a luminancia (0-255 por pixel)
pub fn decode(bytes: &[u8]) -> Result<LumaImage, DecodeError> {
    decode_with_limit(bytes, DEFAULT_MAX_DECODED_BYTES)
}

/// Como `decode`, rechazando imágenes que inflan a más de `max_decoded` bytes
pub fn decode_with_limit(bytes: &[u8], max_decoded: usize) -> Result<LumaImage, DecodeError> {
    if bytes.len() < SIGNATURE.len() || bytes[..SIGNATURE.len()] != SIGNATURE {
        return Err(DecodeError::BadSignature);
    }

    let mut header: Option<Header> = None;
    let mut palette: Vec<[u8; 3]> = Vec::new();
    let mut transparency: Vec<u8> = Vec::new();
    let mut idat: Vec<u8> = Vec::new();
    let mut seen_end = false;

    let mut pos = SIGNATURE.len();
    while pos < bytes.len() {
        let (kind, data, next) = read_chunk(bytes, pos)?;
        pos = next;

        match &kind {
            b"IHDR" => header = Some(Header::parse(data, max_decoded)?),
            b"PLTE" => {
                palette = data
                    .chunks_exact(3)
                    .map(|rgb| [rgb[0], rgb[1], rgb[2]])
                    .collect();
            }
            b"tRNS" => transparency = data.to_vec(),
            b"IDAT" => idat.extend_from_slice(data),
            b"IEND" => {
                seen_end = true;
                break;
            }
            // chunks auxiliares (gAMA, tEXt, ...) se ignoran
            _ => {}
        }
    }

    let header = header.ok_or(DecodeError::MissingChunk("IHDR"))?;
    if idat.is_empty() {
        return Err(DecodeError::MissingChunk("IDAT"));
    }
    if !seen_end {
        return Err(DecodeError::MissingChunk("IEND"));
    }
    if header.color == ColorType::Indexed && palette.is_empty() {
        return Err(DecodeError::MissingChunk("PLTE"));
    }

    let raw = inflate(&idat, &header)?;
    let pixels = unfilter(&raw, &header)?;
    Ok(to_luma(&pixels, &header, &palette, &transparency))
}

/// Lee un chunk en `pos`; retorna (tipo, datos, posición siguiente)
fn read_chunk(bytes: &[u8], pos: usize) -> Result<([u8; 4], &[u8], usize), DecodeError> {
    let header_end = pos.checked_add(8).ok_or(DecodeError::Truncated)?;
    if header_end > bytes.len() {
        return Err(DecodeError::Truncated);
    }
    let length = be_u32(&bytes[pos..pos + 4]) as usize;
    let mut kind = [0u8; 4];
    kind.copy_from_slice(&bytes[pos + 4..header_end]);

    let data_end = header_end.checked_add(length).ok_or(DecodeError::Truncated)?;
    let crc_end = data_end.checked_add(4).ok_or(DecodeError::Truncated)?;
    if crc_end > bytes.len() {
        return Err(DecodeError::Truncated);
    }

    let mut crc = Crc::new();
    crc.update(&bytes[pos + 4..data_end]);
    if crc.sum() != be_u32(&bytes[data_end..crc_end]) {
        return Err(DecodeError::CrcMismatch {
            chunk: String::from_utf8_lossy(&kind).into_owned(),
        });
    }

    Ok((kind, &bytes[header_end..data_end], crc_end))
}

fn inflate(idat: &[u8], header: &Header) -> Result<Vec<u8>, DecodeError> {
    let expected = header.raw_len();
    let mut raw = Vec::with_capacity(expected);

    // Limitar la lectura evita que un stream malicioso infle sin control
    ZlibDecoder::new(idat)
        .take(expected as u64 + 1)
        .read_to_end(&mut raw)
        .map_err(|e| DecodeError::Inflate(e.to_string()))?;

    if raw.len() != expected {
        return Err(DecodeError::SizeMismatch { expected, actual: raw.len() });
    }
    Ok(raw)
}

/// Revierte los filtros por scanline; retorna los bytes de pixel sin filtro
fn unfilter(raw: &[u8], header: &Header) -> Result<Vec<u8>, DecodeError> {
    let stride = header.stride();
    let step = header.filter_step();
    let mut out = vec![0u8; stride * header.height as usize];

    for row in 0..header.height as usize {
        let line = &raw[row * (stride + 1)..(row + 1) * (stride + 1)];
        let filter = line[0];
        let src = &line[1..];

        let (done, rest) = out.split_at_mut(row * stride);
        let prev: &[u8] = if row == 0 { &[] } else { &done[(row - 1) * stride..] };
        let cur = &mut rest[..stride];

        for i in 0..stride {
            let left = if i >= step { cur[i - step] } else { 0 };
            let up = prev.get(i).copied().unwrap_or(0);
            let up_left = if i >= step { prev.get(i - step).copied().unwrap_or(0) } else { 0 };

            let predictor = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => return Err(DecodeError::InvalidFilter(other)),
            };
            cur[i] = src[i].wrapping_add(predictor);
        }
    }

    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Convierte pixels sin filtro a luminancia, ponderando por alpha
fn to_luma(pixels: &[u8], header: &Header, palette: &[[u8; 3]], trns: &[u8]) -> LumaImage {
    let width = header.width as usize;
    let height = header.height as usize;
    let stride = header.stride();
    let depth = header.bit_depth;
    let channels = header.color.channels();
    let max = ((1u32 << depth) - 1) as f32;

    let mut luma = Vec::with_capacity(width * height);

    for row in 0..height {
        let line = &pixels[row * stride..(row + 1) * stride];
        for x in 0..width {
            // muestras normalizadas a 0.0..=1.0
            let sample = |channel: usize| -> f32 {
                let index = x * channels + channel;
                read_sample(line, index, depth) as f32 / max
            };

            let (r, g, b, a) = match header.color {
                ColorType::Gray => {
                    let v = sample(0);
                    (v, v, v, 1.0)
                }
                ColorType::GrayAlpha => {
                    let v = sample(0);
                    (v, v, v, sample(1))
                }
                ColorType::Rgb => (sample(0), sample(1), sample(2), 1.0),
                ColorType::Rgba => (sample(0), sample(1), sample(2), sample(3)),
                ColorType::Indexed => {
                    let index = read_sample(line, x, depth) as usize;
                    let [r, g, b] = palette.get(index).copied().unwrap_or([0, 0, 0]);
                    let a = trns.get(index).copied().unwrap_or(255);
                    (
                        r as f32 / 255.0,
                        g as f32 / 255.0,
                        b as f32 / 255.0,
                        a as f32 / 255.0,
                    )
                }
            };

            let y = (0.2126 * r + 0.7152 * g + 0.0722 * b) * a;
            luma.push((y * 255.0).round().clamp(0.0, 255.0) as u8);
        }
    }

    LumaImage::new(header.width, header.height, luma)
}

/// Lee la muestra número `index` de una scanline con la profundidad dada
fn read_sample(line: &[u8], index: usize, depth: u8) -> u32 {
    match depth {
        16 => u16::from_be_bytes([line[index * 2], line[index * 2 + 1]]) as u32,
        8 => line[index] as u32,
        _ => {
            let bit = index * depth as usize;
            let byte = line[bit / 8];
            let shift = 8 - depth as usize - (bit % 8);
            ((byte >> shift) & ((1u8 << depth) - 1)) as u32
        }
    }
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}
