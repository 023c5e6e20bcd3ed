//! Utilidades compartidas por los tests de integración
//! tests/common/mod.rs

#![allow(dead_code)]

use std::io::Write;

use ascii_server::image::{AsciiConverter, ImageConverter};
use base64::Engine as _;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Crc};

/// PNG 32x32 en escala de grises de 1 bit
const FIXTURE_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAACAAAAAgAQAAAABbAUdZAAAABGdBTUEAAYagMeiWXwAAAFtJREFUeJwtzLEJAzAMBdHr0gSySiALejRvkBU8gsGNCmFFB1Hx4IovqurSpIRszqklUwbnUzRXEuIRsiG/SyY9G0JzJSVei9qynm9qyjBpLp0pYW7pbzBl8L8fEIdJL9AvFMkAAAAASUVORK5CYII=";

pub fn fixture() -> Vec<u8> {
    base64::engine::general_purpose::STANDARD
        .decode(FIXTURE_PNG)
        .expect("fixture is valid base64")
}

fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
}

/// PNG gris de 8 bits con todos los pixels en `luma`
pub fn gray_png(width: u32, height: u32, luma: u8) -> Vec<u8> {
    let mut scanlines = Vec::new();
    for _ in 0..height {
        scanlines.push(0);
        scanlines.resize(scanlines.len() + width as usize, luma);
    }

    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&scanlines).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    chunk(&mut png, b"IHDR", &ihdr);
    chunk(&mut png, b"IDAT", &compressed);
    chunk(&mut png, b"IEND", &[]);
    png
}

/// Entrada `i` de un lote: ancho y brillo distintos por índice
pub fn distinct_png(i: usize) -> Vec<u8> {
    gray_png(i as u32 + 1, 2, (i * 17 % 256) as u8)
}

/// Texto que debe producir `bytes`, calculado sin pasar por el motor
pub fn expected_ascii(bytes: &[u8]) -> String {
    let converter = AsciiConverter::new();
    let image = converter.decode(bytes).expect("valid png");
    converter.to_ascii(&image).expect("convertible image")
}
