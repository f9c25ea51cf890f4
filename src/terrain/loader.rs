use std::fs;
use std::path::Path;

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

use super::{check_dimensions, Heightmap};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot open file: {0}")]
    FileNotFound(String),
    #[error("Cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image dimensions are too large. Max dimensions are {max_width} by {max_height}")]
    TooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("Image is empty")]
    EmptyImage,
    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { actual: usize, expected: usize },
}

/// Load a heightmap from an image file on disk.
pub fn load_heightmap<P: AsRef<Path>>(path: P) -> Result<Heightmap, LoadError> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).map_err(|_| LoadError::FileNotFound(path.display().to_string()))?;

    load_heightmap_from_memory(&bytes)
}

/// Decode an in-memory image (PNG or JPEG) into a heightmap.
pub fn load_heightmap_from_memory(bytes: &[u8]) -> Result<Heightmap, LoadError> {
    let image = image::load_from_memory(bytes)?;
    extract_heightmap(&image)
}

/// Rasterize a decoded image into an RGBA heightmap.
///
/// The size limit is checked before any pixel is copied. Grayscale sources
/// end up with their luma in the red channel.
pub fn extract_heightmap(image: &DynamicImage) -> Result<Heightmap, LoadError> {
    let (width, height) = image.dimensions();
    check_dimensions(width, height)?;

    let rgba = image.to_rgba8();
    Heightmap::from_rgba(width, height, rgba.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(image: &DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_extract_rgba_image() {
        let img = RgbaImage::from_fn(4, 3, |x, y| Rgba([(x + y * 4) as u8, 7, 7, 255]));
        let map = extract_heightmap(&DynamicImage::ImageRgba8(img)).unwrap();

        assert_eq!(map.len(), 4 * 3 * 4);
        assert_eq!(map.red(3, 2), 11);
    }

    #[test]
    fn test_extract_grayscale_uses_luma_as_red() {
        let img = GrayImage::from_fn(2, 2, |x, _| Luma([if x == 0 { 30 } else { 200 }]));
        let map = extract_heightmap(&DynamicImage::ImageLuma8(img)).unwrap();

        assert_eq!(map.red(0, 1), 30);
        assert_eq!(map.red(1, 1), 200);
    }

    #[test]
    fn test_extract_rejects_oversized_image() {
        let img = GrayImage::new(520, 8);
        let result = extract_heightmap(&DynamicImage::ImageLuma8(img));

        assert!(matches!(
            result,
            Err(LoadError::TooLarge {
                width: 520,
                height: 8,
                ..
            })
        ));
    }

    #[test]
    fn test_load_from_memory_png() {
        let img = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 10 + y) as u8]));
        let bytes = encode_png(&DynamicImage::ImageLuma8(img));

        let map = load_heightmap_from_memory(&bytes).unwrap();
        assert_eq!(map.width(), 5);
        assert_eq!(map.red(4, 3), 43);
    }

    #[test]
    fn test_load_from_memory_garbage() {
        let result = load_heightmap_from_memory(b"not an image");
        assert!(matches!(result, Err(LoadError::Decode(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_heightmap("/definitely/not/here.png");
        assert!(matches!(result, Err(LoadError::FileNotFound(_))));
    }
}
