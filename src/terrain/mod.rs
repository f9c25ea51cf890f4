//! Heightmap data structures, image loading and mesh generation.
//!
//! This module provides:
//! - [`Heightmap`] - Raw RGBA pixel buffer whose red channel encodes elevation
//! - [`load_heightmap`] - Image decoding with the size limit applied
//! - [`TerrainMesh`] - Displaced plane mesh ready for GPU upload or export

pub mod colors;
pub mod loader;
pub mod mesh;

pub use colors::ColorScheme;
pub use loader::{extract_heightmap, load_heightmap, load_heightmap_from_memory, LoadError};
pub use mesh::{ElevationRange, MeshOptions, TerrainMesh, Vertex};

/// Largest accepted heightmap, in pixels (width, height).
pub const MAX_DIMENSIONS: (u32, u32) = (512, 512);

/// Bytes per pixel in the rasterized buffer (RGBA).
pub const CHANNELS: usize = 4;

/// Rasterized heightmap image.
///
/// Pixels are stored row-major as RGBA bytes, exactly as a canvas readback
/// would produce them. Only the red channel carries elevation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heightmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Heightmap {
    /// Wrap an RGBA buffer, validating its size.
    ///
    /// # Errors
    ///
    /// * [`LoadError::EmptyImage`] if either dimension is zero
    /// * [`LoadError::TooLarge`] if either dimension exceeds [`MAX_DIMENSIONS`]
    /// * [`LoadError::BufferSize`] if `pixels.len() != width * height * 4`
    ///
    /// # Example
    ///
    /// ```
    /// use heightscape::terrain::Heightmap;
    ///
    /// let pixels = vec![
    ///     10, 0, 0, 255, 20, 0, 0, 255,
    ///     30, 0, 0, 255, 40, 0, 0, 255,
    /// ];
    /// let map = Heightmap::from_rgba(2, 2, pixels).unwrap();
    /// assert_eq!(map.red(1, 1), 40);
    /// assert_eq!(map.len(), 16);
    /// ```
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, LoadError> {
        check_dimensions(width, height)?;

        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(LoadError::BufferSize {
                actual: pixels.len(),
                expected,
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Length of the RGBA buffer in bytes (`width * height * 4`).
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Red channel of the pixel at column `x`, row `y`.
    pub fn red(&self, x: u32, y: u32) -> u8 {
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.pixels[idx]
    }

    /// Red channel of every pixel in row-major order.
    pub fn reds(&self) -> impl Iterator<Item = u8> + '_ {
        self.pixels.iter().step_by(CHANNELS).copied()
    }

    /// Minimum and maximum of `red * scale_height` over the whole image.
    pub fn elevation_range(&self, scale_height: f32) -> ElevationRange {
        ElevationRange::from_samples(self.reds().map(|r| r as f32 * scale_height))
    }
}

/// Reject images that are empty or exceed [`MAX_DIMENSIONS`].
pub fn check_dimensions(width: u32, height: u32) -> Result<(), LoadError> {
    let (max_width, max_height) = MAX_DIMENSIONS;
    if width > max_width || height > max_height {
        return Err(LoadError::TooLarge {
            width,
            height,
            max_width,
            max_height,
        });
    }
    if width == 0 || height == 0 {
        return Err(LoadError::EmptyImage);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_buffer(reds: &[u8]) -> Vec<u8> {
        reds.iter().flat_map(|&r| [r, 0, 0, 255]).collect()
    }

    #[test]
    fn test_from_rgba_keeps_full_buffer() {
        let map = Heightmap::from_rgba(3, 2, red_buffer(&[0, 1, 2, 3, 4, 5])).unwrap();

        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.len(), 3 * 2 * 4);
    }

    #[test]
    fn test_max_size_is_accepted() {
        let pixels = vec![0u8; 512 * 512 * 4];
        let map = Heightmap::from_rgba(512, 512, pixels).unwrap();
        assert_eq!(map.len(), 512 * 512 * 4);
    }

    #[test]
    fn test_too_wide_is_rejected() {
        let pixels = vec![0u8; 513 * 4];
        let err = Heightmap::from_rgba(513, 1, pixels).unwrap_err();

        assert!(matches!(err, LoadError::TooLarge { width: 513, .. }));
        assert_eq!(
            err.to_string(),
            "Image dimensions are too large. Max dimensions are 512 by 512"
        );
    }

    #[test]
    fn test_too_tall_is_rejected() {
        assert!(matches!(
            check_dimensions(10, 600),
            Err(LoadError::TooLarge { height: 600, .. })
        ));
    }

    #[test]
    fn test_empty_is_rejected() {
        let result = Heightmap::from_rgba(0, 4, vec![]);
        assert!(matches!(result, Err(LoadError::EmptyImage)));
    }

    #[test]
    fn test_buffer_size_mismatch() {
        let result = Heightmap::from_rgba(2, 2, vec![0u8; 12]);
        assert!(matches!(
            result,
            Err(LoadError::BufferSize {
                actual: 12,
                expected: 16
            })
        ));
    }

    #[test]
    fn test_red_channel_lookup() {
        let map = Heightmap::from_rgba(2, 2, red_buffer(&[9, 8, 7, 6])).unwrap();

        assert_eq!(map.red(0, 0), 9);
        assert_eq!(map.red(1, 0), 8);
        assert_eq!(map.red(0, 1), 7);
        assert_eq!(map.reds().collect::<Vec<_>>(), vec![9, 8, 7, 6]);
    }

    #[test]
    fn test_elevation_range_tracks_true_bounds() {
        let map = Heightmap::from_rgba(2, 2, red_buffer(&[128, 0, 255, 64])).unwrap();

        let range = map.elevation_range(1.0);
        assert_eq!(range.min, 0.0);
        assert_eq!(range.max, 255.0);

        let scaled = map.elevation_range(0.5);
        assert_eq!(scaled.max, 127.5);
    }
}
