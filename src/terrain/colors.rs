//! Elevation color ramps.
//!
//! The solid shader evaluates the same ramps on the GPU from the `min_z` and
//! `max_z` uniforms; these CPU versions back OBJ vertex colors.

use super::ElevationRange;

/// Available color schemes for terrain rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorScheme {
    /// Natural terrain colors: blue (water) → green → brown → white (snow)
    #[default]
    Terrain,
    /// Scientific heatmap: blue (cold/low) → cyan → green → yellow → red (hot/high)
    Heatmap,
    /// Single color with intensity based on height
    Monochrome,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 3] = [
        ColorScheme::Terrain,
        ColorScheme::Heatmap,
        ColorScheme::Monochrome,
    ];

    /// Value of the `color_scheme` shader uniform.
    pub fn shader_index(self) -> u32 {
        match self {
            ColorScheme::Terrain => 0,
            ColorScheme::Heatmap => 1,
            ColorScheme::Monochrome => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorScheme::Terrain => "Terrain",
            ColorScheme::Heatmap => "Heatmap",
            ColorScheme::Monochrome => "Monochrome",
        }
    }
}

/// Color for an absolute elevation, normalized across `range`.
pub fn elevation_to_color(z: f32, range: &ElevationRange, scheme: ColorScheme) -> [f32; 3] {
    height_to_color(range.normalize(z), scheme)
}

/// A color at a normalized position along a ramp.
type Stop = (f32, [f32; 3]);

const TERRAIN_STOPS: &[Stop] = &[
    (0.0, [0.0, 0.0, 0.8]),
    (0.3, [0.0, 0.5, 1.0]),
    (0.5, [0.2, 0.8, 0.4]),
    (0.8, [0.6, 0.4, 0.1]),
    (1.0, [1.0, 1.0, 1.0]),
];

const HEATMAP_STOPS: &[Stop] = &[
    (0.0, [0.0, 0.0, 1.0]),
    (0.25, [0.0, 1.0, 1.0]),
    (0.5, [0.0, 1.0, 0.0]),
    (0.75, [1.0, 1.0, 0.0]),
    (1.0, [1.0, 0.0, 0.0]),
];

const MONOCHROME_STOPS: &[Stop] = &[(0.0, [0.1, 0.1, 0.1]), (1.0, [1.0, 1.0, 1.0])];

impl ColorScheme {
    fn stops(self) -> &'static [Stop] {
        match self {
            ColorScheme::Terrain => TERRAIN_STOPS,
            ColorScheme::Heatmap => HEATMAP_STOPS,
            ColorScheme::Monochrome => MONOCHROME_STOPS,
        }
    }
}

/// Color for a normalized height; `t` is clamped to 0.0-1.0.
pub fn height_to_color(t: f32, scheme: ColorScheme) -> [f32; 3] {
    sample(scheme.stops(), t.clamp(0.0, 1.0))
}

/// Linear interpolation between the two stops surrounding `t`.
fn sample(stops: &[Stop], t: f32) -> [f32; 3] {
    let Some(upper) = stops.iter().position(|&(at, _)| at > t) else {
        return stops.last().map_or([0.0; 3], |&(_, color)| color);
    };
    let upper = upper.max(1);
    let (t0, c0) = stops[upper - 1];
    let (t1, c1) = stops[upper];
    let s = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
    std::array::from_fn(|i| c0[i] + (c1[i] - c0[i]) * s)
}
