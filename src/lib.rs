//! Heightmap terrain viewer.
//!
//! Decodes a grayscale image into a height field, displaces a subdivided
//! plane by the red channel, renders it with elevation coloring under fly
//! camera controls, and exports the result as Wavefront OBJ.

pub mod export;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod terrain;
pub mod ui;
