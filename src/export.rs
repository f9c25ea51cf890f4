//! Wavefront OBJ export of the scene.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use glam::Vec3;
use thiserror::Error;

use crate::scene::Scene;
use crate::terrain::colors::elevation_to_color;

/// File name used when no output path is configured.
pub const DEFAULT_EXPORT_PATH: &str = "export.obj";

/// Name of the terrain object inside the OBJ file.
const OBJECT_NAME: &str = "terrain";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Append `r g b` to each `v` line using the scene's color scheme
    pub vertex_colors: bool,
}

/// Counts of what was written, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub vertices: usize,
    pub faces: usize,
}

/// Write the scene's terrain as OBJ text.
///
/// Positions are in world space (model transform applied) and normals are
/// transformed by the normal matrix. Face indices are 1-based `v/vt/vn` triples.
pub fn write_obj<W: Write>(
    scene: &Scene,
    writer: &mut W,
    options: &ExportOptions,
) -> io::Result<ExportSummary> {
    let mesh = &scene.terrain;
    let normal_matrix = scene.normal_matrix();

    writeln!(writer, "# heightscape terrain")?;
    writeln!(writer, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(writer, "# Faces: {}", mesh.triangle_count())?;
    writeln!(writer, "o {}", OBJECT_NAME)?;

    for (i, vertex) in mesh.vertices.iter().enumerate() {
        let p = scene.world_position(i);
        if options.vertex_colors {
            let [r, g, b] =
                elevation_to_color(vertex.position[2], &mesh.elevation, scene.color_scheme);
            writeln!(writer, "v {} {} {} {} {} {}", p.x, p.y, p.z, r, g, b)?;
        } else {
            writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
        }
    }

    for [u, v] in &mesh.uvs {
        writeln!(writer, "vt {} {}", u, v)?;
    }

    for vertex in &mesh.vertices {
        let n = (normal_matrix * Vec3::from(vertex.normal))
            .try_normalize()
            .unwrap_or(Vec3::Z);
        writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
    }

    for tri in mesh.triangle_indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        writeln!(writer, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
    }

    writer.flush()?;

    Ok(ExportSummary {
        vertices: mesh.vertex_count(),
        faces: mesh.triangle_count(),
    })
}

/// Export the scene to an OBJ file at `path`, replacing any existing file.
pub fn save_obj<P: AsRef<Path>>(
    scene: &Scene,
    path: P,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let path = path.as_ref();
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let summary = write_obj(scene, &mut writer, options).map_err(io_err)?;

    log::info!(
        "Exported {} vertices, {} faces to {}",
        summary.vertices,
        summary.faces,
        path.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{ColorScheme, Heightmap, MeshOptions, TerrainMesh};

    fn scene(width: u32, height: u32, reds: &[u8]) -> Scene {
        let pixels = reds.iter().flat_map(|&r| [r, 0, 0, 255]).collect();
        let map = Heightmap::from_rgba(width, height, pixels).unwrap();
        Scene::new(TerrainMesh::from_heightmap(&map, &MeshOptions::default()))
    }

    fn export_text(scene: &Scene, options: &ExportOptions) -> String {
        let mut out = Vec::new();
        write_obj(scene, &mut out, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn count_prefix(text: &str, prefix: &str) -> usize {
        text.lines().filter(|l| l.starts_with(prefix)).count()
    }

    #[test]
    fn test_obj_line_counts() {
        let scene = scene(3, 2, &[0, 10, 20, 30, 40, 50]);
        let text = export_text(&scene, &ExportOptions::default());

        assert_eq!(count_prefix(&text, "v "), 6);
        assert_eq!(count_prefix(&text, "vt "), 6);
        assert_eq!(count_prefix(&text, "vn "), 6);
        // (3-1) x (2-1) cells, two faces each
        assert_eq!(count_prefix(&text, "f "), 4);
        assert!(text.contains("o terrain\n"));
    }

    #[test]
    fn test_faces_are_one_based() {
        let scene = scene(2, 2, &[0; 4]);
        let text = export_text(&scene, &ExportOptions::default());

        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces[0], "f 1/1/1 3/3/3 2/2/2");
        assert_eq!(faces[1], "f 3/3/3 4/4/4 2/2/2");
    }

    #[test]
    fn test_positions_are_world_space() {
        let scene = scene(2, 2, &[0; 4]);
        let text = export_text(&scene, &ExportOptions::default());

        let first = text.lines().find(|l| l.starts_with("v ")).unwrap();
        let coords: Vec<f32> = first[2..]
            .split_whitespace()
            .map(|c| c.parse().unwrap())
            .collect();
        let expected = scene.world_position(0);
        assert!((Vec3::new(coords[0], coords[1], coords[2]) - expected).length() < 1e-4);
    }

    #[test]
    fn test_vertex_colors() {
        let scene = scene(2, 1, &[0, 255]).with_color_scheme(ColorScheme::Monochrome);
        let text = export_text(
            &scene,
            &ExportOptions {
                vertex_colors: true,
            },
        );

        let lines: Vec<Vec<f32>> = text
            .lines()
            .filter(|l| l.starts_with("v "))
            .map(|l| l[2..].split_whitespace().map(|c| c.parse().unwrap()).collect())
            .collect();
        assert_eq!(lines[0].len(), 6);
        assert!((lines[0][3] - 0.1).abs() < 1e-6);
        assert!((lines[1][3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_save_obj_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_PATH);
        let scene = scene(2, 2, &[1, 2, 3, 4]);

        let summary = save_obj(&scene, &path, &ExportOptions::default()).unwrap();

        assert_eq!(summary, ExportSummary { vertices: 4, faces: 2 });
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(count_prefix(&text, "v "), 4);
    }

    #[test]
    fn test_save_obj_bad_directory() {
        let scene = scene(1, 1, &[0]);
        let result = save_obj(&scene, "/no/such/dir/out.obj", &ExportOptions::default());
        assert!(matches!(result, Err(ExportError::Io { .. })));
    }
}
