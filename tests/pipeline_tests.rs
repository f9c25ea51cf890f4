//! End-to-end: PNG on disk -> heightmap -> mesh -> scene -> OBJ file.

use image::{GrayImage, ImageFormat, Luma};

use heightscape::export::{save_obj, write_obj, ExportOptions};
use heightscape::scene::Scene;
use heightscape::terrain::{load_heightmap, LoadError, MeshOptions, TerrainMesh};

fn write_png(dir: &tempfile::TempDir, name: &str, image: &GrayImage) -> std::path::PathBuf {
    let path = dir.path().join(name);
    image.save_with_format(&path, ImageFormat::Png).unwrap();
    path
}

#[test]
fn test_png_to_obj() {
    let dir = tempfile::tempdir().unwrap();
    let image = GrayImage::from_fn(16, 8, |x, y| Luma([(x * 8 + y) as u8]));
    let png = write_png(&dir, "ramp.png", &image);

    let heightmap = load_heightmap(&png).unwrap();
    assert_eq!(heightmap.len(), 16 * 8 * 4);

    let mesh = TerrainMesh::from_heightmap(&heightmap, &MeshOptions::default());
    assert_eq!(mesh.vertex_count(), 16 * 8);
    assert_eq!(mesh.elevation.min, 0.0);
    assert_eq!(mesh.elevation.max, (15 * 8 + 7) as f32);

    let scene = Scene::new(mesh);
    let out = dir.path().join("export.obj");
    let summary = save_obj(&scene, &out, &ExportOptions::default()).unwrap();
    assert_eq!(summary.faces, 2 * 15 * 7);

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 16 * 8);
    assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 2 * 15 * 7);
}

#[test]
fn test_oversized_png_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(&dir, "big.png", &GrayImage::new(600, 100));

    let err = load_heightmap(&png).unwrap_err();
    assert!(matches!(err, LoadError::TooLarge { width: 600, .. }));
    assert!(err.to_string().contains("Max dimensions are 512 by 512"));
}

#[test]
fn test_height_scale_reaches_export() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(&dir, "step.png", &GrayImage::from_fn(2, 2, |x, _| Luma([x as u8 * 100])));
    let heightmap = load_heightmap(&png).unwrap();

    let flat = Scene::new(TerrainMesh::from_heightmap(
        &heightmap,
        &MeshOptions {
            scale_plane: 1.0,
            scale_height: 0.0,
        },
    ));
    let tall = Scene::new(TerrainMesh::from_heightmap(
        &heightmap,
        &MeshOptions {
            scale_plane: 1.0,
            scale_height: 3.0,
        },
    ));
    assert_eq!(tall.elevation().max, 300.0);

    let mut flat_obj = Vec::new();
    let mut tall_obj = Vec::new();
    write_obj(&flat, &mut flat_obj, &ExportOptions::default()).unwrap();
    write_obj(&tall, &mut tall_obj, &ExportOptions::default()).unwrap();
    assert_ne!(flat_obj, tall_obj);
}
