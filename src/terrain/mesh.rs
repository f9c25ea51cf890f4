use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::{Heightmap, CHANNELS};

/// Vertex data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Lowest and highest elevation in a mesh, fed to the shader as uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationRange {
    pub min: f32,
    pub max: f32,
}

impl ElevationRange {
    /// Running min/max over the samples, seeded with the first one.
    ///
    /// Returns `0.0..0.0` for an empty sequence.
    pub fn from_samples<I: IntoIterator<Item = f32>>(samples: I) -> Self {
        let mut iter = samples.into_iter();
        let Some(first) = iter.next() else {
            return Self { min: 0.0, max: 0.0 };
        };

        let mut range = Self {
            min: first,
            max: first,
        };
        for z in iter {
            range.include(z);
        }
        range
    }

    pub fn include(&mut self, z: f32) {
        if z > self.max {
            self.max = z;
        }
        if z < self.min {
            self.min = z;
        }
    }

    /// Distance between min and max, or 1.0 for flat terrain.
    pub fn span(&self) -> f32 {
        if (self.max - self.min).abs() < 0.0001 {
            1.0
        } else {
            self.max - self.min
        }
    }

    /// Map an elevation into `0.0..=1.0` across this range.
    pub fn normalize(&self, z: f32) -> f32 {
        ((z - self.min) / self.span()).clamp(0.0, 1.0)
    }
}

/// Plane and height multipliers applied when building the mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshOptions {
    /// Multiplier for the plane's width and height (one pixel = one unit)
    pub scale_plane: f32,
    /// Multiplier for red channel values
    pub scale_height: f32,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            scale_plane: 1.0,
            scale_height: 1.0,
        }
    }
}

/// Generated mesh ready for GPU upload
pub struct TerrainMesh {
    pub vertices: Vec<Vertex>,
    /// Texture coordinates, one per vertex
    pub uvs: Vec<[f32; 2]>,
    /// Line list over the grid edges (wireframe)
    pub indices: Vec<u32>,
    /// Triangle list, two per grid cell
    pub triangle_indices: Vec<u32>,
    pub elevation: ElevationRange,
    /// Grid size in vertices (columns, rows)
    pub grid: (u32, u32),
}

impl TerrainMesh {
    /// Build a subdivided plane the size of the heightmap and displace each
    /// vertex along +Z by its pixel's red channel.
    ///
    /// The plane spans `width * scale_plane` by `height * scale_plane` units
    /// centred on the origin, with `(width - 1) x (height - 1)` segments so
    /// there is exactly one vertex per pixel. Row 0 sits at +Y.
    pub fn from_heightmap(heightmap: &Heightmap, options: &MeshOptions) -> Self {
        let columns = heightmap.width();
        let rows = heightmap.height();
        let segments_x = columns - 1;
        let segments_y = rows - 1;

        let plane_width = columns as f32 * options.scale_plane;
        let plane_height = rows as f32 * options.scale_plane;
        let half_width = plane_width / 2.0;
        let half_height = plane_height / 2.0;

        let vertex_count = columns as usize * rows as usize;
        let mut vertices = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);

        for iy in 0..rows {
            let (y, v) = grid_coord(iy, segments_y, plane_height, half_height);
            for ix in 0..columns {
                let (x, u) = grid_coord(ix, segments_x, plane_width, half_width);
                vertices.push(Vertex {
                    position: [x, -y, 0.0],
                    normal: [0.0, 0.0, 1.0],
                });
                uvs.push([u, 1.0 - v]);
            }
        }

        // Displace: pixel stride 4, one vertex per pixel
        let pixels = heightmap.pixels();
        let mut elevation: Option<ElevationRange> = None;
        for (vertex, pixel) in vertices.iter_mut().zip(pixels.chunks_exact(CHANNELS)) {
            let z = pixel[0] as f32 * options.scale_height;
            vertex.position[2] = z;
            match elevation.as_mut() {
                Some(range) => range.include(z),
                None => elevation = Some(ElevationRange { min: z, max: z }),
            }
        }
        let elevation = elevation.unwrap_or(ElevationRange { min: 0.0, max: 0.0 });

        let triangle_indices = triangle_indices(columns, rows);
        let indices = line_indices(columns, rows);

        compute_vertex_normals(&mut vertices, &triangle_indices);

        Self {
            vertices,
            uvs,
            indices,
            triangle_indices,
            elevation,
            grid: (columns, rows),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_indices.len() / 3
    }
}

/// Offset from the plane's edge and the matching UV coordinate for grid
/// index `i`. A single-vertex axis collapses onto 0.
fn grid_coord(i: u32, segments: u32, size: f32, half: f32) -> (f32, f32) {
    if segments == 0 {
        return (0.0, 0.0);
    }
    let segment = size / segments as f32;
    (i as f32 * segment - half, i as f32 / segments as f32)
}

/// Two counter-clockwise triangles per cell, facing +Z.
fn triangle_indices(columns: u32, rows: u32) -> Vec<u32> {
    if columns < 2 || rows < 2 {
        return Vec::new();
    }

    let mut indices = Vec::with_capacity(((columns - 1) * (rows - 1) * 6) as usize);
    for iy in 0..rows - 1 {
        for ix in 0..columns - 1 {
            let a = ix + columns * iy;
            let b = ix + columns * (iy + 1);
            let c = (ix + 1) + columns * (iy + 1);
            let d = (ix + 1) + columns * iy;

            indices.extend_from_slice(&[a, b, d]);
            indices.extend_from_slice(&[b, c, d]);
        }
    }
    indices
}

/// Grid edges as a line list.
fn line_indices(columns: u32, rows: u32) -> Vec<u32> {
    let mut indices = Vec::new();

    // Horizontal lines
    for iy in 0..rows {
        for ix in 0..columns.saturating_sub(1) {
            let i = iy * columns + ix;
            indices.push(i);
            indices.push(i + 1);
        }
    }

    // Vertical lines
    for iy in 0..rows.saturating_sub(1) {
        for ix in 0..columns {
            let i = iy * columns + ix;
            indices.push(i);
            indices.push(i + columns);
        }
    }

    indices
}

/// Area-weighted vertex normals: sum the face normals touching each vertex,
/// then normalize. Vertices with no faces keep +Z.
fn compute_vertex_normals(vertices: &mut [Vertex], triangles: &[u32]) {
    if triangles.is_empty() {
        return;
    }

    let mut sums = vec![Vec3::ZERO; vertices.len()];
    for tri in triangles.chunks_exact(3) {
        let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let a = Vec3::from(vertices[ia].position);
        let b = Vec3::from(vertices[ib].position);
        let c = Vec3::from(vertices[ic].position);

        let face = (c - b).cross(a - b);
        sums[ia] += face;
        sums[ib] += face;
        sums[ic] += face;
    }

    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        vertex.normal = sum.try_normalize().unwrap_or(Vec3::Z).to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heightmap(width: u32, height: u32, reds: &[u8]) -> Heightmap {
        let pixels = reds.iter().flat_map(|&r| [r, r, r, 255]).collect();
        Heightmap::from_rgba(width, height, pixels).unwrap()
    }

    #[test]
    fn test_vertex_count_matches_pixels() {
        let map = heightmap(4, 3, &[0; 12]);
        let mesh = TerrainMesh::from_heightmap(&map, &MeshOptions::default());

        assert_eq!(mesh.vertex_count(), 4 * 3);
        assert_eq!(mesh.uvs.len(), 4 * 3);
        assert_eq!(mesh.grid, (4, 3));
        // (4-1) x (3-1) cells, two triangles each
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_wireframe_edges() {
        let map = heightmap(2, 2, &[0; 4]);
        let mesh = TerrainMesh::from_heightmap(&map, &MeshOptions::default());

        // 2 horizontal edges + 2 vertical edges = 8 indices
        assert_eq!(mesh.indices.len(), 8);
    }

    #[test]
    fn test_elevation_follows_red_channel() {
        let map = heightmap(3, 1, &[0, 128, 255]);
        let options = MeshOptions {
            scale_plane: 1.0,
            scale_height: 2.0,
        };
        let mesh = TerrainMesh::from_heightmap(&map, &options);

        let zs: Vec<f32> = mesh.vertices.iter().map(|v| v.position[2]).collect();
        assert_eq!(zs, vec![0.0, 256.0, 510.0]);
        assert_eq!(mesh.elevation.min, 0.0);
        assert_eq!(mesh.elevation.max, 510.0);
    }

    #[test]
    fn test_elevation_range_matches_heightmap() {
        let reds = [17, 200, 3, 99, 150, 42];
        let map = heightmap(3, 2, &reds);
        let mesh = TerrainMesh::from_heightmap(&map, &MeshOptions::default());

        assert_eq!(mesh.elevation, map.elevation_range(1.0));
        assert_eq!(mesh.elevation.min, 3.0);
        assert_eq!(mesh.elevation.max, 200.0);
    }

    #[test]
    fn test_plane_is_centered_and_scaled() {
        let map = heightmap(3, 3, &[0; 9]);
        let options = MeshOptions {
            scale_plane: 2.0,
            scale_height: 1.0,
        };
        let mesh = TerrainMesh::from_heightmap(&map, &options);

        // 3 px * 2.0 = 6 units wide, centred: -3..3
        let first = mesh.vertices[0].position;
        let last = mesh.vertices[8].position;
        assert_eq!(first[0], -3.0);
        assert_eq!(first[1], 3.0);
        assert_eq!(last[0], 3.0);
        assert_eq!(last[1], -3.0);

        assert_eq!(mesh.uvs[0], [0.0, 1.0]);
        assert_eq!(mesh.uvs[8], [1.0, 0.0]);
    }

    #[test]
    fn test_flat_plane_normals_face_up() {
        let map = heightmap(3, 3, &[10; 9]);
        let mesh = TerrainMesh::from_heightmap(&map, &MeshOptions::default());

        for vertex in &mesh.vertices {
            assert!((vertex.normal[2] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_slope_tilts_normals() {
        // Rises to the right: normals lean toward -X
        let map = heightmap(3, 2, &[0, 10, 20, 0, 10, 20]);
        let mesh = TerrainMesh::from_heightmap(&map, &MeshOptions::default());

        let normal = mesh.vertices[1].normal;
        assert!(normal[0] < 0.0);
        assert!(normal[2] > 0.0);
    }

    #[test]
    fn test_single_row_has_no_faces() {
        let map = heightmap(4, 1, &[1, 2, 3, 4]);
        let mesh = TerrainMesh::from_heightmap(&map, &MeshOptions::default());

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.vertices.iter().all(|v| v.position[1] == 0.0));
        assert_eq!(mesh.indices.len(), 6);
    }

    #[test]
    fn test_elevation_range_span() {
        let flat = ElevationRange::from_samples([5.0, 5.0]);
        assert_eq!(flat.span(), 1.0);

        let range = ElevationRange::from_samples([10.0, 30.0, 20.0]);
        assert_eq!(range.span(), 20.0);
        assert_eq!(range.normalize(20.0), 0.5);
        assert_eq!(range.normalize(100.0), 1.0);
    }

    #[test]
    fn test_elevation_range_empty() {
        let range = ElevationRange::from_samples(std::iter::empty());
        assert_eq!(range, ElevationRange { min: 0.0, max: 0.0 });
    }
}
