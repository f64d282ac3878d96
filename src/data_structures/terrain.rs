//! Ground-plane geometry.

use crate::data_structures::model::{Material, Mesh, Model, ModelVertex};

/// Build a flat, upward-facing square plane centred on the origin.
///
/// `size` is the edge length in world units; `uv_tiling` repeats the
/// material textures that many times across the plane (samplers use repeat
/// addressing).
pub fn ground_plane(
    device: &wgpu::Device,
    name: &str,
    size: f32,
    uv_tiling: f32,
    material: Material,
) -> Model {
    let half = size / 2.0;
    // Normal +y; tangent frame picked so u runs along +x and v along +z.
    let corner = |x: f32, z: f32, u: f32, v: f32| ModelVertex {
        position: [x, 0.0, z],
        tex_coords: [u, v],
        normal: [0.0, 1.0, 0.0],
        tangent: [1.0, 0.0, 0.0],
        bitangent: [0.0, 0.0, 1.0],
    };
    let vertices = [
        corner(-half, -half, 0.0, 0.0),
        corner(half, -half, uv_tiling, 0.0),
        corner(half, half, uv_tiling, uv_tiling),
        corner(-half, half, 0.0, uv_tiling),
    ];
    // Counter-clockwise when seen from above.
    let indices = [0u32, 2, 1, 0, 3, 2];

    let mesh = Mesh::new(device, name, &vertices, &indices, 0);
    Model {
        meshes: vec![mesh],
        materials: vec![material],
    }
}
