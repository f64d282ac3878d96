//! Per-node transformation data and its GPU representation.
//!
//! Every scene node carries an [`Instance`]: a position/rotation/scale triple.
//! World transforms are produced by composing a parent instance with a child
//! instance, and uploaded to the vertex shader as an [`InstanceRaw`].

use std::ops::Mul;

use cgmath::One;

use crate::data_structures::model;

/// A TRS transform: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// The identity transform (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Identity transform translated to `position`.
    pub fn at(position: cgmath::Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        use cgmath::SquareMatrix;
        let model = self.to_matrix();
        // Mirrored transforms (negative determinant) flip the bitangent in
        // the shader.
        let handedness = model.determinant().signum();
        InstanceRaw {
            model: model.into(),
            normal: cgmath::Matrix3::from(self.rotation).into(),
            handedness,
        }
    }
}

/// Transform composition: `parent * child` yields the child's transform
/// expressed in the parent's coordinate space.
impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let rotation = self.rotation * rhs.rotation;
        let scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_position = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        Instance {
            position: self.position + (self.rotation * scaled_position),
            rotation,
            scale,
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-instance data actually stored on the GPU: model matrix, normal
/// matrix, and the handedness sign.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    handedness: f32,
}

impl InstanceRaw {
    // Model matrix columns, normal matrix columns, handedness; locations
    // follow the vertex attributes (0..=4).
    const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x3,
        10 => Float32x3,
        11 => Float32x3,
        12 => Float32,
    ];
}

impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Advance per instance, not per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rotation3, Vector3};

    #[test]
    fn identity_composition_is_noop() {
        let parent = Instance::new();
        let child = Instance::at(Vector3::new(1.0, 2.0, 3.0));
        let world = &parent * &child;
        assert_eq!(world, child);
    }

    #[test]
    fn parent_translation_offsets_child() {
        let parent = Instance::at(Vector3::new(0.0, 1.0, 0.0));
        let child = Instance::at(Vector3::new(0.0, -1.0, 0.0));
        let world = &parent * &child;
        assert!(world.position.y.abs() < 1e-6);
    }

    #[test]
    fn parent_rotation_rotates_child_offset() {
        let parent = Instance {
            rotation: cgmath::Quaternion::from_angle_y(Deg(90.0)),
            ..Instance::new()
        };
        let child = Instance::at(Vector3::unit_z());
        let world = &parent * &child;
        // +z rotated 90 degrees about +y lands on +x
        assert!((world.position.x - 1.0).abs() < 1e-5);
        assert!(world.position.z.abs() < 1e-5);
    }
}
