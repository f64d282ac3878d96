//! Camera, projection and the pan rig.
//!
//! The camera itself is a plain position + yaw/pitch pair. It never moves on
//! its own: each frame the [`CameraRig`] poses it, like a camera parented to
//! an invisible container hovering over the ground.

use instant::Duration;

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4, perspective};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalPosition;

use crate::{input::PanAxes, pick::Ray};

/// wgpu clip space is 0..1 in z, unlike the OpenGL convention cgmath targets.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }

    /// Cast a ray from the camera through a cursor position.
    ///
    /// The cursor is unprojected through the inverse view-projection at the
    /// near and far plane; the ray points from the camera through both.
    pub fn cast_ray_from_mouse(
        &self,
        cursor: PhysicalPosition<f64>,
        width: f32,
        height: f32,
        projection: &Projection,
    ) -> Ray {
        let ndc_x = 2.0 * cursor.x as f32 / width - 1.0;
        let ndc_y = 1.0 - 2.0 * cursor.y as f32 / height;

        let view_proj = projection.calc_matrix() * self.calc_matrix();
        let inverse = view_proj.invert().unwrap_or_else(Matrix4::identity);

        let unproject = |z: f32| {
            let clip = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            clip.truncate() / clip.w
        };
        let near = unproject(0.0);
        let far = unproject(1.0);

        Ray {
            origin: Point3::new(near.x, near.y, near.z),
            direction: (far - near).normalize(),
        }
    }
}

#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// The camera with all its GPU plumbing.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, projection: &Projection) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera bind group layout"),
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera bind group"),
        });

        Self {
            camera,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

/// Where the camera hangs relative to the rig.
const CAMERA_OFFSET: Vector3<f32> = Vector3::new(0.0, 1.0, -5.0);
/// The rig-local point the camera looks at.
const LOOK_TARGET: Vector3<f32> = Vector3::new(0.0, -10.0, 0.0);

/// The invisible platform the camera is parented to.
///
/// Hovers at a fixed height over the ground and slides on the world X/Z
/// plane when the arrow keys are held. The camera keeps a constant offset
/// and a constant downward gaze, so panning the rig pans the whole view.
#[derive(Debug)]
pub struct CameraRig {
    pub position: Point3<f32>,
    pan_speed: f32,
}

impl CameraRig {
    pub fn new() -> Self {
        Self {
            position: Point3::new(0.0, 15.0, 0.0),
            pan_speed: 3.0,
        }
    }

    /// Slide the rig by the current pan axes.
    pub fn pan(&mut self, axes: &PanAxes, dt: Duration) {
        let step = self.pan_speed * dt.as_secs_f32();
        self.position.x += axes.horizontal as f32 * step;
        self.position.z += axes.vertical as f32 * step;
    }

    /// Pose `camera` for this frame.
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.position + CAMERA_OFFSET;
        let gaze = LOOK_TARGET - CAMERA_OFFSET;
        camera.yaw = Rad(gaze.z.atan2(gaze.x));
        camera.pitch = Rad(gaze.y.atan2(Vector3::new(gaze.x, 0.0, gaze.z).magnitude()));
    }

    /// Initial camera pose matching the rig's starting position.
    pub fn initial_camera() -> Camera {
        let mut camera = Camera::new((0.0, 16.0, -5.0), Deg(90.0), Deg(-65.0));
        Self::new().apply(&mut camera);
        camera
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PanAxes;

    #[test]
    fn rig_pans_on_world_axes() {
        let mut rig = CameraRig::new();
        let axes = PanAxes {
            horizontal: 1,
            vertical: -1,
        };
        rig.pan(&axes, Duration::from_secs(1));
        assert!((rig.position.x - 3.0).abs() < 1e-5);
        assert!((rig.position.z + 3.0).abs() < 1e-5);
        assert!((rig.position.y - 15.0).abs() < 1e-5);
    }

    #[test]
    fn rig_holds_still_without_input() {
        let mut rig = CameraRig::new();
        let before = rig.position;
        rig.pan(&PanAxes::default(), Duration::from_millis(16));
        assert_eq!(rig.position, before);
    }

    #[test]
    fn camera_follows_rig_at_fixed_offset() {
        let mut rig = CameraRig::new();
        let mut camera = CameraRig::initial_camera();
        rig.position.x = 7.0;
        rig.apply(&mut camera);
        assert!((camera.position.x - 7.0).abs() < 1e-5);
        assert!((camera.position.y - 16.0).abs() < 1e-5);
        // gaze stays steeply downward
        assert!(camera.forward().y < -0.5);
    }
}
