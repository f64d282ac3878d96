//! The central GPU and window context.
//!
//! Owns the surface, device/queue, camera and light resources, the depth
//! attachment and the render pipelines. Configuration is programmatic:
//! scenes adjust fields (clear colour, camera pose) during `on_init`.

use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, CameraRig, Projection},
    data_structures::texture::Texture,
    pipelines::{
        basic::mk_scene_pipeline,
        light::{LightResources, LightUniform},
    },
};

/// Position of the scene's fill light.
const LIGHT_POSITION: [f32; 3] = [0.0, 10.0, 0.0];

#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL supports only a subset of wgpu's features.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader assumes an sRGB surface; fall back to whatever the
        // platform offers otherwise.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let projection =
            Projection::new(config.width, config.height, cgmath::Deg(45.0), 0.1, 500.0);
        let camera: Camera = CameraRig::initial_camera();
        let camera = CameraResources::new(&device, camera, &projection);

        let light = LightResources::new(
            LightUniform::new(LIGHT_POSITION, [1.0, 1.0, 1.0]),
            &device,
        );

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth texture",
        );

        let pipelines = Pipelines {
            basic: mk_scene_pipeline(
                &device,
                &config,
                &camera.bind_group_layout,
                &light.bind_group_layout,
            ),
        };

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            clear_colour: wgpu::Color {
                r: 0.2,
                g: 0.2,
                b: 0.3,
                a: 1.0,
            },
        })
    }
}

/// Cheap handle bundle for async scene constructors. The clones only bump
/// the internal reference counts of the device and queue.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
        }
    }
}
