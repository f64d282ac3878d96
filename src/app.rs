//! Application bootstrap and event loop.
//!
//! A [`Scene`] is a self-contained game state: it is built asynchronously
//! (model and texture loading happen exactly once, during construction),
//! gets the context to configure in `on_init`, and is then driven from the
//! render loop — input is collected into an [`InputState`], `on_update` runs
//! with the frame delta, and `on_render` hands back what to draw.
//!
//! The loop itself follows winit's `ApplicationHandler`:
//! 1. `resumed` creates the window and runs the async scene constructors
//! 2. window events update the shared [`InputState`]
//! 3. `RedrawRequested` updates every scene, refreshes the camera uniform,
//!    and records one render pass over the scenes' draw lists

use std::{future::Future, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext},
    data_structures::{
        model::DrawModel,
        scene_graph::Instanced,
        texture::Texture,
    },
    input::InputState,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// A renderable game state driven by the event loop.
pub trait Scene {
    /// Called once after construction. The only place to reconfigure the
    /// context (clear colour, camera start pose).
    fn on_init(&mut self, ctx: &mut Context);

    /// Called every frame with the collected input and the frame delta.
    fn on_update(&mut self, ctx: &mut Context, input: &mut InputState, dt: Duration);

    /// The draws for this frame.
    fn on_render(&self) -> Vec<Instanced<'_>>;
}

/// Async scene factory. Loading a scene is the application's only
/// asynchronous work; each constructor is awaited exactly once during
/// startup and a failure aborts the run instead of going unobserved.
pub type SceneConstructor =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn Scene>>>>>>;

/// Application state bundle: GPU context, input state, surface status.
pub struct AppState {
    pub(crate) ctx: Context,
    pub(crate) input: InputState,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        Ok(Self {
            ctx,
            input: InputState::new(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth texture",
            );
        }
    }

    fn render(&mut self, scenes: &[Box<dyn Scene>]) -> Result<(), wgpu::SurfaceError> {
        // keep the loop going
        self.ctx.window.request_redraw();

        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.ctx.pipelines.basic);
            for scene in scenes {
                for instanced in scene.on_render() {
                    render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                    render_pass.draw_model_instanced(
                        instanced.model,
                        0..1,
                        &self.ctx.camera.bind_group,
                        &self.ctx.light.bind_group,
                    );
                }
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub(crate) enum AppEvent {
    #[allow(dead_code)]
    Initialized {
        state: AppState,
        scenes: Vec<Box<dyn Scene>>,
    },
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg(target_arch = "wasm32")]
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    state: Option<AppState>,
    scenes: Vec<Box<dyn Scene>>,
    // Constructors are taken out of the Option when the window is ready.
    constructors: Option<Vec<SceneConstructor>>,
    last_time: Instant,
}

impl App {
    fn new(
        event_loop: &EventLoop<AppEvent>,
        constructors: Vec<SceneConstructor>,
    ) -> anyhow::Result<Self> {
        #[cfg(target_arch = "wasm32")]
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let _ = event_loop;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            #[cfg(target_arch = "wasm32")]
            proxy,
            state: None,
            scenes: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
        })
    }

    fn init_scenes(&mut self, mut app_state: AppState, scenes: Vec<Box<dyn Scene>>) {
        self.scenes = scenes;
        for scene in &mut self.scenes {
            scene.on_init(&mut app_state.ctx);
        }
        app_state.ctx.window.request_redraw();
        self.state = Some(app_state);
        self.last_time = Instant::now();
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let Some(constructors) = self.constructors.take() else {
            return;
        };

        let init_future = async move {
            let app_state = AppState::new(window).await?;

            let scene_futures: Vec<_> = constructors
                .into_iter()
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let scenes = futures::future::join_all(scene_futures)
                .await
                .into_iter()
                .collect::<anyhow::Result<Vec<_>>>()?;
            anyhow::Ok((app_state, scenes))
        };

        #[cfg(not(target_arch = "wasm32"))]
        match self.async_runtime.block_on(init_future) {
            Ok((app_state, scenes)) => self.init_scenes(app_state, scenes),
            Err(e) => {
                log::error!("failed to initialise the scene: {e:#}");
                event_loop.exit();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((state, scenes)) => {
                        assert!(proxy.send_event(AppEvent::Initialized { state, scenes }).is_ok())
                    }
                    Err(e) => log::error!("failed to initialise the scene: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized { state, scenes } => {
                // The message from the wasm `spawn_local` above. Trigger a
                // resize and redraw now that we are initialized.
                self.init_scenes(state, scenes);
                let state = self.state.as_mut().unwrap();
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                for scene in &mut self.scenes {
                    scene.on_update(&mut state.ctx, &mut state.input, dt);
                }

                state
                    .ctx
                    .camera
                    .uniform
                    .update_view_proj(&state.ctx.camera.camera, &state.ctx.projection);
                state.ctx.queue.write_buffer(
                    &state.ctx.camera.buffer,
                    0,
                    bytemuck::cast_slice(&[state.ctx.camera.uniform]),
                );

                match state.render(&self.scenes) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("unable to render: {e}");
                    }
                }
            }
            _ => {}
        }
    }
}

/// Initialize logging, build the event loop and run the scenes to
/// completion.
pub fn run(constructors: Vec<SceneConstructor>) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: could not initialize logger: {e}");
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, constructors)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
