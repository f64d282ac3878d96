//! amble
//!
//! A small cross-platform (native and WASM) click-to-move demo game: a glTF
//! character walks to the point you click on a textured ground plane, under
//! a top-down camera rig panned with the arrow keys.
//!
//! High-level modules
//! - `app`: application bootstrap, event loop and the `Scene` trait
//! - `camera`: camera, projection, the pan rig and mouse-ray casting
//! - `context`: central GPU and window context owning device/queue/pipelines
//! - `input`: explicit input state fed from window events
//! - `pick`: analytic ray picking against the ground plane
//! - `data_structures`: meshes, materials, transforms, the scene graph
//! - `pipelines`: the scene render pipeline and light resources
//! - `resources`: file, texture and glTF loading
//! - `scene`: the game scene with navigation and animation roles

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod input;
pub mod pick;
pub mod pipelines;
pub mod resources;
pub mod scene;

// Commonly used types re-exported for downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::WindowEvent;

use crate::app::{Scene, SceneConstructor};

/// Build the game scene constructor and run the application.
pub fn launch() -> anyhow::Result<()> {
    let game: SceneConstructor = Box::new(|ctx| {
        Box::pin(async move {
            scene::GameScene::load(ctx)
                .await
                .map(|game| Box::new(game) as Box<dyn Scene>)
        })
    });

    app::run(vec![game])
}

/// Web entry point; the native binary calls [`launch`] directly.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    if let Err(e) = launch() {
        log::error!("{e:#}");
    }
}
