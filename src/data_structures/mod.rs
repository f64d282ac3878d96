//! Engine-side data types for scene representation.
//!
//! - `model` contains mesh and material definitions plus draw helpers
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds per-node transforms and their GPU layout
//! - `scene_graph` enables hierarchical scene organization and animation
//! - `terrain` builds the ground-plane geometry

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod terrain;
pub mod texture;
