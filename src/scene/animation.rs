//! Animation roles and playback.
//!
//! Clips are addressed by semantic role, not by name: the clip names an
//! imported model happens to use are resolved into [`AnimationRole`]
//! bindings once, at load time. Runtime code never compares strings.

use std::collections::HashMap;

use crate::data_structures::scene_graph::SceneNode;

/// What an animation means to the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationRole {
    Idle,
    Running,
}

impl AnimationRole {
    /// Map a clip name to its role, if the name is recognized.
    fn from_clip_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "idle" => Some(Self::Idle),
            "running" | "run" => Some(Self::Running),
            _ => None,
        }
    }
}

/// Role -> clip-name bindings for one model.
#[derive(Debug, Default)]
pub struct AnimationSet {
    bindings: HashMap<AnimationRole, String>,
}

impl AnimationSet {
    /// Resolve bindings from the clip names of an imported model.
    ///
    /// Unrecognized clips are ignored; a role with no matching clip is
    /// reported once, here, instead of failing silently every frame.
    pub fn resolve(clip_names: &[String]) -> Self {
        let mut bindings = HashMap::new();
        for name in clip_names {
            match AnimationRole::from_clip_name(name) {
                Some(role) => {
                    bindings.insert(role, name.clone());
                }
                None => log::debug!("clip {name} has no animation role"),
            }
        }
        for role in [AnimationRole::Idle, AnimationRole::Running] {
            if !bindings.contains_key(&role) {
                log::warn!("model has no clip for the {role:?} role");
            }
        }
        Self { bindings }
    }

    pub fn clip(&self, role: AnimationRole) -> Option<&str> {
        self.bindings.get(&role).map(String::as_str)
    }
}

/// Drives at most one active clip, looping, over a scene-node tree.
#[derive(Debug)]
pub struct AnimationPlayer {
    set: AnimationSet,
    active: Option<AnimationRole>,
    clock: f32,
}

impl AnimationPlayer {
    pub fn new(set: AnimationSet) -> Self {
        Self {
            set,
            active: None,
            clock: 0.0,
        }
    }

    pub fn active(&self) -> Option<AnimationRole> {
        self.active
    }

    /// Make `role` the active clip. Switching roles restarts the clock;
    /// re-playing the active role does nothing.
    pub fn play(&mut self, role: AnimationRole) {
        if self.active != Some(role) {
            self.active = Some(role);
            self.clock = 0.0;
        }
    }

    /// Stop `role` if it is the active one.
    pub fn stop(&mut self, role: AnimationRole) {
        if self.active == Some(role) {
            self.active = None;
            self.clock = 0.0;
        }
    }

    /// Advance the clock and sample the active clip onto the node tree.
    pub fn advance(&mut self, dt: f32, root: &mut dyn SceneNode) {
        self.clock += dt;
        if let Some(role) = self.active {
            if let Some(clip) = self.set.clip(role) {
                root.animate(clip, self.clock);
            }
        }
    }
}
