//! Hierarchical scene organization.
//!
//! Nodes form a tree: transform-only [`ContainerNode`]s group and offset
//! their children, [`ModelNode`]s additionally own a renderable
//! [`Model`](model::Model) and its instance buffer. Each node carries a local
//! transform and a cached world transform that is refreshed top-down via
//! [`SceneNode::update_world_transforms`]. Animation clips are stored on the
//! node they target and sampled in place by [`SceneNode::animate`].

use wgpu::util::DeviceExt;

use crate::data_structures::{instance::Instance, model};

/// A named animation for a single node: keyframe transforms paired with
/// their timestamps (seconds). Produced by merging the per-track glTF
/// channels that target the node.
#[derive(Clone, Debug, Default)]
pub struct ModelAnimation {
    pub name: String,
    pub keyframes: Vec<Instance>,
    pub timestamps: Vec<f32>,
}

impl ModelAnimation {
    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }

    /// Sample the clip at time `t`, looping by the clip duration.
    ///
    /// Position and scale are interpolated linearly between the bracketing
    /// keyframes, rotation is slerped. Returns `None` for an empty clip.
    pub fn sample(&self, t: f32) -> Option<Instance> {
        use cgmath::VectorSpace;

        let first = self.keyframes.first()?;
        let duration = self.duration();
        if self.timestamps.len() < 2 || duration <= 0.0 {
            return Some(first.clone());
        }

        let t = t.max(0.0) % duration;
        // index of the first timestamp strictly after t
        let upper = self
            .timestamps
            .partition_point(|&ts| ts <= t)
            .min(self.timestamps.len() - 1);
        let lower = upper.saturating_sub(1);

        let last = self.keyframes.len() - 1;
        let a = &self.keyframes[lower.min(last)];
        let b = &self.keyframes[upper.min(last)];

        let span = self.timestamps[upper] - self.timestamps[lower];
        let alpha = if span > 0.0 {
            ((t - self.timestamps[lower]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Some(Instance {
            position: a.position.lerp(b.position, alpha),
            rotation: a.rotation.slerp(b.rotation, alpha),
            scale: a.scale.lerp(b.scale, alpha),
        })
    }
}

/// Handle to one draw: a model plus the instance buffer holding its world
/// transform. Collected from the node tree each frame and batched by the
/// render loop.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a model::Model,
}

pub trait SceneNode {
    fn name(&self) -> &str;

    fn local_transform(&self) -> Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn world_transform(&self) -> Instance;

    fn children(&self) -> &[Box<dyn SceneNode>];

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn animations(&self) -> &[ModelAnimation];

    /// Sample the named clip at time `t` onto this node's local transform,
    /// then recurse into the children. Nodes without a matching clip keep
    /// their transform.
    fn animate(&mut self, clip: &str, t: f32);

    /// Recompute this node's world transform from `parent` and propagate to
    /// the children.
    fn update_world_transforms(&mut self, parent: &Instance);

    /// Upload the cached world transforms to the GPU instance buffers.
    fn write_to_buffers(&mut self, queue: &wgpu::Queue);

    /// Collect one [`Instanced`] per model node in this subtree.
    fn collect_renders(&self) -> Vec<Instanced<'_>>;
}

/// A transform-only grouping node, e.g. the invisible character collider
/// that the imported model hangs off.
pub struct ContainerNode {
    name: String,
    local: Instance,
    world: Instance,
    children: Vec<Box<dyn SceneNode>>,
    animations: Vec<ModelAnimation>,
}

impl ContainerNode {
    pub fn new(name: &str) -> Self {
        Self::with_animations(name, Vec::new())
    }

    pub fn with_animations(name: &str, animations: Vec<ModelAnimation>) -> Self {
        Self {
            name: name.to_string(),
            local: Instance::new(),
            world: Instance::new(),
            children: Vec::new(),
            animations,
        }
    }
}

impl SceneNode for ContainerNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_transform(&self) -> Instance {
        self.local.clone()
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn world_transform(&self) -> Instance {
        self.world.clone()
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn animations(&self) -> &[ModelAnimation] {
        &self.animations
    }

    fn animate(&mut self, clip: &str, t: f32) {
        if let Some(sampled) = self
            .animations
            .iter()
            .find(|animation| animation.name == clip)
            .and_then(|animation| animation.sample(t))
        {
            self.local = sampled;
        }
        for child in &mut self.children {
            child.animate(clip, t);
        }
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        for child in &mut self.children {
            child.update_world_transforms(&self.world);
        }
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        for child in &mut self.children {
            child.write_to_buffers(queue);
        }
    }

    fn collect_renders(&self) -> Vec<Instanced<'_>> {
        self.children
            .iter()
            .flat_map(|child| child.collect_renders())
            .collect()
    }
}

/// A node with geometry: a model, and the single-entry instance buffer
/// carrying its world transform.
pub struct ModelNode {
    name: String,
    local: Instance,
    world: Instance,
    children: Vec<Box<dyn SceneNode>>,
    animations: Vec<ModelAnimation>,
    model: model::Model,
    instance_buffer: wgpu::Buffer,
}

impl ModelNode {
    pub fn from_model(
        name: &str,
        device: &wgpu::Device,
        model: model::Model,
        animations: Vec<ModelAnimation>,
    ) -> Self {
        let world = Instance::new();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} instance buffer")),
            contents: bytemuck::cast_slice(&[world.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            name: name.to_string(),
            local: Instance::new(),
            world,
            children: Vec::new(),
            animations,
            model,
            instance_buffer,
        }
    }

    pub fn model(&self) -> &model::Model {
        &self.model
    }
}

impl SceneNode for ModelNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn local_transform(&self) -> Instance {
        self.local.clone()
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn world_transform(&self) -> Instance {
        self.world.clone()
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn animations(&self) -> &[ModelAnimation] {
        &self.animations
    }

    fn animate(&mut self, clip: &str, t: f32) {
        if let Some(sampled) = self
            .animations
            .iter()
            .find(|animation| animation.name == clip)
            .and_then(|animation| animation.sample(t))
        {
            self.local = sampled;
        }
        for child in &mut self.children {
            child.animate(clip, t);
        }
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        for child in &mut self.children {
            child.update_world_transforms(&self.world);
        }
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.world.to_raw()]),
        );
        for child in &mut self.children {
            child.write_to_buffers(queue);
        }
    }

    fn collect_renders(&self) -> Vec<Instanced<'_>> {
        self.children
            .iter()
            .flat_map(|child| child.collect_renders())
            .chain([Instanced {
                instance: &self.instance_buffer,
                model: &self.model,
            }])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{One, Quaternion, Vector3};

    fn clip(name: &str, timestamps: Vec<f32>, positions: Vec<[f32; 3]>) -> ModelAnimation {
        ModelAnimation {
            name: name.to_string(),
            keyframes: positions
                .into_iter()
                .map(|p| Instance {
                    position: p.into(),
                    rotation: Quaternion::one(),
                    scale: Vector3::new(1.0, 1.0, 1.0),
                })
                .collect(),
            timestamps,
        }
    }

    #[test]
    fn sample_interpolates_between_keyframes() {
        let anim = clip(
            "walk",
            vec![0.0, 1.0],
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
        );
        let mid = anim.sample(0.5).unwrap();
        assert!((mid.position.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn sample_loops_past_duration() {
        let anim = clip(
            "walk",
            vec![0.0, 1.0],
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
        );
        let wrapped = anim.sample(1.5).unwrap();
        let direct = anim.sample(0.5).unwrap();
        assert!((wrapped.position.x - direct.position.x).abs() < 1e-5);
    }

    #[test]
    fn sample_of_single_keyframe_is_constant() {
        let anim = clip("pose", vec![0.0], vec![[3.0, 1.0, 0.0]]);
        assert_eq!(anim.sample(0.0), anim.sample(42.0));
    }

    #[test]
    fn sample_of_empty_clip_is_none() {
        let anim = ModelAnimation::default();
        assert!(anim.sample(0.0).is_none());
    }

    #[test]
    fn animate_applies_clip_and_recurses() {
        let mut root = ContainerNode::new("root");
        let mut child = ContainerNode::with_animations(
            "limb",
            vec![clip("wave", vec![0.0, 1.0], vec![[0.0; 3], [0.0, 4.0, 0.0]])],
        );
        child.set_local_transform(Instance::at(Vector3::new(9.0, 9.0, 9.0)));
        root.add_child(Box::new(child));

        root.animate("wave", 0.5);
        let limb = &root.children()[0];
        assert!((limb.local_transform().position.y - 2.0).abs() < 1e-5);
        // the root has no clip and keeps its transform
        assert_eq!(root.local_transform(), Instance::new());
    }

    #[test]
    fn world_transforms_compose_down_the_tree() {
        let mut root = ContainerNode::new("character");
        root.set_local_transform(Instance::at(Vector3::new(0.0, 1.0, 0.0)));
        let mut offset = ContainerNode::new("model offset");
        offset.set_local_transform(Instance::at(Vector3::new(0.0, -1.0, 0.0)));
        root.add_child(Box::new(offset));

        root.update_world_transforms(&Instance::new());
        let child_world = root.children()[0].world_transform();
        assert!(child_world.position.y.abs() < 1e-6);
    }
}
