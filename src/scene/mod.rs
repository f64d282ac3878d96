//! The game scene: a character on a ground plane, walked by clicking.
//!
//! Construction loads the character model and the ground textures (the
//! application's only asynchronous work); afterwards the scene is a plain
//! per-frame state machine. The character model hangs under an invisible
//! "collider" container: navigation moves the container, animation moves
//! the model's own nodes, and neither interferes with the other.

use instant::Duration;

use cgmath::{EuclideanSpace, Vector3};

use crate::{
    app::Scene,
    camera::CameraRig,
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        model::Material,
        scene_graph::{ContainerNode, Instanced, ModelNode, SceneNode},
        terrain,
    },
    input::InputState,
    pick,
    resources::{self, texture::{diffuse_normal_layout, load_texture}},
    scene::{
        animation::{AnimationPlayer, AnimationRole, AnimationSet},
        nav::{Navigator, Step},
    },
};

pub mod animation;
pub mod nav;

/// Edge length of the square ground plane.
pub const GROUND_SIZE: f32 = 50.0;
/// How often the ground textures repeat across the plane.
const GROUND_UV_TILING: f32 = 10.0;
/// Walk speed in units per second.
const CHARACTER_SPEED: f32 = 4.0;

const CHARACTER_MODEL: &str = "models/character.glb";
const GROUND_DIFFUSE: &str = "textures/ground_diffuse.jpg";
const GROUND_NORMAL: &str = "textures/ground_normal.jpg";

pub struct GameScene {
    /// Invisible collider container; the model hangs underneath.
    character: Box<dyn SceneNode>,
    ground: ModelNode,
    rig: CameraRig,
    navigator: Navigator,
    animations: AnimationPlayer,
}

impl GameScene {
    /// Load the scene. Awaited once during startup.
    pub async fn load(ctx: InitContext) -> anyhow::Result<GameScene> {
        let character_model =
            resources::load_model_gltf(CHARACTER_MODEL, &ctx.device, &ctx.queue).await?;
        let animations = AnimationPlayer::new(AnimationSet::resolve(&character_model.clip_names));

        // Collider container at y = +1 (feet at y = 0), model shifted back
        // down so it stands on the ground.
        let mut model_offset = ContainerNode::new("model offset");
        model_offset.set_local_transform(Instance::at(Vector3::new(0.0, -1.0, 0.0)));
        model_offset.add_child(character_model.root);

        let mut character = ContainerNode::new("character");
        character.set_local_transform(Instance::at(Vector3::new(0.0, 1.0, 0.0)));
        character.add_child(Box::new(model_offset));

        let diffuse = load_texture(GROUND_DIFFUSE, false, &ctx.device, &ctx.queue, None).await?;
        let normal = load_texture(GROUND_NORMAL, true, &ctx.device, &ctx.queue, None).await?;
        let material = Material::new(
            &ctx.device,
            "ground",
            diffuse,
            normal,
            &diffuse_normal_layout(&ctx.device),
        );
        let ground_model =
            terrain::ground_plane(&ctx.device, "ground", GROUND_SIZE, GROUND_UV_TILING, material);
        let ground = ModelNode::from_model("ground", &ctx.device, ground_model, Vec::new());

        Ok(GameScene {
            character: Box::new(character),
            ground,
            rig: CameraRig::new(),
            navigator: Navigator::new(CHARACTER_SPEED),
            animations,
        })
    }
}

impl Scene for GameScene {
    fn on_init(&mut self, ctx: &mut Context) {
        ctx.clear_colour = wgpu::Color {
            r: 0.2,
            g: 0.2,
            b: 0.3,
            a: 1.0,
        };
        self.rig.apply(&mut ctx.camera.camera);

        // The ground never moves; place it once.
        self.ground.update_world_transforms(&Instance::new());
        self.ground.write_to_buffers(&ctx.queue);

        self.animations.play(AnimationRole::Idle);
    }

    fn on_update(&mut self, ctx: &mut Context, input: &mut InputState, dt: Duration) {
        let dt_secs = dt.as_secs_f32();

        // Camera rig panning.
        self.rig.pan(&input.pan, dt);
        self.rig.apply(&mut ctx.camera.camera);

        // A click on the ground becomes the new destination: turn the
        // character toward it and switch to the running clip.
        if let Some(cursor) = input.take_click() {
            let ray = ctx.camera.camera.cast_ray_from_mouse(
                cursor,
                ctx.config.width as f32,
                ctx.config.height as f32,
                &ctx.projection,
            );
            if let Some(point) = pick::pick_ground(&ray, GROUND_SIZE / 2.0) {
                let mut local = self.character.local_transform();
                local.rotation = nav::face_towards(local.position, point.to_vec());
                self.character.set_local_transform(local);
                self.navigator.set_destination(point.to_vec());
                self.animations.play(AnimationRole::Running);
            }
        }

        // Walk until the destination volume is entered.
        let mut local = self.character.local_transform();
        match self.navigator.advance(local.position, local.rotation, dt_secs) {
            Step::Idle => {}
            Step::Moving(position) => {
                local.position = position;
                self.character.set_local_transform(local);
            }
            Step::Arrived(position) => {
                local.position = position;
                self.character.set_local_transform(local);
                self.animations.stop(AnimationRole::Running);
                self.animations.play(AnimationRole::Idle);
            }
        }

        // Sample the active clip and flush transforms to the GPU.
        self.animations.advance(dt_secs, self.character.as_mut());
        self.character.update_world_transforms(&Instance::new());
        self.character.write_to_buffers(&ctx.queue);
    }

    fn on_render(&self) -> Vec<Instanced<'_>> {
        let mut renders = self.character.collect_renders();
        renders.extend(self.ground.collect_renders());
        renders
    }
}
