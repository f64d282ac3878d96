//! Animation roles, clip merging and playback over a node tree.

use amble::{
    data_structures::{
        instance::Instance,
        scene_graph::{ContainerNode, SceneNode},
    },
    resources::animation::{AnimationClip, Keyframes, merge_clips},
    scene::animation::{AnimationPlayer, AnimationRole, AnimationSet},
};
use cgmath::Vector3;

fn running_clip() -> Vec<amble::data_structures::scene_graph::ModelAnimation> {
    merge_clips(vec![AnimationClip {
        name: "running".to_string(),
        keyframes: Keyframes::Translation(vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
        ]),
        timestamps: vec![0.0, 1.0],
    }])
}

fn player(clips: &[&str]) -> AnimationPlayer {
    let names: Vec<String> = clips.iter().map(|c| c.to_string()).collect();
    AnimationPlayer::new(AnimationSet::resolve(&names))
}

#[test]
fn the_running_role_drives_the_node_tree() {
    let mut root = ContainerNode::new("character");
    root.add_child(Box::new(ContainerNode::with_animations(
        "hips",
        running_clip(),
    )));

    let mut player = player(&["running"]);
    player.play(AnimationRole::Running);
    player.advance(0.5, &mut root);

    let hips = &root.children()[0];
    assert!((hips.local_transform().position.y - 1.0).abs() < 1e-5);
}

#[test]
fn stopping_the_running_role_freezes_the_tree() {
    let mut root = ContainerNode::with_animations("hips", running_clip());

    let mut player = player(&["running"]);
    player.play(AnimationRole::Running);
    player.advance(0.25, &mut root);
    let at_stop = root.local_transform();

    player.stop(AnimationRole::Running);
    player.advance(0.25, &mut root);
    assert_eq!(root.local_transform(), at_stop);
}

#[test]
fn nodes_without_the_clip_are_untouched() {
    let mut root = ContainerNode::new("prop");
    root.set_local_transform(Instance::at(Vector3::new(4.0, 0.0, 4.0)));

    let mut player = player(&["running"]);
    player.play(AnimationRole::Running);
    player.advance(0.5, &mut root);

    assert_eq!(root.local_transform().position, Vector3::new(4.0, 0.0, 4.0));
}

#[test]
fn playback_loops_by_clip_duration() {
    let mut a = ContainerNode::with_animations("hips", running_clip());
    let mut b = ContainerNode::with_animations("hips", running_clip());

    let mut player_a = player(&["running"]);
    player_a.play(AnimationRole::Running);
    player_a.advance(0.25, &mut a);

    let mut player_b = player(&["running"]);
    player_b.play(AnimationRole::Running);
    player_b.advance(1.25, &mut b);

    let ya = a.local_transform().position.y;
    let yb = b.local_transform().position.y;
    assert!((ya - yb).abs() < 1e-5);
}

#[test]
fn unknown_roles_make_playback_a_noop() {
    let mut root = ContainerNode::with_animations("hips", running_clip());
    let before = root.local_transform();

    // the model only ships a tpose; neither role resolves
    let mut player = player(&["tpose"]);
    player.play(AnimationRole::Running);
    player.advance(0.5, &mut root);

    assert_eq!(root.local_transform(), before);
}
