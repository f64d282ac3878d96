//! Animation track import: raw glTF channels merged into per-node clips.

use std::collections::HashMap;

use cgmath::One;

use crate::data_structures::{instance::Instance, scene_graph::ModelAnimation};

/// One glTF animation channel's output values.
#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
    Other,
}

/// A single imported channel: a named animation's track for one node.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
}

/// Merge a node's channels into whole-transform clips.
///
/// glTF stores translation, rotation and scale as separate channels of the
/// same named animation; playback wants one `Instance` per keyframe. Tracks
/// shorter than the densest one hold their last value; a track that is
/// absent altogether falls back to the identity component. First-seen
/// animation order is preserved.
pub fn merge_clips(clips: Vec<AnimationClip>) -> Vec<ModelAnimation> {
    struct Tracks {
        translations: Vec<cgmath::Vector3<f32>>,
        rotations: Vec<cgmath::Quaternion<f32>>,
        scales: Vec<cgmath::Vector3<f32>>,
        timestamps: Vec<f32>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Tracks> = HashMap::new();

    for clip in clips {
        let tracks = by_name.entry(clip.name.clone()).or_insert_with(|| {
            order.push(clip.name.clone());
            Tracks {
                translations: Vec::new(),
                rotations: Vec::new(),
                scales: Vec::new(),
                timestamps: Vec::new(),
            }
        });
        match clip.keyframes {
            Keyframes::Translation(mut values) => tracks.translations.append(&mut values),
            Keyframes::Rotation(mut values) => tracks.rotations.append(&mut values),
            Keyframes::Scale(mut values) => tracks.scales.append(&mut values),
            Keyframes::Other => {
                log::debug!("skipping unsupported channel in animation {}", clip.name);
                continue;
            }
        }
        // Keep the densest timestamp track for smooth playback.
        if clip.timestamps.len() > tracks.timestamps.len() {
            tracks.timestamps = clip.timestamps;
        }
    }

    order
        .into_iter()
        .filter_map(|name| {
            let tracks = by_name.remove(&name)?;
            let frames = tracks
                .translations
                .len()
                .max(tracks.rotations.len())
                .max(tracks.scales.len());
            if frames == 0 {
                return None;
            }

            let keyframes = (0..frames)
                .map(|i| Instance {
                    position: held(&tracks.translations, i)
                        .unwrap_or_else(|| cgmath::Vector3::new(0.0, 0.0, 0.0)),
                    rotation: held(&tracks.rotations, i).unwrap_or_else(cgmath::Quaternion::one),
                    scale: held(&tracks.scales, i)
                        .unwrap_or_else(|| cgmath::Vector3::new(1.0, 1.0, 1.0)),
                })
                .collect();

            Some(ModelAnimation {
                name,
                keyframes,
                timestamps: tracks.timestamps,
            })
        })
        .collect()
}

/// Value at `i`, or the track's last value when it ran out.
fn held<T: Copy>(track: &[T], i: usize) -> Option<T> {
    track.get(i).or_else(|| track.last()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Quaternion, Vector3};

    fn translation(name: &str, values: Vec<[f32; 3]>, timestamps: Vec<f32>) -> AnimationClip {
        AnimationClip {
            name: name.to_string(),
            keyframes: Keyframes::Translation(values.into_iter().map(Into::into).collect()),
            timestamps,
        }
    }

    fn rotation(name: &str, count: usize, timestamps: Vec<f32>) -> AnimationClip {
        AnimationClip {
            name: name.to_string(),
            keyframes: Keyframes::Rotation(vec![Quaternion::one(); count]),
            timestamps,
        }
    }

    #[test]
    fn channels_of_the_same_animation_merge() {
        let merged = merge_clips(vec![
            translation("running", vec![[0.0; 3], [1.0, 0.0, 0.0]], vec![0.0, 1.0]),
            rotation("running", 2, vec![0.0, 1.0]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "running");
        assert_eq!(merged[0].keyframes.len(), 2);
        assert_eq!(merged[0].timestamps, vec![0.0, 1.0]);
    }

    #[test]
    fn distinct_animations_stay_separate_in_input_order() {
        let merged = merge_clips(vec![
            translation("idle", vec![[0.0; 3]], vec![0.0]),
            translation("running", vec![[0.0; 3]], vec![0.0]),
            rotation("idle", 1, vec![0.0]),
        ]);
        let names: Vec<_> = merged.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["idle", "running"]);
    }

    #[test]
    fn short_tracks_hold_their_last_value() {
        let merged = merge_clips(vec![
            translation("wave", vec![[5.0, 0.0, 0.0]], vec![0.0]),
            rotation("wave", 3, vec![0.0, 0.5, 1.0]),
        ]);
        assert_eq!(merged[0].keyframes.len(), 3);
        for frame in &merged[0].keyframes {
            assert_eq!(frame.position, Vector3::new(5.0, 0.0, 0.0));
        }
    }

    #[test]
    fn absent_tracks_fall_back_to_identity() {
        let merged = merge_clips(vec![rotation("spin", 2, vec![0.0, 1.0])]);
        assert_eq!(merged[0].keyframes[0].scale, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(merged[0].keyframes[0].position, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn unsupported_channels_are_dropped() {
        let merged = merge_clips(vec![AnimationClip {
            name: "morph".to_string(),
            keyframes: Keyframes::Other,
            timestamps: vec![0.0],
        }]);
        assert!(merged.is_empty());
    }
}
