//! Asset import: files, textures and glTF models.

use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
};

use crate::{
    data_structures::{
        instance::Instance,
        model,
        scene_graph::{ContainerNode, ModelNode, SceneNode},
        texture::Texture,
    },
    resources::{
        animation::{AnimationClip, Keyframes, merge_clips},
        texture::{diffuse_normal_layout, load_binary, load_texture},
    },
};

pub mod animation;
pub mod texture;

/// An imported glTF model: the scene-node tree plus the names of the
/// animations it carries (for resolving animation roles once at load).
pub struct GltfModel {
    pub root: Box<dyn SceneNode>,
    pub clip_names: Vec<String>,
}

/// Import a `.glb`/`.gltf` file into a scene-node tree.
///
/// Reads buffers (embedded blob or sibling uri), materials (base colour +
/// optional normal map), meshes with tangent data, the node hierarchy, and
/// every animation channel merged into per-node clips.
pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<GltfModel> {
    let bytes = load_binary(file_name).await?;
    let reader = BufReader::new(Cursor::new(bytes));
    let gltf = gltf::Gltf::from_reader(reader)?;

    // Buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                }
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Animations, grouped by the node each channel targets
    let mut clip_names = Vec::new();
    let mut animations: HashMap<usize, Vec<AnimationClip>> = HashMap::new();
    for animation in gltf.animations() {
        let name = animation.name().unwrap_or("default").to_string();
        if !clip_names.contains(&name) {
            clip_names.push(name.clone());
        }
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| Some(&buffer_data[buffer.index()]));
            let timestamps: Vec<f32> = match reader.read_inputs() {
                Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                Some(gltf::accessor::Iter::Sparse(_)) | None => {
                    log::warn!("animation {name} has a channel without usable timestamps");
                    Vec::new()
                }
            };
            let keyframes = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                    Keyframes::Translation(translations.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    Keyframes::Rotation(rotations.into_f32().map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    Keyframes::Scale(scales.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) | None => {
                    Keyframes::Other
                }
            };
            animations
                .entry(channel.target().node().index())
                .or_default()
                .push(AnimationClip {
                    name: name.clone(),
                    keyframes,
                    timestamps,
                });
        }
    }

    // Materials
    let layout = diffuse_normal_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let diffuse_texture = match pbr.base_color_texture() {
            Some(info) => {
                load_gltf_texture(info.texture(), &buffer_data, false, file_name, device, queue)
                    .await?
            }
            None => {
                let rgba = pbr.base_color_factor().map(|c| (c * 255.0) as u8);
                Texture::single_pixel(device, queue, rgba, false, "base colour")
            }
        };
        let normal_texture = match material.normal_texture() {
            Some(normal) => {
                load_gltf_texture(normal.texture(), &buffer_data, true, file_name, device, queue)
                    .await?
            }
            None => Texture::create_default_normal_map(device, queue),
        };
        materials.push(model::Material::new(
            device,
            material.name().unwrap_or(file_name),
            diffuse_texture,
            normal_texture,
            &layout,
        ));
    }

    // Node hierarchy
    let mut roots = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            roots.push(node_to_scene(node, &buffer_data, device, &materials, &animations));
        }
    }

    let root: Box<dyn SceneNode> = if roots.len() == 1 {
        roots.into_iter().next().unwrap()
    } else {
        let mut root = ContainerNode::new(file_name);
        for node in roots {
            root.add_child(node);
        }
        Box::new(root)
    };

    Ok(GltfModel { root, clip_names })
}

async fn load_gltf_texture(
    texture: gltf::Texture<'_>,
    buffer_data: &[Vec<u8>],
    is_normal_map: bool,
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    match texture.source().source() {
        gltf::image::Source::View { view, mime_type } => {
            let start = view.offset();
            let end = start + view.length();
            Texture::from_bytes(
                device,
                queue,
                &buffer_data[view.buffer().index()][start..end],
                file_name,
                mime_type.split('/').next_back(),
                is_normal_map,
            )
        }
        gltf::image::Source::Uri { uri, mime_type } => {
            let format = mime_type.and_then(|mt| mt.split('/').next_back());
            load_texture(uri, is_normal_map, device, queue, format).await
        }
    }
}

fn node_to_scene(
    node: gltf::scene::Node,
    buffer_data: &[Vec<u8>],
    device: &wgpu::Device,
    materials: &[model::Material],
    animations: &HashMap<usize, Vec<AnimationClip>>,
) -> Box<dyn SceneNode> {
    let clips = animations
        .get(&node.index())
        .cloned()
        .map(merge_clips)
        .unwrap_or_default();
    let name = node.name().unwrap_or("node").to_string();

    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let meshes = mesh
                .primitives()
                .map(|primitive| read_primitive(&mesh, primitive, buffer_data, device))
                .collect();
            let model = model::Model {
                meshes,
                materials: materials.to_vec(),
            };
            Box::new(ModelNode::from_model(&name, device, model, clips))
        }
        None => Box::new(ContainerNode::with_animations(&name, clips)),
    };

    let (position, rotation, scale) = node.transform().decomposed();
    scene_node.set_local_transform(Instance {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    });

    for child in node.children() {
        scene_node.add_child(node_to_scene(child, buffer_data, device, materials, animations));
    }

    scene_node
}

fn read_primitive(
    mesh: &gltf::Mesh,
    primitive: gltf::Primitive,
    buffer_data: &[Vec<u8>],
    device: &wgpu::Device,
) -> model::Mesh {
    let reader = primitive.reader(|buffer| Some(&buffer_data[buffer.index()]));

    let mut vertices: Vec<model::ModelVertex> = Vec::new();
    if let Some(positions) = reader.read_positions() {
        for position in positions {
            vertices.push(model::ModelVertex {
                position,
                tex_coords: Default::default(),
                normal: Default::default(),
                tangent: Default::default(),
                bitangent: Default::default(),
            });
        }
    }
    if let Some(normals) = reader.read_normals() {
        for (vertex, normal) in vertices.iter_mut().zip(normals) {
            vertex.normal = normal;
        }
    }
    if let Some(tex_coords) = reader.read_tex_coords(0).map(|tc| tc.into_f32()) {
        for (vertex, tex_coord) in vertices.iter_mut().zip(tex_coords) {
            vertex.tex_coords = tex_coord;
        }
    }
    if let Some(tangents) = reader.read_tangents() {
        for (vertex, tangent) in vertices.iter_mut().zip(tangents) {
            // glTF tangents are vec4; w holds the bitangent's handedness.
            let tangent: cgmath::Vector4<f32> = tangent.into();
            let normal: cgmath::Vector3<f32> = vertex.normal.into();
            vertex.tangent = tangent.truncate().into();
            vertex.bitangent = (normal.cross(tangent.truncate()) * tangent.w).into();
        }
    }

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|raw| raw.into_u32().collect())
        .unwrap_or_default();

    let material = primitive.material().index().unwrap_or(0);
    model::Mesh::new(
        device,
        mesh.name().unwrap_or("mesh"),
        &vertices,
        &indices,
        material,
    )
}
