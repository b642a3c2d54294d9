//! glTF / GLB import into a [`SceneGraph`]
//!
//! Nodes keep their authored names and TRS. A mesh with one primitive becomes
//! a mesh node; a mesh with several primitives becomes a group node with one
//! mesh child per primitive. Materials are converted once per glTF material
//! so primitives that share a material share the handle.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Quat, Vec3};
use gltf::animation::util::ReadOutputs;

use super::{AssetError, LoadedModel, ModelOptions};
use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};
use crate::scene::{
    AlphaMode, Color, Material, MaterialHandle, Mesh, MeshGeometry, NodeId, SceneGraph, Side,
    TextureRef, Transform,
};

/// Parse a GLB (or self-contained glTF) and build the model graph
///
/// `base_dir` resolves external buffer and texture URIs. The model root gets
/// `options.scale` and `options.position`; every material is normalized for
/// transparency.
pub fn import_model(
    bytes: &[u8],
    base_dir: Option<&Path>,
    options: &ModelOptions,
) -> Result<LoadedModel, AssetError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base_dir, blob)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::MissingScene)?;

    let materials: Vec<MaterialHandle> = document
        .materials()
        .map(|m| Arc::new(convert_material(&m, base_dir)))
        .collect();
    let fallback = Arc::new(Material::standard("default"));

    let mut graph = SceneGraph::new();
    let root = graph.add_node(scene.name().unwrap_or("Scene"), None);
    if let Some(node) = graph.node_mut(root) {
        node.transform.scale = Vec3::splat(options.scale);
        node.transform.translation = options.position;
    }

    // glTF node index -> graph node, for animation targets
    let mut node_map: HashMap<usize, NodeId> = HashMap::new();
    let mut stack: Vec<(gltf::Node, NodeId)> = scene.nodes().map(|n| (n, root)).collect();
    stack.reverse();

    while let Some((gnode, parent)) = stack.pop() {
        let name = gnode.name().unwrap_or_default().to_string();
        let (t, r, s) = gnode.transform().decomposed();
        let transform = Transform {
            translation: Vec3::from(t),
            rotation: Quat::from_array(r).normalize(),
            scale: Vec3::from(s),
        };

        let primitives: Vec<Mesh> = gnode
            .mesh()
            .map(|mesh| {
                mesh.primitives()
                    .filter_map(|prim| {
                        let geometry = read_geometry(&prim, &buffers)?;
                        let material = prim
                            .material()
                            .index()
                            .and_then(|i| materials.get(i).cloned())
                            .unwrap_or_else(|| fallback.clone());
                        Some(Mesh::new(Arc::new(geometry), material))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let id = if primitives.len() == 1 {
            let mesh = primitives.into_iter().next();
            match mesh {
                Some(mesh) => graph.add_mesh(name, Some(parent), mesh),
                None => graph.add_node(name, Some(parent)),
            }
        } else {
            let group = graph.add_node(name.clone(), Some(parent));
            for (i, mesh) in primitives.into_iter().enumerate() {
                graph.add_mesh(format!("{}_{}", name, i), Some(group), mesh);
            }
            group
        };
        if let Some(node) = graph.node_mut(id) {
            node.transform = transform;
        }
        node_map.insert(gnode.index(), id);

        let mut children: Vec<_> = gnode.children().map(|c| (c, id)).collect();
        children.reverse();
        stack.extend(children);
    }

    let clips = if options.with_animations {
        document
            .animations()
            .map(|anim| read_clip(&anim, &buffers, &node_map))
            .collect()
    } else {
        Vec::new()
    };

    tracing::debug!(
        "Imported glTF: {} nodes, {} materials, {} clips",
        graph.len(),
        materials.len(),
        clips.len()
    );

    Ok(LoadedModel { graph, clips })
}

fn read_geometry(prim: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<MeshGeometry> {
    if prim.mode() != gltf::mesh::Mode::Triangles {
        return None;
    }
    let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
    let positions: Vec<Vec3> = reader.read_positions()?.map(Vec3::from).collect();
    if positions.is_empty() {
        return None;
    }
    let normals: Vec<Vec3> = reader
        .read_normals()
        .map(|it| it.map(Vec3::from).collect())
        .unwrap_or_default();
    let uvs: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|it| it.into_f32().collect())
        .unwrap_or_default();
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|it| it.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let mut geometry = MeshGeometry {
        positions,
        normals,
        uvs,
        indices,
    };
    geometry.ensure_normals();
    Some(geometry)
}

fn texture_ref(texture: gltf::Texture, base_dir: Option<&Path>, srgb: bool) -> Option<TextureRef> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
            let path = base_dir.map(|d| d.join(uri)).unwrap_or_else(|| uri.into());
            Some(if srgb {
                TextureRef::srgb(path)
            } else {
                TextureRef::linear(path)
            })
        }
        _ => {
            tracing::debug!("Skipping embedded texture {}", texture.index());
            None
        }
    }
}

fn convert_material(material: &gltf::Material, base_dir: Option<&Path>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();

    let mut out = Material::standard(material.name().unwrap_or_default())
        .with_color(Color::rgb(r, g, b))
        .with_opacity(a)
        .with_roughness(pbr.roughness_factor())
        .with_metalness(pbr.metallic_factor())
        .with_alpha_mode(match material.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask,
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        })
        .with_side(if material.double_sided() {
            Side::Double
        } else {
            Side::Front
        });

    if let Some(info) = pbr.base_color_texture() {
        out.map = texture_ref(info.texture(), base_dir, true);
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        let map = texture_ref(info.texture(), base_dir, false);
        out.roughness_map = map.clone();
        out.metalness_map = map;
    }
    if let Some(normal) = material.normal_texture() {
        out.normal_map = texture_ref(normal.texture(), base_dir, false);
    }
    if let Some(transmission) = material.transmission() {
        out.transmission = transmission.transmission_factor().clamp(0.0, 1.0);
    }

    out.normalize_transparency();
    out
}

fn read_clip(
    anim: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    node_map: &HashMap<usize, NodeId>,
) -> AnimationClip {
    let name = anim
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("animation_{}", anim.index()));

    let mut tracks = Vec::new();
    for channel in anim.channels() {
        let Some(&node) = node_map.get(&channel.target().node().index()) else {
            continue;
        };
        let reader = channel.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        let Some(outputs) = reader.read_outputs() else {
            continue;
        };

        let (interpolation, cubic) = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Linear => (Interpolation::Linear, false),
            gltf::animation::Interpolation::Step => (Interpolation::Step, false),
            // Keep the key values and drop the tangents
            gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, true),
        };

        let values = match outputs {
            ReadOutputs::Translations(it) => {
                TrackValues::Translation(key_values(it.map(Vec3::from), cubic))
            }
            ReadOutputs::Rotations(it) => TrackValues::Rotation(key_values(
                it.into_f32().map(|v| Quat::from_array(v).normalize()),
                cubic,
            )),
            ReadOutputs::Scales(it) => TrackValues::Scale(key_values(it.map(Vec3::from), cubic)),
            ReadOutputs::MorphTargetWeights(_) => continue,
        };

        tracks.push(Track {
            node,
            times,
            values,
            interpolation,
        });
    }

    AnimationClip::new(name, tracks)
}

/// Cubic-spline outputs are (in-tangent, value, out-tangent) triples
fn key_values<T>(values: impl Iterator<Item = T>, cubic: bool) -> Vec<T> {
    if cubic {
        values
            .enumerate()
            .filter_map(|(i, v)| (i % 3 == 1).then_some(v))
            .collect()
    } else {
        values.collect()
    }
}
