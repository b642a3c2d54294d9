//! Vertex layout shared by the mesh pipelines

use bytemuck::{Pod, Zeroable};

use crate::scene::MeshGeometry;

/// Vertex for scene meshes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Normal vector (for lighting)
    pub normal: [f32; 3],
}

impl MeshVertex {
    /// Size of vertex in bytes
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Vertex buffer layout for wgpu
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // uv
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // normal
                wgpu::VertexAttribute {
                    offset: 20,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }

    /// Interleave a geometry's attributes; missing normals point up, missing uvs are zero
    pub fn interleave(geometry: &MeshGeometry) -> Vec<MeshVertex> {
        geometry
            .positions
            .iter()
            .enumerate()
            .map(|(i, position)| MeshVertex {
                position: position.to_array(),
                uv: geometry.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                normal: geometry
                    .normals
                    .get(i)
                    .map(|n| n.to_array())
                    .unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn test_vertex_size_matches_layout() {
        assert_eq!(MeshVertex::SIZE, 32);
        let layout = MeshVertex::buffer_layout();
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[2].offset, 20);
    }

    #[test]
    fn test_interleave_fills_missing_attributes() {
        let geometry = MeshGeometry {
            positions: vec![Vec3::ZERO, Vec3::X],
            normals: vec![Vec3::Z],
            uvs: vec![],
            indices: vec![],
        };
        let vertices = MeshVertex::interleave(&geometry);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
    }
}
