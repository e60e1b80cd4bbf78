//! The single lit mesh pass.
//!
//! The whole scene is flattened into one world-space vertex buffer and one
//! index buffer, rebuilt only when the scene's revision changes.

use glam::{Mat3, Mat4, Vec3};

use crate::gpu::dynamic_buffer::DynamicBuffer;
use crate::renderer::pipeline_util;
use crate::scene::{Mesh, Scene};

/// One vertex as the mesh shader reads it.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// World-space unit normal.
    pub normal: [f32; 3],
    /// Linear RGBA base color.
    pub color: [f32; 4],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// The scene flattened for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    /// Every vertex of every mesh, in world space.
    pub vertices: Vec<MeshVertex>,
    /// Triangle list into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    /// Flatten every mesh in `scene`.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        let mut geometry = Self::default();
        scene.visit_meshes(&mut |world, mesh| geometry.append(world, mesh));
        geometry
    }

    /// Append `mesh` transformed by `world`. Triangles that reference
    /// missing vertices are dropped.
    pub fn append(&mut self, world: Mat4, mesh: &Mesh) {
        let base = self.vertices.len() as u32;
        let vertex_count = mesh.positions.len();
        let normal_matrix = if world.determinant().abs() > f32::EPSILON {
            Mat3::from_mat4(world.inverse().transpose())
        } else {
            Mat3::from_mat4(world)
        };
        let color = mesh.material.base_color;

        self.vertices.extend(mesh.positions.iter().enumerate().map(|(i, &p)| {
            let normal = mesh.normals.get(i).map_or(Vec3::Y, |&n| Vec3::from(n));
            MeshVertex {
                position: world.transform_point3(Vec3::from(p)).to_array(),
                normal: (normal_matrix * normal)
                    .try_normalize()
                    .unwrap_or(Vec3::Y)
                    .to_array(),
                color,
            }
        }));

        for tri in mesh.indices.chunks_exact(3) {
            if tri.iter().all(|&i| (i as usize) < vertex_count) {
                self.indices.extend(tri.iter().map(|&i| base + i));
            }
        }
    }
}

/// Pipeline plus the flattened scene buffers.
pub(crate) struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: DynamicBuffer,
    index_buffer: DynamicBuffer,
    index_count: u32,
    synced_revision: Option<u64>,
}

impl MeshPass {
    pub(crate) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &pipeline_util::surface_color_target(format),
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(pipeline_util::depth_stencil_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            vertex_buffer: DynamicBuffer::new(
                device,
                "Mesh Vertices",
                size_of::<MeshVertex>() * 1024,
                wgpu::BufferUsages::VERTEX,
            ),
            index_buffer: DynamicBuffer::new(
                device,
                "Mesh Indices",
                size_of::<u32>() * 3072,
                wgpu::BufferUsages::INDEX,
            ),
            index_count: 0,
            synced_revision: None,
        }
    }

    /// Re-upload the scene if it changed since the last sync.
    pub(crate) fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        if self.synced_revision == Some(scene.revision()) {
            return;
        }
        let geometry = MeshGeometry::from_scene(scene);
        let _ = self.vertex_buffer.write(device, queue, &geometry.vertices);
        let _ = self.index_buffer.write(device, queue, &geometry.indices);
        self.index_count = geometry.indices.len() as u32;
        self.synced_revision = Some(scene.revision());
        log::debug!(
            "mesh pass synced: {} vertices, {} triangles",
            geometry.vertices.len(),
            self.index_count / 3
        );
    }

    /// Draw the scene. Caller sets the camera and lighting bind groups.
    pub(crate) fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice());
        render_pass.set_index_buffer(self.index_buffer.slice(), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, SceneGraph, SceneNode};

    fn triangle(color: [f32; 4]) -> Mesh {
        let mut mesh = Mesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            material: Material {
                name: String::new(),
                base_color: color,
            },
            ..Mesh::default()
        };
        mesh.ensure_normals();
        mesh
    }

    #[test]
    fn vertex_is_40_bytes() {
        assert_eq!(size_of::<MeshVertex>(), 40);
    }

    #[test]
    fn meshes_are_flattened_with_offsets() {
        let mut scene = Scene::new();
        let _ = scene.add_node(SceneNode {
            meshes: vec![triangle([1.0, 0.0, 0.0, 1.0])],
            ..SceneNode::default()
        });
        let _ = scene.add_node(SceneNode {
            transform: Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            meshes: vec![triangle([0.0, 1.0, 0.0, 1.0])],
            ..SceneNode::default()
        });
        let geometry = MeshGeometry::from_scene(&scene);
        assert_eq!(geometry.vertices.len(), 6);
        assert_eq!(geometry.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(geometry.vertices[3].position, [10.0, 0.0, 0.0]);
        assert_eq!(geometry.vertices[3].color, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn normals_follow_rotation() {
        let mut geometry = MeshGeometry::default();
        let world = Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2);
        geometry.append(world, &triangle([1.0; 4]));
        let n = Vec3::from(geometry.vertices[0].normal);
        assert!((n - Vec3::Y).length() < 1e-5, "{n:?}");
    }

    #[test]
    fn out_of_range_triangles_are_dropped() {
        let mut mesh = triangle([1.0; 4]);
        mesh.indices.extend([0, 1, 9]);
        let mut geometry = MeshGeometry::default();
        geometry.append(Mat4::IDENTITY, &mesh);
        assert_eq!(geometry.indices, vec![0, 1, 2]);
    }
}
