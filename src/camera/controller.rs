use glam::Vec2;
use wgpu::util::DeviceExt;

use super::core::{Camera, CameraUniform};
use super::orbit::OrbitControls;
use crate::gpu::render_context::RenderContext;

/// GPU-side camera: uniform buffer and bind group mirroring a [`Camera`].
pub struct CameraBinding {
    /// CPU copy of the uniform contents.
    pub uniform: CameraUniform,
    /// Uniform buffer.
    pub buffer: wgpu::Buffer,
    /// Bind group layout (binding 0, vertex + fragment).
    pub layout: wgpu::BindGroupLayout,
    /// Bind group over [`buffer`](Self::buffer).
    pub bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    /// Allocate the uniform buffer initialised from `camera`.
    #[must_use]
    pub fn new(context: &RenderContext, camera: &Camera) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);

        let buffer =
            context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Camera Buffer"),
                    contents: bytemuck::cast_slice(&[uniform]),
                    usage: wgpu::BufferUsages::UNIFORM
                        | wgpu::BufferUsages::COPY_DST,
                });

        let layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX
                        | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            },
        );

        let bind_group =
            context
                .device
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                    label: Some("Camera Bind Group"),
                });

        Self {
            uniform,
            buffer,
            layout,
            bind_group,
        }
    }

    /// Upload the camera's current matrices.
    pub fn update_gpu(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

/// Camera plus the orbit rig that moves it.
///
/// All mutation goes through this type so the rig's spherical state and the
/// camera never drift apart.
#[derive(Debug, Clone)]
pub struct CameraController {
    /// Current camera.
    pub camera: Camera,
    /// Orbit rig.
    pub orbit: OrbitControls,
    viewport_height: f32,
}

impl CameraController {
    /// Controller for `camera` with the rig built from `orbit`.
    #[must_use]
    pub fn new(camera: Camera, orbit: OrbitControls, viewport_height: f32) -> Self {
        let mut controller = Self {
            camera,
            orbit,
            viewport_height,
        };
        controller.orbit.update(&mut controller.camera);
        controller
    }

    /// Track a new drawable size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.aspect = width as f32 / height as f32;
        self.viewport_height = height as f32;
    }

    /// Orbit by a drag of `delta` pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.orbit.rotate(delta, self.viewport_height);
        self.orbit.update(&mut self.camera);
    }

    /// Pan by a drag of `delta` pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.orbit.pan(delta, self.viewport_height, &self.camera);
        self.orbit.update(&mut self.camera);
    }

    /// Dolly by a scroll amount (positive = closer).
    pub fn zoom(&mut self, delta: f32) {
        self.orbit.dolly(delta);
        self.orbit.update(&mut self.camera);
    }

    /// Replace the camera (after framing) and re-center the rig on its
    /// target with a new distance limit. The limit never falls below the
    /// framed distance.
    pub fn apply_framing(&mut self, framed: Camera, max_distance: f32) {
        self.camera = framed;
        self.orbit.max_distance = max_distance.max(framed.eye.distance(framed.target));
        self.orbit.set_target(framed.target, &self.camera);
        self.orbit.update(&mut self.camera);
    }
}
