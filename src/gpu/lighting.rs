//! Light rig uniform shared by every lit pipeline.

use wgpu::util::DeviceExt;

use crate::scene::Light;

/// Light rig as the shader sees it.
/// NOTE: Must match the WGSL `Lighting` struct layout exactly (64 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    /// Summed ambient color times intensity.
    pub ambient: [f32; 3],
    /// Exposure multiplier applied to the shaded color.
    pub exposure: f32,
    /// Directional light color times intensity.
    pub directional: [f32; 3],
    /// 1.0 when a directional light is present.
    pub has_directional: f32,
    /// Unit vector from the surface toward the directional light.
    pub direction: [f32; 3],
    _pad0: f32,
    _pad1: [f32; 4],
}

impl Default for LightingUniform {
    fn default() -> Self {
        Self {
            ambient: [0.0; 3],
            exposure: 1.0,
            directional: [0.0; 3],
            has_directional: 0.0,
            direction: [0.0, 1.0, 0.0],
            _pad0: 0.0,
            _pad1: [0.0; 4],
        }
    }
}

impl LightingUniform {
    /// Collapse `lights` into one ambient term and the first directional
    /// light.
    #[must_use]
    pub fn from_lights(lights: &[Light], exposure: f32) -> Self {
        let mut uniform = Self {
            exposure,
            ..Self::default()
        };
        for light in lights {
            match *light {
                Light::Ambient { color, intensity } => {
                    let sum = glam::Vec3::from(uniform.ambient) + color * intensity;
                    uniform.ambient = sum.to_array();
                }
                Light::Directional {
                    color, intensity, ..
                } if uniform.has_directional == 0.0 => {
                    uniform.directional = (color * intensity).to_array();
                    uniform.has_directional = 1.0;
                    if let Some(dir) = light.direction_to_light() {
                        uniform.direction = dir.to_array();
                    }
                }
                Light::Directional { .. } => {
                    log::debug!("ignoring extra directional light");
                }
            }
        }
        uniform
    }
}

/// GPU copy of the light rig.
pub struct Lighting {
    /// CPU copy of the uniform contents.
    pub uniform: LightingUniform,
    /// Uniform buffer.
    pub buffer: wgpu::Buffer,
    /// Bind group layout (binding 0, fragment).
    pub layout: wgpu::BindGroupLayout,
    /// Bind group over [`buffer`](Self::buffer).
    pub bind_group: wgpu::BindGroup,
}

impl Lighting {
    /// Allocate the uniform buffer initialised from `uniform`.
    #[must_use]
    pub fn new(device: &wgpu::Device, uniform: LightingUniform) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lighting Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lighting Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lighting Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            uniform,
            buffer,
            layout,
            bind_group,
        }
    }

    /// Upload `uniform` if it differs from what the GPU has.
    pub fn update(&mut self, queue: &wgpu::Queue, uniform: LightingUniform) {
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
        }
    }
}
