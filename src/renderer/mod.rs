//! Drawing a [`Scene`] to the window or canvas.
//!
//! One lit mesh pass over a depth buffer, cleared to the background color.

mod mesh_pass;
mod pipeline_util;

pub use self::mesh_pass::{MeshGeometry, MeshVertex};
use self::mesh_pass::MeshPass;
use crate::camera::{Camera, CameraBinding};
use crate::gpu::lighting::{Lighting, LightingUniform};
use crate::gpu::render_context::{RenderContext, RenderContextError};
use crate::gpu::texture::DepthTarget;
use crate::options::DisplayOptions;
use crate::scene::Scene;

/// Owns the GPU context and everything needed to draw a scene.
pub struct MeshRenderer {
    context: RenderContext,
    depth: DepthTarget,
    camera: CameraBinding,
    lighting: Lighting,
    pass: MeshPass,
    clear_color: wgpu::Color,
    exposure: f32,
}

impl MeshRenderer {
    /// Bring up the GPU on `target` and build the mesh pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`RenderContextError`] if the GPU cannot be initialised.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        display: &DisplayOptions,
        camera: &Camera,
    ) -> Result<Self, RenderContextError> {
        let context = RenderContext::new(target, size).await?;
        let (width, height) = context.size();
        let depth = DepthTarget::new(&context.device, width, height);
        let camera = CameraBinding::new(&context, camera);
        let lighting = Lighting::new(&context.device, LightingUniform::default());
        let pass = MeshPass::new(
            &context.device,
            context.format(),
            &[&camera.layout, &lighting.layout],
        );
        let [r, g, b, a] = display.background_linear();
        log::info!("renderer ready: {width}x{height}, {:?}", context.format());

        Ok(Self {
            context,
            depth,
            camera,
            lighting,
            pass,
            clear_color: wgpu::Color { r, g, b, a },
            exposure: display.exposure,
        })
    }

    /// Surface size in physical pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.context.size()
    }

    /// Resize the surface and depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.context.size() == (width, height) {
            return;
        }
        self.context.resize(width, height);
        self.depth = DepthTarget::new(&self.context.device, width, height);
    }

    /// Draw one frame.
    ///
    /// # Errors
    ///
    /// Returns the [`wgpu::SurfaceError`] from acquiring the frame.
    /// `Lost`/`Outdated` surfaces are reconfigured before returning.
    pub fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), wgpu::SurfaceError> {
        let frame = match self.context.get_next_frame() {
            Ok(frame) => frame,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.context.reconfigure();
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        self.camera.update_gpu(&self.context.queue, camera);
        self.lighting.update(
            &self.context.queue,
            LightingUniform::from_lights(scene.lights(), self.exposure),
        );
        self.pass.sync(&self.context.device, &self.context.queue, scene);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.create_encoder();
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mesh Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
            render_pass.set_bind_group(1, &self.lighting.bind_group, &[]);
            self.pass.draw(&mut render_pass);
        }
        self.context.submit(encoder);
        frame.present();
        Ok(())
    }
}
