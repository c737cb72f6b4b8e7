use skyisle_common::{Color, Viewport};
use skyisle_scene::{FirstPersonCamera, Renderer, SceneDescription};

use crate::gpu::{WgpuRenderer, clear_color};

/// GPU setup failures.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

fn surface_config(
    format: wgpu::TextureFormat,
    alpha_mode: wgpu::CompositeAlphaMode,
    viewport: Viewport,
) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: viewport.width(),
        height: viewport.height(),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    }
}

/// A window surface plus the device that draws into it.
///
/// Implements [`Renderer`] by acquiring the next surface texture and drawing
/// the scene into it. The texture is handed back unpresented so the caller
/// can layer UI on top before presenting.
pub struct SurfaceRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scene: WgpuRenderer,
}

impl SurfaceRenderer {
    /// Create a surface for `target` and a device able to present to it.
    pub fn create(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        viewport: Viewport,
    ) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("skyisle_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = surface_config(format, alpha_mode, viewport);
        surface.configure(&device, &config);
        let scene = WgpuRenderer::new(&device, format, viewport);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            width = viewport.width(),
            height = viewport.height(),
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            scene,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.scene.surface_format()
    }

    /// Re-apply the current configuration after the surface was lost or
    /// became outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Acquire the next surface texture without drawing into it.
    pub fn acquire(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }

    /// Acquire the next surface texture cleared to `color`.
    pub fn clear_frame(&self, color: Color) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        let frame = self.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear_encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(frame)
    }
}

impl Renderer for SurfaceRenderer {
    type Output = Result<wgpu::SurfaceTexture, wgpu::SurfaceError>;

    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.width, self.config.height)
    }

    fn resize(&mut self, viewport: Viewport) {
        self.config.width = viewport.width();
        self.config.height = viewport.height();
        self.surface.configure(&self.device, &self.config);
        self.scene.resize(&self.device, viewport);
    }

    fn render(&mut self, scene: &SceneDescription, camera: &FirstPersonCamera) -> Self::Output {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.scene.prepare(&self.device, scene);
        self.scene
            .render(&self.device, &self.queue, &view, scene, camera);
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_tracks_viewport() {
        let config = surface_config(
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::CompositeAlphaMode::Opaque,
            Viewport::new(0, 480),
        );
        assert_eq!(config.width, 1);
        assert_eq!(config.height, 480);
        assert_eq!(config.present_mode, wgpu::PresentMode::AutoVsync);
        assert_eq!(
            config.usage,
            wgpu::TextureUsages::RENDER_ATTACHMENT
        );
    }

    #[test]
    fn gpu_error_messages() {
        assert_eq!(GpuError::NoAdapter.to_string(), "no suitable GPU adapter found");
        assert!(GpuError::NoSurfaceFormat.to_string().contains("formats"));
    }
}
