use anyhow::{Context, Result};

use super::{GpuInit, OffscreenTarget};
use crate::coords::Viewport;
use crate::render::RenderCtx;

/// Owns wgpu core objects for offscreen rendering.
pub struct HeadlessGpu {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Format of targets created by [`HeadlessGpu::create_target`].
    format: wgpu::TextureFormat,
}

impl HeadlessGpu {
    /// Creates a device with no surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let GpuInit {
            backends,
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
            target_format,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("shader-quad device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::info!("using adapter {:?}", adapter.get_info().name);

        Ok(Self {
            adapter,
            device,
            queue,
            format: target_format,
        })
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Creates a color target of `width` x `height` physical pixels.
    pub fn create_target(&self, width: u32, height: u32) -> OffscreenTarget {
        OffscreenTarget::new(&self.device, self.format, width, height)
    }

    /// Render context for drawing into targets from this device.
    pub fn render_ctx(&self, viewport: Viewport) -> RenderCtx<'_> {
        RenderCtx::new(&self.device, &self.queue, self.format, viewport)
    }

    pub fn create_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    /// Submits the recorded commands.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Copies `target` back to the CPU as `[r, g, b, a]` texels in row order.
    ///
    /// Blocks until all submitted work has finished.
    pub fn read_target(&self, target: &OffscreenTarget) -> Result<Vec<[u8; 4]>> {
        let (width, height) = target.size();
        let unpadded = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let bytes_per_row = unpadded.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shader-quad readback buffer"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.create_encoder("shader-quad readback encoder");
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.submit(encoder);

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("failed to wait for readback")?;
        rx.recv()
            .context("readback callback was dropped")?
            .context("failed to map readback buffer")?;

        let pixels = {
            let data = slice.get_mapped_range();
            data.chunks_exact(bytes_per_row as usize)
                .flat_map(|row| row[..unpadded as usize].chunks_exact(4))
                .map(|px| [px[0], px[1], px[2], px[3]])
                .collect()
        };
        buffer.unmap();

        Ok(pixels)
    }
}
