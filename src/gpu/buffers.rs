//! GPU buffer management and readback mapping.

use crate::gpu::RenderError;
use wgpu::{Buffer, BufferUsages, Device};

/// Upload data to a GPU buffer.
///
/// Creates a buffer with the given usage flags and copies data from CPU to GPU.
pub fn create_buffer_init<T: bytemuck::Pod>(
    device: &Device,
    label: &str,
    data: &[T],
    usage: BufferUsages,
) -> Buffer {
    use wgpu::util::DeviceExt;

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage,
    })
}

/// Create an empty buffer.
pub fn create_buffer(device: &Device, label: &str, size: u64, usage: BufferUsages) -> Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

/// Map a staging buffer for reading, waiting until the GPU has flushed all
/// submitted work into it.
///
/// The caller reads via `get_mapped_range` and must `unmap` afterwards.
pub async fn map_for_read(device: &Device, buffer: &Buffer) -> Result<(), RenderError> {
    let (tx, rx) = futures::channel::oneshot::channel();
    buffer
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
    device.poll(wgpu::Maintain::Wait);

    rx.await
        .map_err(|_| RenderError::Readback("map channel closed".to_string()))?
        .map_err(|e| RenderError::Readback(format!("buffer mapping failed: {:?}", e)))?;

    Ok(())
}

/// Blocking wrapper for `map_for_read`.
pub fn map_for_read_blocking(device: &Device, buffer: &Buffer) -> Result<(), RenderError> {
    pollster::block_on(map_for_read(device, buffer))
}
