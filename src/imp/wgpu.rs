// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A [Driver] backed by a [wgpu] device.

wgpu has no asynchronous pipeline creation and reports errors through futures rather than
callbacks.  Asynchronous work is therefore kept as a list of futures and polled from [Driver::tick],
after the device itself has been polled, so completions follow the same tick discipline as any
other driver.
*/

use super::{
    CreatePipelineCallback, DeviceLostCallback, Driver, LoggingCallback, PopErrorScopeCallback,
    UncapturedErrorCallback,
};
use crate::native::{
    self, AddressMode, BindGroupDescriptor, BindGroupLayoutDescriptor, BindingResource,
    BindingType, BlendFactor, BlendOperation, BufferBindingType, BufferDescriptor, ChainedStruct,
    CommandEncoderDescriptor, CompareFunction, ComputePipelineDescriptor,
    CreatePipelineAsyncStatus, CullMode, DeviceLostReason, ErrorFilter, ErrorType, FeatureName,
    FilterMode, FrontFace, IndexFormat, Limits, LoggingType, MipmapFilterMode,
    PipelineLayoutDescriptor, PrimitiveTopology, QuerySetDescriptor, QueryType,
    RenderPipelineDescriptor, SamplerBindingType, SamplerDescriptor, ShaderModuleDescriptor,
    StencilOperation, StorageTextureAccess, TextureDescriptor, TextureDimension, TextureFormat,
    TextureSampleType, TextureViewDimension, VertexFormat, VertexStepMode,
};
use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Waker};

type Work = Pin<Box<dyn Future<Output = ()> + Send>>;

pub struct WgpuDriver {
    device: wgpu::Device,
    queue: wgpu::Queue,
    work: Mutex<Vec<Work>>,
    //wgpu panics on an unbalanced pop, so track depth ourselves
    scope_depth: AtomicUsize,
    logging: Mutex<Option<LoggingCallback>>,
}

impl std::fmt::Debug for WgpuDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuDriver")
            .field("device", &self.device)
            .field("scope_depth", &self.scope_depth.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl WgpuDriver {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        WgpuDriver {
            device,
            queue,
            work: Mutex::new(Vec::new()),
            scope_depth: AtomicUsize::new(0),
            logging: Mutex::new(None),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    fn work(&self) -> MutexGuard<'_, Vec<Work>> {
        self.work.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn(&self, work: impl Future<Output = ()> + Send + 'static) {
        self.work().push(Box::pin(work));
    }

    fn log(&self, ty: LoggingType, message: &str) {
        if let Some(callback) = &*self.logging.lock().unwrap_or_else(PoisonError::into_inner) {
            callback(ty, message);
        }
    }

    /// Completes a pipeline creation once its validation scope has been popped.
    fn finish_pipeline<P: Send + 'static>(&self, pipeline: P, callback: CreatePipelineCallback<P>) {
        let error = self.device.pop_error_scope();
        self.spawn(async move {
            match error.await {
                None => callback(CreatePipelineAsyncStatus::Success, Some(pipeline), ""),
                Some(e) => {
                    let status = match e {
                        wgpu::Error::Validation { .. } => {
                            CreatePipelineAsyncStatus::ValidationError
                        }
                        _ => CreatePipelineAsyncStatus::InternalError,
                    };
                    callback(status, None, &e.to_string())
                }
            }
        });
    }
}

fn error_type(error: &wgpu::Error) -> ErrorType {
    match error {
        wgpu::Error::OutOfMemory { .. } => ErrorType::OutOfMemory,
        wgpu::Error::Validation { .. } => ErrorType::Validation,
        wgpu::Error::Internal { .. } => ErrorType::Internal,
    }
}

fn address_mode(m: AddressMode) -> wgpu::AddressMode {
    match m {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

fn filter_mode(m: FilterMode) -> wgpu::FilterMode {
    match m {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn mipmap_filter_mode(m: MipmapFilterMode) -> wgpu::FilterMode {
    match m {
        MipmapFilterMode::Nearest => wgpu::FilterMode::Nearest,
        MipmapFilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn compare_function(c: CompareFunction) -> wgpu::CompareFunction {
    match c {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

fn texture_dimension(d: TextureDimension) -> wgpu::TextureDimension {
    match d {
        TextureDimension::D1 => wgpu::TextureDimension::D1,
        TextureDimension::D2 => wgpu::TextureDimension::D2,
        TextureDimension::D3 => wgpu::TextureDimension::D3,
    }
}

fn view_dimension(d: TextureViewDimension) -> wgpu::TextureViewDimension {
    match d {
        TextureViewDimension::D1 => wgpu::TextureViewDimension::D1,
        TextureViewDimension::D2 => wgpu::TextureViewDimension::D2,
        TextureViewDimension::D2Array => wgpu::TextureViewDimension::D2Array,
        TextureViewDimension::Cube => wgpu::TextureViewDimension::Cube,
        TextureViewDimension::CubeArray => wgpu::TextureViewDimension::CubeArray,
        TextureViewDimension::D3 => wgpu::TextureViewDimension::D3,
    }
}

fn texture_format(f: TextureFormat) -> wgpu::TextureFormat {
    use wgpu::TextureFormat as W;
    match f {
        TextureFormat::R8Unorm => W::R8Unorm,
        TextureFormat::R8Snorm => W::R8Snorm,
        TextureFormat::R8Uint => W::R8Uint,
        TextureFormat::R8Sint => W::R8Sint,
        TextureFormat::R16Uint => W::R16Uint,
        TextureFormat::R16Sint => W::R16Sint,
        TextureFormat::R16Float => W::R16Float,
        TextureFormat::Rg8Unorm => W::Rg8Unorm,
        TextureFormat::Rg8Snorm => W::Rg8Snorm,
        TextureFormat::Rg8Uint => W::Rg8Uint,
        TextureFormat::Rg8Sint => W::Rg8Sint,
        TextureFormat::R32Uint => W::R32Uint,
        TextureFormat::R32Sint => W::R32Sint,
        TextureFormat::R32Float => W::R32Float,
        TextureFormat::Rg16Uint => W::Rg16Uint,
        TextureFormat::Rg16Sint => W::Rg16Sint,
        TextureFormat::Rg16Float => W::Rg16Float,
        TextureFormat::Rgba8Unorm => W::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => W::Rgba8UnormSrgb,
        TextureFormat::Rgba8Snorm => W::Rgba8Snorm,
        TextureFormat::Rgba8Uint => W::Rgba8Uint,
        TextureFormat::Rgba8Sint => W::Rgba8Sint,
        TextureFormat::Bgra8Unorm => W::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb => W::Bgra8UnormSrgb,
        TextureFormat::Rgb9e5Ufloat => W::Rgb9e5Ufloat,
        TextureFormat::Rgb10a2Uint => W::Rgb10a2Uint,
        TextureFormat::Rgb10a2Unorm => W::Rgb10a2Unorm,
        TextureFormat::Rg32Uint => W::Rg32Uint,
        TextureFormat::Rg32Sint => W::Rg32Sint,
        TextureFormat::Rg32Float => W::Rg32Float,
        TextureFormat::Rgba16Uint => W::Rgba16Uint,
        TextureFormat::Rgba16Sint => W::Rgba16Sint,
        TextureFormat::Rgba16Float => W::Rgba16Float,
        TextureFormat::Rgba32Uint => W::Rgba32Uint,
        TextureFormat::Rgba32Sint => W::Rgba32Sint,
        TextureFormat::Rgba32Float => W::Rgba32Float,
        TextureFormat::Stencil8 => W::Stencil8,
        TextureFormat::Depth16Unorm => W::Depth16Unorm,
        TextureFormat::Depth24Plus => W::Depth24Plus,
        TextureFormat::Depth24PlusStencil8 => W::Depth24PlusStencil8,
        TextureFormat::Depth32Float => W::Depth32Float,
        TextureFormat::Depth32FloatStencil8 => W::Depth32FloatStencil8,
    }
}

fn vertex_format(f: VertexFormat) -> wgpu::VertexFormat {
    use wgpu::VertexFormat as W;
    match f {
        VertexFormat::Uint8x2 => W::Uint8x2,
        VertexFormat::Uint8x4 => W::Uint8x4,
        VertexFormat::Sint8x2 => W::Sint8x2,
        VertexFormat::Sint8x4 => W::Sint8x4,
        VertexFormat::Unorm8x2 => W::Unorm8x2,
        VertexFormat::Unorm8x4 => W::Unorm8x4,
        VertexFormat::Snorm8x2 => W::Snorm8x2,
        VertexFormat::Snorm8x4 => W::Snorm8x4,
        VertexFormat::Uint16x2 => W::Uint16x2,
        VertexFormat::Uint16x4 => W::Uint16x4,
        VertexFormat::Sint16x2 => W::Sint16x2,
        VertexFormat::Sint16x4 => W::Sint16x4,
        VertexFormat::Unorm16x2 => W::Unorm16x2,
        VertexFormat::Unorm16x4 => W::Unorm16x4,
        VertexFormat::Snorm16x2 => W::Snorm16x2,
        VertexFormat::Snorm16x4 => W::Snorm16x4,
        VertexFormat::Float16x2 => W::Float16x2,
        VertexFormat::Float16x4 => W::Float16x4,
        VertexFormat::Float32 => W::Float32,
        VertexFormat::Float32x2 => W::Float32x2,
        VertexFormat::Float32x3 => W::Float32x3,
        VertexFormat::Float32x4 => W::Float32x4,
        VertexFormat::Uint32 => W::Uint32,
        VertexFormat::Uint32x2 => W::Uint32x2,
        VertexFormat::Uint32x3 => W::Uint32x3,
        VertexFormat::Uint32x4 => W::Uint32x4,
        VertexFormat::Sint32 => W::Sint32,
        VertexFormat::Sint32x2 => W::Sint32x2,
        VertexFormat::Sint32x3 => W::Sint32x3,
        VertexFormat::Sint32x4 => W::Sint32x4,
    }
}

fn binding_type(ty: BindingType) -> wgpu::BindingType {
    match ty {
        BindingType::Buffer {
            ty,
            has_dynamic_offset,
            min_binding_size,
        } => wgpu::BindingType::Buffer {
            ty: match ty {
                BufferBindingType::Uniform => wgpu::BufferBindingType::Uniform,
                BufferBindingType::Storage => wgpu::BufferBindingType::Storage { read_only: false },
                BufferBindingType::ReadOnlyStorage => {
                    wgpu::BufferBindingType::Storage { read_only: true }
                }
            },
            has_dynamic_offset,
            //zero means "no minimum"
            min_binding_size: wgpu::BufferSize::new(min_binding_size),
        },
        BindingType::Sampler(ty) => wgpu::BindingType::Sampler(match ty {
            SamplerBindingType::Filtering => wgpu::SamplerBindingType::Filtering,
            SamplerBindingType::NonFiltering => wgpu::SamplerBindingType::NonFiltering,
            SamplerBindingType::Comparison => wgpu::SamplerBindingType::Comparison,
        }),
        BindingType::Texture {
            sample_type,
            view_dimension: dimension,
            multisampled,
        } => wgpu::BindingType::Texture {
            sample_type: match sample_type {
                TextureSampleType::Float => wgpu::TextureSampleType::Float { filterable: true },
                TextureSampleType::UnfilterableFloat => {
                    wgpu::TextureSampleType::Float { filterable: false }
                }
                TextureSampleType::Depth => wgpu::TextureSampleType::Depth,
                TextureSampleType::Sint => wgpu::TextureSampleType::Sint,
                TextureSampleType::Uint => wgpu::TextureSampleType::Uint,
            },
            view_dimension: view_dimension(dimension),
            multisampled,
        },
        BindingType::StorageTexture {
            access,
            format,
            view_dimension: dimension,
        } => wgpu::BindingType::StorageTexture {
            access: match access {
                StorageTextureAccess::WriteOnly => wgpu::StorageTextureAccess::WriteOnly,
                StorageTextureAccess::ReadOnly => wgpu::StorageTextureAccess::ReadOnly,
                StorageTextureAccess::ReadWrite => wgpu::StorageTextureAccess::ReadWrite,
            },
            format: texture_format(format),
            view_dimension: view_dimension(dimension),
        },
    }
}

fn primitive(p: native::PrimitiveState, unclipped_depth: bool) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: match p.topology {
            PrimitiveTopology::PointList => wgpu::PrimitiveTopology::PointList,
            PrimitiveTopology::LineList => wgpu::PrimitiveTopology::LineList,
            PrimitiveTopology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
            PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        },
        strip_index_format: p.strip_index_format.map(|f| match f {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        }),
        front_face: match p.front_face {
            FrontFace::Ccw => wgpu::FrontFace::Ccw,
            FrontFace::Cw => wgpu::FrontFace::Cw,
        },
        cull_mode: match p.cull_mode {
            CullMode::None => None,
            CullMode::Front => Some(wgpu::Face::Front),
            CullMode::Back => Some(wgpu::Face::Back),
        },
        unclipped_depth,
        polygon_mode: wgpu::PolygonMode::Fill,
        conservative: false,
    }
}

fn stencil_operation(op: StencilOperation) -> wgpu::StencilOperation {
    match op {
        StencilOperation::Keep => wgpu::StencilOperation::Keep,
        StencilOperation::Zero => wgpu::StencilOperation::Zero,
        StencilOperation::Replace => wgpu::StencilOperation::Replace,
        StencilOperation::Invert => wgpu::StencilOperation::Invert,
        StencilOperation::IncrementClamp => wgpu::StencilOperation::IncrementClamp,
        StencilOperation::DecrementClamp => wgpu::StencilOperation::DecrementClamp,
        StencilOperation::IncrementWrap => wgpu::StencilOperation::IncrementWrap,
        StencilOperation::DecrementWrap => wgpu::StencilOperation::DecrementWrap,
    }
}

fn stencil_face(face: native::StencilFaceState) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: compare_function(face.compare),
        fail_op: stencil_operation(face.fail_op),
        depth_fail_op: stencil_operation(face.depth_fail_op),
        pass_op: stencil_operation(face.pass_op),
    }
}

fn depth_stencil(ds: &native::DepthStencilState) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: texture_format(ds.format),
        depth_write_enabled: ds.depth_write_enabled,
        depth_compare: ds
            .depth_compare
            .map(compare_function)
            .unwrap_or(wgpu::CompareFunction::Always),
        stencil: wgpu::StencilState {
            front: stencil_face(ds.stencil_front),
            back: stencil_face(ds.stencil_back),
            read_mask: ds.stencil_read_mask,
            write_mask: ds.stencil_write_mask,
        },
        bias: wgpu::DepthBiasState {
            constant: ds.depth_bias,
            slope_scale: ds.depth_bias_slope_scale,
            clamp: ds.depth_bias_clamp,
        },
    }
}

fn blend_factor(f: BlendFactor) -> wgpu::BlendFactor {
    match f {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::Src => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrc => wgpu::BlendFactor::OneMinusSrc,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::Dst => wgpu::BlendFactor::Dst,
        BlendFactor::OneMinusDst => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        BlendFactor::SrcAlphaSaturated => wgpu::BlendFactor::SrcAlphaSaturated,
        BlendFactor::Constant => wgpu::BlendFactor::Constant,
        BlendFactor::OneMinusConstant => wgpu::BlendFactor::OneMinusConstant,
    }
}

fn blend_component(c: native::BlendComponent) -> wgpu::BlendComponent {
    wgpu::BlendComponent {
        src_factor: blend_factor(c.src_factor),
        dst_factor: blend_factor(c.dst_factor),
        operation: match c.operation {
            BlendOperation::Add => wgpu::BlendOperation::Add,
            BlendOperation::Subtract => wgpu::BlendOperation::Subtract,
            BlendOperation::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
            BlendOperation::Min => wgpu::BlendOperation::Min,
            BlendOperation::Max => wgpu::BlendOperation::Max,
        },
    }
}

fn color_target(target: native::ColorTargetState) -> wgpu::ColorTargetState {
    wgpu::ColorTargetState {
        format: texture_format(target.format),
        blend: target.blend.map(|b| wgpu::BlendState {
            color: blend_component(b.color),
            alpha: blend_component(b.alpha),
        }),
        write_mask: wgpu::ColorWrites::from_bits_truncate(target.write_mask),
    }
}

fn constants(entries: &[native::ConstantEntry]) -> Vec<(&str, f64)> {
    entries.iter().map(|c| (c.key.as_str(), c.value)).collect()
}

fn unclipped_depth(chain: Option<&ChainedStruct>) -> bool {
    matches!(
        chain,
        Some(ChainedStruct::PrimitiveDepthClipControl {
            unclipped_depth: true
        })
    )
}

fn feature_flag(feature: FeatureName) -> wgpu::Features {
    match feature {
        FeatureName::DepthClipControl => wgpu::Features::DEPTH_CLIP_CONTROL,
        FeatureName::Depth32FloatStencil8 => wgpu::Features::DEPTH32FLOAT_STENCIL8,
        FeatureName::TextureCompressionBc => wgpu::Features::TEXTURE_COMPRESSION_BC,
        FeatureName::TextureCompressionEtc2 => wgpu::Features::TEXTURE_COMPRESSION_ETC2,
        FeatureName::TextureCompressionAstc => wgpu::Features::TEXTURE_COMPRESSION_ASTC,
        FeatureName::TimestampQuery => wgpu::Features::TIMESTAMP_QUERY,
        FeatureName::IndirectFirstInstance => wgpu::Features::INDIRECT_FIRST_INSTANCE,
        FeatureName::ShaderF16 => wgpu::Features::SHADER_F16,
        FeatureName::Rg11b10UfloatRenderable => wgpu::Features::RG11B10UFLOAT_RENDERABLE,
        FeatureName::Bgra8UnormStorage => wgpu::Features::BGRA8UNORM_STORAGE,
        FeatureName::Float32Filterable => wgpu::Features::FLOAT32_FILTERABLE,
    }
}

const ALL_FEATURES: [FeatureName; 11] = [
    FeatureName::DepthClipControl,
    FeatureName::Depth32FloatStencil8,
    FeatureName::TextureCompressionBc,
    FeatureName::TextureCompressionEtc2,
    FeatureName::TextureCompressionAstc,
    FeatureName::TimestampQuery,
    FeatureName::IndirectFirstInstance,
    FeatureName::ShaderF16,
    FeatureName::Rg11b10UfloatRenderable,
    FeatureName::Bgra8UnormStorage,
    FeatureName::Float32Filterable,
];

fn limits(l: &wgpu::Limits) -> Limits {
    Limits {
        max_texture_dimension_1d: l.max_texture_dimension_1d,
        max_texture_dimension_2d: l.max_texture_dimension_2d,
        max_texture_dimension_3d: l.max_texture_dimension_3d,
        max_texture_array_layers: l.max_texture_array_layers,
        max_bind_groups: l.max_bind_groups,
        max_bindings_per_bind_group: l.max_bindings_per_bind_group,
        max_dynamic_uniform_buffers_per_pipeline_layout: l
            .max_dynamic_uniform_buffers_per_pipeline_layout,
        max_dynamic_storage_buffers_per_pipeline_layout: l
            .max_dynamic_storage_buffers_per_pipeline_layout,
        max_sampled_textures_per_shader_stage: l.max_sampled_textures_per_shader_stage,
        max_samplers_per_shader_stage: l.max_samplers_per_shader_stage,
        max_storage_buffers_per_shader_stage: l.max_storage_buffers_per_shader_stage,
        max_storage_textures_per_shader_stage: l.max_storage_textures_per_shader_stage,
        max_uniform_buffers_per_shader_stage: l.max_uniform_buffers_per_shader_stage,
        max_uniform_buffer_binding_size: u64::from(l.max_uniform_buffer_binding_size),
        max_storage_buffer_binding_size: u64::from(l.max_storage_buffer_binding_size),
        min_uniform_buffer_offset_alignment: l.min_uniform_buffer_offset_alignment,
        min_storage_buffer_offset_alignment: l.min_storage_buffer_offset_alignment,
        max_vertex_buffers: l.max_vertex_buffers,
        max_buffer_size: l.max_buffer_size,
        max_vertex_attributes: l.max_vertex_attributes,
        max_vertex_buffer_array_stride: l.max_vertex_buffer_array_stride,
        max_color_attachments: l.max_color_attachments,
        max_color_attachment_bytes_per_sample: l.max_color_attachment_bytes_per_sample,
        max_compute_workgroup_storage_size: l.max_compute_workgroup_storage_size,
        max_compute_invocations_per_workgroup: l.max_compute_invocations_per_workgroup,
        max_compute_workgroup_size_x: l.max_compute_workgroup_size_x,
        max_compute_workgroup_size_y: l.max_compute_workgroup_size_y,
        max_compute_workgroup_size_z: l.max_compute_workgroup_size_z,
        max_compute_workgroups_per_dimension: l.max_compute_workgroups_per_dimension,
    }
}

impl WgpuDriver {
    fn render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor<'_, Self>,
    ) -> wgpu::RenderPipeline {
        let vertex_constants = constants(descriptor.vertex.stage.constants);
        let attributes: Vec<Vec<wgpu::VertexAttribute>> = descriptor
            .vertex
            .buffers
            .iter()
            .map(|b| {
                b.attributes
                    .iter()
                    .map(|a| wgpu::VertexAttribute {
                        format: vertex_format(a.format),
                        offset: a.offset,
                        shader_location: a.shader_location,
                    })
                    .collect()
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = descriptor
            .vertex
            .buffers
            .iter()
            .zip(&attributes)
            .map(|(b, attributes)| wgpu::VertexBufferLayout {
                array_stride: b.array_stride,
                step_mode: match b.step_mode {
                    VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
                    VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
                },
                attributes,
            })
            .collect();
        let fragment_constants = descriptor
            .fragment
            .as_ref()
            .map(|f| constants(f.stage.constants))
            .unwrap_or_default();
        let targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .fragment
            .as_ref()
            .map(|f| f.targets.iter().map(|t| t.map(color_target)).collect())
            .unwrap_or_default();

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: descriptor.label,
                layout: descriptor.layout,
                vertex: wgpu::VertexState {
                    module: descriptor.vertex.stage.module,
                    entry_point: descriptor.vertex.stage.entry_point,
                    compilation_options: wgpu::PipelineCompilationOptions {
                        constants: &vertex_constants,
                        zero_initialize_workgroup_memory: true,
                    },
                    buffers: &buffers,
                },
                primitive: primitive(
                    descriptor.primitive,
                    unclipped_depth(descriptor.next_in_chain),
                ),
                depth_stencil: descriptor.depth_stencil.map(depth_stencil),
                multisample: wgpu::MultisampleState {
                    count: descriptor.multisample.count,
                    mask: u64::from(descriptor.multisample.mask),
                    alpha_to_coverage_enabled: descriptor.multisample.alpha_to_coverage_enabled,
                },
                fragment: descriptor.fragment.as_ref().map(|f| wgpu::FragmentState {
                    module: f.stage.module,
                    entry_point: f.stage.entry_point,
                    compilation_options: wgpu::PipelineCompilationOptions {
                        constants: &fragment_constants,
                        zero_initialize_workgroup_memory: true,
                    },
                    targets: &targets,
                }),
                multiview: None,
                cache: None,
            })
    }

    fn compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor<'_, Self>,
    ) -> wgpu::ComputePipeline {
        let constants = constants(descriptor.compute.constants);
        self.device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: descriptor.label,
                layout: descriptor.layout,
                module: descriptor.compute.module,
                entry_point: descriptor.compute.entry_point,
                compilation_options: wgpu::PipelineCompilationOptions {
                    constants: &constants,
                    zero_initialize_workgroup_memory: true,
                },
                cache: None,
            })
    }
}

impl Driver for WgpuDriver {
    type Buffer = wgpu::Buffer;
    type Texture = wgpu::Texture;
    type TextureView = wgpu::TextureView;
    type Sampler = wgpu::Sampler;
    type BindGroupLayout = wgpu::BindGroupLayout;
    type BindGroup = wgpu::BindGroup;
    type ShaderModule = wgpu::ShaderModule;
    type PipelineLayout = wgpu::PipelineLayout;
    type RenderPipeline = wgpu::RenderPipeline;
    type ComputePipeline = wgpu::ComputePipeline;
    type CommandEncoder = wgpu::CommandEncoder;
    type QuerySet = wgpu::QuerySet;
    type Queue = wgpu::Queue;

    fn create_buffer(&self, descriptor: &BufferDescriptor<'_>) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label,
            size: descriptor.size,
            usage: wgpu::BufferUsages::from_bits_truncate(descriptor.usage),
            mapped_at_creation: descriptor.mapped_at_creation,
        })
    }

    fn create_texture(&self, descriptor: &TextureDescriptor<'_>) -> wgpu::Texture {
        let view_formats: Vec<wgpu::TextureFormat> = descriptor
            .view_formats
            .iter()
            .copied()
            .map(texture_format)
            .collect();
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label,
            size: wgpu::Extent3d {
                width: descriptor.size.width,
                height: descriptor.size.height,
                depth_or_array_layers: descriptor.size.depth_or_array_layers,
            },
            mip_level_count: descriptor.mip_level_count,
            sample_count: descriptor.sample_count,
            dimension: texture_dimension(descriptor.dimension),
            format: texture_format(descriptor.format),
            usage: wgpu::TextureUsages::from_bits_truncate(descriptor.usage),
            view_formats: &view_formats,
        })
    }

    fn create_texture_view(
        &self,
        texture: &wgpu::Texture,
        label: Option<&str>,
    ) -> wgpu::TextureView {
        texture.create_view(&wgpu::TextureViewDescriptor {
            label,
            ..Default::default()
        })
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor<'_>) -> wgpu::Sampler {
        self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label,
            address_mode_u: address_mode(descriptor.address_mode_u),
            address_mode_v: address_mode(descriptor.address_mode_v),
            address_mode_w: address_mode(descriptor.address_mode_w),
            mag_filter: filter_mode(descriptor.mag_filter),
            min_filter: filter_mode(descriptor.min_filter),
            mipmap_filter: mipmap_filter_mode(descriptor.mipmap_filter),
            lod_min_clamp: descriptor.lod_min_clamp,
            lod_max_clamp: descriptor.lod_max_clamp,
            compare: descriptor.compare.map(compare_function),
            anisotropy_clamp: descriptor.max_anisotropy,
            border_color: None,
        })
    }

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor<'_>,
    ) -> wgpu::BindGroupLayout {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = descriptor
            .entries
            .iter()
            .map(|e| wgpu::BindGroupLayoutEntry {
                binding: e.binding,
                visibility: wgpu::ShaderStages::from_bits_truncate(e.visibility),
                ty: binding_type(e.ty),
                count: None,
            })
            .collect();
        self.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: descriptor.label,
                entries: &entries,
            })
    }

    fn create_bind_group(&self, descriptor: &BindGroupDescriptor<'_, Self>) -> wgpu::BindGroup {
        let entries: Vec<wgpu::BindGroupEntry<'_>> = descriptor
            .entries
            .iter()
            .map(|e| wgpu::BindGroupEntry {
                binding: e.binding,
                resource: match &e.resource {
                    BindingResource::Buffer {
                        buffer,
                        offset,
                        size,
                    } => wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer,
                        offset: *offset,
                        size: size.and_then(wgpu::BufferSize::new),
                    }),
                    BindingResource::Sampler(sampler) => wgpu::BindingResource::Sampler(sampler),
                    BindingResource::TextureView(view) => {
                        wgpu::BindingResource::TextureView(view)
                    }
                },
            })
            .collect();
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: descriptor.label,
            layout: descriptor.layout,
            entries: &entries,
        })
    }

    fn create_shader_module(&self, descriptor: &ShaderModuleDescriptor<'_>) -> wgpu::ShaderModule {
        let code = match descriptor.next_in_chain {
            Some(ChainedStruct::ShaderSourceWgsl { code }) => code.as_str(),
            _ => {
                self.log(LoggingType::Warning, "shader module has no WGSL source");
                ""
            }
        };
        self.device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: descriptor.label,
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(code)),
            })
    }

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor<'_, Self>,
    ) -> wgpu::PipelineLayout {
        self.device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: descriptor.label,
                bind_group_layouts: descriptor.bind_group_layouts,
                push_constant_ranges: &[],
            })
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor<'_, Self>,
    ) -> wgpu::RenderPipeline {
        self.render_pipeline(descriptor)
    }

    fn create_render_pipeline_async(
        &self,
        descriptor: &RenderPipelineDescriptor<'_, Self>,
        callback: CreatePipelineCallback<wgpu::RenderPipeline>,
    ) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.render_pipeline(descriptor);
        self.finish_pipeline(pipeline, callback);
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor<'_, Self>,
    ) -> wgpu::ComputePipeline {
        self.compute_pipeline(descriptor)
    }

    fn create_compute_pipeline_async(
        &self,
        descriptor: &ComputePipelineDescriptor<'_, Self>,
        callback: CreatePipelineCallback<wgpu::ComputePipeline>,
    ) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.compute_pipeline(descriptor);
        self.finish_pipeline(pipeline, callback);
    }

    fn create_command_encoder(
        &self,
        descriptor: &CommandEncoderDescriptor<'_>,
    ) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: descriptor.label,
            })
    }

    fn create_query_set(&self, descriptor: &QuerySetDescriptor<'_>) -> wgpu::QuerySet {
        self.device.create_query_set(&wgpu::QuerySetDescriptor {
            label: descriptor.label,
            ty: match descriptor.ty {
                QueryType::Occlusion => wgpu::QueryType::Occlusion,
                QueryType::Timestamp => wgpu::QueryType::Timestamp,
            },
            count: descriptor.count,
        })
    }

    fn queue(&self) -> wgpu::Queue {
        self.queue.clone()
    }

    fn push_error_scope(&self, filter: ErrorFilter) {
        self.scope_depth.fetch_add(1, Ordering::Relaxed);
        self.device.push_error_scope(match filter {
            ErrorFilter::Validation => wgpu::ErrorFilter::Validation,
            ErrorFilter::OutOfMemory => wgpu::ErrorFilter::OutOfMemory,
            ErrorFilter::Internal => wgpu::ErrorFilter::Internal,
        });
    }

    fn pop_error_scope(&self, callback: PopErrorScopeCallback) {
        let popped = self
            .scope_depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| d.checked_sub(1))
            .is_ok();
        if !popped {
            self.spawn(async move { callback(ErrorType::Unknown, "no error scope to pop") });
            return;
        }
        let error = self.device.pop_error_scope();
        self.spawn(async move {
            match error.await {
                None => callback(ErrorType::NoError, ""),
                Some(e) => callback(error_type(&e), &e.to_string()),
            }
        });
    }

    fn set_device_lost_callback(&self, callback: DeviceLostCallback) {
        self.device
            .set_device_lost_callback(move |reason, message: String| {
                let reason = match reason {
                    wgpu::DeviceLostReason::Destroyed => DeviceLostReason::Destroyed,
                    _ => DeviceLostReason::Undefined,
                };
                callback(reason, &message);
            });
    }

    fn set_uncaptured_error_callback(&self, callback: UncapturedErrorCallback) {
        self.device.on_uncaptured_error(Box::new(move |error: wgpu::Error| {
            callback(error_type(&error), &error.to_string());
        }));
    }

    fn set_logging_callback(&self, callback: LoggingCallback) {
        *self.logging.lock().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    fn tick(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            self.log(LoggingType::Warning, &format!("device poll failed: {e}"));
        }
        let mut work = std::mem::take(&mut *self.work());
        let mut cx = Context::from_waker(Waker::noop());
        work.retain_mut(|w| w.as_mut().poll(&mut cx).is_pending());
        //anything spawned while polling was appended meanwhile
        self.work().append(&mut work);
    }

    fn features(&self) -> Vec<FeatureName> {
        let features = self.device.features();
        ALL_FEATURES
            .into_iter()
            .filter(|f| features.contains(feature_flag(*f)))
            .collect()
    }

    fn limits(&self) -> Option<Limits> {
        Some(limits(&self.device.limits()))
    }

    fn destroy(&self) {
        self.device.destroy();
    }
}
