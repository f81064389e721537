// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The strict, flat structures a [Driver](crate::imp::Driver) consumes.

Everything in this module is already validated.  Enum fields are real enums, defaults have been
substituted, and variable-length data lives in arrays owned by a translation bundle elsewhere.
Descriptors here only *borrow* that storage, which is how the driver's requirement that
pointed-to data stays put for the duration of a call is expressed: the borrow cannot outlive the
bundle, and the bundle is dropped by the frame that issued the call.

Handles to previously created objects are the driver's own associated types, so descriptors that
reference other objects are generic over the driver.
*/

use crate::imp::Driver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MipmapFilterMode {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Ccw,
    Cw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    Keep,
    Zero,
    Replace,
    Invert,
    IncrementClamp,
    DecrementClamp,
    IncrementWrap,
    DecrementWrap,
}

/// Which class of errors an error scope captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFilter {
    Validation,
    OutOfMemory,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Occlusion,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
    D3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    D1,
    D2,
    D2Array,
    Cube,
    CubeArray,
    D3,
}

/// Uncompressed texture formats.
///
/// Block-compressed formats are feature-gated on most drivers and are not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8Unorm,
    R8Snorm,
    R8Uint,
    R8Sint,
    R16Uint,
    R16Sint,
    R16Float,
    Rg8Unorm,
    Rg8Snorm,
    Rg8Uint,
    Rg8Sint,
    R32Uint,
    R32Sint,
    R32Float,
    Rg16Uint,
    Rg16Sint,
    Rg16Float,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Rgba8Snorm,
    Rgba8Uint,
    Rgba8Sint,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgb9e5Ufloat,
    Rgb10a2Uint,
    Rgb10a2Unorm,
    Rg32Uint,
    Rg32Sint,
    Rg32Float,
    Rgba16Uint,
    Rgba16Sint,
    Rgba16Float,
    Rgba32Uint,
    Rgba32Sint,
    Rgba32Float,
    Stencil8,
    Depth16Unorm,
    Depth24Plus,
    Depth24PlusStencil8,
    Depth32Float,
    Depth32FloatStencil8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSampleType {
    Float,
    UnfilterableFloat,
    Depth,
    Sint,
    Uint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageTextureAccess {
    WriteOnly,
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferBindingType {
    Uniform,
    Storage,
    ReadOnlyStorage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerBindingType {
    Filtering,
    NonFiltering,
    Comparison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Uint8x2,
    Uint8x4,
    Sint8x2,
    Sint8x4,
    Unorm8x2,
    Unorm8x4,
    Snorm8x2,
    Snorm8x4,
    Uint16x2,
    Uint16x4,
    Sint16x2,
    Sint16x4,
    Unorm16x2,
    Unorm16x4,
    Snorm16x2,
    Snorm16x4,
    Float16x2,
    Float16x4,
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32,
    Uint32x2,
    Uint32x3,
    Uint32x4,
    Sint32,
    Sint32x2,
    Sint32x3,
    Sint32x4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexStepMode {
    Vertex,
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    Src,
    OneMinusSrc,
    SrcAlpha,
    OneMinusSrcAlpha,
    Dst,
    OneMinusDst,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturated,
    Constant,
    OneMinusConstant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Optional capabilities a device may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureName {
    DepthClipControl,
    Depth32FloatStencil8,
    TextureCompressionBc,
    TextureCompressionEtc2,
    TextureCompressionAstc,
    TimestampQuery,
    IndirectFirstInstance,
    ShaderF16,
    Rg11b10UfloatRenderable,
    Bgra8UnormStorage,
    Float32Filterable,
}

impl FeatureName {
    /// The token under which the host sees this feature.
    pub const fn token(self) -> &'static str {
        match self {
            FeatureName::DepthClipControl => "depth-clip-control",
            FeatureName::Depth32FloatStencil8 => "depth32float-stencil8",
            FeatureName::TextureCompressionBc => "texture-compression-bc",
            FeatureName::TextureCompressionEtc2 => "texture-compression-etc2",
            FeatureName::TextureCompressionAstc => "texture-compression-astc",
            FeatureName::TimestampQuery => "timestamp-query",
            FeatureName::IndirectFirstInstance => "indirect-first-instance",
            FeatureName::ShaderF16 => "shader-f16",
            FeatureName::Rg11b10UfloatRenderable => "rg11b10ufloat-renderable",
            FeatureName::Bgra8UnormStorage => "bgra8unorm-storage",
            FeatureName::Float32Filterable => "float32-filterable",
        }
    }
}

/// Resource limits reported by a device.
///
/// `Default` gives the baseline every conforming device supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_texture_dimension_1d: u32,
    pub max_texture_dimension_2d: u32,
    pub max_texture_dimension_3d: u32,
    pub max_texture_array_layers: u32,
    pub max_bind_groups: u32,
    pub max_bindings_per_bind_group: u32,
    pub max_dynamic_uniform_buffers_per_pipeline_layout: u32,
    pub max_dynamic_storage_buffers_per_pipeline_layout: u32,
    pub max_sampled_textures_per_shader_stage: u32,
    pub max_samplers_per_shader_stage: u32,
    pub max_storage_buffers_per_shader_stage: u32,
    pub max_storage_textures_per_shader_stage: u32,
    pub max_uniform_buffers_per_shader_stage: u32,
    pub max_uniform_buffer_binding_size: u64,
    pub max_storage_buffer_binding_size: u64,
    pub min_uniform_buffer_offset_alignment: u32,
    pub min_storage_buffer_offset_alignment: u32,
    pub max_vertex_buffers: u32,
    pub max_buffer_size: u64,
    pub max_vertex_attributes: u32,
    pub max_vertex_buffer_array_stride: u32,
    pub max_color_attachments: u32,
    pub max_color_attachment_bytes_per_sample: u32,
    pub max_compute_workgroup_storage_size: u32,
    pub max_compute_invocations_per_workgroup: u32,
    pub max_compute_workgroup_size_x: u32,
    pub max_compute_workgroup_size_y: u32,
    pub max_compute_workgroup_size_z: u32,
    pub max_compute_workgroups_per_dimension: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_texture_dimension_1d: 8192,
            max_texture_dimension_2d: 8192,
            max_texture_dimension_3d: 2048,
            max_texture_array_layers: 256,
            max_bind_groups: 4,
            max_bindings_per_bind_group: 1000,
            max_dynamic_uniform_buffers_per_pipeline_layout: 8,
            max_dynamic_storage_buffers_per_pipeline_layout: 4,
            max_sampled_textures_per_shader_stage: 16,
            max_samplers_per_shader_stage: 16,
            max_storage_buffers_per_shader_stage: 8,
            max_storage_textures_per_shader_stage: 4,
            max_uniform_buffers_per_shader_stage: 12,
            max_uniform_buffer_binding_size: 65536,
            max_storage_buffer_binding_size: 134_217_728,
            min_uniform_buffer_offset_alignment: 256,
            min_storage_buffer_offset_alignment: 256,
            max_vertex_buffers: 8,
            max_buffer_size: 268_435_456,
            max_vertex_attributes: 16,
            max_vertex_buffer_array_stride: 2048,
            max_color_attachments: 8,
            max_color_attachment_bytes_per_sample: 32,
            max_compute_workgroup_storage_size: 16384,
            max_compute_invocations_per_workgroup: 256,
            max_compute_workgroup_size_x: 256,
            max_compute_workgroup_size_y: 256,
            max_compute_workgroup_size_z: 64,
            max_compute_workgroups_per_dimension: 65535,
        }
    }
}

// Native status codes.  Drivers speaking a C ABI hand these over as integers; `from_raw` keeps
// codes we don't know about instead of dropping them, so every completion still resolves.

/// The class of an error reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    NoError,
    Validation,
    OutOfMemory,
    Internal,
    Unknown,
    DeviceLost,
    /// A code this crate does not recognise.
    Unrecognized(u32),
}

impl ErrorType {
    pub const fn from_raw(code: u32) -> Self {
        match code {
            0 => ErrorType::NoError,
            1 => ErrorType::Validation,
            2 => ErrorType::OutOfMemory,
            3 => ErrorType::Internal,
            4 => ErrorType::Unknown,
            5 => ErrorType::DeviceLost,
            other => ErrorType::Unrecognized(other),
        }
    }
}

/// Outcome of an asynchronous pipeline compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatePipelineAsyncStatus {
    Success,
    ValidationError,
    InternalError,
    DeviceLost,
    DeviceDestroyed,
    Unknown,
    Unrecognized(u32),
}

impl CreatePipelineAsyncStatus {
    pub const fn from_raw(code: u32) -> Self {
        match code {
            0 => CreatePipelineAsyncStatus::Success,
            1 => CreatePipelineAsyncStatus::ValidationError,
            2 => CreatePipelineAsyncStatus::InternalError,
            3 => CreatePipelineAsyncStatus::DeviceLost,
            4 => CreatePipelineAsyncStatus::DeviceDestroyed,
            5 => CreatePipelineAsyncStatus::Unknown,
            other => CreatePipelineAsyncStatus::Unrecognized(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceLostReason {
    Undefined,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoggingType {
    Verbose,
    Info,
    Warning,
    Error,
}

/// Usage bits for buffers, matching the host-visible constants.
pub mod buffer_usage {
    pub const MAP_READ: u32 = 0x0001;
    pub const MAP_WRITE: u32 = 0x0002;
    pub const COPY_SRC: u32 = 0x0004;
    pub const COPY_DST: u32 = 0x0008;
    pub const INDEX: u32 = 0x0010;
    pub const VERTEX: u32 = 0x0020;
    pub const UNIFORM: u32 = 0x0040;
    pub const STORAGE: u32 = 0x0080;
    pub const INDIRECT: u32 = 0x0100;
    pub const QUERY_RESOLVE: u32 = 0x0200;
}

/// Usage bits for textures.
pub mod texture_usage {
    pub const COPY_SRC: u32 = 0x01;
    pub const COPY_DST: u32 = 0x02;
    pub const TEXTURE_BINDING: u32 = 0x04;
    pub const STORAGE_BINDING: u32 = 0x08;
    pub const RENDER_ATTACHMENT: u32 = 0x10;
}

/// Shader stage visibility bits.
pub mod shader_stage {
    pub const VERTEX: u32 = 0x1;
    pub const FRAGMENT: u32 = 0x2;
    pub const COMPUTE: u32 = 0x4;
}

/// Auxiliary structures linked into a descriptor's extension chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainedStruct {
    PrimitiveDepthClipControl { unclipped_depth: bool },
    ShaderSourceWgsl { code: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent3d {
    pub width: u32,
    pub height: u32,
    pub depth_or_array_layers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferDescriptor<'a> {
    pub label: Option<&'a str>,
    pub size: u64,
    pub usage: u32,
    pub mapped_at_creation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDescriptor<'a> {
    pub label: Option<&'a str>,
    pub size: Extent3d,
    pub mip_level_count: u32,
    pub sample_count: u32,
    pub dimension: TextureDimension,
    pub format: TextureFormat,
    pub usage: u32,
    pub view_formats: &'a [TextureFormat],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDescriptor<'a> {
    pub label: Option<&'a str>,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub mipmap_filter: MipmapFilterMode,
    pub lod_min_clamp: f32,
    pub lod_max_clamp: f32,
    pub compare: Option<CompareFunction>,
    pub max_anisotropy: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    Buffer {
        ty: BufferBindingType,
        has_dynamic_offset: bool,
        min_binding_size: u64,
    },
    Sampler(SamplerBindingType),
    Texture {
        sample_type: TextureSampleType,
        view_dimension: TextureViewDimension,
        multisampled: bool,
    },
    StorageTexture {
        access: StorageTextureAccess,
        format: TextureFormat,
        view_dimension: TextureViewDimension,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub visibility: u32,
    pub ty: BindingType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindGroupLayoutDescriptor<'a> {
    pub label: Option<&'a str>,
    pub entries: &'a [BindGroupLayoutEntry],
}

pub enum BindingResource<'a, D: Driver + ?Sized> {
    Buffer {
        buffer: &'a D::Buffer,
        offset: u64,
        /// `None` binds the rest of the buffer.
        size: Option<u64>,
    },
    Sampler(&'a D::Sampler),
    TextureView(&'a D::TextureView),
}

pub struct BindGroupEntry<'a, D: Driver + ?Sized> {
    pub binding: u32,
    pub resource: BindingResource<'a, D>,
}

pub struct BindGroupDescriptor<'a, D: Driver + ?Sized> {
    pub label: Option<&'a str>,
    pub layout: &'a D::BindGroupLayout,
    pub entries: &'a [BindGroupEntry<'a, D>],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderModuleDescriptor<'a> {
    pub next_in_chain: Option<&'a ChainedStruct>,
    pub label: Option<&'a str>,
}

pub struct PipelineLayoutDescriptor<'a, D: Driver + ?Sized> {
    pub label: Option<&'a str>,
    pub bind_group_layouts: &'a [&'a D::BindGroupLayout],
}

/// A pipeline-overridable constant.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantEntry {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub format: VertexFormat,
    pub offset: u64,
    pub shader_location: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferLayout {
    pub array_stride: u64,
    pub step_mode: VertexStepMode,
    pub attributes: Vec<VertexAttribute>,
}

pub struct ProgrammableStage<'a, D: Driver + ?Sized> {
    pub module: &'a D::ShaderModule,
    pub entry_point: Option<&'a str>,
    pub constants: &'a [ConstantEntry],
}

pub struct VertexState<'a, D: Driver + ?Sized> {
    pub stage: ProgrammableStage<'a, D>,
    pub buffers: &'a [VertexBufferLayout],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveState {
    pub topology: PrimitiveTopology,
    pub strip_index_format: Option<IndexFormat>,
    pub front_face: FrontFace,
    pub cull_mode: CullMode,
}

impl Default for PrimitiveState {
    fn default() -> Self {
        PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: CullMode::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilFaceState {
    pub compare: CompareFunction,
    pub fail_op: StencilOperation,
    pub depth_fail_op: StencilOperation,
    pub pass_op: StencilOperation,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        StencilFaceState {
            compare: CompareFunction::Always,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilState {
    pub format: TextureFormat,
    pub depth_write_enabled: bool,
    pub depth_compare: Option<CompareFunction>,
    pub stencil_front: StencilFaceState,
    pub stencil_back: StencilFaceState,
    pub stencil_read_mask: u32,
    pub stencil_write_mask: u32,
    pub depth_bias: i32,
    pub depth_bias_slope_scale: f32,
    pub depth_bias_clamp: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultisampleState {
    pub count: u32,
    pub mask: u32,
    pub alpha_to_coverage_enabled: bool,
}

impl Default for MultisampleState {
    fn default() -> Self {
        MultisampleState {
            count: 1,
            mask: 0xFFFF_FFFF,
            alpha_to_coverage_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendComponent {
    pub operation: BlendOperation,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
}

impl Default for BlendComponent {
    fn default() -> Self {
        BlendComponent {
            operation: BlendOperation::Add,
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::Zero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTargetState {
    pub format: TextureFormat,
    pub blend: Option<BlendState>,
    pub write_mask: u32,
}

pub struct FragmentState<'a, D: Driver + ?Sized> {
    pub stage: ProgrammableStage<'a, D>,
    /// `None` entries are holes in the attachment list.
    pub targets: &'a [Option<ColorTargetState>],
}

pub struct RenderPipelineDescriptor<'a, D: Driver + ?Sized> {
    pub next_in_chain: Option<&'a ChainedStruct>,
    pub label: Option<&'a str>,
    /// `None` asks the driver to derive the layout from the shaders.
    pub layout: Option<&'a D::PipelineLayout>,
    pub vertex: VertexState<'a, D>,
    pub primitive: PrimitiveState,
    pub depth_stencil: Option<&'a DepthStencilState>,
    pub multisample: MultisampleState,
    pub fragment: Option<FragmentState<'a, D>>,
}

pub struct ComputePipelineDescriptor<'a, D: Driver + ?Sized> {
    pub label: Option<&'a str>,
    pub layout: Option<&'a D::PipelineLayout>,
    pub compute: ProgrammableStage<'a, D>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEncoderDescriptor<'a> {
    pub label: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySetDescriptor<'a> {
    pub label: Option<&'a str>,
    pub ty: QueryType,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_codes_never_drop_unknown_values() {
        assert_eq!(ErrorType::from_raw(1), ErrorType::Validation);
        assert_eq!(ErrorType::from_raw(5), ErrorType::DeviceLost);
        assert_eq!(ErrorType::from_raw(0x7FFF_FFFF), ErrorType::Unrecognized(0x7FFF_FFFF));
        assert_eq!(CreatePipelineAsyncStatus::from_raw(0), CreatePipelineAsyncStatus::Success);
        assert_eq!(
            CreatePipelineAsyncStatus::from_raw(42),
            CreatePipelineAsyncStatus::Unrecognized(42)
        );
    }

    #[test]
    fn baseline_defaults() {
        let p = PrimitiveState::default();
        assert_eq!(p.topology, PrimitiveTopology::TriangleList);
        assert_eq!(p.cull_mode, CullMode::None);
        assert_eq!(MultisampleState::default().mask, 0xFFFF_FFFF);
        assert_eq!(StencilFaceState::default().pass_op, StencilOperation::Keep);
    }
}
