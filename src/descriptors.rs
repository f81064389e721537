// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Descriptors as the host writes them.

These mirror the host API's dictionaries: enum-valued fields are tokens such as `"clamp-to-edge"`,
optional fields are `Option`, and objects created earlier are referenced by borrowing their
wrappers.  Nothing here is validated; see [translate](crate::translate) for that.
*/

use crate::imp::Driver;
use crate::objects::{
    BindGroupLayout, Buffer, PipelineLayout, Sampler, ShaderModule, TextureView,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    pub size: u64,
    pub usage: u32,
    pub mapped_at_creation: bool,
}

impl BufferDescriptor {
    pub fn new(size: u64, usage: u32) -> Self {
        BufferDescriptor {
            size,
            usage,
            ..Default::default()
        }
    }
}

/// The record form of a texture extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent3dDict {
    pub width: u32,
    pub height: Option<u32>,
    pub depth_or_array_layers: Option<u32>,
}

/// A texture extent, either positional (`[w, h, d]`) or as a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extent3d {
    Sequence(Vec<u32>),
    Dict(Extent3dDict),
}

impl From<Vec<u32>> for Extent3d {
    fn from(v: Vec<u32>) -> Self {
        Extent3d::Sequence(v)
    }
}

impl<const N: usize> From<[u32; N]> for Extent3d {
    fn from(v: [u32; N]) -> Self {
        Extent3d::Sequence(v.to_vec())
    }
}

impl From<Extent3dDict> for Extent3d {
    fn from(d: Extent3dDict) -> Self {
        Extent3d::Dict(d)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub size: Extent3d,
    pub mip_level_count: Option<u32>,
    pub sample_count: Option<u32>,
    pub dimension: Option<String>,
    pub format: String,
    pub usage: u32,
    pub view_formats: Option<Vec<String>>,
}

impl TextureDescriptor {
    pub fn new(size: impl Into<Extent3d>, format: impl Into<String>, usage: u32) -> Self {
        TextureDescriptor {
            label: None,
            size: size.into(),
            mip_level_count: None,
            sample_count: None,
            dimension: None,
            format: format.into(),
            usage,
            view_formats: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplerDescriptor {
    pub label: Option<String>,
    pub address_mode_u: Option<String>,
    pub address_mode_v: Option<String>,
    pub address_mode_w: Option<String>,
    pub mag_filter: Option<String>,
    pub min_filter: Option<String>,
    pub mipmap_filter: Option<String>,
    pub lod_min_clamp: Option<f32>,
    pub lod_max_clamp: Option<f32>,
    pub compare: Option<String>,
    pub max_anisotropy: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferBindingLayout {
    pub ty: Option<String>,
    pub has_dynamic_offset: Option<bool>,
    pub min_binding_size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerBindingLayout {
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureBindingLayout {
    pub sample_type: Option<String>,
    pub view_dimension: Option<String>,
    pub multisampled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageTextureBindingLayout {
    pub access: Option<String>,
    pub format: String,
    pub view_dimension: Option<String>,
}

/// One binding slot.  Exactly one of the four layout members must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub visibility: u32,
    pub buffer: Option<BufferBindingLayout>,
    pub sampler: Option<SamplerBindingLayout>,
    pub texture: Option<TextureBindingLayout>,
    pub storage_texture: Option<StorageTextureBindingLayout>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindGroupLayoutDescriptor {
    pub label: Option<String>,
    pub entries: Vec<BindGroupLayoutEntry>,
}

pub struct BufferBinding<'a, D: Driver> {
    pub buffer: &'a Buffer<D>,
    pub offset: Option<u64>,
    /// `None` binds from `offset` to the end of the buffer.
    pub size: Option<u64>,
}

pub enum BindingResource<'a, D: Driver> {
    Sampler(&'a Sampler<D>),
    TextureView(&'a TextureView<D>),
    Buffer(BufferBinding<'a, D>),
}

pub struct BindGroupEntry<'a, D: Driver> {
    pub binding: u32,
    pub resource: BindingResource<'a, D>,
}

pub struct BindGroupDescriptor<'a, D: Driver> {
    pub label: Option<String>,
    pub layout: &'a BindGroupLayout<D>,
    pub entries: Vec<BindGroupEntry<'a, D>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderModuleDescriptor {
    pub label: Option<String>,
    /// WGSL source.
    pub code: String,
}

pub struct PipelineLayoutDescriptor<'a, D: Driver> {
    pub label: Option<String>,
    pub bind_group_layouts: Vec<&'a BindGroupLayout<D>>,
}

/// The `layout` member of a pipeline descriptor.
pub enum LayoutChoice<'a, D: Driver> {
    /// A layout mode token.  Only `"auto"` is accepted.
    Mode(String),
    Layout(&'a PipelineLayout<D>),
}

impl<'a, D: Driver> LayoutChoice<'a, D> {
    pub fn auto() -> Self {
        LayoutChoice::Mode("auto".to_owned())
    }
}

pub struct ProgrammableStage<'a, D: Driver> {
    pub module: &'a ShaderModule<D>,
    pub entry_point: Option<String>,
    /// Pipeline-overridable constants, in the order the host listed them.
    pub constants: Vec<(String, f64)>,
}

impl<'a, D: Driver> ProgrammableStage<'a, D> {
    pub fn new(module: &'a ShaderModule<D>, entry_point: impl Into<String>) -> Self {
        ProgrammableStage {
            module,
            entry_point: Some(entry_point.into()),
            constants: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    pub format: String,
    pub offset: u64,
    pub shader_location: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexBufferLayout {
    pub array_stride: u64,
    pub step_mode: Option<String>,
    pub attributes: Vec<VertexAttribute>,
}

pub struct VertexState<'a, D: Driver> {
    pub stage: ProgrammableStage<'a, D>,
    pub buffers: Vec<VertexBufferLayout>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimitiveState {
    pub topology: Option<String>,
    pub strip_index_format: Option<String>,
    pub front_face: Option<String>,
    pub cull_mode: Option<String>,
    pub unclipped_depth: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StencilFaceState {
    pub compare: Option<String>,
    pub fail_op: Option<String>,
    pub depth_fail_op: Option<String>,
    pub pass_op: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthStencilState {
    pub format: String,
    pub depth_write_enabled: bool,
    pub depth_compare: Option<String>,
    pub stencil_front: Option<StencilFaceState>,
    pub stencil_back: Option<StencilFaceState>,
    pub stencil_read_mask: Option<u32>,
    pub stencil_write_mask: Option<u32>,
    pub depth_bias: Option<i32>,
    pub depth_bias_slope_scale: Option<f32>,
    pub depth_bias_clamp: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultisampleState {
    pub count: Option<u32>,
    pub mask: Option<u32>,
    pub alpha_to_coverage_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlendComponent {
    pub operation: Option<String>,
    pub src_factor: Option<String>,
    pub dst_factor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTargetState {
    pub format: String,
    pub blend: Option<BlendState>,
    pub write_mask: Option<u32>,
}

impl ColorTargetState {
    pub fn new(format: impl Into<String>) -> Self {
        ColorTargetState {
            format: format.into(),
            blend: None,
            write_mask: None,
        }
    }
}

pub struct FragmentState<'a, D: Driver> {
    pub stage: ProgrammableStage<'a, D>,
    pub targets: Vec<Option<ColorTargetState>>,
}

pub struct RenderPipelineDescriptor<'a, D: Driver> {
    pub label: Option<String>,
    pub layout: LayoutChoice<'a, D>,
    pub vertex: VertexState<'a, D>,
    pub primitive: Option<PrimitiveState>,
    pub depth_stencil: Option<DepthStencilState>,
    pub multisample: Option<MultisampleState>,
    pub fragment: Option<FragmentState<'a, D>>,
}

impl<'a, D: Driver> RenderPipelineDescriptor<'a, D> {
    /// A descriptor with an automatic layout and every optional state left unset.
    pub fn new(vertex: ProgrammableStage<'a, D>) -> Self {
        RenderPipelineDescriptor {
            label: None,
            layout: LayoutChoice::auto(),
            vertex: VertexState {
                stage: vertex,
                buffers: Vec::new(),
            },
            primitive: None,
            depth_stencil: None,
            multisample: None,
            fragment: None,
        }
    }
}

pub struct ComputePipelineDescriptor<'a, D: Driver> {
    pub label: Option<String>,
    pub layout: LayoutChoice<'a, D>,
    pub compute: ProgrammableStage<'a, D>,
}

impl<'a, D: Driver> ComputePipelineDescriptor<'a, D> {
    pub fn new(compute: ProgrammableStage<'a, D>) -> Self {
        ComputePipelineDescriptor {
            label: None,
            layout: LayoutChoice::auto(),
            compute,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandEncoderDescriptor {
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySetDescriptor {
    pub label: Option<String>,
    pub ty: String,
    pub count: u32,
}
