// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Render and compute pipelines.

use super::layout_choice;
use super::tokens::{parse, parse_or};
use crate::descriptors::{
    BlendComponent, ColorTargetState, ComputePipelineDescriptor, DepthStencilState,
    FragmentState, MultisampleState, PrimitiveState, ProgrammableStage, RenderPipelineDescriptor,
    StencilFaceState, VertexBufferLayout,
};
use crate::error::TranslateError;
use crate::imp::Driver;
use crate::native::{self, ChainedStruct, ConstantEntry};

/// One shader stage with its flattened constants.
struct StageScratch<'a, D: Driver> {
    module: &'a D::ShaderModule,
    entry_point: Option<&'a str>,
    constants: Vec<ConstantEntry>,
}

impl<'a, D: Driver> StageScratch<'a, D> {
    fn new(stage: &'a ProgrammableStage<'a, D>) -> Self {
        StageScratch {
            module: stage.module.raw(),
            entry_point: stage.entry_point.as_deref(),
            constants: stage
                .constants
                .iter()
                .map(|(key, value)| ConstantEntry {
                    key: key.clone(),
                    value: *value,
                })
                .collect(),
        }
    }

    fn stage(&self) -> native::ProgrammableStage<'_, D> {
        native::ProgrammableStage {
            module: self.module,
            entry_point: self.entry_point,
            constants: &self.constants,
        }
    }
}

fn vertex_buffer(
    layout: &VertexBufferLayout,
) -> Result<native::VertexBufferLayout, TranslateError> {
    Ok(native::VertexBufferLayout {
        array_stride: layout.array_stride,
        step_mode: parse_or("stepMode", layout.step_mode.as_deref(), "vertex")?,
        attributes: layout
            .attributes
            .iter()
            .map(|a| {
                Ok(native::VertexAttribute {
                    format: parse("format", &a.format)?,
                    offset: a.offset,
                    shader_location: a.shader_location,
                })
            })
            .collect::<Result<_, TranslateError>>()?,
    })
}

fn primitive(state: Option<&PrimitiveState>) -> Result<native::PrimitiveState, TranslateError> {
    let Some(state) = state else {
        return Ok(native::PrimitiveState::default());
    };
    Ok(native::PrimitiveState {
        topology: parse_or("topology", state.topology.as_deref(), "triangle-list")?,
        strip_index_format: state
            .strip_index_format
            .as_deref()
            .map(|f| parse("stripIndexFormat", f))
            .transpose()?,
        front_face: parse_or("frontFace", state.front_face.as_deref(), "ccw")?,
        cull_mode: parse_or("cullMode", state.cull_mode.as_deref(), "none")?,
    })
}

fn stencil_face(
    state: Option<&StencilFaceState>,
) -> Result<native::StencilFaceState, TranslateError> {
    let Some(state) = state else {
        return Ok(native::StencilFaceState::default());
    };
    Ok(native::StencilFaceState {
        compare: parse_or("compare", state.compare.as_deref(), "always")?,
        fail_op: parse_or("failOp", state.fail_op.as_deref(), "keep")?,
        depth_fail_op: parse_or("depthFailOp", state.depth_fail_op.as_deref(), "keep")?,
        pass_op: parse_or("passOp", state.pass_op.as_deref(), "keep")?,
    })
}

fn depth_stencil(state: &DepthStencilState) -> Result<native::DepthStencilState, TranslateError> {
    Ok(native::DepthStencilState {
        format: parse("format", &state.format)?,
        depth_write_enabled: state.depth_write_enabled,
        depth_compare: state
            .depth_compare
            .as_deref()
            .map(|c| parse("depthCompare", c))
            .transpose()?,
        stencil_front: stencil_face(state.stencil_front.as_ref())?,
        stencil_back: stencil_face(state.stencil_back.as_ref())?,
        stencil_read_mask: state.stencil_read_mask.unwrap_or(0xFFFF_FFFF),
        stencil_write_mask: state.stencil_write_mask.unwrap_or(0xFFFF_FFFF),
        depth_bias: state.depth_bias.unwrap_or(0),
        depth_bias_slope_scale: state.depth_bias_slope_scale.unwrap_or(0.0),
        depth_bias_clamp: state.depth_bias_clamp.unwrap_or(0.0),
    })
}

fn multisample(state: Option<&MultisampleState>) -> native::MultisampleState {
    let defaults = native::MultisampleState::default();
    match state {
        None => defaults,
        Some(state) => native::MultisampleState {
            count: state.count.unwrap_or(defaults.count),
            mask: state.mask.unwrap_or(defaults.mask),
            alpha_to_coverage_enabled: state
                .alpha_to_coverage_enabled
                .unwrap_or(defaults.alpha_to_coverage_enabled),
        },
    }
}

fn blend_component(component: &BlendComponent) -> Result<native::BlendComponent, TranslateError> {
    Ok(native::BlendComponent {
        operation: parse_or("operation", component.operation.as_deref(), "add")?,
        src_factor: parse_or("srcFactor", component.src_factor.as_deref(), "one")?,
        dst_factor: parse_or("dstFactor", component.dst_factor.as_deref(), "zero")?,
    })
}

fn color_target(target: &ColorTargetState) -> Result<native::ColorTargetState, TranslateError> {
    Ok(native::ColorTargetState {
        format: parse("format", &target.format)?,
        blend: target
            .blend
            .as_ref()
            .map(|blend| {
                Ok::<_, TranslateError>(native::BlendState {
                    color: blend_component(&blend.color)?,
                    alpha: blend_component(&blend.alpha)?,
                })
            })
            .transpose()?,
        write_mask: target.write_mask.unwrap_or(0xF),
    })
}

struct FragmentScratch<'a, D: Driver> {
    stage: StageScratch<'a, D>,
    targets: Vec<Option<native::ColorTargetState>>,
}

fn fragment<'a, D: Driver>(
    state: &'a FragmentState<'a, D>,
) -> Result<FragmentScratch<'a, D>, TranslateError> {
    Ok(FragmentScratch {
        stage: StageScratch::new(&state.stage),
        targets: state
            .targets
            .iter()
            .map(|t| t.as_ref().map(color_target).transpose())
            .collect::<Result<_, _>>()?,
    })
}

/**
Owns everything a render pipeline descriptor points at.

The depth-clip extension node exists only when the host asked for unclipped depth.
*/
pub struct RenderPipelineScratch<'a, D: Driver> {
    label: Option<&'a str>,
    layout: Option<&'a D::PipelineLayout>,
    vertex: StageScratch<'a, D>,
    vertex_buffers: Vec<native::VertexBufferLayout>,
    primitive: native::PrimitiveState,
    depth_clip: Option<Box<ChainedStruct>>,
    depth_stencil: Option<native::DepthStencilState>,
    multisample: native::MultisampleState,
    fragment: Option<FragmentScratch<'a, D>>,
}

impl<D: Driver> RenderPipelineScratch<'_, D> {
    pub fn descriptor(&self) -> native::RenderPipelineDescriptor<'_, D> {
        native::RenderPipelineDescriptor {
            next_in_chain: self.depth_clip.as_deref(),
            label: self.label,
            layout: self.layout,
            vertex: native::VertexState {
                stage: self.vertex.stage(),
                buffers: &self.vertex_buffers,
            },
            primitive: self.primitive,
            depth_stencil: self.depth_stencil.as_ref(),
            multisample: self.multisample,
            fragment: self.fragment.as_ref().map(|f| native::FragmentState {
                stage: f.stage.stage(),
                targets: &f.targets,
            }),
        }
    }
}

pub fn render_pipeline<'a, D: Driver>(
    desc: &'a RenderPipelineDescriptor<'a, D>,
) -> Result<RenderPipelineScratch<'a, D>, TranslateError> {
    let unclipped_depth = desc
        .primitive
        .as_ref()
        .and_then(|p| p.unclipped_depth)
        .unwrap_or(false);
    Ok(RenderPipelineScratch {
        label: desc.label.as_deref(),
        layout: layout_choice(&desc.layout)?,
        vertex: StageScratch::new(&desc.vertex.stage),
        vertex_buffers: desc
            .vertex
            .buffers
            .iter()
            .map(vertex_buffer)
            .collect::<Result<_, _>>()?,
        primitive: primitive(desc.primitive.as_ref())?,
        depth_clip: unclipped_depth.then(|| {
            Box::new(ChainedStruct::PrimitiveDepthClipControl {
                unclipped_depth: true,
            })
        }),
        depth_stencil: desc.depth_stencil.as_ref().map(depth_stencil).transpose()?,
        multisample: multisample(desc.multisample.as_ref()),
        fragment: desc.fragment.as_ref().map(fragment).transpose()?,
    })
}

pub struct ComputePipelineScratch<'a, D: Driver> {
    label: Option<&'a str>,
    layout: Option<&'a D::PipelineLayout>,
    compute: StageScratch<'a, D>,
}

impl<D: Driver> ComputePipelineScratch<'_, D> {
    pub fn descriptor(&self) -> native::ComputePipelineDescriptor<'_, D> {
        native::ComputePipelineDescriptor {
            label: self.label,
            layout: self.layout,
            compute: self.compute.stage(),
        }
    }
}

pub fn compute_pipeline<'a, D: Driver>(
    desc: &'a ComputePipelineDescriptor<'a, D>,
) -> Result<ComputePipelineScratch<'a, D>, TranslateError> {
    Ok(ComputePipelineScratch {
        label: desc.label.as_deref(),
        layout: layout_choice(&desc.layout)?,
        compute: StageScratch::new(&desc.compute),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{BlendState, LayoutChoice, VertexAttribute};
    use crate::imp::SimulatedDriver;
    use crate::keepalive::Keepalive;
    use crate::native::{
        BlendFactor, BlendOperation, CompareFunction, CullMode, FrontFace, IndexFormat,
        PrimitiveTopology, StencilOperation, TextureFormat, VertexFormat, VertexStepMode,
    };
    use crate::objects::{PipelineLayout, ShaderModule};
    use crate::config::TickStrategy;

    fn module(driver: &SimulatedDriver, keepalive: &Keepalive) -> ShaderModule<SimulatedDriver> {
        let host = crate::descriptors::ShaderModuleDescriptor {
            label: None,
            code: String::new(),
        };
        let scratch = crate::translate::shader_module(&host);
        ShaderModule::new(driver.create_shader_module(&scratch.descriptor()), keepalive.token())
    }

    #[test]
    fn render_defaults() {
        let driver = SimulatedDriver::new();
        let keepalive = Keepalive::new(|| {}, TickStrategy::HostTurn);
        let module = module(&driver, &keepalive);
        let desc = RenderPipelineDescriptor::new(ProgrammableStage::new(&module, "vs"));
        let scratch = render_pipeline(&desc).unwrap();
        let native = scratch.descriptor();

        assert!(native.next_in_chain.is_none());
        assert!(native.layout.is_none());
        assert_eq!(native.primitive, native::PrimitiveState::default());
        assert_eq!(native.primitive.topology, PrimitiveTopology::TriangleList);
        assert_eq!(native.primitive.front_face, FrontFace::Ccw);
        assert_eq!(native.primitive.cull_mode, CullMode::None);
        assert_eq!(native.multisample.count, 1);
        assert_eq!(native.multisample.mask, 0xFFFF_FFFF);
        assert!(!native.multisample.alpha_to_coverage_enabled);
        assert!(native.depth_stencil.is_none());
        assert!(native.fragment.is_none());
        assert_eq!(native.vertex.stage.entry_point, Some("vs"));
        assert!(native.vertex.stage.constants.is_empty());
    }

    #[test]
    fn unclipped_depth_chains_extension() {
        let driver = SimulatedDriver::new();
        let keepalive = Keepalive::new(|| {}, TickStrategy::HostTurn);
        let module = module(&driver, &keepalive);
        let mut desc = RenderPipelineDescriptor::new(ProgrammableStage::new(&module, "vs"));
        desc.primitive = Some(PrimitiveState {
            unclipped_depth: Some(false),
            ..Default::default()
        });
        assert!(render_pipeline(&desc).unwrap().descriptor().next_in_chain.is_none());

        desc.primitive = Some(PrimitiveState {
            unclipped_depth: Some(true),
            topology: Some("triangle-strip".into()),
            strip_index_format: Some("uint32".into()),
            ..Default::default()
        });
        let scratch = render_pipeline(&desc).unwrap();
        let native = scratch.descriptor();
        assert_eq!(
            native.next_in_chain,
            Some(&ChainedStruct::PrimitiveDepthClipControl {
                unclipped_depth: true
            })
        );
        assert_eq!(native.primitive.topology, PrimitiveTopology::TriangleStrip);
        assert_eq!(native.primitive.strip_index_format, Some(IndexFormat::Uint32));
    }

    #[test]
    fn depth_stencil_defaults() {
        let driver = SimulatedDriver::new();
        let keepalive = Keepalive::new(|| {}, TickStrategy::HostTurn);
        let module = module(&driver, &keepalive);
        let mut desc = RenderPipelineDescriptor::new(ProgrammableStage::new(&module, "vs"));
        desc.depth_stencil = Some(DepthStencilState {
            format: "depth24plus-stencil8".into(),
            depth_write_enabled: true,
            depth_compare: Some("less".into()),
            ..Default::default()
        });
        let scratch = render_pipeline(&desc).unwrap();
        let ds = *scratch.descriptor().depth_stencil.unwrap();
        assert_eq!(ds.format, TextureFormat::Depth24PlusStencil8);
        assert_eq!(ds.depth_compare, Some(CompareFunction::Less));
        for face in [ds.stencil_front, ds.stencil_back] {
            assert_eq!(face.compare, CompareFunction::Always);
            assert_eq!(face.fail_op, StencilOperation::Keep);
            assert_eq!(face.depth_fail_op, StencilOperation::Keep);
            assert_eq!(face.pass_op, StencilOperation::Keep);
        }
        assert_eq!(ds.stencil_read_mask, 0xFFFF_FFFF);
        assert_eq!(ds.stencil_write_mask, 0xFFFF_FFFF);
        assert_eq!(ds.depth_bias, 0);
        assert_eq!(ds.depth_bias_slope_scale, 0.0);
        assert_eq!(ds.depth_bias_clamp, 0.0);
    }

    #[test]
    fn vertex_buffers_fragment_targets_and_constants() {
        let driver = SimulatedDriver::new();
        let keepalive = Keepalive::new(|| {}, TickStrategy::HostTurn);
        let module = module(&driver, &keepalive);
        let mut vertex = ProgrammableStage::new(&module, "vs");
        vertex.constants = vec![("scale".into(), 2.0), ("bias".into(), -1.0)];
        let mut desc = RenderPipelineDescriptor::new(vertex);
        desc.vertex.buffers = vec![VertexBufferLayout {
            array_stride: 16,
            step_mode: None,
            attributes: vec![VertexAttribute {
                format: "float32x4".into(),
                offset: 0,
                shader_location: 0,
            }],
        }];
        desc.fragment = Some(FragmentState {
            stage: ProgrammableStage::new(&module, "fs"),
            targets: vec![
                Some(ColorTargetState {
                    format: "bgra8unorm".into(),
                    blend: Some(BlendState::default()),
                    write_mask: None,
                }),
                None,
            ],
        });
        let scratch = render_pipeline(&desc).unwrap();
        let native = scratch.descriptor();

        let constants = native.vertex.stage.constants;
        assert_eq!(constants.len(), 2);
        assert_eq!(constants[0].key, "scale");
        assert_eq!(constants[1].value, -1.0);

        let buffer = &native.vertex.buffers[0];
        assert_eq!(buffer.step_mode, VertexStepMode::Vertex);
        assert_eq!(buffer.attributes[0].format, VertexFormat::Float32x4);

        let fragment = native.fragment.as_ref().unwrap();
        assert_eq!(fragment.stage.entry_point, Some("fs"));
        assert_eq!(fragment.targets.len(), 2);
        assert!(fragment.targets[1].is_none());
        let target = fragment.targets[0].unwrap();
        assert_eq!(target.write_mask, 0xF);
        let blend = target.blend.unwrap();
        assert_eq!(blend.color.operation, BlendOperation::Add);
        assert_eq!(blend.color.src_factor, BlendFactor::One);
        assert_eq!(blend.alpha.dst_factor, BlendFactor::Zero);
    }

    #[test]
    fn layout_sentinel() {
        let driver = SimulatedDriver::new();
        let keepalive = Keepalive::new(|| {}, TickStrategy::HostTurn);
        let module = module(&driver, &keepalive);
        let mut desc = ComputePipelineDescriptor::new(ProgrammableStage::new(&module, "main"));
        assert!(compute_pipeline(&desc).unwrap().descriptor().layout.is_none());

        desc.layout = LayoutChoice::Mode("manual".into());
        assert_eq!(
            compute_pipeline(&desc).err(),
            Some(TranslateError::UnknownLayoutMode("manual".into()))
        );

        let layout = PipelineLayout::<SimulatedDriver>::from_raw(driver.create_pipeline_layout(
            &native::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &[],
            },
        ));
        desc.layout = LayoutChoice::Layout(&layout);
        let scratch = compute_pipeline(&desc).unwrap();
        assert_eq!(scratch.descriptor().layout, Some(layout.raw()));
    }

    #[test]
    fn unknown_tokens_name_the_field() {
        let driver = SimulatedDriver::new();
        let keepalive = Keepalive::new(|| {}, TickStrategy::HostTurn);
        let module = module(&driver, &keepalive);
        let mut desc = RenderPipelineDescriptor::new(ProgrammableStage::new(&module, "vs"));
        desc.primitive = Some(PrimitiveState {
            cull_mode: Some("both".into()),
            ..Default::default()
        });
        assert_eq!(
            render_pipeline(&desc).err(),
            Some(TranslateError::UnknownToken {
                field: "cullMode",
                value: "both".into()
            })
        );
    }
}
