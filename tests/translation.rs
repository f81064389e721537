// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Host descriptors through a device, end to end.

use gpu_bridge::descriptors::{
    BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingResource, BufferBinding, BufferBindingLayout, BufferDescriptor, ColorTargetState,
    CommandEncoderDescriptor, FragmentState, LayoutChoice, PipelineLayoutDescriptor,
    PrimitiveState, ProgrammableStage, QuerySetDescriptor, RenderPipelineDescriptor,
    SamplerBindingLayout, SamplerDescriptor, ShaderModuleDescriptor, TextureDescriptor,
};
use gpu_bridge::imp::SimulatedDriver;
use gpu_bridge::native::{QueryType, TextureFormat, buffer_usage, shader_stage, texture_usage};
use gpu_bridge::{Device, DeviceOptions, TranslateError};

fn device() -> Device<SimulatedDriver> {
    Device::headless(SimulatedDriver::new(), DeviceOptions::default())
}

#[test]
fn texture_defaults_and_views() {
    let device = device();
    let mut descriptor =
        TextureDescriptor::new([64u32, 32], "rgba8unorm-srgb", texture_usage::TEXTURE_BINDING);
    descriptor.label = Some("albedo".to_owned());
    let texture = device.create_texture(&descriptor).unwrap();
    assert_eq!(texture.format(), TextureFormat::Rgba8UnormSrgb);
    assert_eq!(texture.size().depth_or_array_layers, 1);
    assert_eq!(texture.mip_level_count(), 1);
    assert_eq!(texture.sample_count(), 1);

    let view = texture.create_view(Some("albedo view"));
    assert_eq!(view.raw().label(), Some("albedo view"));
    assert_eq!(device.driver().created("texture_view"), 1);
}

#[test]
fn malformed_descriptors_never_reach_the_driver() {
    let device = device();
    let empty = TextureDescriptor::new(Vec::<u32>::new(), "r8unorm", texture_usage::COPY_DST);
    assert_eq!(
        device.create_texture(&empty).unwrap_err(),
        TranslateError::EmptyExtent
    );

    let sampler = SamplerDescriptor {
        address_mode_u: Some("wrap".to_owned()),
        ..SamplerDescriptor::default()
    };
    assert!(matches!(
        device.create_sampler(&sampler),
        Err(TranslateError::UnknownToken { .. })
    ));

    let query = QuerySetDescriptor {
        label: None,
        ty: "pipeline-statistics".to_owned(),
        count: 4,
    };
    assert!(device.create_query_set(&query).is_err());

    assert_eq!(device.driver().created("texture"), 0);
    assert_eq!(device.driver().created("sampler"), 0);
    assert_eq!(device.driver().created("query_set"), 0);
}

#[test]
fn bind_group_round_trip() {
    let device = device();
    let layout = device
        .create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("globals".to_owned()),
            entries: vec![
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: shader_stage::VERTEX | shader_stage::FRAGMENT,
                    buffer: Some(BufferBindingLayout::default()),
                    ..BindGroupLayoutEntry::default()
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: shader_stage::FRAGMENT,
                    sampler: Some(SamplerBindingLayout::default()),
                    ..BindGroupLayoutEntry::default()
                },
            ],
        })
        .unwrap();
    let buffer = device.create_buffer(&BufferDescriptor::new(
        256,
        buffer_usage::UNIFORM | buffer_usage::COPY_DST,
    ));
    assert_eq!(buffer.size(), 256);
    let sampler = device.create_sampler(&SamplerDescriptor::default()).unwrap();

    let group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("globals".to_owned()),
        layout: &layout,
        entries: vec![
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::Buffer(BufferBinding {
                    buffer: &buffer,
                    offset: None,
                    size: None,
                }),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::Sampler(&sampler),
            },
        ],
    });
    assert_eq!(group.raw().kind(), "bind_group");

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: None,
        bind_group_layouts: vec![&layout],
    });
    assert_eq!(pipeline_layout.raw().kind(), "pipeline_layout");
}

#[test]
fn layout_entry_needs_exactly_one_type() {
    let device = device();
    let result = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: None,
        entries: vec![BindGroupLayoutEntry {
            binding: 3,
            visibility: shader_stage::COMPUTE,
            ..BindGroupLayoutEntry::default()
        }],
    });
    assert_eq!(
        result.unwrap_err(),
        TranslateError::BindingTypeCount {
            binding: 3,
            count: 0
        }
    );
}

#[test]
fn render_pipeline_with_fragment_and_explicit_layout() {
    let device = device();
    let module = device.create_shader_module(&ShaderModuleDescriptor {
        label: None,
        code: "@vertex fn vs() -> @builtin(position) vec4f { return vec4f(); }".to_owned(),
    });
    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: None,
        bind_group_layouts: Vec::new(),
    });
    let mut descriptor = RenderPipelineDescriptor::new(ProgrammableStage::new(&module, "vs"));
    descriptor.layout = LayoutChoice::Layout(&pipeline_layout);
    descriptor.primitive = Some(PrimitiveState {
        cull_mode: Some("back".to_owned()),
        unclipped_depth: Some(true),
        ..PrimitiveState::default()
    });
    descriptor.fragment = Some(FragmentState {
        stage: ProgrammableStage::new(&module, "fs"),
        targets: vec![Some(ColorTargetState::new("bgra8unorm")), None],
    });
    assert!(device.create_render_pipeline(&descriptor).is_ok());

    descriptor.layout = LayoutChoice::Mode("manual".to_owned());
    assert_eq!(
        device.create_render_pipeline(&descriptor).unwrap_err(),
        TranslateError::UnknownLayoutMode("manual".to_owned())
    );
    //async creation validates before issuing anything
    assert!(device.create_render_pipeline_async(&descriptor).is_err());
    assert!(device.driver().pending_calls().is_empty());
}

#[test]
fn query_sets_and_encoders() {
    let device = device();
    let query = device
        .create_query_set(&QuerySetDescriptor {
            label: Some("timings".to_owned()),
            ty: "timestamp".to_owned(),
            count: 16,
        })
        .unwrap();
    assert_eq!(query.ty(), QueryType::Timestamp);
    assert_eq!(query.count(), 16);

    let encoder = device.create_command_encoder(None);
    assert_eq!(encoder.label(), None);
    assert_eq!(encoder.into_raw().kind(), "command_encoder");

    let labeled = device.create_command_encoder(Some(&CommandEncoderDescriptor {
        label: Some("frame".to_owned()),
    }));
    assert_eq!(labeled.label(), Some("frame"));
    assert_eq!(device.queue().raw().kind(), "queue");
}
