// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Bind group layouts, bind groups and pipeline layouts.

use super::tokens::{parse, parse_or};
use crate::descriptors::{
    BindGroupDescriptor, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource,
    PipelineLayoutDescriptor,
};
use crate::error::TranslateError;
use crate::imp::Driver;
use crate::native::{self, BindingType};

#[derive(Debug, Clone, PartialEq)]
pub struct BindGroupLayoutScratch<'a> {
    label: Option<&'a str>,
    entries: Vec<native::BindGroupLayoutEntry>,
}

impl BindGroupLayoutScratch<'_> {
    pub fn descriptor(&self) -> native::BindGroupLayoutDescriptor<'_> {
        native::BindGroupLayoutDescriptor {
            label: self.label,
            entries: &self.entries,
        }
    }
}

fn binding_type(entry: &BindGroupLayoutEntry) -> Result<BindingType, TranslateError> {
    match (
        &entry.buffer,
        &entry.sampler,
        &entry.texture,
        &entry.storage_texture,
    ) {
        (Some(buffer), None, None, None) => Ok(BindingType::Buffer {
            ty: parse_or("type", buffer.ty.as_deref(), "uniform")?,
            has_dynamic_offset: buffer.has_dynamic_offset.unwrap_or(false),
            min_binding_size: buffer.min_binding_size.unwrap_or(0),
        }),
        (None, Some(sampler), None, None) => Ok(BindingType::Sampler(parse_or(
            "type",
            sampler.ty.as_deref(),
            "filtering",
        )?)),
        (None, None, Some(texture), None) => Ok(BindingType::Texture {
            sample_type: parse_or("sampleType", texture.sample_type.as_deref(), "float")?,
            view_dimension: parse_or("viewDimension", texture.view_dimension.as_deref(), "2d")?,
            multisampled: texture.multisampled.unwrap_or(false),
        }),
        (None, None, None, Some(storage)) => Ok(BindingType::StorageTexture {
            access: parse_or("access", storage.access.as_deref(), "write-only")?,
            format: parse("format", &storage.format)?,
            view_dimension: parse_or("viewDimension", storage.view_dimension.as_deref(), "2d")?,
        }),
        (buffer, sampler, texture, storage) => Err(TranslateError::BindingTypeCount {
            binding: entry.binding,
            count: [
                buffer.is_some(),
                sampler.is_some(),
                texture.is_some(),
                storage.is_some(),
            ]
            .into_iter()
            .filter(|set| *set)
            .count(),
        }),
    }
}

pub fn bind_group_layout(
    desc: &BindGroupLayoutDescriptor,
) -> Result<BindGroupLayoutScratch<'_>, TranslateError> {
    let entries = desc
        .entries
        .iter()
        .map(|entry| {
            Ok(native::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: entry.visibility,
                ty: binding_type(entry)?,
            })
        })
        .collect::<Result<Vec<_>, TranslateError>>()?;
    Ok(BindGroupLayoutScratch {
        label: desc.label.as_deref(),
        entries,
    })
}

pub struct BindGroupScratch<'a, D: Driver> {
    label: Option<&'a str>,
    layout: &'a D::BindGroupLayout,
    entries: Vec<native::BindGroupEntry<'a, D>>,
}

impl<D: Driver> BindGroupScratch<'_, D> {
    pub fn descriptor(&self) -> native::BindGroupDescriptor<'_, D> {
        native::BindGroupDescriptor {
            label: self.label,
            layout: self.layout,
            entries: &self.entries,
        }
    }
}

/// Bind groups have no tokens to parse, so this cannot fail.
pub fn bind_group<'a, D: Driver>(desc: &'a BindGroupDescriptor<'a, D>) -> BindGroupScratch<'a, D> {
    let entries = desc
        .entries
        .iter()
        .map(|entry| native::BindGroupEntry {
            binding: entry.binding,
            resource: match &entry.resource {
                BindingResource::Sampler(sampler) => {
                    native::BindingResource::Sampler(sampler.raw())
                }
                BindingResource::TextureView(view) => {
                    native::BindingResource::TextureView(view.raw())
                }
                BindingResource::Buffer(binding) => native::BindingResource::Buffer {
                    buffer: binding.buffer.raw(),
                    offset: binding.offset.unwrap_or(0),
                    size: binding.size,
                },
            },
        })
        .collect();
    BindGroupScratch {
        label: desc.label.as_deref(),
        layout: desc.layout.raw(),
        entries,
    }
}

pub struct PipelineLayoutScratch<'a, D: Driver> {
    label: Option<&'a str>,
    layouts: Vec<&'a D::BindGroupLayout>,
}

impl<D: Driver> PipelineLayoutScratch<'_, D> {
    pub fn descriptor(&self) -> native::PipelineLayoutDescriptor<'_, D> {
        native::PipelineLayoutDescriptor {
            label: self.label,
            bind_group_layouts: &self.layouts,
        }
    }
}

pub fn pipeline_layout<'a, D: Driver>(
    desc: &'a PipelineLayoutDescriptor<'a, D>,
) -> PipelineLayoutScratch<'a, D> {
    PipelineLayoutScratch {
        label: desc.label.as_deref(),
        layouts: desc.bind_group_layouts.iter().map(|l| l.raw()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{
        BufferBindingLayout, SamplerBindingLayout, StorageTextureBindingLayout,
        TextureBindingLayout,
    };
    use crate::native::{
        BufferBindingType, SamplerBindingType, StorageTextureAccess, TextureFormat,
        TextureSampleType, TextureViewDimension,
    };

    fn layout(entry: BindGroupLayoutEntry) -> Result<BindingType, TranslateError> {
        let desc = BindGroupLayoutDescriptor {
            label: None,
            entries: vec![entry],
        };
        bind_group_layout(&desc).map(|scratch| scratch.descriptor().entries[0].ty)
    }

    #[test]
    fn member_defaults() {
        assert_eq!(
            layout(BindGroupLayoutEntry {
                buffer: Some(BufferBindingLayout::default()),
                ..Default::default()
            }),
            Ok(BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: 0
            })
        );
        assert_eq!(
            layout(BindGroupLayoutEntry {
                sampler: Some(SamplerBindingLayout::default()),
                ..Default::default()
            }),
            Ok(BindingType::Sampler(SamplerBindingType::Filtering))
        );
        assert_eq!(
            layout(BindGroupLayoutEntry {
                texture: Some(TextureBindingLayout::default()),
                ..Default::default()
            }),
            Ok(BindingType::Texture {
                sample_type: TextureSampleType::Float,
                view_dimension: TextureViewDimension::D2,
                multisampled: false
            })
        );
        assert_eq!(
            layout(BindGroupLayoutEntry {
                storage_texture: Some(StorageTextureBindingLayout {
                    format: "r32float".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            Ok(BindingType::StorageTexture {
                access: StorageTextureAccess::WriteOnly,
                format: TextureFormat::R32Float,
                view_dimension: TextureViewDimension::D2
            })
        );
    }

    #[test]
    fn exactly_one_member() {
        assert_eq!(
            layout(BindGroupLayoutEntry {
                binding: 3,
                ..Default::default()
            }),
            Err(TranslateError::BindingTypeCount {
                binding: 3,
                count: 0
            })
        );
        assert_eq!(
            layout(BindGroupLayoutEntry {
                binding: 1,
                buffer: Some(BufferBindingLayout::default()),
                sampler: Some(SamplerBindingLayout::default()),
                ..Default::default()
            }),
            Err(TranslateError::BindingTypeCount {
                binding: 1,
                count: 2
            })
        );
    }

    #[test]
    fn unknown_member_token() {
        assert_eq!(
            layout(BindGroupLayoutEntry {
                buffer: Some(BufferBindingLayout {
                    ty: Some("constant".into()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            Err(TranslateError::UnknownToken {
                field: "type",
                value: "constant".into()
            })
        );
    }
}
