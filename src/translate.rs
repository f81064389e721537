// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Host descriptors to native descriptors.

Translation parses every token, substitutes every default, and collects variable-length data into
a *scratch bundle* owned by the caller.  The native descriptor is then produced by borrowing the
bundle:

```
# use gpu_bridge::descriptors::ShaderModuleDescriptor;
# use gpu_bridge::translate;
let host = ShaderModuleDescriptor {
    label: None,
    code: "@compute @workgroup_size(1) fn main() {}".into(),
};
let scratch = translate::shader_module(&host);
let native = scratch.descriptor();
assert!(native.next_in_chain.is_some());
```

A malformed descriptor fails here, synchronously, and the driver is never called.
*/

mod bind_group;
mod pipeline;
pub mod tokens;

pub use bind_group::{
    BindGroupLayoutScratch, BindGroupScratch, PipelineLayoutScratch, bind_group,
    bind_group_layout, pipeline_layout,
};
pub use pipeline::{
    ComputePipelineScratch, RenderPipelineScratch, compute_pipeline, render_pipeline,
};

use crate::descriptors::{
    BufferDescriptor, CommandEncoderDescriptor, Extent3d, LayoutChoice, QuerySetDescriptor,
    SamplerDescriptor, ShaderModuleDescriptor, TextureDescriptor,
};
use crate::error::TranslateError;
use crate::imp::Driver;
use crate::native::{self, ChainedStruct, ErrorFilter, TextureFormat};
use crate::objects::PipelineLayout;
use tokens::{parse, parse_or};

pub fn buffer(desc: &BufferDescriptor) -> native::BufferDescriptor<'_> {
    native::BufferDescriptor {
        label: desc.label.as_deref(),
        size: desc.size,
        usage: desc.usage,
        mapped_at_creation: desc.mapped_at_creation,
    }
}

/**
Resolves a texture extent.

The positional form takes width, height and depth in order; missing trailing values are 1 and
extra values are ignored.  An empty sequence is an error.  The record form requires a width.
*/
pub fn extent(size: &Extent3d) -> Result<native::Extent3d, TranslateError> {
    match size {
        Extent3d::Sequence(values) => {
            let (&width, rest) = values.split_first().ok_or(TranslateError::EmptyExtent)?;
            Ok(native::Extent3d {
                width,
                height: rest.first().copied().unwrap_or(1),
                depth_or_array_layers: rest.get(1).copied().unwrap_or(1),
            })
        }
        Extent3d::Dict(dict) => Ok(native::Extent3d {
            width: dict.width,
            height: dict.height.unwrap_or(1),
            depth_or_array_layers: dict.depth_or_array_layers.unwrap_or(1),
        }),
    }
}

/// Owns the view-format array of a texture descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureScratch<'a> {
    label: Option<&'a str>,
    size: native::Extent3d,
    mip_level_count: u32,
    sample_count: u32,
    dimension: native::TextureDimension,
    format: TextureFormat,
    usage: u32,
    view_formats: Vec<TextureFormat>,
}

impl TextureScratch<'_> {
    pub fn descriptor(&self) -> native::TextureDescriptor<'_> {
        native::TextureDescriptor {
            label: self.label,
            size: self.size,
            mip_level_count: self.mip_level_count,
            sample_count: self.sample_count,
            dimension: self.dimension,
            format: self.format,
            usage: self.usage,
            view_formats: &self.view_formats,
        }
    }
}

pub fn texture(desc: &TextureDescriptor) -> Result<TextureScratch<'_>, TranslateError> {
    let view_formats = desc
        .view_formats
        .iter()
        .flatten()
        .map(|f| parse("viewFormats", f))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TextureScratch {
        label: desc.label.as_deref(),
        size: extent(&desc.size)?,
        mip_level_count: desc.mip_level_count.unwrap_or(1),
        sample_count: desc.sample_count.unwrap_or(1),
        dimension: parse_or("dimension", desc.dimension.as_deref(), "2d")?,
        format: parse("format", &desc.format)?,
        usage: desc.usage,
        view_formats,
    })
}

pub fn sampler(desc: &SamplerDescriptor) -> Result<native::SamplerDescriptor<'_>, TranslateError> {
    Ok(native::SamplerDescriptor {
        label: desc.label.as_deref(),
        address_mode_u: parse_or(
            "addressModeU",
            desc.address_mode_u.as_deref(),
            "clamp-to-edge",
        )?,
        address_mode_v: parse_or(
            "addressModeV",
            desc.address_mode_v.as_deref(),
            "clamp-to-edge",
        )?,
        address_mode_w: parse_or(
            "addressModeW",
            desc.address_mode_w.as_deref(),
            "clamp-to-edge",
        )?,
        mag_filter: parse_or("magFilter", desc.mag_filter.as_deref(), "nearest")?,
        min_filter: parse_or("minFilter", desc.min_filter.as_deref(), "nearest")?,
        mipmap_filter: parse_or(
            "mipmapFilter",
            desc.mipmap_filter.as_deref(),
            "nearest",
        )?,
        lod_min_clamp: desc.lod_min_clamp.unwrap_or(0.0),
        lod_max_clamp: desc.lod_max_clamp.unwrap_or(32.0),
        compare: desc
            .compare
            .as_deref()
            .map(|c| parse("compare", c))
            .transpose()?,
        max_anisotropy: desc.max_anisotropy.unwrap_or(1),
    })
}

/// Owns the WGSL source node a shader module descriptor chains to.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderModuleScratch<'a> {
    label: Option<&'a str>,
    source: Box<ChainedStruct>,
}

impl ShaderModuleScratch<'_> {
    pub fn descriptor(&self) -> native::ShaderModuleDescriptor<'_> {
        native::ShaderModuleDescriptor {
            next_in_chain: Some(&self.source),
            label: self.label,
        }
    }
}

pub fn shader_module(desc: &ShaderModuleDescriptor) -> ShaderModuleScratch<'_> {
    ShaderModuleScratch {
        label: desc.label.as_deref(),
        source: Box::new(ChainedStruct::ShaderSourceWgsl {
            code: desc.code.clone(),
        }),
    }
}

pub fn command_encoder(
    desc: Option<&CommandEncoderDescriptor>,
) -> native::CommandEncoderDescriptor<'_> {
    native::CommandEncoderDescriptor {
        label: desc.and_then(|d| d.label.as_deref()),
    }
}

pub fn query_set(
    desc: &QuerySetDescriptor,
) -> Result<native::QuerySetDescriptor<'_>, TranslateError> {
    Ok(native::QuerySetDescriptor {
        label: desc.label.as_deref(),
        ty: parse("type", &desc.ty)?,
        count: desc.count,
    })
}

pub fn error_filter(filter: &str) -> Result<ErrorFilter, TranslateError> {
    parse("filter", filter)
}

/// `"auto"` means no explicit layout.  Any other mode string is rejected.
pub fn layout_choice<'a, D: Driver>(
    choice: &LayoutChoice<'a, D>,
) -> Result<Option<&'a D::PipelineLayout>, TranslateError> {
    match choice {
        LayoutChoice::Mode(mode) if mode == "auto" => Ok(None),
        LayoutChoice::Mode(mode) => Err(TranslateError::UnknownLayoutMode(mode.clone())),
        LayoutChoice::Layout(layout) => {
            let layout: &'a PipelineLayout<D> = layout;
            Ok(Some(layout.raw()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::Extent3dDict;
    use crate::native::{
        AddressMode, CompareFunction, FilterMode, MipmapFilterMode, QueryType, TextureDimension,
    };

    #[test]
    fn extent_shorthand() {
        let e = |v: Vec<u32>| extent(&Extent3d::Sequence(v));
        assert_eq!(e(vec![]), Err(TranslateError::EmptyExtent));
        assert_eq!(
            e(vec![4]),
            Ok(native::Extent3d {
                width: 4,
                height: 1,
                depth_or_array_layers: 1
            })
        );
        assert_eq!(
            e(vec![4, 5]),
            Ok(native::Extent3d {
                width: 4,
                height: 5,
                depth_or_array_layers: 1
            })
        );
        assert_eq!(
            e(vec![4, 5, 6, 7]),
            Ok(native::Extent3d {
                width: 4,
                height: 5,
                depth_or_array_layers: 6
            })
        );
        assert_eq!(
            extent(&Extent3d::Dict(Extent3dDict {
                width: 8,
                height: None,
                depth_or_array_layers: Some(3)
            })),
            Ok(native::Extent3d {
                width: 8,
                height: 1,
                depth_or_array_layers: 3
            })
        );
    }

    #[test]
    fn texture_defaults() {
        let host = TextureDescriptor::new([16u32, 16], "rgba8unorm", 0x10);
        let scratch = texture(&host).unwrap();
        let native = scratch.descriptor();
        assert_eq!(native.mip_level_count, 1);
        assert_eq!(native.sample_count, 1);
        assert_eq!(native.dimension, TextureDimension::D2);
        assert_eq!(native.format, TextureFormat::Rgba8Unorm);
        assert!(native.view_formats.is_empty());
    }

    #[test]
    fn texture_view_formats_and_errors() {
        let mut host = TextureDescriptor::new([1u32], "rgba8unorm", 0);
        host.view_formats = Some(vec!["rgba8unorm-srgb".to_owned()]);
        let scratch = texture(&host).unwrap();
        assert_eq!(
            scratch.descriptor().view_formats,
            &[TextureFormat::Rgba8UnormSrgb]
        );

        host.view_formats = Some(vec!["rgba9unorm".to_owned()]);
        assert_eq!(
            texture(&host),
            Err(TranslateError::UnknownToken {
                field: "viewFormats",
                value: "rgba9unorm".to_owned()
            })
        );

        let host = TextureDescriptor::new(Vec::<u32>::new(), "rgba8unorm", 0);
        assert_eq!(texture(&host), Err(TranslateError::EmptyExtent));
    }

    #[test]
    fn sampler_defaults() {
        let host = SamplerDescriptor::default();
        let native = sampler(&host).unwrap();
        assert_eq!(native.address_mode_u, AddressMode::ClampToEdge);
        assert_eq!(native.address_mode_v, AddressMode::ClampToEdge);
        assert_eq!(native.address_mode_w, AddressMode::ClampToEdge);
        assert_eq!(native.mag_filter, FilterMode::Nearest);
        assert_eq!(native.min_filter, FilterMode::Nearest);
        assert_eq!(native.mipmap_filter, MipmapFilterMode::Nearest);
        assert_eq!(native.lod_min_clamp, 0.0);
        assert_eq!(native.lod_max_clamp, 32.0);
        assert_eq!(native.max_anisotropy, 1);
        assert_eq!(native.compare, None);
    }

    #[test]
    fn sampler_overrides_and_errors() {
        let host = SamplerDescriptor {
            address_mode_v: Some("mirror-repeat".into()),
            compare: Some("less-equal".into()),
            max_anisotropy: Some(16),
            ..Default::default()
        };
        let native = sampler(&host).unwrap();
        assert_eq!(native.address_mode_v, AddressMode::MirrorRepeat);
        assert_eq!(native.compare, Some(CompareFunction::LessEqual));
        assert_eq!(native.max_anisotropy, 16);

        let host = SamplerDescriptor {
            address_mode_u: Some("wrap".into()),
            ..Default::default()
        };
        assert_eq!(
            sampler(&host),
            Err(TranslateError::UnknownToken {
                field: "addressModeU",
                value: "wrap".to_owned()
            })
        );
    }

    #[test]
    fn shader_module_always_chains_source() {
        let host = ShaderModuleDescriptor {
            label: Some("s".into()),
            code: "fn main() {}".into(),
        };
        let scratch = shader_module(&host);
        let native = scratch.descriptor();
        assert_eq!(native.label, Some("s"));
        assert_eq!(
            native.next_in_chain,
            Some(&ChainedStruct::ShaderSourceWgsl {
                code: "fn main() {}".into()
            })
        );
    }

    #[test]
    fn misc_kinds() {
        assert_eq!(command_encoder(None).label, None);
        let host = CommandEncoderDescriptor {
            label: Some("enc".into()),
        };
        assert_eq!(command_encoder(Some(&host)).label, Some("enc"));

        let host = QuerySetDescriptor {
            label: None,
            ty: "timestamp".into(),
            count: 2,
        };
        assert_eq!(query_set(&host).unwrap().ty, QueryType::Timestamp);
        let host = QuerySetDescriptor {
            label: None,
            ty: "pipeline-statistics".into(),
            count: 2,
        };
        assert!(matches!(
            query_set(&host),
            Err(TranslateError::UnknownToken { field: "type", .. })
        ));

        assert_eq!(error_filter("out-of-memory"), Ok(ErrorFilter::OutOfMemory));
        assert!(error_filter("everything").is_err());

        let host = BufferDescriptor::new(256, 0x40);
        let native = buffer(&host);
        assert_eq!(native.size, 256);
        assert!(!native.mapped_at_creation);
    }
}
