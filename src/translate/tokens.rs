// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Token tables for every enum-valued descriptor field.

use crate::error::TranslateError;
use crate::native::{
    AddressMode, BlendFactor, BlendOperation, BufferBindingType, CompareFunction, CullMode,
    ErrorFilter, FilterMode, FrontFace, IndexFormat, MipmapFilterMode, PrimitiveTopology,
    QueryType, SamplerBindingType, StencilOperation, StorageTextureAccess, TextureDimension,
    TextureFormat, TextureSampleType, TextureViewDimension, VertexFormat, VertexStepMode,
};

/// A native enum with a fixed set of host tokens.
pub trait Token: Copy + 'static {
    const TABLE: &'static [(&'static str, Self)];
}

macro_rules! tokens {
    ($ty:ident { $($token:literal => $variant:ident),+ $(,)? }) => {
        impl Token for $ty {
            const TABLE: &'static [(&'static str, Self)] = &[$(($token, $ty::$variant)),+];
        }
    };
}

tokens!(AddressMode {
    "clamp-to-edge" => ClampToEdge,
    "repeat" => Repeat,
    "mirror-repeat" => MirrorRepeat,
});

tokens!(FilterMode {
    "nearest" => Nearest,
    "linear" => Linear,
});

tokens!(MipmapFilterMode {
    "nearest" => Nearest,
    "linear" => Linear,
});

tokens!(CompareFunction {
    "never" => Never,
    "less" => Less,
    "equal" => Equal,
    "less-equal" => LessEqual,
    "greater" => Greater,
    "not-equal" => NotEqual,
    "greater-equal" => GreaterEqual,
    "always" => Always,
});

tokens!(PrimitiveTopology {
    "point-list" => PointList,
    "line-list" => LineList,
    "line-strip" => LineStrip,
    "triangle-list" => TriangleList,
    "triangle-strip" => TriangleStrip,
});

tokens!(IndexFormat {
    "uint16" => Uint16,
    "uint32" => Uint32,
});

tokens!(FrontFace {
    "ccw" => Ccw,
    "cw" => Cw,
});

tokens!(CullMode {
    "none" => None,
    "front" => Front,
    "back" => Back,
});

tokens!(StencilOperation {
    "keep" => Keep,
    "zero" => Zero,
    "replace" => Replace,
    "invert" => Invert,
    "increment-clamp" => IncrementClamp,
    "decrement-clamp" => DecrementClamp,
    "increment-wrap" => IncrementWrap,
    "decrement-wrap" => DecrementWrap,
});

tokens!(ErrorFilter {
    "validation" => Validation,
    "out-of-memory" => OutOfMemory,
    "internal" => Internal,
});

tokens!(QueryType {
    "occlusion" => Occlusion,
    "timestamp" => Timestamp,
});

tokens!(TextureDimension {
    "1d" => D1,
    "2d" => D2,
    "3d" => D3,
});

tokens!(TextureViewDimension {
    "1d" => D1,
    "2d" => D2,
    "2d-array" => D2Array,
    "cube" => Cube,
    "cube-array" => CubeArray,
    "3d" => D3,
});

tokens!(TextureFormat {
    "r8unorm" => R8Unorm,
    "r8snorm" => R8Snorm,
    "r8uint" => R8Uint,
    "r8sint" => R8Sint,
    "r16uint" => R16Uint,
    "r16sint" => R16Sint,
    "r16float" => R16Float,
    "rg8unorm" => Rg8Unorm,
    "rg8snorm" => Rg8Snorm,
    "rg8uint" => Rg8Uint,
    "rg8sint" => Rg8Sint,
    "r32uint" => R32Uint,
    "r32sint" => R32Sint,
    "r32float" => R32Float,
    "rg16uint" => Rg16Uint,
    "rg16sint" => Rg16Sint,
    "rg16float" => Rg16Float,
    "rgba8unorm" => Rgba8Unorm,
    "rgba8unorm-srgb" => Rgba8UnormSrgb,
    "rgba8snorm" => Rgba8Snorm,
    "rgba8uint" => Rgba8Uint,
    "rgba8sint" => Rgba8Sint,
    "bgra8unorm" => Bgra8Unorm,
    "bgra8unorm-srgb" => Bgra8UnormSrgb,
    "rgb9e5ufloat" => Rgb9e5Ufloat,
    "rgb10a2uint" => Rgb10a2Uint,
    "rgb10a2unorm" => Rgb10a2Unorm,
    "rg32uint" => Rg32Uint,
    "rg32sint" => Rg32Sint,
    "rg32float" => Rg32Float,
    "rgba16uint" => Rgba16Uint,
    "rgba16sint" => Rgba16Sint,
    "rgba16float" => Rgba16Float,
    "rgba32uint" => Rgba32Uint,
    "rgba32sint" => Rgba32Sint,
    "rgba32float" => Rgba32Float,
    "stencil8" => Stencil8,
    "depth16unorm" => Depth16Unorm,
    "depth24plus" => Depth24Plus,
    "depth24plus-stencil8" => Depth24PlusStencil8,
    "depth32float" => Depth32Float,
    "depth32float-stencil8" => Depth32FloatStencil8,
});

tokens!(TextureSampleType {
    "float" => Float,
    "unfilterable-float" => UnfilterableFloat,
    "depth" => Depth,
    "sint" => Sint,
    "uint" => Uint,
});

tokens!(StorageTextureAccess {
    "write-only" => WriteOnly,
    "read-only" => ReadOnly,
    "read-write" => ReadWrite,
});

tokens!(BufferBindingType {
    "uniform" => Uniform,
    "storage" => Storage,
    "read-only-storage" => ReadOnlyStorage,
});

tokens!(SamplerBindingType {
    "filtering" => Filtering,
    "non-filtering" => NonFiltering,
    "comparison" => Comparison,
});

tokens!(VertexFormat {
    "uint8x2" => Uint8x2,
    "uint8x4" => Uint8x4,
    "sint8x2" => Sint8x2,
    "sint8x4" => Sint8x4,
    "unorm8x2" => Unorm8x2,
    "unorm8x4" => Unorm8x4,
    "snorm8x2" => Snorm8x2,
    "snorm8x4" => Snorm8x4,
    "uint16x2" => Uint16x2,
    "uint16x4" => Uint16x4,
    "sint16x2" => Sint16x2,
    "sint16x4" => Sint16x4,
    "unorm16x2" => Unorm16x2,
    "unorm16x4" => Unorm16x4,
    "snorm16x2" => Snorm16x2,
    "snorm16x4" => Snorm16x4,
    "float16x2" => Float16x2,
    "float16x4" => Float16x4,
    "float32" => Float32,
    "float32x2" => Float32x2,
    "float32x3" => Float32x3,
    "float32x4" => Float32x4,
    "uint32" => Uint32,
    "uint32x2" => Uint32x2,
    "uint32x3" => Uint32x3,
    "uint32x4" => Uint32x4,
    "sint32" => Sint32,
    "sint32x2" => Sint32x2,
    "sint32x3" => Sint32x3,
    "sint32x4" => Sint32x4,
});

tokens!(VertexStepMode {
    "vertex" => Vertex,
    "instance" => Instance,
});

tokens!(BlendFactor {
    "zero" => Zero,
    "one" => One,
    "src" => Src,
    "one-minus-src" => OneMinusSrc,
    "src-alpha" => SrcAlpha,
    "one-minus-src-alpha" => OneMinusSrcAlpha,
    "dst" => Dst,
    "one-minus-dst" => OneMinusDst,
    "dst-alpha" => DstAlpha,
    "one-minus-dst-alpha" => OneMinusDstAlpha,
    "src-alpha-saturated" => SrcAlphaSaturated,
    "constant" => Constant,
    "one-minus-constant" => OneMinusConstant,
});

tokens!(BlendOperation {
    "add" => Add,
    "subtract" => Subtract,
    "reverse-subtract" => ReverseSubtract,
    "min" => Min,
    "max" => Max,
});

/// Looks `value` up in `T`'s table.  Matching is exact; tokens are case sensitive.
pub fn parse<T: Token>(field: &'static str, value: &str) -> Result<T, TranslateError> {
    T::TABLE
        .iter()
        .find(|(token, _)| *token == value)
        .map(|(_, v)| *v)
        .ok_or_else(|| TranslateError::UnknownToken {
            field,
            value: value.to_owned(),
        })
}

/// Like [parse], substituting the `default` token when the field is absent.
pub fn parse_or<T: Token>(
    field: &'static str,
    value: Option<&str>,
    default: &'static str,
) -> Result<T, TranslateError> {
    parse(field, value.unwrap_or(default))
}

/// The host token for a native value.
pub fn token_of<T: Token + PartialEq>(value: T) -> &'static str {
    T::TABLE
        .iter()
        .find(|(_, v)| *v == value)
        .map(|(token, _)| *token)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fmt::Debug;
    use std::hash::Hash;

    /// Every token parses to a distinct value, and an unknown token names the field.
    fn check_table<T: Token + PartialEq + Eq + Hash + Debug>(expected_len: usize) {
        assert_eq!(T::TABLE.len(), expected_len);
        let mut seen = HashSet::new();
        for (token, value) in T::TABLE {
            assert_eq!(parse::<T>("field", token), Ok(*value));
            assert_eq!(token_of(*value), *token);
            assert!(seen.insert(*value), "{value:?} listed twice");
            assert_eq!(token.to_lowercase(), *token);
        }
        assert_eq!(
            parse::<T>("someField", "not-a-token"),
            Err(TranslateError::UnknownToken {
                field: "someField",
                value: "not-a-token".to_owned()
            })
        );
    }

    #[test]
    fn tables_are_complete() {
        check_table::<AddressMode>(3);
        check_table::<FilterMode>(2);
        check_table::<MipmapFilterMode>(2);
        check_table::<CompareFunction>(8);
        check_table::<PrimitiveTopology>(5);
        check_table::<IndexFormat>(2);
        check_table::<FrontFace>(2);
        check_table::<CullMode>(3);
        check_table::<StencilOperation>(8);
        check_table::<ErrorFilter>(3);
        check_table::<QueryType>(2);
        check_table::<TextureDimension>(3);
        check_table::<TextureViewDimension>(6);
        check_table::<TextureFormat>(42);
        check_table::<TextureSampleType>(5);
        check_table::<StorageTextureAccess>(3);
        check_table::<BufferBindingType>(3);
        check_table::<SamplerBindingType>(3);
        check_table::<VertexFormat>(30);
        check_table::<VertexStepMode>(2);
        check_table::<BlendFactor>(13);
        check_table::<BlendOperation>(5);
    }

    #[test]
    fn matching_is_exact() {
        assert!(parse::<AddressMode>("addressModeU", "Repeat").is_err());
        assert!(parse::<AddressMode>("addressModeU", " repeat").is_err());
        assert!(parse::<AddressMode>("addressModeU", "").is_err());
    }

    #[test]
    fn defaults_substitute() {
        assert_eq!(
            parse_or::<CullMode>("cullMode", None, "none"),
            Ok(CullMode::None)
        );
        assert_eq!(
            parse_or::<CullMode>("cullMode", Some("back"), "none"),
            Ok(CullMode::Back)
        );
    }
}
