// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Host-facing wrappers around native objects.

use crate::imp::Driver;
use crate::keepalive::KeepaliveToken;
use crate::native::{DeviceLostReason, Extent3d, FeatureName, Limits, QueryType, TextureFormat};
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

macro_rules! native_wrapper {
    ($(#[$meta:meta])* $name:ident, $raw:ident) => {
        $(#[$meta])*
        pub struct $name<D: Driver> {
            raw: D::$raw,
        }

        impl<D: Driver> $name<D> {
            pub(crate) fn from_raw(raw: D::$raw) -> Self {
                $name { raw }
            }

            pub fn raw(&self) -> &D::$raw {
                &self.raw
            }
        }

        impl<D: Driver> Debug for $name<D>
        where
            D::$raw: Debug,
        {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.raw).finish()
            }
        }
    };
}

native_wrapper!(TextureView, TextureView);
native_wrapper!(Sampler, Sampler);
native_wrapper!(BindGroupLayout, BindGroupLayout);
native_wrapper!(BindGroup, BindGroup);
native_wrapper!(PipelineLayout, PipelineLayout);
native_wrapper!(RenderPipeline, RenderPipeline);
native_wrapper!(ComputePipeline, ComputePipeline);
native_wrapper!(
    /// Submission queue of the device.
    Queue,
    Queue
);

/**
A GPU buffer.

Holds a keepalive token for its whole life, since mapping callbacks may still be delivered to it.
*/
pub struct Buffer<D: Driver> {
    raw: D::Buffer,
    size: u64,
    usage: u32,
    _keepalive: KeepaliveToken,
}

impl<D: Driver> Buffer<D> {
    pub(crate) fn new(raw: D::Buffer, size: u64, usage: u32, keepalive: KeepaliveToken) -> Self {
        Buffer {
            raw,
            size,
            usage,
            _keepalive: keepalive,
        }
    }
    pub fn raw(&self) -> &D::Buffer {
        &self.raw
    }
    pub fn size(&self) -> u64 {
        self.size
    }
    pub fn usage(&self) -> u32 {
        self.usage
    }
}

impl<D: Driver> Debug for Buffer<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.size)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// A shader module.  Compilation info may arrive later, so this holds a keepalive token.
pub struct ShaderModule<D: Driver> {
    raw: D::ShaderModule,
    _keepalive: KeepaliveToken,
}

impl<D: Driver> ShaderModule<D> {
    pub(crate) fn new(raw: D::ShaderModule, keepalive: KeepaliveToken) -> Self {
        ShaderModule {
            raw,
            _keepalive: keepalive,
        }
    }
    pub fn raw(&self) -> &D::ShaderModule {
        &self.raw
    }
}

impl<D: Driver> Debug for ShaderModule<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderModule").finish_non_exhaustive()
    }
}

pub struct Texture<D: Driver> {
    raw: D::Texture,
    driver: Arc<D>,
    size: Extent3d,
    format: TextureFormat,
    mip_level_count: u32,
    sample_count: u32,
}

impl<D: Driver> Texture<D> {
    pub(crate) fn new(
        raw: D::Texture,
        driver: Arc<D>,
        size: Extent3d,
        format: TextureFormat,
        mip_level_count: u32,
        sample_count: u32,
    ) -> Self {
        Texture {
            raw,
            driver,
            size,
            format,
            mip_level_count,
            sample_count,
        }
    }

    pub fn raw(&self) -> &D::Texture {
        &self.raw
    }
    pub fn size(&self) -> Extent3d {
        self.size
    }
    pub fn format(&self) -> TextureFormat {
        self.format
    }
    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Creates a view covering the whole texture.
    pub fn create_view(&self, label: Option<&str>) -> TextureView<D> {
        TextureView::from_raw(self.driver.create_texture_view(&self.raw, label))
    }
}

impl<D: Driver> Debug for Texture<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("size", &self.size)
            .field("format", &self.format)
            .field("mip_level_count", &self.mip_level_count)
            .field("sample_count", &self.sample_count)
            .finish_non_exhaustive()
    }
}

pub struct CommandEncoder<D: Driver> {
    raw: D::CommandEncoder,
    label: Option<String>,
}

impl<D: Driver> CommandEncoder<D> {
    pub(crate) fn new(raw: D::CommandEncoder, label: Option<String>) -> Self {
        CommandEncoder { raw, label }
    }
    pub fn raw(&self) -> &D::CommandEncoder {
        &self.raw
    }
    pub fn into_raw(self) -> D::CommandEncoder {
        self.raw
    }
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl<D: Driver> Debug for CommandEncoder<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEncoder")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

pub struct QuerySet<D: Driver> {
    raw: D::QuerySet,
    ty: QueryType,
    count: u32,
}

impl<D: Driver> QuerySet<D> {
    pub(crate) fn new(raw: D::QuerySet, ty: QueryType, count: u32) -> Self {
        QuerySet { raw, ty, count }
    }
    pub fn raw(&self) -> &D::QuerySet {
        &self.raw
    }
    pub fn ty(&self) -> QueryType {
        self.ty
    }
    pub fn count(&self) -> u32 {
        self.count
    }
}

impl<D: Driver> Debug for QuerySet<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySet")
            .field("ty", &self.ty)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

/// The set of features the device was created with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportedFeatures {
    features: BTreeSet<FeatureName>,
}

impl SupportedFeatures {
    pub(crate) fn new(features: impl IntoIterator<Item = FeatureName>) -> Self {
        SupportedFeatures {
            features: features.into_iter().collect(),
        }
    }

    pub fn contains(&self, feature: FeatureName) -> bool {
        self.features.contains(&feature)
    }

    /// Looks a feature up by its host token, such as `"depth-clip-control"`.
    pub fn has(&self, token: &str) -> bool {
        self.features.iter().any(|f| f.token() == token)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = FeatureName> + '_ {
        self.features.iter().copied()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.features.iter().map(|f| f.token())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupportedLimits {
    limits: Limits,
}

impl SupportedLimits {
    pub(crate) fn new(limits: Limits) -> Self {
        SupportedLimits { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}

impl std::ops::Deref for SupportedLimits {
    type Target = Limits;
    fn deref(&self) -> &Limits {
        &self.limits
    }
}

/// Why and how the device was lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLostInfo {
    reason: DeviceLostReason,
    message: String,
}

impl DeviceLostInfo {
    pub fn new(reason: DeviceLostReason, message: impl Into<String>) -> Self {
        DeviceLostInfo {
            reason,
            message: message.into(),
        }
    }

    pub fn reason(&self) -> DeviceLostReason {
        self.reason
    }

    /// `"destroyed"` or `"undefined"`.
    pub fn reason_token(&self) -> &'static str {
        match self.reason {
            DeviceLostReason::Destroyed => "destroyed",
            DeviceLostReason::Undefined => "undefined",
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_tokens() {
        let features = SupportedFeatures::new([
            FeatureName::DepthClipControl,
            FeatureName::DepthClipControl,
        ]);
        assert_eq!(features.len(), 1);
        assert!(features.has("depth-clip-control"));
        assert!(!features.has("timestamp-query"));
        assert!(features.contains(FeatureName::DepthClipControl));
    }

    #[test]
    fn lost_reason_tokens() {
        let info = DeviceLostInfo::new(DeviceLostReason::Destroyed, "bye");
        assert_eq!(info.reason_token(), "destroyed");
        assert_eq!(info.message(), "bye");
        assert_eq!(
            DeviceLostInfo::new(DeviceLostReason::Undefined, "").reason_token(),
            "undefined"
        );
    }
}
