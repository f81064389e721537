// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The native driver boundary.

A [Driver] is the callback-driven API this crate adapts.  Two backends ship with the crate:

* [SimulatedDriver], an in-process driver with a real error-scope stack whose asynchronous
  completions can be fired explicitly, from any thread, in any order.  Headless hosts and the
  test suite use it.
* `WgpuDriver` (feature `backend_wgpu`), which adapts a [wgpu](https://wgpu.rs) device.
*/

use crate::native::{
    BindGroupDescriptor, BindGroupLayoutDescriptor, BufferDescriptor, CommandEncoderDescriptor,
    ComputePipelineDescriptor, CreatePipelineAsyncStatus, DeviceLostReason, ErrorFilter, ErrorType,
    FeatureName, Limits, LoggingType, PipelineLayoutDescriptor, QuerySetDescriptor,
    RenderPipelineDescriptor, SamplerDescriptor, ShaderModuleDescriptor, TextureDescriptor,
};

mod sim;
pub use sim::{PendingCallId, SimHandle, SimulatedDriver};

#[cfg(feature = "backend_wgpu")]
mod wgpu;
#[cfg(feature = "backend_wgpu")]
pub use wgpu::WgpuDriver;

/// Completion of [Driver::pop_error_scope].  Called exactly once.
pub type PopErrorScopeCallback = Box<dyn FnOnce(ErrorType, &str) + Send + 'static>;

/// Completion of an asynchronous pipeline creation.  Called exactly once; the pipeline is
/// present only on success.
pub type CreatePipelineCallback<P> =
    Box<dyn FnOnce(CreatePipelineAsyncStatus, Option<P>, &str) + Send + 'static>;

pub type DeviceLostCallback = Box<dyn Fn(DeviceLostReason, &str) + Send + Sync + 'static>;
pub type UncapturedErrorCallback = Box<dyn Fn(ErrorType, &str) + Send + Sync + 'static>;
pub type LoggingCallback = Box<dyn Fn(LoggingType, &str) + Send + Sync + 'static>;

/**
A GPU device as exposed by a native driver.

Callbacks may be invoked on any thread, and never while the host's execution context is known to
be held.  Asynchronous completions only make progress while [Driver::tick] is being called.
*/
pub trait Driver: Send + Sync + 'static {
    type Buffer: Send + Sync + 'static;
    type Texture: Send + Sync + 'static;
    type TextureView: Send + Sync + 'static;
    type Sampler: Send + Sync + 'static;
    type BindGroupLayout: Send + Sync + 'static;
    type BindGroup: Send + Sync + 'static;
    type ShaderModule: Send + Sync + 'static;
    type PipelineLayout: Send + Sync + 'static;
    type RenderPipeline: Send + Sync + 'static;
    type ComputePipeline: Send + Sync + 'static;
    type CommandEncoder: Send + 'static;
    type QuerySet: Send + Sync + 'static;
    type Queue: Send + Sync + 'static;

    fn create_buffer(&self, descriptor: &BufferDescriptor<'_>) -> Self::Buffer;
    fn create_texture(&self, descriptor: &TextureDescriptor<'_>) -> Self::Texture;
    fn create_texture_view(&self, texture: &Self::Texture, label: Option<&str>)
    -> Self::TextureView;
    fn create_sampler(&self, descriptor: &SamplerDescriptor<'_>) -> Self::Sampler;
    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor<'_>,
    ) -> Self::BindGroupLayout;
    fn create_bind_group(&self, descriptor: &BindGroupDescriptor<'_, Self>) -> Self::BindGroup;
    fn create_shader_module(&self, descriptor: &ShaderModuleDescriptor<'_>) -> Self::ShaderModule;
    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor<'_, Self>,
    ) -> Self::PipelineLayout;
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor<'_, Self>,
    ) -> Self::RenderPipeline;
    fn create_render_pipeline_async(
        &self,
        descriptor: &RenderPipelineDescriptor<'_, Self>,
        callback: CreatePipelineCallback<Self::RenderPipeline>,
    );
    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor<'_, Self>,
    ) -> Self::ComputePipeline;
    fn create_compute_pipeline_async(
        &self,
        descriptor: &ComputePipelineDescriptor<'_, Self>,
        callback: CreatePipelineCallback<Self::ComputePipeline>,
    );
    fn create_command_encoder(
        &self,
        descriptor: &CommandEncoderDescriptor<'_>,
    ) -> Self::CommandEncoder;
    fn create_query_set(&self, descriptor: &QuerySetDescriptor<'_>) -> Self::QuerySet;
    fn queue(&self) -> Self::Queue;

    fn push_error_scope(&self, filter: ErrorFilter);
    fn pop_error_scope(&self, callback: PopErrorScopeCallback);

    fn set_device_lost_callback(&self, callback: DeviceLostCallback);
    fn set_uncaptured_error_callback(&self, callback: UncapturedErrorCallback);
    fn set_logging_callback(&self, callback: LoggingCallback);

    /// Lets the driver make progress on outstanding work and fire due callbacks.
    fn tick(&self);

    fn features(&self) -> Vec<FeatureName>;
    /// `None` if the driver could not report its limits.
    fn limits(&self) -> Option<Limits>;

    fn destroy(&self);
}
