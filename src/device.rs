// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The host-facing device.

A [Device] wraps a [Driver] and exposes its operations in host terms.  Synchronous operations
translate the host descriptor, call the driver and wrap the result.  Asynchronous operations
return a [Pending] immediately and complete when the driver's callback fires.

A device lives in the host's execution context.  The host is expected to call [Device::tick] once
per turn of its event loop; that is where driver progress is made (unless a poll thread does it)
and where events from driver threads are dispatched.
*/

mod error_scope;
mod lifecycle;

pub use lifecycle::DeviceLostState;

use crate::bridge::{self, Pending, PendingOperation};
use crate::config::DeviceOptions;
use crate::descriptors::{
    BindGroupDescriptor, BindGroupLayoutDescriptor, BufferDescriptor, CommandEncoderDescriptor,
    ComputePipelineDescriptor, PipelineLayoutDescriptor, QuerySetDescriptor,
    RenderPipelineDescriptor, SamplerDescriptor, ShaderModuleDescriptor, TextureDescriptor,
};
use crate::error::{DeviceError, GpuError, OperationError, TranslateError};
use crate::host::{EventTarget, HostQueue};
use crate::imp::Driver;
use crate::keepalive::Keepalive;
use crate::objects::{
    BindGroup, BindGroupLayout, Buffer, CommandEncoder, ComputePipeline, DeviceLostInfo,
    PipelineLayout, QuerySet, Queue, RenderPipeline, Sampler, ShaderModule, SupportedFeatures,
    SupportedLimits, Texture,
};
use crate::translate::{self, tokens};
use lifecycle::DeviceLifecycle;
use logwise::privacy::LogIt;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::sync::Arc;

pub struct Device<D: Driver> {
    driver: Arc<D>,
    keepalive: Keepalive,
    lifecycle: DeviceLifecycle,
    host: HostQueue,
    events: Rc<dyn EventTarget>,
    label: Option<String>,
}

impl<D: Driver> Device<D> {
    /**
    Adopts `driver`.

    Registers the device-lost, uncaptured-error and logging callbacks.  Uncaptured errors are
    dispatched to `events` from [Device::tick].
    */
    pub fn new(driver: D, events: Rc<dyn EventTarget>, options: DeviceOptions) -> Self {
        let driver = Arc::new(driver);
        let host = HostQueue::new();
        let lifecycle = DeviceLifecycle::install(&*driver, host.sender());
        //weak, so that pending callbacks inside the driver don't keep it alive
        let tick_driver = Arc::downgrade(&driver);
        let keepalive = Keepalive::new(
            move || {
                if let Some(driver) = tick_driver.upgrade() {
                    driver.tick();
                }
            },
            options.tick,
        );
        logwise::info_sync!(
            "device created with {tick}",
            tick = LogIt(&options.tick)
        );
        Device {
            driver,
            keepalive,
            lifecycle,
            host,
            events,
            label: options.label,
        }
    }

    /// A device without event listeners.  Uncaptured errors are only logged.
    pub fn headless(driver: D, options: DeviceOptions) -> Self {
        Self::new(driver, Rc::new(()), options)
    }

    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of live keepalive tokens: pending operations plus objects that may still receive
    /// callbacks.
    pub fn keepalive_count(&self) -> usize {
        self.keepalive.live()
    }

    /**
    Runs one host turn.

    Ticks the driver if anything is waiting on it, then dispatches whatever driver threads have
    handed to the host since the last turn.
    */
    pub fn tick(&self) {
        self.keepalive.tick_if_active();
        for message in self.host.drain() {
            self.lifecycle.deliver(message, &*self.events);
        }
    }

    pub fn create_buffer(&self, descriptor: &BufferDescriptor) -> Buffer<D> {
        let raw = self.driver.create_buffer(&translate::buffer(descriptor));
        Buffer::new(
            raw,
            descriptor.size,
            descriptor.usage,
            self.keepalive.token(),
        )
    }

    pub fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<Texture<D>, TranslateError> {
        let scratch = translate::texture(descriptor)?;
        let native = scratch.descriptor();
        let raw = self.driver.create_texture(&native);
        logwise::trace_sync!(
            "created {format} texture",
            format = LogIt(tokens::token_of(native.format))
        );
        Ok(Texture::new(
            raw,
            self.driver.clone(),
            native.size,
            native.format,
            native.mip_level_count,
            native.sample_count,
        ))
    }

    pub fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor,
    ) -> Result<Sampler<D>, TranslateError> {
        let native = translate::sampler(descriptor)?;
        Ok(Sampler::from_raw(self.driver.create_sampler(&native)))
    }

    pub fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayout<D>, TranslateError> {
        let scratch = translate::bind_group_layout(descriptor)?;
        Ok(BindGroupLayout::from_raw(
            self.driver.create_bind_group_layout(&scratch.descriptor()),
        ))
    }

    pub fn create_bind_group(&self, descriptor: &BindGroupDescriptor<'_, D>) -> BindGroup<D> {
        let scratch = translate::bind_group(descriptor);
        BindGroup::from_raw(self.driver.create_bind_group(&scratch.descriptor()))
    }

    pub fn create_shader_module(&self, descriptor: &ShaderModuleDescriptor) -> ShaderModule<D> {
        let scratch = translate::shader_module(descriptor);
        ShaderModule::new(
            self.driver.create_shader_module(&scratch.descriptor()),
            self.keepalive.token(),
        )
    }

    pub fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor<'_, D>,
    ) -> PipelineLayout<D> {
        let scratch = translate::pipeline_layout(descriptor);
        PipelineLayout::from_raw(self.driver.create_pipeline_layout(&scratch.descriptor()))
    }

    pub fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor<'_, D>,
    ) -> Result<RenderPipeline<D>, TranslateError> {
        let scratch = translate::render_pipeline(descriptor)?;
        Ok(RenderPipeline::from_raw(
            self.driver.create_render_pipeline(&scratch.descriptor()),
        ))
    }

    /**
    Creates a render pipeline without blocking.

    A malformed descriptor fails immediately.  Otherwise the driver is called before this returns,
    and the future resolves when the driver reports back.
    */
    pub fn create_render_pipeline_async(
        &self,
        descriptor: &RenderPipelineDescriptor<'_, D>,
    ) -> Result<Pending<Result<RenderPipeline<D>, OperationError>>, TranslateError> {
        let scratch = translate::render_pipeline(descriptor)?;
        let (operation, pending) = PendingOperation::issue(&self.keepalive, bridge::abandoned);
        logwise::trace_sync!("issuing async render pipeline creation");
        self.driver.create_render_pipeline_async(
            &scratch.descriptor(),
            bridge::pipeline_callback(operation, RenderPipeline::from_raw),
        );
        Ok(pending)
    }

    pub fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor<'_, D>,
    ) -> Result<ComputePipeline<D>, TranslateError> {
        let scratch = translate::compute_pipeline(descriptor)?;
        Ok(ComputePipeline::from_raw(
            self.driver.create_compute_pipeline(&scratch.descriptor()),
        ))
    }

    pub fn create_compute_pipeline_async(
        &self,
        descriptor: &ComputePipelineDescriptor<'_, D>,
    ) -> Result<Pending<Result<ComputePipeline<D>, OperationError>>, TranslateError> {
        let scratch = translate::compute_pipeline(descriptor)?;
        let (operation, pending) = PendingOperation::issue(&self.keepalive, bridge::abandoned);
        logwise::trace_sync!("issuing async compute pipeline creation");
        self.driver.create_compute_pipeline_async(
            &scratch.descriptor(),
            bridge::pipeline_callback(operation, ComputePipeline::from_raw),
        );
        Ok(pending)
    }

    pub fn create_command_encoder(
        &self,
        descriptor: Option<&CommandEncoderDescriptor>,
    ) -> CommandEncoder<D> {
        let native = translate::command_encoder(descriptor);
        CommandEncoder::new(
            self.driver.create_command_encoder(&native),
            native.label.map(str::to_owned),
        )
    }

    pub fn create_query_set(
        &self,
        descriptor: &QuerySetDescriptor,
    ) -> Result<QuerySet<D>, TranslateError> {
        let native = translate::query_set(descriptor)?;
        Ok(QuerySet::new(
            self.driver.create_query_set(&native),
            native.ty,
            native.count,
        ))
    }

    pub fn queue(&self) -> Queue<D> {
        Queue::from_raw(self.driver.queue())
    }

    /// Pushes a scope capturing `"validation"`, `"out-of-memory"` or `"internal"` errors.
    pub fn push_error_scope(&self, filter: &str) -> Result<(), TranslateError> {
        error_scope::push(&*self.driver, filter)
    }

    /**
    Pops the innermost error scope.

    Resolves to the first error the scope captured, or `None`.  Rejects if the device is lost or
    the driver has no scope to pop.
    */
    pub fn pop_error_scope(&self) -> Pending<Result<Option<GpuError>, OperationError>> {
        error_scope::pop(&*self.driver, &self.keepalive)
    }

    /// Resolves once, when the device is lost or destroyed.  May be called any number of times.
    pub fn lost(&self) -> Pending<DeviceLostInfo> {
        self.lifecycle.lost()
    }

    pub fn lost_state(&self) -> DeviceLostState {
        self.lifecycle.lost_state()
    }

    pub fn features(&self) -> SupportedFeatures {
        SupportedFeatures::new(self.driver.features())
    }

    pub fn limits(&self) -> Result<SupportedLimits, DeviceError> {
        self.driver
            .limits()
            .map(SupportedLimits::new)
            .ok_or(DeviceError::LimitsUnavailable)
    }

    /// Destroys the device.  Idempotent.
    pub fn destroy(&self) {
        self.lifecycle.destroy(&*self.driver);
    }
}

impl<D: Driver> Debug for Device<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("label", &self.label)
            .field("keepalive", &self.keepalive)
            .field("lost_state", &self.lifecycle.lost_state())
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Drop for Device<D> {
    fn drop(&mut self) {
        self.lifecycle.destroy(&*self.driver);
    }
}
