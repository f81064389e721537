// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
An in-process driver.

The simulation keeps a real error-scope stack and routes injected errors the way a native driver
does: into the innermost scope whose filter matches, or to the uncaptured-error callback when no
scope matches.  Asynchronous completions are queued and fired either on [Driver::tick] (the
default) or explicitly, which lets callers reproduce any interleaving, from any thread.
*/

use super::{
    CreatePipelineCallback, DeviceLostCallback, Driver, LoggingCallback, PopErrorScopeCallback,
    UncapturedErrorCallback,
};
use crate::native::{
    BindGroupDescriptor, BindGroupLayoutDescriptor, BufferDescriptor, CommandEncoderDescriptor,
    ComputePipelineDescriptor, CreatePipelineAsyncStatus, DeviceLostReason, ErrorFilter, ErrorType,
    FeatureName, Limits, LoggingType, PipelineLayoutDescriptor, QuerySetDescriptor,
    RenderPipelineDescriptor, SamplerDescriptor, ShaderModuleDescriptor, TextureDescriptor,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock};

/// Every object the simulation creates is one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimHandle {
    id: u64,
    kind: &'static str,
    label: Option<String>,
}

impl SimHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
    pub fn kind(&self) -> &'static str {
        self.kind
    }
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Identifies one queued asynchronous completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingCallId(u64);

enum PendingCall {
    PopErrorScope {
        outcome: (ErrorType, String),
        callback: PopErrorScopeCallback,
    },
    Pipeline {
        handle: SimHandle,
        failure: Option<(CreatePipelineAsyncStatus, String)>,
        callback: CreatePipelineCallback<SimHandle>,
    },
}

impl PendingCall {
    fn complete(self, lost: bool) {
        match self {
            PendingCall::PopErrorScope { outcome, callback } => {
                //loss rejects pops still in flight
                if lost {
                    callback(ErrorType::DeviceLost, "device is lost")
                } else {
                    callback(outcome.0, &outcome.1)
                }
            }
            PendingCall::Pipeline {
                handle,
                failure,
                callback,
            } => {
                if lost {
                    callback(CreatePipelineAsyncStatus::DeviceLost, None, "device is lost")
                } else if let Some((status, message)) = failure {
                    callback(status, None, &message)
                } else {
                    callback(CreatePipelineAsyncStatus::Success, Some(handle), "")
                }
            }
        }
    }
}

#[derive(Debug)]
struct Scope {
    filter: ErrorFilter,
    captured: Option<(ErrorType, String)>,
}

struct State {
    next_id: u64,
    scopes: Vec<Scope>,
    pending: Vec<(PendingCallId, PendingCall)>,
    ticks: u64,
    destroy_calls: u32,
    lost: bool,
    auto_complete: bool,
    pipeline_failure: Option<(CreatePipelineAsyncStatus, String)>,
    created: HashMap<&'static str, usize>,
    features: Vec<FeatureName>,
    limits: Option<Limits>,
}

#[derive(Default)]
struct Callbacks {
    lost: Option<DeviceLostCallback>,
    uncaptured: Option<UncapturedErrorCallback>,
    logging: Option<LoggingCallback>,
}

pub struct SimulatedDriver {
    state: Mutex<State>,
    callbacks: RwLock<Callbacks>,
}

impl std::fmt::Debug for SimulatedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("SimulatedDriver")
            .field("scopes", &state.scopes)
            .field("pending", &state.pending.len())
            .field("ticks", &state.ticks)
            .field("lost", &state.lost)
            .finish()
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_matches(filter: ErrorFilter, ty: ErrorType) -> bool {
    matches!(
        (filter, ty),
        (ErrorFilter::Validation, ErrorType::Validation)
            | (ErrorFilter::OutOfMemory, ErrorType::OutOfMemory)
            | (ErrorFilter::Internal, ErrorType::Internal)
    )
}

impl SimulatedDriver {
    /// A driver that completes queued work on every [Driver::tick].
    pub fn new() -> Self {
        SimulatedDriver {
            state: Mutex::new(State {
                next_id: 1,
                scopes: Vec::new(),
                pending: Vec::new(),
                ticks: 0,
                destroy_calls: 0,
                lost: false,
                auto_complete: true,
                pipeline_failure: None,
                created: HashMap::new(),
                features: vec![FeatureName::DepthClipControl],
                limits: Some(Limits::default()),
            }),
            callbacks: RwLock::new(Callbacks::default()),
        }
    }

    /// A driver whose queued work completes only through the `fire*` methods.
    pub fn manual() -> Self {
        let driver = Self::new();
        driver.state().auto_complete = false;
        driver
    }

    pub fn with_features(self, features: Vec<FeatureName>) -> Self {
        self.state().features = features;
        self
    }

    pub fn with_limits(self, limits: Option<Limits>) -> Self {
        self.state().limits = limits;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        //a panicking callback must not wedge the driver
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn callbacks(&self) -> std::sync::RwLockReadGuard<'_, Callbacks> {
        self.callbacks
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle(&self, kind: &'static str, label: Option<&str>) -> SimHandle {
        let mut state = self.state();
        let id = state.next_id;
        state.next_id += 1;
        *state.created.entry(kind).or_default() += 1;
        SimHandle {
            id,
            kind,
            label: label.map(str::to_owned),
        }
    }

    fn enqueue(&self, call: PendingCall) -> PendingCallId {
        let mut state = self.state();
        let id = PendingCallId(state.next_id);
        state.next_id += 1;
        state.pending.push((id, call));
        id
    }

    fn take(&self, id: PendingCallId) -> Option<(PendingCall, bool)> {
        self.take_where(id, |_| true)
    }

    fn take_where(
        &self,
        id: PendingCallId,
        accept: impl Fn(&PendingCall) -> bool,
    ) -> Option<(PendingCall, bool)> {
        let mut state = self.state();
        let index = state
            .pending
            .iter()
            .position(|(p, call)| *p == id && accept(call))?;
        let (_, call) = state.pending.remove(index);
        Some((call, state.lost))
    }

    /// Queued completions, oldest first.
    pub fn pending_calls(&self) -> Vec<PendingCallId> {
        self.state().pending.iter().map(|(id, _)| *id).collect()
    }

    /// Completes a queued call with the outcome the driver determined when it was issued.
    ///
    /// Returns `false` if the call already completed.
    pub fn fire(&self, id: PendingCallId) -> bool {
        match self.take(id) {
            Some((call, lost)) => {
                call.complete(lost);
                true
            }
            None => false,
        }
    }

    /// Completes a queued error-scope pop with an arbitrary outcome.
    pub fn fire_pop_error_scope(&self, id: PendingCallId, ty: ErrorType, message: &str) -> bool {
        match self.take_where(id, |call| matches!(call, PendingCall::PopErrorScope { .. })) {
            Some((PendingCall::PopErrorScope { callback, .. }, _)) => {
                callback(ty, message);
                true
            }
            _ => false,
        }
    }

    /// Completes a queued pipeline creation with an arbitrary status.  The pipeline is delivered
    /// only for [CreatePipelineAsyncStatus::Success].
    pub fn fire_pipeline(
        &self,
        id: PendingCallId,
        status: CreatePipelineAsyncStatus,
        message: &str,
    ) -> bool {
        match self.take_where(id, |call| matches!(call, PendingCall::Pipeline { .. })) {
            Some((PendingCall::Pipeline { handle, callback, .. }, _)) => {
                let pipeline = (status == CreatePipelineAsyncStatus::Success).then_some(handle);
                callback(status, pipeline, message);
                true
            }
            _ => false,
        }
    }

    /// Makes the next asynchronous pipeline creation fail.
    pub fn fail_next_pipeline(&self, status: CreatePipelineAsyncStatus, message: &str) {
        self.state().pipeline_failure = Some((status, message.to_owned()));
    }

    /// Reports an error the way a native driver does.
    ///
    /// The innermost scope whose filter matches captures the error (keeping only the first one);
    /// otherwise the uncaptured-error callback fires on the calling thread.
    pub fn inject_error(&self, ty: ErrorType, message: &str) {
        {
            let mut state = self.state();
            if let Some(scope) = state
                .scopes
                .iter_mut()
                .rev()
                .find(|scope| filter_matches(scope.filter, ty))
            {
                if scope.captured.is_none() {
                    scope.captured = Some((ty, message.to_owned()));
                }
                return;
            }
        }
        if let Some(callback) = &self.callbacks().uncaptured {
            callback(ty, message);
        }
    }

    /// Loses the device, notifying the registered callback on the calling thread.
    pub fn lose(&self, reason: DeviceLostReason, message: &str) {
        self.state().lost = true;
        if let Some(callback) = &self.callbacks().lost {
            callback(reason, message);
        }
    }

    /// Emits a driver log message.  Returns whether a logging callback received it.
    pub fn log(&self, ty: LoggingType, message: &str) -> bool {
        match &self.callbacks().logging {
            Some(callback) => {
                callback(ty, message);
                true
            }
            None => false,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.state().ticks
    }

    pub fn destroy_calls(&self) -> u32 {
        self.state().destroy_calls
    }

    pub fn scope_depth(&self) -> usize {
        self.state().scopes.len()
    }

    pub fn is_lost(&self) -> bool {
        self.state().lost
    }

    /// How many objects of `kind` (for example `"sampler"`) were created.
    pub fn created(&self, kind: &str) -> usize {
        self.state().created.get(kind).copied().unwrap_or(0)
    }

    fn pipeline_async(
        &self,
        kind: &'static str,
        label: Option<&str>,
        callback: CreatePipelineCallback<SimHandle>,
    ) {
        let handle = self.handle(kind, label);
        let failure = self.state().pipeline_failure.take();
        self.enqueue(PendingCall::Pipeline {
            handle,
            failure,
            callback,
        });
    }
}

impl Driver for SimulatedDriver {
    type Buffer = SimHandle;
    type Texture = SimHandle;
    type TextureView = SimHandle;
    type Sampler = SimHandle;
    type BindGroupLayout = SimHandle;
    type BindGroup = SimHandle;
    type ShaderModule = SimHandle;
    type PipelineLayout = SimHandle;
    type RenderPipeline = SimHandle;
    type ComputePipeline = SimHandle;
    type CommandEncoder = SimHandle;
    type QuerySet = SimHandle;
    type Queue = SimHandle;

    fn create_buffer(&self, descriptor: &BufferDescriptor<'_>) -> SimHandle {
        self.handle("buffer", descriptor.label)
    }

    fn create_texture(&self, descriptor: &TextureDescriptor<'_>) -> SimHandle {
        self.handle("texture", descriptor.label)
    }

    fn create_texture_view(&self, _texture: &SimHandle, label: Option<&str>) -> SimHandle {
        self.handle("texture_view", label)
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor<'_>) -> SimHandle {
        self.handle("sampler", descriptor.label)
    }

    fn create_bind_group_layout(&self, descriptor: &BindGroupLayoutDescriptor<'_>) -> SimHandle {
        self.handle("bind_group_layout", descriptor.label)
    }

    fn create_bind_group(&self, descriptor: &BindGroupDescriptor<'_, Self>) -> SimHandle {
        self.handle("bind_group", descriptor.label)
    }

    fn create_shader_module(&self, descriptor: &ShaderModuleDescriptor<'_>) -> SimHandle {
        self.handle("shader_module", descriptor.label)
    }

    fn create_pipeline_layout(&self, descriptor: &PipelineLayoutDescriptor<'_, Self>) -> SimHandle {
        self.handle("pipeline_layout", descriptor.label)
    }

    fn create_render_pipeline(&self, descriptor: &RenderPipelineDescriptor<'_, Self>) -> SimHandle {
        self.handle("render_pipeline", descriptor.label)
    }

    fn create_render_pipeline_async(
        &self,
        descriptor: &RenderPipelineDescriptor<'_, Self>,
        callback: CreatePipelineCallback<SimHandle>,
    ) {
        self.pipeline_async("render_pipeline", descriptor.label, callback)
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor<'_, Self>,
    ) -> SimHandle {
        self.handle("compute_pipeline", descriptor.label)
    }

    fn create_compute_pipeline_async(
        &self,
        descriptor: &ComputePipelineDescriptor<'_, Self>,
        callback: CreatePipelineCallback<SimHandle>,
    ) {
        self.pipeline_async("compute_pipeline", descriptor.label, callback)
    }

    fn create_command_encoder(&self, descriptor: &CommandEncoderDescriptor<'_>) -> SimHandle {
        self.handle("command_encoder", descriptor.label)
    }

    fn create_query_set(&self, descriptor: &QuerySetDescriptor<'_>) -> SimHandle {
        self.handle("query_set", descriptor.label)
    }

    fn queue(&self) -> SimHandle {
        self.handle("queue", None)
    }

    fn push_error_scope(&self, filter: ErrorFilter) {
        self.state().scopes.push(Scope {
            filter,
            captured: None,
        });
    }

    fn pop_error_scope(&self, callback: PopErrorScopeCallback) {
        let outcome = {
            let mut state = self.state();
            if state.lost {
                (ErrorType::DeviceLost, "device is lost".to_owned())
            } else {
                match state.scopes.pop() {
                    None => (ErrorType::Unknown, "no error scope to pop".to_owned()),
                    Some(Scope { captured: None, .. }) => (ErrorType::NoError, String::new()),
                    Some(Scope {
                        captured: Some(captured),
                        ..
                    }) => captured,
                }
            }
        };
        self.enqueue(PendingCall::PopErrorScope { outcome, callback });
    }

    fn set_device_lost_callback(&self, callback: DeviceLostCallback) {
        self.callbacks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .lost = Some(callback);
    }

    fn set_uncaptured_error_callback(&self, callback: UncapturedErrorCallback) {
        self.callbacks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .uncaptured = Some(callback);
    }

    fn set_logging_callback(&self, callback: LoggingCallback) {
        self.callbacks
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .logging = Some(callback);
    }

    fn tick(&self) {
        let (due, lost) = {
            let mut state = self.state();
            state.ticks += 1;
            if !state.auto_complete {
                return;
            }
            (std::mem::take(&mut state.pending), state.lost)
        };
        for (_, call) in due {
            call.complete(lost);
        }
    }

    fn features(&self) -> Vec<FeatureName> {
        self.state().features.clone()
    }

    fn limits(&self) -> Option<Limits> {
        self.state().limits
    }

    fn destroy(&self) {
        let first = {
            let mut state = self.state();
            state.destroy_calls += 1;
            !std::mem::replace(&mut state.lost, true)
        };
        if first {
            if let Some(callback) = &self.callbacks().lost {
                callback(DeviceLostReason::Destroyed, "device was destroyed");
            }
        }
    }
}
