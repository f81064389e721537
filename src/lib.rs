// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
gpu_bridge adapts a callback-driven native GPU driver to a host runtime that speaks in
string-tokened descriptor dictionaries, futures and DOM-style events.

The crate is organized around four concerns:

| Concern              | Module                        | What it does                                                          |
|----------------------|-------------------------------|-----------------------------------------------------------------------|
| Descriptors          | [descriptors], [translate]    | Host dictionaries in, native descriptors out, defaults substituted    |
| Async results        | [Pending], [keepalive]        | One-shot driver callbacks become futures; the driver is ticked while any are outstanding |
| Error scopes         | [Device::push_error_scope]    | Scoped error capture, and dispatch of errors no scope captured        |
| Device lifecycle     | [Device::lost], [Device::destroy] | A loss future that resolves exactly once, and idempotent destruction |

# Drivers

A native driver implements [imp::Driver].  [imp::SimulatedDriver] runs in-process and lets you fire
completions explicitly, which makes it the driver of choice for headless hosts and tests.  With the
`backend_wgpu` feature, `imp::WgpuDriver` adapts a [wgpu](https://wgpu.rs) device.

# Host turns

A [Device] is owned by the host's execution context.  Call [Device::tick] once per turn of the
host's event loop: it drives the driver while operations are outstanding, and dispatches events
that driver threads have posted back.  Alternatively, [TickStrategy::Thread] moves driver ticking
onto a dedicated thread; events are still dispatched from [Device::tick].

```
use gpu_bridge::{Device, DeviceOptions};
use gpu_bridge::imp::SimulatedDriver;

let device = Device::headless(SimulatedDriver::new(), DeviceOptions::default());
device.push_error_scope("validation").unwrap();
let popped = device.pop_error_scope();
device.tick();
assert_eq!(test_executors::spin_on(popped), Ok(None));
```
*/

mod bridge;
pub mod config;
pub mod descriptors;
mod device;
pub mod error;
pub mod host;
pub mod imp;
pub mod keepalive;
pub mod native;
pub mod objects;
pub mod translate;

pub use bridge::Pending;
pub use config::{DeviceOptions, TickStrategy};
pub use device::{Device, DeviceLostState};
pub use error::{
    DeviceError, GpuError, GpuErrorKind, OperationError, PipelineErrorReason, TranslateError,
};
pub use host::{DeviceEvent, EventListeners, EventTarget, ListenerId, UncapturedErrorEvent};
pub use objects::{
    BindGroup, BindGroupLayout, Buffer, CommandEncoder, ComputePipeline, DeviceLostInfo,
    PipelineLayout, QuerySet, Queue, RenderPipeline, Sampler, ShaderModule, SupportedFeatures,
    SupportedLimits, Texture, TextureView,
};
