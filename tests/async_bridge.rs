// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Asynchronous driver calls surfaced as futures.
//!
//! These tests drive a manual [SimulatedDriver], so every completion happens exactly when the test
//! says so: out of order, from another thread, or not at all.

use gpu_bridge::descriptors::{
    ComputePipelineDescriptor, ProgrammableStage, RenderPipelineDescriptor, ShaderModuleDescriptor,
};
use gpu_bridge::imp::SimulatedDriver;
use gpu_bridge::native::CreatePipelineAsyncStatus;
use gpu_bridge::{Device, DeviceOptions, OperationError, PipelineErrorReason, TickStrategy};
use std::time::Duration;

fn shader() -> ShaderModuleDescriptor {
    ShaderModuleDescriptor {
        label: Some("shader".to_owned()),
        code: "@compute @workgroup_size(1) fn main() {}".to_owned(),
    }
}

#[test]
fn interleaved_completions_resolve_their_own_future() {
    let device = Device::headless(SimulatedDriver::manual(), DeviceOptions::default());
    let module = device.create_shader_module(&shader());

    let mut pendings = Vec::new();
    for label in ["a", "b", "c", "d"] {
        let mut descriptor =
            ComputePipelineDescriptor::new(ProgrammableStage::new(&module, "main"));
        descriptor.label = Some(label.to_owned());
        pendings.push(device.create_compute_pipeline_async(&descriptor).unwrap());
    }

    let calls = device.driver().pending_calls();
    assert_eq!(calls.len(), 4);
    //fire in reverse, failing the second
    for (i, id) in calls.iter().enumerate().rev() {
        if i == 1 {
            assert!(
                device
                    .driver()
                    .fire_pipeline(*id, CreatePipelineAsyncStatus::ValidationError, "bad entry")
            );
        } else {
            assert!(device.driver().fire(*id));
        }
    }
    //a second completion is never delivered
    assert!(!device.driver().fire(calls[0]));

    for (i, (label, pending)) in ["a", "b", "c", "d"].into_iter().zip(pendings).enumerate() {
        let result = test_executors::spin_on(pending);
        if i == 1 {
            assert_eq!(
                result.unwrap_err(),
                OperationError::Pipeline {
                    reason: PipelineErrorReason::Validation,
                    message: "bad entry".to_owned()
                }
            );
        } else {
            assert_eq!(result.unwrap().raw().label(), Some(label));
        }
    }
}

#[test]
fn completion_from_a_foreign_thread() {
    let device = Device::headless(SimulatedDriver::manual(), DeviceOptions::default());
    let module = device.create_shader_module(&shader());
    let mut descriptor = RenderPipelineDescriptor::new(ProgrammableStage::new(&module, "vs"));
    descriptor.label = Some("threaded".to_owned());
    let pending = device.create_render_pipeline_async(&descriptor).unwrap();

    let driver = device.driver().clone();
    let id = driver.pending_calls()[0];
    std::thread::spawn(move || {
        assert!(driver.fire(id));
    })
    .join()
    .unwrap();

    let pipeline = test_executors::spin_on(pending).unwrap();
    assert_eq!(pipeline.raw().label(), Some("threaded"));
}

#[test]
fn driver_is_ticked_only_while_work_is_outstanding() {
    let device = Device::headless(SimulatedDriver::new(), DeviceOptions::default());
    device.tick();
    assert_eq!(device.driver().ticks(), 0);
    assert_eq!(device.keepalive_count(), 0);

    let module = device.create_shader_module(&shader());
    let pending = device
        .create_compute_pipeline_async(&ComputePipelineDescriptor::new(ProgrammableStage::new(
            &module, "main",
        )))
        .unwrap();
    //the module and the operation
    assert_eq!(device.keepalive_count(), 2);

    device.tick();
    assert_eq!(device.driver().ticks(), 1);
    assert!(test_executors::spin_on(pending).is_ok());

    drop(module);
    assert_eq!(device.keepalive_count(), 0);
    device.tick();
    assert_eq!(device.driver().ticks(), 1);
}

#[test]
fn dropped_callback_rejects_instead_of_hanging() {
    let device = Device::headless(SimulatedDriver::manual(), DeviceOptions::default());
    let module = device.create_shader_module(&shader());
    let pending = device
        .create_compute_pipeline_async(&ComputePipelineDescriptor::new(ProgrammableStage::new(
            &module, "main",
        )))
        .unwrap();
    //the driver goes away with its queued callbacks
    drop(module);
    drop(device);
    assert!(matches!(
        test_executors::spin_on(pending),
        Err(OperationError::Unknown(_))
    ));
}

#[test]
fn lost_device_fails_pending_pipelines() {
    let device = Device::headless(SimulatedDriver::manual(), DeviceOptions::default());
    let module = device.create_shader_module(&shader());
    let pending = device
        .create_compute_pipeline_async(&ComputePipelineDescriptor::new(ProgrammableStage::new(
            &module, "main",
        )))
        .unwrap();
    device.destroy();
    let id = device.driver().pending_calls()[0];
    assert!(device.driver().fire(id));
    assert_eq!(
        test_executors::spin_on(pending).unwrap_err(),
        OperationError::DeviceLost("device is lost".to_owned())
    );
}

#[test]
fn poll_thread_ticks_without_host_turns() {
    let options =
        DeviceOptions::new().tick_strategy(TickStrategy::Thread {
            interval: Duration::from_millis(1),
        });
    let device = Device::headless(SimulatedDriver::new(), options);
    let module = device.create_shader_module(&shader());
    let pending = device
        .create_compute_pipeline_async(&ComputePipelineDescriptor::new(ProgrammableStage::new(
            &module, "main",
        )))
        .unwrap();
    //no device.tick() here
    assert!(test_executors::spin_on(pending).is_ok());
    assert!(device.driver().ticks() >= 1);
}

#[test_executors::async_test]
async fn awaiting_many_operations_together() {
    let device = Device::headless(SimulatedDriver::new(), DeviceOptions::default());
    for _ in 0..3 {
        device.push_error_scope("validation").unwrap();
    }
    let pops: Vec<_> = (0..3).map(|_| device.pop_error_scope()).collect();
    device.tick();
    let results = futures::future::join_all(pops).await;
    assert_eq!(results, vec![Ok(None), Ok(None), Ok(None)]);
    assert_eq!(device.keepalive_count(), 0);
}

#[test]
fn driver_reported_pipeline_failure_rejects() {
    let device = Device::headless(SimulatedDriver::new(), DeviceOptions::default());
    let module = device.create_shader_module(&shader());
    device
        .driver()
        .fail_next_pipeline(CreatePipelineAsyncStatus::InternalError, "out of registers");
    let failed = device
        .create_render_pipeline_async(&RenderPipelineDescriptor::new(ProgrammableStage::new(
            &module, "vs",
        )))
        .unwrap();
    //the failure applies to one creation only
    let succeeded = device
        .create_render_pipeline_async(&RenderPipelineDescriptor::new(ProgrammableStage::new(
            &module, "vs",
        )))
        .unwrap();
    device.tick();
    assert_eq!(
        test_executors::spin_on(failed).unwrap_err(),
        OperationError::Pipeline {
            reason: PipelineErrorReason::Internal,
            message: "out of registers".to_owned()
        }
    );
    assert!(test_executors::spin_on(succeeded).is_ok());
}
