// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Error scopes as the host sees them.

use gpu_bridge::imp::SimulatedDriver;
use gpu_bridge::native::{DeviceLostReason, ErrorType};
use gpu_bridge::{Device, DeviceOptions, GpuError, GpuErrorKind, OperationError, TranslateError};

fn device() -> Device<SimulatedDriver> {
    Device::headless(SimulatedDriver::new(), DeviceOptions::default())
}

#[test_executors::async_test]
async fn empty_scope_resolves_none() {
    let device = device();
    device.push_error_scope("out-of-memory").unwrap();
    let popped = device.pop_error_scope();
    device.tick();
    assert_eq!(popped.await, Ok(None));
}

#[test]
fn innermost_matching_scope_captures_first_error() {
    let device = device();
    device.push_error_scope("validation").unwrap();
    device.push_error_scope("out-of-memory").unwrap();
    device
        .driver()
        .inject_error(ErrorType::Validation, "first validation error");
    device
        .driver()
        .inject_error(ErrorType::Validation, "second validation error");

    let inner = device.pop_error_scope();
    let outer = device.pop_error_scope();
    device.tick();
    assert_eq!(test_executors::spin_on(inner), Ok(None));
    assert_eq!(
        test_executors::spin_on(outer),
        Ok(Some(GpuError::new(
            GpuErrorKind::Validation,
            "first validation error"
        )))
    );
    assert_eq!(device.driver().scope_depth(), 0);
}

#[test]
fn internal_errors_resolve_as_errors() {
    let device = device();
    device.push_error_scope("internal").unwrap();
    device.driver().inject_error(ErrorType::Internal, "compiler crashed");
    let popped = device.pop_error_scope();
    device.tick();
    let error = test_executors::spin_on(popped).unwrap().unwrap();
    assert_eq!(error.kind(), GpuErrorKind::Internal);
    assert_eq!(error.message(), "compiler crashed");
}

#[test]
fn popping_an_empty_stack_rejects() {
    let device = device();
    let popped = device.pop_error_scope();
    device.tick();
    assert_eq!(
        test_executors::spin_on(popped),
        Err(OperationError::Unknown("no error scope to pop".to_owned()))
    );
}

#[test]
fn popping_after_loss_rejects() {
    let device = device();
    device.push_error_scope("validation").unwrap();
    device.driver().lose(DeviceLostReason::Undefined, "reset");
    let popped = device.pop_error_scope();
    device.tick();
    assert_eq!(
        test_executors::spin_on(popped),
        Err(OperationError::DeviceLost("device is lost".to_owned()))
    );
}

#[test]
fn unknown_filter_fails_synchronously() {
    let device = device();
    assert!(matches!(
        device.push_error_scope("everything"),
        Err(TranslateError::UnknownToken { .. })
    ));
    assert_eq!(device.driver().scope_depth(), 0);
}

#[test]
fn pops_complete_in_driver_order() {
    let device = Device::headless(SimulatedDriver::manual(), DeviceOptions::default());
    device.push_error_scope("validation").unwrap();
    device.push_error_scope("validation").unwrap();
    device.driver().inject_error(ErrorType::Validation, "inner");
    let first = device.pop_error_scope();
    let second = device.pop_error_scope();

    let calls = device.driver().pending_calls();
    assert_eq!(calls.len(), 2);
    //outcomes were fixed at pop time, so firing out of order still routes correctly
    assert!(device.driver().fire(calls[1]));
    assert!(device.driver().fire(calls[0]));
    assert_eq!(
        test_executors::spin_on(first).unwrap().map(|e| e.message().to_owned()),
        Some("inner".to_owned())
    );
    assert_eq!(test_executors::spin_on(second), Ok(None));
}

#[test]
fn unrecognized_status_rejects() {
    let device = Device::headless(SimulatedDriver::manual(), DeviceOptions::default());
    device.push_error_scope("validation").unwrap();
    let popped = device.pop_error_scope();
    let id = device.driver().pending_calls()[0];
    assert!(
        device
            .driver()
            .fire_pop_error_scope(id, ErrorType::Unrecognized(0x7f), "")
    );
    assert_eq!(
        test_executors::spin_on(popped),
        Err(OperationError::UnrecognizedStatus(0x7f))
    );
}

#[test]
fn loss_rejects_a_pop_already_in_flight() {
    let device = Device::headless(SimulatedDriver::manual(), DeviceOptions::default());
    device.push_error_scope("validation").unwrap();
    let popped = device.pop_error_scope();
    device.driver().lose(DeviceLostReason::Undefined, "reset");
    let id = device.driver().pending_calls()[0];
    assert!(device.driver().fire(id));
    assert!(matches!(
        test_executors::spin_on(popped),
        Err(OperationError::DeviceLost(_))
    ));
}
