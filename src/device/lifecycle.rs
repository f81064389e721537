// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Device loss, destruction and the driver's device-level callbacks.
*/

use crate::bridge::Pending;
use crate::error::GpuError;
use crate::host::{DeviceEvent, EventTarget, HostMessage, UNCAPTURED_ERROR, UncapturedErrorEvent};
use crate::imp::Driver;
use crate::native::{DeviceLostReason, LoggingType};
use crate::objects::DeviceLostInfo;
use logwise::privacy::LogIt;
use std::cell::Cell;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceLostState {
    Pending,
    ResolvedByDestroy,
    ResolvedByDriver,
}

struct LostInner {
    state: DeviceLostState,
    info: Option<DeviceLostInfo>,
    waiters: Vec<r#continue::Sender<DeviceLostInfo>>,
}

/// One-shot loss notification.  The first resolution wins.
pub(crate) struct LostSignal {
    inner: Mutex<LostInner>,
}

impl LostSignal {
    fn new() -> Self {
        LostSignal {
            inner: Mutex::new(LostInner {
                state: DeviceLostState::Pending,
                info: None,
                waiters: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LostInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns whether this call resolved the signal.
    pub(crate) fn resolve(&self, by: DeviceLostState, info: DeviceLostInfo) -> bool {
        let waiters = {
            let mut inner = self.lock();
            if inner.state != DeviceLostState::Pending {
                return false;
            }
            inner.state = by;
            inner.info = Some(info.clone());
            std::mem::take(&mut inner.waiters)
        };
        for waiter in waiters {
            waiter.send(info.clone());
        }
        true
    }

    pub(crate) fn wait(&self) -> Pending<DeviceLostInfo> {
        let mut inner = self.lock();
        match &inner.info {
            Some(info) => Pending::ready(info.clone()),
            None => {
                let (sender, pending) = Pending::channel();
                inner.waiters.push(sender);
                pending
            }
        }
    }

    pub(crate) fn state(&self) -> DeviceLostState {
        self.lock().state
    }
}

fn forward_log(ty: LoggingType, message: &str) {
    match ty {
        LoggingType::Verbose => {
            logwise::trace_sync!("driver: {message}", message = LogIt(message))
        }
        LoggingType::Info => {
            logwise::info_sync!("driver: {message}", message = LogIt(message))
        }
        LoggingType::Warning => {
            logwise::warn_sync!("driver: {message}", message = LogIt(message))
        }
        LoggingType::Error => {
            logwise::error_sync!("driver: {message}", message = LogIt(message))
        }
    }
}

/// Loss state plus the one-time native release.
pub(crate) struct DeviceLifecycle {
    lost: Arc<LostSignal>,
    released: Cell<bool>,
}

impl DeviceLifecycle {
    /// Registers the device-level callbacks with `driver`.
    pub(crate) fn install<D: Driver>(driver: &D, host: Sender<HostMessage>) -> Self {
        let lost = Arc::new(LostSignal::new());

        let driver_lost = lost.clone();
        driver.set_device_lost_callback(Box::new(move |reason, message| {
            let resolved = driver_lost.resolve(
                DeviceLostState::ResolvedByDriver,
                DeviceLostInfo::new(reason, message),
            );
            if !resolved {
                logwise::trace_sync!("device loss already resolved");
            }
        }));

        driver.set_uncaptured_error_callback(Box::new(move |ty, message| {
            match GpuError::classify(ty, message) {
                Some(error) => {
                    //the receiver is gone once the device is dropped
                    let _ = host.send(HostMessage::UncapturedError(error));
                }
                None => {
                    logwise::info_sync!("driver reported an uncaptured error with no error");
                }
            }
        }));

        driver.set_logging_callback(Box::new(forward_log));

        DeviceLifecycle {
            lost,
            released: Cell::new(false),
        }
    }

    /**
    Destroys the device.

    The first call resolves the loss future if still pending and releases the native device.  Later
    calls do nothing.
    */
    pub(crate) fn destroy<D: Driver>(&self, driver: &D) {
        if self.released.replace(true) {
            return;
        }
        self.lost.resolve(
            DeviceLostState::ResolvedByDestroy,
            DeviceLostInfo::new(DeviceLostReason::Destroyed, "device was destroyed"),
        );
        driver.destroy();
    }

    pub(crate) fn lost(&self) -> Pending<DeviceLostInfo> {
        self.lost.wait()
    }

    pub(crate) fn lost_state(&self) -> DeviceLostState {
        self.lost.state()
    }

    /// Runs a message in the host context.
    pub(crate) fn deliver(&self, message: HostMessage, events: &dyn EventTarget) {
        match message {
            HostMessage::UncapturedError(error) => {
                if events.listener_count(UNCAPTURED_ERROR) > 0 {
                    events.dispatch_event(&DeviceEvent::UncapturedError(UncapturedErrorEvent {
                        error,
                    }));
                } else {
                    logwise::info_sync!("uncaptured GPU error: {error}", error = LogIt(&error));
                }
            }
        }
    }
}
