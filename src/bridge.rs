// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Turns one-shot driver callbacks into futures.

Every asynchronous driver call is issued eagerly.  The caller gets a [Pending] back, and the driver
gets a callback that owns a [PendingOperation].  The operation holds:

* the sending half of a continuation, through which exactly one value is delivered;
* a [KeepaliveToken], so the driver keeps getting ticked until the callback fires.

The callback may fire on any thread.  Resolving the operation only hands the value to the
continuation; whoever awaits the [Pending] observes it in its own context.
*/

use crate::error::{OperationError, PipelineErrorReason};
use crate::imp::CreatePipelineCallback;
use crate::keepalive::{Keepalive, KeepaliveToken};
use crate::native::CreatePipelineAsyncStatus;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The eventual result of an asynchronous driver call.
#[must_use = "futures do nothing unless awaited"]
pub struct Pending<T> {
    inner: Pin<Box<dyn Future<Output = T>>>,
}

impl<T: 'static> Pending<T> {
    /// Creates a pending value together with the sender that completes it.
    pub(crate) fn channel() -> (r#continue::Sender<T>, Self) {
        let (sender, receiver) = r#continue::continuation();
        (
            sender,
            Pending {
                inner: Box::pin(receiver),
            },
        )
    }

    /// A pending value that is already complete.
    pub(crate) fn ready(value: T) -> Self {
        Pending {
            inner: Box::pin(std::future::ready(value)),
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.as_mut().poll(cx)
    }
}

impl<T> Debug for Pending<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending").finish_non_exhaustive()
    }
}

/**
The callback side of one in-flight driver call.

Resolving consumes the operation, so a value is delivered at most once.  If the driver drops the
operation without resolving it, the `abandoned` value is delivered instead; the caller's future
never hangs on a discarded callback.
*/
pub(crate) struct PendingOperation<T> {
    sender: Option<r#continue::Sender<T>>,
    abandoned: fn() -> T,
    //released after the value is delivered
    _keepalive: KeepaliveToken,
}

impl<T: 'static> PendingOperation<T> {
    pub(crate) fn issue(keepalive: &Keepalive, abandoned: fn() -> T) -> (Self, Pending<T>) {
        let (sender, pending) = Pending::channel();
        (
            PendingOperation {
                sender: Some(sender),
                abandoned,
                _keepalive: keepalive.token(),
            },
            pending,
        )
    }
}

impl<T> PendingOperation<T> {
    pub(crate) fn resolve(mut self, value: T) {
        if let Some(sender) = self.sender.take() {
            sender.send(value);
        }
    }
}

impl<T> Drop for PendingOperation<T> {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            logwise::warn_sync!("driver discarded an operation without completing it");
            sender.send((self.abandoned)());
        }
    }
}

/// Delivered when a driver drops a callback without calling it.
pub(crate) fn abandoned<P>() -> Result<P, OperationError> {
    Err(OperationError::Unknown(
        "driver discarded the operation".to_owned(),
    ))
}

/**
Maps a pipeline-creation completion to the outcome the caller sees.

Only [CreatePipelineAsyncStatus::Success] carries a pipeline.  Both device-lost statuses reject as
[OperationError::DeviceLost].
*/
pub(crate) fn pipeline_outcome<P>(
    status: CreatePipelineAsyncStatus,
    pipeline: Option<P>,
    message: &str,
) -> Result<P, OperationError> {
    match status {
        CreatePipelineAsyncStatus::Success => pipeline.ok_or_else(|| {
            OperationError::Unknown("driver reported success without a pipeline".to_owned())
        }),
        CreatePipelineAsyncStatus::ValidationError => Err(OperationError::Pipeline {
            reason: PipelineErrorReason::Validation,
            message: message.to_owned(),
        }),
        CreatePipelineAsyncStatus::InternalError => Err(OperationError::Pipeline {
            reason: PipelineErrorReason::Internal,
            message: message.to_owned(),
        }),
        CreatePipelineAsyncStatus::DeviceLost | CreatePipelineAsyncStatus::DeviceDestroyed => {
            Err(OperationError::DeviceLost(message.to_owned()))
        }
        CreatePipelineAsyncStatus::Unknown => Err(OperationError::Unknown(message.to_owned())),
        CreatePipelineAsyncStatus::Unrecognized(code) => {
            Err(OperationError::UnrecognizedStatus(code))
        }
    }
}

/// Builds the driver callback for an asynchronous pipeline creation.
pub(crate) fn pipeline_callback<P, W>(
    operation: PendingOperation<Result<W, OperationError>>,
    wrap: fn(P) -> W,
) -> CreatePipelineCallback<P>
where
    P: 'static,
    W: Send + 'static,
{
    Box::new(move |status, pipeline, message| {
        let outcome = pipeline_outcome(status, pipeline, message).map(wrap);
        if let Err(e) = &outcome {
            logwise::trace_sync!(
                "async pipeline creation rejected: {err}",
                err = logwise::privacy::LogIt(e)
            );
        }
        operation.resolve(outcome);
    })
}
