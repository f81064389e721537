// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Error scopes.  The stack itself lives in the driver; this only brokers pushes and pops.

use crate::bridge::{Pending, PendingOperation};
use crate::error::{GpuError, GpuErrorKind, OperationError, TranslateError};
use crate::imp::{Driver, PopErrorScopeCallback};
use crate::keepalive::Keepalive;
use crate::native::ErrorType;
use crate::translate;

pub(crate) type PopOutcome = Result<Option<GpuError>, OperationError>;

pub(crate) fn push<D: Driver>(driver: &D, filter: &str) -> Result<(), TranslateError> {
    driver.push_error_scope(translate::error_filter(filter)?);
    Ok(())
}

pub(crate) fn pop<D: Driver>(driver: &D, keepalive: &Keepalive) -> Pending<PopOutcome> {
    let (operation, pending) = PendingOperation::issue(keepalive, || {
        Err(OperationError::Unknown(
            "driver discarded the error scope pop".to_owned(),
        ))
    });
    let callback: PopErrorScopeCallback = Box::new(move |ty, message| {
        operation.resolve(pop_outcome(ty, message));
    });
    driver.pop_error_scope(callback);
    pending
}

/**
Maps a pop result.

Device-lost and unknown outcomes both reject, and so does any code this crate does not know.
The rejection variants stay distinct so callers can tell them apart.
*/
pub(crate) fn pop_outcome(ty: ErrorType, message: &str) -> PopOutcome {
    match ty {
        ErrorType::NoError => Ok(None),
        ErrorType::Validation => Ok(Some(GpuError::new(GpuErrorKind::Validation, message))),
        ErrorType::OutOfMemory => Ok(Some(GpuError::new(GpuErrorKind::OutOfMemory, message))),
        ErrorType::Internal => Ok(Some(GpuError::new(GpuErrorKind::Internal, message))),
        ErrorType::DeviceLost => Err(OperationError::DeviceLost(message.to_owned())),
        ErrorType::Unknown => Err(OperationError::Unknown(message.to_owned())),
        ErrorType::Unrecognized(code) => Err(OperationError::UnrecognizedStatus(code)),
    }
}
