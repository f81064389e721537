// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The host side of the bridge.

Driver callbacks run on arbitrary threads, but events must be dispatched in the host's own
execution context.  Callbacks therefore only enqueue a [HostMessage];
[Device::tick](crate::Device::tick) drains the queue on the host thread and dispatches to the
device's [EventTarget].
*/

use crate::error::GpuError;
use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

/// Event type name under which uncaptured errors are dispatched.
pub const UNCAPTURED_ERROR: &str = "uncapturederror";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncapturedErrorEvent {
    pub error: GpuError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    UncapturedError(UncapturedErrorEvent),
}

impl DeviceEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DeviceEvent::UncapturedError(_) => UNCAPTURED_ERROR,
        }
    }
}

/// Something the device can dispatch events to.  Lives in the host context.
pub trait EventTarget {
    fn listener_count(&self, event_type: &str) -> usize;
    fn dispatch_event(&self, event: &DeviceEvent);
}

/// A target with no listeners; every event falls through to logging.
impl EventTarget for () {
    fn listener_count(&self, _event_type: &str) -> usize {
        0
    }
    fn dispatch_event(&self, _event: &DeviceEvent) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&DeviceEvent)>;

/// A simple listener registry.
#[derive(Default)]
pub struct EventListeners {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(String, ListenerId, Listener)>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener<F>(&self, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&DeviceEvent) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .push((event_type.to_owned(), id, Rc::new(listener)));
        id
    }

    /// Returns whether the listener was registered.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(_, listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}

impl EventTarget for EventListeners {
    fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(ty, _, _)| ty == event_type)
            .count()
    }

    fn dispatch_event(&self, event: &DeviceEvent) {
        //snapshot, so listeners may add or remove listeners
        let matching: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(ty, _, _)| ty == event.event_type())
            .map(|(_, _, listener)| listener.clone())
            .collect();
        for listener in matching {
            listener(event);
        }
    }
}

impl Debug for EventListeners {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListeners")
            .field("count", &self.listeners.borrow().len())
            .finish()
    }
}

/// Work a driver thread hands to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostMessage {
    UncapturedError(GpuError),
}

/// Driver threads send, the host thread drains.
#[derive(Debug)]
pub(crate) struct HostQueue {
    sender: Sender<HostMessage>,
    receiver: Receiver<HostMessage>,
}

impl HostQueue {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        HostQueue { sender, receiver }
    }

    pub(crate) fn sender(&self) -> Sender<HostMessage> {
        self.sender.clone()
    }

    /// Everything enqueued so far, in arrival order.
    pub(crate) fn drain(&self) -> Vec<HostMessage> {
        self.receiver.try_iter().collect()
    }
}
