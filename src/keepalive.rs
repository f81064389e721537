// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Keeps the driver ticking while anything is waiting on it.

Native drivers only fire completion callbacks from inside their progress function.  Each pending
operation, and each live object that can still receive callbacks, holds a [KeepaliveToken]; while
at least one token is alive the driver is ticked at least once per host turn.  When the last token
goes away ticking may stop.
*/

use crate::config::TickStrategy;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Shared {
    live: AtomicUsize,
    tick: Box<dyn Fn() + Send + Sync>,
    //only present with a poll thread
    wake: Option<Sender<()>>,
    shutdown: AtomicBool,
}

/// A counted claim on driver ticks.
pub struct KeepaliveToken {
    shared: Arc<Shared>,
}

impl KeepaliveToken {
    fn new(shared: &Arc<Shared>) -> Self {
        if shared.live.fetch_add(1, Ordering::AcqRel) == 0 {
            if let Some(wake) = &shared.wake {
                //the poll thread may already be gone during teardown
                let _ = wake.send(());
            }
        }
        KeepaliveToken {
            shared: shared.clone(),
        }
    }
}

impl Clone for KeepaliveToken {
    fn clone(&self) -> Self {
        KeepaliveToken::new(&self.shared)
    }
}

impl Drop for KeepaliveToken {
    fn drop(&mut self) {
        self.shared.live.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Debug for KeepaliveToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepaliveToken")
            .field("live", &self.shared.live.load(Ordering::Relaxed))
            .finish()
    }
}

/// Owns the token count and, for [TickStrategy::Thread], the poll thread.
pub struct Keepalive {
    shared: Arc<Shared>,
    poll_thread: Option<JoinHandle<()>>,
}

impl Keepalive {
    pub fn new<F>(tick: F, strategy: TickStrategy) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        match strategy {
            TickStrategy::HostTurn => Keepalive {
                shared: Arc::new(Shared {
                    live: AtomicUsize::new(0),
                    tick: Box::new(tick),
                    wake: None,
                    shutdown: AtomicBool::new(false),
                }),
                poll_thread: None,
            },
            TickStrategy::Thread { interval } => {
                let (wake, wake_receiver) = mpsc::channel();
                let shared = Arc::new(Shared {
                    live: AtomicUsize::new(0),
                    tick: Box::new(tick),
                    wake: Some(wake),
                    shutdown: AtomicBool::new(false),
                });
                let thread_shared = shared.clone();
                let poll_thread = thread::Builder::new()
                    .name("gpu_keepalive".to_string())
                    .spawn(move || poll(thread_shared, wake_receiver, interval));
                let poll_thread = match poll_thread {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        //the host can still tick us from its own loop
                        logwise::error_sync!(
                            "failed to spawn keepalive poll thread: {err}",
                            err = logwise::privacy::LogIt(&e)
                        );
                        None
                    }
                };
                Keepalive {
                    shared,
                    poll_thread,
                }
            }
        }
    }

    pub fn token(&self) -> KeepaliveToken {
        KeepaliveToken::new(&self.shared)
    }

    /// Number of tokens currently alive.
    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.live() > 0
    }

    /**
    Runs one host turn's worth of ticking.

    Ticks the driver if any token is alive and no poll thread is doing it already.  Returns
    whether the driver was ticked.
    */
    pub fn tick_if_active(&self) -> bool {
        if self.poll_thread.is_some() || !self.is_active() {
            return false;
        }
        (self.shared.tick)();
        true
    }
}

fn poll(shared: Arc<Shared>, wake: Receiver<()>, interval: Duration) {
    while !shared.shutdown.load(Ordering::Relaxed) {
        if shared.live.load(Ordering::Acquire) > 0 {
            (shared.tick)();
            thread::sleep(interval);
        } else {
            // Park until a token appears
            match wake.recv() {
                Ok(()) => {}
                Err(_) => break,
            }
        }
    }
}

impl Debug for Keepalive {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keepalive")
            .field("live", &self.live())
            .field("poll_thread", &self.poll_thread.is_some())
            .finish()
    }
}

impl Drop for Keepalive {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Relaxed);
        if let Some(wake) = &self.shared.wake {
            let _ = wake.send(());
        }
        if let Some(handle) = self.poll_thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn counting(strategy: TickStrategy) -> (Keepalive, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let move_ticks = ticks.clone();
        let keepalive = Keepalive::new(
            move || {
                move_ticks.fetch_add(1, Ordering::Relaxed);
            },
            strategy,
        );
        (keepalive, ticks)
    }

    #[test]
    fn host_turn_ticks_only_while_tokens_live() {
        let (keepalive, ticks) = counting(TickStrategy::HostTurn);
        assert!(!keepalive.tick_if_active());

        let token = keepalive.token();
        let second = token.clone();
        assert_eq!(keepalive.live(), 2);
        assert!(keepalive.tick_if_active());
        drop(token);
        assert!(keepalive.tick_if_active());
        drop(second);
        assert_eq!(keepalive.live(), 0);
        assert!(!keepalive.tick_if_active());
        assert_eq!(ticks.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn poll_thread_ticks_while_tokens_live() {
        let (keepalive, ticks) = counting(TickStrategy::Thread {
            interval: Duration::from_millis(1),
        });
        let token = keepalive.token();
        let deadline = Instant::now() + Duration::from_secs(10);
        while ticks.load(Ordering::Relaxed) < 3 {
            assert!(Instant::now() < deadline, "poll thread never ticked");
            thread::sleep(Duration::from_millis(1));
        }
        //the host turn defers to the thread
        assert!(!keepalive.tick_if_active());
        drop(token);
        //teardown joins the thread
        drop(keepalive);
    }
}
