//! Threaded control loop around a [`Machine`].
//!
//! The loop owns the machine outright. Callers talk to it through a bounded
//! mailbox of [`Control`] messages and a single-slot interrupt mailbox that
//! overwrites rather than queues, like an interrupt line asserted again
//! before it was acknowledged. Ticks fire on the machine's tick interval,
//! timed with `recv_timeout` on the control mailbox.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::SchedulerConfig;
use crate::core::machine::{Machine, MachineError, Status, TraceSink};

type Inspector = Box<dyn FnOnce(&mut Machine) + Send>;

pub enum Control {
    Start(SyncSender<Result<(), MachineError>>),
    Stop,
    SetTrace(Option<TraceSink>),
    /// Stop once the machine's tick count reaches the limit; `None` clears it.
    StopAt(Option<u64>),
    /// Run a closure against the machine between ticks.
    Inspect(Inspector),
    Quit,
}

/// Single-slot overwrite mailbox for maskable interrupt vectors aimed at
/// core 0.
#[derive(Default)]
struct InterruptMailbox {
    slot: Mutex<Option<u8>>,
}

impl InterruptMailbox {
    fn post(&self, vector: u8) {
        *self.slot.lock() = Some(vector);
    }

    fn take(&self) -> Option<u8> {
        self.slot.lock().take()
    }
}

pub struct MachineHandle {
    tx: SyncSender<Control>,
    interrupts: Arc<InterruptMailbox>,
    thread: Option<JoinHandle<Machine>>,
}

impl MachineHandle {
    /// Move `machine` onto its own scheduler thread.
    pub fn spawn(mut machine: Machine, config: &SchedulerConfig) -> Self {
        machine.set_tick_interval(config.tick_interval());
        let (tx, rx) = mpsc::sync_channel(config.mailbox_capacity.max(1));
        let interrupts = Arc::new(InterruptMailbox::default());
        let mailbox = Arc::clone(&interrupts);
        let thread = thread::spawn(move || control_loop(machine, rx, mailbox));
        Self {
            tx,
            interrupts,
            thread: Some(thread),
        }
    }

    fn send(&self, msg: Control) -> Result<(), MachineError> {
        self.tx.send(msg).map_err(|_| MachineError::Disconnected)
    }

    pub fn start(&self) -> Result<(), MachineError> {
        let (reply, result) = mpsc::sync_channel(1);
        self.send(Control::Start(reply))?;
        result.recv().map_err(|_| MachineError::Disconnected)?
    }

    pub fn stop(&self) -> Result<(), MachineError> {
        self.send(Control::Stop)
    }

    pub fn set_trace(&self, sink: Option<TraceSink>) -> Result<(), MachineError> {
        self.send(Control::SetTrace(sink))
    }

    /// Stop the machine on the scheduler thread as soon as it has completed
    /// `ticks` ticks in total.
    pub fn stop_at(&self, ticks: Option<u64>) -> Result<(), MachineError> {
        self.send(Control::StopAt(ticks))
    }

    /// Latch a vector for core 0. Never blocks; an unconsumed earlier
    /// vector is replaced.
    pub fn raise_interrupt(&self, vector: u8) {
        self.interrupts.post(vector);
    }

    /// Run `f` on the scheduler thread between ticks and return its result.
    pub fn inspect<R, F>(&self, f: F) -> Result<R, MachineError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Machine) -> R + Send + 'static,
    {
        let (reply, result) = mpsc::sync_channel(1);
        self.send(Control::Inspect(Box::new(move |machine| {
            let _ = reply.send(f(machine));
        })))?;
        result.recv().map_err(|_| MachineError::Disconnected)
    }

    pub fn status(&self) -> Result<Status, MachineError> {
        self.inspect(|machine| machine.status())
    }

    /// Stop the loop and take the machine back.
    pub fn quit(mut self) -> Result<Machine, MachineError> {
        self.shutdown().ok_or(MachineError::Disconnected)
    }

    fn shutdown(&mut self) -> Option<Machine> {
        let thread = self.thread.take()?;
        let _ = self.tx.send(Control::Quit);
        thread.join().ok()
    }
}

impl Drop for MachineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn control_loop(mut machine: Machine, rx: Receiver<Control>, interrupts: Arc<InterruptMailbox>) -> Machine {
    let mut next_tick = Instant::now() + machine.tick_interval();
    let mut tick_limit = None;
    loop {
        if let Some(vector) = interrupts.take() {
            if let Err(err) = machine.raise_interrupt(0, vector) {
                log::warn!("dropping interrupt {vector:#04x}: {err}");
            }
        }

        let timeout = next_tick.saturating_duration_since(Instant::now());
        match rx.recv_timeout(timeout) {
            Ok(Control::Start(reply)) => {
                let _ = reply.send(machine.start());
            }
            Ok(Control::Stop) => machine.stop(),
            Ok(Control::SetTrace(sink)) => machine.set_trace(sink),
            Ok(Control::StopAt(limit)) => {
                tick_limit = limit;
                enforce_limit(&mut machine, tick_limit);
            }
            Ok(Control::Inspect(f)) => f(&mut machine),
            Ok(Control::Quit) | Err(RecvTimeoutError::Disconnected) => {
                log::debug!("scheduler loop exiting after {} ticks", machine.ticks());
                return machine;
            }
            Err(RecvTimeoutError::Timeout) => {
                if !enforce_limit(&mut machine, tick_limit) {
                    // Trapped machines refuse ticks; the status already says so.
                    let _ = machine.tick();
                    enforce_limit(&mut machine, tick_limit);
                }
                let now = Instant::now();
                next_tick += machine.tick_interval();
                if next_tick < now {
                    next_tick = now + machine.tick_interval();
                }
            }
        }
    }
}

/// Stop a running machine that has reached `limit`. Returns true if it did.
fn enforce_limit(machine: &mut Machine, limit: Option<u64>) -> bool {
    match limit {
        Some(limit) if machine.status() == Status::Running && machine.ticks() >= limit => {
            log::debug!("tick limit {limit} reached");
            machine.stop();
            true
        }
        _ => false,
    }
}
