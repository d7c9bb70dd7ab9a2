#![forbid(unsafe_code)]

//! Timers and other continuous event sources.
//!
//! A model declares the subscriptions it wants through
//! `Model::subscriptions()`. After every update the runner compares the
//! declared set (by [`SubId`]) with what is running: new ids are started,
//! ids that disappeared are stopped through their [`StopSignal`], and
//! unchanged ids keep running. Cancelling a timer is therefore just a matter
//! of no longer declaring it.
//!
//! Two runners exist:
//!
//! - [`Program`](crate::program::Program) runs each subscription on its own
//!   thread and drains messages over a channel.
//! - [`ProgramSimulator`](crate::simulator::ProgramSimulator) never spawns
//!   threads. Timer subscriptions expose a [`Schedule`] and are fired on a
//!   virtual clock instead.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// A unique identifier for a subscription.
pub type SubId = u64;

/// When a timer subscription fires, for runners that drive time themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Fire every `Duration`, first after one full period.
    Interval(Duration),
    /// Fire once after `Duration`.
    Once(Duration),
}

/// A subscription produces messages from an external event source.
pub trait Subscription<M: Send + 'static>: Send {
    /// Subscriptions with the same id are considered identical.
    fn id(&self) -> SubId;

    /// Run on a background thread until `stop` is triggered or the receiver
    /// is dropped.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);

    /// Timer schedule, if this subscription is purely time-driven.
    fn schedule(&self) -> Option<Schedule> {
        None
    }

    /// Produce the message for one firing of a scheduled subscription.
    fn emit(&self) -> Option<M> {
        None
    }
}

/// Signal for stopping a subscription.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// Create a new (signal, trigger) pair.
    pub(crate) fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: inner.clone(),
        };
        (signal, StopTrigger { inner })
    }

    /// A signal that is already stopped.
    pub(crate) fn stopped() -> Self {
        let (signal, trigger) = Self::new();
        trigger.stop();
        signal
    }

    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        // A poisoned flag only happens if a trigger panicked mid-store; treat
        // it as stopped.
        lock.lock().map(|g| *g).unwrap_or(true)
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if the full duration elapsed.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let Ok(mut stopped) = lock.lock() else {
            return true;
        };
        let start = Instant::now();
        while !*stopped {
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            match cvar.wait_timeout(stopped, duration - elapsed) {
                Ok((guard, _)) => stopped = guard,
                Err(_) => return true,
            }
        }
        true
    }
}

/// Trigger to stop a subscription from the runner side.
pub(crate) struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopTrigger {
    pub(crate) fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        if let Ok(mut stopped) = lock.lock() {
            *stopped = true;
        }
        cvar.notify_all();
    }
}

/// A running subscription handle.
pub(crate) struct RunningSubscription {
    pub(crate) id: SubId,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningSubscription {
    /// Stop the subscription and join its thread.
    pub(crate) fn stop(mut self) {
        self.trigger.stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RunningSubscription {
    fn drop(&mut self) {
        self.trigger.stop();
    }
}

/// Thread-backed subscription lifecycle manager.
pub(crate) struct SubscriptionManager<M: Send + 'static> {
    active: Vec<RunningSubscription>,
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
}

impl<M: Send + 'static> SubscriptionManager<M> {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            active: Vec::new(),
            sender,
            receiver,
        }
    }

    /// Start new ids, stop vanished ids, leave the rest running.
    pub(crate) fn reconcile(&mut self, subscriptions: Vec<Box<dyn Subscription<M>>>) {
        let new_ids: HashSet<SubId> = subscriptions.iter().map(|s| s.id()).collect();
        let before = self.active.len();

        let mut remaining = Vec::new();
        for running in self.active.drain(..) {
            if new_ids.contains(&running.id) {
                remaining.push(running);
            } else {
                tracing::debug!(sub_id = running.id, "stopping subscription");
                running.stop();
            }
        }
        self.active = remaining;

        let mut active_ids: HashSet<SubId> = self.active.iter().map(|r| r.id).collect();
        for sub in subscriptions {
            let id = sub.id();
            if !active_ids.insert(id) {
                continue;
            }
            tracing::debug!(sub_id = id, "starting subscription");
            let (signal, trigger) = StopSignal::new();
            let sender = self.sender.clone();
            let thread = thread::spawn(move || sub.run(sender, signal));
            self.active.push(RunningSubscription {
                id,
                trigger,
                thread: Some(thread),
            });
        }

        tracing::trace!(
            active_before = before,
            active_after = self.active.len(),
            "subscription reconcile complete"
        );
    }

    /// Drain pending messages without blocking.
    pub(crate) fn drain_messages(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }

    /// Ids of running subscriptions, in start order.
    pub(crate) fn active_ids(&self) -> Vec<SubId> {
        self.active.iter().map(|r| r.id).collect()
    }

    pub(crate) fn stop_all(&mut self) {
        for running in self.active.drain(..) {
            running.stop();
        }
    }
}

impl<M: Send + 'static> Drop for SubscriptionManager<M> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// --- Built-in subscriptions ---

/// Fires at a fixed interval.
///
/// ```ignore
/// fn subscriptions(&self) -> Vec<Box<dyn Subscription<Msg>>> {
///     vec![Box::new(Every::new(Duration::from_secs(3), || Msg::RotateCaption))]
/// }
/// ```
pub struct Every<M: Send + 'static> {
    id: SubId,
    interval: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> Every<M> {
    /// The id is derived from the interval, so two `Every` with the same
    /// interval dedupe. Use [`with_id`](Self::with_id) to keep them apart.
    pub fn new(interval: Duration, make_msg: impl Fn() -> M + Send + Sync + 'static) -> Self {
        let id = interval.as_nanos() as u64 ^ 0x5449_434B; // "TICK"
        Self::with_id(id, interval, make_msg)
    }

    pub fn with_id(
        id: SubId,
        interval: Duration,
        make_msg: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            interval,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M: Send + 'static> Subscription<M> for Every<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        while !stop.wait_timeout(self.interval) {
            if sender.send((self.make_msg)()).is_err() {
                break;
            }
        }
    }

    fn schedule(&self) -> Option<Schedule> {
        Some(Schedule::Interval(self.interval))
    }

    fn emit(&self) -> Option<M> {
        Some((self.make_msg)())
    }
}

/// Fires once after a delay.
///
/// Stays "active" after firing until the model stops declaring it, so it
/// does not re-fire on later reconciles.
pub struct After<M: Send + 'static> {
    id: SubId,
    delay: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> After<M> {
    pub fn new(delay: Duration, make_msg: impl Fn() -> M + Send + Sync + 'static) -> Self {
        let id = delay.as_nanos() as u64 ^ 0x4146_5452; // "AFTR"
        Self::with_id(id, delay, make_msg)
    }

    pub fn with_id(
        id: SubId,
        delay: Duration,
        make_msg: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            delay,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M: Send + 'static> Subscription<M> for After<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        if !stop.wait_timeout(self.delay) {
            let _ = sender.send((self.make_msg)());
        }
    }

    fn schedule(&self) -> Option<Schedule> {
        Some(Schedule::Once(self.delay))
    }

    fn emit(&self) -> Option<M> {
        Some((self.make_msg)())
    }
}

/// Sends a fixed list of messages immediately, then returns.
pub struct MockSubscription<M: Send + 'static> {
    id: SubId,
    messages: Vec<M>,
}

impl<M: Send + Clone + 'static> MockSubscription<M> {
    pub fn new(id: SubId, messages: Vec<M>) -> Self {
        Self { id, messages }
    }
}

impl<M: Send + Clone + 'static> Subscription<M> for MockSubscription<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, _stop: StopSignal) {
        for msg in &self.messages {
            if sender.send(msg.clone()).is_err() {
                break;
            }
        }
    }
}
