//! Inactivity watchdog that force-logs-out idle sessions.
//!
//! STATE MACHINE
//! =============
//! `Disarmed` -> `Armed` when a protected route is shown with a live session.
//! Every activity signal while `Armed` replaces the pending deadline with a
//! fresh one (sliding window). When a deadline elapses the monitor moves to
//! `Firing`, releases its listeners and asks for a logout; it returns to
//! `Disarmed` once the session is gone or a public route is shown.
//!
//! RESOURCES
//! =========
//! The monitor exclusively owns one timer handle and one listener set. Both
//! are acquired on arming and released on every way out (disarm, fire,
//! drop). Handles cancel/detach when dropped, so replacing the deadline is
//! cancel-then-set and a stale handle can never outlive its monitor. Each
//! deadline also carries an epoch; a callback from a superseded epoch is a
//! no-op.

#[cfg(test)]
#[path = "idle_test.rs"]
mod idle_test;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Silence period after which an authenticated session is terminated.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// DOM events that count as user activity.
pub const ACTIVITY_EVENTS: [&str; 6] = ["mousedown", "mousemove", "keydown", "scroll", "touchstart", "click"];

/// One-shot timer facility.
pub trait Scheduler {
    /// Pending timer; dropping it cancels the callback.
    type Handle;

    /// Run `callback` once after `delay`. Must not invoke it synchronously.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Self::Handle;
}

/// Source of user-interaction signals.
pub trait ActivitySource {
    /// Attached listener set; dropping it detaches every listener.
    type Listeners;

    fn attach(&self, on_activity: Rc<dyn Fn()>) -> Self::Listeners;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Disarmed,
    Armed,
    Firing,
}

struct MonitorInner<S: Scheduler, A: ActivitySource> {
    state: MonitorState,
    scheduler: S,
    source: A,
    deadline: Option<S::Handle>,
    listeners: Option<A::Listeners>,
    epoch: u64,
    on_expire: Rc<dyn Fn()>,
}

/// Sliding-window inactivity watchdog.
pub struct InactivityMonitor<S: Scheduler + 'static, A: ActivitySource + 'static> {
    inner: Rc<RefCell<MonitorInner<S, A>>>,
}

impl<S: Scheduler + 'static, A: ActivitySource + 'static> InactivityMonitor<S, A> {
    /// Create a disarmed monitor. `on_expire` runs once per elapsed deadline
    /// and is expected to start the logout.
    pub fn new(scheduler: S, source: A, on_expire: impl Fn() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MonitorInner {
                state: MonitorState::Disarmed,
                scheduler,
                source,
                deadline: None,
                listeners: None,
                epoch: 0,
                on_expire: Rc::new(on_expire),
            })),
        }
    }

    #[must_use]
    pub fn state(&self) -> MonitorState {
        self.inner.borrow().state
    }

    /// Whether the activity listener set is currently attached.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.borrow().listeners.is_some()
    }

    #[must_use]
    pub fn has_pending_deadline(&self) -> bool {
        self.inner.borrow().deadline.is_some()
    }

    /// Reconcile with the current route and session.
    ///
    /// Arms when a protected route is shown with a session, disarms as soon
    /// as either condition stops holding. Re-syncing an already armed monitor
    /// leaves its deadline alone.
    pub fn sync(&self, route_protected: bool, authenticated: bool) {
        let should_arm = route_protected && authenticated;
        match (self.state(), should_arm) {
            (MonitorState::Disarmed, true) => arm(&self.inner),
            (MonitorState::Armed | MonitorState::Firing, false) => disarm(&self.inner),
            _ => {}
        }
    }

    /// Feed one activity signal. Ignored unless armed.
    pub fn record_activity(&self) {
        on_activity(&self.inner);
    }

    /// Release the timer and listeners now.
    pub fn teardown(&self) {
        disarm(&self.inner);
    }
}

fn arm<S: Scheduler + 'static, A: ActivitySource + 'static>(rc: &Rc<RefCell<MonitorInner<S, A>>>) {
    let weak = Rc::downgrade(rc);
    let callback: Rc<dyn Fn()> = Rc::new(move || {
        if let Some(rc) = weak.upgrade() {
            on_activity(&rc);
        }
    });

    let mut guard = rc.borrow_mut();
    let inner = &mut *guard;
    inner.state = MonitorState::Armed;
    inner.listeners = Some(inner.source.attach(callback));
    reschedule(rc, inner);
    log::debug!("inactivity monitor armed");
}

fn disarm<S: Scheduler + 'static, A: ActivitySource + 'static>(rc: &Rc<RefCell<MonitorInner<S, A>>>) {
    let (deadline, listeners) = {
        let mut inner = rc.borrow_mut();
        if inner.state == MonitorState::Disarmed {
            return;
        }
        inner.state = MonitorState::Disarmed;
        inner.epoch += 1;
        (inner.deadline.take(), inner.listeners.take())
    };
    drop(deadline);
    drop(listeners);
    log::debug!("inactivity monitor disarmed");
}

fn reschedule<S: Scheduler + 'static, A: ActivitySource + 'static>(
    rc: &Rc<RefCell<MonitorInner<S, A>>>,
    inner: &mut MonitorInner<S, A>,
) {
    inner.deadline = None;
    inner.epoch += 1;
    let epoch = inner.epoch;
    let weak = Rc::downgrade(rc);
    let handle = inner.scheduler.schedule(
        INACTIVITY_TIMEOUT,
        Box::new(move || {
            if let Some(rc) = weak.upgrade() {
                fire(&rc, epoch);
            }
        }),
    );
    inner.deadline = Some(handle);
}

fn on_activity<S: Scheduler + 'static, A: ActivitySource + 'static>(rc: &Rc<RefCell<MonitorInner<S, A>>>) {
    let mut inner = rc.borrow_mut();
    if inner.state == MonitorState::Armed {
        reschedule(rc, &mut inner);
    }
}

fn fire<S: Scheduler + 'static, A: ActivitySource + 'static>(rc: &Rc<RefCell<MonitorInner<S, A>>>, epoch: u64) {
    let (deadline, listeners, on_expire) = {
        let mut inner = rc.borrow_mut();
        if inner.state != MonitorState::Armed || inner.epoch != epoch {
            return;
        }
        inner.state = MonitorState::Firing;
        (inner.deadline.take(), inner.listeners.take(), Rc::clone(&inner.on_expire))
    };
    drop(listeners);
    drop(deadline);
    log::info!("no activity for {} minutes, ending session", INACTIVITY_TIMEOUT.as_secs() / 60);
    on_expire();
}
