//! In-memory doubles for the gateways, navigation, timers and DOM signals.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::net::gateway::{
    AuthError, LogoutInvalidationError, PersistenceGateway, ProfileError, RecordError, RecordGateway, ResumeError,
    XmlQuery,
};
use crate::net::types::{
    CertificateUpload, Company, CompanyChanges, ParseFile, ProfileUpdate, Session, XmlRecord,
};
use crate::routes::{AppRoute, Navigator};
use crate::state::idle::{ActivitySource, Scheduler};

pub fn session(username: &str) -> Session {
    Session {
        id: format!("id-{username}"),
        username: username.to_owned(),
        token: format!("r:{username}"),
        email: None,
    }
}

// =============================================================================
// GATEWAY
// =============================================================================

pub struct FakeGateway {
    pub accounts: RefCell<HashMap<String, String>>,
    pub resume_result: RefCell<Result<Option<Session>, ResumeError>>,
    pub network_down: Cell<bool>,
    pub fail_invalidate: Cell<bool>,
    pub auth_calls: Cell<usize>,
    pub invalidate_calls: Cell<usize>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl FakeGateway {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            accounts: RefCell::new(HashMap::new()),
            resume_result: RefCell::new(Ok(None)),
            network_down: Cell::new(false),
            fail_invalidate: Cell::new(false),
            auth_calls: Cell::new(0),
            invalidate_calls: Cell::new(0),
            gate: RefCell::new(None),
        })
    }

    pub fn with_account(username: &str, password: &str) -> Rc<Self> {
        let gateway = Self::new();
        gateway.accounts.borrow_mut().insert(username.to_owned(), password.to_owned());
        gateway
    }

    /// The next gateway call stays pending until the returned sender fires.
    pub fn hold_next_call(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }

    async fn pass_gate(&self) {
        let gate = self.gate.borrow_mut().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
    }
}

#[async_trait(?Send)]
impl PersistenceGateway for FakeGateway {
    async fn resume_session(&self) -> Result<Option<Session>, ResumeError> {
        self.pass_gate().await;
        self.resume_result.borrow().clone()
    }

    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        self.pass_gate().await;
        self.auth_calls.set(self.auth_calls.get() + 1);
        if self.network_down.get() {
            return Err(AuthError::Network("offline".to_owned()));
        }
        match self.accounts.borrow().get(identifier) {
            Some(password) if password == secret => Ok(session(identifier)),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn create_account(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        self.pass_gate().await;
        self.auth_calls.set(self.auth_calls.get() + 1);
        if self.network_down.get() {
            return Err(AuthError::Network("offline".to_owned()));
        }
        let mut accounts = self.accounts.borrow_mut();
        if accounts.contains_key(identifier) {
            return Err(AuthError::DuplicateIdentifier);
        }
        accounts.insert(identifier.to_owned(), secret.to_owned());
        Ok(session(identifier))
    }

    async fn invalidate_session(&self) -> Result<(), LogoutInvalidationError> {
        self.invalidate_calls.set(self.invalidate_calls.get() + 1);
        if self.fail_invalidate.get() {
            return Err(LogoutInvalidationError("offline".to_owned()));
        }
        Ok(())
    }

    async fn update_profile(&self, session: &Session, update: &ProfileUpdate) -> Result<Session, ProfileError> {
        self.pass_gate().await;
        if self.network_down.get() {
            return Err(ProfileError::Network("offline".to_owned()));
        }
        let mut accounts = self.accounts.borrow_mut();
        if let Some(change) = &update.password {
            if accounts.get(&session.username) != Some(&change.current) {
                return Err(ProfileError::WrongCurrentPassword);
            }
        }
        if let Some(username) = &update.username {
            if *username != session.username && accounts.contains_key(username) {
                return Err(ProfileError::DuplicateIdentifier);
            }
        }

        let mut password = accounts.remove(&session.username).unwrap_or_default();
        if let Some(change) = &update.password {
            password.clone_from(&change.new);
        }
        let mut updated = session.clone();
        if let Some(username) = &update.username {
            updated.username.clone_from(username);
        }
        accounts.insert(updated.username.clone(), password);
        Ok(updated)
    }
}

// =============================================================================
// RECORDS
// =============================================================================

pub fn company(id: &str, cnpj: &str, legal_name: &str, validity: Option<time::OffsetDateTime>) -> Company {
    Company {
        id: id.to_owned(),
        cnpj: cnpj.to_owned(),
        legal_name: legal_name.to_owned(),
        certificate_validity: validity.map(|iso| crate::net::types::ParseDate { iso }),
    }
}

pub fn xml(id: &str, cnpj: &str, amount: f64) -> XmlRecord {
    XmlRecord { id: id.to_owned(), cnpj: cnpj.to_owned(), access_key: format!("3524{id:0>40}"), amount }
}

/// In-memory record store. `xmls` is kept newest first.
#[derive(Default)]
pub struct FakeRecords {
    pub companies: RefCell<Vec<Company>>,
    pub xmls: RefCell<Vec<XmlRecord>>,
    pub uploads: RefCell<Vec<CertificateUpload>>,
    pub saved: RefCell<Vec<(Option<String>, CompanyChanges)>>,
    pub session_expired: Cell<bool>,
    pub fail_uploads: Cell<bool>,
    next_id: Cell<u32>,
}

impl FakeRecords {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn check_session(&self) -> Result<(), RecordError> {
        if self.session_expired.get() {
            return Err(RecordError::SessionExpired);
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl RecordGateway for FakeRecords {
    async fn list_companies(&self, _session: &Session) -> Result<Vec<Company>, RecordError> {
        self.check_session()?;
        Ok(self.companies.borrow().clone())
    }

    async fn save_company(
        &self,
        _session: &Session,
        id: Option<&str>,
        changes: &CompanyChanges,
    ) -> Result<String, RecordError> {
        self.check_session()?;
        self.saved.borrow_mut().push((id.map(str::to_owned), changes.clone()));
        let mut companies = self.companies.borrow_mut();
        let id = match id {
            Some(id) => {
                if !companies.iter().any(|c| c.id == id) {
                    return Err(RecordError::NotFound);
                }
                id.to_owned()
            }
            None => {
                let n = self.next_id.get() + 1;
                self.next_id.set(n);
                let id = format!("c{n}");
                companies.push(company(&id, "", "", None));
                id
            }
        };
        if let Some(target) = companies.iter_mut().find(|c| c.id == id) {
            if let Some(cnpj) = &changes.cnpj {
                target.cnpj.clone_from(cnpj);
            }
            if let Some(name) = &changes.legal_name {
                target.legal_name.clone_from(name);
            }
            if changes.certificate_validity.is_some() {
                target.certificate_validity = changes.certificate_validity;
            }
        }
        Ok(id)
    }

    async fn delete_company(&self, _session: &Session, id: &str) -> Result<(), RecordError> {
        self.check_session()?;
        let mut companies = self.companies.borrow_mut();
        let before = companies.len();
        companies.retain(|c| c.id != id);
        if companies.len() == before {
            return Err(RecordError::NotFound);
        }
        Ok(())
    }

    async fn upload_file(&self, _session: &Session, upload: &CertificateUpload) -> Result<ParseFile, RecordError> {
        self.check_session()?;
        if self.fail_uploads.get() {
            return Err(RecordError::Network("upload failed".to_owned()));
        }
        self.uploads.borrow_mut().push(upload.clone());
        Ok(ParseFile { name: format!("stored_{}", upload.file_name), url: None })
    }

    async fn list_xmls(&self, _session: &Session, query: &XmlQuery) -> Result<Vec<XmlRecord>, RecordError> {
        self.check_session()?;
        Ok(self
            .xmls
            .borrow()
            .iter()
            .filter(|x| query.cnpjs.is_empty() || query.cnpjs.contains(&x.cnpj))
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn count_xmls(&self, _session: &Session) -> Result<u64, RecordError> {
        self.check_session()?;
        Ok(self.xmls.borrow().len() as u64)
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

#[derive(Default)]
pub struct RecordingNavigator {
    pub visits: RefCell<Vec<AppRoute>>,
    on_navigate: RefCell<Option<Rc<dyn Fn(AppRoute)>>>,
}

impl RecordingNavigator {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn last(&self) -> Option<AppRoute> {
        self.visits.borrow().last().copied()
    }

    pub fn count(&self) -> usize {
        self.visits.borrow().len()
    }

    /// Run `hook` after each recorded navigation.
    pub fn set_hook(&self, hook: impl Fn(AppRoute) + 'static) {
        *self.on_navigate.borrow_mut() = Some(Rc::new(hook));
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: AppRoute) {
        self.visits.borrow_mut().push(route);
        let hook = self.on_navigate.borrow().clone();
        if let Some(hook) = hook {
            hook(route);
        }
    }
}

// =============================================================================
// VIRTUAL CLOCK
// =============================================================================

struct PendingTimer {
    id: u64,
    due: Duration,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct ClockInner {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    timers: RefCell<Vec<PendingTimer>>,
}

/// Manually advanced timer queue.
#[derive(Clone, Default)]
pub struct VirtualClock {
    inner: Rc<ClockInner>,
}

pub struct TimerHandle {
    clock: Weak<ClockInner>,
    id: u64,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(clock) = self.clock.upgrade() {
            clock.timers.borrow_mut().retain(|t| t.id != self.id);
        }
    }
}

impl VirtualClock {
    pub fn now(&self) -> Duration {
        self.inner.now.get()
    }

    pub fn pending(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Move time forward, firing due timers in order.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        loop {
            let next = {
                let mut timers = self.inner.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                due.map(|i| timers.remove(i))
            };
            let Some(timer) = next else { break };
            self.inner.now.set(timer.due);
            (timer.callback)();
        }
        self.inner.now.set(target);
    }

    pub fn advance_minutes(&self, minutes: u64) {
        self.advance(Duration::from_secs(minutes * 60));
    }
}

impl Scheduler for VirtualClock {
    type Handle = TimerHandle;

    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let due = self.now() + delay;
        self.inner.timers.borrow_mut().push(PendingTimer { id, due, callback });
        TimerHandle { clock: Rc::downgrade(&self.inner), id }
    }
}

// =============================================================================
// ACTIVITY SOURCE
// =============================================================================

#[derive(Default)]
struct ActivityInner {
    callback: RefCell<Option<Rc<dyn Fn()>>>,
    attached: Cell<usize>,
    attach_calls: Cell<usize>,
}

/// Stand-in for the document's event listeners.
#[derive(Clone, Default)]
pub struct FakeActivity {
    inner: Rc<ActivityInner>,
}

pub struct FakeListeners {
    source: Weak<ActivityInner>,
}

impl Drop for FakeListeners {
    fn drop(&mut self) {
        if let Some(source) = self.source.upgrade() {
            source.attached.set(source.attached.get() - 1);
            source.callback.borrow_mut().take();
        }
    }
}

impl FakeActivity {
    /// Number of listener sets currently attached.
    pub fn attached(&self) -> usize {
        self.inner.attached.get()
    }

    pub fn attach_calls(&self) -> usize {
        self.inner.attach_calls.get()
    }

    /// Dispatch one signal. Returns false when nothing is listening.
    pub fn emit(&self) -> bool {
        let callback = self.inner.callback.borrow().clone();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl ActivitySource for FakeActivity {
    type Listeners = FakeListeners;

    fn attach(&self, on_activity: Rc<dyn Fn()>) -> FakeListeners {
        self.inner.attached.set(self.inner.attached.get() + 1);
        self.inner.attach_calls.set(self.inner.attach_calls.get() + 1);
        *self.inner.callback.borrow_mut() = Some(on_activity);
        FakeListeners { source: Rc::downgrade(&self.inner) }
    }
}
