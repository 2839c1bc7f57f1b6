//! Capability interface onto the remote persistence service.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store depends only on [`PersistenceGateway`]; the record
//! screens depend only on [`RecordGateway`]. `ParseGateway` implements both
//! against one backend; tests substitute in-memory fakes.

use async_trait::async_trait;

use super::types::{CertificateUpload, Company, CompanyChanges, ParseFile, ProfileUpdate, Session, XmlRecord};

/// Failure of an explicit login or registration. Shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("that username is already taken")]
    DuplicateIdentifier,
    #[error("could not reach the server: {0}")]
    Network(String),
    #[error("another sign-in is already in progress")]
    InFlight,
}

/// Failure while resuming a persisted session at startup. Never shown.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResumeError {
    #[error("stored session rejected: {0}")]
    Rejected(String),
    #[error("session lookup failed: {0}")]
    Network(String),
}

/// Remote logout failed. Local state is cleared regardless.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("session invalidation failed: {0}")]
pub struct LogoutInvalidationError(pub String);

/// Failure while editing the signed-in user's profile. Shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("current password is incorrect")]
    WrongCurrentPassword,
    #[error("that username is already taken")]
    DuplicateIdentifier,
    #[error("not signed in")]
    NotSignedIn,
    #[error("your session has expired; sign in again")]
    SessionExpired,
    #[error("could not reach the server: {0}")]
    Network(String),
}

/// Failure of a record query or write. Shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record not found")]
    NotFound,
    #[error("your session has expired; sign in again")]
    SessionExpired,
    #[error("could not reach the server: {0}")]
    Network(String),
}

#[async_trait(?Send)]
pub trait PersistenceGateway {
    /// Look up a previously persisted session, if any.
    async fn resume_session(&self) -> Result<Option<Session>, ResumeError>;

    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Session, AuthError>;

    async fn create_account(&self, identifier: &str, secret: &str) -> Result<Session, AuthError>;

    /// Best-effort remote logout of the current session.
    async fn invalidate_session(&self) -> Result<(), LogoutInvalidationError>;

    /// Apply `update` to `session`'s user and return the refreshed session.
    /// A password change re-verifies `update.password.current` first.
    async fn update_profile(&self, session: &Session, update: &ProfileUpdate) -> Result<Session, ProfileError>;
}

/// Record storage scoped to the signed-in user.
#[async_trait(?Send)]
pub trait RecordGateway {
    async fn list_companies(&self, session: &Session) -> Result<Vec<Company>, RecordError>;

    /// Create (`id == None`) or update a company; returns its id.
    async fn save_company(
        &self,
        session: &Session,
        id: Option<&str>,
        changes: &CompanyChanges,
    ) -> Result<String, RecordError>;

    async fn delete_company(&self, session: &Session, id: &str) -> Result<(), RecordError>;

    /// Store a file and return the reference to attach to a record.
    async fn upload_file(&self, session: &Session, upload: &CertificateUpload) -> Result<ParseFile, RecordError>;

    /// Newest first, at most `query.limit` rows.
    async fn list_xmls(&self, session: &Session, query: &XmlQuery) -> Result<Vec<XmlRecord>, RecordError>;

    async fn count_xmls(&self, session: &Session) -> Result<u64, RecordError>;
}

/// Filter for [`RecordGateway::list_xmls`]. An empty `cnpjs` means every company.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlQuery {
    pub cnpjs: Vec<String>,
    pub limit: u32,
}
