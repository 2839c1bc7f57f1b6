//! Parse Server REST backend for [`PersistenceGateway`] and [`RecordGateway`].
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`, with the session
//! token persisted in `localStorage` so a reload can resume it.
//! Server-side (SSR): stubs. Session resume, sign-in and record access only
//! happen in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Parse answers failures with `{"code": n, "error": "..."}`. Codes 101 and
//! 202 become typed errors and 209 marks a dead session token. Anything else
//! (transport errors included) is reported as a network failure.
//!
//! TOKEN OWNERSHIP
//! ===============
//! The in-memory token is the one later requests and logout will use. A
//! resume adopts the stored token up front so a logout racing it still
//! revokes it, and it never writes back a token that a login or logout has
//! replaced meanwhile.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "parse_test.rs"]
mod parse_test;

use std::cell::RefCell;

use async_trait::async_trait;

use super::gateway::{
    AuthError, LogoutInvalidationError, PersistenceGateway, ProfileError, RecordError, RecordGateway, ResumeError,
    XmlQuery,
};
use super::types::{
    CertificateUpload, Company, CompanyChanges, ParseErrorBody, ParseFile, Pointer, ProfileUpdate, Session, XmlRecord,
};
use crate::config::{ConfigError, GatewayConfig};

/// Parse error code for a bad username/password pair or a missing object.
pub const OBJECT_NOT_FOUND: i64 = 101;
/// Parse error code for a username that already exists.
pub const USERNAME_TAKEN: i64 = 202;
/// Parse error code for an expired or revoked session token.
pub const INVALID_SESSION_TOKEN: i64 = 209;

/// Upper bound for the company list; the console never pages companies.
pub const COMPANY_LIST_LIMIT: u32 = 1000;

/// `localStorage` key holding the session token for one Parse application.
#[must_use]
pub fn storage_key(app_id: &str) -> String {
    format!("nfhub/{app_id}/session-token")
}

/// Headers attached to every request, plus the session token when present.
#[must_use]
pub fn request_headers(config: &GatewayConfig, token: Option<&str>) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        ("X-Parse-Application-Id", config.app_id.clone()),
        ("X-Parse-JavaScript-Key", config.javascript_key.clone()),
        ("X-Parse-Revocable-Session", "1".to_owned()),
    ];
    if let Some(token) = token {
        headers.push(("X-Parse-Session-Token", token.to_owned()));
    }
    headers
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

fn describe(status: u16, body: Option<ParseErrorBody>) -> String {
    match body {
        Some(ParseErrorBody { code, error }) => format!("{status} (code {code}): {error}"),
        None => format!("request failed: {status}"),
    }
}

/// Map a failed login/signup response to an [`AuthError`].
#[must_use]
pub fn auth_error_from(status: u16, body: Option<ParseErrorBody>) -> AuthError {
    match body {
        Some(ParseErrorBody { code: OBJECT_NOT_FOUND, .. }) => AuthError::InvalidCredentials,
        Some(ParseErrorBody { code: USERNAME_TAKEN, .. }) => AuthError::DuplicateIdentifier,
        other => AuthError::Network(describe(status, other)),
    }
}

/// Map a failed `GET /users/me` response to a [`ResumeError`].
#[must_use]
pub fn resume_error_from(status: u16, body: Option<ParseErrorBody>) -> ResumeError {
    match body {
        Some(ParseErrorBody { code: INVALID_SESSION_TOKEN, error }) => ResumeError::Rejected(error),
        other => ResumeError::Network(describe(status, other)),
    }
}

/// Map a failed `POST /verifyPassword` response.
#[must_use]
pub fn verify_error_from(status: u16, body: Option<ParseErrorBody>) -> ProfileError {
    match body {
        Some(ParseErrorBody { code: OBJECT_NOT_FOUND, .. }) => ProfileError::WrongCurrentPassword,
        Some(ParseErrorBody { code: INVALID_SESSION_TOKEN, .. }) => ProfileError::SessionExpired,
        other => ProfileError::Network(describe(status, other)),
    }
}

/// Map a failed `PUT /users/<id>` response.
#[must_use]
pub fn profile_error_from(status: u16, body: Option<ParseErrorBody>) -> ProfileError {
    match body {
        Some(ParseErrorBody { code: USERNAME_TAKEN, .. }) => ProfileError::DuplicateIdentifier,
        Some(ParseErrorBody { code: INVALID_SESSION_TOKEN, .. }) => ProfileError::SessionExpired,
        other => ProfileError::Network(describe(status, other)),
    }
}

/// Map a failed `/classes` or `/files` response.
#[must_use]
pub fn record_error_from(status: u16, body: Option<ParseErrorBody>) -> RecordError {
    match body {
        Some(ParseErrorBody { code: OBJECT_NOT_FOUND, .. }) => RecordError::NotFound,
        Some(ParseErrorBody { code: INVALID_SESSION_TOKEN, .. }) => RecordError::SessionExpired,
        other => RecordError::Network(describe(status, other)),
    }
}

// =============================================================================
// REQUEST SHAPES
// =============================================================================

/// `where` clause matching records owned by `session`'s user.
#[must_use]
pub fn owner_where(session: &Session) -> serde_json::Value {
    serde_json::json!({ "user": Pointer::user(&session.id) })
}

#[must_use]
pub fn company_list_params(session: &Session) -> Vec<(&'static str, String)> {
    vec![
        ("where", owner_where(session).to_string()),
        ("limit", COMPANY_LIST_LIMIT.to_string()),
        ("order", "cnpj".to_owned()),
    ]
}

/// Create body: the changes plus the owning user pointer.
#[must_use]
pub fn company_create_body(session: &Session, changes: &CompanyChanges) -> serde_json::Value {
    let mut body = serde_json::to_value(changes).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(fields) = body.as_object_mut() {
        fields.insert("user".to_owned(), serde_json::json!(Pointer::user(&session.id)));
    }
    body
}

#[must_use]
pub fn xml_query_params(session: &Session, query: &XmlQuery) -> Vec<(&'static str, String)> {
    let mut filter = owner_where(session);
    if !query.cnpjs.is_empty() {
        filter["cnpj"] = serde_json::json!({ "$in": query.cnpjs });
    }
    vec![
        ("where", filter.to_string()),
        ("limit", query.limit.to_string()),
        ("order", "-createdAt".to_owned()),
    ]
}

#[must_use]
pub fn xml_count_params(session: &Session) -> Vec<(&'static str, String)> {
    vec![("where", owner_where(session).to_string()), ("count", "1".to_owned()), ("limit", "0".to_owned())]
}

/// Fields written by `PUT /users/<id>`.
#[must_use]
pub fn user_update_body(update: &ProfileUpdate) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    if let Some(username) = &update.username {
        body.insert("username".to_owned(), serde_json::json!(username));
    }
    if let Some(change) = &update.password {
        body.insert("password".to_owned(), serde_json::json!(change.new));
    }
    serde_json::Value::Object(body)
}

/// Parse file names allow ASCII letters, digits, `.`, `_` and `-`.
#[must_use]
pub fn upload_path(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    format!("/files/{safe}")
}

// =============================================================================
// GATEWAY
// =============================================================================

/// Gateway backed by a Parse Server REST endpoint.
pub struct ParseGateway {
    config: Result<GatewayConfig, ConfigError>,
    token: RefCell<Option<String>>,
}

impl ParseGateway {
    /// Build from a config result. A config error is kept and reported on
    /// every call instead of failing construction.
    #[must_use]
    pub fn new(config: Result<GatewayConfig, ConfigError>) -> Self {
        if let Err(e) = &config {
            log::error!("parse gateway disabled: {e}");
        }
        Self { config, token: RefCell::new(None) }
    }

    /// Gateway configured from build-time environment.
    #[must_use]
    pub fn from_build_env() -> Self {
        Self::new(GatewayConfig::from_build_env())
    }

    #[cfg(any(test, feature = "hydrate"))]
    fn config(&self) -> Result<&GatewayConfig, String> {
        self.config.as_ref().map_err(ToString::to_string)
    }

    /// Remember the live token in memory and in browser storage.
    #[cfg(any(test, feature = "hydrate"))]
    fn remember(&self, token: &str) {
        *self.token.borrow_mut() = Some(token.to_owned());
        #[cfg(feature = "hydrate")]
        {
            if let Ok(config) = self.config() {
                storage::write(&storage_key(&config.app_id), token);
            }
        }
    }

    /// Make a stored token the live one before it is verified, so a logout
    /// issued while the check is pending finds and revokes it.
    #[cfg(any(test, feature = "hydrate"))]
    fn adopt(&self, token: &str) {
        *self.token.borrow_mut() = Some(token.to_owned());
    }

    /// Whether `token` is still the live token.
    #[cfg(any(test, feature = "hydrate"))]
    fn holds(&self, token: &str) -> bool {
        self.token.borrow().as_deref() == Some(token)
    }

    /// Drop the token everywhere and return what was held in memory.
    fn forget(&self) -> Option<String> {
        let token = self.token.borrow_mut().take();
        #[cfg(feature = "hydrate")]
        {
            if let Ok(config) = self.config() {
                storage::remove(&storage_key(&config.app_id));
            }
        }
        token
    }

    #[cfg(any(test, feature = "hydrate"))]
    fn stored_token(&self) -> Option<String> {
        if let Some(token) = self.token.borrow().clone() {
            return Some(token);
        }
        #[cfg(feature = "hydrate")]
        {
            let config = self.config().ok()?;
            storage::read(&storage_key(&config.app_id))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            None
        }
    }
}

#[cfg(feature = "hydrate")]
mod storage {
    fn local() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }

    pub(super) fn read(key: &str) -> Option<String> {
        local()?.get_item(key).ok().flatten()
    }

    pub(super) fn write(key: &str, value: &str) {
        if let Some(storage) = local() {
            let _ = storage.set_item(key, value);
        }
    }

    pub(super) fn remove(key: &str) {
        if let Some(storage) = local() {
            let _ = storage.remove_item(key);
        }
    }
}

#[cfg(feature = "hydrate")]
mod http {
    use gloo_net::http::{Request, RequestBuilder};
    use serde::de::DeserializeOwned;

    use super::{ParseErrorBody, request_headers};
    use crate::config::GatewayConfig;

    /// Why a request produced no usable body.
    pub(super) enum Failure {
        Transport(String),
        Status(u16, Option<ParseErrorBody>),
    }

    impl Failure {
        pub(super) fn map<E>(self, network: impl FnOnce(String) -> E, status: impl FnOnce(u16, Option<ParseErrorBody>) -> E) -> E {
            match self {
                Self::Transport(msg) => network(msg),
                Self::Status(code, body) => status(code, body),
            }
        }
    }

    pub(super) fn with_headers(mut builder: RequestBuilder, config: &GatewayConfig, token: Option<&str>) -> RequestBuilder {
        for (name, value) in request_headers(config, token) {
            builder = builder.header(name, &value);
        }
        builder
    }

    pub(super) fn with_query(builder: RequestBuilder, params: &[(&'static str, String)]) -> RequestBuilder {
        builder.query(params.iter().map(|(name, value)| (*name, value.as_str())))
    }

    /// Send and decode a JSON response, or report why not.
    pub(super) async fn send<T: DeserializeOwned>(request: Result<Request, gloo_net::Error>) -> Result<T, Failure> {
        let resp = request
            .map_err(|e| Failure::Transport(e.to_string()))?
            .send()
            .await
            .map_err(|e| Failure::Transport(e.to_string()))?;
        if !resp.ok() {
            let status = resp.status();
            return Err(Failure::Status(status, resp.json::<ParseErrorBody>().await.ok()));
        }
        resp.json::<T>().await.map_err(|e| Failure::Transport(e.to_string()))
    }
}

#[async_trait(?Send)]
impl PersistenceGateway for ParseGateway {
    async fn resume_session(&self) -> Result<Option<Session>, ResumeError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let config = self.config().map_err(ResumeError::Network)?;
            let Some(token) = self.stored_token() else {
                return Ok(None);
            };
            self.adopt(&token);
            let request = http::with_headers(Request::get(&config.endpoint("/users/me")), config, Some(&token)).build();
            let me: super::types::CurrentUser = match http::send(request).await {
                Ok(me) => me,
                Err(failure) => {
                    let err = failure.map(ResumeError::Network, resume_error_from);
                    if matches!(err, ResumeError::Rejected(_)) && self.holds(&token) {
                        self.forget();
                    }
                    return Err(err);
                }
            };
            if !self.holds(&token) {
                log::debug!("session token replaced while resuming; leaving it in place");
            }
            Ok(Some(me.into_session(token)))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Ok(None)
        }
    }

    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let config = self.config().map_err(AuthError::Network)?;
            let payload = serde_json::json!({ "username": identifier, "password": secret });
            let request = http::with_headers(Request::post(&config.endpoint("/login")), config, None).json(&payload);
            let session: Session = http::send(request).await.map_err(|f| f.map(AuthError::Network, auth_error_from))?;
            self.remember(&session.token);
            Ok(session)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (identifier, secret);
            Err(AuthError::Network("not available on server".to_owned()))
        }
    }

    async fn create_account(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let config = self.config().map_err(AuthError::Network)?;
            let payload = serde_json::json!({ "username": identifier, "password": secret });
            let request = http::with_headers(Request::post(&config.endpoint("/users")), config, None).json(&payload);
            let signup: super::types::SignupResponse =
                http::send(request).await.map_err(|f| f.map(AuthError::Network, auth_error_from))?;
            let session = signup.into_session(identifier);
            self.remember(&session.token);
            Ok(session)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (identifier, secret);
            Err(AuthError::Network("not available on server".to_owned()))
        }
    }

    async fn invalidate_session(&self) -> Result<(), LogoutInvalidationError> {
        // Forget first so local state is gone even if the request never lands.
        let token = self.forget();
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let Some(token) = token else {
                return Ok(());
            };
            let config = self.config().map_err(LogoutInvalidationError)?;
            let request = http::with_headers(Request::post(&config.endpoint("/logout")), config, Some(&token)).build();
            http::send::<serde_json::Value>(request)
                .await
                .map_err(|f| f.map(LogoutInvalidationError, |status, _| LogoutInvalidationError(format!("logout failed: {status}"))))?;
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = token;
            Ok(())
        }
    }

    async fn update_profile(&self, session: &Session, update: &ProfileUpdate) -> Result<Session, ProfileError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let config = self.config().map_err(ProfileError::Network)?;
            if let Some(change) = &update.password {
                let payload = serde_json::json!({ "username": session.username, "password": change.current });
                let request = http::with_headers(Request::post(&config.endpoint("/verifyPassword")), config, Some(&session.token))
                    .json(&payload);
                http::send::<serde_json::Value>(request)
                    .await
                    .map_err(|f| f.map(ProfileError::Network, verify_error_from))?;
            }
            let path = format!("/users/{}", session.id);
            let request = http::with_headers(Request::put(&config.endpoint(&path)), config, Some(&session.token))
                .json(&user_update_body(update));
            http::send::<serde_json::Value>(request)
                .await
                .map_err(|f| f.map(ProfileError::Network, profile_error_from))?;

            let mut updated = session.clone();
            if let Some(username) = &update.username {
                updated.username.clone_from(username);
            }
            Ok(updated)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, update);
            Err(ProfileError::Network("not available on server".to_owned()))
        }
    }
}

#[async_trait(?Send)]
impl RecordGateway for ParseGateway {
    async fn list_companies(&self, session: &Session) -> Result<Vec<Company>, RecordError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let config = self.config().map_err(RecordError::Network)?;
            let builder = http::with_headers(Request::get(&config.endpoint("/classes/Company")), config, Some(&session.token));
            let request = http::with_query(builder, &company_list_params(session)).build();
            let page: super::types::QueryResults<Company> =
                http::send(request).await.map_err(|f| f.map(RecordError::Network, record_error_from))?;
            Ok(page.results)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = session;
            Ok(Vec::new())
        }
    }

    async fn save_company(
        &self,
        session: &Session,
        id: Option<&str>,
        changes: &CompanyChanges,
    ) -> Result<String, RecordError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            #[derive(serde::Deserialize)]
            struct Created {
                #[serde(rename = "objectId")]
                id: String,
            }

            let config = self.config().map_err(RecordError::Network)?;
            match id {
                Some(id) => {
                    let path = format!("/classes/Company/{id}");
                    let request =
                        http::with_headers(Request::put(&config.endpoint(&path)), config, Some(&session.token)).json(changes);
                    http::send::<serde_json::Value>(request)
                        .await
                        .map_err(|f| f.map(RecordError::Network, record_error_from))?;
                    Ok(id.to_owned())
                }
                None => {
                    let request = http::with_headers(Request::post(&config.endpoint("/classes/Company")), config, Some(&session.token))
                        .json(&company_create_body(session, changes));
                    let created: Created =
                        http::send(request).await.map_err(|f| f.map(RecordError::Network, record_error_from))?;
                    Ok(created.id)
                }
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, id, changes);
            Err(RecordError::Network("not available on server".to_owned()))
        }
    }

    async fn delete_company(&self, session: &Session, id: &str) -> Result<(), RecordError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let config = self.config().map_err(RecordError::Network)?;
            let path = format!("/classes/Company/{id}");
            let request = http::with_headers(Request::delete(&config.endpoint(&path)), config, Some(&session.token)).build();
            http::send::<serde_json::Value>(request)
                .await
                .map_err(|f| f.map(RecordError::Network, record_error_from))?;
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, id);
            Err(RecordError::Network("not available on server".to_owned()))
        }
    }

    async fn upload_file(&self, session: &Session, upload: &CertificateUpload) -> Result<ParseFile, RecordError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let config = self.config().map_err(RecordError::Network)?;
            let request = http::with_headers(
                Request::post(&config.endpoint(&upload_path(&upload.file_name))),
                config,
                Some(&session.token),
            )
            .header("Content-Type", "application/octet-stream")
            .body(js_sys::Uint8Array::from(upload.bytes.as_slice()));
            let stored: super::types::FileUploadResponse =
                http::send(request).await.map_err(|f| f.map(RecordError::Network, record_error_from))?;
            Ok(stored.into())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, upload);
            Err(RecordError::Network("not available on server".to_owned()))
        }
    }

    async fn list_xmls(&self, session: &Session, query: &XmlQuery) -> Result<Vec<XmlRecord>, RecordError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let config = self.config().map_err(RecordError::Network)?;
            let builder = http::with_headers(Request::get(&config.endpoint("/classes/xmlssaida")), config, Some(&session.token));
            let request = http::with_query(builder, &xml_query_params(session, query)).build();
            let page: super::types::QueryResults<XmlRecord> =
                http::send(request).await.map_err(|f| f.map(RecordError::Network, record_error_from))?;
            Ok(page.results)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (session, query);
            Ok(Vec::new())
        }
    }

    async fn count_xmls(&self, session: &Session) -> Result<u64, RecordError> {
        #[cfg(feature = "hydrate")]
        {
            use gloo_net::http::Request;

            let config = self.config().map_err(RecordError::Network)?;
            let builder = http::with_headers(Request::get(&config.endpoint("/classes/xmlssaida")), config, Some(&session.token));
            let request = http::with_query(builder, &xml_count_params(session)).build();
            let page: super::types::QueryResults<serde_json::Value> =
                http::send(request).await.map_err(|f| f.map(RecordError::Network, record_error_from))?;
            Ok(page.count.unwrap_or(0))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = session;
            Ok(0)
        }
    }
}
