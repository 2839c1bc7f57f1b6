//! Wire DTOs for the Parse REST boundary.
//!
//! DESIGN
//! ======
//! Field names follow Parse's camelCase JSON so responses deserialize
//! directly. Records carry the backend's Portuguese column names
//! (`razaoSocial`, `chavenfe`, `valornf`) on the wire and English names in
//! Rust. Typed values (dates, files, pointers) use Parse's `__type` envelope.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// The authenticated actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// User record id.
    #[serde(rename = "objectId")]
    pub id: String,
    /// Display name; also the login identifier.
    pub username: String,
    /// Opaque token presented on every authenticated request.
    #[serde(rename = "sessionToken")]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Body returned by `POST /users`. Parse echoes neither username nor email.
#[derive(Clone, Debug, Deserialize)]
pub struct SignupResponse {
    #[serde(rename = "objectId")]
    pub id: String,
    #[serde(rename = "sessionToken")]
    pub token: String,
}

impl SignupResponse {
    /// Combine the signup echo with the identifier the user chose.
    #[must_use]
    pub fn into_session(self, username: &str) -> Session {
        Session { id: self.id, username: username.to_owned(), token: self.token, email: None }
    }
}

/// `GET /users/me` omits the token, so it is re-attached from storage.
#[derive(Clone, Debug, Deserialize)]
pub struct CurrentUser {
    #[serde(rename = "objectId")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl CurrentUser {
    #[must_use]
    pub fn into_session(self, token: String) -> Session {
        Session { id: self.id, username: self.username, token, email: self.email }
    }
}

/// Parse's error envelope: `{"code": 101, "error": "Invalid username/password."}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ParseErrorBody {
    pub code: i64,
    #[serde(default)]
    pub error: String,
}

// =============================================================================
// TYPED VALUES
// =============================================================================

/// `{"__type": "Date", "iso": "2025-01-31T12:00:00.000Z"}`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "__type", rename = "Date")]
pub struct ParseDate {
    #[serde(with = "time::serde::rfc3339")]
    pub iso: OffsetDateTime,
}

/// Reference to an uploaded file. Writes only need `name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "__type", rename = "File")]
pub struct ParseFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Body returned by `POST /files/<name>`; carries no `__type`.
#[derive(Clone, Debug, Deserialize)]
pub struct FileUploadResponse {
    pub name: String,
    pub url: String,
}

impl From<FileUploadResponse> for ParseFile {
    fn from(resp: FileUploadResponse) -> Self {
        Self { name: resp.name, url: Some(resp.url) }
    }
}

/// Pointer to another object, used to scope records to their owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "__type", rename = "Pointer")]
pub struct Pointer {
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "objectId")]
    pub object_id: String,
}

impl Pointer {
    #[must_use]
    pub fn user(id: &str) -> Self {
        Self { class_name: "_User".to_owned(), object_id: id.to_owned() }
    }
}

/// `GET /classes/<name>` envelope. `count` is present only when requested.
#[derive(Clone, Debug, Deserialize)]
pub struct QueryResults<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub count: Option<u64>,
}

// =============================================================================
// RECORDS
// =============================================================================

/// An issuing company whose invoices are harvested with its certificate.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Company {
    #[serde(rename = "objectId")]
    pub id: String,
    #[serde(default)]
    pub cnpj: String,
    #[serde(rename = "razaoSocial", default)]
    pub legal_name: String,
    #[serde(rename = "certificateValidity", default)]
    pub certificate_validity: Option<ParseDate>,
}

impl Company {
    /// A certificate is valid only while its validity lies strictly in the
    /// future. A company without one counts as expired.
    #[must_use]
    pub fn certificate_expired(&self, now: OffsetDateTime) -> bool {
        self.certificate_validity.is_none_or(|v| v.iso <= now)
    }
}

/// Field changes for creating or editing a company. Unset fields are left
/// untouched on the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CompanyChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
    #[serde(rename = "razaoSocial", skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
    #[serde(rename = "certificatePassword", skip_serializing_if = "Option::is_none")]
    pub certificate_password: Option<String>,
    #[serde(rename = "certificateValidity", skip_serializing_if = "Option::is_none")]
    pub certificate_validity: Option<ParseDate>,
    #[serde(rename = "certificateFile", skip_serializing_if = "Option::is_none")]
    pub certificate_file: Option<ParseFile>,
}

/// Raw certificate bytes picked by the user, before upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One harvested invoice XML (`xmlssaida` class).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct XmlRecord {
    #[serde(rename = "objectId")]
    pub id: String,
    #[serde(default)]
    pub cnpj: String,
    /// 44-digit NF-e access key.
    #[serde(rename = "chavenfe", default)]
    pub access_key: String,
    /// Invoice total in BRL. Stored as text by the harvester.
    #[serde(rename = "valornf", default, deserialize_with = "lenient_amount")]
    pub amount: f64,
}

/// Accept numbers, numeric strings, or anything else as zero.
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let amount = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if amount.is_finite() { amount } else { 0.0 })
}

// =============================================================================
// PROFILE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasswordChange {
    /// Re-verified before the new password is written.
    pub current: String,
    pub new: String,
}

/// Edits to the signed-in user's own record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub password: Option<PasswordChange>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}
