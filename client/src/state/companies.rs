//! Company registry: form rules, list filtering and the save workflow.
//!
//! A company is created with its CNPJ and a `.pfx` certificate; the CNPJ is
//! fixed afterwards. Uploading a certificate (on create or edit) restamps its
//! validity one year out from the upload.

#[cfg(test)]
#[path = "companies_test.rs"]
mod companies_test;

use std::path::Path;

use time::OffsetDateTime;

use crate::net::gateway::{RecordError, RecordGateway};
use crate::net::types::{CertificateUpload, Company, CompanyChanges, ParseDate, Session};

pub const CERTIFICATE_EXTENSION: &str = "pfx";

/// Validity assigned to a freshly uploaded certificate.
pub const CERTIFICATE_LIFETIME: time::Duration = time::Duration::days(365);

/// Raw values of the add/edit company form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanyForm {
    pub cnpj: String,
    pub legal_name: String,
    pub certificate_password: String,
    pub certificate: Option<CertificateUpload>,
}

impl CompanyForm {
    /// Form prefilled for editing. Secrets are never echoed back.
    #[must_use]
    pub fn editing(company: &Company) -> Self {
        Self { cnpj: company.cnpj.clone(), legal_name: company.legal_name.clone(), ..Self::default() }
    }
}

/// Validated form, ready for [`submit_company`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompanySubmission {
    pub changes: CompanyChanges,
    pub certificate: Option<CertificateUpload>,
}

/// Validity for an uploaded certificate file.
///
/// # Errors
///
/// Rejects files without a `.pfx` extension.
pub fn certificate_validity(file_name: &str, now: OffsetDateTime) -> Result<OffsetDateTime, &'static str> {
    let is_pfx = Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CERTIFICATE_EXTENSION));
    if !is_pfx {
        return Err("Invalid certificate format. It must be a .pfx file.");
    }
    Ok(now + CERTIFICATE_LIFETIME)
}

/// Validate the form into the changes to write.
///
/// # Errors
///
/// Returns the message to show next to the form.
pub fn prepare_company(
    form: &CompanyForm,
    editing: bool,
    now: OffsetDateTime,
) -> Result<CompanySubmission, &'static str> {
    let cnpj = form.cnpj.trim();
    let mut changes = CompanyChanges::default();
    if !editing {
        if cnpj.is_empty() {
            return Err("CNPJ is required.");
        }
        if form.certificate.is_none() {
            return Err("A certificate file is required.");
        }
        changes.cnpj = Some(cnpj.to_owned());
    }

    if let Some(upload) = &form.certificate {
        changes.certificate_validity = Some(ParseDate { iso: certificate_validity(&upload.file_name, now)? });
    }
    let legal_name = form.legal_name.trim();
    if !legal_name.is_empty() {
        changes.legal_name = Some(legal_name.to_owned());
    }
    if !form.certificate_password.is_empty() {
        changes.certificate_password = Some(form.certificate_password.clone());
    }

    if changes == CompanyChanges::default() {
        return Err("Nothing to change.");
    }
    Ok(CompanySubmission { changes, certificate: form.certificate.clone() })
}

/// Companies whose CNPJ contains `cnpj_filter` (case-insensitive), optionally
/// only those with an expired certificate.
#[must_use]
pub fn filter_companies(companies: &[Company], cnpj_filter: &str, only_expired: bool, now: OffsetDateTime) -> Vec<Company> {
    let needle = cnpj_filter.trim().to_lowercase();
    companies
        .iter()
        .filter(|c| needle.is_empty() || c.cnpj.to_lowercase().contains(&needle))
        .filter(|c| !only_expired || c.certificate_expired(now))
        .cloned()
        .collect()
}

/// Upload the certificate (if any), then create or update the company.
/// Returns the company id. Nothing is written if the upload fails.
///
/// # Errors
///
/// The first [`RecordError`] from the gateway.
pub async fn submit_company(
    gateway: &dyn RecordGateway,
    session: &Session,
    editing_id: Option<&str>,
    submission: CompanySubmission,
) -> Result<String, RecordError> {
    let mut changes = submission.changes;
    if let Some(upload) = &submission.certificate {
        changes.certificate_file = Some(gateway.upload_file(session, upload).await?);
    }
    let id = gateway.save_company(session, editing_id, &changes).await?;
    log::info!("company {id} saved");
    Ok(id)
}
