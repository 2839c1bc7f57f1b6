//! Headline counts for the landing dashboard.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::net::gateway::{RecordError, RecordGateway, XmlQuery};
use crate::net::types::{Company, Session, XmlRecord};

/// Companies shown in the invoice-value ranking.
pub const TOP_COMPANY_COUNT: usize = 5;

/// Newest invoices summed for the ranking.
pub const DASHBOARD_XML_SAMPLE: u32 = 1000;

#[derive(Clone, Debug, PartialEq)]
pub struct CompanyTotal {
    pub cnpj: String,
    /// `None` when the CNPJ is not a registered company.
    pub legal_name: Option<String>,
    pub total: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardStats {
    pub total_xmls: u64,
    pub total_companies: usize,
    pub valid_certificates: usize,
    pub expired_certificates: usize,
    pub top_companies: Vec<CompanyTotal>,
}

/// Sum invoice values per CNPJ and keep the `limit` largest. Ties break by
/// CNPJ so the order is stable.
#[must_use]
pub fn top_companies(xmls: &[XmlRecord], companies: &[Company], limit: usize) -> Vec<CompanyTotal> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for xml in xmls {
        *totals.entry(xml.cnpj.as_str()).or_default() += xml.amount;
    }

    let mut ranked: Vec<CompanyTotal> = totals
        .into_iter()
        .map(|(cnpj, total)| CompanyTotal {
            cnpj: cnpj.to_owned(),
            legal_name: companies.iter().find(|c| c.cnpj == cnpj).map(|c| c.legal_name.clone()),
            total,
        })
        .collect();
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.cnpj.cmp(&b.cnpj)));
    ranked.truncate(limit);
    ranked
}

#[must_use]
pub fn summarize(total_xmls: u64, companies: &[Company], xmls: &[XmlRecord], now: OffsetDateTime) -> DashboardStats {
    let expired = companies.iter().filter(|c| c.certificate_expired(now)).count();
    DashboardStats {
        total_xmls,
        total_companies: companies.len(),
        valid_certificates: companies.len() - expired,
        expired_certificates: expired,
        top_companies: top_companies(xmls, companies, TOP_COMPANY_COUNT),
    }
}

/// Fetch everything the dashboard shows.
///
/// # Errors
///
/// The first [`RecordError`] from the gateway.
pub async fn load_dashboard(
    gateway: &dyn RecordGateway,
    session: &Session,
    now: OffsetDateTime,
) -> Result<DashboardStats, RecordError> {
    let total_xmls = gateway.count_xmls(session).await?;
    let companies = gateway.list_companies(session).await?;
    let sample = gateway
        .list_xmls(session, &XmlQuery { cnpjs: Vec::new(), limit: DASHBOARD_XML_SAMPLE })
        .await?;
    Ok(summarize(total_xmls, &companies, &sample, now))
}
