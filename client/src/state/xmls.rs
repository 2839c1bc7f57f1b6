//! Downloaded invoice list: query building and row shaping.

#[cfg(test)]
#[path = "xmls_test.rs"]
mod xmls_test;

use crate::net::gateway::XmlQuery;
use crate::net::types::{Company, XmlRecord};

/// Rows fetched per refresh, newest first.
pub const XML_PAGE_LIMIT: u32 = 100;

/// Shown when an invoice's CNPJ has no registered company.
pub const UNREGISTERED_COMPANY: &str = "Company not registered";

#[derive(Clone, Debug, PartialEq)]
pub struct XmlRow {
    pub id: String,
    pub cnpj: String,
    pub access_key: String,
    pub company: String,
    pub amount: f64,
}

/// Query for the selected CNPJs; none selected means all companies.
#[must_use]
pub fn xml_query(selected: &[String]) -> XmlQuery {
    XmlQuery { cnpjs: selected.to_vec(), limit: XML_PAGE_LIMIT }
}

/// Add `cnpj` to the selection, or remove it if already selected.
pub fn toggle_selection(selected: &mut Vec<String>, cnpj: &str) {
    if let Some(pos) = selected.iter().position(|c| c == cnpj) {
        selected.remove(pos);
    } else {
        selected.push(cnpj.to_owned());
    }
}

/// Attach company names; keeps the server's order.
#[must_use]
pub fn xml_rows(xmls: Vec<XmlRecord>, companies: &[Company]) -> Vec<XmlRow> {
    xmls.into_iter()
        .map(|xml| {
            let company = companies
                .iter()
                .find(|c| c.cnpj == xml.cnpj)
                .map_or_else(|| UNREGISTERED_COMPANY.to_owned(), |c| c.legal_name.clone());
            XmlRow { id: xml.id, cnpj: xml.cnpj, access_key: xml.access_key, company, amount: xml.amount }
        })
        .collect()
}

#[must_use]
pub fn rows_total(rows: &[XmlRow]) -> f64 {
    rows.iter().map(|r| r.amount).sum()
}
