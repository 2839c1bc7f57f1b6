use futures::executor::block_on;
use time::macros::datetime;

use super::*;
use crate::testing::{FakeRecords, company, session, xml};

const NOW: OffsetDateTime = datetime!(2025-03-10 12:00 UTC);

#[test]
fn top_companies_sums_per_cnpj_and_ranks_descending() {
    let xmls = vec![xml("1", "A", 100.0), xml("2", "B", 250.0), xml("3", "A", 200.0), xml("4", "C", 10.0)];
    let companies = vec![company("ca", "A", "Alpha", None)];

    let ranked = top_companies(&xmls, &companies, 2);

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0], CompanyTotal { cnpj: "A".to_owned(), legal_name: Some("Alpha".to_owned()), total: 300.0 });
    assert_eq!(ranked[1].cnpj, "B");
    assert_eq!(ranked[1].legal_name, None);
}

#[test]
fn top_companies_ties_break_by_cnpj() {
    let xmls = vec![xml("1", "Z", 5.0), xml("2", "M", 5.0), xml("3", "A", 5.0)];
    let cnpjs: Vec<String> = top_companies(&xmls, &[], 5).into_iter().map(|t| t.cnpj).collect();
    assert_eq!(cnpjs, vec!["A", "M", "Z"]);
}

#[test]
fn top_companies_of_nothing_is_empty() {
    assert!(top_companies(&[], &[], TOP_COMPANY_COUNT).is_empty());
}

#[test]
fn summarize_splits_certificates_by_expiry() {
    let companies = vec![
        company("a", "1", "A", Some(datetime!(2026-01-01 0:00 UTC))),
        company("b", "2", "B", Some(NOW)),
        company("c", "3", "C", None),
    ];
    let stats = summarize(42, &companies, &[], NOW);
    assert_eq!(stats.total_xmls, 42);
    assert_eq!(stats.total_companies, 3);
    assert_eq!(stats.valid_certificates, 1);
    assert_eq!(stats.expired_certificates, 2);
}

#[test]
fn summarize_keeps_five_companies() {
    let xmls: Vec<_> = (0_u32..8).map(|i| xml(&i.to_string(), &format!("cnpj{i}"), f64::from(i))).collect();
    let stats = summarize(8, &[], &xmls, NOW);
    assert_eq!(stats.top_companies.len(), TOP_COMPANY_COUNT);
    assert_eq!(stats.top_companies[0].cnpj, "cnpj7");
}

#[test]
fn load_dashboard_reads_counts_and_records() {
    let records = FakeRecords::new();
    records.companies.borrow_mut().push(company("a", "1", "A", Some(datetime!(2026-01-01 0:00 UTC))));
    records.xmls.borrow_mut().extend([xml("x1", "1", 10.0), xml("x2", "1", 15.5)]);

    let stats = block_on(load_dashboard(records.as_ref(), &session("alice"), NOW)).unwrap();

    assert_eq!(stats.total_xmls, 2);
    assert_eq!(stats.valid_certificates, 1);
    assert_eq!(stats.top_companies[0].total, 25.5);
}

#[test]
fn load_dashboard_surfaces_expired_session() {
    let records = FakeRecords::new();
    records.session_expired.set(true);
    let err = block_on(load_dashboard(records.as_ref(), &session("alice"), NOW)).unwrap_err();
    assert_eq!(err, RecordError::SessionExpired);
}
