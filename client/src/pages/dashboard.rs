//! Authenticated landing view.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is where login and registration land. It greets the user, states the
//! idle policy and shows headline counts; the company and XML screens hang
//! off the main menu.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::time::Duration;

use leptos::prelude::*;

use crate::components::session_provider::SessionHandle;
use crate::state::auth::AuthState;
use crate::state::dashboard::{CompanyTotal, DashboardStats};
use crate::state::idle::INACTIVITY_TIMEOUT;
use crate::state::xmls::UNREGISTERED_COMPANY;
use crate::util::format::format_brl;

/// Human phrasing of the inactivity ceiling.
pub(crate) fn idle_notice(timeout: Duration) -> String {
    let minutes = timeout.as_secs() / 60;
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    format!("For your security you will be signed out after {minutes} {unit} without activity.")
}

pub(crate) fn greeting(username: Option<&str>) -> String {
    match username {
        Some(name) if !name.is_empty() => format!("Welcome back, {name}."),
        _ => "Welcome back.".to_owned(),
    }
}

/// Label/value pairs for the stat cards, in display order.
pub(crate) fn stat_cards(stats: &DashboardStats) -> [(&'static str, String); 4] {
    [
        ("XMLs downloaded", stats.total_xmls.to_string()),
        ("Companies", stats.total_companies.to_string()),
        ("Valid certificates", stats.valid_certificates.to_string()),
        ("Expired certificates", stats.expired_certificates.to_string()),
    ]
}

fn company_label(total: &CompanyTotal) -> String {
    total.legal_name.clone().unwrap_or_else(|| UNREGISTERED_COMPANY.to_owned())
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionHandle>();
    let welcome = move || auth.with(|a| greeting(a.user.as_ref().map(|u| u.username.as_str())));

    let stats = RwSignal::new(None::<DashboardStats>);
    let info = RwSignal::new(String::new());

    #[cfg(feature = "hydrate")]
    {
        use crate::state::dashboard::load_dashboard;

        let user = Memo::new(move |_| auth.with(|a| a.user.clone()));
        Effect::new(move || {
            let Some(user) = user.get() else { return };
            let records = session.records();
            leptos::task::spawn_local(async move {
                match load_dashboard(records.as_ref(), &user, time::OffsetDateTime::now_utc()).await {
                    Ok(loaded) => {
                        info.set(String::new());
                        stats.set(Some(loaded));
                    }
                    Err(e) => super::report_record_error(session, &e, info),
                }
            });
        });
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = session;

    view! {
        <section class="dashboard-page">
            <h1 class="dashboard-page__title">"Dashboard"</h1>
            <p class="dashboard-page__welcome">{welcome}</p>
            <p class="dashboard-page__notice">{idle_notice(INACTIVITY_TIMEOUT)}</p>
            <Show when=move || !info.get().is_empty()>
                <p class="dashboard-page__error">{move || info.get()}</p>
            </Show>
            {move || {
                stats
                    .get()
                    .map(|stats| {
                        view! {
                            <div class="dashboard-page__cards">
                                {stat_cards(&stats)
                                    .into_iter()
                                    .map(|(label, value)| {
                                        view! {
                                            <div class="stat-card">
                                                <span class="stat-card__label">{label}</span>
                                                <span class="stat-card__value">{value}</span>
                                            </div>
                                        }
                                    })
                                    .collect_view()}
                            </div>
                            <h2 class="dashboard-page__subtitle">"Top companies by invoice value"</h2>
                            <table class="data-table">
                                <thead>
                                    <tr>
                                        <th>"Company"</th>
                                        <th>"CNPJ"</th>
                                        <th>"Total"</th>
                                    </tr>
                                </thead>
                                <tbody>
                                    {stats
                                        .top_companies
                                        .iter()
                                        .map(|total| {
                                            view! {
                                                <tr>
                                                    <td>{company_label(total)}</td>
                                                    <td>{total.cnpj.clone()}</td>
                                                    <td class="data-table__amount">{format_brl(total.total)}</td>
                                                </tr>
                                            }
                                        })
                                        .collect_view()}
                                </tbody>
                            </table>
                        }
                    })
            }}
        </section>
    }
}
