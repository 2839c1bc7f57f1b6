//! Downloaded invoice XMLs, filtered by issuing company.

#[cfg(test)]
#[path = "xmls_test.rs"]
mod xmls_test;

use leptos::prelude::*;

use crate::components::session_provider::SessionHandle;
use crate::net::types::{Company, XmlRecord};
use crate::state::auth::AuthState;
use crate::state::xmls::{rows_total, toggle_selection, xml_rows};
use crate::util::format::format_brl;

/// Summary of the company filter for the selector button.
pub(crate) fn selection_label(selected: &[String], companies: &[Company]) -> String {
    if selected.is_empty() {
        return "All companies".to_owned();
    }
    selected
        .iter()
        .map(|cnpj| {
            companies
                .iter()
                .find(|c| &c.cnpj == cnpj)
                .map_or_else(|| cnpj.clone(), |c| c.legal_name.clone())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[component]
pub fn XmlsPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionHandle>();

    let companies = RwSignal::new(Vec::<Company>::new());
    let selected = RwSignal::new(Vec::<String>::new());
    let xmls = RwSignal::new(Vec::<XmlRecord>::new());
    // Names follow the company list, whichever response lands first.
    let rows = Memo::new(move |_| companies.with(|list| xmls.with(|x| xml_rows(x.clone(), list))));
    let info = RwSignal::new(String::new());
    let loading = RwSignal::new(false);
    let refresh = RwSignal::new(0_u32);

    #[cfg(feature = "hydrate")]
    {
        use crate::state::xmls::xml_query;

        let user = Memo::new(move |_| auth.with(|a| a.user.clone()));
        Effect::new(move || {
            let Some(user) = user.get() else { return };
            let records = session.records();
            leptos::task::spawn_local(async move {
                match records.list_companies(&user).await {
                    Ok(list) => companies.set(list),
                    Err(e) => super::report_record_error(session, &e, info),
                }
            });
        });

        Effect::new(move || {
            refresh.track();
            let query = selected.with(|s| xml_query(s));
            let Some(user) = user.get() else { return };
            let records = session.records();
            loading.set(true);
            leptos::task::spawn_local(async move {
                match records.list_xmls(&user, &query).await {
                    Ok(fetched) => {
                        info.set(String::new());
                        xmls.set(fetched);
                    }
                    Err(e) => super::report_record_error(session, &e, info),
                }
                loading.set(false);
            });
        });
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = (auth, session);

    let label = move || companies.with(|list| selected.with(|s| selection_label(s, list)));

    view! {
        <section class="xmls-page">
            <h1 class="xmls-page__title">"Downloaded XMLs"</h1>
            <div class="xmls-page__filters">
                <details class="company-select">
                    <summary class="company-select__summary">{label}</summary>
                    {move || {
                        companies
                            .get()
                            .into_iter()
                            .map(|company| {
                                let cnpj = company.cnpj.clone();
                                let checked = {
                                    let cnpj = cnpj.clone();
                                    move || selected.with(|s| s.contains(&cnpj))
                                };
                                view! {
                                    <label class="company-select__option">
                                        <input
                                            type="checkbox"
                                            prop:checked=checked
                                            on:change=move |_| selected.update(|s| toggle_selection(s, &cnpj))
                                        />
                                        {company.legal_name}
                                    </label>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </details>
                <button
                    class="btn"
                    disabled=move || loading.get()
                    on:click=move |_| refresh.update(|n| *n += 1)
                >
                    "Refresh"
                </button>
            </div>
            <Show when=move || !info.get().is_empty()>
                <p class="xmls-page__message">{move || info.get()}</p>
            </Show>
            <table class="data-table">
                <thead>
                    <tr>
                        <th>"Access key"</th>
                        <th>"Company"</th>
                        <th>"CNPJ"</th>
                        <th>"Amount"</th>
                    </tr>
                </thead>
                <tbody>
                    {move || {
                        rows.get()
                            .into_iter()
                            .map(|row| {
                                view! {
                                    <tr>
                                        <td class="data-table__mono">{row.access_key}</td>
                                        <td>{row.company}</td>
                                        <td>{row.cnpj}</td>
                                        <td class="data-table__amount">{format_brl(row.amount)}</td>
                                    </tr>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </tbody>
                <tfoot>
                    <tr>
                        <td colspan="3">{move || format!("{} invoices", rows.with(Vec::len))}</td>
                        <td class="data-table__amount">{move || rows.with(|r| format_brl(rows_total(r)))}</td>
                    </tr>
                </tfoot>
            </table>
        </section>
    }
}
