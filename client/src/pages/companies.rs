//! Company registry: add/edit form with certificate upload, filters, delete.

#[cfg(test)]
#[path = "companies_test.rs"]
mod companies_test;

use leptos::prelude::*;

use crate::components::session_provider::SessionHandle;
use crate::net::types::Company;
use crate::state::auth::AuthState;
use crate::state::companies::{CompanyForm, filter_companies};
use crate::util::format::format_date;

/// Validity cell text and whether it should be flagged.
pub(crate) fn validity_label(company: &Company, now: time::OffsetDateTime) -> (String, bool) {
    let date = company.certificate_validity.map_or_else(|| "-".to_owned(), |d| format_date(d.iso));
    let expired = company.certificate_expired(now);
    let status = if expired { "Expired" } else { "Valid" };
    (format!("{date} ({status})"), expired)
}

#[component]
pub fn CompaniesPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionHandle>();

    let companies = RwSignal::new(Vec::<Company>::new());
    let form = RwSignal::new(CompanyForm::default());
    let editing = RwSignal::new(None::<String>);
    let cnpj_filter = RwSignal::new(String::new());
    let only_expired = RwSignal::new(false);
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    // Bumped to refetch after a write.
    let reload = RwSignal::new(0_u32);

    #[cfg(feature = "hydrate")]
    {
        let user = Memo::new(move |_| auth.with(|a| a.user.clone()));
        Effect::new(move || {
            reload.track();
            let Some(user) = user.get() else { return };
            let records = session.records();
            leptos::task::spawn_local(async move {
                match records.list_companies(&user).await {
                    Ok(list) => companies.set(list),
                    Err(e) => super::report_record_error(session, &e, info),
                }
            });
        });
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = (session, reload);

    let reset_form = move || {
        form.set(CompanyForm::default());
        editing.set(None);
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let Some(user) = auth.with_untracked(|a| a.user.clone()) else {
            return;
        };
        let editing_id = editing.get();
        let submission = match crate::state::companies::prepare_company(
            &form.get(),
            editing_id.is_some(),
            time::OffsetDateTime::now_utc(),
        ) {
            Ok(submission) => submission,
            Err(msg) => {
                info.set(msg.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set("Saving...".to_owned());

        #[cfg(feature = "hydrate")]
        {
            use crate::state::companies::submit_company;

            let records = session.records();
            leptos::task::spawn_local(async move {
                match submit_company(records.as_ref(), &user, editing_id.as_deref(), submission).await {
                    Ok(_) => {
                        let done = if editing_id.is_some() { "Company updated." } else { "Company added." };
                        info.set(done.to_owned());
                        reset_form();
                        reload.update(|n| *n += 1);
                    }
                    Err(e) => super::report_record_error(session, &e, info),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (user, editing_id, submission);
        }
    };

    let on_certificate = move |ev: leptos::ev::Event| {
        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            match crate::util::browser::read_selected_file(&ev).await {
                Ok(upload) => form.update(|f| f.certificate = upload),
                Err(e) => {
                    log::warn!("{e}");
                    info.set("Could not read the certificate file.".to_owned());
                }
            }
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = ev;
    };

    let start_edit = move |company: Company| {
        form.set(CompanyForm::editing(&company));
        editing.set(Some(company.id));
        info.set(String::new());
    };

    let delete = move |id: String| {
        #[cfg(feature = "hydrate")]
        {
            if !crate::util::browser::confirm("Delete this company?") {
                return;
            }
            let Some(user) = auth.with_untracked(|a| a.user.clone()) else {
                return;
            };
            let records = session.records();
            leptos::task::spawn_local(async move {
                match records.delete_company(&user, &id).await {
                    Ok(()) => {
                        info.set("Company deleted.".to_owned());
                        reload.update(|n| *n += 1);
                    }
                    Err(e) => super::report_record_error(session, &e, info),
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        let _ = id;
    };

    let visible = move |now| {
        companies.with(|list| cnpj_filter.with(|needle| filter_companies(list, needle, only_expired.get(), now)))
    };

    view! {
        <section class="companies-page">
            <h1 class="companies-page__title">"Companies"</h1>
            <form class="company-form" on:submit=on_submit>
                <label class="form-label">
                    "CNPJ"
                    <input
                        class="form-input"
                        type="text"
                        disabled=move || editing.with(Option::is_some)
                        prop:value=move || form.with(|f| f.cnpj.clone())
                        on:input=move |ev| form.update(|f| f.cnpj = event_target_value(&ev))
                    />
                </label>
                <label class="form-label">
                    "Legal name"
                    <input
                        class="form-input"
                        type="text"
                        prop:value=move || form.with(|f| f.legal_name.clone())
                        on:input=move |ev| form.update(|f| f.legal_name = event_target_value(&ev))
                    />
                </label>
                <label class="form-label">
                    "Certificate (.pfx)"
                    <input class="form-input" type="file" accept=".pfx" on:change=on_certificate/>
                </label>
                <label class="form-label">
                    "Certificate password"
                    <input
                        class="form-input"
                        type="password"
                        autocomplete="off"
                        prop:value=move || form.with(|f| f.certificate_password.clone())
                        on:input=move |ev| form.update(|f| f.certificate_password = event_target_value(&ev))
                    />
                </label>
                <button class="btn" type="submit" disabled=move || busy.get()>
                    {move || if editing.with(Option::is_some) { "Update company" } else { "Add company" }}
                </button>
                <Show when=move || editing.with(Option::is_some)>
                    <button class="btn btn--secondary" type="button" on:click=move |_| reset_form()>
                        "Cancel"
                    </button>
                </Show>
            </form>
            <Show when=move || !info.get().is_empty()>
                <p class="companies-page__message">{move || info.get()}</p>
            </Show>

            <div class="companies-page__filters">
                <input
                    class="form-input"
                    type="text"
                    placeholder="Filter by CNPJ"
                    prop:value=move || cnpj_filter.get()
                    on:input=move |ev| cnpj_filter.set(event_target_value(&ev))
                />
                <label class="form-check">
                    <input
                        type="checkbox"
                        prop:checked=move || only_expired.get()
                        on:change=move |ev| only_expired.set(event_target_checked(&ev))
                    />
                    "Expired certificates only"
                </label>
            </div>

            <table class="data-table">
                <thead>
                    <tr>
                        <th>"CNPJ"</th>
                        <th>"Legal name"</th>
                        <th>"Certificate validity"</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    {move || {
                        let now = time::OffsetDateTime::now_utc();
                        visible(now)
                            .into_iter()
                            .map(|company| {
                                let (validity, expired) = validity_label(&company, now);
                                let id = company.id.clone();
                                let cnpj = company.cnpj.clone();
                                let legal_name = company.legal_name.clone();
                                view! {
                                    <tr>
                                        <td>{cnpj}</td>
                                        <td>{legal_name}</td>
                                        <td class:data-table__expired=expired>{validity}</td>
                                        <td class="data-table__actions">
                                            <button
                                                class="btn btn--small"
                                                on:click=move |_| start_edit(company.clone())
                                            >
                                                "Edit"
                                            </button>
                                            <button
                                                class="btn btn--small btn--danger"
                                                on:click=move |_| delete(id.clone())
                                            >
                                                "Delete"
                                            </button>
                                        </td>
                                    </tr>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </tbody>
            </table>
        </section>
    }
}
