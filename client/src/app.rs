//! Root application component with routing and context providers.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};

use crate::components::layout::Layout;
use crate::components::protected_route::ProtectedRoute;
use crate::components::session_provider::SessionProvider;
use crate::pages::{
    companies::CompaniesPage, dashboard::DashboardPage, login::LoginPage, profile::ProfilePage, register::RegisterPage,
    xmls::XmlsPage,
};
use crate::state::auth::AuthState;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Starts in the resuming state so no view treats the user as logged out
/// before the persisted session has been checked.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let auth = RwSignal::new(AuthState::resuming());
    provide_context(auth);

    view! {
        <Stylesheet id="leptos" href="/pkg/nfhub.css"/>
        <Title text="NF Hub"/>

        <Router>
            <SessionProvider>
                <Layout>
                    <Routes fallback=|| "Page not found.".into_view()>
                        <Route path=StaticSegment("login") view=LoginPage/>
                        <Route path=StaticSegment("register") view=RegisterPage/>
                        <Route
                            path=StaticSegment("")
                            view=|| view! { <ProtectedRoute><DashboardPage/></ProtectedRoute> }
                        />
                        <Route
                            path=StaticSegment("profile")
                            view=|| view! { <ProtectedRoute><ProfilePage/></ProtectedRoute> }
                        />
                        <Route
                            path=StaticSegment("companies")
                            view=|| view! { <ProtectedRoute><CompaniesPage/></ProtectedRoute> }
                        />
                        <Route
                            path=StaticSegment("xmls")
                            view=|| view! { <ProtectedRoute><XmlsPage/></ProtectedRoute> }
                        />
                    </Routes>
                </Layout>
            </SessionProvider>
        </Router>
    }
}
