use super::{unsupported, Outcome};
use crate::error::AuthError;
use crate::format::display_name_from_email;
use crate::router::{Screen, Services, Trigger};
use crate::session::Session;
use api_shared::{Action, LoginView, Notice, ScreenView};
use bewell_types::EmailAddress;

pub(crate) fn handle(services: &Services, session: &mut Session, action: Action) -> Outcome {
    match action {
        Action::Render => render(),
        Action::Login { email, password } => submit(services, session, &email, &password),
        other => unsupported(Screen::Login, &other, render()),
    }
}

fn render() -> Outcome {
    Outcome::render(ScreenView::Login(LoginView {
        title: "Welcome Back!".into(),
        subtitle: "Log in to continue caring for your little ones.".into(),
    }))
}

fn submit(services: &Services, session: &mut Session, email: &str, password: &str) -> Outcome {
    let email = email.trim();
    if email.is_empty() || password.trim().is_empty() {
        return render().with(Notice::warning("Please enter both email and password."));
    }

    let Ok(email) = EmailAddress::parse(email) else {
        return render().with(Notice::warning("Please enter a valid email address."));
    };

    let signed_in = match services.auth.sign_in(&email, password) {
        Ok(signed_in) => signed_in,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("rejected login for {}", email);
            return render().with(Notice::error("Invalid email or password."));
        }
        Err(e) => {
            tracing::error!("login error: {:?}", e);
            return render().with(Notice::error("Login failed. Please try again."));
        }
    };

    let identity = signed_in.identity;
    let mut display_name = display_name_from_email(&email);
    let mut role = None;
    let mut scopes = Vec::new();

    match services.records.user_profile(&identity) {
        Ok(Some(profile)) => {
            if let Some(name) = profile.display_name.filter(|n| !n.trim().is_empty()) {
                display_name = name.trim().to_string();
            }
            role = profile.role;
            scopes = profile.centre_ids;
        }
        Ok(None) => tracing::warn!("no profile for {}; using email for display name", identity),
        Err(e) => tracing::warn!("profile lookup failed for {}: {}", identity, e),
    }

    tracing::info!("user {} signed in as {:?}", identity, role);

    session.identity = Some(identity);
    session.auth_tokens = Some(signed_in.tokens);
    session.display_name = Some(display_name);
    session.role = role;
    session.organization_scopes = scopes;
    session.selected_case_ref = None;
    session.acknowledge_checked = false;

    Outcome::go(Screen::Home, Trigger::SignedIn)
}
