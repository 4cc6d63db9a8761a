//! Render routines, one module per screen.
//!
//! A routine reads the session, calls collaborators, may mutate the session and finishes with
//! an [`Outcome`]: either a view of its own screen or a request to move elsewhere.

mod acknowledge;
mod case_details;
mod home;
mod login;
mod symptom_entry;

use crate::ids::UserId;
use crate::router::{Screen, Services, Trigger};
use crate::session::Session;
use api_shared::{Action, Notice, ScreenView};

pub(crate) enum Step {
    Render(ScreenView),
    Go(Screen, Trigger),
}

pub(crate) struct Outcome {
    pub(crate) notices: Vec<Notice>,
    pub(crate) step: Step,
}

impl Outcome {
    pub(crate) fn render(view: ScreenView) -> Self {
        Self {
            notices: Vec::new(),
            step: Step::Render(view),
        }
    }

    pub(crate) fn go(to: Screen, trigger: Trigger) -> Self {
        Self {
            notices: Vec::new(),
            step: Step::Go(to, trigger),
        }
    }

    pub(crate) fn with(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

pub(crate) fn dispatch(services: &Services, session: &mut Session, action: Action) -> Outcome {
    match session.screen {
        Screen::Login => login::handle(services, session, action),
        Screen::Home => home::handle(services, session, action),
        Screen::SymptomEntry => symptom_entry::handle(services, session, action),
        Screen::CaseDetails => case_details::handle(services, session, action),
        Screen::AcknowledgeReport => acknowledge::handle(services, session, action),
    }
}

/// The signed-in identity, or a redirect to Login when there is none.
pub(crate) fn require_auth(session: &Session) -> Result<UserId, Outcome> {
    session
        .identity
        .clone()
        .ok_or_else(|| Outcome::go(Screen::Login, Trigger::Redirect))
}

/// Signs out (ignoring failure) and clears the session, keeping it on its current screen so
/// the router can apply the logout transition.
pub(crate) fn logout(services: &Services, session: &mut Session) -> Outcome {
    let from = session.screen;
    if let Some(identity) = session.clear() {
        if let Err(e) = services.auth.sign_out(&identity) {
            tracing::debug!("ignoring sign-out failure for {}: {}", identity, e);
        }
        tracing::info!("user {} logged out", identity);
    }
    session.screen = from;
    Outcome::go(Screen::Login, Trigger::Logout)
}

/// Re-renders after an action that does not belong to the current screen.
pub(crate) fn unsupported(screen: Screen, action: &Action, rerender: Outcome) -> Outcome {
    tracing::warn!("ignoring {} action on {} screen", action.name(), screen);
    let mut outcome = rerender;
    outcome
        .notices
        .insert(0, Notice::warning("That action is not available on this page."));
    outcome
}
