//! Screen controller.
//!
//! Every request carries one [`Action`]. The router restores the authenticated connection,
//! dispatches the action to the render routine of the session's current screen and applies any
//! transition that routine requests. A transition is only applied if it appears in
//! [`TRANSITIONS`]; the destination is then rendered in the same request so the caller always
//! receives the screen the session ended up on.

use crate::gateway::{AuthGateway, BlobStore, RecordStore};
use crate::records::Role;
use crate::screens::{self, Outcome, Step};
use crate::session::Session;
use crate::CoreConfig;
use api_shared::{Action, ActionReq, Notice, ScreenRes, ScreenView};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Transitions applied in a single request before giving up.
const MAX_HOPS: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Screen {
    #[default]
    Login,
    Home,
    SymptomEntry,
    CaseDetails,
    AcknowledgeReport,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Login,
        Screen::Home,
        Screen::SymptomEntry,
        Screen::CaseDetails,
        Screen::AcknowledgeReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Login => "login",
            Screen::Home => "home",
            Screen::SymptomEntry => "symptom_entry",
            Screen::CaseDetails => "case_details",
            Screen::AcknowledgeReport => "acknowledge_report",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Screen::Login)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown screen: {0}")]
pub struct UnknownScreen(pub String);

impl FromStr for Screen {
    type Err = UnknownScreen;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .into_iter()
            .find(|screen| screen.as_str() == s)
            .ok_or_else(|| UnknownScreen(s.to_string()))
    }
}

/// Why a screen asks to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    SignedIn,
    NewCase,
    SelectCase,
    Submitted,
    Acknowledged,
    Back,
    Logout,
    /// Forced move: missing auth, missing selection or a role that may not use the screen.
    Redirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRule {
    Any,
    ParentOnly,
    NotParent,
}

impl RoleRule {
    fn admits(self, role: Option<Role>) -> bool {
        match self {
            RoleRule::Any => true,
            RoleRule::ParentOnly => role == Some(Role::Parent),
            RoleRule::NotParent => role != Some(Role::Parent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Screen,
    pub to: Screen,
    pub trigger: Trigger,
    pub role: RoleRule,
}

const fn t(from: Screen, to: Screen, trigger: Trigger, role: RoleRule) -> Transition {
    Transition {
        from,
        to,
        trigger,
        role,
    }
}

use RoleRule::{Any, NotParent, ParentOnly};
use Screen::{AcknowledgeReport, CaseDetails, Home, Login, SymptomEntry};

pub const TRANSITIONS: &[Transition] = &[
    t(Login, Home, Trigger::SignedIn, Any),
    t(Home, SymptomEntry, Trigger::NewCase, NotParent),
    t(Home, CaseDetails, Trigger::SelectCase, NotParent),
    t(Home, AcknowledgeReport, Trigger::SelectCase, ParentOnly),
    t(SymptomEntry, Home, Trigger::Submitted, Any),
    t(SymptomEntry, Home, Trigger::Back, Any),
    t(SymptomEntry, Home, Trigger::Redirect, ParentOnly),
    t(CaseDetails, Home, Trigger::Back, Any),
    t(CaseDetails, Home, Trigger::Redirect, Any),
    t(AcknowledgeReport, Home, Trigger::Acknowledged, Any),
    t(AcknowledgeReport, Home, Trigger::Back, Any),
    t(AcknowledgeReport, Home, Trigger::Redirect, Any),
    t(Home, Login, Trigger::Logout, Any),
    t(SymptomEntry, Login, Trigger::Logout, Any),
    t(CaseDetails, Login, Trigger::Logout, Any),
    t(AcknowledgeReport, Login, Trigger::Logout, Any),
    t(Home, Login, Trigger::Redirect, Any),
    t(SymptomEntry, Login, Trigger::Redirect, Any),
    t(CaseDetails, Login, Trigger::Redirect, Any),
    t(AcknowledgeReport, Login, Trigger::Redirect, Any),
];

pub fn is_allowed(from: Screen, to: Screen, trigger: Trigger, role: Option<Role>) -> bool {
    TRANSITIONS
        .iter()
        .any(|tr| tr.from == from && tr.to == to && tr.trigger == trigger && tr.role.admits(role))
}

/// Collaborators and configuration shared by every render routine.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthGateway>,
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub cfg: Arc<CoreConfig>,
}

#[derive(Clone)]
pub struct Router {
    services: Services,
}

impl Router {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Runs one action against the session and returns the screen it lands on.
    pub fn handle(&self, session: &mut Session, req: ActionReq) -> ScreenRes {
        self.restore_connection(session);

        let mut notices = Vec::new();
        let mut action = req.action;

        if let Some(hint) = req.on_screen.as_deref() {
            match hint.parse::<Screen>() {
                Err(e) => {
                    tracing::warn!("{}; resetting session to login", e);
                    session.screen = Screen::Login;
                    notices.push(Notice::warning(
                        "That page is not available. You have been returned to the login page.",
                    ));
                    action = Action::Render;
                }
                Ok(screen) if screen != session.screen => {
                    tracing::debug!(
                        "stale {} action for {} while session is on {}",
                        action.name(),
                        screen,
                        session.screen
                    );
                    notices.push(Notice::warning(
                        "This page was out of date and has been refreshed.",
                    ));
                    action = Action::Render;
                }
                Ok(_) => {}
            }
        }

        for _hop in 0..MAX_HOPS {
            let Outcome {
                notices: produced,
                step,
            } = screens::dispatch(&self.services, session, action);
            notices.extend(produced);

            match step {
                Step::Render(view) => return respond(session, notices, view),
                Step::Go(to, trigger) => {
                    let from = session.screen;
                    if is_allowed(from, to, trigger, session.role) {
                        tracing::debug!("{} -> {} ({:?})", from, to, trigger);
                        session.screen = to;
                    } else {
                        tracing::warn!(
                            "rejected transition {} -> {} ({:?}) for role {:?}",
                            from,
                            to,
                            trigger,
                            session.role
                        );
                    }
                    action = Action::Render;
                }
            }
        }

        tracing::error!(
            "screen {} did not settle after {} transitions",
            session.screen,
            MAX_HOPS
        );
        notices.push(Notice::error("Something went wrong. Please try again."));
        respond(session, notices, ScreenView::Blank)
    }

    /// Signs the session's identity out and resets the session.
    pub fn end_session(&self, session: &mut Session) {
        if let Some(identity) = session.clear() {
            if let Err(e) = self.services.auth.sign_out(&identity) {
                tracing::debug!("ignoring sign-out failure for {}: {}", identity, e);
            }
            tracing::info!("session ended for {}", identity);
        }
    }

    fn restore_connection(&self, session: &Session) {
        if let Some(tokens) = &session.auth_tokens {
            if let Err(e) = self.services.auth.restore_session(tokens) {
                tracing::debug!("could not restore auth session: {}", e);
            }
        }
    }
}

fn respond(session: &Session, notices: Vec<Notice>, view: ScreenView) -> ScreenRes {
    ScreenRes {
        screen: session.screen.as_str().to_string(),
        display_name: session.display_name.clone(),
        avatar_initial: session.avatar_initial(),
        notices,
        view,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{AcknowledgeOutcome, AuthTokens, CaseFilter};
    use crate::ids::{CaseId, CentreId, UserId};
    use crate::records::CaseStatus;
    use crate::test_support::{Fixture, CARER, OTHER_CARER};
    use api_shared::{NoticeLevel, PhotoUpload};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use chrono::NaiveDate;

    fn act(action: Action) -> ActionReq {
        ActionReq {
            on_screen: None,
            action,
        }
    }

    fn login(fx: &Fixture, session: &mut Session, email: &str) -> ScreenRes {
        fx.router().handle(
            session,
            act(Action::Login {
                email: email.into(),
                password: "secret".into(),
            }),
        )
    }

    fn submit(child: &str, description: &str, photo: Option<PhotoUpload>) -> ActionReq {
        act(Action::SubmitSymptoms {
            child_id: child.into(),
            symptom_date: Some("2024-01-05".into()),
            description: description.into(),
            photo,
        })
    }

    fn png_photo() -> PhotoUpload {
        PhotoUpload {
            filename: "rash.png".into(),
            content_type: "image/png".into(),
            data_base64: STANDARD.encode([0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        }
    }

    fn has_notice(res: &ScreenRes, level: NoticeLevel) -> bool {
        res.notices.iter().any(|n| n.level == level)
    }

    #[test]
    fn test_screen_names_roundtrip() {
        for screen in Screen::ALL {
            assert_eq!(screen.as_str().parse::<Screen>(), Ok(screen));
        }
        assert_eq!(
            "settings".parse::<Screen>(),
            Err(UnknownScreen("settings".into()))
        );
    }

    #[test]
    fn test_transition_table() {
        let parent = Some(Role::Parent);
        let carer = Some(Role::Carer);

        assert!(is_allowed(Login, Home, Trigger::SignedIn, None));
        assert!(is_allowed(Home, SymptomEntry, Trigger::NewCase, carer));
        assert!(is_allowed(Home, SymptomEntry, Trigger::NewCase, None));
        assert!(!is_allowed(Home, SymptomEntry, Trigger::NewCase, parent));
        assert!(is_allowed(Home, CaseDetails, Trigger::SelectCase, carer));
        assert!(!is_allowed(Home, CaseDetails, Trigger::SelectCase, parent));
        assert!(is_allowed(Home, AcknowledgeReport, Trigger::SelectCase, parent));
        assert!(!is_allowed(Home, AcknowledgeReport, Trigger::SelectCase, carer));
        assert!(!is_allowed(Login, Home, Trigger::Back, carer));
        assert!(!is_allowed(Login, Login, Trigger::Logout, carer));

        for screen in Screen::ALL.into_iter().filter(Screen::requires_auth) {
            assert!(is_allowed(screen, Login, Trigger::Logout, parent));
            assert!(is_allowed(screen, Login, Trigger::Redirect, None));
        }
    }

    #[test]
    fn test_unauthenticated_screens_redirect_to_login_without_store_calls() {
        let fx = Fixture::new();
        for screen in Screen::ALL.into_iter().filter(Screen::requires_auth) {
            let mut session = Session {
                screen,
                selected_case_ref: Some(CaseId::new("k1")),
                ..Session::default()
            };
            let res = fx.router().handle(&mut session, act(Action::Render));

            assert_eq!(res.screen, "login");
            assert_eq!(session.screen, Screen::Login);
            assert!(matches!(res.view, ScreenView::Login(_)));
        }
        assert_eq!(fx.records.calls(), 0);
    }

    #[test]
    fn test_empty_password_makes_no_auth_call() {
        let fx = Fixture::new();
        let mut session = Session::default();
        let res = fx.router().handle(
            &mut session,
            act(Action::Login {
                email: "a@b.com".into(),
                password: "".into(),
            }),
        );

        assert_eq!(res.screen, "login");
        assert!(has_notice(&res, NoticeLevel::Warning));
        assert_eq!(fx.auth.sign_in_calls(), 0);
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_login_populates_session_and_lands_on_home() {
        let fx = Fixture::new();
        let mut session = Session::default();
        let res = login(&fx, &mut session, "carer@centre.org");

        assert_eq!(res.screen, "home");
        assert_eq!(session.identity, Some(UserId::new(CARER)));
        assert_eq!(session.role, Some(Role::Carer));
        assert_eq!(session.display_name.as_deref(), Some("Jane Smith"));
        assert_eq!(session.organization_scopes, vec![CentreId::new("centre-a")]);
        assert!(session.auth_tokens.is_some());
        assert_eq!(res.avatar_initial.as_deref(), Some("J"));
        match res.view {
            ScreenView::Home(home) => {
                assert_eq!(home.title, "Carer Home");
                assert!(home.can_create_case);
            }
            other => panic!("expected home view, got {other:?}"),
        }
    }

    #[test]
    fn test_login_without_profile_uses_email_name() {
        let fx = Fixture::new();
        let mut session = Session::default();
        let res = login(&fx, &mut session, "newbie@centre.org");

        assert_eq!(res.screen, "home");
        assert_eq!(session.display_name.as_deref(), Some("newbie"));
        assert_eq!(session.role, None);
    }

    #[test]
    fn test_login_failures_keep_session_unchanged() {
        let fx = Fixture::new();
        let mut session = Session::default();
        let res = fx.router().handle(
            &mut session,
            act(Action::Login {
                email: "carer@centre.org".into(),
                password: "wrong".into(),
            }),
        );
        assert_eq!(res.screen, "login");
        assert_eq!(res.notices[0].message, "Invalid email or password.");
        assert_eq!(session, Session::default());

        fx.auth.fail_sign_in();
        let res = login(&fx, &mut session, "carer@centre.org");
        assert_eq!(res.notices[0].level, NoticeLevel::Error);
        assert_eq!(res.notices[0].message, "Login failed. Please try again.");
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_restore_failure_does_not_block_render() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        session.auth_tokens = Some(AuthTokens {
            access_token: "stale".into(),
            refresh_token: "stale".into(),
        });
        let res = fx.router().handle(&mut session, act(Action::Render));
        assert_eq!(res.screen, "home");
        assert!(fx.auth.restore_calls() >= 1);
    }

    #[test]
    fn test_carer_submits_case_for_child() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        let res = fx.router().handle(&mut session, act(Action::NewCase));
        assert_eq!(res.screen, "symptom_entry");
        match &res.view {
            ScreenView::SymptomEntry(view) => {
                assert_eq!(view.children.len(), 1);
                assert_eq!(view.children[0].label, "Mary Adam - Lucy Adam");
            }
            other => panic!("expected symptom entry view, got {other:?}"),
        }

        let res = fx
            .router()
            .handle(&mut session, submit(fx.child_id.as_str(), "cough", None));
        assert_eq!(res.screen, "home");
        assert_eq!(res.notices[0].level, NoticeLevel::Success);
        assert_eq!(res.notices[0].message, "Case for Lucy saved!");

        let cases = fx.records.all_cases();
        assert_eq!(cases.len(), 1);
        let case = &cases[0];
        assert_eq!(case.child_id, fx.child_id);
        assert_eq!(case.reported_by, UserId::new(CARER));
        assert_eq!(case.symptom_description.as_str(), "cough");
        assert_eq!(
            case.symptom_date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(case.photo_url, None);
        assert_eq!(case.status, CaseStatus::Pending);
        assert_eq!(case.centre_id, Some(CentreId::new("centre-a")));

        match res.view {
            ScreenView::Home(home) => {
                assert_eq!(home.cases.len(), 1);
                assert_eq!(home.cases[0].date, "05 Jan 2024");
                assert_eq!(home.cases[0].child_name, "Lucy Adam");
            }
            other => panic!("expected home view, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_description_is_not_saved() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");
        fx.router().handle(&mut session, act(Action::NewCase));
        let store_calls = fx.records.calls();

        let res = fx
            .router()
            .handle(&mut session, submit(fx.child_id.as_str(), "   ", None));
        assert_eq!(res.screen, "symptom_entry");
        assert_eq!(
            res.notices[0].message,
            "Please describe the symptoms before submitting."
        );
        assert_eq!(fx.records.calls(), store_calls, "blank text must not reach the store");
        assert_eq!(fx.records.insert_calls(), 0);

        match res.view {
            ScreenView::SymptomEntry(view) => {
                assert_eq!(view.children.len(), 1);
                assert_eq!(view.children[0].child_id, fx.child_id.as_str());
            }
            other => panic!("expected symptom entry view, got {other:?}"),
        }
    }

    #[test]
    fn test_photo_is_uploaded_and_linked() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");
        fx.router().handle(&mut session, act(Action::NewCase));

        fx.router().handle(
            &mut session,
            submit(fx.child_id.as_str(), "rash on arm", Some(png_photo())),
        );

        let case = &fx.records.all_cases()[0];
        assert_eq!(
            case.photo_url.as_deref(),
            Some("https://blobs.test/carer-1/2024-01-05_rash.png")
        );
        assert_eq!(fx.blobs.uploaded_paths(), vec!["carer-1/2024-01-05_rash.png"]);
    }

    #[test]
    fn test_failed_upload_still_saves_case() {
        let fx = Fixture::new();
        fx.blobs.fail_uploads();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");
        fx.router().handle(&mut session, act(Action::NewCase));

        let res = fx.router().handle(
            &mut session,
            submit(fx.child_id.as_str(), "rash on arm", Some(png_photo())),
        );
        assert_eq!(res.screen, "home");
        let cases = fx.records.all_cases();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].photo_url, None);
    }

    #[test]
    fn test_wrong_photo_type_is_rejected_before_any_call() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");
        fx.router().handle(&mut session, act(Action::NewCase));

        let gif = PhotoUpload {
            filename: "rash.gif".into(),
            content_type: "image/gif".into(),
            data_base64: STANDARD.encode(b"GIF89a"),
        };
        let res = fx
            .router()
            .handle(&mut session, submit(fx.child_id.as_str(), "rash", Some(gif)));
        assert_eq!(res.screen, "symptom_entry");
        assert!(has_notice(&res, NoticeLevel::Warning));
        assert!(fx.blobs.uploaded_paths().is_empty());
        assert_eq!(fx.records.insert_calls(), 0);
    }

    #[test]
    fn test_insert_failure_stays_on_entry() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");
        fx.router().handle(&mut session, act(Action::NewCase));

        fx.records.fail_inserts();
        let res = fx
            .router()
            .handle(&mut session, submit(fx.child_id.as_str(), "cough", None));
        assert_eq!(res.screen, "symptom_entry");
        assert!(has_notice(&res, NoticeLevel::Error));
        assert!(fx.records.all_cases().is_empty());
    }

    #[test]
    fn test_parent_is_redirected_away_from_symptom_entry() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "parent@home.org");

        session.screen = Screen::SymptomEntry;
        let res = fx.router().handle(&mut session, act(Action::Render));
        assert_eq!(res.screen, "home");
        assert!(res.notices.is_empty());

        let res = fx.router().handle(&mut session, act(Action::NewCase));
        assert_eq!(res.screen, "home");
        assert!(has_notice(&res, NoticeLevel::Warning));
    }

    #[test]
    fn test_listings_are_scoped_by_role() {
        let fx = Fixture::new();
        fx.seed_case(CARER, "first", 1);
        fx.seed_case(OTHER_CARER, "second", 2);

        let mut carer = Session::default();
        let res = login(&fx, &mut carer, "carer@centre.org");
        let ScreenView::Home(home) = res.view else {
            panic!("expected home view");
        };
        assert_eq!(home.cases.len(), 1);
        assert_eq!(home.cases[0].symptom_excerpt, "first");

        let mut parent = Session::default();
        let res = login(&fx, &mut parent, "parent@home.org");
        let ScreenView::Home(home) = res.view else {
            panic!("expected home view");
        };
        assert_eq!(home.title, "Parent Home");
        assert!(!home.can_create_case);
        let excerpts: Vec<&str> = home
            .cases
            .iter()
            .map(|c| c.symptom_excerpt.as_str())
            .collect();
        assert_eq!(excerpts, vec!["second", "first"]);

        let queries = fx.records.case_queries();
        assert!(queries
            .iter()
            .any(|q| q.filter == CaseFilter::ReportedBy(UserId::new(CARER))));
        assert!(queries
            .iter()
            .any(|q| q.filter == CaseFilter::ChildIn(vec![fx.child_id.clone()])));
        assert!(queries.iter().all(|q| q.limit == 20));
    }

    #[test]
    fn test_listing_failure_shows_error_and_empty_list() {
        let fx = Fixture::new();
        fx.seed_case(CARER, "first", 1);
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        fx.records.fail_reads();
        let res = fx.router().handle(&mut session, act(Action::Render));
        assert_eq!(res.screen, "home");
        assert!(has_notice(&res, NoticeLevel::Error));
        let ScreenView::Home(home) = res.view else {
            panic!("expected home view");
        };
        assert!(home.cases.is_empty());
    }

    #[test]
    fn test_carer_views_case_details() {
        let fx = Fixture::new();
        let case_id = fx.seed_case(CARER, "cough", 1);
        fx.records.set_guidance(&case_id, "Keep hydrated.", vec!["fever", "rash"]);
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        let res = fx.router().handle(
            &mut session,
            act(Action::SelectCase {
                case_id: case_id.to_string(),
            }),
        );
        assert_eq!(res.screen, "case_details");
        let ScreenView::CaseDetails(view) = res.view else {
            panic!("expected case details view");
        };
        assert_eq!(view.child_name, "Lucy Adam");
        assert_eq!(view.ai_guidance, "Keep hydrated.");
        assert_eq!(view.ai_category, "Not available yet");
        assert_eq!(view.red_flags, vec!["fever".to_string(), "rash".to_string()]);

        let res = fx.router().handle(&mut session, act(Action::Back));
        assert_eq!(res.screen, "home");
        assert_eq!(session.selected_case_ref, None);
    }

    #[test]
    fn test_selecting_a_case_outside_the_listing_is_refused() {
        let fx = Fixture::new();
        let foreign = fx.seed_case(OTHER_CARER, "not mine", 1);
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        let res = fx.router().handle(
            &mut session,
            act(Action::SelectCase {
                case_id: foreign.to_string(),
            }),
        );
        assert_eq!(res.screen, "home");
        assert!(has_notice(&res, NoticeLevel::Warning));
        assert_eq!(session.selected_case_ref, None);
    }

    #[test]
    fn test_missing_selection_redirects_home() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        session.screen = Screen::CaseDetails;
        let res = fx.router().handle(&mut session, act(Action::Render));
        assert_eq!(res.screen, "home");
    }

    #[test]
    fn test_parent_acknowledges_report() {
        let fx = Fixture::new();
        let case_id = fx.seed_case(CARER, "cough", 1);
        let mut session = Session::default();
        login(&fx, &mut session, "parent@home.org");

        let res = fx.router().handle(
            &mut session,
            act(Action::SelectCase {
                case_id: case_id.to_string(),
            }),
        );
        assert_eq!(res.screen, "acknowledge_report");
        let ScreenView::AcknowledgeReport(view) = res.view else {
            panic!("expected acknowledge view");
        };
        assert_eq!(view.guidance_text, "cough");
        assert!(!view.acknowledge_checked);

        let res = fx.router().handle(&mut session, act(Action::Acknowledge));
        assert_eq!(res.screen, "acknowledge_report");
        assert!(has_notice(&res, NoticeLevel::Warning));
        assert_eq!(fx.records.acknowledge_calls(), 0);

        fx.router().handle(
            &mut session,
            act(Action::SetAcknowledgeChecked { checked: true }),
        );
        let res = fx.router().handle(&mut session, act(Action::Acknowledge));
        assert_eq!(res.screen, "home");
        assert!(has_notice(&res, NoticeLevel::Success));
        assert!(!session.acknowledge_checked);
        assert_eq!(session.selected_case_ref, None);

        let case = fx.records.case_by_id(&case_id).expect("case should exist");
        assert_eq!(case.status, CaseStatus::Acknowledged);
        assert!(case.acknowledged_by_parent);
    }

    #[test]
    fn test_already_acknowledged_case_is_not_written_again() {
        let fx = Fixture::new();
        let case_id = fx.seed_case(CARER, "cough", 1);
        let mut session = Session::default();
        login(&fx, &mut session, "parent@home.org");
        fx.router().handle(
            &mut session,
            act(Action::SelectCase {
                case_id: case_id.to_string(),
            }),
        );
        fx.router().handle(
            &mut session,
            act(Action::SetAcknowledgeChecked { checked: true }),
        );

        assert!(matches!(
            fx.records.force_acknowledge(&case_id),
            AcknowledgeOutcome::Acknowledged(_)
        ));
        let res = fx.router().handle(&mut session, act(Action::Acknowledge));
        assert_eq!(res.screen, "acknowledge_report");
        assert!(has_notice(&res, NoticeLevel::Info));
    }

    #[test]
    fn test_acknowledge_failure_leaves_case_pending() {
        let fx = Fixture::new();
        let case_id = fx.seed_case(CARER, "cough", 1);
        let mut session = Session::default();
        login(&fx, &mut session, "parent@home.org");
        fx.router().handle(
            &mut session,
            act(Action::SelectCase {
                case_id: case_id.to_string(),
            }),
        );
        fx.router().handle(
            &mut session,
            act(Action::SetAcknowledgeChecked { checked: true }),
        );

        fx.records.fail_acknowledge();
        let res = fx.router().handle(&mut session, act(Action::Acknowledge));
        assert_eq!(res.screen, "acknowledge_report");
        assert!(has_notice(&res, NoticeLevel::Error));
        assert_eq!(
            fx.records.case_by_id(&case_id).map(|c| c.status),
            Some(CaseStatus::Pending)
        );
    }

    #[test]
    fn test_logout_clears_session() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        let res = fx.router().handle(&mut session, act(Action::Logout));
        assert_eq!(res.screen, "login");
        assert_eq!(session, Session::default());
        assert_eq!(fx.auth.sign_out_calls(), 1);
    }

    #[test]
    fn test_unknown_screen_hint_resets_to_login() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        let res = fx.router().handle(
            &mut session,
            ActionReq {
                on_screen: Some("settings".into()),
                action: Action::NewCase,
            },
        );
        assert_eq!(res.screen, "login");
        assert_eq!(session.screen, Screen::Login);
        assert!(has_notice(&res, NoticeLevel::Warning));
    }

    #[test]
    fn test_stale_screen_hint_only_rerenders() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        let res = fx.router().handle(
            &mut session,
            ActionReq {
                on_screen: Some("symptom_entry".into()),
                action: Action::Back,
            },
        );
        assert_eq!(res.screen, "home");
        assert!(has_notice(&res, NoticeLevel::Warning));
    }

    #[test]
    fn test_action_from_another_screen_is_ignored() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        let res = fx.router().handle(&mut session, act(Action::Acknowledge));
        assert_eq!(res.screen, "home");
        assert!(has_notice(&res, NoticeLevel::Warning));
        assert_eq!(fx.records.acknowledge_calls(), 0);
    }

    #[test]
    fn test_child_fallback_tiers() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "floater@centre.org");

        // No assignment, but the centre scope matches.
        let res = fx.router().handle(&mut session, act(Action::NewCase));
        let ScreenView::SymptomEntry(view) = res.view else {
            panic!("expected symptom entry view");
        };
        assert_eq!(view.children.len(), 1);

        // No scopes at all: every child is offered.
        session.organization_scopes.clear();
        let res = fx.router().handle(&mut session, act(Action::Render));
        let ScreenView::SymptomEntry(view) = res.view else {
            panic!("expected symptom entry view");
        };
        assert_eq!(view.children.len(), 2);
    }

    #[test]
    fn test_unscoped_fallback_can_be_disabled() {
        let fx = Fixture::with_unscoped_children(false);
        let mut session = Session::default();
        login(&fx, &mut session, "floater@centre.org");
        session.organization_scopes.clear();

        let res = fx.router().handle(&mut session, act(Action::NewCase));
        assert_eq!(res.screen, "symptom_entry");
        assert_eq!(res.view, ScreenView::Blank);
        assert_eq!(
            res.notices[0].message,
            "No children are linked to your account yet."
        );
    }

    #[test]
    fn test_end_session_signs_out() {
        let fx = Fixture::new();
        let mut session = Session::default();
        login(&fx, &mut session, "carer@centre.org");

        fx.router().end_session(&mut session);
        assert_eq!(session, Session::default());
        assert_eq!(fx.auth.sign_out_calls(), 1);
    }
}
