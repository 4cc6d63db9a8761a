use super::{logout, require_auth, unsupported, Outcome};
use crate::constants::{NOT_AVAILABLE_YET, UNKNOWN_CHILD};
use crate::format::{format_date, format_timestamp};
use crate::gateway::ChildFilter;
use crate::ids::{CaseId, ChildId};
use crate::router::{Screen, Services, Trigger};
use crate::session::Session;
use api_shared::{Action, CaseDetailsView, Notice, ScreenView};

pub(crate) fn handle(services: &Services, session: &mut Session, action: Action) -> Outcome {
    if let Err(redirect) = require_auth(session) {
        return redirect;
    }
    let Some(case_id) = session.selected_case_ref.clone() else {
        return Outcome::go(Screen::Home, Trigger::Redirect);
    };

    match action {
        Action::Render => render(services, &case_id),
        Action::Back => {
            session.selected_case_ref = None;
            Outcome::go(Screen::Home, Trigger::Back)
        }
        Action::Logout => logout(services, session),
        other => unsupported(Screen::CaseDetails, &other, render(services, &case_id)),
    }
}

/// Full name of a child, or a placeholder when the lookup fails or finds nothing.
pub(crate) fn child_name(services: &Services, child_id: &ChildId) -> String {
    match services
        .records
        .children(&ChildFilter::Ids(vec![child_id.clone()]))
    {
        Ok(children) => children
            .first()
            .map(|c| c.full_name())
            .unwrap_or_else(|| UNKNOWN_CHILD.to_string()),
        Err(e) => {
            tracing::warn!("child lookup failed for {}: {}", child_id, e);
            UNKNOWN_CHILD.to_string()
        }
    }
}

fn or_placeholder(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE_YET.to_string())
}

fn render(services: &Services, case_id: &CaseId) -> Outcome {
    let case = match services.records.case(case_id) {
        Ok(Some(case)) => case,
        Ok(None) => {
            return Outcome::render(ScreenView::Blank).with(Notice::warning("Case not found."))
        }
        Err(e) => {
            tracing::error!("load case error: {:?}", e);
            return Outcome::render(ScreenView::Blank)
                .with(Notice::error("Could not load this case. Please try again."));
        }
    };

    let child_name = child_name(services, &case.child_id);

    Outcome::render(ScreenView::CaseDetails(CaseDetailsView {
        case_id: case.id.to_string(),
        child_name,
        submitted_at: format_timestamp(case.created_at),
        symptom_date: format_date(case.symptom_date),
        symptom_description: case.symptom_description.into_inner(),
        photo_url: case.photo_url,
        status: case.status.as_str().to_string(),
        ai_recommendation: or_placeholder(case.ai_recommendation),
        ai_category: or_placeholder(case.ai_category),
        ai_guidance: or_placeholder(case.ai_guidance),
        red_flags: case.red_flags,
    }))
}
