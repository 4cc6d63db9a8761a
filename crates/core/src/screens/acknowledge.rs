use super::case_details::child_name;
use super::{logout, require_auth, unsupported, Outcome};
use crate::format::format_timestamp;
use crate::gateway::AcknowledgeOutcome;
use crate::ids::CaseId;
use crate::router::{Screen, Services, Trigger};
use crate::session::Session;
use api_shared::{AcknowledgeView, Action, Notice, ScreenView};

const BLURB: &str = "Your child's carer logged the symptoms below. Please read the guidance, \
     tick the box to confirm you have read it, then acknowledge the report.";

pub(crate) fn handle(services: &Services, session: &mut Session, action: Action) -> Outcome {
    if let Err(redirect) = require_auth(session) {
        return redirect;
    }
    let Some(case_id) = session.selected_case_ref.clone() else {
        return Outcome::go(Screen::Home, Trigger::Redirect);
    };

    match action {
        Action::Render => render(services, session, &case_id),
        Action::SetAcknowledgeChecked { checked } => {
            session.acknowledge_checked = checked;
            render(services, session, &case_id)
        }
        Action::Acknowledge => acknowledge(services, session, &case_id),
        Action::Back => {
            session.selected_case_ref = None;
            session.acknowledge_checked = false;
            Outcome::go(Screen::Home, Trigger::Back)
        }
        Action::Logout => logout(services, session),
        other => {
            let rerender = render(services, session, &case_id);
            unsupported(Screen::AcknowledgeReport, &other, rerender)
        }
    }
}

fn render(services: &Services, session: &Session, case_id: &CaseId) -> Outcome {
    let case = match services.records.case(case_id) {
        Ok(Some(case)) => case,
        Ok(None) => {
            return Outcome::render(ScreenView::Blank).with(Notice::warning("Case not found."))
        }
        Err(e) => {
            tracing::error!("load case error: {:?}", e);
            return Outcome::render(ScreenView::Blank)
                .with(Notice::error("Could not load this report. Please try again."));
        }
    };

    let child_name = child_name(services, &case.child_id);
    let already_acknowledged = case.is_acknowledged();

    // Guidance falls back to the reported symptoms until the external guidance arrives.
    let guidance_text = case
        .ai_guidance
        .filter(|g| !g.trim().is_empty())
        .unwrap_or_else(|| case.symptom_description.into_inner());

    Outcome::render(ScreenView::AcknowledgeReport(AcknowledgeView {
        case_id: case.id.to_string(),
        child_name,
        submitted_at: format_timestamp(case.created_at),
        blurb: BLURB.to_string(),
        guidance_text,
        acknowledge_checked: session.acknowledge_checked,
        already_acknowledged,
    }))
}

fn acknowledge(services: &Services, session: &mut Session, case_id: &CaseId) -> Outcome {
    if !session.acknowledge_checked {
        return render(services, session, case_id).with(Notice::warning(
            "Please confirm you have read the guidance before acknowledging.",
        ));
    }

    match services.records.acknowledge_case(case_id) {
        Ok(AcknowledgeOutcome::Acknowledged(case)) => {
            tracing::info!("case {} acknowledged by parent", case.id);
            session.acknowledge_checked = false;
            session.selected_case_ref = None;
            Outcome::go(Screen::Home, Trigger::Acknowledged)
                .with(Notice::success("Thank you. The report has been acknowledged."))
        }
        Ok(AcknowledgeOutcome::AlreadyAcknowledged) => render(services, session, case_id)
            .with(Notice::info("This report has already been acknowledged.")),
        Ok(AcknowledgeOutcome::NotFound) => render(services, session, case_id),
        Err(e) => {
            tracing::error!("acknowledge case error: {:?}", e);
            render(services, session, case_id).with(Notice::error(
                "Could not acknowledge the report. Please try again.",
            ))
        }
    }
}
