use super::{logout, require_auth, unsupported, Outcome};
use crate::constants::{SYMPTOM_EXCERPT_CHARS, UNKNOWN_CHILD};
use crate::error::StoreResult;
use crate::format::{format_date, truncate};
use crate::gateway::{CaseFilter, CaseQuery, ChildFilter};
use crate::ids::{CaseId, ChildId, UserId};
use crate::records::{CaseReport, ChildProfile, Role};
use crate::router::{Screen, Services, Trigger};
use crate::session::Session;
use api_shared::{Action, CaseSummary, HomeView, Notice, ScreenView};
use std::collections::{BTreeSet, HashMap};

/// A listed case with its resolved child name.
struct Listed {
    case: CaseReport,
    child_name: String,
}

pub(crate) fn handle(services: &Services, session: &mut Session, action: Action) -> Outcome {
    let identity = match require_auth(session) {
        Ok(identity) => identity,
        Err(redirect) => return redirect,
    };

    match action {
        Action::Render => render(session, list_cases(services, session, &identity)),
        Action::NewCase if session.is_parent() => {
            render(session, list_cases(services, session, &identity))
                .with(Notice::warning("Only carers can create new cases."))
        }
        Action::NewCase => Outcome::go(Screen::SymptomEntry, Trigger::NewCase),
        Action::SelectCase { case_id } => select(services, session, &identity, &case_id),
        Action::Logout => logout(services, session),
        other => {
            let rerender = render(session, list_cases(services, session, &identity));
            unsupported(Screen::Home, &other, rerender)
        }
    }
}

fn title(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Parent) => "Parent Home",
        Some(Role::Carer) => "Carer Home",
        None => "Home",
    }
}

fn render(session: &Session, listing: StoreResult<Vec<Listed>>) -> Outcome {
    let is_parent = session.is_parent();
    let (cases, notice) = match listing {
        Ok(listed) => (listed, None),
        Err(e) => {
            tracing::error!("list cases error: {:?}", e);
            (
                Vec::new(),
                Some(Notice::error("Could not load cases. Please try again.")),
            )
        }
    };

    let empty_message = match (&notice, cases.is_empty(), is_parent) {
        (None, true, true) => Some("No cases for your children yet.".to_string()),
        (None, true, false) => Some("No cases yet. Tap New Case to get started.".to_string()),
        _ => None,
    };

    let view = HomeView {
        title: title(session.role).to_string(),
        can_create_case: !is_parent,
        cases: cases.into_iter().map(summary).collect(),
        empty_message,
    };

    let outcome = Outcome::render(ScreenView::Home(view));
    match notice {
        Some(notice) => outcome.with(notice),
        None => outcome,
    }
}

fn summary(listed: Listed) -> CaseSummary {
    let case = listed.case;
    CaseSummary {
        case_id: case.id.to_string(),
        date: format_date(case.symptom_date),
        child_name: listed.child_name,
        symptom_excerpt: truncate(case.symptom_description.as_str(), SYMPTOM_EXCERPT_CHARS),
        photo_url: case.photo_url,
        status: case.status.as_str().to_string(),
    }
}

/// The cases this user may see: their children's cases for a parent, their own reports
/// otherwise.
fn list_cases(
    services: &Services,
    session: &Session,
    identity: &UserId,
) -> StoreResult<Vec<Listed>> {
    let records = &services.records;
    let limit = services.cfg.recent_cases_limit();

    if session.is_parent() {
        let children = records.children(&ChildFilter::ParentOf(identity.clone()))?;
        if children.is_empty() {
            return Ok(Vec::new());
        }

        let ids = children.iter().map(|c| c.id.clone()).collect();
        let cases = records.cases(&CaseQuery {
            filter: CaseFilter::ChildIn(ids),
            limit,
        })?;
        return Ok(with_names(cases, &names_by_id(&children)));
    }

    let cases = records.cases(&CaseQuery {
        filter: CaseFilter::ReportedBy(identity.clone()),
        limit,
    })?;
    if cases.is_empty() {
        return Ok(Vec::new());
    }

    let child_ids: BTreeSet<ChildId> = cases.iter().map(|c| c.child_id.clone()).collect();
    let names = match records.children(&ChildFilter::Ids(child_ids.into_iter().collect())) {
        Ok(children) => names_by_id(&children),
        Err(e) => {
            tracing::warn!("child name lookup failed: {}", e);
            HashMap::new()
        }
    };

    Ok(with_names(cases, &names))
}

fn names_by_id(children: &[ChildProfile]) -> HashMap<ChildId, String> {
    children
        .iter()
        .map(|c| (c.id.clone(), c.full_name()))
        .collect()
}

fn with_names(cases: Vec<CaseReport>, names: &HashMap<ChildId, String>) -> Vec<Listed> {
    cases
        .into_iter()
        .map(|case| {
            let child_name = names
                .get(&case.child_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_CHILD.to_string());
            Listed { case, child_name }
        })
        .collect()
}

fn select(services: &Services, session: &mut Session, identity: &UserId, raw: &str) -> Outcome {
    let listing = match list_cases(services, session, identity) {
        Ok(listing) => listing,
        Err(e) => return render(session, Err(e)),
    };

    let case_id = CaseId::new(raw.trim());
    if !listing.iter().any(|l| l.case.id == case_id) {
        tracing::warn!("user {} selected case {} outside their listing", identity, case_id);
        return render(session, Ok(listing)).with(Notice::warning("That case is not available."));
    }

    session.selected_case_ref = Some(case_id);
    session.acknowledge_checked = false;

    let to = if session.is_parent() {
        Screen::AcknowledgeReport
    } else {
        Screen::CaseDetails
    };
    Outcome::go(to, Trigger::SelectCase)
}
