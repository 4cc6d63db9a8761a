use super::{logout, require_auth, unsupported, Outcome};
use crate::constants::ACCEPTED_PHOTO_CONTENT_TYPES;
use crate::error::StoreResult;
use crate::gateway::ChildFilter;
use crate::ids::{ChildId, UserId};
use crate::records::{CaseStatus, ChildProfile, NewCaseReport};
use crate::router::{Screen, Services, Trigger};
use crate::session::Session;
use crate::validation::{parse_symptom_date, user_message, validate_photo, ValidatedPhoto};
use api_shared::{Action, ChildOption, Notice, PhotoUpload, ScreenView, SymptomEntryView};
use bewell_types::NonEmptyText;
use chrono::{Local, NaiveDate};
use std::collections::{BTreeSet, HashMap};

struct Submission {
    child_id: String,
    symptom_date: Option<String>,
    description: String,
    photo: Option<PhotoUpload>,
}

pub(crate) fn handle(services: &Services, session: &mut Session, action: Action) -> Outcome {
    let identity = match require_auth(session) {
        Ok(identity) => identity,
        Err(redirect) => return redirect,
    };

    if session.is_parent() {
        return Outcome::go(Screen::Home, Trigger::Redirect);
    }

    match action {
        Action::Render => render(services, session, &identity),
        Action::SubmitSymptoms {
            child_id,
            symptom_date,
            description,
            photo,
        } => submit(
            services,
            session,
            &identity,
            Submission {
                child_id,
                symptom_date,
                description,
                photo,
            },
        ),
        Action::Back => Outcome::go(Screen::Home, Trigger::Back),
        Action::Logout => logout(services, session),
        other => {
            let rerender = render(services, session, &identity);
            unsupported(Screen::SymptomEntry, &other, rerender)
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Children this user may report on, trying each tier in turn until one is non-empty:
/// assigned children, then children in the user's centres, then (if enabled) every child.
fn candidate_children(
    services: &Services,
    session: &Session,
    identity: &UserId,
) -> StoreResult<Vec<ChildProfile>> {
    let records = &services.records;

    let assigned = records.children(&ChildFilter::LinkedTo(identity.clone()))?;
    if !assigned.is_empty() {
        tracing::debug!("children for {} resolved from assignments", identity);
        return Ok(assigned);
    }

    if !session.organization_scopes.is_empty() {
        let in_centres = records.children(&ChildFilter::CentreIn(
            session.organization_scopes.clone(),
        ))?;
        if !in_centres.is_empty() {
            tracing::info!("children for {} resolved from centre scopes", identity);
            return Ok(in_centres);
        }
    }

    if !services.cfg.allow_unscoped_children() {
        tracing::info!("no assigned or centre children for {}", identity);
        return Ok(Vec::new());
    }

    let all = records.children(&ChildFilter::All)?;
    if !all.is_empty() {
        tracing::warn!(
            "no assigned or centre children for {}; offering all {} children",
            identity,
            all.len()
        );
    }
    Ok(all)
}

fn render(services: &Services, session: &mut Session, identity: &UserId) -> Outcome {
    match candidate_children(services, session, identity) {
        Ok(children) => form(services, session, &children),
        Err(e) => load_failed(e),
    }
}

fn load_failed(e: crate::error::StoreError) -> Outcome {
    tracing::error!("load children error: {:?}", e);
    Outcome::render(ScreenView::Blank)
        .with(Notice::error("Could not load children. Please try again."))
}

fn form(services: &Services, session: &mut Session, children: &[ChildProfile]) -> Outcome {
    if children.is_empty() {
        session.entry_children.clear();
        return Outcome::render(ScreenView::Blank)
            .with(Notice::warning("No children are linked to your account yet."));
    }

    session.entry_children = child_options(services, children);
    offered_form(session)
}

/// The form as last offered to this session. Reads nothing from the collaborators.
fn offered_form(session: &Session) -> Outcome {
    Outcome::render(ScreenView::SymptomEntry(SymptomEntryView {
        children: session.entry_children.clone(),
        default_date: today().format("%Y-%m-%d").to_string(),
        accepted_photo_types: ACCEPTED_PHOTO_CONTENT_TYPES
            .iter()
            .map(|t| t.to_string())
            .collect(),
    }))
}

/// Labels each child `Parent Name - Child Name` using the first listed parent, or just the
/// child's name when that parent cannot be resolved.
fn child_options(services: &Services, children: &[ChildProfile]) -> Vec<ChildOption> {
    let parent_ids: Vec<UserId> = children
        .iter()
        .filter_map(|c| c.parent_ids.first().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let parent_names: HashMap<UserId, String> = if parent_ids.is_empty() {
        HashMap::new()
    } else {
        match services.records.user_profiles(&parent_ids) {
            Ok(profiles) => profiles
                .into_iter()
                .filter_map(|p| {
                    let name = p.display_name?.trim().to_string();
                    (!name.is_empty()).then_some((p.id, name))
                })
                .collect(),
            Err(e) => {
                tracing::warn!("parent name lookup failed: {}", e);
                HashMap::new()
            }
        }
    };

    children
        .iter()
        .map(|child| {
            let parent = child
                .parent_ids
                .first()
                .and_then(|id| parent_names.get(id));
            let label = match parent {
                Some(parent) => format!("{} - {}", parent, child.full_name()),
                None => child.full_name(),
            };
            ChildOption {
                child_id: child.id.to_string(),
                label,
            }
        })
        .collect()
}

fn submit(
    services: &Services,
    session: &mut Session,
    identity: &UserId,
    submission: Submission,
) -> Outcome {
    // Field checks run before any collaborator call.
    let Ok(description) = NonEmptyText::new(&submission.description) else {
        return offered_form(session).with(Notice::warning(
            "Please describe the symptoms before submitting.",
        ));
    };

    let symptom_date = match parse_symptom_date(submission.symptom_date.as_deref(), today()) {
        Ok(date) => date,
        Err(e) => return offered_form(session).with(Notice::warning(user_message(&e))),
    };

    let photo = match submission.photo.as_ref().map(validate_photo).transpose() {
        Ok(photo) => photo,
        Err(e) => return offered_form(session).with(Notice::warning(user_message(&e))),
    };

    let children = match candidate_children(services, session, identity) {
        Ok(children) => children,
        Err(e) => return load_failed(e),
    };

    let child_id = ChildId::new(submission.child_id.trim());
    let Some(child) = children.iter().find(|c| c.id == child_id) else {
        return form(services, session, &children)
            .with(Notice::warning("Please choose one of the listed children."));
    };

    let photo_url = photo.and_then(|photo| upload_photo(services, identity, symptom_date, photo));

    let new_case = NewCaseReport {
        child_id: child.id.clone(),
        centre_id: child.centre_id.clone(),
        reported_by: identity.clone(),
        symptom_date,
        symptom_description: description,
        photo_url,
        status: CaseStatus::Pending,
    };

    match services.records.insert_case(new_case) {
        Ok(case) => {
            tracing::info!("user {} created case {}", identity, case.id);
            Outcome::go(Screen::Home, Trigger::Submitted).with(Notice::success(format!(
                "Case for {} saved!",
                child.first_name.trim()
            )))
        }
        Err(e) => {
            tracing::error!("insert case error: {:?}", e);
            offered_form(session).with(Notice::error("Could not save the case. Please try again."))
        }
    }
}

/// Best-effort upload. A failure is logged and the case is saved without a photo.
fn upload_photo(
    services: &Services,
    identity: &UserId,
    date: NaiveDate,
    photo: ValidatedPhoto,
) -> Option<String> {
    let path = format!("{}/{}_{}", identity, date.format("%Y-%m-%d"), photo.filename);
    match services
        .blobs
        .upload(&path, &photo.bytes, &photo.content_type)
    {
        Ok(()) => Some(services.blobs.public_url(&path)),
        Err(e) => {
            tracing::warn!("photo upload failed for {}, saving case without it: {}", path, e);
            None
        }
    }
}
