//! Request and response types for the screen API.
//!
//! A client sends one [`ActionReq`] per user interaction and receives a [`ScreenRes`]: the
//! screen it is now on, that screen's view model and any notices to show. Views carry display
//! strings only; layout and styling are the client's business.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateSessionRes {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EndSessionRes {
    pub ended: bool,
}

/// A photo attached to a symptom submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PhotoUpload {
    /// Original filename as picked by the user
    pub filename: String,
    /// `image/png` or `image/jpeg`
    pub content_type: String,
    /// Standard base64 of the file bytes
    pub data_base64: String,
}

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Render the current screen without doing anything else
    Render,
    Login {
        email: String,
        password: String,
    },
    Logout,
    NewCase,
    SelectCase {
        case_id: String,
    },
    Back,
    SubmitSymptoms {
        child_id: String,
        /// `YYYY-MM-DD`; today when absent
        #[serde(default)]
        symptom_date: Option<String>,
        description: String,
        #[serde(default)]
        photo: Option<PhotoUpload>,
    },
    SetAcknowledgeChecked {
        checked: bool,
    },
    Acknowledge,
}

impl Action {
    /// Wire name of the action, as used in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Render => "render",
            Action::Login { .. } => "login",
            Action::Logout => "logout",
            Action::NewCase => "new_case",
            Action::SelectCase { .. } => "select_case",
            Action::Back => "back",
            Action::SubmitSymptoms { .. } => "submit_symptoms",
            Action::SetAcknowledgeChecked { .. } => "set_acknowledge_checked",
            Action::Acknowledge => "acknowledge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActionReq {
    /// Screen the client believes it is acting on. A mismatch means the client is stale and
    /// the action is not applied.
    #[serde(default)]
    pub on_screen: Option<String>,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoginView {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CaseSummary {
    pub case_id: String,
    /// Symptom date, e.g. `05 Jan 2024`
    pub date: String,
    pub child_name: String,
    pub symptom_excerpt: String,
    pub photo_url: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HomeView {
    pub title: String,
    pub can_create_case: bool,
    pub cases: Vec<CaseSummary>,
    /// Shown instead of the list when there are no cases
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChildOption {
    pub child_id: String,
    /// `Parent Name - Child Name` when the parent is known
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SymptomEntryView {
    pub children: Vec<ChildOption>,
    /// `YYYY-MM-DD`
    pub default_date: String,
    pub accepted_photo_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CaseDetailsView {
    pub case_id: String,
    pub child_name: String,
    pub submitted_at: String,
    pub symptom_date: String,
    pub symptom_description: String,
    pub photo_url: Option<String>,
    pub status: String,
    pub ai_recommendation: String,
    pub ai_category: String,
    pub ai_guidance: String,
    pub red_flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AcknowledgeView {
    pub case_id: String,
    pub child_name: String,
    pub submitted_at: String,
    pub blurb: String,
    pub guidance_text: String,
    pub acknowledge_checked: bool,
    pub already_acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScreenView {
    Login(LoginView),
    Home(HomeView),
    SymptomEntry(SymptomEntryView),
    CaseDetails(CaseDetailsView),
    AcknowledgeReport(AcknowledgeView),
    /// Nothing to show beyond the notices
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScreenRes {
    pub screen: String,
    pub display_name: Option<String>,
    pub avatar_initial: Option<String>,
    pub notices: Vec<Notice>,
    pub view: ScreenView,
}
