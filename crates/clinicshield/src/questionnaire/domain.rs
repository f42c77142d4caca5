use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a catalog evidence item. Equal to its DSPT ref (e.g. `1.1.1`).
    EvidenceItemId
);
string_id!(
    /// Identifier wrapper for an organisation's assessment.
    AssessmentId
);
string_id!(OrganisationId);
string_id!(
    /// Reference to an uploaded evidence file held by external storage.
    FileId
);

/// How an evidence item expects to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    YesNo,
    Text,
    Document,
    Date,
}

impl InputType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::YesNo => "yes_no",
            Self::Text => "text",
            Self::Document => "document",
            Self::Date => "date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "yes_no" => Some(Self::YesNo),
            "text" => Some(Self::Text),
            "document" => Some(Self::Document),
            "date" => Some(Self::Date),
            _ => None,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Answer to a `yes_no` evidence item. Every variant counts as filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNoValue {
    Yes,
    No,
    Partial,
    NotSure,
    NotApplicable,
}

impl YesNoValue {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Yes,
            Self::No,
            Self::Partial,
            Self::NotSure,
            Self::NotApplicable,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Partial => "partial",
            Self::NotSure => "not_sure",
            Self::NotApplicable => "not_applicable",
        }
    }

    /// Short label shown next to the radio option.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::Partial => "Partial",
            Self::NotSure => "Not sure",
            Self::NotApplicable => "N/A",
        }
    }
}

/// Certifications that waive an evidence requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exemption {
    NhsMail,
    CyberEssentialsPlus,
    Iso27001,
    PsnIa,
    Audit,
}

impl Exemption {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "nhs_mail" => Some(Self::NhsMail),
            "cyber_essentials_plus" => Some(Self::CyberEssentialsPlus),
            "iso27001" => Some(Self::Iso27001),
            "psn_ia" => Some(Self::PsnIa),
            "audit" => Some(Self::Audit),
            _ => None,
        }
    }
}

/// One of the ten National Data Guardian data security standards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standard {
    pub number: u32,
    pub title: String,
    pub description: String,
}

/// Assertion grouping evidence items under a standard (e.g. `1.1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub reference: String,
    pub title: String,
    pub standard_number: u32,
}

/// A question users must answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: EvidenceItemId,
    pub reference: String,
    pub assertion_ref: String,
    pub standard_number: u32,
    pub input_type: InputType,
    /// Official DSPT question text.
    pub evidence_text: String,
    pub tooltip: Option<String>,
    pub plain_english_question: String,
    pub clinic_help: String,
    /// Required for "Standards Met".
    pub mandatory: bool,
    /// Required for "Approaching Standards".
    pub approaching_mandatory: bool,
    pub exemptions: Vec<Exemption>,
    pub change_from_v7: Option<String>,
    pub new_in_v8: bool,
}

/// Stored response to one evidence item within one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub assessment_id: AssessmentId,
    pub evidence_item_id: EvidenceItemId,
    #[serde(default)]
    pub yes_no_value: Option<YesNoValue>,
    #[serde(default)]
    pub text_value: Option<String>,
    #[serde(default)]
    pub file_id: Option<FileId>,
    #[serde(default)]
    pub comments: Option<String>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// The answer fields alone, detached from any assessment. Used by callers
/// that only need scoring (e.g. the CLI `score` command).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerValues {
    #[serde(default)]
    pub yes_no_value: Option<YesNoValue>,
    #[serde(default)]
    pub text_value: Option<String>,
    #[serde(default)]
    pub file_id: Option<FileId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    InProgress,
    Completed,
    Submitted,
}

/// One organisation's run through the catalog for a DSPT year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub organisation_id: OrganisationId,
    pub dspt_year: String,
    pub status: AssessmentStatus,
    pub completion_percent: f64,
    pub last_activity_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganisationType {
    Gp,
    Dental,
    Pharmacy,
    Optician,
    Other,
}

/// A healthcare organisation completing the toolkit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
    pub id: OrganisationId,
    pub name: String,
    pub organisation_type: OrganisationType,
    pub ods_code: Option<String>,
    pub ico_registration_number: Option<String>,
    pub staff_count: Option<u32>,
    pub onboarding_complete: bool,
    pub created_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    PracticeManager,
    IgLead,
    CaldicottGuardian,
    Admin,
    Viewer,
}

/// Local record of an authenticated person, keyed by the auth provider's subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub organisation_id: Option<OrganisationId>,
    pub role: UserRole,
}

/// Caller identity as asserted by the upstream authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            name: None,
        }
    }
}
