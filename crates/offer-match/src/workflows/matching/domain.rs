use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered student.
    StudentId
);
entity_id!(
    /// Identifier of a published offer.
    OfferId
);
entity_id!(
    /// Identifier of a company profile.
    CompanyId
);
entity_id!(NotificationId);

/// Job or internship posting owned by a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub company_id: Option<CompanyId>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

/// Lifecycle label stored on an application. New applications always start pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
        }
    }
}

/// A student's request to be considered for an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub student_id: StudentId,
    pub offer_id: OfferId,
    pub applied_at: Option<DateTime<Utc>>,
    pub status: ApplicationStatus,
}

impl Application {
    /// New pending application; the timestamp is left for the storage side to stamp.
    pub fn pending(student_id: StudentId, offer_id: OfferId) -> Self {
        Self {
            student_id,
            offer_id,
            applied_at: None,
            status: ApplicationStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Application,
    Response,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::Application => "application",
            NotificationKind::Response => "response",
        }
    }
}

/// Party a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    Student,
    Company,
}

impl RecipientKind {
    pub const fn label(self) -> &'static str {
        match self {
            RecipientKind::Student => "student",
            RecipientKind::Company => "company",
        }
    }

    /// Recipient of a reply to a notification addressed to `original`.
    ///
    /// Replies to company-bound notifications go to the student; everything else,
    /// including an unknown original recipient, goes to the company.
    pub fn reply_to(original: Option<RecipientKind>) -> RecipientKind {
        match original {
            Some(RecipientKind::Company) => RecipientKind::Student,
            _ => RecipientKind::Company,
        }
    }
}

/// Recognised answers to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    MutualInterest,
    NotInterested,
    Selected,
    Rejected,
}

impl ResponseStatus {
    pub const ALL: [ResponseStatus; 4] = [
        ResponseStatus::MutualInterest,
        ResponseStatus::NotInterested,
        ResponseStatus::Selected,
        ResponseStatus::Rejected,
    ];

    /// Stored representation shared with the remote API.
    pub const fn code(self) -> &'static str {
        match self {
            ResponseStatus::MutualInterest => "inter_mutuo",
            ResponseStatus::NotInterested => "no_interesado",
            ResponseStatus::Selected => "seleccionado",
            ResponseStatus::Rejected => "descartado",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Text of the reciprocal notification sent after this answer.
    pub const fn follow_up_message(self) -> &'static str {
        match self {
            ResponseStatus::MutualInterest => "El alumno ha mostrado interés mutuo en tu oferta.",
            ResponseStatus::NotInterested => "El alumno no está interesado en tu oferta.",
            ResponseStatus::Selected => "Has sido seleccionado para la oferta.",
            ResponseStatus::Rejected => "No has sido seleccionado para la oferta.",
        }
    }
}

/// Message for the follow-up notification, or `None` when the code is not recognised.
pub fn follow_up_message(code: &str) -> Option<&'static str> {
    ResponseStatus::from_code(code).map(ResponseStatus::follow_up_message)
}

pub const APPLICATION_RECEIVED_MESSAGE: &str = "Un alumno ha aplicado a tu oferta.";

/// Message addressed to a student or company.
///
/// `id` is assigned by the port on creation. `response_status` keeps the raw code
/// because the port accepts codes outside the recognised set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub id: Option<NotificationId>,
    pub kind: NotificationKind,
    pub message: String,
    pub student_id: Option<StudentId>,
    pub offer_id: Option<OfferId>,
    pub company_id: Option<CompanyId>,
    pub recipient: RecipientKind,
    #[serde(default)]
    pub response_status: Option<String>,
}

impl Notification {
    /// Notice sent to the owning company when a student applies.
    pub fn application_received(
        student_id: StudentId,
        offer_id: OfferId,
        company_id: Option<CompanyId>,
    ) -> Self {
        Self {
            id: None,
            kind: NotificationKind::Application,
            message: APPLICATION_RECEIVED_MESSAGE.to_string(),
            student_id: Some(student_id),
            offer_id: Some(offer_id),
            company_id,
            recipient: RecipientKind::Company,
            response_status: None,
        }
    }

    /// Reciprocal notification for an answer to `original`.
    ///
    /// Returns `None` when `code` is not a recognised response, in which case no
    /// follow-up is sent. A missing original yields a reply without references.
    pub fn reply(original: Option<&Notification>, code: &str) -> Option<Self> {
        let message = follow_up_message(code)?;
        Some(Self {
            id: None,
            kind: NotificationKind::Response,
            message: message.to_string(),
            student_id: original.and_then(|n| n.student_id),
            offer_id: original.and_then(|n| n.offer_id),
            company_id: original.and_then(|n| n.company_id),
            recipient: RecipientKind::reply_to(original.map(|n| n.recipient)),
            response_status: Some(code.to_string()),
        })
    }

    pub fn is_responded(&self) -> bool {
        self.response_status.is_some()
    }

    /// Whether this notification is addressed to the given party.
    pub fn addressed_to(&self, recipient: RecipientKind, id: u64) -> bool {
        if self.recipient != recipient {
            return false;
        }
        match recipient {
            RecipientKind::Student => self.student_id == Some(StudentId(id)),
            RecipientKind::Company => self.company_id == Some(CompanyId(id)),
        }
    }
}
