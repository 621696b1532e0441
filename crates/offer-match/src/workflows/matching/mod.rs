//! Offer applications and the notifications exchanged between students and companies.
//!
//! The coordinator drives a [`RemotePort`] through short, strictly sequential workflows and
//! writes the outcome into the caller's [`OfferDetailState`]. Sessions own that state and
//! are opened and closed through the [`SessionStore`].

pub mod coordinator;
pub mod domain;
pub mod port;
pub mod router;
pub mod saga;
pub mod session;
pub mod state;

#[cfg(test)]
mod tests;

pub use coordinator::{ApplyReport, RespondReport, WorkflowCoordinator};
pub use domain::{
    follow_up_message, Application, ApplicationStatus, Company, CompanyId, Notification,
    NotificationId, NotificationKind, Offer, OfferId, RecipientKind, ResponseStatus, Student,
    StudentId, APPLICATION_RECEIVED_MESSAGE,
};
pub use port::{PortError, RemotePort};
pub use router::{
    matching_router, MatchingService, RespondRequest, RespondResponse, WorkflowResponse,
};
pub use saga::{StepOutcome, StepPolicy, StepRecord, Workflow, WorkflowStep, WorkflowTrace};
pub use session::{
    SessionContext, SessionError, SessionId, SessionStore, SessionUser, SharedSession,
};
pub use state::OfferDetailState;
