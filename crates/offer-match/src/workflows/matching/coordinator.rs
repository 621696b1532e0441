use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{Application, Notification, NotificationId, OfferId, Student, StudentId};
use super::port::{PortError, RemotePort};
use super::saga::{Workflow, WorkflowStep, WorkflowTrace};
use super::session::SessionUser;
use super::state::OfferDetailState;

/// Result of an apply-to-offer run.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub succeeded: bool,
    pub application: Option<Application>,
    pub notification: Option<Notification>,
    pub trace: WorkflowTrace,
}

/// Result of a respond-to-notification run.
#[derive(Debug, Clone, Serialize)]
pub struct RespondReport {
    pub updated: bool,
    pub follow_up: Option<Notification>,
    pub trace: WorkflowTrace,
}

/// Runs the matching workflows against a remote port.
///
/// Each operation issues its port calls strictly in sequence and converts every failure
/// into view-state flags plus a per-step trace. Nothing is retried or rolled back.
pub struct WorkflowCoordinator<P> {
    port: Arc<P>,
}

impl<P> Clone for WorkflowCoordinator<P> {
    fn clone(&self) -> Self {
        Self {
            port: Arc::clone(&self.port),
        }
    }
}

impl<P> WorkflowCoordinator<P>
where
    P: RemotePort + 'static,
{
    pub fn new(port: Arc<P>) -> Self {
        Self { port }
    }

    /// Load an offer and, when it names one, its company.
    ///
    /// A failed offer fetch leaves the state untouched. A successful fetch replaces both
    /// fields so the company never belongs to a different offer.
    pub async fn load_offer_with_company(
        &self,
        state: &mut OfferDetailState,
        offer_id: OfferId,
    ) -> WorkflowTrace {
        let mut trace = WorkflowTrace::new(Workflow::LoadOffer);

        let offer = match self.port.offer_by_id(offer_id).await {
            Ok(offer) => {
                trace.completed(WorkflowStep::FetchOffer);
                offer
            }
            Err(err) => {
                warn!(%offer_id, error = %err, "failed to load offer");
                trace.failed(WorkflowStep::FetchOffer, &err);
                return trace;
            }
        };

        let company_id = offer.as_ref().map(|offer| offer.company_id);
        state.offer = offer;
        state.company = None;

        let company_id = match company_id {
            Some(Some(company_id)) => company_id,
            Some(None) => {
                trace.skipped(WorkflowStep::FetchCompany, "offer has no company");
                return trace;
            }
            None => {
                debug!(%offer_id, "offer not found");
                trace.skipped(WorkflowStep::FetchCompany, "offer not found");
                return trace;
            }
        };

        match self.port.company_by_id(company_id).await {
            Ok(company) => {
                trace.completed(WorkflowStep::FetchCompany);
                state.company = company;
            }
            Err(err) => {
                warn!(%offer_id, %company_id, error = %err, "failed to load company");
                trace.failed(WorkflowStep::FetchCompany, &err);
            }
        }

        trace
    }

    /// Record whether the student already applied. This is a hint for presentation; the
    /// port still enforces uniqueness when the application is created.
    pub async fn check_existing_application(
        &self,
        state: &mut OfferDetailState,
        student_id: StudentId,
        offer_id: OfferId,
    ) -> WorkflowTrace {
        let mut trace = WorkflowTrace::new(Workflow::CheckApplication);

        state.already_applied = match self.port.application_exists(student_id, offer_id).await {
            Ok(exists) => {
                trace.completed(WorkflowStep::CheckApplication);
                exists
            }
            Err(err) => {
                warn!(%student_id, %offer_id, error = %err, "application lookup failed");
                trace.failed(WorkflowStep::CheckApplication, &err);
                false
            }
        };

        trace
    }

    pub async fn apply_to_offer(
        &self,
        state: &mut OfferDetailState,
        student_id: StudentId,
        offer_id: OfferId,
    ) -> ApplyReport {
        let mut trace = WorkflowTrace::new(Workflow::Apply);
        info!(%student_id, %offer_id, "submitting application");

        let application = match self
            .port
            .create_application(Application::pending(student_id, offer_id))
            .await
        {
            Ok(application) => {
                trace.completed(WorkflowStep::CreateApplication);
                application
            }
            Err(err) => {
                warn!(%student_id, %offer_id, error = %err, "application rejected");
                trace.failed(WorkflowStep::CreateApplication, &err);
                trace.skipped(WorkflowStep::NotifyCompany, "application was not created");
                state.application_succeeded = Some(false);
                return ApplyReport {
                    succeeded: false,
                    application: None,
                    notification: None,
                    trace,
                };
            }
        };
        state.application_succeeded = Some(true);

        let company_id = state.company.as_ref().map(|company| company.id);
        let notice = Notification::application_received(student_id, offer_id, company_id);
        let notification = match self.port.create_notification(notice).await {
            Ok(created) => {
                info!(%student_id, %offer_id, ?company_id, "company notified of application");
                trace.completed(WorkflowStep::NotifyCompany);
                Some(created)
            }
            Err(err) => {
                warn!(%student_id, %offer_id, error = %err, "company notification failed");
                trace.failed(WorkflowStep::NotifyCompany, &err);
                None
            }
        };

        ApplyReport {
            succeeded: true,
            application: Some(application),
            notification,
            trace,
        }
    }

    /// Store a response on a notification and send the reciprocal notification.
    ///
    /// Codes outside the recognised set are stored but produce no follow-up.
    pub async fn respond_to_notification(
        &self,
        notification_id: NotificationId,
        status: &str,
    ) -> RespondReport {
        let mut trace = WorkflowTrace::new(Workflow::Respond);

        if let Err(err) = self
            .port
            .update_notification_response(notification_id, status)
            .await
        {
            warn!(%notification_id, status, error = %err, "failed to update notification");
            trace.failed(WorkflowStep::UpdateResponse, &err);
            return RespondReport {
                updated: false,
                follow_up: None,
                trace,
            };
        }
        trace.completed(WorkflowStep::UpdateResponse);

        let original = match self.port.notification_by_id(notification_id).await {
            Ok(Some(original)) => {
                trace.completed(WorkflowStep::FetchOriginal);
                Some(original)
            }
            Ok(None) => {
                warn!(%notification_id, "responded notification is no longer available");
                trace.failed(WorkflowStep::FetchOriginal, &PortError::NotFound);
                None
            }
            Err(err) => {
                warn!(%notification_id, error = %err, "failed to fetch responded notification");
                trace.failed(WorkflowStep::FetchOriginal, &err);
                None
            }
        };

        let Some(reply) = Notification::reply(original.as_ref(), status) else {
            warn!(%notification_id, status, "unrecognised response status, no follow-up sent");
            trace.skipped(WorkflowStep::CreateFollowUp, "unrecognised response status");
            return RespondReport {
                updated: true,
                follow_up: None,
                trace,
            };
        };

        let recipient = reply.recipient;
        let follow_up = match self.port.create_notification(reply).await {
            Ok(created) => {
                info!(%notification_id, status, recipient = recipient.label(), "follow-up sent");
                trace.completed(WorkflowStep::CreateFollowUp);
                Some(created)
            }
            Err(err) => {
                warn!(%notification_id, status, error = %err, "follow-up notification failed");
                trace.failed(WorkflowStep::CreateFollowUp, &err);
                None
            }
        };

        RespondReport {
            updated: true,
            follow_up,
            trace,
        }
    }

    /// Expose a notification's response status and kind. Both are cleared when the
    /// notification is missing or the fetch fails.
    pub async fn load_notification_status(
        &self,
        state: &mut OfferDetailState,
        notification_id: NotificationId,
    ) -> WorkflowTrace {
        let mut trace = WorkflowTrace::new(Workflow::LoadStatus);

        let notification = match self.port.notification_by_id(notification_id).await {
            Ok(notification) => {
                trace.completed(WorkflowStep::FetchNotification);
                notification
            }
            Err(err) => {
                warn!(%notification_id, error = %err, "failed to load notification status");
                trace.failed(WorkflowStep::FetchNotification, &err);
                None
            }
        };

        debug!(
            %notification_id,
            status = ?notification.as_ref().and_then(|n| n.response_status.as_deref()),
            "notification status loaded"
        );
        state.response_status = notification
            .as_ref()
            .and_then(|n| n.response_status.clone());
        state.notification_kind = notification.map(|n| n.kind);

        trace
    }

    /// Single notification lookup, used to check who may answer it.
    pub async fn notification(
        &self,
        notification_id: NotificationId,
    ) -> Result<Option<Notification>, PortError> {
        self.port.notification_by_id(notification_id).await
    }

    /// Applicant profile shown to a company reviewing a notification.
    pub async fn student_profile(&self, student_id: StudentId) -> Result<Option<Student>, PortError> {
        self.port.student_by_id(student_id).await
    }

    /// Notifications addressed to the signed-in party.
    pub async fn inbox(&self, user: SessionUser) -> Result<Vec<Notification>, PortError> {
        self.port
            .notifications_for(user.recipient(), user.raw_id())
            .await
    }
}
