use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::matching::domain::{
    Application, Company, CompanyId, Notification, NotificationId, NotificationKind, Offer,
    OfferId, RecipientKind, Student, StudentId,
};
use crate::workflows::matching::port::{PortError, RemotePort};
use crate::workflows::matching::{matching_router, MatchingService, WorkflowCoordinator};

/// Which port calls should fail.
#[derive(Debug, Default, Clone)]
pub(super) struct Failures {
    pub(super) create_application: Option<PortError>,
    pub(super) application_exists: Option<PortError>,
    pub(super) create_notification: Option<PortError>,
    pub(super) update_response: Option<PortError>,
    pub(super) fetch_notification: Option<PortError>,
    pub(super) fetch_offer: Option<PortError>,
    pub(super) fetch_company: Option<PortError>,
}

/// Port double that records every write in call order.
#[derive(Default)]
pub(super) struct RecordingPort {
    pub(super) failures: Mutex<Failures>,
    pub(super) applications: Mutex<Vec<Application>>,
    pub(super) existing: Mutex<HashSet<(StudentId, OfferId)>>,
    pub(super) notifications: Mutex<HashMap<NotificationId, Notification>>,
    pub(super) created_notifications: Mutex<Vec<Notification>>,
    pub(super) updates: Mutex<Vec<(NotificationId, String)>>,
    pub(super) calls: Mutex<Vec<&'static str>>,
    pub(super) offers: Mutex<HashMap<OfferId, Offer>>,
    pub(super) companies: Mutex<HashMap<CompanyId, Company>>,
    next_id: Mutex<u64>,
}

impl RecordingPort {
    pub(super) fn fail(&self, configure: impl FnOnce(&mut Failures)) {
        let mut guard = self.failures.lock().expect("failures mutex poisoned");
        configure(&mut *guard);
    }

    pub(super) fn seed_notification(&self, notification: Notification) {
        let id = notification.id.expect("seeded notifications carry an id");
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .insert(id, notification);
    }

    pub(super) fn seed_offer(&self, offer: Offer) {
        self.offers
            .lock()
            .expect("offer mutex poisoned")
            .insert(offer.id, offer);
    }

    pub(super) fn seed_company(&self, company: Company) {
        self.companies
            .lock()
            .expect("company mutex poisoned")
            .insert(company.id, company);
    }

    pub(super) fn created_notifications(&self) -> Vec<Notification> {
        self.created_notifications
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }

    pub(super) fn applications(&self) -> Vec<Application> {
        self.applications
            .lock()
            .expect("application mutex poisoned")
            .clone()
    }

    pub(super) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }

    fn failure(&self, select: impl FnOnce(&Failures) -> Option<PortError>) -> Result<(), PortError> {
        let guard = self.failures.lock().expect("failures mutex poisoned");
        match select(&*guard) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemotePort for RecordingPort {
    async fn create_application(
        &self,
        application: Application,
    ) -> Result<Application, PortError> {
        self.record("create_application");
        self.failure(|f| f.create_application.clone())?;
        self.applications
            .lock()
            .expect("application mutex poisoned")
            .push(application.clone());
        Ok(application)
    }

    async fn application_exists(
        &self,
        student_id: StudentId,
        offer_id: OfferId,
    ) -> Result<bool, PortError> {
        self.record("application_exists");
        self.failure(|f| f.application_exists.clone())?;
        Ok(self
            .existing
            .lock()
            .expect("existing mutex poisoned")
            .contains(&(student_id, offer_id)))
    }

    async fn create_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, PortError> {
        self.record("create_notification");
        self.failure(|f| f.create_notification.clone())?;
        let mut next_id = self.next_id.lock().expect("id mutex poisoned");
        *next_id += 1;
        let stored = Notification {
            id: Some(NotificationId(1000 + *next_id)),
            ..notification.clone()
        };
        self.created_notifications
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(stored)
    }

    async fn update_notification_response(
        &self,
        id: NotificationId,
        status: &str,
    ) -> Result<(), PortError> {
        self.record("update_notification_response");
        self.failure(|f| f.update_response.clone())?;
        self.updates
            .lock()
            .expect("updates mutex poisoned")
            .push((id, status.to_string()));
        if let Some(existing) = self
            .notifications
            .lock()
            .expect("notification mutex poisoned")
            .get_mut(&id)
        {
            existing.response_status = Some(status.to_string());
        }
        Ok(())
    }

    async fn notification_by_id(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, PortError> {
        self.record("notification_by_id");
        self.failure(|f| f.fetch_notification.clone())?;
        Ok(self
            .notifications
            .lock()
            .expect("notification mutex poisoned")
            .get(&id)
            .cloned())
    }

    async fn notifications_for(
        &self,
        recipient: RecipientKind,
        recipient_id: u64,
    ) -> Result<Vec<Notification>, PortError> {
        self.record("notifications_for");
        Ok(self
            .notifications
            .lock()
            .expect("notification mutex poisoned")
            .values()
            .filter(|notification| notification.addressed_to(recipient, recipient_id))
            .cloned()
            .collect())
    }

    async fn offer_by_id(&self, id: OfferId) -> Result<Option<Offer>, PortError> {
        self.record("offer_by_id");
        self.failure(|f| f.fetch_offer.clone())?;
        Ok(self.offers.lock().expect("offer mutex poisoned").get(&id).cloned())
    }

    async fn company_by_id(&self, id: CompanyId) -> Result<Option<Company>, PortError> {
        self.record("company_by_id");
        self.failure(|f| f.fetch_company.clone())?;
        Ok(self
            .companies
            .lock()
            .expect("company mutex poisoned")
            .get(&id)
            .cloned())
    }

    async fn student_by_id(&self, _id: StudentId) -> Result<Option<Student>, PortError> {
        self.record("student_by_id");
        Ok(None)
    }
}

pub(super) fn offer(id: u64, company: Option<u64>) -> Offer {
    Offer {
        id: OfferId(id),
        company_id: company.map(CompanyId),
        title: "Backend internship".to_string(),
        description: "Rust services for the matching platform".to_string(),
        location: Some("Madrid".to_string()),
        duration: Some("6 months".to_string()),
    }
}

pub(super) fn company(id: u64) -> Company {
    Company {
        id: CompanyId(id),
        name: "Torre Software".to_string(),
        sector: Some("Software".to_string()),
        contact_email: Some("talent@torre.example".to_string()),
    }
}

/// Notification 5 addressed to company 9 about student 7 applying to offer 42.
pub(super) fn company_bound_notification() -> Notification {
    Notification {
        id: Some(NotificationId(5)),
        kind: NotificationKind::Application,
        message: "Un alumno ha aplicado a tu oferta.".to_string(),
        student_id: Some(StudentId(7)),
        offer_id: Some(OfferId(42)),
        company_id: Some(CompanyId(9)),
        recipient: RecipientKind::Company,
        response_status: None,
    }
}

pub(super) fn student_bound_notification() -> Notification {
    Notification {
        id: Some(NotificationId(6)),
        kind: NotificationKind::Response,
        message: "El alumno ha mostrado interés mutuo en tu oferta.".to_string(),
        recipient: RecipientKind::Student,
        ..company_bound_notification()
    }
}

pub(super) fn build_coordinator() -> (WorkflowCoordinator<RecordingPort>, Arc<RecordingPort>) {
    let port = Arc::new(RecordingPort::default());
    (WorkflowCoordinator::new(port.clone()), port)
}

pub(super) fn router_with_port(port: Arc<RecordingPort>) -> axum::Router {
    router_with_sessions(port, 8, Duration::from_secs(3600))
}

pub(super) fn router_with_sessions(
    port: Arc<RecordingPort>,
    max_sessions: usize,
    idle_ttl: Duration,
) -> axum::Router {
    matching_router(Arc::new(MatchingService::new(port, max_sessions, idle_ttl)))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
