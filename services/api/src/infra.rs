use async_trait::async_trait;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use offer_match::workflows::matching::{
    Application, Company, CompanyId, Notification, NotificationId, Offer, OfferId, PortError,
    RecipientKind, RemotePort, Student, StudentId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct Tables {
    offers: HashMap<OfferId, Offer>,
    companies: HashMap<CompanyId, Company>,
    students: HashMap<StudentId, Student>,
    applications: HashMap<(StudentId, OfferId), Application>,
    notifications: BTreeMap<NotificationId, Notification>,
    next_notification: u64,
}

/// Process-local stand-in for the remote API.
///
/// Enforces the storage-side rules the coordinator relies on: one application per
/// (student, offer) pair and a single write of each notification's response status.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRemotePort {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRemotePort {
    /// Port preloaded with a company, an offer, and a student for demos.
    pub(crate) fn seeded() -> Self {
        let port = Self::default();
        port.insert_company(Company {
            id: CompanyId(9),
            name: "Torre Software".to_string(),
            sector: Some("Software".to_string()),
            contact_email: Some("talent@torre.example".to_string()),
        });
        port.insert_offer(Offer {
            id: OfferId(42),
            company_id: Some(CompanyId(9)),
            title: "Backend internship".to_string(),
            description: "Build the services behind the matching platform.".to_string(),
            location: Some("Madrid".to_string()),
            duration: Some("6 months".to_string()),
        });
        port.insert_student(Student {
            id: StudentId(7),
            name: "Lucía Torres".to_string(),
            degree: Some("Ingeniería Informática".to_string()),
            contact_email: Some("lucia@alumnos.example".to_string()),
        });
        port
    }

    pub(crate) fn insert_offer(&self, offer: Offer) {
        let mut guard = self.tables.lock().expect("port mutex poisoned");
        guard.offers.insert(offer.id, offer);
    }

    pub(crate) fn insert_company(&self, company: Company) {
        let mut guard = self.tables.lock().expect("port mutex poisoned");
        guard.companies.insert(company.id, company);
    }

    pub(crate) fn insert_student(&self, student: Student) {
        let mut guard = self.tables.lock().expect("port mutex poisoned");
        guard.students.insert(student.id, student);
    }

    pub(crate) fn notifications(&self) -> Vec<Notification> {
        let guard = self.tables.lock().expect("port mutex poisoned");
        guard.notifications.values().cloned().collect()
    }
}

#[async_trait]
impl RemotePort for InMemoryRemotePort {
    async fn create_application(
        &self,
        mut application: Application,
    ) -> Result<Application, PortError> {
        let mut guard = self.tables.lock().expect("port mutex poisoned");
        let key = (application.student_id, application.offer_id);
        if guard.applications.contains_key(&key) {
            return Err(PortError::Conflict);
        }
        if !guard.offers.contains_key(&application.offer_id) {
            return Err(PortError::Rejected(format!(
                "offer {} does not exist",
                application.offer_id
            )));
        }
        application.applied_at = Some(Utc::now());
        guard.applications.insert(key, application.clone());
        Ok(application)
    }

    async fn application_exists(
        &self,
        student_id: StudentId,
        offer_id: OfferId,
    ) -> Result<bool, PortError> {
        let guard = self.tables.lock().expect("port mutex poisoned");
        Ok(guard.applications.contains_key(&(student_id, offer_id)))
    }

    async fn create_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, PortError> {
        let mut guard = self.tables.lock().expect("port mutex poisoned");
        guard.next_notification += 1;
        let id = NotificationId(guard.next_notification);
        let stored = Notification {
            id: Some(id),
            ..notification
        };
        guard.notifications.insert(id, stored.clone());
        debug!(%id, recipient = stored.recipient.label(), "notification stored");
        Ok(stored)
    }

    async fn update_notification_response(
        &self,
        id: NotificationId,
        status: &str,
    ) -> Result<(), PortError> {
        let mut guard = self.tables.lock().expect("port mutex poisoned");
        let notification = guard
            .notifications
            .get_mut(&id)
            .ok_or(PortError::NotFound)?;
        if notification.is_responded() {
            return Err(PortError::Conflict);
        }
        notification.response_status = Some(status.to_string());
        Ok(())
    }

    async fn notification_by_id(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, PortError> {
        let guard = self.tables.lock().expect("port mutex poisoned");
        Ok(guard.notifications.get(&id).cloned())
    }

    async fn notifications_for(
        &self,
        recipient: RecipientKind,
        recipient_id: u64,
    ) -> Result<Vec<Notification>, PortError> {
        let guard = self.tables.lock().expect("port mutex poisoned");
        Ok(guard
            .notifications
            .values()
            .filter(|notification| notification.addressed_to(recipient, recipient_id))
            .cloned()
            .collect())
    }

    async fn offer_by_id(&self, id: OfferId) -> Result<Option<Offer>, PortError> {
        let guard = self.tables.lock().expect("port mutex poisoned");
        Ok(guard.offers.get(&id).cloned())
    }

    async fn company_by_id(&self, id: CompanyId) -> Result<Option<Company>, PortError> {
        let guard = self.tables.lock().expect("port mutex poisoned");
        Ok(guard.companies.get(&id).cloned())
    }

    async fn student_by_id(&self, id: StudentId) -> Result<Option<Student>, PortError> {
        let guard = self.tables.lock().expect("port mutex poisoned");
        Ok(guard.students.get(&id).cloned())
    }
}
