use async_trait::async_trait;

use super::domain::{
    Application, Company, CompanyId, Notification, NotificationId, Offer, OfferId,
    RecipientKind, Student, StudentId,
};

/// Remote access capability the coordinator drives.
///
/// Absent entities are `Ok(None)`; `Err` is reserved for failed calls. Implementations
/// must be safe for concurrent use since independent sessions share one port.
#[async_trait]
pub trait RemotePort: Send + Sync {
    /// Store an application. Uniqueness of the (student, offer) pair is enforced here.
    async fn create_application(&self, application: Application)
        -> Result<Application, PortError>;
    async fn application_exists(
        &self,
        student_id: StudentId,
        offer_id: OfferId,
    ) -> Result<bool, PortError>;
    /// Store a notification, returning it with its assigned id.
    async fn create_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, PortError>;
    /// Set the response status of a notification. The field is single-write.
    async fn update_notification_response(
        &self,
        id: NotificationId,
        status: &str,
    ) -> Result<(), PortError>;
    async fn notification_by_id(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, PortError>;
    async fn notifications_for(
        &self,
        recipient: RecipientKind,
        recipient_id: u64,
    ) -> Result<Vec<Notification>, PortError>;
    async fn offer_by_id(&self, id: OfferId) -> Result<Option<Offer>, PortError>;
    async fn company_by_id(&self, id: CompanyId) -> Result<Option<Company>, PortError>;
    async fn student_by_id(&self, id: StudentId) -> Result<Option<Student>, PortError>;
}

/// Failure of a remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("remote unavailable: {0}")]
    Unavailable(String),
}
