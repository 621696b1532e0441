use serde::Serialize;

use super::domain::{Company, NotificationKind, Offer};

/// Observable fields of the offer detail screen.
///
/// Written by the coordinator and read by presentation only; the coordinator never
/// branches on these values except for the loaded company reference used when
/// notifying about a new application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OfferDetailState {
    pub offer: Option<Offer>,
    pub company: Option<Company>,
    /// `None` until an application was attempted.
    pub application_succeeded: Option<bool>,
    pub already_applied: bool,
    pub response_status: Option<String>,
    pub notification_kind: Option<NotificationKind>,
}

impl OfferDetailState {
    pub fn new() -> Self {
        Self::default()
    }
}
