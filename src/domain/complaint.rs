//! Complaints raised by booking participants and resolved by an admin

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    Error,
    domain::{BookingId, ComplaintId, UserId},
    error::conflicting_state,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    Open,
    UnderReview,
    ActionTaken,
    Rejected,
}

closed_enum!(ComplaintStatus, "complaint status", {
    Open => "OPEN",
    UnderReview => "UNDER_REVIEW",
    ActionTaken => "ACTION_TAKEN",
    Rejected => "REJECTED",
});

/// How a complaint was closed. Set once, on the terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionAction {
    #[serde(rename = "NONE")]
    NoAction,
    Fine,
    Rollback,
}

closed_enum!(ResolutionAction, "resolution action", {
    NoAction => "NONE",
    Fine => "FINE",
    Rollback => "ROLLBACK",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Complaint {
    id: ComplaintId,
    booking: BookingId,
    complainer: UserId,
    description: String,
    status: ComplaintStatus,
    resolution_action: Option<ResolutionAction>,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl Complaint {
    pub(crate) fn new(
        id: ComplaintId,
        booking: BookingId,
        complainer: UserId,
        description: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            booking,
            complainer,
            description,
            status: ComplaintStatus::Open,
            resolution_action: None,
            admin_notes: None,
            created_at,
        }
    }

    pub fn id(&self) -> ComplaintId {
        self.id
    }

    pub fn booking(&self) -> BookingId {
        self.booking
    }

    pub fn complainer(&self) -> UserId {
        self.complainer
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> ComplaintStatus {
        self.status
    }

    pub fn resolution_action(&self) -> Option<ResolutionAction> {
        self.resolution_action
    }

    pub fn admin_notes(&self) -> Option<&str> {
        self.admin_notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            ComplaintStatus::Open | ComplaintStatus::UnderReview
        )
    }

    pub(crate) fn verify(&mut self) -> Result<(), Error> {
        if self.status != ComplaintStatus::Open {
            return Err(self.conflict("verify"));
        }
        self.status = ComplaintStatus::UnderReview;
        Ok(())
    }

    pub(crate) fn reject(&mut self, notes: Option<String>) -> Result<(), Error> {
        self.close(ComplaintStatus::Rejected, ResolutionAction::NoAction, "reject")?;
        self.admin_notes = notes;
        Ok(())
    }

    pub(crate) fn resolve_with(&mut self, action: ResolutionAction) -> Result<(), Error> {
        if self.resolution_action == Some(action) {
            return Err(conflicting_state(
                "complaint",
                self.id,
                self.status,
                format!("already resolved with {action}"),
            ));
        }
        self.close(ComplaintStatus::ActionTaken, action, "resolve")
    }

    fn close(
        &mut self,
        status: ComplaintStatus,
        action: ResolutionAction,
        operation: &str,
    ) -> Result<(), Error> {
        if !self.is_open() {
            return Err(self.conflict(operation));
        }
        self.status = status;
        self.resolution_action = Some(action);
        Ok(())
    }

    fn conflict(&self, operation: &str) -> Error {
        conflicting_state(
            "complaint",
            self.id,
            self.status,
            format!("cannot {operation}"),
        )
    }
}
