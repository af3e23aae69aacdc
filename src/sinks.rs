//! Module for the fire-and-forget collaborators: user notifications and the admin audit log

use std::fmt;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::UserId;

/// Delivers a message to a user. Failures never fail the operation that triggered them.
pub trait Notifier: Send + Sync {
    fn notify(&self, user: UserId, message: &str) -> Result<()>;
}

/// Records what an admin did, and to whom.
pub trait AuditLog: Send + Sync {
    fn log_admin_action(&self, action: &AdminAction) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminActionKind {
    Rollback,
    Fine,
    VerifyComplaint,
    RejectComplaint,
    ApproveDeposit,
    RejectDeposit,
    ApproveWithdrawal,
    RejectWithdrawal,
    BlockUser,
    UnblockUser,
    UpdateSettings,
}

closed_enum!(AdminActionKind, "admin action", {
    Rollback => "ROLLBACK",
    Fine => "FINE",
    VerifyComplaint => "VERIFY_COMPLAINT",
    RejectComplaint => "REJECT_COMPLAINT",
    ApproveDeposit => "APPROVE_DEPOSIT",
    RejectDeposit => "REJECT_DEPOSIT",
    ApproveWithdrawal => "APPROVE_WITHDRAWAL",
    RejectWithdrawal => "REJECT_WITHDRAWAL",
    BlockUser => "BLOCK_USER",
    UnblockUser => "UNBLOCK_USER",
    UpdateSettings => "UPDATE_SETTINGS",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminAction {
    pub admin: UserId,
    pub kind: AdminActionKind,
    pub target_user: Option<UserId>,
    pub details: String,
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by admin {}", self.kind, self.admin)?;
        if let Some(target) = self.target_user {
            write!(f, " on user {target}")?;
        }
        write!(f, ": {}", self.details)
    }
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, user: UserId, message: &str) -> Result<()> {
        info!(user = %user, "notification: {message}");
        Ok(())
    }
}

/// Writes admin actions to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn log_admin_action(&self, action: &AdminAction) -> Result<()> {
        info!(
            admin = %action.admin,
            kind = %action.kind,
            target_user = ?action.target_user,
            "admin action: {}",
            action.details
        );
        Ok(())
    }
}

/// Side effects collected while a unit of work runs and delivered once it has committed.
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    notices: Vec<(UserId, String)>,
    admin_actions: Vec<AdminAction>,
}

impl Outbox {
    pub(crate) fn notify(&mut self, user: UserId, message: impl Into<String>) {
        self.notices.push((user, message.into()));
    }

    pub(crate) fn admin_action(
        &mut self,
        admin: UserId,
        kind: AdminActionKind,
        target_user: Option<UserId>,
        details: impl Into<String>,
    ) {
        self.admin_actions.push(AdminAction {
            admin,
            kind,
            target_user,
            details: details.into(),
        });
    }

    pub(crate) fn deliver(self, notifier: &dyn Notifier, audit_log: &dyn AuditLog) {
        for action in &self.admin_actions {
            if let Err(err) = audit_log.log_admin_action(action) {
                warn!("failed to record admin action ({action}): {err:#}");
            }
        }
        for (user, message) in &self.notices {
            if let Err(err) = notifier.notify(*user, message) {
                warn!(user = %user, "failed to deliver notification: {err:#}");
            }
        }
    }
}
