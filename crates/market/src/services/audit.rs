//! Append-only audit trail.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use harvest_hub_core::AuditLogId;

use crate::models::{Actor, AuditAction, AuditLogEntry};

/// Audit entries, newest first. Entries are never changed or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail {
    entries: Vec<AuditLogEntry>,
}

impl AuditTrail {
    #[must_use]
    pub fn entries(&self) -> &[AuditLogEntry] {
        &self.entries
    }

    /// Append an entry attributed to `actor`.
    pub fn record(&mut self, actor: &Actor, action: AuditAction, details: impl Into<String>) {
        let entry = AuditLogEntry {
            id: AuditLogId::generate(),
            timestamp: Utc::now(),
            actor_id: actor.id(),
            actor_name: actor.name().to_string(),
            action,
            details: details.into(),
        };
        tracing::debug!(action = %entry.action, actor = %entry.actor_name, "audit");
        self.entries.insert(0, entry);
    }
}
