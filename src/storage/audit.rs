// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for security-sensitive operations.
//!
//! Card changes, share link transitions and every public disclosure are
//! appended to a daily JSONL file. Share tokens are never written in full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DocumentStorage, StorageError, StorageResult};

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Card events
    CardCreated,
    CardUpdated,
    CardDeleted,
    CvvErased,
    ImageEncrypted,

    // Folder events
    FolderCreated,
    FolderDeleted,

    // Share events
    ShareLinkGenerated,
    ShareLinkRevoked,
    PublicViewServed,
    PublicViewDenied,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// User who triggered the event. Absent for public access.
    pub user_id: Option<String>,
    /// Resource affected (card_id, folder_id).
    pub resource_id: Option<String>,
    /// Resource type (card, folder).
    pub resource_type: Option<String>,
    /// Additional details as JSON.
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            resource_id: None,
            resource_type: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the user ID.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    storage: &'a DocumentStorage,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(storage: &'a DocumentStorage) -> Self {
        Self { storage }
    }

    /// Log an audit event.
    ///
    /// Events are appended to a daily log file in JSONL format.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.storage.paths().audit_events_file(&date);
        let line = serde_json::to_string(event)?;
        self.storage.append_line(path, &line)
    }

    /// Log an event, downgrading a write failure to a warning.
    pub fn record(&self, event: AuditEvent) {
        if let Err(e) = self.log(&event) {
            tracing::warn!(
                error = %e,
                event_type = ?event.event_type,
                "Failed to write audit event"
            );
        }
    }

    /// Read audit events for a specific date.
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let path = self.storage.paths().audit_events_file(date);
        let content = self.storage.read_raw(&path)?;
        let content = String::from_utf8_lossy(&content);

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str::<AuditEvent>(line).map_err(StorageError::from))
            .collect()
    }

    /// Events touching one resource on a given date.
    pub fn search_by_resource(
        &self,
        resource_type: &str,
        resource_id: &str,
        date: &str,
    ) -> StorageResult<Vec<AuditEvent>> {
        let events = self.read_events(date)?;
        Ok(events
            .into_iter()
            .filter(|e| {
                e.resource_type.as_deref() == Some(resource_type)
                    && e.resource_id.as_deref() == Some(resource_id)
            })
            .collect())
    }
}

/// Helper macro for logging audit events.
///
/// Audit failures never fail the request; they are logged and dropped.
#[macro_export]
macro_rules! audit_log {
    ($storage:expr, $event_type:expr, $user:expr) => {{
        let event = $crate::storage::AuditEvent::new($event_type).with_user(&$user.user_id);
        $crate::storage::AuditRepository::new($storage).record(event);
    }};
    ($storage:expr, $event_type:expr, $user:expr, $resource_type:expr, $resource_id:expr) => {{
        let event = $crate::storage::AuditEvent::new($event_type)
            .with_user(&$user.user_id)
            .with_resource($resource_type, $resource_id);
        $crate::storage::AuditRepository::new($storage).record(event);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DocumentStorage) {
        let temp = TempDir::new().unwrap();
        let mut storage = DocumentStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (temp, storage)
    }

    #[test]
    fn create_audit_event() {
        let event = AuditEvent::new(AuditEventType::CardCreated)
            .with_user("user_123")
            .with_resource("card", "card_abc");

        assert_eq!(event.event_type, AuditEventType::CardCreated);
        assert_eq!(event.user_id, Some("user_123".to_string()));
        assert_eq!(event.resource_type, Some("card".to_string()));
        assert_eq!(event.resource_id, Some("card_abc".to_string()));
        assert!(event.success);
    }

    #[test]
    fn failed_event() {
        let event = AuditEvent::new(AuditEventType::PublicViewDenied).failed("expired");

        assert!(!event.success);
        assert_eq!(event.error, Some("expired".to_string()));
        assert!(event.user_id.is_none());
    }

    #[test]
    fn log_and_read_events() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);

        repo.log(
            &AuditEvent::new(AuditEventType::FolderCreated)
                .with_user("user_1")
                .with_resource("folder", "f1"),
        )
        .unwrap();
        repo.record(
            AuditEvent::new(AuditEventType::ShareLinkGenerated)
                .with_user("user_1")
                .with_resource("folder", "f1")
                .with_details(serde_json::json!({ "token_prefix": "abcdefgh" })),
        );

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let events = repo.read_events(&today).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::FolderCreated);
        assert_eq!(events[1].event_type, AuditEventType::ShareLinkGenerated);
        assert_eq!(events[1].details.as_ref().unwrap()["token_prefix"], "abcdefgh");
    }

    #[test]
    fn search_by_resource() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);

        repo.record(AuditEvent::new(AuditEventType::CardCreated).with_resource("card", "c1"));
        repo.record(AuditEvent::new(AuditEventType::CvvErased).with_resource("card", "c1"));
        repo.record(AuditEvent::new(AuditEventType::FolderCreated).with_resource("folder", "f1"));

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let events = repo.search_by_resource("card", "c1", &today).unwrap();
        assert_eq!(events.len(), 2);
    }
}
