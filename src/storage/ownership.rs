// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for owner-facing storage access.
//!
//! Cards and folders are only ever read or changed on behalf of their owner.
//! The public share path never goes through these checks; it is gated by the
//! share token instead.

use crate::auth::AuthenticatedUser;

use super::{StorageError, StorageResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;

    /// Human-readable label used in permission errors.
    fn resource_label(&self) -> String;
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that the user owns this resource.
    ///
    /// # Errors
    /// Returns `StorageError::PermissionDenied` if the user doesn't own the resource.
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user: &AuthenticatedUser) -> StorageResult<()> {
        if self.owner_user_id() == user.user_id {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                user_id: user.user_id.clone(),
                resource: self.resource_label(),
            })
        }
    }
}

/// Ownership check chained onto a repository read.
pub trait OwnershipCheck<T> {
    /// Verify ownership and return the resource if authorized.
    fn verify_owner(self, user: &AuthenticatedUser) -> StorageResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for StorageResult<T> {
    fn verify_owner(self, user: &AuthenticatedUser) -> StorageResult<T> {
        let resource = self?;
        resource.verify_ownership(user)?;
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        owner: String,
    }

    impl OwnedResource for TestResource {
        fn owner_user_id(&self) -> &str {
            &self.owner
        }

        fn resource_label(&self) -> String {
            "test resource".to_string()
        }
    }

    fn make_user(user_id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user_id.to_string(),
        }
    }

    #[test]
    fn owner_can_access() {
        let resource = TestResource {
            owner: "user_123".to_string(),
        };
        assert!(resource.verify_ownership(&make_user("user_123")).is_ok());
    }

    #[test]
    fn non_owner_denied() {
        let resource = TestResource {
            owner: "user_123".to_string(),
        };
        let result = resource.verify_ownership(&make_user("user_456"));
        match result {
            Err(StorageError::PermissionDenied { user_id, resource }) => {
                assert_eq!(user_id, "user_456");
                assert_eq!(resource, "test resource");
            }
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }

    #[test]
    fn verify_owner_passes_through_read_errors() {
        let missing: StorageResult<TestResource> =
            Err(StorageError::NotFound("Card c-1".to_string()));
        assert!(matches!(
            missing.verify_owner(&make_user("user_123")),
            Err(StorageError::NotFound(_))
        ));

        let found: StorageResult<TestResource> = Ok(TestResource {
            owner: "user_123".to_string(),
        });
        assert!(found.verify_owner(&make_user("user_123")).is_ok());
    }
}
