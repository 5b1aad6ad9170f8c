//! Remote backend boundary.
//!
//! The catalog, role and profile data live in an external backend. Everything on this
//! side talks to it through [`CatalogBackend`], obtained from a [`RemoteHandle`].
//!
//! - [`HttpBackend`] - JSON-over-HTTP transport to a deployed backend
//! - [`InMemoryBackend`] - in-process backend for development runs and tests

mod handle;
mod http;
mod memory;

pub use handle::RemoteHandle;
pub use http::HttpBackend;
pub use memory::InMemoryBackend;

use async_trait::async_trait;

use crate::models::{Department, ResourceContent, UserProfile, UserRole};

/// Identity on whose behalf a remote call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Principal(String),
}

impl Caller {
    pub fn principal(&self) -> Option<&str> {
        match self {
            Caller::Anonymous => None,
            Caller::Principal(p) => Some(p),
        }
    }
}

/// Path to a subject, the parent of resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRef {
    pub department_id: String,
    pub semester_id: String,
    pub subject_id: String,
}

/// Failures of a remote call.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The connection handle is still initializing; no call was issued.
    #[error("Actor not available")]
    NotReady,
    /// Network or backend failure.
    #[error("remote call failed: {0}")]
    Transport(String),
    /// The backend refused the call (permission, duplicate id, missing parent).
    #[error("{0}")]
    Rejected(String),
    /// The backend answered with something that could not be decoded.
    #[error("unexpected remote response: {0}")]
    Decode(String),
}

/// Remote procedure surface of the catalog backend.
///
/// Each method is one remote call. Implementations must not retry on their own.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Probe used while the connection handle initializes.
    async fn ready(&self) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn get_all_departments(&self) -> Result<Vec<Department>, RemoteError>;

    async fn add_department(&self, caller: &Caller, id: &str, name: &str) -> Result<(), RemoteError>;
    async fn edit_department(&self, caller: &Caller, id: &str, name: &str) -> Result<(), RemoteError>;
    async fn remove_department(&self, caller: &Caller, id: &str) -> Result<(), RemoteError>;

    async fn add_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        id: &str,
        name: &str,
    ) -> Result<(), RemoteError>;
    async fn edit_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
        name: &str,
    ) -> Result<(), RemoteError>;
    async fn remove_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
    ) -> Result<(), RemoteError>;

    async fn add_subject(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
        id: &str,
        name: &str,
    ) -> Result<(), RemoteError>;
    async fn edit_subject(&self, caller: &Caller, subject: &SubjectRef, name: &str) -> Result<(), RemoteError>;
    async fn remove_subject(&self, caller: &Caller, subject: &SubjectRef) -> Result<(), RemoteError>;

    async fn add_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        title: &str,
        content: &ResourceContent,
    ) -> Result<(), RemoteError>;
    async fn edit_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        resource_id: u64,
        title: &str,
        content: &ResourceContent,
    ) -> Result<(), RemoteError>;
    async fn remove_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        resource_id: u64,
    ) -> Result<(), RemoteError>;

    async fn is_caller_admin(&self, caller: &Caller) -> Result<bool, RemoteError>;
    async fn get_caller_user_role(&self, caller: &Caller) -> Result<UserRole, RemoteError>;
    async fn assign_caller_user_role(
        &self,
        caller: &Caller,
        user: &str,
        role: UserRole,
    ) -> Result<(), RemoteError>;

    async fn get_caller_user_profile(&self, caller: &Caller) -> Result<Option<UserProfile>, RemoteError>;
    async fn save_caller_user_profile(
        &self,
        caller: &Caller,
        profile: &UserProfile,
    ) -> Result<(), RemoteError>;
    async fn get_user_profile(&self, caller: &Caller, user: &str) -> Result<Option<UserProfile>, RemoteError>;
}
