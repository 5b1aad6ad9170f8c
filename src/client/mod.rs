//! Remote-data access and mutation layer.
//!
//! Reads go through a [`QueryCache`]. Every mutation is validated locally, issued as a
//! single remote call, and invalidates the cache only when the call succeeds.

mod cache;
mod validation;

pub use cache::{QueryCache, Snapshot};
pub use validation::{require, validate_content, ValidationError};

use std::sync::Arc;

use crate::models::{ResourceContent, UserProfile, UserRole};
use crate::remote::{CatalogBackend, Caller, RemoteError, RemoteHandle, SubjectRef};

/// Errors surfaced by [`CatalogClient`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Catalog access shared by all request handlers.
#[derive(Debug)]
pub struct CatalogClient {
    remote: RemoteHandle,
    cache: QueryCache,
}

impl CatalogClient {
    pub fn new(remote: RemoteHandle) -> Self {
        Self {
            remote,
            cache: QueryCache::new(),
        }
    }

    /// Current cache generation, reported to API clients as the revision id.
    pub async fn revision(&self) -> u64 {
        self.cache.generation().await
    }

    fn backend(&self) -> Result<Arc<dyn CatalogBackend>, RemoteError> {
        self.remote.get()
    }

    /// All departments, from the cache or from one remote read.
    pub async fn departments(&self) -> Result<Arc<Snapshot>, ClientError> {
        if let Some(snapshot) = self.cache.current().await {
            tracing::debug!(revision = snapshot.revision, "Catalog cache hit");
            return Ok(snapshot);
        }

        let backend = self.backend()?;
        let ticket = self.cache.begin_fetch().await;
        tracing::debug!("Catalog cache miss, fetching departments");
        let departments = backend.get_all_departments().await.map_err(|e| {
            tracing::warn!("Failed to fetch departments: {}", e);
            e
        })?;

        Ok(self.cache.complete_fetch(ticket, departments).await)
    }

    /// Log the outcome of a mutation and invalidate on success.
    async fn settle(&self, action: &'static str, result: Result<(), RemoteError>) -> Result<(), ClientError> {
        match result {
            Ok(()) => {
                let generation = self.cache.invalidate().await;
                tracing::info!(action, generation, "Mutation succeeded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(action, "Mutation failed: {}", e);
                Err(e.into())
            }
        }
    }

    pub async fn add_department(&self, caller: &Caller, id: &str, name: &str) -> Result<(), ClientError> {
        let id = require("Department ID", id)?;
        let name = require("Department name", name)?;
        let backend = self.backend()?;
        let result = backend.add_department(caller, id, name).await;
        self.settle("add department", result).await
    }

    pub async fn edit_department(&self, caller: &Caller, id: &str, name: &str) -> Result<(), ClientError> {
        let id = require("Department ID", id)?;
        let name = require("Department name", name)?;
        let backend = self.backend()?;
        let result = backend.edit_department(caller, id, name).await;
        self.settle("edit department", result).await
    }

    pub async fn remove_department(&self, caller: &Caller, id: &str) -> Result<(), ClientError> {
        let id = require("Department ID", id)?;
        let backend = self.backend()?;
        let result = backend.remove_department(caller, id).await;
        self.settle("remove department", result).await
    }

    pub async fn add_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        id: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let department_id = require("Department ID", department_id)?;
        let id = require("Semester ID", id)?;
        let name = require("Semester name", name)?;
        let backend = self.backend()?;
        let result = backend.add_semester(caller, department_id, id, name).await;
        self.settle("add semester", result).await
    }

    pub async fn edit_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let department_id = require("Department ID", department_id)?;
        let semester_id = require("Semester ID", semester_id)?;
        let name = require("Semester name", name)?;
        let backend = self.backend()?;
        let result = backend
            .edit_semester(caller, department_id, semester_id, name)
            .await;
        self.settle("edit semester", result).await
    }

    pub async fn remove_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
    ) -> Result<(), ClientError> {
        let department_id = require("Department ID", department_id)?;
        let semester_id = require("Semester ID", semester_id)?;
        let backend = self.backend()?;
        let result = backend.remove_semester(caller, department_id, semester_id).await;
        self.settle("remove semester", result).await
    }

    pub async fn add_subject(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
        id: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let department_id = require("Department ID", department_id)?;
        let semester_id = require("Semester ID", semester_id)?;
        let id = require("Subject ID", id)?;
        let name = require("Subject name", name)?;
        let backend = self.backend()?;
        let result = backend
            .add_subject(caller, department_id, semester_id, id, name)
            .await;
        self.settle("add subject", result).await
    }

    pub async fn edit_subject(&self, caller: &Caller, subject: &SubjectRef, name: &str) -> Result<(), ClientError> {
        let subject = checked_subject(subject)?;
        let name = require("Subject name", name)?;
        let backend = self.backend()?;
        let result = backend.edit_subject(caller, &subject, name).await;
        self.settle("edit subject", result).await
    }

    pub async fn remove_subject(&self, caller: &Caller, subject: &SubjectRef) -> Result<(), ClientError> {
        let subject = checked_subject(subject)?;
        let backend = self.backend()?;
        let result = backend.remove_subject(caller, &subject).await;
        self.settle("remove subject", result).await
    }

    pub async fn add_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        title: &str,
        content: &ResourceContent,
    ) -> Result<(), ClientError> {
        let subject = checked_subject(subject)?;
        let title = require("Title", title)?;
        let content = validate_content(content)?;
        let backend = self.backend()?;
        let result = backend.add_resource(caller, &subject, title, &content).await;
        self.settle("add resource", result).await
    }

    pub async fn edit_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        resource_id: u64,
        title: &str,
        content: &ResourceContent,
    ) -> Result<(), ClientError> {
        let subject = checked_subject(subject)?;
        let title = require("Title", title)?;
        let content = validate_content(content)?;
        let backend = self.backend()?;
        let result = backend
            .edit_resource(caller, &subject, resource_id, title, &content)
            .await;
        self.settle("edit resource", result).await
    }

    pub async fn remove_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        resource_id: u64,
    ) -> Result<(), ClientError> {
        let subject = checked_subject(subject)?;
        let backend = self.backend()?;
        let result = backend.remove_resource(caller, &subject, resource_id).await;
        self.settle("remove resource", result).await
    }

    pub async fn is_caller_admin(&self, caller: &Caller) -> Result<bool, ClientError> {
        Ok(self.backend()?.is_caller_admin(caller).await?)
    }

    pub async fn caller_role(&self, caller: &Caller) -> Result<UserRole, ClientError> {
        Ok(self.backend()?.get_caller_user_role(caller).await?)
    }

    /// Role changes do not touch the catalog, so the cache is left alone.
    pub async fn assign_role(&self, caller: &Caller, user: &str, role: UserRole) -> Result<(), ClientError> {
        let user = require("User", user)?;
        let backend = self.backend()?;
        backend
            .assign_caller_user_role(caller, user, role)
            .await
            .map_err(|e| {
                tracing::warn!(user, role = role.as_str(), "Role assignment failed: {}", e);
                e
            })?;
        tracing::info!(user, role = role.as_str(), "Role assigned");
        Ok(())
    }

    pub async fn caller_profile(&self, caller: &Caller) -> Result<Option<UserProfile>, ClientError> {
        Ok(self.backend()?.get_caller_user_profile(caller).await?)
    }

    pub async fn save_caller_profile(&self, caller: &Caller, name: &str) -> Result<UserProfile, ClientError> {
        let profile = UserProfile {
            name: require("Name", name)?.to_string(),
        };
        self.backend()?
            .save_caller_user_profile(caller, &profile)
            .await?;
        Ok(profile)
    }

    pub async fn user_profile(&self, caller: &Caller, user: &str) -> Result<Option<UserProfile>, ClientError> {
        let user = require("User", user)?;
        Ok(self.backend()?.get_user_profile(caller, user).await?)
    }
}

fn checked_subject(subject: &SubjectRef) -> Result<SubjectRef, ValidationError> {
    Ok(SubjectRef {
        department_id: require("Department ID", &subject.department_id)?.to_string(),
        semester_id: require("Semester ID", &subject.semester_id)?.to_string(),
        subject_id: require("Subject ID", &subject.subject_id)?.to_string(),
    })
}
