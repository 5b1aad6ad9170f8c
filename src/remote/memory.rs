//! In-process backend holding the catalog in memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use super::{CatalogBackend, Caller, RemoteError, SubjectRef};
use crate::models::{
    Department, Resource, ResourceContent, Semester, Subject, UserProfile, UserRole,
};

/// Blob bytes "uploaded" per progress report.
const UPLOAD_CHUNK: usize = 64 * 1024;

#[derive(Default)]
struct MemoryState {
    departments: Vec<Department>,
    next_resource_id: u64,
    next_blob_id: u64,
    roles: HashMap<String, UserRole>,
    profiles: HashMap<String, UserProfile>,
}

/// Backend implementation that keeps everything in process memory.
///
/// Mirrors the permission rules of the deployed backend: catalog mutations and role
/// assignment require an admin caller, profiles require an authenticated caller.
#[derive(Default)]
pub struct InMemoryBackend {
    state: RwLock<MemoryState>,
    admins: Vec<String>,
    calls: AtomicU64,
}

impl InMemoryBackend {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend where the given principals are administrators.
    pub fn with_admins(admins: Vec<String>) -> Self {
        Self {
            admins,
            ..Self::default()
        }
    }

    /// Preload a catalog. Resource ids continue after the highest preloaded id.
    pub fn with_departments(mut self, departments: Vec<Department>) -> Self {
        let state = self.state.get_mut();
        state.next_resource_id = departments
            .iter()
            .flat_map(|d| &d.semesters)
            .flat_map(|s| &s.subjects)
            .flat_map(|s| &s.resources)
            .map(|r| r.id + 1)
            .max()
            .unwrap_or(0);
        state.departments = departments;
        self
    }

    /// Number of remote calls served so far.
    #[cfg(test)]
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, method: &'static str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(method, "in-memory backend call");
    }

    fn is_admin(&self, state: &MemoryState, caller: &Caller) -> bool {
        let Some(principal) = caller.principal() else {
            return false;
        };
        let listed = self
            .admins
            .iter()
            .any(|admin| bool::from(admin.as_bytes().ct_eq(principal.as_bytes())));
        listed || state.roles.get(principal) == Some(&UserRole::Admin)
    }

    fn require_admin(&self, state: &MemoryState, caller: &Caller, action: &str) -> Result<(), RemoteError> {
        if self.is_admin(state, caller) {
            Ok(())
        } else {
            Err(RemoteError::Rejected(format!(
                "Unauthorized: Only admins can {}",
                action
            )))
        }
    }
}

fn department_mut<'a>(state: &'a mut MemoryState, id: &str) -> Result<&'a mut Department, RemoteError> {
    state
        .departments
        .iter_mut()
        .find(|d| d.id == id)
        .ok_or_else(|| RemoteError::Rejected("Department not found".to_string()))
}

fn semester_mut<'a>(
    state: &'a mut MemoryState,
    department_id: &str,
    semester_id: &str,
) -> Result<&'a mut Semester, RemoteError> {
    department_mut(state, department_id)?
        .semesters
        .iter_mut()
        .find(|s| s.id == semester_id)
        .ok_or_else(|| RemoteError::Rejected("Semester not found".to_string()))
}

fn subject_mut<'a>(state: &'a mut MemoryState, subject: &SubjectRef) -> Result<&'a mut Subject, RemoteError> {
    semester_mut(state, &subject.department_id, &subject.semester_id)?
        .subjects
        .iter_mut()
        .find(|s| s.id == subject.subject_id)
        .ok_or_else(|| RemoteError::Rejected("Subject not found".to_string()))
}

/// Copy content into storage, uploading blob bytes that have no direct URL yet.
fn store_content(state: &mut MemoryState, content: &ResourceContent) -> ResourceContent {
    let ResourceContent::ExternalBlob { blob } = content else {
        return content.clone();
    };
    if blob.is_uploaded() {
        return content.clone();
    }

    let total = blob.bytes().len();
    let mut sent = 0;
    blob.report_progress(0);
    while sent < total {
        sent = (sent + UPLOAD_CHUNK).min(total);
        blob.report_progress((sent * 100 / total) as u8);
    }

    state.next_blob_id += 1;
    let mut stored = blob.clone();
    stored.mark_uploaded(format!("memory://blobs/{}", state.next_blob_id));
    ResourceContent::blob(stored)
}

#[async_trait]
impl CatalogBackend for InMemoryBackend {
    async fn get_all_departments(&self) -> Result<Vec<Department>, RemoteError> {
        self.record("getAllDepartments");
        Ok(self.state.read().await.departments.clone())
    }

    async fn add_department(&self, caller: &Caller, id: &str, name: &str) -> Result<(), RemoteError> {
        self.record("addDepartment");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "add departments")?;
        if state.departments.iter().any(|d| d.id == id) {
            return Err(RemoteError::Rejected("Department already exists".to_string()));
        }
        state.departments.push(Department {
            id: id.to_string(),
            name: name.to_string(),
            semesters: Vec::new(),
        });
        Ok(())
    }

    async fn edit_department(&self, caller: &Caller, id: &str, name: &str) -> Result<(), RemoteError> {
        self.record("editDepartment");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "edit departments")?;
        department_mut(&mut state, id)?.name = name.to_string();
        Ok(())
    }

    async fn remove_department(&self, caller: &Caller, id: &str) -> Result<(), RemoteError> {
        self.record("removeDepartment");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "remove departments")?;
        let before = state.departments.len();
        state.departments.retain(|d| d.id != id);
        if state.departments.len() == before {
            return Err(RemoteError::Rejected("Department not found".to_string()));
        }
        Ok(())
    }

    async fn add_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        id: &str,
        name: &str,
    ) -> Result<(), RemoteError> {
        self.record("addSemester");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "add semesters")?;
        let dept = department_mut(&mut state, department_id)?;
        if dept.semesters.iter().any(|s| s.id == id) {
            return Err(RemoteError::Rejected("Semester already exists".to_string()));
        }
        dept.semesters.push(Semester {
            id: id.to_string(),
            name: name.to_string(),
            subjects: Vec::new(),
        });
        Ok(())
    }

    async fn edit_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
        name: &str,
    ) -> Result<(), RemoteError> {
        self.record("editSemester");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "edit semesters")?;
        semester_mut(&mut state, department_id, semester_id)?.name = name.to_string();
        Ok(())
    }

    async fn remove_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
    ) -> Result<(), RemoteError> {
        self.record("removeSemester");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "remove semesters")?;
        let dept = department_mut(&mut state, department_id)?;
        let before = dept.semesters.len();
        dept.semesters.retain(|s| s.id != semester_id);
        if dept.semesters.len() == before {
            return Err(RemoteError::Rejected("Semester not found".to_string()));
        }
        Ok(())
    }

    async fn add_subject(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
        id: &str,
        name: &str,
    ) -> Result<(), RemoteError> {
        self.record("addSubject");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "add subjects")?;
        let sem = semester_mut(&mut state, department_id, semester_id)?;
        if sem.subjects.iter().any(|s| s.id == id) {
            return Err(RemoteError::Rejected("Subject already exists".to_string()));
        }
        sem.subjects.push(Subject {
            id: id.to_string(),
            name: name.to_string(),
            resources: Vec::new(),
        });
        Ok(())
    }

    async fn edit_subject(&self, caller: &Caller, subject: &SubjectRef, name: &str) -> Result<(), RemoteError> {
        self.record("editSubject");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "edit subjects")?;
        subject_mut(&mut state, subject)?.name = name.to_string();
        Ok(())
    }

    async fn remove_subject(&self, caller: &Caller, subject: &SubjectRef) -> Result<(), RemoteError> {
        self.record("removeSubject");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "remove subjects")?;
        let sem = semester_mut(&mut state, &subject.department_id, &subject.semester_id)?;
        let before = sem.subjects.len();
        sem.subjects.retain(|s| s.id != subject.subject_id);
        if sem.subjects.len() == before {
            return Err(RemoteError::Rejected("Subject not found".to_string()));
        }
        Ok(())
    }

    async fn add_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        title: &str,
        content: &ResourceContent,
    ) -> Result<(), RemoteError> {
        self.record("addResource");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "add resources")?;
        // Resolve the parent before touching ids or uploading.
        subject_mut(&mut state, subject)?;

        let stored = store_content(&mut state, content);
        let id = state.next_resource_id;
        state.next_resource_id += 1;
        subject_mut(&mut state, subject)?.resources.push(Resource {
            id,
            title: title.to_string(),
            content: stored,
        });
        Ok(())
    }

    async fn edit_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        resource_id: u64,
        title: &str,
        content: &ResourceContent,
    ) -> Result<(), RemoteError> {
        self.record("editResource");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "edit resources")?;
        let exists = subject_mut(&mut state, subject)?
            .resources
            .iter()
            .any(|r| r.id == resource_id);
        if !exists {
            return Err(RemoteError::Rejected("Resource not found".to_string()));
        }

        let stored = store_content(&mut state, content);
        if let Some(res) = subject_mut(&mut state, subject)?
            .resources
            .iter_mut()
            .find(|r| r.id == resource_id)
        {
            res.title = title.to_string();
            res.content = stored;
        }
        Ok(())
    }

    async fn remove_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        resource_id: u64,
    ) -> Result<(), RemoteError> {
        self.record("removeResource");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "remove resources")?;
        let subj = subject_mut(&mut state, subject)?;
        let before = subj.resources.len();
        subj.resources.retain(|r| r.id != resource_id);
        if subj.resources.len() == before {
            return Err(RemoteError::Rejected("Resource not found".to_string()));
        }
        Ok(())
    }

    async fn is_caller_admin(&self, caller: &Caller) -> Result<bool, RemoteError> {
        self.record("isCallerAdmin");
        let state = self.state.read().await;
        Ok(self.is_admin(&state, caller))
    }

    async fn get_caller_user_role(&self, caller: &Caller) -> Result<UserRole, RemoteError> {
        self.record("getCallerUserRole");
        let state = self.state.read().await;
        let Some(principal) = caller.principal() else {
            return Ok(UserRole::Guest);
        };
        if self.is_admin(&state, caller) {
            return Ok(UserRole::Admin);
        }
        Ok(state.roles.get(principal).copied().unwrap_or(UserRole::User))
    }

    async fn assign_caller_user_role(
        &self,
        caller: &Caller,
        user: &str,
        role: UserRole,
    ) -> Result<(), RemoteError> {
        self.record("assignCallerUserRole");
        let mut state = self.state.write().await;
        self.require_admin(&state, caller, "assign user roles")?;
        state.roles.insert(user.to_string(), role);
        Ok(())
    }

    async fn get_caller_user_profile(&self, caller: &Caller) -> Result<Option<UserProfile>, RemoteError> {
        self.record("getCallerUserProfile");
        let Some(principal) = caller.principal() else {
            return Ok(None);
        };
        Ok(self.state.read().await.profiles.get(principal).cloned())
    }

    async fn save_caller_user_profile(
        &self,
        caller: &Caller,
        profile: &UserProfile,
    ) -> Result<(), RemoteError> {
        self.record("saveCallerUserProfile");
        let Some(principal) = caller.principal() else {
            return Err(RemoteError::Rejected(
                "Unauthorized: Only users can save profiles".to_string(),
            ));
        };
        self.state
            .write()
            .await
            .profiles
            .insert(principal.to_string(), profile.clone());
        Ok(())
    }

    async fn get_user_profile(&self, caller: &Caller, user: &str) -> Result<Option<UserProfile>, RemoteError> {
        self.record("getUserProfile");
        let state = self.state.read().await;
        let own = caller.principal() == Some(user);
        if !own && !self.is_admin(&state, caller) {
            return Err(RemoteError::Rejected(
                "Unauthorized: Can only view your own profile".to_string(),
            ));
        }
        Ok(state.profiles.get(user).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExternalBlob;
    use std::sync::{Arc, Mutex};

    fn admin() -> Caller {
        Caller::Principal("admin-principal".to_string())
    }

    fn subject_ref() -> SubjectRef {
        SubjectRef {
            department_id: "cse".into(),
            semester_id: "s1".into(),
            subject_id: "ds".into(),
        }
    }

    async fn seeded() -> InMemoryBackend {
        let backend = InMemoryBackend::with_admins(vec!["admin-principal".to_string()]);
        backend.add_department(&admin(), "cse", "CSE").await.unwrap();
        backend.add_semester(&admin(), "cse", "s1", "Semester 1").await.unwrap();
        backend
            .add_subject(&admin(), "cse", "s1", "ds", "Data Structures")
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_non_admin_mutations_are_rejected() {
        let backend = seeded().await;
        let user = Caller::Principal("someone".into());

        let err = backend.add_department(&user, "ece", "ECE").await.unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(msg) if msg.contains("Only admins")));
        let err = backend.remove_department(&Caller::Anonymous, "cse").await.unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(_)));
        assert_eq!(backend.get_all_departments().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_and_missing_parents() {
        let backend = seeded().await;
        assert_eq!(
            backend.add_department(&admin(), "cse", "Again").await,
            Err(RemoteError::Rejected("Department already exists".into()))
        );
        assert_eq!(
            backend.add_semester(&admin(), "mech", "s1", "Semester 1").await,
            Err(RemoteError::Rejected("Department not found".into()))
        );
        assert_eq!(
            backend.add_subject(&admin(), "cse", "s9", "x", "X").await,
            Err(RemoteError::Rejected("Semester not found".into()))
        );
    }

    #[tokio::test]
    async fn test_resource_ids_are_monotonic() {
        let backend = seeded().await;
        let subject = subject_ref();
        for title in ["Trees", "Graphs", "Heaps"] {
            backend
                .add_resource(&admin(), &subject, title, &ResourceContent::url("https://x.com"))
                .await
                .unwrap();
        }
        backend.remove_resource(&admin(), &subject, 1).await.unwrap();
        backend
            .add_resource(&admin(), &subject, "Tries", &ResourceContent::url("https://x.com"))
            .await
            .unwrap();

        let departments = backend.get_all_departments().await.unwrap();
        let ids: Vec<u64> = departments[0].semesters[0].subjects[0]
            .resources
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn test_preloaded_catalog_continues_ids() {
        let departments: Vec<Department> = serde_json::from_value(serde_json::json!([
            {"id": "cse", "name": "CSE", "semesters": [{"id": "s1", "name": "Semester 1", "subjects": [
                {"id": "ds", "name": "DS", "resources": [
                    {"id": 41, "title": "Old", "content": {"kind": "url", "url": "https://x.com"}}
                ]}
            ]}]}
        ]))
        .unwrap();
        let backend = InMemoryBackend::with_admins(vec!["admin-principal".into()]).with_departments(departments);
        backend
            .add_resource(&admin(), &subject_ref(), "New", &ResourceContent::url("https://y.com"))
            .await
            .unwrap();

        let departments = backend.get_all_departments().await.unwrap();
        assert_eq!(departments[0].semesters[0].subjects[0].resources[1].id, 42);
    }

    #[tokio::test]
    async fn test_blob_upload_reports_progress_and_gets_url() {
        let backend = seeded().await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let blob = ExternalBlob::from_bytes(vec![7; UPLOAD_CHUNK * 2])
            .with_upload_progress(move |pct| sink.lock().unwrap().push(pct));

        backend
            .add_resource(&admin(), &subject_ref(), "Scan", &ResourceContent::blob(blob))
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 50, 100]);
        let departments = backend.get_all_departments().await.unwrap();
        let stored = &departments[0].semesters[0].subjects[0].resources[0];
        assert_eq!(stored.resolved_url().as_deref(), Some("memory://blobs/1"));
    }

    #[tokio::test]
    async fn test_roles_and_profiles() {
        let backend = seeded().await;
        let user = Caller::Principal("student".into());

        assert_eq!(backend.get_caller_user_role(&Caller::Anonymous).await, Ok(UserRole::Guest));
        assert_eq!(backend.get_caller_user_role(&user).await, Ok(UserRole::User));
        assert_eq!(backend.get_caller_user_role(&admin()).await, Ok(UserRole::Admin));

        backend
            .assign_caller_user_role(&admin(), "student", UserRole::Admin)
            .await
            .unwrap();
        assert_eq!(backend.is_caller_admin(&user).await, Ok(true));

        assert_eq!(backend.get_caller_user_profile(&user).await, Ok(None));
        let profile = UserProfile { name: "Asha".into() };
        backend.save_caller_user_profile(&user, &profile).await.unwrap();
        assert_eq!(backend.get_caller_user_profile(&user).await, Ok(Some(profile.clone())));
        assert_eq!(backend.get_user_profile(&admin(), "student").await, Ok(Some(profile)));
        assert!(backend
            .save_caller_user_profile(&Caller::Anonymous, &UserProfile { name: "x".into() })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_call_count_tracks_every_call() {
        let backend = InMemoryBackend::new();
        backend.get_all_departments().await.unwrap();
        let _ = backend.add_department(&Caller::Anonymous, "x", "X").await;
        assert_eq!(backend.call_count(), 2);
    }
}
