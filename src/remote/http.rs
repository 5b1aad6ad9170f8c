//! JSON-over-HTTP transport to a deployed catalog backend.
//!
//! Each remote procedure is a `POST {base}/rpc/{method}` whose body is a JSON object of
//! named arguments. The caller principal travels in the `x-caller-principal` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{CatalogBackend, Caller, RemoteError, SubjectRef};
use crate::auth::CALLER_HEADER;
use crate::models::{Department, ResourceContent, UserProfile, UserRole};

/// Backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        caller: &Caller,
        args: Value,
    ) -> Result<T, RemoteError> {
        let mut request = self
            .client
            .post(format!("{}/rpc/{}", self.base_url, method))
            .json(&args);
        if let Some(principal) = caller.principal() {
            request = request.header(CALLER_HEADER, principal);
        }

        tracing::debug!(method, "remote call");
        let response = request.send().await.map_err(|e| {
            tracing::warn!(method, "remote transport error: {}", e);
            RemoteError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        // Timeouts and throttling are transient, not refusals.
        let transient = matches!(status, StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS);
        if status.is_client_error() && !transient {
            return Err(RemoteError::Rejected(rejection_message(status, &body)));
        }
        if !status.is_success() {
            return Err(RemoteError::Transport(format!("{}: {}", status, body.trim())));
        }

        let value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))?
        };
        serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn upload<T: DeserializeOwned>(
        &self,
        method: &'static str,
        caller: &Caller,
        content: &ResourceContent,
        args: Value,
    ) -> Result<T, RemoteError> {
        let ResourceContent::ExternalBlob { blob } = content else {
            return self.call(method, caller, args).await;
        };

        blob.report_progress(0);
        let result = self.call(method, caller, args).await;
        if result.is_ok() {
            blob.report_progress(100);
        }
        result
    }
}

fn rejection_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl CatalogBackend for HttpBackend {
    async fn ready(&self) -> Result<(), RemoteError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::Transport(format!(
                "health check returned {}",
                response.status()
            )))
        }
    }

    async fn get_all_departments(&self) -> Result<Vec<Department>, RemoteError> {
        self.call("getAllDepartments", &Caller::Anonymous, json!({}))
            .await
    }

    async fn add_department(&self, caller: &Caller, id: &str, name: &str) -> Result<(), RemoteError> {
        self.call("addDepartment", caller, json!({ "id": id, "name": name }))
            .await
    }

    async fn edit_department(&self, caller: &Caller, id: &str, name: &str) -> Result<(), RemoteError> {
        self.call("editDepartment", caller, json!({ "id": id, "name": name }))
            .await
    }

    async fn remove_department(&self, caller: &Caller, id: &str) -> Result<(), RemoteError> {
        self.call("removeDepartment", caller, json!({ "id": id }))
            .await
    }

    async fn add_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        id: &str,
        name: &str,
    ) -> Result<(), RemoteError> {
        let args = json!({ "departmentId": department_id, "id": id, "name": name });
        self.call("addSemester", caller, args).await
    }

    async fn edit_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
        name: &str,
    ) -> Result<(), RemoteError> {
        let args = json!({ "departmentId": department_id, "semesterId": semester_id, "name": name });
        self.call("editSemester", caller, args).await
    }

    async fn remove_semester(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
    ) -> Result<(), RemoteError> {
        let args = json!({ "departmentId": department_id, "semesterId": semester_id });
        self.call("removeSemester", caller, args).await
    }

    async fn add_subject(
        &self,
        caller: &Caller,
        department_id: &str,
        semester_id: &str,
        id: &str,
        name: &str,
    ) -> Result<(), RemoteError> {
        let args = json!({
            "departmentId": department_id,
            "semesterId": semester_id,
            "id": id,
            "name": name,
        });
        self.call("addSubject", caller, args).await
    }

    async fn edit_subject(&self, caller: &Caller, subject: &SubjectRef, name: &str) -> Result<(), RemoteError> {
        let mut args = subject_args(subject);
        args["name"] = json!(name);
        self.call("editSubject", caller, args).await
    }

    async fn remove_subject(&self, caller: &Caller, subject: &SubjectRef) -> Result<(), RemoteError> {
        self.call("removeSubject", caller, subject_args(subject))
            .await
    }

    async fn add_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        title: &str,
        content: &ResourceContent,
    ) -> Result<(), RemoteError> {
        let mut args = subject_args(subject);
        args["title"] = json!(title);
        args["content"] = encode_content(content)?;
        self.upload("addResource", caller, content, args).await
    }

    async fn edit_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        resource_id: u64,
        title: &str,
        content: &ResourceContent,
    ) -> Result<(), RemoteError> {
        let mut args = subject_args(subject);
        args["resourceId"] = json!(resource_id);
        args["title"] = json!(title);
        args["content"] = encode_content(content)?;
        self.upload("editResource", caller, content, args).await
    }

    async fn remove_resource(
        &self,
        caller: &Caller,
        subject: &SubjectRef,
        resource_id: u64,
    ) -> Result<(), RemoteError> {
        let mut args = subject_args(subject);
        args["resourceId"] = json!(resource_id);
        self.call("removeResource", caller, args).await
    }

    async fn is_caller_admin(&self, caller: &Caller) -> Result<bool, RemoteError> {
        self.call("isCallerAdmin", caller, json!({})).await
    }

    async fn get_caller_user_role(&self, caller: &Caller) -> Result<UserRole, RemoteError> {
        self.call("getCallerUserRole", caller, json!({})).await
    }

    async fn assign_caller_user_role(
        &self,
        caller: &Caller,
        user: &str,
        role: UserRole,
    ) -> Result<(), RemoteError> {
        self.call("assignCallerUserRole", caller, json!({ "user": user, "role": role }))
            .await
    }

    async fn get_caller_user_profile(&self, caller: &Caller) -> Result<Option<UserProfile>, RemoteError> {
        self.call("getCallerUserProfile", caller, json!({})).await
    }

    async fn save_caller_user_profile(
        &self,
        caller: &Caller,
        profile: &UserProfile,
    ) -> Result<(), RemoteError> {
        self.call("saveCallerUserProfile", caller, json!({ "profile": profile }))
            .await
    }

    async fn get_user_profile(&self, caller: &Caller, user: &str) -> Result<Option<UserProfile>, RemoteError> {
        self.call("getUserProfile", caller, json!({ "user": user }))
            .await
    }
}

fn subject_args(subject: &SubjectRef) -> Value {
    json!({
        "departmentId": subject.department_id,
        "semesterId": subject.semester_id,
        "subjectId": subject.subject_id,
    })
}

fn encode_content(content: &ResourceContent) -> Result<Value, RemoteError> {
    serde_json::to_value(content).map_err(|e| RemoteError::Decode(e.to_string()))
}
