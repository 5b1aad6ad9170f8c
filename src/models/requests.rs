//! Request bodies accepted by the admin and account endpoints.

use serde::Deserialize;

use super::{ResourceContent, UserRole};

/// Request body for creating a department, semester or subject.
///
/// The id is chosen by the administrator and must be unique within the parent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Request body for renaming a department, semester or subject.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameNodeRequest {
    #[serde(default)]
    pub name: String,
}

/// Request body for adding or editing a resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    #[serde(default)]
    pub title: String,
    pub content: ResourceContent,
}

/// Request body for saving the caller's profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfileRequest {
    #[serde(default)]
    pub name: String,
}

/// Request body for assigning a role to another principal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    #[serde(default)]
    pub user: String,
    pub role: UserRole,
}
