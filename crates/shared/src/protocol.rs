use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{SortDirection, TemplateId, UserRole};

/// Number of cards shown per listing page.
pub const PAGE_SIZE: u32 = 12;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const PUBLIC_TEMPLATES_PATH: &str = "/api/public-templates";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTemplatesQuery {
    /// Zero-based page index.
    pub page: u32,
    pub size: u32,
    pub sort: String,
    pub direction: SortDirection,
}

/// A public template card. Fields the client does not interpret are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(alias = "publicTemplateId")]
    pub id: TemplateId,
    #[serde(alias = "publicTemplateTitle")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub share_count: u64,
    /// Kept exactly as the server sent it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<serde_json::Value>,
    #[serde(
        default,
        alias = "publicTemplateContent",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePage {
    #[serde(default)]
    pub content: Vec<Template>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
}
