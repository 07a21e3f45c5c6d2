//! Entity types persisted by the repository layer.
//!
//! Each entity is stored as one JSON document with camelCase field names.
//! An empty `id` means "not yet assigned"; repositories mint one on create.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// An organization owning projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Unique identifier (`org_...`)
    pub id: String,

    /// Short alias derived from the id
    #[serde(default)]
    pub slug: String,

    /// Display name
    pub name: String,

    /// Owning user
    pub user_id: String,

    /// When this organization was created
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub created_by: String,

    #[serde(default)]
    pub updated_by: String,
}

impl Organization {
    pub fn new(name: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            slug: String::new(),
            name: name.into(),
            user_id: user_id.into(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            updated_by: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = actor.into();
        self.updated_by = self.created_by.clone();
        self
    }
}

/// Default project status.
pub const PROJECT_STATUS_ACTIVE: &str = "active";

fn default_project_status() -> String {
    PROJECT_STATUS_ACTIVE.to_string()
}

/// A project inside an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    pub organization_id: String,
    #[serde(default)]
    pub description: String,
    /// Lifecycle status; `active` unless set
    #[serde(default = "default_project_status")]
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
}

impl Project {
    pub fn new(organization_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            slug: String::new(),
            name: name.into(),
            organization_id: organization_id.into(),
            description: String::new(),
            status: String::new(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            updated_by: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

/// Where a datasource's engine runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceKind {
    #[default]
    Embedded,
    Remote,
}

/// A configured connection to a data provider.
///
/// `config` holds provider-specific settings. Fields the provider schema
/// marks as secret are stored protected and returned in plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub project_id: String,
    #[serde(rename = "datasource_provider")]
    pub provider: String,
    #[serde(rename = "datasource_driver", default)]
    pub driver: String,
    #[serde(rename = "datasource_kind", default)]
    pub kind: DatasourceKind,
    #[serde(default)]
    pub config: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remixed_from: Option<String>,
}

impl Datasource {
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            slug: String::new(),
            name: name.into(),
            description: String::new(),
            project_id: project_id.into(),
            provider: provider.into(),
            driver: String::new(),
            kind: DatasourceKind::default(),
            config: Map::new(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            updated_by: String::new(),
            is_public: false,
            remixed_from: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    pub fn with_kind(mut self, kind: DatasourceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Replace the configuration. Non-object values yield an empty config.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = match config {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    /// String value of one configuration field.
    pub fn config_str(&self, field: &str) -> Option<&str> {
        self.config.get(field).and_then(Value::as_str)
    }
}

/// A chat conversation inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_message: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub task_id: String,
    /// Datasource ids attached to the conversation
    #[serde(default)]
    pub datasources: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remixed_from: Option<String>,
}

impl Conversation {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            slug: String::new(),
            title: title.into(),
            seed_message: None,
            project_id: project_id.into(),
            task_id: String::new(),
            datasources: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            updated_by: String::new(),
            is_public: false,
            remixed_from: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    pub fn with_seed_message(mut self, message: impl Into<String>) -> Self {
        self.seed_message = Some(message.into());
        self
    }

    pub fn with_datasources(mut self, datasources: Vec<String>) -> Self {
        self.datasources = datasources;
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    /// Message body (parts, text); opaque to the store
    #[serde(default = "empty_object")]
    pub content: Value,
    pub role: MessageRole,
    #[serde(default = "empty_object")]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
}

impl Message {
    pub fn new(conversation_id: impl Into<String>, role: MessageRole, content: Value) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            conversation_id: conversation_id.into(),
            content,
            role,
            metadata: empty_object(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            updated_by: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }
}

fn default_notebook_version() -> u32 {
    1
}

/// Blank or non-string descriptions read back as `None`.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        _ => None,
    })
}

/// A notebook of query cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    pub project_id: String,
    #[serde(default)]
    pub datasources: Vec<String>,
    /// Cell documents; opaque to the store
    #[serde(default)]
    pub cells: Vec<Value>,
    #[serde(default = "default_notebook_version")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remixed_from: Option<String>,
}

impl Notebook {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            slug: String::new(),
            title: title.into(),
            description: None,
            project_id: project_id.into(),
            datasources: Vec::new(),
            cells: Vec::new(),
            version: default_notebook_version(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            is_public: false,
            remixed_from: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cells(mut self, cells: Vec<Value>) -> Self {
        self.cells = cells;
        self
    }
}

/// Resource consumption recorded for one model call.
///
/// Usage records are keyed by a numeric id, milliseconds since the epoch
/// when the caller does not supply one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub id: i64,
    pub conversation_id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub user_id: String,
    pub model: String,
    #[serde(default)]
    pub input_tokens: i64,
    #[serde(default)]
    pub output_tokens: i64,
    #[serde(default)]
    pub total_tokens: i64,
    #[serde(default)]
    pub reasoning_tokens: i64,
    #[serde(default)]
    pub cached_input_tokens: i64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub context_size: i64,
    #[serde(default)]
    pub credits_cap: f64,
    #[serde(default)]
    pub credits_used: f64,
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub memory: f64,
    #[serde(default)]
    pub network: f64,
    #[serde(default)]
    pub gpu: f64,
    #[serde(default)]
    pub storage: f64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Usage {
    pub fn new(conversation_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: 0,
            conversation_id: conversation_id.into(),
            project_id: String::new(),
            organization_id: String::new(),
            user_id: String::new(),
            model: model.into(),
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            reasoning_tokens: 0,
            cached_input_tokens: 0,
            cost: 0.0,
            context_size: 0,
            credits_cap: 0.0,
            credits_used: 0.0,
            cpu: 0.0,
            memory: 0.0,
            network: 0.0,
            gpu: 0.0,
            storage: 0.0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Set input and output token counts; the total is their sum.
    pub fn with_tokens(mut self, input: i64, output: i64) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self.total_tokens = input + output;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = at;
        self
    }

    pub fn with_owner(
        mut self,
        project_id: impl Into<String>,
        organization_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        self.project_id = project_id.into();
        self.organization_id = organization_id.into();
        self.user_id = user_id.into();
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// A local user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            username: username.into(),
            role: UserRole::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_datasource_row_field_names() {
        let datasource = Datasource::new("prj_1", "warehouse", "postgres")
            .with_driver("pg")
            .with_config(json!({"host": "db"}));
        let row = serde_json::to_value(&datasource).unwrap();

        assert_eq!(row["datasource_provider"], "postgres");
        assert_eq!(row["datasource_driver"], "pg");
        assert_eq!(row["datasource_kind"], "embedded");
        assert_eq!(row["projectId"], "prj_1");
        assert_eq!(row["config"]["host"], "db");
        assert!(row.get("remixedFrom").is_none());
    }

    #[test]
    fn test_with_config_ignores_non_objects() {
        let datasource = Datasource::new("prj_1", "d", "duckdb").with_config(json!("nope"));
        assert!(datasource.config.is_empty());
    }

    #[test]
    fn test_project_status_defaults_on_read() {
        let project: Project = serde_json::from_value(json!({
            "id": "prj_1",
            "name": "p",
            "organizationId": "org_1",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(project.status, "active");
        assert_eq!(project.description, "");
    }

    #[test]
    fn test_notebook_blank_description_and_version() {
        let notebook: Notebook = serde_json::from_value(json!({
            "id": "nbk_1",
            "title": "n",
            "description": "   ",
            "projectId": "prj_1",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(notebook.description, None);
        assert_eq!(notebook.version, 1);
        assert!(notebook.cells.is_empty());
    }

    #[test]
    fn test_message_defaults() {
        let message: Message = serde_json::from_value(json!({
            "id": "msg_1",
            "conversationId": "conv_1",
            "role": "assistant",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content, json!({}));
        assert_eq!(message.metadata, json!({}));
    }

    #[test]
    fn test_usage_builder() {
        let usage = Usage::new("conv_1", "gpt").with_tokens(10, 5).with_cost(0.25);
        assert_eq!(usage.total_tokens, 15);
        assert_eq!(usage.id, 0);
    }

    #[test]
    fn test_user_role_defaults() {
        let user: User = serde_json::from_value(json!({
            "id": "usr_1",
            "username": "ada",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.role, UserRole::User);
    }
}
