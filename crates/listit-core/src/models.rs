use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// Name given to the collection every list starts with.
pub const DEFAULT_COLLECTION_NAME: &str = "General";

pub const DEFAULT_BG_COLOR: &str = "#f4f4f5";

/// Colors offered by the list/collection/note pickers.
pub const BG_PALETTE: &[&str] = &[
    "#f4f4f5", "#fee2e2", "#ffedd5", "#fef9c3", "#dcfce7", "#cffafe", "#dbeafe", "#ede9fe",
    "#fce7f3",
];

fn default_bg_color() -> String {
    DEFAULT_BG_COLOR.to_string()
}

/// Backend tables the app reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Table {
    List,
    Collection,
    Task,
    Note,
    Users,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct List {
    pub id: String,
    pub name: String,
    #[serde(default = "default_bg_color")]
    pub bg_color: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_pinned: bool,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default = "default_bg_color")]
    pub bg_color: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub is_default: bool,
    pub list_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
    /// `YYYY-MM-DD`, or a full timestamp whose date part is used.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub is_deleted: bool,
    pub collection_id: String,
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Task {
    pub fn due_on(&self) -> Option<NaiveDate> {
        let raw = self.due_date.as_deref()?.trim();
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default = "default_bg_color")]
    pub bg_color: String,
    pub collection_id: String,
}

/// Row of the `users` table. Identity itself belongs to the auth backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewList {
    pub name: String,
    pub bg_color: String,
    pub is_default: bool,
    pub is_pinned: bool,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewCollection {
    pub name: String,
    pub bg_color: String,
    pub is_default: bool,
    pub list_id: String,
}

impl NewCollection {
    /// The "General" collection inserted alongside a new list.
    pub fn general(list_id: &str) -> Self {
        Self {
            name: DEFAULT_COLLECTION_NAME.to_string(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            is_default: true,
            list_id: list_id.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewTask {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub is_completed: bool,
    pub is_priority: bool,
    pub collection_id: String,
    pub list_id: String,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub bg_color: String,
    pub is_pinned: bool,
    pub collection_id: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// Partial task update. `Some(None)` on a nullable column writes `null`.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_priority: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_row_deserializes_with_sparse_columns() {
        let json = r#"{
            "id": "t1",
            "text": "Buy milk",
            "collection_id": "c1",
            "due_date": "2024-05-01",
            "is_priority": true
        }"#;
        let task: Task = serde_json::from_str(json).expect("task row should parse");
        assert_eq!(task.text, "Buy milk");
        assert!(task.is_priority);
        assert!(!task.is_completed);
        assert_eq!(task.due_on(), NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn due_on_accepts_full_timestamps() {
        let json = r#"{"id":"t","text":"x","collection_id":"c","due_date":"2024-12-31T23:00:00+00:00"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.due_on(), NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn list_defaults_background_color() {
        let json = r#"{"id":"l1","name":"Home","user_id":"u1"}"#;
        let list: List = serde_json::from_str(json).unwrap();
        assert_eq!(list.bg_color, DEFAULT_BG_COLOR);
        assert!(!list.is_pinned);
    }

    #[test]
    fn task_patch_writes_null_for_cleared_columns() {
        let patch = TaskPatch {
            is_completed: Some(false),
            completed_at: Some(None),
            ..Default::default()
        };
        let v = serde_json::to_value(patch).unwrap();
        assert_eq!(v, serde_json::json!({"is_completed": false, "completed_at": null}));
    }

    #[test]
    fn general_collection_is_default() {
        let c = NewCollection::general("l1");
        assert_eq!(c.name, DEFAULT_COLLECTION_NAME);
        assert!(c.is_default);
        assert_eq!(c.list_id, "l1");
    }

    #[test]
    fn table_names_match_backend() {
        assert_eq!(Table::List.as_ref(), "list");
        assert_eq!(Table::Users.to_string(), "users");
    }
}
