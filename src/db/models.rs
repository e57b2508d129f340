use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Profile key holding the user's display name.
pub const DISPLAY_NAME_FIELD: &str = "name";

/// Shown in place of a display name the user never supplied.
pub const DISPLAY_NAME_PLACEHOLDER: &str = "No name found";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Extra registration fields, stored verbatim.
    pub profile: Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> Option<&str> {
        self.profile
            .get(DISPLAY_NAME_FIELD)
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// A user record as handed to the store for insertion. The store assigns the
/// id and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub profile: Map<String, Value>,
}

impl NewUser {
    pub fn new(email: String, password_hash: String, profile: Map<String, Value>) -> Self {
        Self {
            email,
            password_hash,
            profile,
        }
    }

    pub fn into_user(self, id: Uuid) -> User {
        User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            profile: Json(self.profile),
            created_at: Utc::now(),
        }
    }
}
