//! Signed-in user and token storage, keyed `<role>_token` and `<role>_userData`.

use crate::core::cache::{KeyValueCollection, get_json, put_json};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn session_key(role: Role, key: &str) -> String {
    format!("{}_{}", role.as_str(), key)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueCollection>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueCollection>) -> Self {
        Self { storage }
    }

    pub async fn login(&self, role: Role, user: &SessionUser, token: &str) -> Result<()> {
        put_json(self.storage.as_ref(), &session_key(role, "token"), &token, None).await?;
        put_json(self.storage.as_ref(), &session_key(role, "userData"), user, None).await?;
        debug!(%role, user = %user.id, "Signed in");
        Ok(())
    }

    pub async fn logout(&self, role: Role) {
        self.storage
            .remove(session_key(role, "token").as_bytes())
            .await;
        self.storage
            .remove(session_key(role, "userData").as_bytes())
            .await;
        debug!(%role, "Signed out");
    }

    pub async fn token(&self, role: Role) -> Option<String> {
        get_json(self.storage.as_ref(), &session_key(role, "token")).await
    }

    pub async fn user(&self, role: Role) -> Option<SessionUser> {
        get_json(self.storage.as_ref(), &session_key(role, "userData")).await
    }
}
