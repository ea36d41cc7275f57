// Users and site settings.
//
// Neither collection is paginated: both GETs take no query parameters and
// return the full set.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::client::AdminClient;
use crate::error::Error;
use crate::list::{ListParams, ListResult};
use crate::models::{Setting, SettingPayload, User, UserPayload};

pub(crate) const USERS: &str = "/api/admin/users";
pub(crate) const SETTINGS: &str = "/api/admin/settings";

impl AdminClient {
    // ── Users ────────────────────────────────────────────────────────

    pub async fn list_users(&self) -> Result<ListResult<User>, Error> {
        self.list_of(USERS, &ListParams::default()).await
    }

    pub async fn create_user(&self, payload: &UserPayload) -> Result<Value, Error> {
        self.post(USERS, payload).await
    }

    pub async fn update_user(&self, id: u64, payload: &UserPayload) -> Result<Value, Error> {
        self.put(&format!("{USERS}/{id}"), payload).await
    }

    pub async fn delete_user(&self, id: u64) -> Result<Value, Error> {
        self.delete(&format!("{USERS}/{id}"), &BTreeMap::<String, String>::new())
            .await
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub async fn list_settings(&self) -> Result<ListResult<Setting>, Error> {
        self.list_of(SETTINGS, &ListParams::default()).await
    }

    /// Create or overwrite a setting. The server upserts by key, so this is
    /// used for both create and update.
    pub async fn put_setting(&self, payload: &SettingPayload) -> Result<Value, Error> {
        self.put(SETTINGS, payload).await
    }

    pub async fn delete_setting(&self, key: &str) -> Result<Value, Error> {
        self.delete(SETTINGS, &[("key", key)]).await
    }
}
