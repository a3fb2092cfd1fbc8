//! User payloads

use serde::Deserialize;

use super::SqlParam;

/// Body of `POST /api/users` and `PUT /api/users/{id}`.
///
/// Missing fields are forwarded as NULL; `insert_user` / `update_user`
/// decide whether that is acceptable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPayload {
    pub email: SqlParam,
    pub first_name: SqlParam,
    pub last_name: SqlParam,
    pub username: SqlParam,
    pub password: SqlParam,
    pub role: SqlParam,
    pub bank_name: SqlParam,
    pub bank_account: SqlParam,
}

impl UserPayload {
    /// Parameters in the order the user procedures declare them
    pub fn into_params(self) -> Vec<SqlParam> {
        vec![
            self.email,
            self.first_name,
            self.last_name,
            self.username,
            self.password,
            self.role,
            self.bank_name,
            self.bank_account,
        ]
    }
}
