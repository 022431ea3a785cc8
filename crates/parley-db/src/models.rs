/// Database row types — these map directly to SQLite rows.
/// Distinct from parley-types models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ThreadRow {
    pub id: String,
    pub user_low: i64,
    pub user_high: i64,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub thread_id: String,
    pub sender_id: i64,
    pub text: String,
    pub created_at: String,
    pub is_read: bool,
}
