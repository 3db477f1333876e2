use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Department {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub leader_id: Option<u64>,
}
