use uuid::Uuid;

/// Create a prefixed, time-sortable identifier, e.g. `msg_0192c3...`
pub fn create_object_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::now_v7().simple())
}

pub fn create_message_id() -> String {
    create_object_id("msg")
}
