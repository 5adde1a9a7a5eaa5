/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an opaque document id
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
