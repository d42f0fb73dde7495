// Adapters layer: concrete implementations for external systems (SQLite storage, HTTP).

pub mod http;
pub mod storage;
