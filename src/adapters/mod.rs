// Adapters layer: concrete implementations for external systems (storage, http, notifications).

pub mod http;
pub mod notify;
pub mod storage;

pub use http::HttpAssignmentClient;
pub use notify::ConsoleNotifier;
pub use storage::LocalStorage;
