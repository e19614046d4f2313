// Moderation infra layer.
// - `sqlite_alert_store.rs` persists moderation alerts to SQLite.
// - `in_memory.rs` keeps them in a DashMap for throwaway runs and tests.

pub mod in_memory;
pub mod sqlite_alert_store;

pub use in_memory::InMemoryAlertStore;
pub use sqlite_alert_store::SqliteAlertStore;
