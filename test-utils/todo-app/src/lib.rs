//! To-do web application served as the subject of the end-to-end suites.
//!
//! State lives in memory for the lifetime of the process; `POST /reset-db`
//! empties it between tests.

pub mod api;
pub mod page;
pub mod server;
pub mod store;

pub use api::create_router;
pub use store::{Todo, TodoStatus, TodoStore, TodoUpdate};
