pub mod chat;
pub mod command;
pub mod executor;
pub mod router;
pub mod state;
pub mod store;
pub mod task;
