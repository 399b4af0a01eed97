// src/api/http/mod.rs

mod chat;
mod handlers;
mod router;

pub use chat::chat_handler;
pub use handlers::{refresh_knowledge_handler, root_handler, stats_handler};
pub use router::http_router;
