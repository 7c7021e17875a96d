pub mod service;


pub use service::{ChatError, ChatReply, ChatService, ChatStage};
