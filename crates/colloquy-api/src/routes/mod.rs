pub mod chat;
pub mod conversations;
pub mod openai;
pub mod provider;
pub mod status;
