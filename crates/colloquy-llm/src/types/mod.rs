pub mod message;

pub use message::{Message, Role, UnknownRole};
