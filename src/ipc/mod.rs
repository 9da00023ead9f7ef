pub mod runtime;
pub mod server;

pub use server::{Command, CommandListener, SessionStatus, client_request};
