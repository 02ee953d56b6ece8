pub mod error;
pub mod event;
pub mod message;
pub mod session;
pub mod traits;

pub use error::InkError;
pub use event::{Diagnostic, StreamEvent, TurnOutcome};
pub use message::{ChatRequestBody, Message, Role, StreamRequest};
pub use session::SessionId;
pub use traits::StreamHandler;
