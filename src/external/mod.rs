pub mod mailer;
pub mod push;

pub use mailer::*;
pub use push::*;
