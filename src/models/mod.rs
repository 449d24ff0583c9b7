pub mod auth;
pub mod common;
pub mod exchange_pair;
pub mod limit;
pub mod notification;
pub mod pagination;
pub mod settings;
pub mod transaction;
pub mod user;

pub use auth::*;
pub use common::*;
pub use exchange_pair::*;
pub use limit::*;
pub use notification::*;
pub use pagination::*;
pub use settings::*;
pub use transaction::*;
pub use user::*;
