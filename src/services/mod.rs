pub mod admin_service;
pub mod auth_service;
pub mod catalog_service;
pub mod config_service;
pub mod delivery;
pub mod email_service;
pub mod limit_service;
pub mod notification_service;
pub mod transaction_service;
pub mod user_service;

pub use admin_service::*;
pub use auth_service::*;
pub use catalog_service::*;
pub use config_service::*;
pub use delivery::*;
pub use email_service::*;
pub use limit_service::*;
pub use notification_service::*;
pub use transaction_service::*;
pub use user_service::*;
