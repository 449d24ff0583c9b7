pub mod admin_permissions;
pub mod admins;
pub mod app_config;
pub mod email_templates;
pub mod exchange_fields;
pub mod exchange_pairs;
pub mod notifications;
pub mod payment_methods;
pub mod permissions;
pub mod push_subscriptions;
pub mod transaction_history;
pub mod transactions;
pub mod users;

pub use admin_permissions as admin_permission_entity;
pub use admins as admin_entity;
pub use app_config as config_entity;
pub use email_templates as email_template_entity;
pub use exchange_fields as exchange_field_entity;
pub use exchange_pairs as exchange_pair_entity;
pub use notifications as notification_entity;
pub use payment_methods as payment_method_entity;
pub use permissions as permission_entity;
pub use push_subscriptions as push_subscription_entity;
pub use transaction_history as transaction_history_entity;
pub use transactions as transaction_entity;
pub use users as user_entity;

pub use exchange_fields::FieldType;
pub use exchange_pairs::PairCategory;
pub use transactions::TransactionStatus;
pub use users::KycStatus;
