pub mod code_generator;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod phone;
pub mod template;

pub use code_generator::{generate_six_digit_code, generate_transaction_id};
pub use jwt::*;
pub use pagination::normalize_page;
pub use password::*;
pub use phone::*;
pub use template::{TemplateVars, render};
