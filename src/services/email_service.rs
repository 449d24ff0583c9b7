use crate::entities::email_template_entity as templates;
use crate::error::{AppError, AppResult};
use crate::external::EmailMessage;
use crate::services::delivery::{DeliveryJob, DeliveryQueue};
use crate::utils::{TemplateVars, render};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

pub const TRANSACTION_CREATED: &str = "transaction_created";
pub const TRANSACTION_VALIDATED: &str = "transaction_validated";
pub const TRANSACTION_REJECTED: &str = "transaction_rejected";
pub const VERIFICATION_CODE: &str = "verification_code";

struct BuiltinTemplate {
    subject: &'static str,
    html: &'static str,
    text: &'static str,
}

const BUILTIN_CREATED: BuiltinTemplate = BuiltinTemplate {
    subject: "Exchange {{transaction_id}} received",
    html: "<p>Hello {{user_name}},</p>\
<p>We received your exchange request <strong>{{transaction_id}}</strong> of {{amount}} FCFA \
({{from_method}} to {{to_method}}). Total to pay: {{total_amount}} FCFA.</p>\
<p>You will be notified once it has been processed.</p>",
    text: "Hello {{user_name}}, we received your exchange request {{transaction_id}} of {{amount}} FCFA. Total: {{total_amount}} FCFA.",
};

const BUILTIN_VALIDATED: BuiltinTemplate = BuiltinTemplate {
    subject: "Exchange {{transaction_id}} validated",
    html: "<p>Hello {{user_name}},</p>\
<p>Your exchange <strong>{{transaction_id}}</strong> of {{amount}} FCFA to {{to_method}} has been validated.</p>\
{{#if admin_message}}<p>{{admin_message}}</p>{{/if}}\
{{#if comment}}<p>Note: {{comment}}</p>{{/if}}",
    text: "Your exchange {{transaction_id}} of {{amount}} FCFA to {{to_method}} has been validated.{{#if admin_message}} {{admin_message}}{{/if}}",
};

const BUILTIN_REJECTED: BuiltinTemplate = BuiltinTemplate {
    subject: "Exchange {{transaction_id}} rejected",
    html: "<p>Hello {{user_name}},</p>\
<p>Your exchange <strong>{{transaction_id}}</strong> of {{amount}} FCFA has been rejected.</p>\
{{#if comment}}<p>Reason: {{comment}}</p>{{/if}}",
    text: "Your exchange {{transaction_id}} of {{amount}} FCFA has been rejected.{{#if comment}} Reason: {{comment}}{{/if}}",
};

const BUILTIN_VERIFICATION: BuiltinTemplate = BuiltinTemplate {
    subject: "Your verification code",
    html: "<p>Your verification code is <strong>{{code}}</strong>. It is valid for {{minutes}} minutes.</p>",
    text: "Your verification code is {{code}}. It is valid for {{minutes}} minutes.",
};

fn builtin(template_type: &str) -> Option<&'static BuiltinTemplate> {
    match template_type {
        TRANSACTION_CREATED => Some(&BUILTIN_CREATED),
        TRANSACTION_VALIDATED => Some(&BUILTIN_VALIDATED),
        TRANSACTION_REJECTED => Some(&BUILTIN_REJECTED),
        VERIFICATION_CODE => Some(&BUILTIN_VERIFICATION),
        _ => None,
    }
}

/// Render a built-in template. Used when the database holds no usable template.
pub fn render_builtin(template_type: &str, to: &str, vars: &TemplateVars) -> AppResult<EmailMessage> {
    let tpl = builtin(template_type).ok_or_else(|| {
        AppError::InternalError(format!("No built-in email template '{template_type}'"))
    })?;
    Ok(EmailMessage {
        to: to.to_string(),
        subject: render(tpl.subject, vars)?,
        html: render(tpl.html, vars)?,
        text: Some(render(tpl.text, vars)?),
    })
}

/// Composes transactional emails from stored templates and queues them for delivery.
#[derive(Clone)]
pub struct EmailService {
    pool: DatabaseConnection,
    delivery: DeliveryQueue,
}

impl EmailService {
    pub fn new(pool: DatabaseConnection, delivery: DeliveryQueue) -> Self {
        Self { pool, delivery }
    }

    /// Resolve a template: the pair-linked id first, then the newest active template of the
    /// given type, then the built-in fallback.
    pub async fn compose(
        &self,
        template_type: &str,
        linked_template_id: Option<i64>,
        to: &str,
        vars: &TemplateVars,
    ) -> AppResult<EmailMessage> {
        let mut stored = None;
        if let Some(id) = linked_template_id {
            stored = templates::Entity::find_by_id(id)
                .filter(templates::Column::IsActive.eq(true))
                .one(&self.pool)
                .await?;
            if stored.is_none() {
                log::warn!("Linked email template {id} missing or inactive, falling back");
            }
        }
        if stored.is_none() {
            stored = templates::Entity::find()
                .filter(templates::Column::TemplateType.eq(template_type))
                .filter(templates::Column::IsActive.eq(true))
                .order_by_desc(templates::Column::UpdatedAt)
                .one(&self.pool)
                .await?;
        }

        match stored {
            Some(tpl) => Ok(EmailMessage {
                to: to.to_string(),
                subject: render(&tpl.subject, vars)?,
                html: render(&tpl.html_body, vars)?,
                text: match tpl.text_body.as_deref() {
                    Some(body) => Some(render(body, vars)?),
                    None => None,
                },
            }),
            None => render_builtin(template_type, to, vars),
        }
    }

    /// Compose and publish; problems are logged and never surface to the caller.
    pub async fn queue(
        &self,
        template_type: &str,
        linked_template_id: Option<i64>,
        to: &str,
        vars: &TemplateVars,
    ) {
        match self.compose(template_type, linked_template_id, to, vars).await {
            Ok(message) => self.delivery.publish(DeliveryJob::Email(message)),
            Err(e) => log::error!("Could not compose '{template_type}' email for {to}: {e}"),
        }
    }
}
