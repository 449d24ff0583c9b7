use std::collections::{HashMap, HashSet};

use crate::entities::{
    FieldType, email_template_entity as templates, exchange_field_entity as fields,
    exchange_pair_entity as pairs, payment_method_entity as methods,
    transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateExchangeFieldRequest, CreateExchangePairRequest, CreatePaymentMethodRequest,
    DynamicFields, ExchangePairResponse, PaymentMethodResponse, UpdateExchangePairRequest,
    UpdatePaymentMethodRequest,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::Value;

/// Read side of payment methods and exchange pairs plus the admin write operations.
#[derive(Clone)]
pub struct CatalogService {
    pool: DatabaseConnection,
}

impl CatalogService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_payment_methods(
        &self,
        active_only: bool,
    ) -> AppResult<Vec<PaymentMethodResponse>> {
        let mut query = methods::Entity::find();
        if active_only {
            query = query.filter(methods::Column::IsActive.eq(true));
        }
        let list = query
            .order_by_asc(methods::Column::Name)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn get_payment_method(&self, id: i64) -> AppResult<PaymentMethodResponse> {
        methods::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))
    }

    pub async fn create_payment_method(
        &self,
        req: CreatePaymentMethodRequest,
    ) -> AppResult<PaymentMethodResponse> {
        let code = validate_method_code(&req.code)?;
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError("Name is required".to_string()));
        }
        self.ensure_code_free(&code).await?;

        let method = methods::ActiveModel {
            code: Set(code),
            name: Set(name),
            icon: Set(req.icon.filter(|i| !i.trim().is_empty())),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        log::info!("Payment method {} created", method.code);
        Ok(method.into())
    }

    async fn ensure_code_free(&self, code: &str) -> AppResult<()> {
        let taken = methods::Entity::find()
            .filter(methods::Column::Code.eq(code))
            .one(&self.pool)
            .await?
            .is_some();
        if taken {
            return Err(AppError::Conflict(format!(
                "A payment method with code {code} already exists"
            )));
        }
        Ok(())
    }

    pub async fn update_payment_method(
        &self,
        id: i64,
        req: UpdatePaymentMethodRequest,
    ) -> AppResult<PaymentMethodResponse> {
        if req.code.is_none() && req.name.is_none() && req.icon.is_none() && req.is_active.is_none()
        {
            return Err(AppError::ValidationError("Nothing to update".to_string()));
        }
        let method = methods::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;

        let code = match req.code.as_deref() {
            Some(raw) => {
                let code = validate_method_code(raw)?;
                if code != method.code {
                    self.ensure_code_free(&code).await?;
                }
                Some(code)
            }
            None => None,
        };

        let mut am = method.into_active_model();
        if let Some(code) = code {
            am.code = Set(code);
        }
        if let Some(name) = req.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::ValidationError("Name cannot be empty".to_string()));
            }
            am.name = Set(name);
        }
        if let Some(icon) = req.icon {
            am.icon = Set(Some(icon).filter(|i| !i.trim().is_empty()));
        }
        if let Some(active) = req.is_active {
            am.is_active = Set(active);
        }
        Ok(am.update(&self.pool).await?.into())
    }

    /// Methods still used by an exchange pair cannot be removed.
    pub async fn delete_payment_method(&self, id: i64) -> AppResult<()> {
        let method = methods::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment method not found".to_string()))?;
        let used = pairs::Entity::find()
            .filter(
                Condition::any()
                    .add(pairs::Column::FromMethodId.eq(id))
                    .add(pairs::Column::ToMethodId.eq(id)),
            )
            .count(&self.pool)
            .await?;
        if used > 0 {
            return Err(AppError::Conflict(format!(
                "Payment method {} is used by {used} exchange pair(s)",
                method.code
            )));
        }
        methods::Entity::delete_by_id(id).exec(&self.pool).await?;
        log::info!("Payment method {} deleted", method.code);
        Ok(())
    }

    /// All pairs with their endpoints and ordered fields. With `active_only`, a pair is
    /// listed only if it and both of its payment methods are active.
    pub async fn list_pairs(&self, active_only: bool) -> AppResult<Vec<ExchangePairResponse>> {
        let mut query = pairs::Entity::find();
        if active_only {
            query = query.filter(pairs::Column::IsActive.eq(true));
        }
        let pair_list = query.order_by_asc(pairs::Column::Id).all(&self.pool).await?;

        let method_map: HashMap<i64, methods::Model> = methods::Entity::find()
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let pair_ids: Vec<i64> = pair_list.iter().map(|p| p.id).collect();
        let mut field_map: HashMap<i64, Vec<fields::Model>> = HashMap::new();
        if !pair_ids.is_empty() {
            let field_rows = fields::Entity::find()
                .filter(fields::Column::ExchangePairId.is_in(pair_ids))
                .order_by_asc(fields::Column::FieldOrder)
                .order_by_asc(fields::Column::Id)
                .all(&self.pool)
                .await?;
            for f in field_rows {
                field_map.entry(f.exchange_pair_id).or_default().push(f);
            }
        }

        let mut out = Vec::with_capacity(pair_list.len());
        for pair in pair_list {
            let (Some(from), Some(to)) = (
                method_map.get(&pair.from_method_id),
                method_map.get(&pair.to_method_id),
            ) else {
                log::warn!("Exchange pair {} references a missing payment method", pair.id);
                continue;
            };
            if active_only && !(from.is_active && to.is_active) {
                continue;
            }
            let pair_fields = field_map.remove(&pair.id).unwrap_or_default();
            out.push(ExchangePairResponse::assemble(
                pair,
                from.clone(),
                to.clone(),
                pair_fields,
            ));
        }
        Ok(out)
    }

    pub async fn get_pair(&self, id: i64) -> AppResult<ExchangePairResponse> {
        let pair = self
            .find_pair(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exchange pair not found".to_string()))?;
        let (from, to) = self.pair_methods(&pair).await?;
        let pair_fields = self.fields_for_pair(pair.id).await?;
        Ok(ExchangePairResponse::assemble(pair, from, to, pair_fields))
    }

    pub async fn find_pair(&self, id: i64) -> AppResult<Option<pairs::Model>> {
        Ok(pairs::Entity::find_by_id(id).one(&self.pool).await?)
    }

    pub async fn fields_for_pair(&self, pair_id: i64) -> AppResult<Vec<fields::Model>> {
        Ok(fields::Entity::find()
            .filter(fields::Column::ExchangePairId.eq(pair_id))
            .order_by_asc(fields::Column::FieldOrder)
            .order_by_asc(fields::Column::Id)
            .all(&self.pool)
            .await?)
    }

    pub async fn pair_methods(
        &self,
        pair: &pairs::Model,
    ) -> AppResult<(methods::Model, methods::Model)> {
        let from = methods::Entity::find_by_id(pair.from_method_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Source payment method not found".to_string()))?;
        let to = methods::Entity::find_by_id(pair.to_method_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Destination payment method not found".to_string())
            })?;
        Ok((from, to))
    }

    pub async fn create_pair(
        &self,
        req: CreateExchangePairRequest,
    ) -> AppResult<ExchangePairResponse> {
        validate_pair_terms(&req)?;

        let txn = self.pool.begin().await?;
        ensure_templates_exist(
            &txn,
            [req.validated_email_template_id, req.rejected_email_template_id],
        )
        .await?;

        for method_id in [req.from_method_id, req.to_method_id] {
            if methods::Entity::find_by_id(method_id).one(&txn).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Payment method {method_id} not found"
                )));
            }
        }

        let duplicate = pairs::Entity::find()
            .filter(pairs::Column::FromMethodId.eq(req.from_method_id))
            .filter(pairs::Column::ToMethodId.eq(req.to_method_id))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict(
                "An exchange pair already exists for these payment methods".to_string(),
            ));
        }

        let now = Utc::now();
        let pair = pairs::ActiveModel {
            from_method_id: Set(req.from_method_id),
            to_method_id: Set(req.to_method_id),
            fee_percentage: Set(req.fee_percentage),
            tax_amount: Set(req.tax_amount),
            min_amount: Set(req.min_amount),
            max_amount: Set(req.max_amount),
            category: Set(req.category),
            requires_additional_info: Set(req.requires_additional_info),
            automatic_processing: Set(req.automatic_processing),
            is_active: Set(true),
            payment_syntax_type: Set(req.payment_syntax_type),
            payment_syntax_value: Set(req.payment_syntax_value),
            instruction_title: Set(req.instruction_title),
            instruction_content: Set(req.instruction_content),
            instruction_link_url: Set(req.instruction_link_url),
            instruction_link_text: Set(req.instruction_link_text),
            from_number_label: Set(req.from_number_label),
            from_number_placeholder: Set(req.from_number_placeholder),
            to_number_label: Set(req.to_number_label),
            to_number_placeholder: Set(req.to_number_placeholder),
            show_to_number: Set(req.show_to_number.unwrap_or(true)),
            amount_label: Set(req.amount_label),
            amount_placeholder: Set(req.amount_placeholder),
            reference_required: Set(req.reference_required.unwrap_or(true)),
            reference_label: Set(req.reference_label),
            reference_placeholder: Set(req.reference_placeholder),
            validated_email_template_id: Set(req.validated_email_template_id),
            rejected_email_template_id: Set(req.rejected_email_template_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_fields(&txn, pair.id, req.fields, now).await?;

        txn.commit().await?;
        log::info!(
            "Exchange pair {} created ({} -> {})",
            pair.id,
            pair.from_method_id,
            pair.to_method_id
        );

        self.get_pair(pair.id).await
    }

    pub async fn set_pair_active(&self, id: i64, active: bool) -> AppResult<ExchangePairResponse> {
        let pair = self
            .find_pair(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exchange pair not found".to_string()))?;
        let mut am = pair.into_active_model();
        am.is_active = Set(active);
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;
        self.get_pair(id).await
    }

    /// Apply a partial update. Bounds are checked on the merged values, and a given field
    /// list replaces the old one in the same database transaction.
    pub async fn update_pair(
        &self,
        id: i64,
        req: UpdateExchangePairRequest,
    ) -> AppResult<ExchangePairResponse> {
        let txn = self.pool.begin().await?;
        let pair = pairs::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Exchange pair not found".to_string()))?;

        validate_terms(
            req.fee_percentage.unwrap_or(pair.fee_percentage),
            req.tax_amount.unwrap_or(pair.tax_amount),
            req.min_amount.unwrap_or(pair.min_amount),
            req.max_amount.unwrap_or(pair.max_amount),
        )?;
        if let Some(list) = &req.fields {
            validate_fields(list)?;
        }
        ensure_templates_exist(
            &txn,
            [req.validated_email_template_id, req.rejected_email_template_id],
        )
        .await?;

        let now = Utc::now();
        let mut am = pair.into_active_model();
        if let Some(v) = req.fee_percentage {
            am.fee_percentage = Set(v);
        }
        if let Some(v) = req.tax_amount {
            am.tax_amount = Set(v);
        }
        if let Some(v) = req.min_amount {
            am.min_amount = Set(v);
        }
        if let Some(v) = req.max_amount {
            am.max_amount = Set(v);
        }
        if let Some(v) = req.requires_additional_info {
            am.requires_additional_info = Set(v);
        }
        if let Some(v) = req.automatic_processing {
            am.automatic_processing = Set(v);
        }
        if let Some(v) = req.is_active {
            am.is_active = Set(v);
        }
        if let Some(v) = req.show_to_number {
            am.show_to_number = Set(v);
        }
        if let Some(v) = req.reference_required {
            am.reference_required = Set(v);
        }
        // nullable columns: a given value replaces the stored one
        if let Some(v) = req.category {
            am.category = Set(Some(v));
        }
        if let Some(v) = req.payment_syntax_type {
            am.payment_syntax_type = Set(Some(v));
        }
        if let Some(v) = req.payment_syntax_value {
            am.payment_syntax_value = Set(Some(v));
        }
        if let Some(v) = req.instruction_title {
            am.instruction_title = Set(Some(v));
        }
        if let Some(v) = req.instruction_content {
            am.instruction_content = Set(Some(v));
        }
        if let Some(v) = req.instruction_link_url {
            am.instruction_link_url = Set(Some(v));
        }
        if let Some(v) = req.instruction_link_text {
            am.instruction_link_text = Set(Some(v));
        }
        if let Some(v) = req.from_number_label {
            am.from_number_label = Set(Some(v));
        }
        if let Some(v) = req.from_number_placeholder {
            am.from_number_placeholder = Set(Some(v));
        }
        if let Some(v) = req.to_number_label {
            am.to_number_label = Set(Some(v));
        }
        if let Some(v) = req.to_number_placeholder {
            am.to_number_placeholder = Set(Some(v));
        }
        if let Some(v) = req.amount_label {
            am.amount_label = Set(Some(v));
        }
        if let Some(v) = req.amount_placeholder {
            am.amount_placeholder = Set(Some(v));
        }
        if let Some(v) = req.reference_label {
            am.reference_label = Set(Some(v));
        }
        if let Some(v) = req.reference_placeholder {
            am.reference_placeholder = Set(Some(v));
        }
        if let Some(v) = req.validated_email_template_id {
            am.validated_email_template_id = Set(Some(v));
        }
        if let Some(v) = req.rejected_email_template_id {
            am.rejected_email_template_id = Set(Some(v));
        }
        am.updated_at = Set(now);
        am.update(&txn).await?;

        if let Some(list) = req.fields {
            fields::Entity::delete_many()
                .filter(fields::Column::ExchangePairId.eq(id))
                .exec(&txn)
                .await?;
            insert_fields(&txn, id, list, now).await?;
        }

        txn.commit().await?;
        log::info!("Exchange pair {id} updated");
        self.get_pair(id).await
    }

    /// Pairs referenced by transactions are kept; deactivate them instead.
    pub async fn delete_pair(&self, id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        if pairs::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(AppError::NotFound("Exchange pair not found".to_string()));
        }
        let used = transactions::Entity::find()
            .filter(transactions::Column::ExchangePairId.eq(id))
            .count(&txn)
            .await?;
        if used > 0 {
            return Err(AppError::Conflict(format!(
                "Exchange pair {id} is used by {used} transaction(s)"
            )));
        }
        fields::Entity::delete_many()
            .filter(fields::Column::ExchangePairId.eq(id))
            .exec(&txn)
            .await?;
        pairs::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        log::info!("Exchange pair {id} deleted");
        Ok(())
    }
}

fn validate_method_code(raw: &str) -> AppResult<String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(AppError::ValidationError("Code is required".to_string()));
    }
    if code.chars().any(|c| c.is_lowercase()) {
        return Err(AppError::ValidationError(
            "Code must be upper case".to_string(),
        ));
    }
    Ok(code.to_string())
}

async fn ensure_templates_exist<C: ConnectionTrait>(
    conn: &C,
    ids: [Option<i64>; 2],
) -> AppResult<()> {
    for id in ids.into_iter().flatten() {
        if templates::Entity::find_by_id(id).one(conn).await?.is_none() {
            return Err(AppError::NotFound(format!("Email template {id} not found")));
        }
    }
    Ok(())
}

/// Store fields in request order with JSON-encoded options.
async fn insert_fields<C: ConnectionTrait>(
    conn: &C,
    pair_id: i64,
    list: Vec<CreateExchangeFieldRequest>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    for (order, field) in list.into_iter().enumerate() {
        let options = match field.options {
            Some(list) => Some(serde_json::to_string(&list)?),
            None => None,
        };
        fields::ActiveModel {
            exchange_pair_id: Set(pair_id),
            field_name: Set(field.field_name.trim().to_string()),
            field_type: Set(field.field_type),
            field_label: Set(field.field_label),
            placeholder: Set(field.placeholder),
            is_required: Set(field.is_required),
            options: Set(options),
            field_order: Set(order as i32),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

fn validate_pair_terms(req: &CreateExchangePairRequest) -> AppResult<()> {
    if req.from_method_id == req.to_method_id {
        return Err(AppError::ValidationError(
            "Source and destination payment methods must differ".to_string(),
        ));
    }
    validate_terms(
        req.fee_percentage,
        req.tax_amount,
        req.min_amount,
        req.max_amount,
    )?;
    validate_fields(&req.fields)
}

fn validate_terms(
    fee_percentage: f64,
    tax_amount: f64,
    min_amount: f64,
    max_amount: f64,
) -> AppResult<()> {
    if !(0.0..=100.0).contains(&fee_percentage) {
        return Err(AppError::ValidationError(
            "fee_percentage must be between 0 and 100".to_string(),
        ));
    }
    if tax_amount < 0.0 {
        return Err(AppError::ValidationError(
            "tax_amount cannot be negative".to_string(),
        ));
    }
    if min_amount <= 0.0 || max_amount < min_amount {
        return Err(AppError::ValidationError(
            "Amount bounds must satisfy 0 < min_amount <= max_amount".to_string(),
        ));
    }
    Ok(())
}

fn validate_fields(list: &[CreateExchangeFieldRequest]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for field in list {
        let name = field.field_name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("field_name is required".to_string()));
        }
        if !seen.insert(name.to_string()) {
            return Err(AppError::ValidationError(format!(
                "Duplicate field name '{name}'"
            )));
        }
        if field.field_type == FieldType::Select
            && field.options.as_ref().is_none_or(|o| o.is_empty())
        {
            return Err(AppError::ValidationError(format!(
                "Select field '{name}' needs at least one option"
            )));
        }
    }
    Ok(())
}

fn answer_as_text(name: &str, value: &Value) -> AppResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(AppError::ValidationError(format!(
            "Field '{name}' must be a scalar value"
        ))),
    }
}

/// Check user answers against the pair's declared extra fields.
pub fn validate_dynamic_fields(
    declared: &[fields::Model],
    answers: &DynamicFields,
) -> AppResult<()> {
    let by_name: HashMap<&str, &fields::Model> = declared
        .iter()
        .map(|f| (f.field_name.as_str(), f))
        .collect();

    if let Some(unknown) = answers.keys().find(|k| !by_name.contains_key(k.as_str())) {
        return Err(AppError::ValidationError(format!(
            "Unknown field '{unknown}'"
        )));
    }

    for field in declared {
        let text = match answers.get(&field.field_name) {
            Some(v) => answer_as_text(&field.field_name, v)?,
            None => None,
        };
        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => {
                if field.is_required {
                    return Err(AppError::ValidationError(format!(
                        "Field '{}' is required",
                        field.field_label
                    )));
                }
                continue;
            }
        };

        match field.field_type {
            FieldType::Number => {
                if text.parse::<f64>().is_err() {
                    return Err(AppError::ValidationError(format!(
                        "Field '{}' must be a number",
                        field.field_label
                    )));
                }
            }
            FieldType::Email => {
                if !text.contains('@') {
                    return Err(AppError::ValidationError(format!(
                        "Field '{}' must be an email address",
                        field.field_label
                    )));
                }
            }
            FieldType::Select => {
                let options = field.decoded_options().unwrap_or_default();
                if !options.iter().any(|o| o == &text) {
                    return Err(AppError::ValidationError(format!(
                        "Field '{}' must be one of: {}",
                        field.field_label,
                        options.join(", ")
                    )));
                }
            }
            FieldType::Text
            | FieldType::Tel
            | FieldType::Textarea
            | FieldType::Date => {}
        }
    }
    Ok(())
}

/// Load a pair inside an open transaction or connection.
pub(crate) async fn find_active_pair<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> AppResult<pairs::Model> {
    let pair = pairs::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Exchange pair not found".to_string()))?;
    if !pair.is_active {
        return Err(AppError::ValidationError(
            "This exchange pair is not available".to_string(),
        ));
    }
    Ok(pair)
}
