mod common;

use common::*;
use emb_exchange::AppError;
use emb_exchange::entities::{
    FieldType, exchange_field_entity as fields, transaction_entity as transactions,
};
use emb_exchange::models::{
    CreateExchangeFieldRequest, CreatePaymentMethodRequest, UpdateExchangePairRequest,
    UpdatePaymentMethodRequest,
};
use sea_orm::{EntityTrait, PaginatorTrait};

fn method(code: &str, name: &str) -> CreatePaymentMethodRequest {
    CreatePaymentMethodRequest {
        code: code.to_string(),
        name: name.to_string(),
        icon: None,
    }
}

fn text_field(name: &str) -> CreateExchangeFieldRequest {
    CreateExchangeFieldRequest {
        field_name: name.to_string(),
        field_type: FieldType::Text,
        field_label: name.to_string(),
        placeholder: None,
        is_required: false,
        options: None,
    }
}

#[tokio::test]
async fn payment_methods_are_created_with_unique_upper_case_codes() {
    let app = setup().await;

    let mixx = app
        .catalog
        .create_payment_method(method(" MIXX ", "Mixx by Yas"))
        .await
        .unwrap();
    assert_eq!(mixx.code, "MIXX");
    assert!(mixx.is_active);

    let err = app
        .catalog
        .create_payment_method(method("wave", "Wave"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = app
        .catalog
        .create_payment_method(method("MIXX", "Another"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = app
        .catalog
        .create_payment_method(method("WAVE", "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn payment_method_update_renames_and_deactivates() {
    let app = setup().await;
    let mixx = app
        .catalog
        .create_payment_method(method("MIXX", "Mixx"))
        .await
        .unwrap();
    app.catalog
        .create_payment_method(method("WAVE", "Wave"))
        .await
        .unwrap();

    let err = app
        .catalog
        .update_payment_method(mixx.id, UpdatePaymentMethodRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = app
        .catalog
        .update_payment_method(
            mixx.id,
            UpdatePaymentMethodRequest {
                code: Some("WAVE".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let updated = app
        .catalog
        .update_payment_method(
            mixx.id,
            UpdatePaymentMethodRequest {
                name: Some("Mixx by Yas".to_string()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Mixx by Yas");
    assert!(!updated.is_active);

    let active = app.catalog.list_payment_methods(true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].code, "WAVE");
    assert_eq!(app.catalog.list_payment_methods(false).await.unwrap().len(), 2);

    let err = app
        .catalog
        .update_payment_method(
            4242,
            UpdatePaymentMethodRequest {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn payment_method_in_use_cannot_be_deleted() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let pair = app.catalog.get_pair(pair_id).await.unwrap();
    let spare = app
        .catalog
        .create_payment_method(method("WAVE", "Wave"))
        .await
        .unwrap();

    let err = app
        .catalog
        .delete_payment_method(pair.from_method.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    app.catalog.delete_payment_method(spare.id).await.unwrap();
    let err = app.catalog.get_payment_method(spare.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn pair_update_changes_terms_and_replaces_fields() {
    let app = setup().await;
    let tmoney = insert_method(&app.db, "tmoney", "T-Money").await;
    let flooz = insert_method(&app.db, "flooz", "Flooz").await;
    let mut req = basic_pair_request(tmoney.id, flooz.id, 2.0, 100.0, 500.0, 50_000.0);
    req.fields = vec![text_field("old_note")];
    let pair = app.catalog.create_pair(req).await.unwrap();

    let updated = app
        .catalog
        .update_pair(
            pair.id,
            UpdateExchangePairRequest {
                fee_percentage: Some(3.0),
                max_amount: Some(40_000.0),
                instruction_title: Some("Dial *145#".to_string()),
                fields: Some(vec![text_field("sender_name"), text_field("reason")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.fee_percentage, 3.0);
    assert_eq!(updated.tax_amount, 100.0);
    assert_eq!(updated.max_amount, 40_000.0);
    let names: Vec<_> = updated.fields.iter().map(|f| f.field_name.as_str()).collect();
    assert_eq!(names, vec!["sender_name", "reason"]);
    assert_eq!(fields::Entity::find().count(&app.db).await.unwrap(), 2);

    // leaving fields out keeps them
    app.catalog
        .update_pair(
            pair.id,
            UpdateExchangePairRequest {
                tax_amount: Some(50.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(app.catalog.get_pair(pair.id).await.unwrap().fields.len(), 2);
}

#[tokio::test]
async fn rejected_pair_update_changes_nothing() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;

    let err = app
        .catalog
        .update_pair(
            pair_id,
            UpdateExchangePairRequest {
                min_amount: Some(60_000.0),
                fields: Some(vec![text_field("note")]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = app
        .catalog
        .update_pair(
            pair_id,
            UpdateExchangePairRequest {
                validated_email_template_id: Some(4242),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let pair = app.catalog.get_pair(pair_id).await.unwrap();
    assert_eq!(pair.min_amount, 500.0);
    assert!(pair.fields.is_empty());

    let err = app
        .catalog
        .update_pair(4242, UpdateExchangePairRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn pair_with_transactions_is_kept() {
    let app = setup().await;
    let used_id = money_exchange_pair(&app).await;
    let used = app.catalog.get_pair(used_id).await.unwrap();
    let user = insert_user(&app.db, "94000001", None).await;
    app.transactions
        .create(user.id, pair_request(used_id, 1000.0, "REF-KEEP"))
        .await
        .unwrap();

    let err = app.catalog.delete_pair(used_id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let mut req =
        basic_pair_request(used.to_method.id, used.from_method.id, 1.0, 0.0, 500.0, 5_000.0);
    req.fields = vec![text_field("note")];
    let unused = app.catalog.create_pair(req).await.unwrap();
    app.catalog.delete_pair(unused.id).await.unwrap();

    let err = app.catalog.get_pair(unused.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(fields::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(transactions::Entity::find().count(&app.db).await.unwrap(), 1);
    assert_eq!(app.catalog.list_pairs(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn inactive_endpoint_hides_the_pair() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let pair = app.catalog.get_pair(pair_id).await.unwrap();
    assert_eq!(app.catalog.list_pairs(true).await.unwrap().len(), 1);

    app.catalog
        .update_payment_method(
            pair.to_method.id,
            UpdatePaymentMethodRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(app.catalog.list_pairs(true).await.unwrap().is_empty());
    let all = app.catalog.list_pairs(false).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].is_active);
}

#[tokio::test]
async fn inactive_pair_or_method_refuses_new_transactions() {
    let app = setup().await;
    let pair_id = money_exchange_pair(&app).await;
    let pair = app.catalog.get_pair(pair_id).await.unwrap();
    let user = insert_user(&app.db, "94000002", None).await;

    app.catalog.set_pair_active(pair_id, false).await.unwrap();
    let err = app
        .transactions
        .create(user.id, pair_request(pair_id, 1000.0, "REF-OFF-PAIR"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    app.catalog.set_pair_active(pair_id, true).await.unwrap();
    app.catalog
        .update_payment_method(
            pair.from_method.id,
            UpdatePaymentMethodRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = app
        .transactions
        .create(user.id, pair_request(pair_id, 1000.0, "REF-OFF-METHOD"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    assert_eq!(transactions::Entity::find().count(&app.db).await.unwrap(), 0);
}
