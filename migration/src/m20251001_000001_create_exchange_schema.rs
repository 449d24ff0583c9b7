use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Phone,
    Name,
    Email,
    PasswordHash,
    IsActive,
    KycVerified,
    KycStatus,
    NewsletterSubscribed,
    TermsAcceptedAt,
    PrivacyAcceptedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Admins {
    Table,
    Id,
    Username,
    PasswordHash,
    Email,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Permissions {
    Table,
    Id,
    Code,
    Name,
    Description,
    Category,
}

#[derive(DeriveIden)]
enum AdminPermissions {
    Table,
    Id,
    AdminId,
    PermissionId,
    GrantedAt,
}

#[derive(DeriveIden)]
enum PaymentMethods {
    Table,
    Id,
    Code,
    Name,
    Icon,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EmailTemplates {
    Table,
    Id,
    TemplateType,
    Name,
    Subject,
    HtmlBody,
    TextBody,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExchangePairs {
    Table,
    Id,
    FromMethodId,
    ToMethodId,
    FeePercentage,
    TaxAmount,
    MinAmount,
    MaxAmount,
    Category,
    RequiresAdditionalInfo,
    AutomaticProcessing,
    IsActive,
    PaymentSyntaxType,
    PaymentSyntaxValue,
    InstructionTitle,
    InstructionContent,
    InstructionLinkUrl,
    InstructionLinkText,
    FromNumberLabel,
    FromNumberPlaceholder,
    ToNumberLabel,
    ToNumberPlaceholder,
    ShowToNumber,
    AmountLabel,
    AmountPlaceholder,
    ReferenceRequired,
    ReferenceLabel,
    ReferencePlaceholder,
    ValidatedEmailTemplateId,
    RejectedEmailTemplateId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExchangeFields {
    Table,
    Id,
    ExchangePairId,
    FieldName,
    FieldType,
    FieldLabel,
    Placeholder,
    IsRequired,
    Options,
    FieldOrder,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TransactionId,
    UserId,
    TmoneyNumber,
    FloozNumber,
    FromNumber,
    ToNumber,
    Amount,
    Percentage,
    TaxAmount,
    TotalAmount,
    PaymentReference,
    BookmakerId,
    Notes,
    ExchangePairId,
    DynamicFields,
    Status,
    AdminMessage,
    ValidatedBy,
    ValidatedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TransactionHistory {
    Table,
    Id,
    TransactionId,
    Status,
    Comment,
    ChangedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    AdminId,
    NotificationType,
    Title,
    Message,
    IsRead,
    TransactionId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Config {
    Table,
    Id,
    Key,
    Value,
    Description,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PushSubscriptions {
    Table,
    Id,
    UserId,
    AdminId,
    Token,
    Platform,
    CreatedAt,
}

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn created_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(&mut id_col(Users::Id))
                    .col(ColumnDef::new(Users::Phone).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Users::Email).string_len(255).null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::KycVerified).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Users::KycStatus)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Users::NewsletterSubscribed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::TermsAcceptedAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Users::PrivacyAcceptedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut created_col(Users::CreatedAt))
                    .col(&mut created_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Admins::Table)
                    .if_not_exists()
                    .col(&mut id_col(Admins::Id))
                    .col(ColumnDef::new(Admins::Username).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Admins::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Admins::Email).string_len(255).null())
                    .col(ColumnDef::new(Admins::IsActive).boolean().not_null().default(true))
                    .col(&mut created_col(Admins::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Permissions::Table)
                    .if_not_exists()
                    .col(&mut id_col(Permissions::Id))
                    .col(ColumnDef::new(Permissions::Code).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Permissions::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Permissions::Description).text().null())
                    .col(ColumnDef::new(Permissions::Category).string_len(64).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminPermissions::Table)
                    .if_not_exists()
                    .col(&mut id_col(AdminPermissions::Id))
                    .col(ColumnDef::new(AdminPermissions::AdminId).big_integer().not_null())
                    .col(ColumnDef::new(AdminPermissions::PermissionId).big_integer().not_null())
                    .col(&mut created_col(AdminPermissions::GrantedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(AdminPermissions::Table, AdminPermissions::AdminId)
                            .to(Admins::Table, Admins::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AdminPermissions::Table, AdminPermissions::PermissionId)
                            .to(Permissions::Table, Permissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_admin_permissions_pair")
                    .table(AdminPermissions::Table)
                    .col(AdminPermissions::AdminId)
                    .col(AdminPermissions::PermissionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentMethods::Table)
                    .if_not_exists()
                    .col(&mut id_col(PaymentMethods::Id))
                    .col(ColumnDef::new(PaymentMethods::Code).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(PaymentMethods::Name).string_len(255).not_null())
                    .col(ColumnDef::new(PaymentMethods::Icon).string_len(512).null())
                    .col(ColumnDef::new(PaymentMethods::IsActive).boolean().not_null().default(true))
                    .col(&mut created_col(PaymentMethods::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmailTemplates::Table)
                    .if_not_exists()
                    .col(&mut id_col(EmailTemplates::Id))
                    .col(ColumnDef::new(EmailTemplates::TemplateType).string_len(64).not_null())
                    .col(ColumnDef::new(EmailTemplates::Name).string_len(255).not_null())
                    .col(ColumnDef::new(EmailTemplates::Subject).string_len(255).not_null())
                    .col(ColumnDef::new(EmailTemplates::HtmlBody).text().not_null())
                    .col(ColumnDef::new(EmailTemplates::TextBody).text().null())
                    .col(ColumnDef::new(EmailTemplates::IsActive).boolean().not_null().default(true))
                    .col(&mut created_col(EmailTemplates::CreatedAt))
                    .col(&mut created_col(EmailTemplates::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExchangePairs::Table)
                    .if_not_exists()
                    .col(&mut id_col(ExchangePairs::Id))
                    .col(ColumnDef::new(ExchangePairs::FromMethodId).big_integer().not_null())
                    .col(ColumnDef::new(ExchangePairs::ToMethodId).big_integer().not_null())
                    .col(ColumnDef::new(ExchangePairs::FeePercentage).double().not_null().default(0.0))
                    .col(ColumnDef::new(ExchangePairs::TaxAmount).double().not_null().default(0.0))
                    .col(ColumnDef::new(ExchangePairs::MinAmount).double().not_null().default(500.0))
                    .col(ColumnDef::new(ExchangePairs::MaxAmount).double().not_null().default(500000.0))
                    .col(ColumnDef::new(ExchangePairs::Category).string_len(32).null())
                    .col(
                        ColumnDef::new(ExchangePairs::RequiresAdditionalInfo)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ExchangePairs::AutomaticProcessing)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ExchangePairs::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(ExchangePairs::PaymentSyntaxType).string_len(16).null())
                    .col(ColumnDef::new(ExchangePairs::PaymentSyntaxValue).text().null())
                    .col(ColumnDef::new(ExchangePairs::InstructionTitle).string_len(255).null())
                    .col(ColumnDef::new(ExchangePairs::InstructionContent).text().null())
                    .col(ColumnDef::new(ExchangePairs::InstructionLinkUrl).string_len(512).null())
                    .col(ColumnDef::new(ExchangePairs::InstructionLinkText).string_len(255).null())
                    .col(ColumnDef::new(ExchangePairs::FromNumberLabel).string_len(255).null())
                    .col(ColumnDef::new(ExchangePairs::FromNumberPlaceholder).string_len(255).null())
                    .col(ColumnDef::new(ExchangePairs::ToNumberLabel).string_len(255).null())
                    .col(ColumnDef::new(ExchangePairs::ToNumberPlaceholder).string_len(255).null())
                    .col(ColumnDef::new(ExchangePairs::ShowToNumber).boolean().not_null().default(true))
                    .col(ColumnDef::new(ExchangePairs::AmountLabel).string_len(255).null())
                    .col(ColumnDef::new(ExchangePairs::AmountPlaceholder).string_len(255).null())
                    .col(
                        ColumnDef::new(ExchangePairs::ReferenceRequired)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(ExchangePairs::ReferenceLabel).string_len(255).null())
                    .col(ColumnDef::new(ExchangePairs::ReferencePlaceholder).string_len(255).null())
                    .col(ColumnDef::new(ExchangePairs::ValidatedEmailTemplateId).big_integer().null())
                    .col(ColumnDef::new(ExchangePairs::RejectedEmailTemplateId).big_integer().null())
                    .col(&mut created_col(ExchangePairs::CreatedAt))
                    .col(&mut created_col(ExchangePairs::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExchangePairs::Table, ExchangePairs::FromMethodId)
                            .to(PaymentMethods::Table, PaymentMethods::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExchangePairs::Table, ExchangePairs::ToMethodId)
                            .to(PaymentMethods::Table, PaymentMethods::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_exchange_pairs_direction")
                    .table(ExchangePairs::Table)
                    .col(ExchangePairs::FromMethodId)
                    .col(ExchangePairs::ToMethodId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExchangeFields::Table)
                    .if_not_exists()
                    .col(&mut id_col(ExchangeFields::Id))
                    .col(ColumnDef::new(ExchangeFields::ExchangePairId).big_integer().not_null())
                    .col(ColumnDef::new(ExchangeFields::FieldName).string_len(128).not_null())
                    .col(ColumnDef::new(ExchangeFields::FieldType).string_len(16).not_null())
                    .col(ColumnDef::new(ExchangeFields::FieldLabel).string_len(255).not_null())
                    .col(ColumnDef::new(ExchangeFields::Placeholder).string_len(255).null())
                    .col(ColumnDef::new(ExchangeFields::IsRequired).boolean().not_null().default(false))
                    .col(ColumnDef::new(ExchangeFields::Options).text().null())
                    .col(ColumnDef::new(ExchangeFields::FieldOrder).integer().not_null().default(0))
                    .col(&mut created_col(ExchangeFields::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(ExchangeFields::Table, ExchangeFields::ExchangePairId)
                            .to(ExchangePairs::Table, ExchangePairs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(&mut id_col(Transactions::Id))
                    .col(
                        ColumnDef::new(Transactions::TransactionId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::TmoneyNumber).string_len(32).null())
                    .col(ColumnDef::new(Transactions::FloozNumber).string_len(32).null())
                    .col(ColumnDef::new(Transactions::FromNumber).string_len(64).null())
                    .col(ColumnDef::new(Transactions::ToNumber).string_len(64).null())
                    .col(ColumnDef::new(Transactions::Amount).double().not_null())
                    .col(ColumnDef::new(Transactions::Percentage).double().not_null())
                    .col(ColumnDef::new(Transactions::TaxAmount).double().not_null().default(0.0))
                    .col(ColumnDef::new(Transactions::TotalAmount).double().not_null())
                    .col(ColumnDef::new(Transactions::PaymentReference).string_len(255).not_null())
                    .col(ColumnDef::new(Transactions::BookmakerId).string_len(128).null())
                    .col(ColumnDef::new(Transactions::Notes).text().null())
                    .col(ColumnDef::new(Transactions::ExchangePairId).big_integer().null())
                    .col(ColumnDef::new(Transactions::DynamicFields).text().null())
                    .col(
                        ColumnDef::new(Transactions::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Transactions::AdminMessage).text().null())
                    .col(ColumnDef::new(Transactions::ValidatedBy).big_integer().null())
                    .col(ColumnDef::new(Transactions::ValidatedAt).timestamp_with_time_zone().null())
                    .col(&mut created_col(Transactions::CreatedAt))
                    .col(&mut created_col(Transactions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Transactions::Table, Transactions::ExchangePairId)
                            .to(ExchangePairs::Table, ExchangePairs::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Transactions::Table, Transactions::ValidatedBy)
                            .to(Admins::Table, Admins::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_user_status_created")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::Status)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_payment_reference")
                    .table(Transactions::Table)
                    .col(Transactions::PaymentReference)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionHistory::Table)
                    .if_not_exists()
                    .col(&mut id_col(TransactionHistory::Id))
                    .col(ColumnDef::new(TransactionHistory::TransactionId).big_integer().not_null())
                    .col(ColumnDef::new(TransactionHistory::Status).string_len(16).not_null())
                    .col(ColumnDef::new(TransactionHistory::Comment).text().null())
                    .col(ColumnDef::new(TransactionHistory::ChangedBy).big_integer().null())
                    .col(&mut created_col(TransactionHistory::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(TransactionHistory::Table, TransactionHistory::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TransactionHistory::Table, TransactionHistory::ChangedBy)
                            .to(Admins::Table, Admins::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(&mut id_col(Notifications::Id))
                    .col(ColumnDef::new(Notifications::UserId).big_integer().null())
                    .col(ColumnDef::new(Notifications::AdminId).big_integer().null())
                    .col(ColumnDef::new(Notifications::NotificationType).string_len(64).not_null())
                    .col(ColumnDef::new(Notifications::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(ColumnDef::new(Notifications::IsRead).boolean().not_null().default(false))
                    .col(ColumnDef::new(Notifications::TransactionId).big_integer().null())
                    .col(&mut created_col(Notifications::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notifications_user")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Config::Table)
                    .if_not_exists()
                    .col(&mut id_col(Config::Id))
                    .col(ColumnDef::new(Config::Key).string_len(128).not_null().unique_key())
                    .col(ColumnDef::new(Config::Value).text().not_null())
                    .col(ColumnDef::new(Config::Description).text().null())
                    .col(&mut created_col(Config::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PushSubscriptions::Table)
                    .if_not_exists()
                    .col(&mut id_col(PushSubscriptions::Id))
                    .col(ColumnDef::new(PushSubscriptions::UserId).big_integer().null())
                    .col(ColumnDef::new(PushSubscriptions::AdminId).big_integer().null())
                    .col(ColumnDef::new(PushSubscriptions::Token).string_len(512).not_null().unique_key())
                    .col(ColumnDef::new(PushSubscriptions::Platform).string_len(32).not_null())
                    .col(&mut created_col(PushSubscriptions::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PushSubscriptions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Config::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionHistory::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExchangeFields::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExchangePairs::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EmailTemplates::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentMethods::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminPermissions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permissions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Admins::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
