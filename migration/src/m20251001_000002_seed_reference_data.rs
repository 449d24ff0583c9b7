use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Config {
    Table,
    Key,
    Value,
    Description,
}

#[derive(DeriveIden)]
enum Permissions {
    Table,
    Code,
    Name,
    Description,
    Category,
}

const CONFIG_DEFAULTS: &[(&str, &str, &str)] = &[
    ("commission_percentage", "2.5", "Default commission applied when no pair is given"),
    ("min_amount", "500", "Global minimum amount in FCFA"),
    ("max_amount", "500000", "Global maximum amount in FCFA"),
    ("monthly_limit_without_kyc", "500000", "Monthly validated volume cap for users without KYC"),
    ("monthly_limit_with_kyc", "5000000", "Monthly validated volume cap for KYC-verified users"),
];

const PERMISSIONS: &[(&str, &str, &str)] = &[
    ("VIEW_TRANSACTIONS", "View transactions", "transactions"),
    ("VALIDATE_TRANSACTIONS", "Validate or reject transactions", "transactions"),
    ("VIEW_TRANSACTION_STATS", "View transaction statistics", "transactions"),
    ("MANAGE_CONFIG", "Edit platform configuration", "settings"),
    ("MANAGE_EXCHANGE_PAIRS", "Manage exchange pairs", "catalog"),
    ("MANAGE_PAYMENT_METHODS", "Manage payment methods", "catalog"),
    ("MANAGE_USERS", "Manage user accounts and KYC", "users"),
    ("MANAGE_ADMINS", "Manage administrator accounts", "admins"),
    ("MANAGE_PERMISSIONS", "Grant and revoke permissions", "admins"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut config = Query::insert()
            .into_table(Config::Table)
            .columns([Config::Key, Config::Value, Config::Description])
            .to_owned();
        for (key, value, description) in CONFIG_DEFAULTS {
            config.values_panic([(*key).into(), (*value).into(), (*description).into()]);
        }
        manager.exec_stmt(config).await?;

        let mut permissions = Query::insert()
            .into_table(Permissions::Table)
            .columns([
                Permissions::Code,
                Permissions::Name,
                Permissions::Description,
                Permissions::Category,
            ])
            .to_owned();
        for (code, name, category) in PERMISSIONS {
            permissions.values_panic([
                (*code).into(),
                (*name).into(),
                (*name).into(),
                (*category).into(),
            ]);
        }
        manager.exec_stmt(permissions).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let keys: Vec<&str> = CONFIG_DEFAULTS.iter().map(|(k, _, _)| *k).collect();
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Config::Table)
                    .and_where(Expr::col(Config::Key).is_in(keys))
                    .to_owned(),
            )
            .await?;

        let codes: Vec<&str> = PERMISSIONS.iter().map(|(c, _, _)| *c).collect();
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Permissions::Table)
                    .and_where(Expr::col(Permissions::Code).is_in(codes))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
