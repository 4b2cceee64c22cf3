use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_directory_tables::Migration),
            Box::new(m20240101_000002_create_customer_tables::Migration),
            Box::new(m20240101_000003_create_generic_attributes_table::Migration),
            Box::new(m20240101_000004_create_newsletter_and_activity_tables::Migration),
            Box::new(m20240101_000005_create_api_clients_table::Migration),
        ]
    }
}

/// Languages, countries and stores, with the rows the API expects to exist.
mod m20240101_000001_create_directory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_directory_tables"
        }
    }

    const COUNTRIES: &[(&str, &str, &str)] = &[
        ("United States", "US", "USA"),
        ("Canada", "CA", "CAN"),
        ("United Kingdom", "GB", "GBR"),
        ("Germany", "DE", "DEU"),
        ("France", "FR", "FRA"),
        ("Australia", "AU", "AUS"),
        ("India", "IN", "IND"),
    ];

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Languages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Languages::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Languages::Name).string().not_null())
                        .col(ColumnDef::new(Languages::LanguageCulture).string().not_null())
                        .col(
                            ColumnDef::new(Languages::Published)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Countries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Countries::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Countries::Name).string().not_null())
                        .col(ColumnDef::new(Countries::TwoLetterIsoCode).string().not_null())
                        .col(
                            ColumnDef::new(Countries::ThreeLetterIsoCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Countries::Published)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Stores::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Stores::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Stores::Name).string().not_null())
                        .col(ColumnDef::new(Stores::Url).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(Languages::Table)
                        .columns([
                            Languages::Name,
                            Languages::LanguageCulture,
                            Languages::Published,
                        ])
                        .values_panic(["English".into(), "en-US".into(), true.into()])
                        .to_owned(),
                )
                .await?;

            let mut countries = Query::insert()
                .into_table(Countries::Table)
                .columns([
                    Countries::Name,
                    Countries::TwoLetterIsoCode,
                    Countries::ThreeLetterIsoCode,
                    Countries::Published,
                ])
                .to_owned();
            for (name, two, three) in COUNTRIES {
                countries.values_panic([
                    (*name).into(),
                    (*two).into(),
                    (*three).into(),
                    true.into(),
                ]);
            }
            manager.exec_stmt(countries).await?;

            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(Stores::Table)
                        .columns([Stores::Name, Stores::Url])
                        .values_panic(["Default store".into(), "http://localhost/".into()])
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Stores::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Countries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Languages::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Languages {
        Table,
        Id,
        Name,
        LanguageCulture,
        Published,
    }

    #[derive(DeriveIden)]
    enum Countries {
        Table,
        Id,
        Name,
        TwoLetterIsoCode,
        ThreeLetterIsoCode,
        Published,
    }

    #[derive(DeriveIden)]
    enum Stores {
        Table,
        Id,
        Name,
        Url,
    }
}

/// Customers, addresses, passwords and roles.
mod m20240101_000002_create_customer_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_customer_tables"
        }
    }

    /// (name, system name)
    const SYSTEM_ROLES: &[(&str, &str)] = &[
        ("Administrators", "Administrators"),
        ("Forum Moderators", "ForumModerators"),
        ("Registered", "Registered"),
        ("Guests", "Guests"),
        ("Vendors", "Vendors"),
    ];

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Customers::CustomerGuid).uuid().not_null())
                        .col(ColumnDef::new(Customers::Username).string().null())
                        .col(ColumnDef::new(Customers::Email).string().null())
                        .col(ColumnDef::new(Customers::AdminComment).text().null())
                        .col(
                            ColumnDef::new(Customers::IsTaxExempt)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Customers::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Customers::Deleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Customers::IsSystemAccount)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Customers::SystemName).string().null())
                        .col(ColumnDef::new(Customers::LastIpAddress).string().null())
                        .col(
                            ColumnDef::new(Customers::CreatedOnUtc)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::LastLoginDateUtc)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Customers::LastActivityDateUtc)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::RegisteredInStoreId)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Customers::BillingAddressId).integer().null())
                        .col(ColumnDef::new(Customers::ShippingAddressId).integer().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_email")
                        .table(Customers::Table)
                        .col(Customers::Email)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_created_on_utc")
                        .table(Customers::Table)
                        .col(Customers::CreatedOnUtc)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Addresses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Addresses::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Addresses::FirstName).string().null())
                        .col(ColumnDef::new(Addresses::LastName).string().null())
                        .col(ColumnDef::new(Addresses::Email).string().null())
                        .col(ColumnDef::new(Addresses::Company).string().null())
                        .col(ColumnDef::new(Addresses::CountryId).integer().null())
                        .col(ColumnDef::new(Addresses::StateProvinceId).integer().null())
                        .col(ColumnDef::new(Addresses::City).string().null())
                        .col(ColumnDef::new(Addresses::Address1).string().null())
                        .col(ColumnDef::new(Addresses::Address2).string().null())
                        .col(ColumnDef::new(Addresses::ZipPostalCode).string().null())
                        .col(ColumnDef::new(Addresses::PhoneNumber).string().null())
                        .col(ColumnDef::new(Addresses::FaxNumber).string().null())
                        .col(
                            ColumnDef::new(Addresses::CreatedOnUtc)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerAddresses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerAddresses::CustomerId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerAddresses::AddressId)
                                .integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(CustomerAddresses::CustomerId)
                                .col(CustomerAddresses::AddressId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customer_addresses_customer_id")
                                .from(CustomerAddresses::Table, CustomerAddresses::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customer_addresses_address_id")
                                .from(CustomerAddresses::Table, CustomerAddresses::AddressId)
                                .to(Addresses::Table, Addresses::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerPasswords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerPasswords::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(CustomerPasswords::CustomerId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerPasswords::Password).text().not_null())
                        .col(
                            ColumnDef::new(CustomerPasswords::PasswordFormat)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomerPasswords::PasswordSalt).string().null())
                        .col(
                            ColumnDef::new(CustomerPasswords::CreatedOnUtc)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customer_passwords_customer_id")
                                .from(CustomerPasswords::Table, CustomerPasswords::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerRoles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerRoles::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(CustomerRoles::Name).string().not_null())
                        .col(ColumnDef::new(CustomerRoles::SystemName).string().null())
                        .col(
                            ColumnDef::new(CustomerRoles::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(CustomerRoles::IsSystemRole)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CustomerRoleMappings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomerRoleMappings::CustomerId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CustomerRoleMappings::CustomerRoleId)
                                .integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(CustomerRoleMappings::CustomerId)
                                .col(CustomerRoleMappings::CustomerRoleId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customer_role_mappings_customer_id")
                                .from(
                                    CustomerRoleMappings::Table,
                                    CustomerRoleMappings::CustomerId,
                                )
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customer_role_mappings_role_id")
                                .from(
                                    CustomerRoleMappings::Table,
                                    CustomerRoleMappings::CustomerRoleId,
                                )
                                .to(CustomerRoles::Table, CustomerRoles::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            let mut roles = Query::insert()
                .into_table(CustomerRoles::Table)
                .columns([
                    CustomerRoles::Name,
                    CustomerRoles::SystemName,
                    CustomerRoles::Active,
                    CustomerRoles::IsSystemRole,
                ])
                .to_owned();
            for (name, system_name) in SYSTEM_ROLES {
                roles.values_panic([
                    (*name).into(),
                    (*system_name).into(),
                    true.into(),
                    true.into(),
                ]);
            }
            manager.exec_stmt(roles).await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomerRoleMappings::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CustomerRoles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CustomerPasswords::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CustomerAddresses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Addresses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
        CustomerGuid,
        Username,
        Email,
        AdminComment,
        IsTaxExempt,
        Active,
        Deleted,
        IsSystemAccount,
        SystemName,
        LastIpAddress,
        CreatedOnUtc,
        LastLoginDateUtc,
        LastActivityDateUtc,
        RegisteredInStoreId,
        BillingAddressId,
        ShippingAddressId,
    }

    #[derive(DeriveIden)]
    enum Addresses {
        Table,
        Id,
        FirstName,
        LastName,
        Email,
        Company,
        CountryId,
        StateProvinceId,
        City,
        Address1,
        Address2,
        ZipPostalCode,
        PhoneNumber,
        FaxNumber,
        CreatedOnUtc,
    }

    #[derive(DeriveIden)]
    enum CustomerAddresses {
        Table,
        CustomerId,
        AddressId,
    }

    #[derive(DeriveIden)]
    enum CustomerPasswords {
        Table,
        Id,
        CustomerId,
        Password,
        PasswordFormat,
        PasswordSalt,
        CreatedOnUtc,
    }

    #[derive(DeriveIden)]
    enum CustomerRoles {
        Table,
        Id,
        Name,
        SystemName,
        Active,
        IsSystemRole,
    }

    #[derive(DeriveIden)]
    enum CustomerRoleMappings {
        Table,
        CustomerId,
        CustomerRoleId,
    }
}

mod m20240101_000003_create_generic_attributes_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_generic_attributes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GenericAttributes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GenericAttributes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(GenericAttributes::EntityId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GenericAttributes::KeyGroup).string().not_null())
                        .col(ColumnDef::new(GenericAttributes::Key).string().not_null())
                        .col(ColumnDef::new(GenericAttributes::Value).text().not_null())
                        .col(
                            ColumnDef::new(GenericAttributes::StoreId)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(GenericAttributes::CreatedOrUpdatedDateUtc)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_generic_attributes_entity_key_group")
                        .table(GenericAttributes::Table)
                        .col(GenericAttributes::EntityId)
                        .col(GenericAttributes::KeyGroup)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GenericAttributes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum GenericAttributes {
        Table,
        Id,
        EntityId,
        KeyGroup,
        Key,
        Value,
        StoreId,
        CreatedOrUpdatedDateUtc,
    }
}

mod m20240101_000004_create_newsletter_and_activity_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_newsletter_and_activity_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(NewsletterSubscriptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(NewsletterSubscriptions::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(NewsletterSubscriptions::SubscriptionGuid)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NewsletterSubscriptions::Email)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NewsletterSubscriptions::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(NewsletterSubscriptions::StoreId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(NewsletterSubscriptions::CreatedOnUtc)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_newsletter_subscriptions_email_store")
                        .table(NewsletterSubscriptions::Table)
                        .col(NewsletterSubscriptions::Email)
                        .col(NewsletterSubscriptions::StoreId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ActivityLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ActivityLogs::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ActivityLogs::SystemKeyword).string().not_null())
                        .col(ColumnDef::new(ActivityLogs::Comment).text().not_null())
                        .col(ColumnDef::new(ActivityLogs::EntityId).integer().null())
                        .col(ColumnDef::new(ActivityLogs::EntityName).string().null())
                        .col(ColumnDef::new(ActivityLogs::ClientId).string().null())
                        .col(ColumnDef::new(ActivityLogs::IpAddress).string().null())
                        .col(
                            ColumnDef::new(ActivityLogs::CreatedOnUtc)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(NewsletterSubscriptions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum NewsletterSubscriptions {
        Table,
        Id,
        SubscriptionGuid,
        Email,
        Active,
        StoreId,
        CreatedOnUtc,
    }

    #[derive(DeriveIden)]
    enum ActivityLogs {
        Table,
        Id,
        SystemKeyword,
        Comment,
        EntityId,
        EntityName,
        ClientId,
        IpAddress,
        CreatedOnUtc,
    }
}

mod m20240101_000005_create_api_clients_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_api_clients_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ApiClients::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ApiClients::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ApiClients::ClientId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ApiClients::ClientSecretHash)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ApiClients::Name).string().not_null())
                        .col(
                            ColumnDef::new(ApiClients::Enabled)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ApiClients::CreatedOnUtc)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ApiClients::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ApiClients {
        Table,
        Id,
        ClientId,
        ClientSecretHash,
        Name,
        Enabled,
        CreatedOnUtc,
    }
}
