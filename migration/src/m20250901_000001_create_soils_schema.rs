use sea_orm_migration::prelude::*;

/// Creates the Soils database tables read and written by the EDD import.
///
/// Every statement is `IF NOT EXISTS`: against the certified Soils database
/// this is a no-op, on a fresh or test database it builds the schema.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UplandsEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UplandsEvents::EventName)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UplandsEvents::SiteName).string().not_null())
                    .col(ColumnDef::new(UplandsEvents::StartDate).date())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WetlandsEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WetlandsEvents::EventName)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WetlandsEvents::StartDate).date())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WetlandsSoil::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WetlandsSoil::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WetlandsSoil::EventName).string().not_null())
                    .col(ColumnDef::new(WetlandsSoil::Chem).string())
                    .col(ColumnDef::new(WetlandsSoil::CommentsSoil).text())
                    .col(ColumnDef::new(WetlandsSoil::CommentsSample).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tbl_soil_event_name")
                            .from(WetlandsSoil::Table, WetlandsSoil::EventName)
                            .to(WetlandsEvents::Table, WetlandsEvents::EventName)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tbl_soil_chem")
                    .table(WetlandsSoil::Table)
                    .col(WetlandsSoil::Chem)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NameUnitCrossWalk::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NameUnitCrossWalk::ParameterNative)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NameUnitCrossWalk::UnitNative).string())
                    .col(
                        ColumnDef::new(NameUnitCrossWalk::ParameterDataset)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NameUnitCrossWalk::UnitDataset).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SoilChemistryDataset::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SoilChemistryDataset::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SoilChemistryDataset::ProtocolRomn)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SoilChemistryDataset::SiteName).string().not_null())
                    .col(ColumnDef::new(SoilChemistryDataset::EventName).string().not_null())
                    .col(ColumnDef::new(SoilChemistryDataset::StartDate).date())
                    .col(ColumnDef::new(SoilChemistryDataset::YearSampled).integer())
                    .col(
                        ColumnDef::new(SoilChemistryDataset::ParameterRaw)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SoilChemistryDataset::UnitRaw).string())
                    .col(
                        ColumnDef::new(SoilChemistryDataset::ParameterDataset)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SoilChemistryDataset::UnitDataset).string())
                    .col(ColumnDef::new(SoilChemistryDataset::Value).string().not_null())
                    .col(
                        ColumnDef::new(SoilChemistryDataset::QcStatus)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SoilChemistryDataset::QcFlag)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(SoilChemistryDataset::QcNotes)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(SoilChemistryDataset::DataFlag).string().not_null())
                    .col(
                        ColumnDef::new(SoilChemistryDataset::Count)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(SoilChemistryDataset::StDev).double().not_null())
                    .col(ColumnDef::new(SoilChemistryDataset::StErr).double().not_null())
                    .col(ColumnDef::new(SoilChemistryDataset::Min).double())
                    .col(ColumnDef::new(SoilChemistryDataset::Max).double())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_soil_chemistry_dataset_event")
                    .table(SoilChemistryDataset::Table)
                    .col(SoilChemistryDataset::EventName)
                    .col(SoilChemistryDataset::ParameterRaw)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(SoilChemistryDataset::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(NameUnitCrossWalk::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(WetlandsSoil::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(WetlandsEvents::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(UplandsEvents::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum UplandsEvents {
    #[sea_orm(iden = "tbl_Events1")]
    Table,
    #[sea_orm(iden = "EventName")]
    EventName,
    #[sea_orm(iden = "SiteName")]
    SiteName,
    #[sea_orm(iden = "StartDate")]
    StartDate,
}

#[derive(DeriveIden)]
enum WetlandsEvents {
    #[sea_orm(iden = "tbl_Events")]
    Table,
    #[sea_orm(iden = "EventName")]
    EventName,
    #[sea_orm(iden = "StartDate")]
    StartDate,
}

#[derive(DeriveIden)]
enum WetlandsSoil {
    #[sea_orm(iden = "tbl_Soil")]
    Table,
    #[sea_orm(iden = "ID")]
    Id,
    #[sea_orm(iden = "EventName")]
    EventName,
    #[sea_orm(iden = "Chem")]
    Chem,
    #[sea_orm(iden = "Comments_Soil")]
    CommentsSoil,
    #[sea_orm(iden = "Comments_Sample")]
    CommentsSample,
}

#[derive(DeriveIden)]
enum NameUnitCrossWalk {
    #[sea_orm(iden = "tlu_NameUnitCrossWalk")]
    Table,
    #[sea_orm(iden = "ParameterNative")]
    ParameterNative,
    #[sea_orm(iden = "UnitNative")]
    UnitNative,
    #[sea_orm(iden = "ParameterDataset")]
    ParameterDataset,
    #[sea_orm(iden = "UnitDataset")]
    UnitDataset,
}

#[derive(DeriveIden)]
enum SoilChemistryDataset {
    #[sea_orm(iden = "tbl_SoilChemistry_Dataset")]
    Table,
    #[sea_orm(iden = "ID")]
    Id,
    #[sea_orm(iden = "Protocol_ROMN")]
    ProtocolRomn,
    #[sea_orm(iden = "SiteName")]
    SiteName,
    #[sea_orm(iden = "EventName")]
    EventName,
    #[sea_orm(iden = "StartDate")]
    StartDate,
    #[sea_orm(iden = "YearSampled")]
    YearSampled,
    #[sea_orm(iden = "ParameterRaw")]
    ParameterRaw,
    #[sea_orm(iden = "UnitRaw")]
    UnitRaw,
    #[sea_orm(iden = "ParameterDataset")]
    ParameterDataset,
    #[sea_orm(iden = "UnitDataset")]
    UnitDataset,
    #[sea_orm(iden = "Value")]
    Value,
    #[sea_orm(iden = "QC_Status")]
    QcStatus,
    #[sea_orm(iden = "QC_Flag")]
    QcFlag,
    #[sea_orm(iden = "QC_Notes")]
    QcNotes,
    #[sea_orm(iden = "DataFlag")]
    DataFlag,
    #[sea_orm(iden = "Count")]
    Count,
    #[sea_orm(iden = "StDev")]
    StDev,
    #[sea_orm(iden = "STErr")]
    StErr,
    #[sea_orm(iden = "Min")]
    Min,
    #[sea_orm(iden = "Max")]
    Max,
}
