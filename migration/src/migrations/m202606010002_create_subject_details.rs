use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202606010002_create_subject_details"
    }
}

/// Each role detail table holds at most one row per subject.
fn detail_table(table: &str, fk_name: &str, columns: &[&str]) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(Alias::new(table))
        .if_not_exists()
        .col(ColumnDef::new(Alias::new("id")).uuid().not_null().primary_key())
        .col(
            ColumnDef::new(Alias::new("subject_id"))
                .uuid()
                .not_null()
                .unique_key(),
        );
    for column in columns {
        stmt.col(ColumnDef::new(Alias::new(*column)).string().not_null());
    }
    stmt.foreign_key(
        ForeignKey::create()
            .name(fk_name)
            .from(Alias::new(table), Alias::new("subject_id"))
            .to(Alias::new("subjects"), Alias::new("id"))
            .on_delete(ForeignKeyAction::Cascade)
            .on_update(ForeignKeyAction::Cascade),
    );
    stmt.to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(detail_table(
                "student_details",
                "fk_student_details_subject",
                &["program", "faculty", "cohort"],
            ))
            .await?;
        manager
            .create_table(detail_table(
                "lecturer_details",
                "fk_lecturer_details_subject",
                &["department", "title"],
            ))
            .await?;
        manager
            .create_table(detail_table(
                "staff_details",
                "fk_staff_details_subject",
                &["unit", "position"],
            ))
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in ["staff_details", "lecturer_details", "student_details"] {
            manager
                .drop_table(Table::drop().if_exists().table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
