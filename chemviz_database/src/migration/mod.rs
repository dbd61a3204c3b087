use sea_orm::{ConnectionTrait, EntityTrait, Schema};
pub use sea_orm_migration::prelude::*;

mod m20250101_01_create_upload_history;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250101_01_create_upload_history::Migration)]
    }
}

/// Creates the table for an entity straight from its model definition.
async fn create_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = manager.get_database_backend();
    let schema = Schema::new(backend);
    let mut table_create_statement = schema.create_table_from_entity(entity);
    let table_create_statement = table_create_statement.if_not_exists();
    let stmt = backend.build(table_create_statement);
    let conn = manager.get_connection();
    let _ = conn.execute(stmt).await?;

    for mut index_create_statement in schema.create_index_from_entity(entity) {
        let stmt = backend.build(index_create_statement.if_not_exists());
        let _ = conn.execute(stmt).await?;
    }

    Ok(())
}
