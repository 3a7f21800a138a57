use sqlx::{FromRow, PgConnection};

use crate::models;

#[derive(Debug, FromRow)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[async_trait::async_trait]
pub trait TagProvider {
    /// Look up a tag by its datastore id. `Ok(None)` means the tag does not
    /// exist; anything else from the datastore is passed through.
    async fn get_tag(&mut self, tag_id: &str) -> Result<Option<models::tags::Tag>, sqlx::Error>;
}

#[async_trait::async_trait]
impl TagProvider for PgConnection {
    async fn get_tag(&mut self, tag_id: &str) -> Result<Option<models::tags::Tag>, sqlx::Error> {
        let res: Result<Tag, _> = sqlx::query_as(
            r#"
                SELECT
                    id, name
                FROM
                    tags
                WHERE
                    id = $1
            "#,
        )
        .bind(tag_id)
        .fetch_one(self)
        .await;

        match res {
            Ok(tag) => Ok(Some(tag.into())),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
