use sqlx::{Connection, FromRow, PgConnection};
use time::OffsetDateTime;

use crate::models;

pub type PhotoId = i32;

pub const DEFAULT_LIMIT: i64 = 500;
pub const DEFAULT_OFFSET: i64 = 0;

#[derive(Debug, FromRow)]
pub struct Photo {
    pub id: PhotoId,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub datetime: Option<OffsetDateTime>,
}

#[async_trait::async_trait]
pub trait PhotoProvider {
    /// All photos whose `tags` array contains the given tag id, ordered by
    /// photo id ascending and truncated to `limit`.
    async fn get_photos_by_tag(
        &mut self,
        tag_id: &str,
        limit: i64,
    ) -> Result<Vec<models::photos::Photo>, sqlx::Error>;

    async fn get_photo_by_id(
        &mut self,
        photo_id: PhotoId,
    ) -> Result<Option<models::photos::Photo>, sqlx::Error>;

    async fn insert_photo(&mut self, photo: &models::photos::Photo)
        -> Result<PhotoId, sqlx::Error>;

    async fn update_photo(
        &mut self,
        old_photo: &models::photos::Photo,
        new_photo: &models::photos::Photo,
    ) -> Result<bool, sqlx::Error>;
}

#[async_trait::async_trait]
impl PhotoProvider for PgConnection {
    async fn get_photos_by_tag(
        &mut self,
        tag_id: &str,
        limit: i64,
    ) -> Result<Vec<models::photos::Photo>, sqlx::Error> {
        let tagged = vec![tag_id.to_string()];

        let res: Vec<Photo> = sqlx::query_as(
            r#"
                SELECT
                    id, images, tags, datetime
                FROM
                    photos
                WHERE
                    tags @> $1::text[]
                ORDER BY
                    id ASC
                LIMIT $2
                OFFSET $3
            "#,
        )
        .bind(&tagged[..])
        .bind(limit)
        .bind(DEFAULT_OFFSET)
        .fetch_all(self)
        .await?;

        Ok(res.into_iter().map(models::photos::Photo::from).collect())
    }

    async fn get_photo_by_id(
        &mut self,
        photo_id: PhotoId,
    ) -> Result<Option<models::photos::Photo>, sqlx::Error> {
        let res: Result<Photo, _> = sqlx::query_as(
            r#"
                SELECT
                    id, images, tags, datetime
                FROM
                    photos
                WHERE
                    id = $1
            "#,
        )
        .bind(photo_id)
        .fetch_one(self)
        .await;

        match res {
            Ok(photo) => Ok(Some(photo.into())),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn insert_photo(
        &mut self,
        photo: &models::photos::Photo,
    ) -> Result<PhotoId, sqlx::Error> {
        let res: (PhotoId,) = sqlx::query_as(
            r#"
                INSERT INTO photos
                    (images, tags, datetime)
                VALUES
                    ($1, $2, $3)
                RETURNING
                    id
            "#,
        )
        .bind(&photo.images[..])
        .bind(&photo.tags[..])
        .bind(photo.datetime)
        .fetch_one(self)
        .await?;

        Ok(res.0)
    }

    async fn update_photo(
        &mut self,
        old_photo: &models::photos::Photo,
        new_photo: &models::photos::Photo,
    ) -> Result<bool, sqlx::Error> {
        let mut trans = self.begin().await?;
        let mut changed = false;

        if old_photo.images != new_photo.images {
            tide::log::info!("Images differ, updating");
            changed = true;
            sqlx::query(
                r#"
                    UPDATE
                        photos
                    SET
                        images = $2
                    WHERE
                        id = $1
                "#,
            )
            .bind(old_photo.id)
            .bind(&new_photo.images[..])
            .execute(&mut trans)
            .await?;
        }

        if old_photo.tags != new_photo.tags {
            tide::log::info!("Tags differ, updating");
            changed = true;
            sqlx::query(
                r#"
                    UPDATE
                        photos
                    SET
                        tags = $2
                    WHERE
                        id = $1
                "#,
            )
            .bind(old_photo.id)
            .bind(&new_photo.tags[..])
            .execute(&mut trans)
            .await?;
        }

        // `datetime` is deliberately not part of the update set: the upload
        // moment is stamped once at create and preserved across edits.

        trans.commit().await?;
        Ok(changed)
    }
}
