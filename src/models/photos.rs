use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub type PhotoId = i32;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Photo {
    pub id: PhotoId,
    /// Stored filenames in display order, each optionally carrying a
    /// `[WxH]_` prefix written by the upload annotator.
    pub images: Vec<String>,
    pub tags: Vec<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub datetime: Option<OffsetDateTime>,
}

impl From<crate::db::photos::Photo> for Photo {
    fn from(p: crate::db::photos::Photo) -> Self {
        Photo {
            id: p.id,
            images: p.images,
            tags: p.tags,
            datetime: p.datetime,
        }
    }
}
