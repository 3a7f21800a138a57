use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

impl From<crate::db::tags::Tag> for Tag {
    fn from(t: crate::db::tags::Tag) -> Self {
        Tag {
            id: t.id,
            name: t.name,
        }
    }
}
