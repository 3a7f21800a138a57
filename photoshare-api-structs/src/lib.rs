/// Per-image projection served by the gallery endpoints. `width`/`height`
/// are omitted entirely when the server runs without size tokens.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DisplayPhoto {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct PhotoPayload {
    pub images: Vec<String>,
    pub tags: Vec<String>,
}
