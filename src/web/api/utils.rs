use futures_util::stream;
use multer::Multipart;

use photoshare_api_structs::PhotoPayload;

use crate::hooks::UploadedFile;

const PAYLOAD_FIELD: &str = "payload";
const IMAGES_FIELD: &str = "images";

/// Pull the JSON payload and the uploaded image files out of a multipart
/// record-write request. Parts other than `payload` and `images` are
/// ignored.
pub(super) async fn parse_record_form(
    req: &mut tide::Request<crate::State>,
) -> tide::Result<(PhotoPayload, Vec<UploadedFile>)> {
    let content_type = req
        .header("Content-Type")
        .map(|values| values.last().as_str().to_string())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(&content_type).map_err(|_| {
        tide::Error::from_str(
            tide::http::StatusCode::BadRequest,
            "expected a multipart/form-data body",
        )
    })?;

    let body = req.body_bytes().await?;
    let mut multipart = Multipart::new(
        stream::once(async move { Ok::<_, std::io::Error>(body) }),
        boundary,
    );

    let mut payload: Option<PhotoPayload> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some(PAYLOAD_FIELD) => {
                let bytes = field.bytes().await.map_err(invalid_form)?;
                payload = Some(serde_json::from_slice(&bytes).map_err(|err| {
                    tide::Error::from_str(
                        tide::http::StatusCode::BadRequest,
                        format!("invalid payload: {}", err),
                    )
                })?);
            },
            Some(IMAGES_FIELD) => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(invalid_form)?.to_vec();
                files.push(UploadedFile { name, data });
            },
            _ => {},
        }
    }

    Ok((payload.unwrap_or_default(), files))
}

fn invalid_form(err: multer::Error) -> tide::Error {
    tide::Error::from_str(tide::http::StatusCode::BadRequest, err.to_string())
}
