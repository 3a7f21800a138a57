use serde::{Deserialize, Serialize};
use tide::{Request, Response};

use photoshare_api_structs::DisplayPhoto;

use crate::db::photos::{PhotoProvider, DEFAULT_LIMIT};
use crate::db::tags::TagProvider;
use crate::display;

mod utils;

pub(super) fn mount(app: &mut tide::Server<crate::State>) {
    app.at("/:tag").get(gallery_html);
    app.at("/:tag/json").get(gallery_json);
}

#[derive(Default, Deserialize, Serialize)]
#[serde(default)]
struct GalleryQuery {
    limit: Option<i64>,
}

/// Resolve the tag, list its photos, and build the per-image display
/// projections. `Ok(None)` means the tag does not exist and the request
/// should 404 without producing a partial gallery.
async fn tag_gallery(
    req: &Request<crate::State>,
) -> tide::Result<Option<(String, Vec<DisplayPhoto>)>> {
    let state = req.state();
    let mut conn = state.db.acquire().await?;

    let tag_id = percent_encoding::percent_decode_str(req.param("tag")?)
        .decode_utf8_lossy()
        .to_string();

    // Absent or unparseable query strings fall back to the default limit.
    let query: GalleryQuery = req.query().unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let tag = match conn.get_tag(&tag_id).await? {
        Some(tag) => tag,
        None => return Ok(None),
    };
    let title = if tag.name.is_empty() {
        state.args.app_name().to_string()
    } else {
        tag.name
    };

    let photos = conn.get_photos_by_tag(&tag_id, limit).await?;
    let photos = display::display_photos(
        &state.args.asset_base_url(),
        &photos,
        state.args.size_tokens_enabled(),
    );

    Ok(Some((title, photos)))
}

async fn gallery_html(req: Request<crate::State>) -> tide::Result<Response> {
    let (title, photos) = match tag_gallery(&req).await? {
        Some(gallery) => gallery,
        None => return Ok(Response::builder(tide::http::StatusCode::NotFound).build()),
    };

    let state = req.state();
    let mut context = tera::Context::new();
    context.insert("title", &title);
    context.insert("photos", &photos);

    let body = utils::render(&state.tera, "gallery.html", &context)?;
    let res = Response::builder(tide::http::StatusCode::Ok)
        .content_type("text/html")
        .body(body)
        .build();
    Ok(res)
}

async fn gallery_json(req: Request<crate::State>) -> tide::Result<Response> {
    let (_, photos) = match tag_gallery(&req).await? {
        Some(gallery) => gallery,
        None => return Ok(Response::builder(tide::http::StatusCode::NotFound).build()),
    };

    let res = Response::builder(tide::http::StatusCode::Ok)
        .body(tide::Body::from_json(&photos)?)
        .build();
    Ok(res)
}
