use tide::{Request, Response};

use crate::db::photos::PhotoProvider;
use crate::hooks::{RecordCreateEvent, RecordUpdateEvent};
use crate::models::photos::Photo;
use crate::storage;

mod utils;

pub(super) fn mount(mut route: tide::Route<crate::State>) {
    route.at("/photos").post(create_photo);
    route.at("/photo/by-id/:photo_id").post(update_photo);
}

async fn create_photo(mut req: Request<crate::State>) -> tide::Result<Response> {
    let (payload, mut files) = utils::parse_record_form(&mut req).await?;
    tide::log::debug!("Received photo payload: {:#?}", payload);

    let state = req.state();
    let mut conn = state.db.acquire().await?;

    if let Some(reason) = unusable_file_name(&files) {
        return Ok(bad_request(reason));
    }

    let mut record = Photo {
        id: 0,
        images: payload.images,
        tags: payload.tags,
        datetime: None,
    };

    let run = state.hooks.run_before_create(&mut RecordCreateEvent {
        record: &mut record,
        files: &mut files[..],
        embed_dimensions: state.args.size_tokens_enabled(),
    });
    if let Err(err) = run {
        return Ok(bad_request(err.to_string()));
    }

    let id = conn.insert_photo(&record).await?;
    for file in &files {
        state.files.put(id, &file.name, &file.data).await?;
    }

    Ok(Response::builder(tide::http::StatusCode::Created)
        .body(tide::convert::json!({
            "id": id,
        }))
        .build())
}

async fn update_photo(mut req: Request<crate::State>) -> tide::Result<Response> {
    let photo_id: i32 = req.param("photo_id")?.parse()?;

    let (payload, mut files) = utils::parse_record_form(&mut req).await?;
    tide::log::debug!("Received photo payload: {:#?}", payload);

    let state = req.state();
    let mut conn = state.db.acquire().await?;

    if let Some(reason) = unusable_file_name(&files) {
        return Ok(bad_request(reason));
    }

    let old_photo = match conn.get_photo_by_id(photo_id).await? {
        Some(photo) => photo,
        None => return Ok(Response::builder(tide::http::StatusCode::NotFound).build()),
    };

    let mut record = Photo {
        id: old_photo.id,
        images: payload.images,
        tags: payload.tags,
        // The original upload moment survives edits; update hooks never
        // restamp it.
        datetime: old_photo.datetime,
    };

    let run = state.hooks.run_before_update(&mut RecordUpdateEvent {
        record: &mut record,
        files: &mut files[..],
        embed_dimensions: state.args.size_tokens_enabled(),
    });
    if let Err(err) = run {
        return Ok(bad_request(err.to_string()));
    }

    let changed = conn.update_photo(&old_photo, &record).await?;
    for file in &files {
        state.files.put(old_photo.id, &file.name, &file.data).await?;
    }

    Ok(Response::builder(tide::http::StatusCode::Ok)
        .body(tide::convert::json!({
            "changed": changed,
            "previous": old_photo,
            "current": record,
        }))
        .build())
}

fn unusable_file_name(files: &[crate::hooks::UploadedFile]) -> Option<String> {
    files
        .iter()
        .find(|file| !storage::safe_name(&file.name))
        .map(|file| format!("unusable file name: {:?}", file.name))
}

fn bad_request(reason: String) -> Response {
    Response::builder(tide::http::StatusCode::BadRequest)
        .body(tide::convert::json!({
            "reason": reason,
        }))
        .build()
}
