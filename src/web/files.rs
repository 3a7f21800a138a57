use tide::{Body, Request, Response};

use crate::storage;

pub(super) fn mount(mut route: tide::Route<crate::State>) {
    route.at("/:photo_id/:filename").get(serve_file);
}

/// The stored-file endpoint the default asset base URL points at.
async fn serve_file(req: Request<crate::State>) -> tide::Result<Response> {
    let state = req.state();

    let photo_id: i32 = req.param("photo_id")?.parse()?;
    let filename = percent_encoding::percent_decode_str(req.param("filename")?)
        .decode_utf8_lossy()
        .to_string();

    if !storage::safe_name(&filename) {
        return Ok(Response::builder(tide::http::StatusCode::NotFound).build());
    }

    match Body::from_file(state.files.path_for(photo_id, &filename)).await {
        Ok(body) => Ok(Response::builder(tide::http::StatusCode::Ok)
            .body(body)
            .build()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok(Response::builder(tide::http::StatusCode::NotFound).build())
        },
        Err(err) => Err(err.into()),
    }
}
