use crate::hooks::{HookError, ServeEvent};

pub mod api;
pub mod files;
pub mod gallery;

/// Serve-start hook: mounts the record-write API, the stored-file endpoint,
/// and the public galleries.
pub(crate) fn serve_start(event: &mut ServeEvent<'_>) -> Result<(), HookError> {
    mount(event.app);
    Ok(())
}

fn mount(app: &mut tide::Server<crate::State>) {
    api::mount(app.at("/api"));
    files::mount(app.at("/api/files/photos"));
    gallery::mount(app);
}
