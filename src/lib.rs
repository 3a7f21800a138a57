use std::sync::Arc;

use structopt::StructOpt;

pub mod db;
pub mod display;
pub mod exif;
pub mod hooks;
pub mod models;
pub mod storage;
pub mod telemetry;
pub mod web;

#[derive(Clone, Debug)]
pub struct State {
    pub args: Arc<Args>,
    pub db: sqlx::postgres::PgPool,
    pub tera: Arc<tera::Tera>,
    pub hooks: Arc<hooks::Hooks>,
    pub files: Arc<storage::LocalStore>,
}

#[derive(Debug)]
pub enum Error {
    TemplateParseError(tera::Error),
    TelemetryInitError(anyhow::Error),
    ServeHookError(hooks::HookError),
}

impl From<Error> for i32 {
    fn from(error: Error) -> i32 {
        match error {
            Error::TemplateParseError(_) => 3,
            Error::TelemetryInitError(_) => 4,
            Error::ServeHookError(_) => 5,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::TemplateParseError(err) => {
                write!(f, "Template parsing error: {}", err)
            },
            Error::TelemetryInitError(err) => {
                write!(f, "Failed to init telemetry: {}", err)
            },
            Error::ServeHookError(err) => {
                write!(f, "Serve-start hook failed: {}", err)
            },
        }
    }
}

#[derive(Debug, StructOpt)]
pub struct Args {
    /// Host address to bind to.
    #[structopt(long, default_value = "localhost", env = "PHOTOSHARE_BIND_ADDRESS")]
    address: String,
    /// Port to bind to.
    #[structopt(long, default_value = "8167", env = "PHOTOSHARE_BIND_PORT")]
    port: u16,

    /// PostgreSQL database url.
    #[structopt(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Public base URL of this application.
    #[structopt(long, env = "PHOTOSHARE_BASE_URL")]
    base_url: String,

    /// Base URL under which stored images are reachable. Derived from the
    /// application base URL and the files endpoint when unset.
    #[structopt(long, env = "PHOTOSHARE_ASSET_BASE_URL")]
    asset_base_url: Option<String>,

    /// Application name, used as the gallery title for tags without a
    /// display name.
    #[structopt(long, default_value = "photoshare", env = "PHOTOSHARE_APP_NAME")]
    app_name: String,

    /// Serve galleries without per-image width/height metadata and skip
    /// dimension-prefixing of uploaded filenames.
    #[structopt(long)]
    disable_size_tokens: bool,

    /// Directory uploaded images are stored under.
    #[structopt(
        long,
        parse(from_os_str),
        default_value = "./storage",
        env = "PHOTOSHARE_STORAGE_PATH"
    )]
    storage_path: std::path::PathBuf,

    /// Path to Tera templates directory
    #[structopt(
        long,
        parse(from_os_str),
        default_value = "./templates",
        env = "PHOTOSHARE_TEMPLATE_PATH"
    )]
    template_path: std::path::PathBuf,
}

impl Args {
    /// Prefix public image URLs are built from, without a trailing slash.
    pub fn asset_base_url(&self) -> String {
        match &self.asset_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/api/files/photos", self.base_url.trim_end_matches('/')),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn size_tokens_enabled(&self) -> bool {
        !self.disable_size_tokens
    }
}

pub async fn main() -> Result<(), Error> {
    let dotenv_missing = dotenv::dotenv().is_err();
    let args = Arc::new(Args::from_args());

    telemetry::init().map_err(Error::TelemetryInitError)?;
    if dotenv_missing {
        tracing::warn!("no .env file loaded, continuing with process environment only");
    }

    let pool = db::get_pool(&args.database_url)
        .await
        .expect("couldn't get DB pool");

    let template_path = args
        .template_path
        .canonicalize()
        .expect("could not canonicalize template path");
    let tera = match tera::Tera::new(&template_path.join("**/*.html").to_string_lossy()) {
        Ok(t) => t,
        Err(e) => {
            return Err(Error::TemplateParseError(e));
        },
    };

    let hooks = Arc::new(hooks::Hooks::defaults());

    let state = State {
        args: args.clone(),
        db: pool,
        tera: Arc::new(tera),
        hooks: hooks.clone(),
        files: Arc::new(storage::LocalStore::new(&args.storage_path)),
    };
    let mut app = tide::with_state(state);

    hooks
        .run_serve_start(&mut hooks::ServeEvent { app: &mut app })
        .map_err(Error::ServeHookError)?;

    let address: &str = args.address.as_ref();
    app.listen((address, args.port))
        .await
        .expect("starting tide app failed");

    Ok(())
}
