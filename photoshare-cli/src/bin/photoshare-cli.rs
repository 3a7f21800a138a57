use structopt::StructOpt;

use photoshare_api_structs::PhotoPayload;

const BOUNDARY: &str = "----photoshare-cli-7f9a3c1d";

#[derive(StructOpt)]
struct SharedApiArgs {
    /// photoshare API host
    #[structopt(long, env = "PHOTOSHARE_API_ENDPOINT")]
    endpoint: String,
}

#[derive(StructOpt)]
pub struct UploadArgs {
    #[structopt(flatten)]
    api_arguments: SharedApiArgs,

    /// Tag ids to attach to the photo.
    #[structopt(long = "tag")]
    tags: Vec<String>,

    /// Paths of image files to upload.
    #[structopt(name = "PATH", parse(from_os_str), required = true)]
    file_paths: Vec<std::path::PathBuf>,
}

#[derive(StructOpt)]
pub struct UpdateArgs {
    #[structopt(flatten)]
    api_arguments: SharedApiArgs,

    /// Photo ID to update.
    #[structopt(name = "PHOTO_ID")]
    photo_id: u32,

    /// Tag ids the photo should carry after the update.
    #[structopt(long = "tag")]
    tags: Vec<String>,

    /// Paths of image files to add.
    #[structopt(name = "PATH", parse(from_os_str))]
    file_paths: Vec<std::path::PathBuf>,
}

#[derive(StructOpt)]
pub enum Command {
    Upload(UploadArgs),
    Update(UpdateArgs),
}

fn read_files(paths: &[std::path::PathBuf]) -> Vec<(String, Vec<u8>)> {
    paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .expect("couldn't get file name from path")
                .to_string_lossy()
                .to_string();
            let data = std::fs::read(path).expect("couldn't read photo file");
            (name, data)
        })
        .collect()
}

fn multipart_body(payload: &PhotoPayload, files: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();

    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"payload\"\r\n");
    body.extend_from_slice(b"Content-Type: application/json\r\n\r\n");
    body.extend_from_slice(
        &serde_json::to_vec(payload).expect("couldn't serialize photo payload"),
    );
    body.extend_from_slice(b"\r\n");

    for (name, data) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\n",
                name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post_record(url: String, payload: &PhotoPayload, files: &[(String, Vec<u8>)]) {
    let body = multipart_body(payload, files);

    log::info!("Sending {} file(s) to {}", files.len(), url);
    let mut res = surf::post(url)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(surf::Body::from_bytes(body))
        .await
        .expect("couldn't send POST request to photoshare API");

    let response_body: serde_json::Value = res.body_json().await.unwrap();
    log::info!("photoshare API response: {:#?}", res);
    log::info!("photoshare API body: {:#?}", response_body);

    let status = res.status();
    assert!(!status.is_client_error() && !status.is_server_error());
}

async fn upload_photo(args: UploadArgs) -> std::io::Result<()> {
    let files = read_files(&args.file_paths);
    let payload = PhotoPayload {
        images: files.iter().map(|(name, _)| name.clone()).collect(),
        tags: args.tags,
    };

    let url = format!("{}/api/photos", args.api_arguments.endpoint);
    post_record(url, &payload, &files).await;

    Ok(())
}

async fn update_photo(args: UpdateArgs) -> std::io::Result<()> {
    let files = read_files(&args.file_paths);
    let payload = PhotoPayload {
        images: files.iter().map(|(name, _)| name.clone()).collect(),
        tags: args.tags,
    };

    let url = format!(
        "{}/api/photo/by-id/{}",
        args.api_arguments.endpoint, args.photo_id,
    );
    post_record(url, &payload, &files).await;

    Ok(())
}

#[async_std::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    match Command::from_args() {
        Command::Upload(args) => upload_photo(args).await,
        Command::Update(args) => update_photo(args).await,
    }
}
