#[async_std::main]
async fn main() {
    if let Err(err) = photoshare::main().await {
        eprintln!("Error: {}", err);
        std::process::exit(err.into());
    }
}
