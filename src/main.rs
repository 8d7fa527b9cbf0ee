use dayblock::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::cli().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
