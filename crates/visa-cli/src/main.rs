#[tokio::main]
async fn main() {
    if let Err(err) = visa_cli::run().await {
        eprintln!("application error: {err:#}");
        std::process::exit(1);
    }
}
