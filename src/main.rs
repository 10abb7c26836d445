#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = skillbase_rust::run().await {
        eprintln!("skillbase-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
