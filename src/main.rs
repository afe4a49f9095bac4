#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = assessment_desk::run().await {
        eprintln!("assessment-desk fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
