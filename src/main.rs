use log_monitor::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::main().await
}
