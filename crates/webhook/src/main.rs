use webhook::run_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("webhook=info,tower_http=debug")
        .init();

    run_server().await
}
