use clap::Parser;
use project_dashboard::app;
use project_dashboard::config::GatewayArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = GatewayArgs::parse();

    app::run(args).await?;

    Ok(())
}
