use recibos_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    let (_state, router) = recibos_api::setup::initialize_app(config.clone()).await?;

    recibos_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
