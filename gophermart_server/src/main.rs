use clap::Parser;
use dotenvy::dotenv;
use gophermart_server::{cli::Cli, config::ServerConfig, server::run_server};
use log::info;

#[actix_web::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str())).init();
    let config = ServerConfig::from_env_or_default().apply_cli(&cli);

    info!("🚀️ Starting server on {}", config.run_address);
    match run_server(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
