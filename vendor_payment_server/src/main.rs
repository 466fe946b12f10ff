use dotenvy::dotenv;
use log::*;
use vendor_payment_server::{
    cli::{handle_command_line_args, CliCommand},
    config::ServerConfig,
    server::run_server,
};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = ServerConfig::from_env_or_default();
    match handle_command_line_args() {
        CliCommand::Help => {},
        CliCommand::Purge => {
            if let Err(e) = vendor_payment_server::cli::purge(&config).await {
                error!("🚀️ Purge failed. {e}");
                std::process::exit(1);
            }
        },
        CliCommand::Serve => {
            info!("🚀️ Starting server on {}:{}", config.host, config.port);
            match run_server(config).await {
                Ok(_) => println!("Bye!"),
                Err(e) => eprintln!("{e}"),
            }
        },
    }
}
