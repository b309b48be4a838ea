use dotenvy::dotenv;
use log::info;
use loyalty_points_server::{cli::handle_command_line_args, config::ServerConfig, server::run_server};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let Some(args) = handle_command_line_args() else {
        return;
    };
    let mut config = ServerConfig::from_env_or_default();
    config.apply_arguments(&args);

    info!("🚀️ Starting server on {}:{}", config.host, config.port);
    match run_server(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
