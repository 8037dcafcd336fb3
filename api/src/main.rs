use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use api::{
    api::{post_chat_route, post_run_code_route, service::RelayService},
    config::{CodepadConfig, Secrets},
};
use clap::Parser;
use log::{debug, info, trace, warn};

#[derive(Parser)]
#[clap(
    version = "0.1",
    author = "Codepad Contributors",
    about = "Relay server for the codepad editor"
)]
pub struct CodepadOpts {
    /// Config file path, defaults are used when omitted
    #[clap(short, long)]
    config: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    env_logger::init();
    let options = CodepadOpts::parse();

    info!("starting up ...");
    if let Ok(path) = dotenv {
        debug!("loaded environment from {}", path.display());
    }

    let mut config = match options.config {
        Some(path) => {
            debug!("loading config file at {}", path);
            CodepadConfig::load(path.as_str())?
        }
        None => {
            debug!("no config file given, using defaults");
            CodepadConfig::default()
        }
    };
    config.apply_port_override(|name| std::env::var(name).ok())?;
    trace!(
        "config file loaded successfully with content: {:#?}",
        config
    );

    let secrets = Secrets::from_env();
    debug!("secrets: {:?}", secrets);
    if secrets.judge0_api_key.is_none() {
        warn!("JUDGE0_API_KEY is not set, /run-code will answer with an error");
    }
    if secrets.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set, /api/chat will answer with an error");
    }

    let service = web::Data::new(RelayService::new(&config, secrets)?);

    let host = config.api.host.clone();
    let port = config.api.port;

    info!("Starting server on {}:{}", host, port);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(service.clone())
            .service(post_run_code_route)
            .service(post_chat_route)
    })
    .bind((host, port))?
    .run()
    .await?;

    info!("shutting down");
    Ok(())
}
