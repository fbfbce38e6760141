use std::net::{IpAddr, SocketAddr, TcpListener};
use std::path::Path;
use std::sync::Arc;

use prompt_studio::{api, comfyui, config, generator, store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::Config::dotenv_load();
    tracing_subscriber::fmt::init();

    let config = config::Config::new();
    config.log_summary();

    let comfyui_client = comfyui::ComfyUIClient::new(config.comfyui_url.clone());
    let generator = generator::ComfyUiGenerator::from_workflow_file(
        comfyui_client,
        Path::new(&config.workflow_path),
    )
    .await?;
    let store = store::PromptStore::open(&config.prompts_db).await?;
    tokio::fs::create_dir_all(&config.static_dir).await?;

    let state = Arc::new(api::AppState::new(
        store,
        Arc::new(generator),
        &config.static_dir,
        config.generation_timeout(),
        config.generation_workers,
    ));

    // Fall back to safe defaults on bad host/port
    let ip: IpAddr = config.api_host.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", config.api_host);
        IpAddr::from([127, 0, 0, 1])
    });
    let port: u16 = config.api_port.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_PORT '{}', falling back to 5001", config.api_port);
        5001
    });
    let socket_address = SocketAddr::new(ip, port);
    let listener = TcpListener::bind(socket_address)?;
    tracing::info!("listening on {}", socket_address);

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };
    api::serve(listener, state, ctrl_c).await?;
    tracing::info!("server stopped");
    Ok(())
}
