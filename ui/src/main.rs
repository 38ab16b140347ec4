pub use app::App;

pub mod app;
mod dashboard;
mod data;
mod extension;
mod form;
mod home;
mod login;
mod notification;

use cli_log::init_cli_log;
use client::config::Config;
use log::info;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    init_cli_log!("optima");
    color_eyre::install()?;
    let config = Config::from_env();
    info!("Using backend {}", config.api_url);
    let app = App::new(config)?;
    let terminal = ratatui::init();
    let result = app.run(terminal).await;
    ratatui::restore();
    result
}
