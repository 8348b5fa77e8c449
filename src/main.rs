mod api;
mod config;
mod helper_model;
mod integration;
mod methods;
mod model;
mod store;

use once_cell::sync::Lazy;
use warp::Filter;

pub static CONFIG: Lazy<config::AppConfig> =
    Lazy::new(|| config::AppConfig::load().expect("Could not load configuration"));
pub static STORE: Lazy<store::Store> = Lazy::new(store::Store::new);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(CONFIG.log_level.clone())
        .init();

    // routing for the server
    let httpd = api::api().and(warp::path::end());
    // TODO: tls
    warp::serve(httpd).run(([127, 0, 0, 1], CONFIG.port)).await;
}
