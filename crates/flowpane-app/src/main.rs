//! Main application entry point (native).

fn main() {
    env_logger::init();
    log::info!("Starting Flowpane");

    let result = flowpane_app::AppConfig::from_env().and_then(flowpane_app::App::run);
    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
