use log::info;

use timetable_solver::config::{GeneratorConfig, ServerConfig};
use timetable_solver::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let generator = GeneratorConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;
    info!(
        "Loaded configuration: {} passes max, {} hours per pair, {} default weeks",
        generator.max_iterations, generator.hours_per_pair, generator.default_semester_weeks
    );

    server::run_server(server_config, generator).await?;
    Ok(())
}
