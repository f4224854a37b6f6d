mod scenarios;

use baser::ConfigError;
use log::info;

fn main() -> Result<(), ConfigError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    scenarios::idle_link()?;
    scenarios::start_lanes()?;
    scenarios::corrupt_block_type()?;
    scenarios::slip_relock()?;

    info!("all scenarios done");
    Ok(())
}
