mod config;
mod logging;
mod shutdown;

pub use config::load_config;
pub use logging::init_logging;
pub use shutdown::cancel_on_signal;
