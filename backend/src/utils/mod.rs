pub mod config;
pub mod geo;
pub mod logging;
pub mod tokens;
pub mod validation;

pub use config::{CloudinaryConfig, Config};
pub use logging::init_logging;
