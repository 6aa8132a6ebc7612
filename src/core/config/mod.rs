pub mod data;
pub mod io;

pub use data::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use io::{ConfigStore, CONFIG_KEY};
