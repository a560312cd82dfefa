pub mod loader;
pub mod schema;

pub use loader::{
    CliOverrides, get_config_path, load_config, save_config, write_private_file,
};
pub use schema::{DEFAULT_API_URL, ProviderConfig};
