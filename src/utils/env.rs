// src/utils/env.rs
use log::{debug, info};

/// Loads variables from a .env file when one is present. Missing files are
/// fine; the environment itself always wins.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(_) => debug!("No .env file found, using process environment"),
    }
}
