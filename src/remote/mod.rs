pub mod client;
pub mod error_translation;
pub mod params;

pub use client::AppRepoClient;
pub use error_translation::{status_message, translate};
pub use params::build_params;
