pub mod config;
pub mod config_loader;
pub mod error;
pub mod job;
pub mod retry;
pub mod traits;
pub mod version;

pub use config::*;
pub use config_loader::*;
pub use error::*;
pub use job::*;
pub use retry::*;
pub use traits::*;
pub use version::*;
