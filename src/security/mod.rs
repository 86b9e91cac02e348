pub mod credentials;

pub use credentials::SecureCredentials;
