pub mod tag_client;

pub use tag_client::{GitHubTagClient, RepoTag};
