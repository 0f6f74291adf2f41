pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod providers;
pub mod proxy;
pub mod render;
pub mod routes;
pub mod types;
pub mod view;

#[derive(Clone, Debug)]
pub struct AppState {
    /// External search endpoint; health is derived from it.
    pub search_url: String,
    pub http_client: reqwest::Client,
}

pub use providers::CloudType;
pub use types::*;

impl AppState {
    pub fn new(search_url: String, http_client: reqwest::Client) -> Self {
        Self {
            search_url,
            http_client,
        }
    }
}
