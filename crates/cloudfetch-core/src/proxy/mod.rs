// Proxy module - download proxy for whitelisted cloud storage providers

pub mod active_downloads;
pub mod classifier;
pub mod fetcher;
pub mod github;
pub mod handler;
pub mod middleware;
pub mod response;
pub mod server;
pub mod share_links;
pub mod whitelist;

pub use active_downloads::{ActiveDownloadGuard, ActiveDownloads};
pub use classifier::classify_service;
pub use handler::{handle_proxy_request, route_request};
pub use server::{build_proxy_router, AppState};
pub use whitelist::DomainWhitelist;
