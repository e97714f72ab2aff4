use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request. Lets tests and alternate transports stand in
/// for the real client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
