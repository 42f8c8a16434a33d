use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam over the HTTP stack so downloads can be driven by a stub in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
