use async_trait::async_trait;
use reqwest::{Request, Response};

/// Sends requests to the test database. [`Bearer`](super::auth::Bearer) wraps
/// an implementation to attach the access token, and tests wrap recording
/// fakes to see what would be sent.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
