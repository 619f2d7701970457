mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::StatusCode;

/// Sends `req` and returns the status together with the full body as text.
///
/// Non-success statuses are not errors here; callers decide how to read the
/// body.
pub async fn fetch_text<C: HttpClient>(
    client: &C,
    req: reqwest::Request,
) -> reqwest::Result<(StatusCode, String)> {
    let resp = client.execute(req).await?;
    let status = resp.status();
    Ok((status, resp.text().await?))
}
