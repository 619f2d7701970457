use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue, InvalidHeaderValue};

/// An [`HttpClient`] wrapper that sends `Authorization: Bearer <token>` with
/// every request.
pub struct Bearer<C> {
    pub inner: C,
    value: HeaderValue,
}

impl<C> Bearer<C> {
    /// Fails if the token contains characters not allowed in a header.
    pub fn new(inner: C, token: &str) -> Result<Self, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        Ok(Self { inner, value })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for Bearer<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut().insert(AUTHORIZATION, self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Unused;

    /// Remembers the authorization header, then sends to a closed local port.
    struct Recording {
        seen: Mutex<Option<HeaderValue>>,
        inner: BasicClient,
    }

    #[async_trait]
    impl HttpClient for Recording {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            *self.seen.lock().unwrap() = req.headers().get(AUTHORIZATION).cloned();
            self.inner.execute(req).await
        }
    }

    #[test]
    fn test_rejects_token_with_newline() {
        assert!(Bearer::new(Unused, "abc\ndef").is_err());
    }

    #[test]
    fn test_header_value_is_sensitive() {
        let bearer = Bearer::new(Unused, "abc").unwrap();
        assert!(bearer.value.is_sensitive());
        assert_eq!(bearer.value.to_str().unwrap(), "Bearer abc");
    }

    #[tokio::test]
    async fn test_execute_adds_authorization_header() {
        let inner = BasicClient::new(Duration::from_secs(2), Duration::from_secs(1)).unwrap();
        let req = inner.inner().get("http://127.0.0.1:9/").build().unwrap();
        let bearer = Bearer::new(
            Recording {
                seen: Mutex::new(None),
                inner,
            },
            "abc",
        )
        .unwrap();

        assert!(bearer.execute(req).await.is_err());
        let seen = bearer.inner.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.to_str().unwrap(), "Bearer abc");
        assert!(seen.is_sensitive());
    }
}
