use crate::domain::notification::{FeedQuery, Notification, NotificationId};
use crate::domain::ports::NotificationApi;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Notification backend reached over HTTP.
///
/// Speaks the `/notifications` endpoints of the marketplace API with bearer
/// authentication. `401` and `403` map to [`ApiError::Unauthorized`].
#[derive(Clone, Debug)]
pub struct HttpNotificationApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotificationApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/notifications/{}", self.base_url, path)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp)
    }

    async fn post(&self, token: &str, path: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn fetch(&self, token: &str, query: &FeedQuery) -> Result<Vec<Notification>, ApiError> {
        let mut params = vec![("user_view", query.user_view.as_str())];
        if query.unread_only {
            params.push(("unread_only", "true"));
        }

        let resp = self
            .client
            .get(self.url("get_notifications"))
            .query(&params)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn mark_read(&self, token: &str, id: NotificationId) -> Result<(), ApiError> {
        self.post(token, &format!("{}/mark-read", id)).await
    }

    async fn mark_all_read(&self, token: &str) -> Result<(), ApiError> {
        self.post(token, "mark-all-read").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::UserView;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const BACKEND_FEED: &str = r#"[{"id":3,"type":"new_order","text":"New order #41","is_read":false,"created_at":"2024-03-01T10:00:00.123456","reference_id":41,"reference_type":"order","notification_metadata":{"user_view":"business"}}]"#;

    /// Accepts one connection, answers it with `status` and `body`, and
    /// resolves to the raw request head.
    async fn serve_once(status: &str, body: &str) -> (HttpNotificationApi, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let api = HttpNotificationApi::with_client(client, format!("http://{}", addr));
        (api, server)
    }

    fn business_unread() -> FeedQuery {
        FeedQuery {
            user_view: UserView::Business,
            unread_only: true,
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let api = HttpNotificationApi::new("http://localhost:8000/");
        assert_eq!(
            api.url("get_notifications"),
            "http://localhost:8000/notifications/get_notifications"
        );
        assert_eq!(
            api.url(&format!("{}/mark-read", 5)),
            "http://localhost:8000/notifications/5/mark-read"
        );
    }

    #[tokio::test]
    async fn test_fetch_parses_backend_feed() {
        let (api, server) = serve_once("200 OK", BACKEND_FEED).await;

        let feed = api.fetch("secret", &business_unread()).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, 3);
        assert_eq!(feed[0].kind, "new_order");
        assert_eq!(feed[0].reference_id, Some(41));
        assert_eq!(feed[0].created_at.to_rfc3339(), "2024-03-01T10:00:00.123456+00:00");

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert_eq!(
            request_line,
            "GET /notifications/get_notifications?user_view=business&unread_only=true HTTP/1.1"
        );
        assert!(request.to_lowercase().contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn test_fetch_omits_unread_only_when_off() {
        let (api, server) = serve_once("200 OK", "[]").await;
        let query = FeedQuery {
            user_view: UserView::Personal,
            unread_only: false,
        };

        assert!(api.fetch("secret", &query).await.unwrap().is_empty());
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /notifications/get_notifications?user_view=personal HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_rejected_token_is_unauthorized() {
        for status in ["401 Unauthorized", "403 Forbidden"] {
            let (api, server) = serve_once(status, r#"{"detail":"Not authenticated"}"#).await;
            let result = api.fetch("stale", &business_unread()).await;
            assert_eq!(result, Err(ApiError::Unauthorized));
            server.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_server_error_keeps_status_and_body() {
        let (api, server) = serve_once("500 Internal Server Error", "boom").await;
        let result = api.fetch("secret", &business_unread()).await;
        assert_eq!(
            result,
            Err(ApiError::Status {
                status: 500,
                body: "boom".to_string(),
            })
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let (api, server) = serve_once("200 OK", r#"{"not":"a list"}"#).await;
        let result = api.fetch("secret", &business_unread()).await;
        assert!(matches!(result, Err(ApiError::Parse(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_read_posts_to_notification() {
        let (api, server) = serve_once("200 OK", r#"{"message":"Notification marked as read"}"#).await;
        api.mark_read("secret", 7).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /notifications/7/mark-read HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_mark_all_read_posts_bulk() {
        let (api, server) = serve_once("200 OK", "{}").await;
        api.mark_all_read("secret").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /notifications/mark-all-read HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let api = HttpNotificationApi::new("http://127.0.0.1:9");
        let result = api.mark_all_read("t").await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
