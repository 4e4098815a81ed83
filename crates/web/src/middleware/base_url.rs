use axum::{extract, http::HeaderMap, middleware::Next, response::IntoResponse};
use std::sync::Arc;

/// Scheme, host and path prefix the client used to reach us, honoring
/// reverse proxy headers.
#[derive(Debug, Clone)]
pub struct BaseUrl {
    proto: String,
    host: String,
    prefix: String,
}

impl BaseUrl {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        BaseUrl {
            proto: header("x-forwarded-proto").unwrap_or("http").to_string(),
            host: header("x-forwarded-host")
                .or_else(|| header("host"))
                .unwrap_or("localhost")
                .to_string(),
            prefix: header("x-forwarded-prefix").unwrap_or("").to_string(),
        }
    }

    pub fn full_url<S: Into<String>>(&self, path: S) -> String {
        format!(
            "{}://{}{}{}",
            self.proto,
            self.host,
            self.prefix,
            path.into()
        )
    }
}

pub async fn base_url_middleware(mut req: extract::Request, next: Next) -> impl IntoResponse {
    let base_url = BaseUrl::from_headers(req.headers());
    req.extensions_mut().insert(Arc::new(base_url));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_headers_win() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("internal:8080"));
        assert_eq!(
            BaseUrl::from_headers(&headers).full_url("/api/ping"),
            "http://internal:8080/api/ping"
        );

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("track.example.org"));
        headers.insert("x-forwarded-prefix", HeaderValue::from_static("/logistics"));
        assert_eq!(
            BaseUrl::from_headers(&headers).full_url("/api/ping"),
            "https://track.example.org/logistics/api/ping"
        );
    }
}
