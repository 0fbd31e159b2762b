//! Trace ID 中间件
//! 沿用请求头中的 `X-Trace-Id`，没有则生成 UUID；写入请求扩展和响应头

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// 单次请求的追踪 ID，可通过 `Extension<TraceId>` 提取
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// 优先取请求头，空值或非 ASCII 时重新生成
    pub fn from_request(req: &Request) -> Self {
        req.headers()
            .get(TRACE_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self(s.to_string()))
            .unwrap_or_else(Self::generate)
    }
}

pub async fn trace_id_middleware(mut req: Request, next: Next) -> Response {
    let trace_id = TraceId::from_request(&req);
    req.extensions_mut().insert(trace_id.clone());

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id.0) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn test_keeps_incoming_header() {
        let req = Request::builder()
            .header("X-Trace-Id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(TraceId::from_request(&req), TraceId("abc-123".into()));
    }

    #[test]
    fn test_generates_when_missing() {
        let req = Request::builder().body(Body::empty()).unwrap();
        let id = TraceId::from_request(&req);
        assert!(Uuid::parse_str(&id.0).is_ok());
    }
}
