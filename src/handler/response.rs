use crate::intercept::WrapMarker;
use bytes::BytesMut;
use http_body_util::Full;
use hyper::{
    HeaderMap, Response as HyperResponse, StatusCode,
    body::Bytes,
    header::{self, HeaderName, HeaderValue, IntoHeaderName},
};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod error;

use error::ResponseError;

/// Callback run at the start of every [`Response::send`].
#[derive(Clone)]
struct SendHook {
    marker: WrapMarker,
    hook: Arc<dyn Fn() + Send + Sync>,
}

#[derive(Clone, Default)]
pub struct Response {
    status: StatusCode,
    body: BytesMut,
    headers: HeaderMap,
    ended: bool,
    send_hooks: SmallVec<[SendHook; 2]>,
}

impl Response {
    pub fn new() -> Self {
        Response {
            status: StatusCode::OK,
            body: BytesMut::with_capacity(512),
            headers: HeaderMap::with_capacity(8),
            ended: false,
            send_hooks: SmallVec::new(),
        }
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn status_code(&mut self, status: u16) -> Result<&mut Self, ResponseError> {
        self.status =
            StatusCode::from_u16(status).map_err(|_| ResponseError::InvalidStatusCode(status))?;
        Ok(self)
    }

    pub fn current_status(&self) -> StatusCode {
        self.status
    }

    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown")
    }

    pub fn set<K: IntoHeaderName, V: Into<HeaderValue>>(&mut self, key: K, val: V) -> &mut Self {
        self.headers.insert(key, val.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        HeaderName::from_str(key)
            .ok()
            .and_then(|k| self.headers.get(&k))
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Runs `hook` at the start of every later `send`, `json` or `send_status`.
    ///
    /// Returns `false` without installing anything when a hook with the same
    /// marker is already present.
    pub fn wrap_send<F>(&mut self, marker: WrapMarker, hook: F) -> bool
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.send_hooks.iter().any(|h| h.marker == marker) {
            return false;
        }

        self.send_hooks.push(SendHook {
            marker,
            hook: Arc::new(hook),
        });
        true
    }

    pub fn is_send_wrapped(&self, marker: WrapMarker) -> bool {
        self.send_hooks.iter().any(|h| h.marker == marker)
    }

    pub fn write(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        self.body.extend_from_slice(data.as_ref());
        self
    }

    pub fn send(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        for send_hook in &self.send_hooks {
            (send_hook.hook)();
        }

        let data = data.as_ref();

        self.body.clear();
        self.body.reserve(data.len());
        self.body.extend_from_slice(data);

        self.set(header::CONTENT_LENGTH, HeaderValue::from(data.len()));

        if self.headers.get(header::CONTENT_TYPE).is_none() {
            // Best guess: plain text if it's utf8
            if std::str::from_utf8(data).is_ok() {
                self.set(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("text/plain; charset=utf-8"),
                );
            } else {
                self.set(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/octet-stream"),
                );
            }
        }

        self.end()
    }

    pub fn json<T: serde::Serialize>(&mut self, value: &T) -> Result<&mut Self, ResponseError> {
        let json = serde_json::to_vec(value)?;
        self.set(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(self.send(json))
    }

    /// Sets the status and sends its canonical reason as the body.
    pub fn send_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        let reason = self.status_text();
        self.send(reason)
    }

    #[inline]
    pub fn end(&mut self) -> &mut Self {
        self.ended = true;
        self
    }

    pub fn redirect(&mut self, location: impl Into<HeaderValue>) -> &mut Self {
        self.status = StatusCode::FOUND;
        self.set(header::LOCATION, location);
        self.set(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
        self.end()
    }

    pub fn r#type(&mut self, mime: impl Into<HeaderValue>) -> &mut Self {
        self.set(header::CONTENT_TYPE, mime);
        self
    }

    pub fn into_hyper(mut self) -> HyperResponse<Full<Bytes>> {
        #[inline(always)]
        fn build_error_response() -> HyperResponse<Full<Bytes>> {
            let mut response = HyperResponse::new(Full::new(Bytes::from_static(
                b"Internal Server Error",
            )));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }

        if !self.ended {
            self.end();
        }

        let mut builder = HyperResponse::builder();

        {
            let headers = std::mem::take(&mut self.headers);
            if let Some(map) = builder.headers_mut() {
                *map = headers;
            }
        }

        let body = self.body.freeze();

        let status = if body.is_empty() && self.status == StatusCode::OK {
            StatusCode::NO_CONTENT
        } else {
            self.status
        };

        builder
            .status(status)
            .body(Full::new(body))
            .unwrap_or_else(|e| {
                log::error!("failed to build response: {}", e);
                build_error_response()
            })
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("ended", &self.ended)
            .field(
                "send_hooks",
                &self.send_hooks.iter().map(|h| h.marker).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl From<Response> for HyperResponse<Full<Bytes>> {
    fn from(resp: Response) -> Self {
        resp.into_hyper()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn send_sets_body_and_headers() {
        let mut res = Response::new();
        res.send("hello");

        assert!(res.is_ended());
        assert_eq!(res.body(), b"hello");
        assert_eq!(res.get("content-length").unwrap(), "5");
        assert_eq!(
            res.get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn send_hooks_run_once_per_send_and_are_deduplicated() {
        let marker = WrapMarker::new("hook");
        let hits = Arc::new(AtomicUsize::new(0));
        let mut res = Response::new();

        let counter = Arc::clone(&hits);
        assert!(res.wrap_send(marker, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!res.wrap_send(marker, || {}));
        assert!(res.is_send_wrapped(marker));

        res.send("a");
        res.json(&serde_json::json!({ "ok": true })).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn status_code_rejects_invalid_values() {
        let mut res = Response::new();
        assert!(matches!(
            res.status_code(1000),
            Err(ResponseError::InvalidStatusCode(1000))
        ));
        assert_eq!(res.status_code(201).unwrap().current_status(), StatusCode::CREATED);
    }

    #[test]
    fn write_appends_without_running_send_hooks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut res = Response::new();

        let counter = Arc::clone(&hits);
        res.wrap_send(WrapMarker::new("hook"), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        res.write("Hello, ").write("world").end();

        assert_eq!(res.body(), b"Hello, world");
        assert!(res.is_ended());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_ok_response_becomes_no_content() {
        let res = Response::new();
        assert_eq!(res.into_hyper().status(), StatusCode::NO_CONTENT);
    }
}
