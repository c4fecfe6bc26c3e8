//! HTTP trigger handler.
//!
//! `HttpTrigger` manages a hyper HTTP server that runs a page handler for
//! every request against a fresh, request-scoped response buffer.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use quill_core::QuillConfig;
use quill_response::{run_page, MemoryTransport, PageResult, ResponseBuffer};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::convert::{internal_error, into_http_response, uri_path_and_query};

/// Request metadata visible to page code.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl PageRequest {
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }
}

/// Page code run once per request.
///
/// Runs on the blocking pool, so it may do synchronous work freely.
pub type PageHandler =
    Arc<dyn Fn(&PageRequest, &ResponseBuffer<MemoryTransport>) -> PageResult + Send + Sync>;

/// Per-response defaults taken from `quill.toml`.
#[derive(Debug, Clone)]
pub struct TriggerOptions {
    pub default_content_type: String,
    pub redirect_status: u16,
}

impl TriggerOptions {
    pub fn from_config(config: &QuillConfig) -> Self {
        Self {
            default_content_type: config.default_content_type().to_string(),
            redirect_status: config.redirect_status(),
        }
    }
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self::from_config(&QuillConfig::default())
    }
}

/// Run `handler` for one request and build the HTTP response.
///
/// Page failures are logged and answered with a 500.
pub fn render(
    handler: &PageHandler,
    request: &PageRequest,
    options: &TriggerOptions,
) -> Response<Full<Bytes>> {
    let response = ResponseBuffer::new(MemoryTransport::new());
    response.set_content_type(&options.default_content_type);

    let path = uri_path_and_query(&request.uri);
    let completion = match run_page(&response, |res| handler(request, res)) {
        Ok(completion) => completion,
        Err(e) => {
            error!(method = %request.method, %path, error = %e, "page failed");
            return internal_error();
        }
    };
    debug!(method = %request.method, %path, ?completion, "page settled");

    let mut transport = response.into_transport();
    transport.finalize();

    match into_http_response(transport, completion, options.redirect_status) {
        Ok(resp) => resp,
        Err(e) => {
            error!(method = %request.method, %path, error = %e, "response conversion failed");
            internal_error()
        }
    }
}

/// HTTP trigger server.
///
/// Binds to a TCP port and answers each request by running the page
/// handler against a fresh `ResponseBuffer`.
pub struct HttpTrigger {
    bind_addr: SocketAddr,
    handler: PageHandler,
    options: TriggerOptions,
}

impl HttpTrigger {
    /// Create a new HTTP trigger bound to the given address.
    pub fn new(bind_addr: SocketAddr, handler: PageHandler, options: TriggerOptions) -> Self {
        Self {
            bind_addr,
            handler,
            options,
        }
    }

    /// Bind and serve until the shutdown signal is received.
    pub async fn serve(self, shutdown: tokio::sync::watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .context("failed to bind HTTP trigger")?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already-bound listener.
    ///
    /// Spawns a tokio task per connection using HTTP/1.1.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let local_addr = listener.local_addr().context("listener has no local address")?;
        info!(addr = %local_addr, "HTTP trigger listening");

        let handler = self.handler;
        let options = Arc::new(self.options);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, peer_addr) = accept_result.context("accept failed")?;
                    let handler = handler.clone();
                    let options = options.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let svc = service_fn(move |req: Request<Incoming>| {
                            let handler = handler.clone();
                            let options = options.clone();
                            async move {
                                let request = PageRequest {
                                    method: req.method().clone(),
                                    uri: req.uri().clone(),
                                    headers: req.headers().clone(),
                                };
                                let resp = tokio::task::spawn_blocking(move || {
                                    render(&handler, &request, &options)
                                })
                                .await
                                .unwrap_or_else(|e| {
                                    error!(%peer_addr, error = %e, "page task panicked");
                                    internal_error()
                                });
                                Ok::<_, hyper::Error>(resp)
                            }
                        });

                        if let Err(e) = http1::Builder::new()
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(%peer_addr, error = %e, "connection error");
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("HTTP trigger shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use quill_response::ResponseError;

    fn request(path: &str) -> PageRequest {
        PageRequest {
            method: Method::GET,
            uri: path.parse().unwrap(),
            headers: HeaderMap::new(),
        }
    }

    fn echo_handler() -> PageHandler {
        Arc::new(|req: &PageRequest, res: &ResponseBuffer<MemoryTransport>| -> PageResult {
            res.write(&[req.method.as_str(), req.path()])?;
            Ok(())
        })
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn render_applies_default_content_type() {
        let resp = render(&echo_handler(), &request("/hello?x=1"), &TriggerOptions::default());
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
        assert_eq!(body_string(resp).await, "GET /hello");
    }

    #[test]
    fn render_redirect_uses_configured_status() {
        let handler: PageHandler = Arc::new(|_req: &PageRequest, res: &ResponseBuffer<MemoryTransport>| -> PageResult {
            res.write(&["discarded"])?;
            res.redirect("/elsewhere")
        });
        let options = TriggerOptions {
            default_content_type: "text/plain".to_string(),
            redirect_status: 307,
        };
        let resp = render(&handler, &request("/"), &options);
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers()["location"], "/elsewhere");
    }

    #[test]
    fn render_failure_is_500() {
        let handler: PageHandler = Arc::new(|_req: &PageRequest, res: &ResponseBuffer<MemoryTransport>| -> PageResult {
            res.pop()?;
            Err(ResponseError::EmptyStack.into())
        });
        let resp = render(&handler, &request("/"), &TriggerOptions::default());
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn http_trigger_creation() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let trigger = HttpTrigger::new(addr, echo_handler(), TriggerOptions::default());
        assert_eq!(trigger.bind_addr, addr);
        assert_eq!(trigger.options.redirect_status, 302);
    }

    #[tokio::test]
    async fn http_trigger_serves_and_shuts_down() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let trigger = HttpTrigger::new(addr, echo_handler(), TriggerOptions::default());

        let (tx, rx) = tokio::sync::watch::channel(false);

        let server = tokio::spawn(async move { trigger.serve(rx).await });

        // Give it a moment to bind.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        // Signal shutdown.
        tx.send(true).unwrap();

        let result = server.await.unwrap();
        assert!(result.is_ok());
    }
}
