use crate::errors::UpstreamError;
use crate::upstream::{Upstream, UpstreamResponse};
use async_trait::async_trait;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use serde_json::Value;
use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

type Responder = dyn Fn(&Url, usize) -> Result<UpstreamResponse, UpstreamError> + Send + Sync;

/// In-memory upstream. The responder receives the requested URL and the
/// zero-based index of the call. Every call is recorded.
pub struct ScriptedUpstream {
    responder: Box<Responder>,
    calls: Mutex<Vec<(Url, Option<String>)>>,
}

impl ScriptedUpstream {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&Url, usize) -> Result<UpstreamResponse, UpstreamError> + Send + Sync + 'static,
    {
        Arc::new(ScriptedUpstream {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn api_keys(&self) -> Vec<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, key)| key.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn get(
        &self,
        url: &Url,
        api_key: Option<&str>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((url.clone(), api_key.map(String::from)));
            calls.len() - 1
        };
        (self.responder)(url, index)
    }
}

pub fn json_response(status: u16, body: Value) -> Result<UpstreamResponse, UpstreamError> {
    text_response(status, &body.to_string())
}

pub fn text_response(status: u16, body: &str) -> Result<UpstreamResponse, UpstreamError> {
    let status = StatusCode::from_u16(status).unwrap();
    Ok(UpstreamResponse::new(status, body))
}

/// Serves `handler` on an ephemeral local port and returns the base URL.
pub async fn spawn_test_upstream<F, Fut>(handler: F) -> Url
where
    F: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Full<Bytes>>, Infallible>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to address");

    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);
            let handler = handler.clone();

            tokio::spawn(async move {
                if let Err(err) =
                    hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service_fn(handler))
                        .await
                {
                    eprintln!("Error serving connection: {:?}", err);
                }
            });
        }
    });

    Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap()
}
