use super::classify::{self, read_response};
use super::{Route, SendContext, Transport, TransportKind, TransportResponse};
use crate::client::policy::Decision;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Proxy;
use std::env;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Network transport: `POST {base_url}/{route}` with per-attempt timeout and retry.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        // Minimal production-friendly defaults (env-overridable).
        // Per-attempt deadlines come from the call, not the client.
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(
                env::var("AUDITOR_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("AUDITOR_HTTP_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )));

        if let Ok(proxy_url) = env::var("AUDITOR_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder.build().map_err(|e| {
            Error::validation(format!("failed to build HTTP client: {}", e))
                .with_source("http_transport")
        })?;

        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured reqwest client (shared pools, custom TLS).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, route: Route) -> String {
        format!("{}/{}", self.base_url, route.as_str())
    }

    /// Compile the headers for every attempt of this call.
    ///
    /// Order: merged static/per-call headers, auth, content negotiation,
    /// idempotency. Later entries replace earlier ones.
    fn compile_headers(ctx: &SendContext) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in ctx.headers.iter() {
            map.insert(header_name(name)?, header_value(name, value)?);
        }
        if let Some(key) = ctx.api_key.as_deref() {
            let token: String = key.chars().filter(|c| !c.is_whitespace()).collect();
            if !token.is_empty() {
                let mut v = header_value("authorization", &format!("Bearer {}", token))?;
                v.set_sensitive(true);
                map.insert(AUTHORIZATION, v);
            }
        }
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        map.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(idem) = &ctx.idempotency {
            map.insert(header_name(&idem.name)?, header_value(&idem.name, &idem.value)?);
        }
        Ok(map)
    }

    async fn attempt_once(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &HeaderMap,
    ) -> Result<TransportResponse> {
        let resp = self
            .client
            .post(url)
            .headers(headers.clone())
            .json(body)
            .send()
            .await
            .map_err(classify::from_reqwest)?;
        read_response(resp).await
    }

    /// One attempt bounded by the per-attempt deadline and the call controller.
    async fn guarded_attempt(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &HeaderMap,
        timeout: Duration,
        controller: &CancellationToken,
    ) -> Result<TransportResponse> {
        tokio::select! {
            biased;
            _ = controller.cancelled() => Err(Error::cancelled().with_source("http_transport")),
            r = tokio::time::timeout(timeout, self.attempt_once(url, body, headers)) => match r {
                Ok(inner) => inner,
                Err(_) => Err(Error::timeout()
                    .with_details(format!("attempt exceeded {}ms", timeout.as_millis()))
                    .with_source("http_transport")),
            },
        }
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
        Error::validation(format!("invalid header name: {}", name)).with_source("http_transport")
    })
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        Error::validation(format!("invalid value for header {}", name))
            .with_source("http_transport")
    })
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Network
    }

    async fn send(
        &self,
        route: Route,
        body: &serde_json::Value,
        ctx: &SendContext,
    ) -> Result<TransportResponse> {
        let finish = |e: Error, attempts: u32| {
            e.with_attempts(attempts)
                .with_correlation_id(ctx.correlation_id.clone())
        };

        let headers = Self::compile_headers(ctx).map_err(|e| finish(e, 0))?;
        let url = self.endpoint(route);

        // Per-call controller, released on every exit path.
        let controller = match &ctx.cancel {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let _guard = controller.clone().drop_guard();

        let started = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            if controller.is_cancelled() {
                return Err(finish(
                    Error::cancelled().with_source("http_transport"),
                    attempt,
                ));
            }
            attempt += 1;
            debug!(
                route = route.as_str(),
                attempt,
                correlation_id = ctx.correlation_id.as_str(),
                "sending request"
            );

            let err = match self
                .guarded_attempt(&url, body, &headers, ctx.timeout, &controller)
                .await
            {
                Ok(mut resp) => {
                    debug!(
                        route = route.as_str(),
                        attempt,
                        status = resp.http_status.unwrap_or_default(),
                        "request succeeded"
                    );
                    resp.attempts = attempt;
                    return Ok(resp);
                }
                Err(e) => e,
            };

            match ctx
                .retry
                .decide(&err, attempt, started.elapsed(), rand::random::<f64>())
            {
                Decision::Fail => return Err(finish(err, attempt)),
                Decision::Retry { delay } => {
                    warn!(
                        route = route.as_str(),
                        attempt,
                        kind = err.kind().name(),
                        delay_ms = delay.as_millis() as u64,
                        correlation_id = ctx.correlation_id.as_str(),
                        "retrying after transient failure"
                    );
                    tokio::select! {
                        biased;
                        _ = controller.cancelled() => {
                            return Err(finish(
                                Error::cancelled().with_source("http_transport"),
                                attempt,
                            ));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}
