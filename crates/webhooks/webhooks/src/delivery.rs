//! Webhook request building and delivery.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

use relay_events::Event;

use crate::config::WebhookConfig;
use crate::error::{WebhookError, WebhookResult};
use crate::hook::WebHook;
use crate::metrics::WebhookMetrics;

/// A fully resolved webhook call.
#[derive(Debug, Clone)]
pub struct HookRequest {
    /// HTTP method.
    pub method: Method,
    /// Target URL.
    pub url: Url,
    /// Request headers, including injected ones.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<Vec<u8>>,
}

impl HookRequest {
    /// Builds the call `hook` makes for `event`.
    ///
    /// - The method is uppercased and defaults to POST.
    /// - A literal body is sent verbatim whatever the method.
    /// - Otherwise POST, PUT and PATCH send the event as JSON and other
    ///   methods send no body.
    /// - `user_agent` is injected when the hook sets no `User-Agent` or an
    ///   empty one.
    pub fn build(hook: &WebHook, event: &Event, user_agent: &str) -> WebhookResult<Self> {
        let method = normalize_method(&hook.method)?;
        let url = Url::parse(&hook.url)?;
        let mut headers = hook_headers(hook)?;

        let body = if let Some(literal) = hook.literal_body() {
            Some(literal.as_bytes().to_vec())
        } else if method == Method::POST || method == Method::PUT || method == Method::PATCH {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Some(serde_json::to_vec(event)?)
        } else {
            None
        };

        let has_agent = headers.get(USER_AGENT).is_some_and(|v| !v.is_empty());
        if !has_agent {
            let value = HeaderValue::from_str(user_agent)
                .map_err(|e| WebhookError::InvalidHeader(format!("User-Agent: {e}")))?;
            headers.insert(USER_AGENT, value);
        }

        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }
}

fn normalize_method(method: &str) -> WebhookResult<Method> {
    if method.is_empty() {
        return Ok(Method::POST);
    }
    let upper = method.to_ascii_uppercase();
    Method::from_bytes(upper.as_bytes()).map_err(|_| WebhookError::InvalidMethod(upper))
}

fn hook_headers(hook: &WebHook) -> WebhookResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, values) in &hook.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| WebhookError::InvalidHeader(format!("{name}: {e}")))?;
        for value in values {
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| WebhookError::InvalidHeader(format!("{name}: {e}")))?;
            headers.append(header_name.clone(), header_value);
        }
    }
    Ok(headers)
}

/// Checks whether a response status counts as a successful delivery.
pub fn is_success_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// Webhook delivery engine.
///
/// Holds one client that verifies certificates and one that does not. Both
/// disable connection reuse and share the configured timeouts.
pub struct DeliveryEngine {
    config: WebhookConfig,
    client: Client,
    insecure_client: Client,
    metrics: Arc<WebhookMetrics>,
}

impl DeliveryEngine {
    /// Creates a new delivery engine.
    pub fn new(config: WebhookConfig, metrics: Arc<WebhookMetrics>) -> WebhookResult<Self> {
        let client = build_client(&config, false, None)?;
        let insecure_client = build_client(&config, true, None)?;

        Ok(Self {
            config,
            client,
            insecure_client,
            metrics,
        })
    }

    /// Calls `hook` for `event` once, recording the outcome in the metrics.
    ///
    /// Any transport error or a status outside [200, 400) is a failure.
    pub async fn deliver(&self, hook: &WebHook, event: &Event) -> WebhookResult<()> {
        let result = self.try_deliver(hook, event).await;
        self.metrics.record_call(result.is_ok());
        result
    }

    async fn try_deliver(&self, hook: &WebHook, event: &Event) -> WebhookResult<()> {
        let request = HookRequest::build(hook, event, &self.config.user_agent)?;

        let client = self.client_for(hook)?;

        let mut builder = client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let start = Instant::now();
        let response = builder.send().await;
        self.metrics.observe_latency(start.elapsed());

        let response = response?;
        let status = response.status().as_u16();
        if is_success_status(status) {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(WebhookError::InvalidStatus { status, body })
    }

    /// Picks the client for `hook`: a per-call one when it routes through a
    /// proxy, otherwise the shared client matching its `insecure` flag.
    fn client_for(&self, hook: &WebHook) -> WebhookResult<HookClient<'_>> {
        match hook.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            Some(proxy) => Ok(HookClient::Proxied(build_client(
                &self.config,
                hook.insecure,
                Some(proxy),
            )?)),
            None if hook.insecure => Ok(HookClient::Shared(&self.insecure_client)),
            None => Ok(HookClient::Shared(&self.client)),
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }
}

enum HookClient<'a> {
    Shared(&'a Client),
    Proxied(Client),
}

impl Deref for HookClient<'_> {
    type Target = Client;

    fn deref(&self) -> &Client {
        match self {
            HookClient::Shared(client) => client,
            HookClient::Proxied(client) => client,
        }
    }
}

fn build_client(config: &WebhookConfig, insecure: bool, proxy: Option<&str>) -> WebhookResult<Client> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout())
        .pool_max_idle_per_host(0)
        .danger_accept_invalid_certs(insecure);

    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| WebhookError::ConfigError(format!("invalid proxy url {proxy}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| WebhookError::ConfigError(format!("failed to build HTTP client: {e}")))
}
