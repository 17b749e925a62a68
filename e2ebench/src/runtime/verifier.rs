//! Interactive Verifier
//!
//! The last step of a demo run: hand a human a deep link into the query UI and
//! block until they say they are done.

use axum::{Router, extract::State};
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use url::Url;

use shared::{logging, service_info, service_warn};

use crate::error::{BenchError, BenchResult};

const VERIFIER: &str = "verifier";

/// Query UI graph panel state, encoded as `g0.*` parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    pub expr: String,
    pub range_input: String,
    pub max_source_resolution: String,
    pub deduplicate: bool,
    pub partial_response: bool,
    pub end: DateTime<Utc>,
}

impl GraphQuery {
    /// Series count per replica label, with deduplication off so both HA
    /// replicas show up
    pub fn replica_count(end: DateTime<Utc>) -> Self {
        Self {
            expr: r#"count({__name__=~"continuous_app_metric99"}) by (replica)"#.to_string(),
            range_input: "2w".to_string(),
            max_source_resolution: "0s".to_string(),
            deduplicate: false,
            partial_response: false,
            end,
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let flag = |on: bool| (if on { "1" } else { "0" }).to_string();
        vec![
            ("g0.expr", self.expr.clone()),
            ("g0.tab", "0".to_string()),
            ("g0.stacked", "0".to_string()),
            ("g0.range_input", self.range_input.clone()),
            ("g0.max_source_resolution", self.max_source_resolution.clone()),
            ("g0.deduplicate", flag(self.deduplicate)),
            ("g0.partial_response", flag(self.partial_response)),
            ("g0.store_matches", "[]".to_string()),
            ("g0.end_input", self.end.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]
    }
}

/// Absolute URL into the querier's graph page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink(Url);

impl DeepLink {
    /// Link to `/graph` on `endpoint` (`host:port`)
    pub fn graph(endpoint: &str, query: &GraphQuery) -> BenchResult<Self> {
        let mut url = Url::parse(&format!("http://{endpoint}/graph"))
            .map_err(|e| BenchError::verifier(format!("bad endpoint '{endpoint}': {e}")))?;
        url.query_pairs_mut().extend_pairs(query.params());
        Ok(Self(url))
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeepLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Somewhere to show a link to a human
#[mockall::automock]
#[async_trait::async_trait]
pub trait LinkOpener: Send + Sync {
    async fn open(&self, link: &DeepLink) -> BenchResult<()>;
}

/// Opens links with the desktop's default browser
pub struct BrowserOpener;

#[async_trait::async_trait]
impl LinkOpener for BrowserOpener {
    async fn open(&self, link: &DeepLink) -> BenchResult<()> {
        let opener = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
        let status = tokio::process::Command::new(opener)
            .arg(link.as_str())
            .status()
            .await
            .map_err(|e| BenchError::verifier(format!("{opener}: {e}")))?;
        if !status.success() {
            return Err(BenchError::verifier(format!("{opener} exited with {status}")));
        }
        Ok(())
    }
}

/// Prints links for headless runs
pub struct StdoutOpener;

#[async_trait::async_trait]
impl LinkOpener for StdoutOpener {
    async fn open(&self, link: &DeepLink) -> BenchResult<()> {
        println!("{link}");
        Ok(())
    }
}

pub struct InteractiveVerifier {
    opener: Box<dyn LinkOpener>,
}

impl InteractiveVerifier {
    pub fn new(opener: impl LinkOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
        }
    }

    /// Show `link`, then wait for `completion` with no timeout.
    ///
    /// Failing to open the link is not fatal; it is always logged as well.
    pub async fn present_and_wait<F>(&self, link: &DeepLink, completion: F) -> BenchResult<()>
    where
        F: Future<Output = BenchResult<()>>,
    {
        service_info!(VERIFIER, "🔗 {}", link);
        if let Err(e) = self.opener.open(link).await {
            service_warn!(VERIFIER, "⚠️ Could not open link, use the one above: {}", e);
        }

        completion.await?;
        logging::log_success(VERIFIER, "Verification finished");
        Ok(())
    }
}

type Completion = Arc<Mutex<Option<oneshot::Sender<()>>>>;

/// Local HTTP endpoint whose first request completes the interactive wait
pub struct EndpointHit {
    addr: SocketAddr,
    hit: oneshot::Receiver<()>,
    server: JoinHandle<()>,
}

impl EndpointHit {
    pub async fn bind(port: u16) -> BenchResult<Self> {
        let (tx, hit) = oneshot::channel();
        let completion: Completion = Arc::new(Mutex::new(Some(tx)));

        let app = Router::new().fallback(complete).with_state(completion);
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let addr = listener.local_addr()?;

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                service_warn!(VERIFIER, "Completion endpoint error: {}", e);
            }
        });

        Ok(Self { addr, hit, server })
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Resolve on the first request to the endpoint, or on Ctrl+C
    pub async fn wait(&mut self) -> BenchResult<()> {
        service_info!(VERIFIER, "⏸️ Waiting, visit {} (or press Ctrl+C) to finish", self.url());
        tokio::select! {
            hit = &mut self.hit => {
                hit.map_err(|_| BenchError::verifier("completion endpoint stopped before it was hit"))
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                service_info!(VERIFIER, "Interrupted");
                Ok(())
            }
        }
    }
}

impl Drop for EndpointHit {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn complete(State(completion): State<Completion>) -> &'static str {
    let sender = completion.lock().ok().and_then(|mut slot| slot.take());
    if let Some(sender) = sender {
        let _ = sender.send(());
    }
    "Done, the harness is tearing down.\n"
}
