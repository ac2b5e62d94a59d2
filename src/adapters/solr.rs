//! Solr adapter.
//!
//! Talks to a single Solr core over its HTTP+JSON API using a blocking
//! client. Every round clears the core and re-adds the cumulative
//! document set, so the reported indexing time always covers a full
//! rebuild. Indexing time is the server-side `QTime`; query latency is
//! measured client-side.

use std::time::{Duration, Instant};

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::adapters::{timings_from_samples, Indexer};
use crate::error::{BenchError, Result};
use crate::models::{DocumentRef, QueryTimings, SolrConfig};

/// Metric reported by the Solr adapter.
pub const TIMES_QUERY_METRIC: &str = "times_query";

#[derive(Debug, Deserialize)]
struct ResponseHeader {
    #[serde(rename = "QTime")]
    qtime: u64,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    #[serde(rename = "responseHeader")]
    response_header: ResponseHeader,
}

#[derive(Debug, Deserialize)]
struct PingResponse {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    response: SelectBody,
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    #[serde(rename = "numFound")]
    num_found: u64,
}

#[derive(Debug, Serialize)]
struct DeleteCommand<'a> {
    delete: DeleteQuery<'a>,
}

#[derive(Debug, Serialize)]
struct DeleteQuery<'a> {
    query: &'a str,
}

/// Blocking HTTP adapter for one Solr core.
pub struct SolrIndexer {
    client: Client,
    core_url: String,
    field: String,
    max_chars: usize,
    documents: Vec<Value>,
    n_rows: u64,
}

impl SolrIndexer {
    /// Build the client without contacting the server.
    pub fn new(config: &SolrConfig) -> Result<Self> {
        let core_url = config.url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;

        Ok(Self {
            client,
            core_url,
            field: config.field.clone(),
            max_chars: config.max_chars,
            documents: Vec::new(),
            n_rows: 0,
        })
    }

    /// Build the client, check that the core answers its ping, and clear
    /// any documents left over from a previous run.
    pub fn connect(config: &SolrConfig) -> Result<Self> {
        let indexer = Self::new(config)?;
        indexer.ping()?;
        indexer.reset()?;
        info!(core = %indexer.core_url, "connected to solr core");
        Ok(indexer)
    }

    /// Require `GET /admin/ping` to report `status: OK`.
    pub fn ping(&self) -> Result<()> {
        let url = self.url_for("admin/ping");
        let response = self
            .client
            .get(&url)
            .query(&[("wt", "json")])
            .send()
            .map_err(|e| BenchError::EngineUnavailable(format!("{url}: {e}")))?;
        let response = ensure_success(response, &url)?;
        let ping: PingResponse = response.json()?;

        match ping.status.as_deref() {
            Some("OK") => Ok(()),
            other => Err(BenchError::EngineUnavailable(format!(
                "{url} reported status {}",
                other.unwrap_or("<missing>")
            ))),
        }
    }

    /// Delete every document in the core and commit.
    pub fn reset(&self) -> Result<()> {
        let command = DeleteCommand {
            delete: DeleteQuery { query: "*:*" },
        };
        self.post_update(&command)?;
        debug!(core = %self.core_url, "cleared solr core");
        Ok(())
    }

    fn document_json(&self, doc: &DocumentRef, text: String) -> Value {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(doc.id));
        fields.insert(self.field.clone(), Value::String(text));
        Value::Object(fields)
    }

    fn post_update<T>(&self, body: &T) -> Result<UpdateResponse>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url_for("update");
        let response = self
            .client
            .post(&url)
            .query(&[("commit", "true"), ("wt", "json")])
            .json(body)
            .send()?;
        let response = ensure_success(response, &url)?;
        Ok(response.json::<UpdateResponse>()?)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.core_url, path.trim_start_matches('/'))
    }
}

impl Indexer for SolrIndexer {
    fn engine(&self) -> &str {
        "solr"
    }

    fn index(&mut self, batch: &[DocumentRef]) -> Result<f64> {
        self.reset()?;

        for doc in batch {
            let text = doc.read_text(self.max_chars)?;
            let value = self.document_json(doc, text);
            self.documents.push(value);
        }

        let response = self.post_update(&self.documents)?;
        self.n_rows = self.documents.len() as u64;

        Ok(qtime_seconds(response.response_header.qtime))
    }

    fn query(&self, queries: &[String]) -> Result<QueryTimings> {
        let url = self.url_for("select");
        let rows = self.n_rows.to_string();
        let mut samples = Vec::with_capacity(queries.len());

        for term in queries {
            let q = format!("{}:{}", self.field, term);

            let start = Instant::now();
            let response = self
                .client
                .get(&url)
                .query(&[("q", q.as_str()), ("rows", rows.as_str()), ("wt", "json")])
                .send()?;
            let response = ensure_success(response, &url)?;
            let body: SelectResponse = response.json()?;
            samples.push(start.elapsed().as_secs_f64());

            debug!(query = %q, hits = body.response.num_found, "solr query");
        }

        Ok(timings_from_samples([(TIMES_QUERY_METRIC, samples)]))
    }

    fn n_rows(&self) -> u64 {
        self.n_rows
    }
}

fn qtime_seconds(qtime_ms: u64) -> f64 {
    qtime_ms as f64 / 1000.0
}

fn ensure_success(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(BenchError::Engine(format!(
        "{url} returned {status}: {}",
        body.trim()
    )))
}
