//! Fetch collaborator: typed HTTP retrieval of node, workload, and
//! price data from the fleet registry and the node agents.
//!
//! All transport concerns live here; the engine consumes
//! already-resolved data and stays pure. Each fetch is independent —
//! a failed or slow node never affects another node's view.
//!
//! Node agents historically reported their own identity two ways: in
//! the `/container/` response headers (`node-name`, `node-addr`,
//! `node-cpu`, `node-memory`) or as a body object from the registry's
//! `/node/` listing. Both shapes resolve through one
//! [`NodeIdentity::parse`] function with two input adapters.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::model::{Node, PriceWindow, Workload};
use crate::price::PriceSeries;

const NODE_NAME_HEADER: &str = "node-name";
const NODE_ADDR_HEADER: &str = "node-addr";
const NODE_CPU_HEADER: &str = "node-cpu";
const NODE_MEMORY_HEADER: &str = "node-memory";

/// Errors from the fetch collaborator. Transport failures are
/// reported upward; the engine still renders from empty data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("missing node identity header: {0}")]
    MissingHeader(&'static str),

    #[error("malformed node identity header: {0}")]
    MalformedHeader(&'static str),
}

/// A node's identity and capacity, however it was reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub name: String,
    pub address: String,
    pub cpu_shares: u64,
    pub memory: u64,
}

/// The two historical input shapes for node identity.
pub enum NodeIdentitySource<'a> {
    /// `/container/` response headers.
    Headers(&'a HeaderMap),
    /// A node object from the registry body.
    Body(&'a Node),
}

impl NodeIdentity {
    /// Resolve an identity from either input shape.
    ///
    /// Returns `Ok(None)` when headers carry no identity at all (the
    /// modern body-sourced flow); errors only on a partially present
    /// or malformed header set.
    pub fn parse(source: NodeIdentitySource<'_>) -> Result<Option<Self>, FetchError> {
        match source {
            NodeIdentitySource::Body(node) => Ok(Some(Self {
                name: node.name.clone(),
                address: node.address.clone(),
                cpu_shares: node.cpu_shares,
                memory: node.memory,
            })),
            NodeIdentitySource::Headers(headers) => {
                if !headers.contains_key(NODE_NAME_HEADER) {
                    return Ok(None);
                }
                Ok(Some(Self {
                    name: header_str(headers, NODE_NAME_HEADER)?.to_string(),
                    address: header_str(headers, NODE_ADDR_HEADER)?.to_string(),
                    cpu_shares: header_u64(headers, NODE_CPU_HEADER)?,
                    memory: header_u64(headers, NODE_MEMORY_HEADER)?,
                }))
            }
        }
    }

    /// Overlay this identity onto a node record.
    pub fn apply(&self, node: &mut Node) {
        node.name = self.name.clone();
        node.address = self.address.clone();
        node.cpu_shares = self.cpu_shares;
        node.memory = self.memory;
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, FetchError> {
    headers
        .get(name)
        .ok_or(FetchError::MissingHeader(name))?
        .to_str()
        .map_err(|_| FetchError::MalformedHeader(name))
}

fn header_u64(headers: &HeaderMap, name: &'static str) -> Result<u64, FetchError> {
    header_str(headers, name)?
        .parse()
        .map_err(|_| FetchError::MalformedHeader(name))
}

/// Workload listing for one node, with any header-sourced identity.
#[derive(Debug)]
pub struct WorkloadFetch {
    pub workloads: Vec<Workload>,
    pub identity: Option<NodeIdentity>,
}

/// Price window for one node, statistics recomputed locally.
#[derive(Debug)]
pub struct PriceFetch {
    pub window: PriceWindow,
    /// Effective window start, recorded from the first returned
    /// bucket when the request omitted an explicit start.
    pub effective_start_nanos: Option<i64>,
}

/// HTTP client for the fleet registry and node agents.
#[derive(Clone)]
pub struct FleetClient {
    registry_url: String,
    client: reqwest::Client,
}

impl FleetClient {
    /// Create a client against the given registry base URL.
    pub fn new(registry_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            registry_url: registry_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// List the fleet's nodes from the registry.
    pub async fn list_nodes(&self) -> Result<Vec<Node>, FetchError> {
        let url = format!("{}/node/", self.registry_url);
        let nodes = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(nodes)
    }

    /// Fetch the workloads running on one node, capturing the node's
    /// header-sourced identity when the agent reports one.
    pub async fn fetch_workloads(&self, node_address: &str) -> Result<WorkloadFetch, FetchError> {
        let url = format!("{}/container/", node_base_url(node_address));
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let identity = NodeIdentity::parse(NodeIdentitySource::Headers(resp.headers()))?;
        let workloads = resp.json().await?;
        Ok(WorkloadFetch {
            workloads,
            identity,
        })
    }

    /// Fetch a node's price window for the requested time range.
    ///
    /// `start` is optional: when omitted the agent determines the
    /// window start and we record the effective one from the returned
    /// history. Statistics are recomputed locally — the wire values
    /// are never trusted.
    pub async fn fetch_price_window(
        &self,
        node_address: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<PriceFetch, FetchError> {
        let url = format!("{}/price/", node_base_url(node_address));
        let mut request = self.client.get(&url);
        if let Some(start) = start {
            request = request.query(&[("start", start)]);
        }
        if let Some(end) = end {
            request = request.query(&[("end", end)]);
        }

        let raw: PriceWindow = request.send().await?.error_for_status()?.json().await?;

        let series = PriceSeries::new(raw.history).dedup();
        let effective_start_nanos = match start {
            Some(_) => None,
            None => series.first_timestamp(),
        };

        Ok(PriceFetch {
            window: series.into_window(),
            effective_start_nanos,
        })
    }
}

/// Node addresses are gossiped as bare `host:port`; qualify them for
/// the HTTP client.
fn node_base_url(address: &str) -> String {
    let trimmed = address.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn identity_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(NODE_NAME_HEADER, HeaderValue::from_static("node-1"));
        headers.insert(NODE_ADDR_HEADER, HeaderValue::from_static("10.0.0.5:8080"));
        headers.insert(NODE_CPU_HEADER, HeaderValue::from_static("4800"));
        headers.insert(NODE_MEMORY_HEADER, HeaderValue::from_static("8589934592"));
        headers
    }

    #[test]
    fn test_identity_from_headers() {
        let headers = identity_headers();
        let identity = NodeIdentity::parse(NodeIdentitySource::Headers(&headers))
            .unwrap()
            .unwrap();
        assert_eq!(identity.name, "node-1");
        assert_eq!(identity.address, "10.0.0.5:8080");
        assert_eq!(identity.cpu_shares, 4800);
        assert_eq!(identity.memory, 8589934592);
    }

    #[test]
    fn test_identity_absent_headers() {
        let headers = HeaderMap::new();
        let identity = NodeIdentity::parse(NodeIdentitySource::Headers(&headers)).unwrap();
        assert!(identity.is_none());
    }

    #[test]
    fn test_identity_partial_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(NODE_NAME_HEADER, HeaderValue::from_static("node-1"));
        let err = NodeIdentity::parse(NodeIdentitySource::Headers(&headers)).unwrap_err();
        assert!(matches!(err, FetchError::MissingHeader(name) if name == NODE_ADDR_HEADER));
    }

    #[test]
    fn test_identity_malformed_capacity() {
        let mut headers = identity_headers();
        headers.insert(NODE_CPU_HEADER, HeaderValue::from_static("a lot"));
        let err = NodeIdentity::parse(NodeIdentitySource::Headers(&headers)).unwrap_err();
        assert!(matches!(err, FetchError::MalformedHeader(name) if name == NODE_CPU_HEADER));
    }

    #[test]
    fn test_identity_shapes_agree() {
        let node = Node {
            name: "node-1".to_string(),
            address: "10.0.0.5:8080".to_string(),
            cpu_shares: 4800,
            memory: 8589934592,
            ..Default::default()
        };
        let from_body = NodeIdentity::parse(NodeIdentitySource::Body(&node))
            .unwrap()
            .unwrap();
        let headers = identity_headers();
        let from_headers = NodeIdentity::parse(NodeIdentitySource::Headers(&headers))
            .unwrap()
            .unwrap();
        assert_eq!(from_body, from_headers);
    }

    #[test]
    fn test_identity_apply_overrides_capacity() {
        let mut node = Node {
            name: "stale".to_string(),
            cpu_shares: 1,
            memory: 1,
            ..Default::default()
        };
        let headers = identity_headers();
        NodeIdentity::parse(NodeIdentitySource::Headers(&headers))
            .unwrap()
            .unwrap()
            .apply(&mut node);
        assert_eq!(node.name, "node-1");
        assert_eq!(node.cpu_shares, 4800);
    }

    #[test]
    fn test_node_base_url() {
        assert_eq!(node_base_url("10.0.0.5:8080"), "http://10.0.0.5:8080");
        assert_eq!(node_base_url("http://10.0.0.5:8080/"), "http://10.0.0.5:8080");
        assert_eq!(node_base_url("https://mm.example.com"), "https://mm.example.com");
    }
}
