// Web graph built from a capture's outlink list

use crate::config::{HTML_MIME_PREFIX, PROGRESS_INTERVAL};
use crate::error::{CoreError, Result};
use crate::record::Records;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(&BuildStats) + Send + Sync>;

/// How an outlink was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    /// Seen in the page markup.
    Direct,
    /// Added by link inference.
    Inferred,
}

impl EdgeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "I" | "inferred" => EdgeKind::Inferred,
            _ => EdgeKind::Direct,
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, EdgeKind::Direct)
    }
}

/// A page of the graph. Capture metadata is copied from its record when the
/// URL has one.
#[derive(Debug)]
pub struct Vertex {
    pub url: String,
    pub mime_type: Option<String>,
    pub http_status: Option<u16>,
    pub redirect_target: Option<String>,
    section: OnceLock<String>,
}

impl Vertex {
    fn new(url: &str, records: &Records) -> Self {
        let record = records.get(url);
        Vertex {
            url: url.to_string(),
            mime_type: record.map(|r| r.mime_type.clone()),
            http_status: record.map(|r| r.http_status),
            redirect_target: record.and_then(|r| r.redirect_target.clone()),
            section: OnceLock::new(),
        }
    }

    pub fn is_html(&self) -> bool {
        self.has_mime_prefix(HTML_MIME_PREFIX)
    }

    pub fn has_mime_prefix(&self, prefix: &str) -> bool {
        self.mime_type.as_deref().is_some_and(|m| m.starts_with(prefix))
    }

    /// Head URL of the section that claimed this page, if any.
    pub fn section(&self) -> Option<&str> {
        self.section.get().map(String::as_str)
    }

    /// Claims the page for a section. Only the first claim succeeds.
    pub fn claim(&self, head: &str) -> bool {
        self.section.set(head.to_string()).is_ok()
    }
}

/// Counts reported while building a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub lines: usize,
    pub skipped_lines: usize,
    pub vertices: usize,
    pub edges: usize,
}

#[derive(Debug, Default)]
pub struct WebGraph {
    graph: DiGraph<Vertex, EdgeKind>,
    index: HashMap<String, NodeIndex>,
}

impl WebGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, url: &str) -> Option<NodeIndex> {
        self.index.get(url).copied()
    }

    pub fn vertex(&self, node: NodeIndex) -> &Vertex {
        &self.graph[node]
    }

    pub fn vertices(&self) -> impl Iterator<Item = (NodeIndex, &Vertex)> {
        self.graph.node_indices().map(|n| (n, &self.graph[n]))
    }

    /// Outlinks of a page as (target, kind) pairs.
    pub fn out_edges(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, EdgeKind)> + '_ {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), *e.weight()))
    }

    /// Inlinks of a page as (source, kind) pairs.
    pub fn in_edges(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, EdgeKind)> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), *e.weight()))
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Clears every section claim.
    pub fn reset_sections(&mut self) {
        for vertex in self.graph.node_weights_mut() {
            vertex.section.take();
        }
    }

    /// Returns the vertex of a URL, creating it on first sight.
    fn vertex_for(&mut self, url: &str, records: &Records) -> Result<(NodeIndex, bool)> {
        if let Some(node) = self.find(url) {
            return Ok((node, false));
        }
        self.index.try_reserve(1)?;
        let node = self.graph.add_node(Vertex::new(url, records));
        self.index.insert(url.to_string(), node);
        Ok((node, true))
    }

    /// Adds an outlink between two URLs. Parallel edges are kept.
    pub fn add_link(&mut self, source: &str, target: &str, kind: EdgeKind, records: &Records) -> Result<usize> {
        let (from, new_from) = self.vertex_for(source, records)?;
        let (to, new_to) = self.vertex_for(target, records)?;
        self.graph.add_edge(from, to, kind);
        Ok(usize::from(new_from) + usize::from(new_to))
    }
}

/// Removes a leading `www` label from a domain.
pub fn strip_opt_www(domain: &str) -> &str {
    if domain.starts_with("www") {
        domain.split_once('.').map_or(domain, |(_, rest)| rest)
    } else {
        domain
    }
}

/// True when the URL is http(s) and its host is `domain` or a subdomain of it.
/// Unparseable URLs are outside every domain.
pub fn url_in_domain(url: &str, domain: &str) -> bool {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .is_some_and(|host| host == domain || host.ends_with(&format!(".{}", domain))),
        Err(e) => {
            debug!("Could not parse URL {}: {}", url, e);
            false
        }
    }
}

/// One parsed outlink line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLine<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub kind: EdgeKind,
}

/// Parses `<source> -> <target> [<tag>]`. Anything else is `None`.
pub fn parse_edge_line(line: &str) -> Option<EdgeLine<'_>> {
    let words: Vec<&str> = line.trim_end_matches('\r').split(' ').collect();
    match words.as_slice() {
        [source, "->", target, rest @ ..] => Some(EdgeLine {
            source: *source,
            target: *target,
            kind: rest.first().map_or(EdgeKind::Direct, |tag| EdgeKind::from_tag(tag)),
        }),
        _ => None,
    }
}

/// Builds a [`WebGraph`] from an outlink list.
pub struct GraphBuilder<'a> {
    records: &'a Records,
    domain: Option<String>,
    only_known_vertices: bool,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(records: &'a Records) -> Self {
        Self {
            records,
            domain: None,
            only_known_vertices: false,
            progress_callback: None,
        }
    }

    /// Keeps only links whose both ends are in the domain or its subdomains.
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(strip_opt_www(domain).to_string());
        self
    }

    /// Keeps only links whose both ends have a record.
    pub fn with_only_known_vertices(mut self, only_known_vertices: bool) -> Self {
        self.only_known_vertices = only_known_vertices;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn accepts(&self, edge: &EdgeLine<'_>) -> bool {
        if let Some(domain) = &self.domain
            && !(url_in_domain(edge.source, domain) && url_in_domain(edge.target, domain))
        {
            return false;
        }
        !self.only_known_vertices
            || (self.records.contains_key(edge.source) && self.records.contains_key(edge.target))
    }

    pub fn build<R: BufRead>(&self, reader: R) -> Result<(WebGraph, BuildStats)> {
        let mut graph = WebGraph::new();
        let mut stats = BuildStats::default();

        for line in reader.lines() {
            let line = line?;
            stats.lines += 1;
            let Some(edge) = parse_edge_line(&line) else {
                stats.skipped_lines += 1;
                continue;
            };
            if !self.accepts(&edge) {
                continue;
            }
            stats.vertices += graph.add_link(edge.source, edge.target, edge.kind, self.records)?;
            stats.edges += 1;
            if stats.edges % PROGRESS_INTERVAL == 0 {
                debug!("{} vertices, {} edges", stats.vertices, stats.edges);
                if let Some(callback) = &self.progress_callback {
                    callback(&stats);
                }
            }
        }

        info!("Loaded all {} vertices", stats.vertices);
        info!("Loaded all {} edges", stats.edges);
        if let Some(callback) = &self.progress_callback {
            callback(&stats);
        }
        Ok((graph, stats))
    }

    pub fn build_from_file(&self, path: &Path) -> Result<(WebGraph, BuildStats)> {
        let file = File::open(path).map_err(|e| CoreError::io(path, e))?;
        self.build(BufReader::new(file)).map_err(|e| match e {
            CoreError::IoError(source) => CoreError::io(path, source),
            other => other,
        })
    }
}
