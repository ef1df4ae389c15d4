// Section discovery pipelines

use crate::assign::{SectionMap, exclusive_sections, reachability_sections, resolve_sections};
use crate::error::Result;
use crate::graph::{BuildStats, GraphBuilder, ProgressCallback, WebGraph};
use crate::heads::{filter_top_level_heads, graph_section_heads};
use crate::indegree::IndegreeDistribution;
use crate::record::{LoadOptions, Records, SectionRecords, load_records};
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// How pages are grouped into sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionStrategy {
    /// Everything reachable from each head, sections may overlap.
    Basic,
    /// Top-level heads, pages split between them by distance.
    Partition,
    /// Top-level heads, pages reachable under the head URL.
    #[default]
    UrlPrefix,
    /// Pages grouped by their breadcrumb section.
    Breadcrumb,
}

impl SectionStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "basic" => Some(SectionStrategy::Basic),
            "partition" | "part" => Some(SectionStrategy::Partition),
            "url-prefix" | "url" => Some(SectionStrategy::UrlPrefix),
            "breadcrumb" | "bc" => Some(SectionStrategy::Breadcrumb),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionStrategy::Basic => "basic",
            SectionStrategy::Partition => "partition",
            SectionStrategy::UrlPrefix => "url-prefix",
            SectionStrategy::Breadcrumb => "breadcrumb",
        }
    }

    pub fn uses_graph(&self) -> bool {
        !matches!(self, SectionStrategy::Breadcrumb)
    }
}

/// How the section heads of a graph strategy were picked.
#[derive(Debug, Clone, Serialize)]
pub struct HeadSummary {
    pub distribution: IndegreeDistribution,
    pub threshold: usize,
    pub root: String,
    pub candidates: Vec<String>,
    pub heads: Vec<String>,
}

/// Sections of one capture.
#[derive(Debug, Clone, Serialize)]
pub struct Sections {
    pub strategy: SectionStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heads: Option<HeadSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<BuildStats>,
    pub members: SectionRecords,
}

fn urls_of(graph: &WebGraph, nodes: &[NodeIndex]) -> Vec<String> {
    nodes.iter().map(|&n| graph.vertex(n).url.clone()).collect()
}

/// Groups records by breadcrumb section. Records without one are left out.
pub fn breadcrumb_sections(records: &Records) -> SectionRecords {
    let mut sections = SectionRecords::new();
    for (url, record) in records {
        if let Some(label) = &record.section_label {
            sections
                .entry(label.clone())
                .or_default()
                .insert(url.clone(), record.clone());
        }
    }
    sections
}

/// Runs a graph strategy on an already built graph.
pub fn graph_sections(
    graph: &WebGraph,
    records: &Records,
    domain: &str,
    strategy: SectionStrategy,
) -> Result<Sections> {
    if !strategy.uses_graph() {
        return Ok(Sections {
            strategy,
            heads: None,
            graph: None,
            members: breadcrumb_sections(records),
        });
    }

    let detection = graph_section_heads(graph, records, domain)?;
    let heads = match strategy {
        SectionStrategy::Basic => detection.heads.clone(),
        _ => filter_top_level_heads(graph, &detection.heads),
    };
    info!(
        "Using {} of {} section heads ({})",
        heads.len(),
        detection.heads.len(),
        strategy.as_str()
    );

    let sections: SectionMap = match strategy {
        SectionStrategy::Partition => exclusive_sections(graph, &heads),
        SectionStrategy::UrlPrefix => reachability_sections(graph, &heads, true),
        _ => reachability_sections(graph, &heads, false),
    };

    Ok(Sections {
        strategy,
        heads: Some(HeadSummary {
            root: graph.vertex(detection.root).url.clone(),
            candidates: urls_of(graph, &detection.heads),
            heads: urls_of(graph, &heads),
            threshold: detection.threshold,
            distribution: detection.distribution,
        }),
        graph: None,
        members: resolve_sections(&sections, records),
    })
}

/// Builds the link graph of a capture from an outlink list.
pub fn capture_graph(
    records: &Records,
    edges: &Path,
    domain: Option<&str>,
    progress: Option<ProgressCallback>,
) -> Result<(WebGraph, BuildStats)> {
    let mut builder = GraphBuilder::new(records).with_only_known_vertices(true);
    if let Some(domain) = domain {
        builder = builder.with_domain(domain);
    }
    if let Some(progress) = progress {
        builder = builder.with_progress_callback(progress);
    }
    builder.build_from_file(edges)
}

/// Loads a capture and splits it into sections.
///
/// Records are loaded without error pages and non-HTML resources. The
/// outlink list defaults to the record file itself, which may hold both
/// kinds of lines.
pub fn discover_sections(
    records_path: &Path,
    edges_path: Option<&Path>,
    domain: &str,
    strategy: SectionStrategy,
    progress: Option<ProgressCallback>,
) -> Result<Sections> {
    let records = load_records(records_path, LoadOptions::sections())?;
    if !strategy.uses_graph() {
        return graph_sections(&WebGraph::new(), &records, domain, strategy);
    }

    let edges = edges_path.unwrap_or(records_path);
    let (graph, stats) = capture_graph(&records, edges, Some(domain), progress)?;
    let mut sections = graph_sections(&graph, &records, domain, strategy)?;
    sections.graph = Some(stats);
    Ok(sections)
}
