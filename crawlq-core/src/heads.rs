// Root and section head detection

use crate::config::HTML_MIME_PREFIX;
use crate::error::{CoreError, Result};
use crate::graph::{WebGraph, strip_opt_www};
use crate::indegree::{IndegreeDistribution, Indegrees, indegrees, section_head_threshold};
use crate::record::Records;
use petgraph::graph::NodeIndex;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// Home page URLs tried for a domain, in order.
///
/// `example.com` also tries `www.example.com`; `www.example.com` (or any
/// `www*` label) also tries the bare domain.
pub fn root_candidates(domain: &str) -> Vec<String> {
    let alternate = if domain.starts_with("www") {
        strip_opt_www(domain).to_string()
    } else {
        format!("www.{}", domain)
    };
    [domain, alternate.as_str()]
        .iter()
        .flat_map(|d| [format!("http://{}/", d), format!("https://{}/", d)])
        .collect()
}

/// First root candidate present in the graph.
pub fn select_root(graph: &WebGraph, domain: &str) -> Option<NodeIndex> {
    root_candidates(domain).iter().find_map(|candidate| {
        debug!("Root candidate {}", candidate);
        graph.find(candidate)
    })
}

/// HTML pages linked directly from the root whose indegree reaches the
/// threshold, ordered by URL. Pages without a computed indegree never
/// qualify.
pub fn section_head_candidates(
    graph: &WebGraph,
    root: NodeIndex,
    indegrees: &Indegrees,
    threshold: usize,
) -> Vec<NodeIndex> {
    let mut heads: Vec<NodeIndex> = graph
        .out_edges(root)
        .filter(|(_, kind)| kind.is_direct())
        .map(|(target, _)| target)
        .filter(|&target| graph.vertex(target).is_html())
        .filter(|target| indegrees.get(target).is_some_and(|&d| d >= threshold))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    heads.sort_by(|a, b| graph.vertex(*a).url.cmp(&graph.vertex(*b).url));
    heads
}

/// False when a path prefix of the URL (one or more trailing segments cut) is
/// itself a candidate. Unparseable URLs are kept.
pub fn is_top_section_head(url: &str, candidates: &HashSet<&str>) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Could not parse {}: {}", url, e);
            return true;
        }
    };
    let mut segments: Vec<&str> = parsed.path().split('/').collect();
    while segments.last() == Some(&"") {
        segments.pop();
    }
    let origin = format!("{}://{}", parsed.scheme(), parsed.authority());
    (2..segments.len()).all(|i| {
        let prefix = format!("{}{}", origin, segments[..i].join("/"));
        !candidates.contains(prefix.as_str())
    })
}

/// Drops heads nested under another head by URL path.
pub fn filter_top_level_heads(graph: &WebGraph, heads: &[NodeIndex]) -> Vec<NodeIndex> {
    let urls: HashSet<&str> = heads.iter().map(|&h| graph.vertex(h).url.as_str()).collect();
    heads
        .iter()
        .copied()
        .filter(|&h| is_top_section_head(&graph.vertex(h).url, &urls))
        .collect()
}

/// Everything learned while picking section heads.
#[derive(Debug, Clone)]
pub struct HeadDetection {
    pub distribution: IndegreeDistribution,
    pub threshold: usize,
    pub root: NodeIndex,
    pub heads: Vec<NodeIndex>,
}

/// Picks section heads: direct HTML outlinks of the domain root whose HTML
/// indegree is at least the distribution threshold.
pub fn graph_section_heads(graph: &WebGraph, records: &Records, domain: &str) -> Result<HeadDetection> {
    let indegrees = indegrees(graph, Some(HTML_MIME_PREFIX));
    let distribution = IndegreeDistribution::new(graph, &indegrees, records);
    let threshold = section_head_threshold(&distribution.html)?;
    info!("Section head threshold: {}", threshold);

    let root = select_root(graph, domain).ok_or_else(|| CoreError::RootNotFound {
        domain: domain.to_string(),
    })?;
    let heads = section_head_candidates(graph, root, &indegrees, threshold);
    info!("Found {} section head candidates under {}", heads.len(), graph.vertex(root).url);

    Ok(HeadDetection {
        distribution,
        threshold,
        root,
        heads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_candidates() {
        assert_eq!(
            root_candidates("example.com"),
            vec![
                "http://example.com/",
                "https://example.com/",
                "http://www.example.com/",
                "https://www.example.com/",
            ]
        );
        assert_eq!(
            root_candidates("www.example.com"),
            vec![
                "http://www.example.com/",
                "https://www.example.com/",
                "http://example.com/",
                "https://example.com/",
            ]
        );
    }

    #[test]
    fn test_nested_head_is_not_top() {
        let candidates: HashSet<&str> = ["http://s/a", "http://s/a/b"].into_iter().collect();
        assert!(is_top_section_head("http://s/a", &candidates));
        assert!(!is_top_section_head("http://s/a/b", &candidates));
        assert!(!is_top_section_head("http://s/a/b/c/", &candidates));
    }

    #[test]
    fn test_prefix_match_is_exact() {
        // "http://s/a/" is not the prefix "http://s/a"
        let candidates: HashSet<&str> = ["http://s/a/", "http://s/a/b"].into_iter().collect();
        assert!(is_top_section_head("http://s/a/b", &candidates));
    }

    #[test]
    fn test_port_is_part_of_prefix() {
        let candidates: HashSet<&str> = ["http://s:8080/a"].into_iter().collect();
        assert!(!is_top_section_head("http://s:8080/a/b", &candidates));
        assert!(is_top_section_head("http://s/a/b", &candidates));
    }

    #[test]
    fn test_unparseable_head_is_kept() {
        let candidates: HashSet<&str> = HashSet::new();
        assert!(is_top_section_head("not a url", &candidates));
    }
}
