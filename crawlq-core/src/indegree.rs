// Indegree of graph pages and its distribution

use crate::config::ERROR_STATUS;
use crate::error::{CoreError, Result};
use crate::graph::WebGraph;
use crate::metrics::Histogram;
use crate::record::Records;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::HashMap;

pub type Indegrees = HashMap<NodeIndex, usize>;

/// Direct inlinks of every page with a non-error status, optionally limited
/// to MIME types starting with `mime_filter`. Pages without a status (no
/// record) or failing the filter are left out rather than given 0.
pub fn indegrees(graph: &WebGraph, mime_filter: Option<&str>) -> Indegrees {
    graph
        .vertices()
        .filter(|(_, v)| v.http_status.is_some_and(|s| s < ERROR_STATUS))
        .filter(|(_, v)| mime_filter.is_none_or(|prefix| v.has_mime_prefix(prefix)))
        .map(|(node, _)| {
            let count = graph.in_edges(node).filter(|(_, kind)| kind.is_direct()).count();
            (node, count)
        })
        .collect()
}

/// Indegree -> number of pages with that indegree, by page kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndegreeDistribution {
    pub all: Histogram,
    pub html: Histogram,
    pub not_html: Histogram,
}

impl IndegreeDistribution {
    /// Pages count as HTML when their URL has an HTML record.
    pub fn new(graph: &WebGraph, indegrees: &Indegrees, records: &Records) -> Self {
        let mut distribution = IndegreeDistribution::default();
        for (&node, &indegree) in indegrees {
            *distribution.all.entry(indegree).or_insert(0) += 1;
            let url = &graph.vertex(node).url;
            let bucket = if records.get(url).is_some_and(|r| r.is_html()) {
                &mut distribution.html
            } else {
                &mut distribution.not_html
            };
            *bucket.entry(indegree).or_insert(0) += 1;
        }
        distribution
    }

    pub fn partitions(&self) -> [(&'static str, &Histogram); 3] {
        [("all", &self.all), ("html", &self.html), ("not_html", &self.not_html)]
    }
}

/// Middle entry of the distinct indegree values, ignoring how many pages have
/// each value. Historical thresholds were computed this way.
pub fn section_head_threshold(distribution: &Histogram) -> Result<usize> {
    let distinct: Vec<usize> = distribution.keys().copied().collect();
    distinct
        .get(distinct.len() / 2)
        .copied()
        .ok_or(CoreError::EmptyIndegreeDistribution)
}

/// Indegree of one page, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageIndegree {
    pub url: String,
    pub indegree: usize,
}

/// Pages by decreasing indegree, ties by URL.
pub fn indegree_listing(graph: &WebGraph, indegrees: &Indegrees) -> Vec<PageIndegree> {
    let mut listing: Vec<PageIndegree> = indegrees
        .iter()
        .map(|(&node, &indegree)| PageIndegree {
            url: graph.vertex(node).url.clone(),
            indegree,
        })
        .collect();
    listing.sort_by(|a, b| b.indegree.cmp(&a.indegree).then_with(|| a.url.cmp(&b.url)));
    listing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_uses_distinct_values() {
        // one page at 1, a hundred at 2, one at 10: distinct values [1, 2, 10]
        let histogram = Histogram::from([(1, 1), (2, 100), (10, 1)]);
        assert_eq!(section_head_threshold(&histogram).unwrap(), 2);

        let histogram = Histogram::from([(1, 50), (7, 1)]);
        assert_eq!(section_head_threshold(&histogram).unwrap(), 7);

        let histogram = Histogram::from([(3, 2)]);
        assert_eq!(section_head_threshold(&histogram).unwrap(), 3);
    }

    #[test]
    fn test_threshold_of_empty_distribution() {
        assert!(matches!(
            section_head_threshold(&Histogram::new()),
            Err(CoreError::EmptyIndegreeDistribution)
        ));
    }
}
