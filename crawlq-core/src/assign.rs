// Assignment of graph pages to section heads

use crate::graph::WebGraph;
use crate::record::{Records, SectionRecords};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// Head URL -> URLs of the section members, head included.
pub type SectionMap = BTreeMap<String, BTreeSet<String>>;

fn urls(graph: &WebGraph, nodes: impl IntoIterator<Item = NodeIndex>) -> BTreeSet<String> {
    nodes.into_iter().map(|n| graph.vertex(n).url.clone()).collect()
}

/// Pages reachable from each head through HTML pages, never crossing
/// another head. Heads are walked independently, so without `url_prefix`
/// one page can belong to several sections. With `url_prefix` a page is only
/// followed when its URL starts with the head URL.
pub fn reachability_sections(graph: &WebGraph, heads: &[NodeIndex], url_prefix: bool) -> SectionMap {
    let head_set: HashSet<NodeIndex> = heads.iter().copied().collect();
    let mut sections = SectionMap::new();

    for &head in heads {
        let head_url = graph.vertex(head).url.as_str();
        let mut members: HashSet<NodeIndex> = HashSet::from([head]);
        let mut stack = vec![head];

        while let Some(current) = stack.pop() {
            for (target, _) in graph.out_edges(current) {
                if target == current || members.contains(&target) || head_set.contains(&target) {
                    continue;
                }
                let vertex = graph.vertex(target);
                if !vertex.is_html() || (url_prefix && !vertex.url.starts_with(head_url)) {
                    continue;
                }
                members.insert(target);
                stack.push(target);
            }
        }

        debug!("Section {} has {} pages", head_url, members.len());
        sections.insert(head_url.to_string(), urls(graph, members));
    }
    sections
}

/// Grows all sections together one hop per round over direct links, each
/// page going to the first section that claims it. Heads take their turn in
/// URL order within a round.
///
/// Claims are recorded on the graph vertices. Pages already claimed (by an
/// earlier call) are never taken; use [`WebGraph::reset_sections`] to start
/// over.
pub fn exclusive_sections(graph: &WebGraph, heads: &[NodeIndex]) -> SectionMap {
    let mut heads: Vec<NodeIndex> = heads.to_vec();
    heads.sort_by(|a, b| graph.vertex(*a).url.cmp(&graph.vertex(*b).url));
    heads.dedup();

    for &head in &heads {
        let vertex = graph.vertex(head);
        vertex.claim(&vertex.url);
    }

    let mut members: Vec<Vec<NodeIndex>> = heads.iter().map(|&h| vec![h]).collect();
    let mut frontiers: Vec<Vec<NodeIndex>> = members.clone();
    let mut round = 0usize;

    while frontiers.iter().any(|f| !f.is_empty()) {
        round += 1;
        for (i, &head) in heads.iter().enumerate() {
            let head_url = graph.vertex(head).url.as_str();
            let mut next = Vec::new();
            for &current in &frontiers[i] {
                for (target, kind) in graph.out_edges(current) {
                    if !kind.is_direct() || target == current {
                        continue;
                    }
                    let vertex = graph.vertex(target);
                    if vertex.is_html() && vertex.claim(head_url) {
                        members[i].push(target);
                        next.push(target);
                    }
                }
            }
            frontiers[i] = next;
        }
    }
    info!("Partitioned {} sections in {} rounds", heads.len(), round);

    heads
        .iter()
        .zip(members)
        .map(|(&head, nodes)| (graph.vertex(head).url.clone(), urls(graph, nodes)))
        .collect()
}

/// Replaces member URLs by their records. Members without a record are
/// dropped.
pub fn resolve_sections(sections: &SectionMap, records: &Records) -> SectionRecords {
    sections
        .iter()
        .map(|(head, members)| {
            let resolved: Records = members
                .iter()
                .filter_map(|url| {
                    let record = records.get(url);
                    if record.is_none() {
                        debug!("No record for section member {}", url);
                    }
                    record.map(|r| (url.clone(), r.clone()))
                })
                .collect();
            (head.clone(), resolved)
        })
        .collect()
}
