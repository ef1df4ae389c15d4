// Report generation for analysis results

use crate::compare::{ChangeProportion, PageDistance, SectionChanges};
use crate::error::Result;
use crate::indegree::{IndegreeDistribution, PageIndegree};
use crate::metrics::{CaptureOverlap, Diversity, DuplicateDistribution, SectionDiversity};
use crate::sections::Sections;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.4}", r),
        None => "n/a".to_string(),
    }
}

/// Pretty JSON rendering of any report value.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn generate_redundancy_report(distribution: &DuplicateDistribution) -> String {
    let mut report = String::new();
    for (name, histogram) in distribution.partitions() {
        report.push_str(&format!("{}\n", name));
        for (copies, resources) in histogram {
            report.push_str(&format!("{} identical copies:\t{} resources\n", copies, resources));
        }
        report.push('\n');
    }
    report
}

pub fn generate_diversity_report(diversity: &Diversity) -> String {
    let mut report = String::new();

    match diversity.global_uniqueness() {
        Some(ratio) => report.push_str(&format!(
            "Global uniqueness: ({} + {}) / {} = {}\n",
            diversity.unique_html,
            diversity.unique_not_html,
            diversity.total,
            format_ratio(Some(ratio))
        )),
        None => report.push_str("Did not find any resources.\n"),
    }
    match diversity.html_uniqueness() {
        Some(ratio) => report.push_str(&format!(
            "HTML resources, unique / total: {} / {} = {}\n",
            diversity.unique_html,
            diversity.total_html,
            format_ratio(Some(ratio))
        )),
        None => report.push_str("Did not find any HTML resources.\n"),
    }
    match diversity.not_html_uniqueness() {
        Some(ratio) => report.push_str(&format!(
            "Non HTML resources, unique / total: {} / {} = {}\n",
            diversity.unique_not_html,
            diversity.total_not_html,
            format_ratio(Some(ratio))
        )),
        None => report.push_str("Did not find any not HTML resources.\n"),
    }
    report.push('\n');
    report
}

pub fn generate_distances_report(distances: &[PageDistance]) -> String {
    distances
        .iter()
        .map(|d| format!("{}\t{}\n", d.url, d.distance))
        .collect()
}

pub fn generate_change_report(changes: &ChangeProportion) -> String {
    format!(
        "Changed pages proportion among URLs in both captures with threshold {}: {} / {} = {}\n",
        changes.threshold,
        changes.changed,
        changes.total,
        format_ratio(changes.proportion())
    )
}

pub fn generate_section_changes_report(sections: &[SectionChanges]) -> String {
    let mut report = String::new();
    for section in sections {
        report.push_str(&format!("Section {}\n", section.section));
        report.push_str(&generate_change_report(&section.changes));
        report.push_str(&generate_distances_report(&section.distances));
        report.push('\n');
    }
    report
}

pub fn generate_overlap_report(overlap: &CaptureOverlap) -> String {
    let mut report = String::new();
    report.push_str(&format!("size a (all MIME types): {}\n", overlap.size_a));
    report.push_str(&format!("size b (all MIME types): {}\n", overlap.size_b));
    report.push_str(&format!("size both (all MIME types): {}\n", overlap.size_both));
    report.push_str(&format!("unique a html: {}\n", overlap.a.unique_html));
    report.push_str(&format!("unique a not html: {}\n", overlap.a.unique_not_html));
    report.push_str(&format!("unique b html: {}\n", overlap.b.unique_html));
    report.push_str(&format!("unique b not html: {}\n", overlap.b.unique_not_html));
    report.push_str(&format!("unique both html: {}\n", overlap.both.unique_html));
    report.push_str(&format!("unique both not html: {}\n", overlap.both.unique_not_html));
    report.push_str(&format!("A: {}\n", format_ratio(overlap.ratio_a())));
    report.push_str(&format!("B: {}\n", format_ratio(overlap.ratio_b())));
    report
}

pub fn generate_indegree_report(listing: &[PageIndegree]) -> String {
    listing
        .iter()
        .map(|p| format!("{} {}\n", p.indegree, p.url))
        .collect()
}

pub fn generate_indegree_distribution_report(distribution: &IndegreeDistribution) -> String {
    let mut report = String::new();
    for (name, histogram) in distribution.partitions() {
        report.push_str(&format!("{}\n", name));
        for (indegree, nodes) in histogram {
            report.push_str(&format!("{} in-degree:\t{} nodes\n", indegree, nodes));
        }
    }
    report
}

fn generate_heads_header(sections: &Sections) -> String {
    let mut report = String::new();
    if let Some(heads) = &sections.heads {
        report.push_str(&generate_indegree_distribution_report(&heads.distribution));
        report.push_str(&format!("section head threshold: {}\n", heads.threshold));
        report.push_str(&format!("root: {}\n", heads.root));
        report.push_str(&format!(
            "section heads ({}): {} of {} candidates\n",
            sections.strategy.as_str(),
            heads.heads.len(),
            heads.candidates.len()
        ));
    }
    report
}

pub fn generate_sections_report(sections: &Sections) -> String {
    let mut report = generate_heads_header(sections);
    for (head, members) in &sections.members {
        report.push_str(&format!("section: {}\tNumber of nodes: {}\n", head, members.len()));
        for url in members.keys() {
            report.push_str(&format!("- {}\n", url));
        }
    }
    report
}

pub fn generate_section_diversity_report(sections: &Sections, diversity: &[SectionDiversity]) -> String {
    let mut report = generate_heads_header(sections);
    for section in diversity {
        report.push_str(&format!(
            "section: {}\tNumber of nodes: {}\n",
            section.section, section.size
        ));
        report.push_str(&generate_diversity_report(&section.diversity));
    }
    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
