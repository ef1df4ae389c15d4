// Tests for report generation functionality

use crawlq_core::compare::{ChangeProportion, PageDistance, SectionChanges};
use crawlq_core::indegree::{IndegreeDistribution, PageIndegree};
use crawlq_core::metrics::{CaptureOverlap, Diversity, Histogram, SectionDiversity, UniqueCounts};
use crawlq_core::record::{Records, SectionRecords, UrlRecord};
use crawlq_core::report::{
    ReportFormat, generate_distances_report, generate_indegree_report, generate_overlap_report,
    generate_section_changes_report, generate_section_diversity_report, generate_sections_report,
    save_report, to_json,
};
use crawlq_core::sections::{HeadSummary, SectionStrategy, Sections};
use tempfile::TempDir;

fn member(url: &str) -> (String, UrlRecord) {
    (
        url.to_string(),
        UrlRecord {
            url: url.to_string(),
            date: None,
            http_status: 200,
            mime_type: "text/html".to_string(),
            redirect_target: None,
            content_hash: "1".to_string(),
            fingerprint: None,
            boilerplate_fingerprint: None,
            section_label: None,
        },
    )
}

fn sample_sections() -> Sections {
    let mut members = SectionRecords::new();
    members.insert(
        "http://s/a".to_string(),
        Records::from([member("http://s/a"), member("http://s/a/1")]),
    );
    Sections {
        strategy: SectionStrategy::UrlPrefix,
        heads: Some(HeadSummary {
            distribution: IndegreeDistribution {
                all: Histogram::from([(1, 2)]),
                html: Histogram::from([(1, 2)]),
                not_html: Histogram::new(),
            },
            threshold: 1,
            root: "http://s/".to_string(),
            candidates: vec!["http://s/a".to_string(), "http://s/a/b".to_string()],
            heads: vec!["http://s/a".to_string()],
        }),
        graph: None,
        members,
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert!(matches!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("Json"), Some(ReportFormat::Json)));
    assert!(ReportFormat::from_str("markdown").is_none());
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_sections_report_lists_members() {
    let report = generate_sections_report(&sample_sections());
    assert!(report.contains("html\n1 in-degree:\t2 nodes\n"));
    assert!(report.contains("section head threshold: 1\n"));
    assert!(report.contains("section heads (url-prefix): 1 of 2 candidates\n"));
    assert!(report.ends_with("section: http://s/a\tNumber of nodes: 2\n- http://s/a\n- http://s/a/1\n"));
}

#[test]
fn test_section_diversity_report() {
    let diversity = vec![SectionDiversity {
        section: "http://s/a".to_string(),
        size: 2,
        diversity: Diversity {
            unique_html: 1,
            unique_not_html: 0,
            total_html: 2,
            total_not_html: 0,
            total: 2,
        },
    }];
    let report = generate_section_diversity_report(&sample_sections(), &diversity);
    assert!(report.contains(
        "section: http://s/a\tNumber of nodes: 2\nGlobal uniqueness: (1 + 0) / 2 = 0.5000\n"
    ));
    assert!(report.contains("Did not find any not HTML resources.\n"));
}

#[test]
fn test_distances_and_changes_report() {
    let distances = vec![
        PageDistance { url: "http://s/a".into(), distance: 2 },
        PageDistance { url: "http://s/b".into(), distance: 12 },
    ];
    assert_eq!(generate_distances_report(&distances), "http://s/a\t2\nhttp://s/b\t12\n");

    let sections = vec![SectionChanges {
        section: "http://s/".into(),
        changes: ChangeProportion::from_distances(&distances, 8),
        distances,
    }];
    let report = generate_section_changes_report(&sections);
    assert!(report.starts_with(
        "Section http://s/\nChanged pages proportion among URLs in both captures with threshold 8: 1 / 2 = 0.5000\n"
    ));
}

#[test]
fn test_overlap_report() {
    let counts = UniqueCounts { exact_unique_html: 1, unique_not_html: 1, unique_html: 1 };
    let overlap = CaptureOverlap {
        size_a: 2,
        size_b: 2,
        size_both: 4,
        a: counts,
        b: counts,
        both: UniqueCounts { exact_unique_html: 2, unique_not_html: 2, unique_html: 2 },
    };
    let report = generate_overlap_report(&overlap);
    assert!(report.starts_with("size a (all MIME types): 2\n"));
    assert!(report.ends_with("A: 0.5000\nB: 0.5000\n"));
}

#[test]
fn test_indegree_report() {
    let listing = vec![PageIndegree { url: "http://s/".into(), indegree: 7 }];
    assert_eq!(generate_indegree_report(&listing), "7 http://s/\n");
}

// ============================================================================
// JSON and File Output Tests
// ============================================================================

#[test]
fn test_sections_json() {
    let json = to_json(&sample_sections()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["strategy"], "url-prefix");
    assert_eq!(value["heads"]["root"], "http://s/");
    assert!(value.get("graph").is_none());
    assert_eq!(value["members"]["http://s/a"]["http://s/a/1"]["http_status"], 200);
}

#[test]
fn test_save_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.txt");
    save_report("hello\n", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
}
