// Tests for near-duplicate clustering and capture metrics

use crawlq_core::cluster::{count_unique, near_duplicate_clusters};
use crawlq_core::config::NEAR_DUPLICATE_DISTANCE;
use crawlq_core::metrics::{
    Histogram, count_all, count_unique_keys, diversity, exact_duplicate_distribution,
    section_diversity, unique_counts,
};
use crawlq_core::record::{SectionRecords, UrlRecord};
use crawlq_simhash::{Algorithm, Fingerprint};
use proptest::prelude::*;
use std::collections::HashSet;

fn fp(bits: u64) -> Fingerprint {
    Fingerprint::new(Algorithm::default(), bits)
}

fn resource(url: &str, mime: &str, hash: &str) -> UrlRecord {
    UrlRecord {
        url: url.to_string(),
        date: None,
        http_status: 200,
        mime_type: mime.to_string(),
        redirect_target: None,
        content_hash: hash.to_string(),
        fingerprint: None,
        boilerplate_fingerprint: None,
        section_label: None,
    }
}

fn page(url: &str, hash: &str, bits: u64) -> UrlRecord {
    UrlRecord {
        fingerprint: Some(fp(bits)),
        ..resource(url, "text/html", hash)
    }
}

// ============================================================================
// Clustering Properties
// ============================================================================

/// Fingerprints at least 4 bits apart: each one sets its own nibble.
fn spread(count: usize) -> Vec<Fingerprint> {
    (0..count).map(|i| fp(0xF << (4 * i))).collect()
}

proptest! {
    #[test]
    fn prop_far_apart_fingerprints_are_all_unique(count in 0usize..16, rotate in 0usize..16) {
        let mut fps = spread(count);
        if count > 0 {
            fps.rotate_left(rotate % count);
        }
        prop_assert_eq!(count_unique(&fps, NEAR_DUPLICATE_DISTANCE).unwrap(), count);
    }

    #[test]
    fn prop_close_fingerprints_form_one_cluster(
        base in any::<u64>(),
        flips in prop::collection::vec(0u32..64, 1..12),
    ) {
        // every member differs from the base in at most one bit, so any two
        // differ in at most two
        let fps: Vec<Fingerprint> = flips.iter().map(|&bit| fp(base ^ (1u64 << bit))).collect();
        prop_assert_eq!(count_unique(&fps, NEAR_DUPLICATE_DISTANCE).unwrap(), 1);
    }

    #[test]
    fn prop_clusters_cover_every_index_once(bits in prop::collection::vec(any::<u64>(), 0..20)) {
        let fps: Vec<Fingerprint> = bits.into_iter().map(fp).collect();
        let clusters = near_duplicate_clusters(&fps, NEAR_DUPLICATE_DISTANCE).unwrap();
        let mut seen = HashSet::new();
        for cluster in &clusters {
            prop_assert!(!cluster.is_empty());
            for &i in cluster {
                prop_assert!(seen.insert(i));
            }
        }
        prop_assert_eq!(seen.len(), fps.len());
    }

    #[test]
    fn prop_duplicate_histograms_add_up(
        hashes in prop::collection::vec((0u8..6, prop::bool::ANY), 0..40),
    ) {
        let records: Vec<UrlRecord> = hashes
            .iter()
            .enumerate()
            .map(|(i, (h, html))| {
                let mime = if *html { "text/html" } else { "application/pdf" };
                resource(&format!("http://s/{}", i), mime, &h.to_string())
            })
            .collect();
        let distribution = exact_duplicate_distribution(&records);

        let html: Vec<&UrlRecord> = records.iter().filter(|r| r.is_html()).collect();
        let distinct_html: HashSet<&str> = html.iter().map(|r| r.content_hash.as_str()).collect();
        let distinct_all: HashSet<&str> = records.iter().map(|r| r.content_hash.as_str()).collect();

        prop_assert_eq!(count_all(&distribution.all), records.len());
        prop_assert_eq!(count_all(&distribution.html), html.len());
        prop_assert_eq!(count_all(&distribution.not_html), records.len() - html.len());
        prop_assert_eq!(count_unique_keys(&distribution.html), distinct_html.len());
        prop_assert_eq!(count_unique_keys(&distribution.all), distinct_all.len());
        prop_assert!(distribution.images.is_empty());
    }
}

#[test]
fn test_clustering_is_transitive() {
    // 0 and 0x3F are 6 bits apart but linked through 0x7
    let fps = [fp(0x3F), fp(0), fp(0x7)];
    assert_eq!(count_unique(&fps, NEAR_DUPLICATE_DISTANCE).unwrap(), 1);
    let fps = [fp(0x3F), fp(0)];
    assert_eq!(count_unique(&fps, NEAR_DUPLICATE_DISTANCE).unwrap(), 2);
}

// ============================================================================
// Capture Metric Scenarios
// ============================================================================

#[test]
fn test_non_html_duplicates() {
    let records = [
        resource("http://s/a.pdf", "application/pdf", "h1"),
        resource("http://s/b.pdf", "application/pdf", "h1"),
        resource("http://s/c.pdf", "application/pdf", "h2"),
    ];
    let distribution = exact_duplicate_distribution(&records);
    assert_eq!(distribution.not_html, Histogram::from([(2, 1), (1, 1)]));
    assert_eq!(unique_counts(&records).unwrap().unique_not_html, 2);
}

#[test]
fn test_image_partition_overlaps_not_html() {
    let records = [
        resource("http://s/a.png", "image/png", "x"),
        resource("http://s/b.png", "image/png", "x"),
        resource("http://s/index", "text/html", "x"),
    ];
    let distribution = exact_duplicate_distribution(&records);
    assert_eq!(distribution.all, Histogram::from([(3, 1)]));
    assert_eq!(distribution.images, Histogram::from([(2, 1)]));
    assert_eq!(distribution.not_html, Histogram::from([(2, 1)]));
    assert_eq!(distribution.html, Histogram::from([(1, 1)]));
}

#[test]
fn test_unique_counts_separate_exact_and_near() {
    let records = [
        page("http://s/1", "a", 0),
        page("http://s/2", "b", 1),
        page("http://s/3", "b", 1),
    ];
    let counts = unique_counts(&records).unwrap();
    assert_eq!(counts.exact_unique_html, 2);
    assert_eq!(counts.unique_html, 1);
    assert_eq!(counts.unique_not_html, 0);
}

#[test]
fn test_section_diversity() {
    let mut sections = SectionRecords::new();
    sections
        .entry("http://s/a".to_string())
        .or_default()
        .insert("http://s/a".to_string(), page("http://s/a", "1", 0));
    sections
        .entry("http://s/b".to_string())
        .or_default()
        .insert("http://s/b".to_string(), page("http://s/b", "2", 0));
    sections
        .entry("http://s/b".to_string())
        .or_default()
        .insert("http://s/b/1".to_string(), page("http://s/b/1", "3", u64::MAX));

    let result = section_diversity(&sections).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result[1].section, "http://s/b");
    assert_eq!(result[1].size, 2);
    assert_eq!(result[1].diversity.unique_html, 2);
    assert_eq!(result[1].diversity, diversity(sections["http://s/b"].values()).unwrap());
}
