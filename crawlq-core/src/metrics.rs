// Redundancy and diversity metrics over capture records

use crate::cluster::count_unique;
use crate::config::NEAR_DUPLICATE_DISTANCE;
use crate::error::Result;
use crate::record::{SectionRecords, UrlRecord};
use crawlq_simhash::Fingerprint;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Cluster size -> number of clusters of that size.
pub type Histogram = BTreeMap<usize, usize>;

/// Total number of items described by a histogram.
pub fn count_all(histogram: &Histogram) -> usize {
    histogram.iter().map(|(size, count)| size * count).sum()
}

/// Number of clusters described by a histogram.
pub fn count_unique_keys(histogram: &Histogram) -> usize {
    histogram.values().sum()
}

fn count_of_counts<K>(groups: HashMap<K, usize>) -> Histogram {
    let mut histogram = Histogram::new();
    for size in groups.into_values() {
        *histogram.entry(size).or_insert(0) += 1;
    }
    histogram
}

/// Exact-duplicate histograms of four overlapping partitions of a capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateDistribution {
    pub all: Histogram,
    pub html: Histogram,
    pub not_html: Histogram,
    pub images: Histogram,
}

impl DuplicateDistribution {
    /// Partitions in report order.
    pub fn partitions(&self) -> [(&'static str, &Histogram); 4] {
        [
            ("all", &self.all),
            ("html", &self.html),
            ("images", &self.images),
            ("not_html", &self.not_html),
        ]
    }
}

/// Groups records by content hash and counts how many hashes have each
/// number of copies.
pub fn exact_duplicate_distribution<'a, I>(records: I) -> DuplicateDistribution
where
    I: IntoIterator<Item = &'a UrlRecord>,
{
    let mut all: HashMap<&str, usize> = HashMap::new();
    let mut html: HashMap<&str, usize> = HashMap::new();
    let mut not_html: HashMap<&str, usize> = HashMap::new();
    let mut images: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let hash = record.content_hash.as_str();
        *all.entry(hash).or_insert(0) += 1;
        if record.is_html() {
            *html.entry(hash).or_insert(0) += 1;
        } else {
            *not_html.entry(hash).or_insert(0) += 1;
        }
        if record.is_image() {
            *images.entry(hash).or_insert(0) += 1;
        }
    }

    DuplicateDistribution {
        all: count_of_counts(all),
        html: count_of_counts(html),
        not_html: count_of_counts(not_html),
        images: count_of_counts(images),
    }
}

fn page_fingerprints<'a, I>(records: I) -> Vec<Fingerprint>
where
    I: IntoIterator<Item = &'a UrlRecord>,
{
    records.into_iter().filter_map(|r| r.fingerprint).collect()
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator != 0).then(|| numerator as f64 / denominator as f64)
}

/// Unique and total resource counts of a capture (or a section of one).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diversity {
    /// Near-duplicate clusters among pages with a fingerprint.
    pub unique_html: usize,
    /// Distinct content hashes among non-HTML resources.
    pub unique_not_html: usize,
    pub total_html: usize,
    pub total_not_html: usize,
    pub total: usize,
}

impl Diversity {
    /// `(unique_html + unique_not_html) / total`, `None` without resources.
    pub fn global_uniqueness(&self) -> Option<f64> {
        ratio(self.unique_html + self.unique_not_html, self.total)
    }

    pub fn html_uniqueness(&self) -> Option<f64> {
        ratio(self.unique_html, self.total_html)
    }

    pub fn not_html_uniqueness(&self) -> Option<f64> {
        ratio(self.unique_not_html, self.total_not_html)
    }
}

pub fn diversity<'a, I>(records: I) -> Result<Diversity>
where
    I: IntoIterator<Item = &'a UrlRecord> + Clone,
{
    let unique_html = count_unique(&page_fingerprints(records.clone()), NEAR_DUPLICATE_DISTANCE)?;
    let distribution = exact_duplicate_distribution(records);
    Ok(Diversity {
        unique_html,
        unique_not_html: count_unique_keys(&distribution.not_html),
        total_html: count_all(&distribution.html),
        total_not_html: count_all(&distribution.not_html),
        total: count_all(&distribution.all),
    })
}

/// Diversity of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionDiversity {
    pub section: String,
    pub size: usize,
    pub diversity: Diversity,
}

pub fn section_diversity(sections: &SectionRecords) -> Result<Vec<SectionDiversity>> {
    sections
        .iter()
        .map(|(head, members)| {
            Ok(SectionDiversity {
                section: head.clone(),
                size: members.len(),
                diversity: diversity(members.values())?,
            })
        })
        .collect()
}

/// Unique item counts used to compare two captures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UniqueCounts {
    /// Distinct content hashes among HTML pages.
    pub exact_unique_html: usize,
    /// Distinct content hashes among non-HTML resources.
    pub unique_not_html: usize,
    /// Near-duplicate clusters among pages with a fingerprint.
    pub unique_html: usize,
}

impl UniqueCounts {
    /// Near-duplicate HTML clusters plus distinct non-HTML resources.
    pub fn unique(&self) -> usize {
        self.unique_html + self.unique_not_html
    }
}

pub fn unique_counts<'a, I>(records: I) -> Result<UniqueCounts>
where
    I: IntoIterator<Item = &'a UrlRecord> + Clone,
{
    let distribution = exact_duplicate_distribution(records.clone());
    Ok(UniqueCounts {
        exact_unique_html: count_unique_keys(&distribution.html),
        unique_not_html: count_unique_keys(&distribution.not_html),
        unique_html: count_unique(&page_fingerprints(records), NEAR_DUPLICATE_DISTANCE)?,
    })
}

/// How much of the unique content of two captures each one holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureOverlap {
    pub size_a: usize,
    pub size_b: usize,
    pub size_both: usize,
    pub a: UniqueCounts,
    pub b: UniqueCounts,
    pub both: UniqueCounts,
}

impl CaptureOverlap {
    /// Share of the combined unique content found in capture A.
    pub fn ratio_a(&self) -> Option<f64> {
        ratio(self.a.unique(), self.both.unique())
    }

    /// Share of the combined unique content found in capture B.
    pub fn ratio_b(&self) -> Option<f64> {
        ratio(self.b.unique(), self.both.unique())
    }
}

/// Compares the unique content of two captures against their union. The
/// union keeps every record of both captures, so a page captured twice with
/// the same content counts once.
pub fn capture_overlap<'a, A, B>(a: A, b: B) -> Result<CaptureOverlap>
where
    A: IntoIterator<Item = &'a UrlRecord> + Clone,
    B: IntoIterator<Item = &'a UrlRecord> + Clone,
{
    let counts_a = unique_counts(a.clone())?;
    let counts_b = unique_counts(b.clone())?;
    let both: Vec<&UrlRecord> = a.clone().into_iter().chain(b.clone()).collect();
    let counts_both = unique_counts(both.iter().copied())?;
    Ok(CaptureOverlap {
        size_a: a.into_iter().count(),
        size_b: b.into_iter().count(),
        size_both: both.len(),
        a: counts_a,
        b: counts_b,
        both: counts_both,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlq_simhash::Algorithm;

    fn record(url: &str, mime: &str, hash: &str, bits: Option<u64>) -> UrlRecord {
        UrlRecord {
            url: url.to_string(),
            date: None,
            http_status: 200,
            mime_type: mime.to_string(),
            redirect_target: None,
            content_hash: hash.to_string(),
            fingerprint: bits.map(|b| Fingerprint::new(Algorithm::default(), b)),
            boilerplate_fingerprint: None,
            section_label: None,
        }
    }

    #[test]
    fn test_count_of_counts() {
        let records = [
            record("http://s/a.png", "image/png", "h1", None),
            record("http://s/b.png", "image/png", "h1", None),
            record("http://s/c.pdf", "application/pdf", "h2", None),
        ];
        let distribution = exact_duplicate_distribution(&records);
        assert_eq!(distribution.not_html, Histogram::from([(1, 1), (2, 1)]));
        assert_eq!(distribution.images, Histogram::from([(2, 1)]));
        assert!(distribution.html.is_empty());
        assert_eq!(count_all(&distribution.all), 3);
        assert_eq!(count_unique_keys(&distribution.all), 2);
    }

    #[test]
    fn test_diversity_mixes_near_and_exact_duplicates() {
        let records = [
            record("http://s/1", "text/html", "a", Some(0)),
            record("http://s/2", "text/html", "b", Some(1)),
            record("http://s/3", "text/html", "c", Some(u64::MAX)),
            record("http://s/4", "text/html", "d", None),
            record("http://s/x.css", "text/css", "e", None),
            record("http://s/y.css", "text/css", "e", None),
        ];
        let d = diversity(&records).unwrap();
        assert_eq!(d.unique_html, 2);
        assert_eq!(d.unique_not_html, 1);
        assert_eq!(d.total_html, 4);
        assert_eq!(d.total_not_html, 2);
        assert_eq!(d.total, 6);
        assert_eq!(d.global_uniqueness(), Some(0.5));
    }

    #[test]
    fn test_empty_diversity_has_no_ratios() {
        let d = diversity(&Vec::<UrlRecord>::new()).unwrap();
        assert_eq!(d, Diversity::default());
        assert_eq!(d.global_uniqueness(), None);
        assert_eq!(d.html_uniqueness(), None);
        assert_eq!(d.not_html_uniqueness(), None);
    }

    #[test]
    fn test_capture_overlap_union() {
        let a = [record("http://s/1", "text/html", "a", Some(0))];
        let b = [
            record("http://s/1", "text/html", "a", Some(0)),
            record("http://s/2", "text/html", "b", Some(u64::MAX)),
        ];
        let overlap = capture_overlap(&a, &b).unwrap();
        assert_eq!(overlap.size_both, 3);
        assert_eq!(overlap.both.unique_html, 2);
        assert_eq!(overlap.both.exact_unique_html, 2);
        assert_eq!(overlap.ratio_a(), Some(0.5));
        assert_eq!(overlap.ratio_b(), Some(1.0));
    }
}
