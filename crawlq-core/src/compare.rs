// Comparison of two captures of the same site

use crate::error::Result;
use crate::record::{Records, SectionRecords};
use serde::Serialize;

/// Fingerprint distance of one URL between two captures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDistance {
    pub url: String,
    pub distance: u32,
}

/// Keeps records that can be compared: pages with a full-page fingerprint or
/// a non-zero main-text fingerprint.
pub fn fingerprint_filter(records: &Records) -> Records {
    records
        .iter()
        .filter(|(_, r)| {
            r.fingerprint.is_some() || r.boilerplate_fingerprint.is_some_and(|f| !f.is_zero())
        })
        .map(|(url, r)| (url.clone(), r.clone()))
        .collect()
}

/// Distances between the records of URLs present in both captures, closest
/// first. URLs whose records share no fingerprint kind are left out.
pub fn distances_same_key(a: &Records, b: &Records) -> Result<Vec<PageDistance>> {
    let mut distances = Vec::new();
    for (url, record_a) in a {
        let Some(record_b) = b.get(url) else {
            continue;
        };
        if let Some(distance) = record_a.distance(record_b)? {
            distances.push(PageDistance {
                url: url.clone(),
                distance,
            });
        }
    }
    distances.sort_by(|x, y| x.distance.cmp(&y.distance).then_with(|| x.url.cmp(&y.url)));
    Ok(distances)
}

/// Share of compared pages whose fingerprint moved by more than `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeProportion {
    pub threshold: u32,
    pub changed: usize,
    pub total: usize,
}

impl ChangeProportion {
    pub fn from_distances(distances: &[PageDistance], threshold: u32) -> Self {
        ChangeProportion {
            threshold,
            changed: distances.iter().filter(|d| d.distance > threshold).count(),
            total: distances.len(),
        }
    }

    /// `None` when no page was compared.
    pub fn proportion(&self) -> Option<f64> {
        (self.total != 0).then(|| self.changed as f64 / self.total as f64)
    }
}

/// Changes within one section found in both captures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionChanges {
    pub section: String,
    pub changes: ChangeProportion,
    pub distances: Vec<PageDistance>,
}

/// Per-section distances for the sections present in both captures, in
/// section order.
pub fn section_distances(
    a: &SectionRecords,
    b: &SectionRecords,
    threshold: u32,
) -> Result<Vec<SectionChanges>> {
    let mut sections = Vec::new();
    for (head, members_a) in a {
        let Some(members_b) = b.get(head) else {
            continue;
        };
        let distances = distances_same_key(members_a, members_b)?;
        sections.push(SectionChanges {
            section: head.clone(),
            changes: ChangeProportion::from_distances(&distances, threshold),
            distances,
        });
    }
    Ok(sections)
}
