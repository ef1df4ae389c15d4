// Near-duplicate clustering of fingerprints

use crate::error::Result;
use crawlq_simhash::Fingerprint;

/// Splits fingerprints into connected components of the "closer than
/// `threshold`" relation. Each cluster lists indexes into `fingerprints`,
/// seeds first.
///
/// Each round takes a seed from the working set and drains its whole
/// component before the next seed is picked.
pub fn near_duplicate_clusters(fingerprints: &[Fingerprint], threshold: u32) -> Result<Vec<Vec<usize>>> {
    let mut remaining: Vec<usize> = (0..fingerprints.len()).collect();
    let mut clusters = Vec::new();

    while let Some(seed) = remaining.pop() {
        let mut cluster = vec![seed];
        let mut worklist = vec![seed];
        while let Some(current) = worklist.pop() {
            let mut i = 0;
            while i < remaining.len() {
                let candidate = remaining[i];
                if fingerprints[current].distance(&fingerprints[candidate])? < threshold {
                    remaining.swap_remove(i);
                    cluster.push(candidate);
                    worklist.push(candidate);
                } else {
                    i += 1;
                }
            }
        }
        clusters.push(cluster);
    }
    Ok(clusters)
}

/// Number of near-duplicate clusters, i.e. the count of unique items.
pub fn count_unique(fingerprints: &[Fingerprint], threshold: u32) -> Result<usize> {
    Ok(near_duplicate_clusters(fingerprints, threshold)?.len())
}
