use anyhow::{Context, Result, bail};
use crawlq_core::compare::{
    ChangeProportion, PageDistance, SectionChanges, distances_same_key, fingerprint_filter,
    section_distances,
};
use crawlq_core::config::HTML_MIME_PREFIX;
use crawlq_core::graph::ProgressCallback;
use crawlq_core::indegree::{IndegreeDistribution, PageIndegree, indegree_listing, indegrees};
use crawlq_core::metrics::{
    SectionDiversity, capture_overlap, diversity, exact_duplicate_distribution, section_diversity,
};
use crawlq_core::report::{
    ReportFormat, generate_change_report, generate_distances_report, generate_diversity_report,
    generate_indegree_distribution_report, generate_indegree_report, generate_overlap_report,
    generate_redundancy_report, generate_section_changes_report,
    generate_section_diversity_report, generate_sections_report, to_json,
};
use crawlq_core::sections::{HeadSummary, capture_graph};
use crawlq_core::{
    CoreError, LoadOptions, Records, SectionStrategy, Sections, UrlRecord, discover_sections,
    load_records,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// Expand a leading `~` in a command-line path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn render<T: Serialize>(format: ReportFormat, value: &T, text: impl FnOnce() -> String) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(text()),
        ReportFormat::Json => Ok(to_json(value)?),
    }
}

fn load(path: &Path, options: LoadOptions) -> Result<Records> {
    let records = load_records(path, options)?;
    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

// ============================================================================
// hash
// ============================================================================

pub struct HashOptions {
    pub files: Vec<PathBuf>,
    pub base_url: Option<Url>,
    pub date: Option<String>,
}

/// URL a hashed file is recorded under: its name joined onto the base URL,
/// or its absolute `file://` URL.
pub fn file_url(path: &Path, base_url: Option<&Url>) -> Result<Url> {
    match base_url {
        Some(base) => {
            let name = path
                .file_name()
                .with_context(|| format!("{} has no file name", path.display()))?;
            Ok(base.join(&name.to_string_lossy())?)
        }
        None => {
            let absolute = fs::canonicalize(path)
                .with_context(|| format!("Failed to resolve {}", path.display()))?;
            Url::from_file_path(&absolute)
                .map_err(|_| anyhow::anyhow!("{} is not a valid file URL", absolute.display()))
        }
    }
}

pub fn handle_hash(options: &HashOptions, format: ReportFormat) -> Result<String> {
    let mut records = Vec::with_capacity(options.files.len());
    for path in &options.files {
        let payload =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let url = file_url(path, options.base_url.as_ref())?;
        match UrlRecord::from_html(url.as_str(), 200, options.date.clone(), &payload) {
            Ok(record) => records.push(record),
            Err(CoreError::Fingerprint(e)) => warn!("Skipping {}: {}", path.display(), e),
            Err(e) => return Err(e.into()),
        }
    }

    render(format, &records, || {
        records
            .iter()
            .map(|r| format!("{}\n", r.to_record_line()))
            .collect()
    })
}

// ============================================================================
// distances / redundancy / diversity / overlap
// ============================================================================

#[derive(Serialize)]
struct DistancesReport {
    changes: ChangeProportion,
    distances: Vec<PageDistance>,
}

pub fn handle_distances(
    first: &Path,
    second: &Path,
    threshold: u32,
    format: ReportFormat,
) -> Result<String> {
    let first = fingerprint_filter(&load(first, LoadOptions::default())?);
    let second = fingerprint_filter(&load(second, LoadOptions::default())?);
    let distances = distances_same_key(&first, &second)?;
    let report = DistancesReport {
        changes: ChangeProportion::from_distances(&distances, threshold),
        distances,
    };

    render(format, &report, || {
        let mut text = generate_distances_report(&report.distances);
        text.push_str(&generate_change_report(&report.changes));
        text
    })
}

pub fn handle_redundancy(path: &Path, format: ReportFormat) -> Result<String> {
    let records = load(path, LoadOptions::default())?;
    let distribution = exact_duplicate_distribution(records.values());
    render(format, &distribution, || generate_redundancy_report(&distribution))
}

pub fn handle_diversity(path: &Path, format: ReportFormat) -> Result<String> {
    let records = load(path, LoadOptions::default())?;
    let diversity = diversity(records.values())?;
    render(format, &diversity, || generate_diversity_report(&diversity))
}

pub fn handle_overlap(first: &Path, second: &Path, format: ReportFormat) -> Result<String> {
    let first = load(first, LoadOptions::default())?;
    let second = load(second, LoadOptions::default())?;
    let overlap = capture_overlap(first.values(), second.values())?;
    render(format, &overlap, || generate_overlap_report(&overlap))
}

// ============================================================================
// Graph commands
// ============================================================================

/// A capture read as a link graph.
pub struct GraphOptions {
    pub records: PathBuf,
    pub edges: Option<PathBuf>,
    pub domain: Option<String>,
}

impl GraphOptions {
    fn edges(&self) -> &Path {
        self.edges.as_deref().unwrap_or(&self.records)
    }

    fn domain_for(&self, strategy: SectionStrategy) -> Result<&str> {
        match (&self.domain, strategy.uses_graph()) {
            (Some(domain), _) => Ok(domain.as_str()),
            (None, false) => Ok(""),
            (None, true) => bail!("--domain is required by the {} strategy", strategy.as_str()),
        }
    }
}

#[derive(Serialize)]
struct IndegreeReport {
    distribution: IndegreeDistribution,
    pages: Vec<PageIndegree>,
}

pub fn handle_indegree(
    options: &GraphOptions,
    all_types: bool,
    progress: Option<ProgressCallback>,
    format: ReportFormat,
) -> Result<String> {
    let records = load(&options.records, LoadOptions::sections())?;
    let (graph, _) = capture_graph(&records, options.edges(), options.domain.as_deref(), progress)?;
    let mime_filter = (!all_types).then_some(HTML_MIME_PREFIX);
    let counts = indegrees(&graph, mime_filter);
    let report = IndegreeReport {
        distribution: IndegreeDistribution::new(&graph, &counts, &records),
        pages: indegree_listing(&graph, &counts),
    };

    render(format, &report, || {
        let mut text = generate_indegree_distribution_report(&report.distribution);
        text.push_str(&generate_indegree_report(&report.pages));
        text
    })
}

fn sections_of(
    options: &GraphOptions,
    strategy: SectionStrategy,
    progress: Option<ProgressCallback>,
) -> Result<Sections> {
    let domain = options.domain_for(strategy)?;
    let sections = discover_sections(
        &options.records,
        options.edges.as_deref(),
        domain,
        strategy,
        progress,
    )
    .with_context(|| format!("Failed to find the sections of {}", options.records.display()))?;
    Ok(sections)
}

pub fn handle_sections(
    options: &GraphOptions,
    strategy: SectionStrategy,
    progress: Option<ProgressCallback>,
    format: ReportFormat,
) -> Result<String> {
    let sections = sections_of(options, strategy, progress)?;
    render(format, &sections, || generate_sections_report(&sections))
}

#[derive(Serialize)]
struct SectionDiversityReport<'a> {
    strategy: SectionStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    heads: Option<&'a HeadSummary>,
    sections: &'a [SectionDiversity],
}

pub fn handle_section_diversity(
    options: &GraphOptions,
    strategy: SectionStrategy,
    progress: Option<ProgressCallback>,
    format: ReportFormat,
) -> Result<String> {
    let sections = sections_of(options, strategy, progress)?;
    let diversity = section_diversity(&sections.members)?;
    let report = SectionDiversityReport {
        strategy: sections.strategy,
        heads: sections.heads.as_ref(),
        sections: &diversity,
    };
    render(format, &report, || {
        generate_section_diversity_report(&sections, &diversity)
    })
}

#[derive(Serialize)]
struct SectionDistancesReport {
    strategy: SectionStrategy,
    sections: Vec<SectionChanges>,
}

pub fn handle_section_distances(
    first: &GraphOptions,
    second: &GraphOptions,
    strategy: SectionStrategy,
    threshold: u32,
    progress: Option<ProgressCallback>,
    format: ReportFormat,
) -> Result<String> {
    let first = sections_of(first, strategy, progress.clone())?;
    let second = sections_of(second, strategy, progress)?;
    let report = SectionDistancesReport {
        strategy,
        sections: section_distances(&first.members, &second.members, threshold)?,
    };
    render(format, &report, || generate_section_changes_report(&report.sections))
}

/// True when the error chain holds an allocation failure.
pub fn is_out_of_memory(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<CoreError>()
            .is_some_and(CoreError::is_resource_exhaustion)
    })
}
