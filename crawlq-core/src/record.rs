// Capture records: one per captured resource, keyed by URL

use crate::config::{ERROR_STATUS, HTML_MIME_PREFIX, IMAGE_MIME_PREFIX};
use crate::error::{CoreError, Result};
use crawlq_simhash::{Fingerprint, breadcrumb_section, decode_html, fingerprint_document};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

/// Records of one capture, keyed by URL.
pub type Records = BTreeMap<String, UrlRecord>;

/// Section head URL -> records of the section members.
pub type SectionRecords = BTreeMap<String, Records>;

const KEY_STATUS: &str = "status";
const KEY_MIME: &str = "tika_mime_t";
const KEY_LOCATION: &str = "location";
const KEY_MD5: &str = "md5";
const KEY_SIMHASH: &str = "simhash_v1_3";
const KEY_SIMHASH_BOILERPLATE: &str = "simhash_v1_3_snacktory";
const KEY_SECTION: &str = "section";
const NULL_VALUE: &str = "null";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub url: String,
    /// Capture date as written by the extractor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub http_status: u16,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_target: Option<String>,
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boilerplate_fingerprint: Option<Fingerprint>,
    /// Section head URL guessed from the page breadcrumb.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_label: Option<String>,
}

impl UrlRecord {
    pub fn is_html(&self) -> bool {
        self.mime_type.starts_with(HTML_MIME_PREFIX)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with(IMAGE_MIME_PREFIX)
    }

    pub fn is_error(&self) -> bool {
        self.http_status >= ERROR_STATUS
    }

    /// Fingerprint distance to the same page in another capture.
    ///
    /// Uses the full-page fingerprints when both records have one, else the
    /// main-text fingerprints. `None` when the records share neither.
    pub fn distance(&self, other: &UrlRecord) -> Result<Option<u32>> {
        let pair = match (&self.fingerprint, &other.fingerprint) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => match (&self.boilerplate_fingerprint, &other.boilerplate_fingerprint) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            },
        };
        match pair {
            Some((a, b)) => Ok(Some(a.distance(b)?)),
            None => Ok(None),
        }
    }

    /// Hashes a captured HTML page the way the extractor does: MD5 of the raw
    /// payload, page fingerprint and breadcrumb section.
    pub fn from_html(url: &str, http_status: u16, date: Option<String>, payload: &[u8]) -> Result<Self> {
        let html = decode_html(payload)?;
        let fingerprint = fingerprint_document(&html)?;
        let section_label = breadcrumb_section(&html, url)?;
        Ok(UrlRecord {
            url: url.to_string(),
            date,
            http_status,
            mime_type: HTML_MIME_PREFIX.to_string(),
            redirect_target: None,
            content_hash: content_hash(payload),
            fingerprint: Some(fingerprint),
            boilerplate_fingerprint: None,
            section_label,
        })
    }

    /// Renders the record as a tab-separated record-file line.
    pub fn to_record_line(&self) -> String {
        let mut fields = vec![
            self.url.clone(),
            self.date.clone().unwrap_or_else(|| "-".to_string()),
            format!("{}:{}", KEY_MIME, self.mime_type),
            format!("{}:{}", KEY_MD5, self.content_hash),
            format!("{}:{}", KEY_STATUS, self.http_status),
            format!("{}:{}", KEY_LOCATION, opt_or_null(self.redirect_target.as_deref())),
        ];
        if self.is_html() {
            fields.push(format!(
                "{}:{}",
                KEY_SIMHASH,
                opt_or_null(self.fingerprint.map(|f| f.to_string()).as_deref())
            ));
            fields.push(format!(
                "{}:{}",
                KEY_SIMHASH_BOILERPLATE,
                opt_or_null(self.boilerplate_fingerprint.map(|f| f.to_string()).as_deref())
            ));
            fields.push(format!(
                "{}:{}",
                KEY_SECTION,
                opt_or_null(self.section_label.as_deref())
            ));
        }
        fields.join("\t")
    }
}

fn opt_or_null(value: Option<&str>) -> &str {
    value.unwrap_or(NULL_VALUE)
}

/// Lower-case hex MD5 of a payload, without leading zeros.
pub fn content_hash(payload: &[u8]) -> String {
    let hex = format!("{:x}", md5::compute(payload));
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Which records to keep while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Drop records with an error status (>= 400).
    pub skip_error_status: bool,
    /// Keep only HTML records, excluding `.js` and `.css` URLs.
    pub only_html: bool,
}

impl LoadOptions {
    /// The options used by every section command.
    pub fn sections() -> Self {
        LoadOptions {
            skip_error_status: true,
            only_html: true,
        }
    }

    fn keeps(&self, record: &UrlRecord) -> bool {
        if self.skip_error_status && record.is_error() {
            return false;
        }
        if self.only_html {
            if !record.is_html() {
                return false;
            }
            let path = match Url::parse(&record.url) {
                Ok(url) => url.path().to_lowercase(),
                Err(e) => {
                    warn!("Could not parse URL {}: {}", record.url, e);
                    String::new()
                }
            };
            if path.ends_with(".js") || path.ends_with(".css") {
                return false;
            }
        }
        true
    }
}

fn optional_value(kvs: &HashMap<&str, &str>, key: &str) -> Option<String> {
    kvs.get(key)
        .filter(|v| **v != NULL_VALUE)
        .map(|v| v.to_string())
}

fn optional_fingerprint(kvs: &HashMap<&str, &str>, key: &str, url: &str) -> Option<Fingerprint> {
    let value = kvs.get(key).filter(|v| **v != NULL_VALUE)?;
    match value.parse::<Fingerprint>() {
        Ok(fp) => Some(fp),
        Err(e) => {
            warn!("Ignoring {} of {}: {}", key, url, e);
            None
        }
    }
}

/// Parses one record-file line.
///
/// Returns `Ok(None)` for lines that are not records (outlink lines of a
/// combined file), and an error for lines that look like records but are
/// missing required fields.
pub fn parse_record_line(line_number: usize, line: &str) -> Result<Option<UrlRecord>> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 2 || fields[1] == "->" {
        return Ok(None);
    }
    let invalid = |reason: String| CoreError::InvalidRecord {
        line: line_number,
        reason,
    };

    let mut kvs: HashMap<&str, &str> = HashMap::new();
    for field in &fields[2..] {
        let (key, value) = field
            .split_once(':')
            .ok_or_else(|| invalid(format!("field without a key: {:?}", field)))?;
        kvs.insert(key, value);
    }

    let url = fields[0].to_string();
    let http_status = kvs
        .get(KEY_STATUS)
        .ok_or_else(|| invalid(format!("missing {}", KEY_STATUS)))?
        .trim()
        .parse::<u16>()
        .map_err(|e| invalid(format!("bad {}: {}", KEY_STATUS, e)))?;
    let mime_type = kvs
        .get(KEY_MIME)
        .ok_or_else(|| invalid(format!("missing {}", KEY_MIME)))?
        .to_string();
    // records without a digest all group together as one exact-duplicate set
    let content_hash = kvs.get(KEY_MD5).map(|v| v.to_string()).unwrap_or_default();

    let mut record = UrlRecord {
        date: Some(fields[1].to_string()).filter(|d| !d.is_empty()),
        http_status,
        mime_type,
        redirect_target: optional_value(&kvs, KEY_LOCATION),
        content_hash,
        fingerprint: optional_fingerprint(&kvs, KEY_SIMHASH, &url),
        boilerplate_fingerprint: optional_fingerprint(&kvs, KEY_SIMHASH_BOILERPLATE, &url),
        section_label: optional_value(&kvs, KEY_SECTION),
        url,
    };

    if !record.is_html() && (record.fingerprint.is_some() || record.boilerplate_fingerprint.is_some()) {
        debug!("Dropping fingerprints of non-HTML record {}", record.url);
        record.fingerprint = None;
        record.boilerplate_fingerprint = None;
    }
    Ok(Some(record))
}

/// Reads records from a record-file stream. Malformed lines are skipped; a
/// URL seen twice keeps its last record.
pub fn read_records<R: BufRead>(reader: R, options: LoadOptions) -> Result<Records> {
    let mut records = Records::new();
    let mut skipped = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_record_line(idx + 1, &line) {
            Ok(Some(record)) => {
                if options.keeps(&record) {
                    records.insert(record.url.clone(), record);
                }
            }
            Ok(None) => {}
            Err(e) => {
                skipped += 1;
                debug!("Skipping line: {}", e);
            }
        }
    }
    if skipped > 0 {
        warn!("Skipped {} malformed record lines", skipped);
    }
    Ok(records)
}

/// Loads the records of one capture from a record file.
pub fn load_records(path: &Path, options: LoadOptions) -> Result<Records> {
    let file = File::open(path).map_err(|e| CoreError::io(path, e))?;
    let records = read_records(BufReader::new(file), options).map_err(|e| match e {
        CoreError::IoError(source) => CoreError::io(path, source),
        other => other,
    })?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}
