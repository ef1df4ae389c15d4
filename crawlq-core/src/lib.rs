pub mod assign;
pub mod cluster;
pub mod compare;
pub mod config;
pub mod error;
pub mod graph;
pub mod heads;
pub mod indegree;
pub mod metrics;
pub mod record;
pub mod report;
pub mod sections;

use colored::Colorize;

pub use error::{CoreError, Result};
pub use graph::{BuildStats, EdgeKind, GraphBuilder, WebGraph};
pub use record::{LoadOptions, Records, SectionRecords, UrlRecord, load_records};
pub use sections::{SectionStrategy, Sections, discover_sections};

pub fn print_banner() {
    let banner = r#"
                        _
   ___ _ __ __ ___      _| | __ _
  / __| '__/ _` \ \ /\ / / |/ _` |
 | (__| | | (_| |\ V  V /| | (_| |
  \___|_|  \__,_| \_/\_/ |_|\__, |
                               |_|"#;
    eprintln!("{}", banner.bright_cyan().bold());
    eprintln!(
        "  {} {}\n",
        "crawl capture quality".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
