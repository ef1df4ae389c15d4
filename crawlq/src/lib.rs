// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    GraphOptions, HashOptions, expand_path, file_url, handle_distances, handle_diversity,
    handle_hash, handle_indegree, handle_overlap, handle_redundancy, handle_section_distances,
    handle_section_diversity, handle_sections, is_out_of_memory,
};

// Re-export report types from crawlq-core
pub use crawlq_core::report::{ReportFormat, save_report};
pub use crawlq_core::sections::SectionStrategy;
