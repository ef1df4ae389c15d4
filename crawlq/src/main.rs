use clap::ArgMatches;
use clap::error::ErrorKind;
use colored::Colorize;
use commands::command_argument_builder;
use crawlq::handlers::*;
use crawlq::{ReportFormat, SectionStrategy, save_report};
use crawlq_core::graph::{BuildStats, ProgressCallback};
use crawlq_core::print_banner;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;

const EXIT_FAILURE: i32 = 1;
const EXIT_OUT_OF_MEMORY: i32 = 3;

fn main() {
    let mut cmd = command_argument_builder();
    let chosen_command = cmd.get_matches_mut();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");

    init_tracing(quiet, verbose);

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let Some((name, sub_matches)) = chosen_command.subcommand() else {
        // No subcommand provided, just show the banner
        return;
    };

    if let Some(strategy) = strategy_of(sub_matches)
        && strategy.uses_graph()
        && sub_matches.get_one::<String>("domain").is_none()
    {
        cmd.error(
            ErrorKind::MissingRequiredArgument,
            format!("--domain is required by the {} strategy", strategy.as_str()),
        )
        .exit();
    }

    let format = chosen_command
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output = chosen_command.get_one::<String>("output").map(|p| expand_path(p));

    let spinner = (!quiet && uses_graph(name)).then(new_spinner);
    let progress = spinner.as_ref().map(progress_callback);

    let result = match name {
        "hash" => handle_hash(&hash_options(sub_matches), format),
        "distances" => handle_distances(
            &path_arg(sub_matches, "FIRST"),
            &path_arg(sub_matches, "SECOND"),
            threshold_of(sub_matches),
            format,
        ),
        "redundancy" => handle_redundancy(&path_arg(sub_matches, "RECORDS"), format),
        "diversity" => handle_diversity(&path_arg(sub_matches, "RECORDS"), format),
        "overlap" => handle_overlap(
            &path_arg(sub_matches, "FIRST"),
            &path_arg(sub_matches, "SECOND"),
            format,
        ),
        "indegree" => handle_indegree(
            &graph_options(sub_matches, "RECORDS", "edges"),
            sub_matches.get_flag("all-types"),
            progress,
            format,
        ),
        "sections" => handle_sections(
            &graph_options(sub_matches, "RECORDS", "edges"),
            strategy_of(sub_matches).unwrap_or_default(),
            progress,
            format,
        ),
        "section-diversity" => handle_section_diversity(
            &graph_options(sub_matches, "RECORDS", "edges"),
            strategy_of(sub_matches).unwrap_or_default(),
            progress,
            format,
        ),
        "section-distances" => handle_section_distances(
            &graph_options(sub_matches, "FIRST", "first-edges"),
            &graph_options(sub_matches, "SECOND", "second-edges"),
            strategy_of(sub_matches).unwrap_or_default(),
            threshold_of(sub_matches),
            progress,
            format,
        ),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }

    let result = result.and_then(|report| match &output {
        Some(path) => {
            save_report(&report, path)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
            if !quiet {
                eprintln!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
            Ok(())
        }
        None => {
            print!("{}", report);
            Ok(())
        }
    });

    if let Err(e) = result {
        if is_out_of_memory(&e) {
            eprintln!("{} Out of memory: {:#}", "✗".red().bold(), e);
            std::process::exit(EXIT_OUT_OF_MEMORY);
        }
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(EXIT_FAILURE);
    }
}

fn init_tracing(quiet: bool, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn uses_graph(command: &str) -> bool {
    matches!(
        command,
        "indegree" | "sections" | "section-diversity" | "section-distances"
    )
}

fn new_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Loading link graph");
    spinner
}

fn progress_callback(spinner: &ProgressBar) -> ProgressCallback {
    let spinner = spinner.clone();
    Arc::new(move |stats: &BuildStats| {
        spinner.set_message(format!(
            "Loading link graph: {} lines, {} vertices, {} edges",
            stats.lines, stats.vertices, stats.edges
        ));
    })
}

// Argument helpers

fn path_arg(args: &ArgMatches, name: &str) -> PathBuf {
    args.get_one::<String>(name)
        .map(|p| expand_path(p))
        .unwrap_or_default()
}

fn threshold_of(args: &ArgMatches) -> u32 {
    args.get_one::<u32>("threshold")
        .copied()
        .unwrap_or(crawlq_core::config::CHANGE_THRESHOLD)
}

fn strategy_of(args: &ArgMatches) -> Option<SectionStrategy> {
    args.try_get_one::<String>("strategy")
        .ok()
        .flatten()
        .and_then(|s| SectionStrategy::from_str(s))
}

fn graph_options(args: &ArgMatches, records: &str, edges: &str) -> GraphOptions {
    GraphOptions {
        records: path_arg(args, records),
        edges: args.get_one::<String>(edges).map(|p| expand_path(p)),
        domain: args.get_one::<String>("domain").cloned(),
    }
}

fn hash_options(args: &ArgMatches) -> HashOptions {
    HashOptions {
        files: args
            .get_many::<PathBuf>("FILES")
            .map(|files| files.map(|f| expand_path(&f.to_string_lossy())).collect())
            .unwrap_or_default(),
        base_url: args.get_one::<Url>("base-url").cloned(),
        date: args.get_one::<String>("date").cloned(),
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
