use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

const STRATEGIES: [&str; 4] = ["basic", "partition", "url-prefix", "breadcrumb"];

fn capture_arg(name: &'static str, help: &'static str) -> clap::Arg {
    clap::Arg::new(name)
        .required(true)
        .help(help)
        .value_parser(clap::value_parser!(String))
}

fn domain_arg() -> clap::Arg {
    arg!(-d --"domain" <DOMAIN>)
        .required(false)
        .help("Domain of the capture, e.g. www.example.org. Required by graph strategies")
}

fn strategy_arg() -> clap::Arg {
    arg!(-s --"strategy" <STRATEGY>)
        .required(false)
        .help("How pages are grouped into sections")
        .value_parser(STRATEGIES)
        .default_value("url-prefix")
}

fn threshold_arg() -> clap::Arg {
    arg!(-t --"threshold" <BITS>)
        .required(false)
        .help("Pages further apart than this many bits count as changed")
        .value_parser(clap::value_parser!(u32))
        .default_value("8")
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("crawlq")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("crawlq")
        .about("Duplication, diversity and section analysis for web crawl captures")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log debug output")
                .required(false)
                .global(true)
                .conflicts_with("quiet"),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Report format")
                .value_parser(["text", "json"])
                .default_value("text")
                .global(true),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Write the report to a file instead of stdout")
                .value_parser(clap::value_parser!(String))
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("hash")
                .about("Fingerprint HTML files and print them as record lines")
                .arg(
                    arg!(<FILES> ...)
                        .required(true)
                        .help("HTML files to hash")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-b --"base-url" <URL>)
                        .required(false)
                        .help("URL the files were captured under; file names are joined onto it")
                        .value_parser(clap::value_parser!(url::Url)),
                )
                .arg(
                    arg!(--"date" <DATE>)
                        .required(false)
                        .help("Capture date written into each record"),
                ),
        )
        .subcommand(
            command!("distances")
                .about("Fingerprint distances of the pages two captures have in common")
                .arg(capture_arg("FIRST", "Record file of the first capture"))
                .arg(capture_arg("SECOND", "Record file of the second capture"))
                .arg(threshold_arg()),
        )
        .subcommand(
            command!("redundancy")
                .about("Exact-duplicate distribution of a capture")
                .arg(capture_arg("RECORDS", "Record file of the capture")),
        )
        .subcommand(
            command!("diversity")
                .about("Share of unique resources in a capture")
                .arg(capture_arg("RECORDS", "Record file of the capture")),
        )
        .subcommand(
            command!("overlap")
                .about("How many unique resources each capture adds to the other")
                .arg(capture_arg("FIRST", "Record file of the first capture"))
                .arg(capture_arg("SECOND", "Record file of the second capture")),
        )
        .subcommand(
            command!("indegree")
                .about("Number of direct links pointing at each page of a capture")
                .arg(capture_arg("RECORDS", "Record file of the capture"))
                .arg(
                    arg!(-e --"edges" <PATH>)
                        .required(false)
                        .help("Outlink list. Defaults to the record file"),
                )
                .arg(domain_arg())
                .arg(
                    arg!(--"all-types" "Count links to every MIME type, not only HTML pages")
                        .required(false),
                ),
        )
        .subcommand(
            command!("sections")
                .about("Split a capture into sections and list their pages")
                .arg(capture_arg("RECORDS", "Record file of the capture"))
                .arg(
                    arg!(-e --"edges" <PATH>)
                        .required(false)
                        .help("Outlink list. Defaults to the record file"),
                )
                .arg(domain_arg())
                .arg(strategy_arg()),
        )
        .subcommand(
            command!("section-diversity")
                .about("Diversity of each section of a capture")
                .arg(capture_arg("RECORDS", "Record file of the capture"))
                .arg(
                    arg!(-e --"edges" <PATH>)
                        .required(false)
                        .help("Outlink list. Defaults to the record file"),
                )
                .arg(domain_arg())
                .arg(strategy_arg()),
        )
        .subcommand(
            command!("section-distances")
                .about("Proportion of changed pages per section between two captures")
                .arg(capture_arg("FIRST", "Record file of the first capture"))
                .arg(capture_arg("SECOND", "Record file of the second capture"))
                .arg(
                    arg!(--"first-edges" <PATH>)
                        .required(false)
                        .help("Outlink list of the first capture. Defaults to its record file"),
                )
                .arg(
                    arg!(--"second-edges" <PATH>)
                        .required(false)
                        .help("Outlink list of the second capture. Defaults to its record file"),
                )
                .arg(domain_arg())
                .arg(strategy_arg())
                .arg(threshold_arg()),
        )
}
