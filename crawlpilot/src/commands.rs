use crate::CLAP_STYLING;
use clap::{arg, command};
use crawlpilot_client::DEFAULT_SERVER;
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("crawlpilot")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("crawlpilot")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and progress output").required(false))
        .arg(arg!(-v --"verbose" "Log requests and responses to stderr").required(false))
        .arg(
            arg!(--"server" <URL>)
                .required(false)
                .global(true)
                .help("Base URL of the scraping service")
                .value_parser(clap::value_parser!(Url))
                .default_value(DEFAULT_SERVER),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .global(true)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("300"),
        )
        .subcommand_required(false)
        .subcommand(
            command!("scrape")
                .about(
                    "Crawl a URL through the scraping service and print the extracted \
                content.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL to crawl (http:// is assumed when no scheme is given)"),
                )
                .arg(
                    arg!(-i --"instructions" <TEXT>)
                        .required(false)
                        .help("What the AI extraction should look for")
                        .default_value(""),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("How many links deep to follow (0-5)")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("1"),
                )
                .arg(
                    arg!(-m --"max-pages" <MAX_PAGES>)
                        .required(false)
                        .help("Upper bound on pages crawled (1-100)")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("20"),
                )
                .arg(
                    arg!(--"follow-external")
                        .required(false)
                        .help("Follow links that leave the starting site")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: text, html, json")
                        .value_parser(["text", "html", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Write the rendered results to a file (default: display to screen)"),
                )
                .arg(
                    arg!(--"save" <PATH>)
                        .required(false)
                        .help(
                            "Save the crawl session locally; .md and .txt give readable \
                        exports, anything else is JSON that `download --from` accepts",
                        ),
                )
                .arg(
                    arg!(--"download" <FORMAT>)
                        .required(false)
                        .help("Also ask the server for a downloadable export: json, markdown")
                        .value_parser(["json", "markdown"]),
                )
                .arg(download_dir_arg()),
        )
        .subcommand(
            command!("download")
                .about("Request a server-side export of a saved crawl session")
                .arg(
                    arg!(--"from" <PATH>)
                        .required(true)
                        .help("Session file written by `scrape --save`"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Export format: json, markdown")
                        .value_parser(["json", "markdown"])
                        .default_value("json"),
                )
                .arg(download_dir_arg()),
        )
        .subcommand(
            command!("ui")
                .about("Open the interactive terminal form")
                .arg(download_dir_arg()),
        )
}

fn download_dir_arg() -> clap::Arg {
    arg!(--"download-dir" <DIR>)
        .required(false)
        .help("Directory downloaded exports are saved to")
        .default_value(".")
}
