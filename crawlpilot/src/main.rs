use anyhow::{anyhow, Result};
use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use crawlpilot::handlers::{
    build_controller, error_message, expand_path, form_from_args, handle_download, handle_scrape,
    OutputFormat, ScrapeOptions,
};
use crawlpilot_client::ExportFormat;
use crawlpilot_core::print_banner;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbose = chosen_command.get_flag("verbose");
    let interactive = matches!(chosen_command.subcommand(), Some(("ui", _)));

    // The terminal form owns the screen; log lines would tear it
    if !interactive {
        init_logging(verbose);
    }

    // Show banner unless --quiet flag is set
    if !quiet && !interactive {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    if let Err(e) = dispatch(&chosen_command, quiet).await {
        eprintln!("{} {}", "✗".red().bold(), error_message(&e));
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(matches: &ArgMatches, quiet: bool) -> Result<()> {
    let server = matches
        .get_one::<Url>("server")
        .ok_or_else(|| anyhow!("--server is required"))?;
    let timeout = matches.get_one::<u64>("timeout").copied().unwrap_or(300);

    match matches.subcommand() {
        Some(("scrape", args)) => {
            let controller = build_controller(server.as_str(), timeout, &download_dir(args))?;
            let form = form_from_args(
                string_arg(args, "url"),
                string_arg(args, "instructions"),
                args.get_one::<u32>("depth").copied().unwrap_or_default(),
                args.get_one::<u32>("max-pages").copied().unwrap_or_default(),
                args.get_flag("follow-external"),
            );
            let options = ScrapeOptions {
                format: OutputFormat::from_str(string_arg(args, "format"))
                    .unwrap_or(OutputFormat::Text),
                output: args.get_one::<String>("output").map(|p| expand_path(p)),
                save: args.get_one::<String>("save").map(|p| expand_path(p)),
                download: args
                    .get_one::<String>("download")
                    .and_then(|f| ExportFormat::from_str(f)),
                quiet,
            };
            handle_scrape(&controller, &form, &options).await
        }
        Some(("download", args)) => {
            let controller = build_controller(server.as_str(), timeout, &download_dir(args))?;
            let from = expand_path(string_arg(args, "from"));
            let format =
                ExportFormat::from_str(string_arg(args, "format")).unwrap_or(ExportFormat::Json);
            handle_download(&controller, &from, format, quiet).await?;
            Ok(())
        }
        Some(("ui", args)) => {
            let controller = Arc::new(build_controller(
                server.as_str(),
                timeout,
                &download_dir(args),
            )?);
            let handle = tokio::runtime::Handle::current();
            tokio::task::spawn_blocking(move || crawlpilot_tui::run(controller, handle)).await?
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

fn string_arg<'a>(args: &'a ArgMatches, name: &str) -> &'a str {
    args.get_one::<String>(name).map(String::as_str).unwrap_or_default()
}

fn download_dir(args: &ArgMatches) -> std::path::PathBuf {
    expand_path(string_arg(args, "download-dir"))
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
