use anyhow::{anyhow, Result};
use colored::Colorize;
use crawlpilot_client::{CrawlResponse, ExportFormat, ScrapeClient};
use crawlpilot_core::export::{generate_export, load_session, save_export, LocalFormat};
use crawlpilot_core::html::{render_error_html, render_results_html};
use crawlpilot_core::text::{
    render_results_colored, render_results_json, render_results_text, sanitize_terminal,
};
use crawlpilot_core::{FormController, FormState};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// How `scrape` prints its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Html,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "html" => Some(OutputFormat::Html),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub download: Option<ExportFormat>,
    pub quiet: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            output: None,
            save: None,
            download: None,
            quiet: false,
        }
    }
}

/// Expand `~` in a path argument.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn build_controller(server: &str, timeout_secs: u64, download_dir: &Path) -> Result<FormController> {
    let client = ScrapeClient::with_timeout(server, timeout_secs)?;
    info!("Using scraping service at {}", client.base_url());
    Ok(FormController::new(client, download_dir))
}

pub fn form_from_args(
    url: &str,
    instructions: &str,
    depth: u32,
    max_pages: u32,
    follow_external_links: bool,
) -> FormState {
    FormState::new(url)
        .with_instructions(instructions)
        .with_depth(depth)
        .with_max_pages(max_pages)
        .with_follow_external_links(follow_external_links)
}

/// Render a crawl result for display. `color` only affects text output.
pub fn render_output(
    response: &CrawlResponse,
    max_pages: u32,
    format: OutputFormat,
    color: bool,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Text if color => render_results_colored(response, max_pages, true),
        OutputFormat::Text => render_results_text(response, max_pages, true),
        OutputFormat::Html => render_results_html(response, max_pages),
        OutputFormat::Json => render_results_json(response)?,
    })
}

pub fn write_output(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Failed to create {}: {}", parent.display(), e))?;
    }
    fs::write(path, content).map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))
}

/// The message printed for a failed command, with server-supplied control
/// characters removed.
pub fn error_message(error: &anyhow::Error) -> String {
    sanitize_terminal(&error.to_string())
}

fn busy_spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.to_string());
    spinner
}

fn report(quiet: bool, message: String) {
    if !quiet {
        eprintln!("{} {}", "✓".green().bold(), message);
    }
}

/// Run one crawl and print, save or download its results as requested.
pub async fn handle_scrape(
    controller: &FormController,
    form: &FormState,
    options: &ScrapeOptions,
) -> Result<()> {
    let spinner = busy_spinner("Scraping...", options.quiet);
    let result = controller.submit_crawl(form).await;
    spinner.finish_and_clear();
    let session = match result {
        Ok(session) => session,
        Err(e) => {
            // An HTML target gets the error block in place of results
            if options.format == OutputFormat::Html {
                let block = render_error_html(&e.to_string());
                match &options.output {
                    Some(path) => write_output(&block, path)?,
                    None => println!("{}", sanitize_terminal(&block)),
                }
            }
            return Err(e.into());
        }
    };

    let to_screen = options.output.is_none();
    let rendered = render_output(
        &session.response,
        session.request.max_pages,
        options.format,
        to_screen,
    )?;

    match &options.output {
        Some(path) => {
            write_output(&rendered, path)?;
            report(options.quiet, format!("Results written to {}", path.display()));
        }
        None => print!("{}", rendered),
    }

    if let Some(path) = &options.save {
        let content = generate_export(&session, LocalFormat::from_path(path))?;
        save_export(&content, path)
            .map_err(|e| anyhow!("Failed to save session to {}: {}", path.display(), e))?;
        report(options.quiet, format!("Session saved to {}", path.display()));
    }

    if let Some(format) = options.download {
        download(controller, format, options.quiet).await?;
    }

    Ok(())
}

/// Load a session written by `scrape --save` and request a server export of it.
pub async fn handle_download(
    controller: &FormController,
    from: &Path,
    format: ExportFormat,
    quiet: bool,
) -> Result<PathBuf> {
    let content = fs::read_to_string(from)
        .map_err(|e| anyhow!("Failed to read session file {}: {}", from.display(), e))?;
    let session = load_session(&content)
        .map_err(|e| anyhow!("{} is not a saved crawl session: {}", from.display(), e))?;

    info!(
        "Loaded session for {} with {} page(s)",
        session.request.url,
        session.response.data.len()
    );
    controller.restore_session(session);

    download(controller, format, quiet).await
}

async fn download(controller: &FormController, format: ExportFormat, quiet: bool) -> Result<PathBuf> {
    let spinner = busy_spinner(&format!("Downloading {} export...", format.as_str()), quiet);
    let result = controller.request_download(format).await;
    spinner.finish_and_clear();

    let path = result?;
    report(quiet, format!("Downloaded {}", path.display()));
    Ok(path)
}
