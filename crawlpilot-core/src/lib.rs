pub mod controller;
pub mod download;
pub mod error;
pub mod export;
pub mod form;
pub mod html;
pub mod text;
pub mod view;

pub use controller::{Action, ActionState, ControllerStatus, CrawlSession, FormController};
pub use error::{ErrorKind, FormError};
pub use form::FormState;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
   ___                    _       _ _       _
  / __\ __ __ ___      __| |_ __ (_) | ___ | |_
 / / | '__/ _` \ \ /\ / /| | '_ \| | |/ _ \| __|
/ /__| | | (_| |\ V  V / | | |_) | | | (_) | |_
\____/_|  \__,_| \_/\_/  |_| .__/|_|_|\___/ \__|
                           |_|
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "  {} {}\n",
        "crawlpilot".bright_white().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
}
