use std::io::IsTerminal;

use argh::FromArgs;
use log::debug;

use crate::shell::Shell;
use crate::utils::config::Config;
use crate::utils::log::init_logger;
use crate::utils::theme::load_theme;

mod shell;
mod utils;

#[derive(FromArgs)]
/// A small shell: pipes, `;` and `&` sequencing, `( )` grouping, and `<`, `>`,
/// `>>` redirection.
struct Args {
    /// run a single command line and exit with its status
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// longest accepted input line in bytes (overrides FORKSH_MAX_LINE)
    #[argh(option)]
    max_line: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = argh::from_env();

    let mut config = Config::new();
    if let Some(max_line) = args.max_line.filter(|n| *n > 0) {
        config.max_line = max_line;
    }
    init_logger(&config);
    debug!("配置加载成功 {}", config.config_dir.display());

    let theme = load_theme(&config.theme);
    let status = match args.command {
        Some(line) => Shell::new(&config, theme, false)?.run_line(&line),
        None => {
            let interactive = std::io::stdin().is_terminal();
            Shell::new(&config, theme, interactive)?.run()?
        }
    };

    std::process::exit(status)
}
