use clap::error::ErrorKind;
use clap::Parser;

mod app_bootstrap;
mod cli;
mod logging;
mod output;
mod settings;
mod settings_io;

fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if let Err(e) = app_bootstrap::run(cli) {
        eprintln!("framegrab: error: {:#}", e);
        std::process::exit(1);
    }
}
