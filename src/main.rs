// src/main.rs
use clap::Parser;
use crossterm::style::Stylize;
use kbimport::cli::args::Cli;
use kbimport::cli::execute_command;
use kbimport::config::load_settings;
use kbimport::exitcode;
use tracing::{debug, info, instrument};
use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    fmt::{self, format::FmtSpan},
    prelude::*,
};

#[instrument]
fn main() {
    let cli = Cli::parse();
    let no_color = cli.no_color;

    setup_logging(cli.debug, no_color);

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            print_error(&format!("Failed to load settings: {}", e), no_color);
            std::process::exit(exitcode::USAGE);
        }
    };
    debug!("Settings: {:?}", settings);

    if let Err(e) = execute_command(cli, &settings) {
        print_error(&format!("Error: {}", e), no_color);
        std::process::exit(e.exit_code());
    }
    std::process::exit(exitcode::SUCCESS);
}

fn print_error(message: &str, no_color: bool) {
    if no_color {
        eprintln!("{}", message);
    } else {
        eprintln!("{}", message.red());
    }
}

fn setup_logging(verbosity: u8, no_color: bool) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // parser internals are far too chatty below WARN
    let noisy_modules = ["html5ever", "selectors", "zip", "markup5ever"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(!no_color)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    tracing_subscriber::registry().with(filtered_layer).init();

    match filter {
        LevelFilter::INFO => info!("Debug mode: info"),
        LevelFilter::DEBUG => debug!("Debug mode: debug"),
        LevelFilter::TRACE => debug!("Debug mode: trace"),
        _ => {}
    }
}
