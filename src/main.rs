//! wellformed - command-line front-end.
//!
//! Parses the configuration, builds the module registry and the selected
//! output handler, and drives the dispatcher over the input paths.

use std::io::Write;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wellformed::{
    config::Config, App, Dispatcher, FormatModule, JsonHandler, OutputHandler, ParseOptions,
    TextHandler, TiffModule,
};

const APP: App = App {
    name: "wellformed",
    release: env!("CARGO_PKG_VERSION"),
    date: "2026-02-12",
};

fn main() {
    let config = Config::parse();

    init_logging(config.debug);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let mut handler = match build_handler(&config) {
        Ok(handler) => handler,
        Err(e) => {
            error!("Cannot open output: {}", e);
            std::process::exit(1);
        }
    };

    let mut dispatcher = build_dispatcher(&config);

    handler.show_header();
    handler.show_app(&APP);
    for path in &config.paths {
        dispatcher.process(path, handler.as_mut());
    }
    handler.show_footer();
    handler.close();
}

/// Initialize the tracing/logging subsystem.
fn init_logging(debug: bool) {
    let env_filter = if debug {
        "wellformed=debug"
    } else {
        "wellformed=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build the selected output handler over stdout or the requested file.
fn build_handler(config: &Config) -> std::io::Result<Box<dyn OutputHandler>> {
    let writer: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    Ok(match config.handler.as_str() {
        "json" => Box::new(JsonHandler::new(writer)),
        _ => Box::new(TextHandler::new(writer)),
    })
}

/// Build the dispatcher: module registry, options, checksums, pinning.
fn build_dispatcher(config: &Config) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();

    let mut tiff = TiffModule::new();
    for parameter in &config.param {
        tiff.set_parameter(parameter);
    }
    dispatcher.register(Box::new(tiff));

    let options = ParseOptions {
        raw: config.raw,
        verbose: config.verbose,
        suppress_errors: config.suppress_errors,
        ..ParseOptions::default()
    };
    dispatcher.set_options(options);

    // validate() already vetted the names.
    dispatcher.set_checksums(config.checksum_algorithms().unwrap_or_default());
    dispatcher.set_signature_only(config.signature);
    dispatcher.set_pinned_module(config.module.clone());

    dispatcher
}
