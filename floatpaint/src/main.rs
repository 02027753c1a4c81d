#![warn(clippy::pedantic)]

pub mod config;
pub mod script;

use anyhow::Result as AnyResult;

const USAGE: &str = "usage: floatpaint <script.toml> [config.toml]
       floatpaint --write-config";

fn main() -> AnyResult<()> {
    let mut args = std::env::args_os().skip(1);
    let Some(first) = args.next() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    let config_path = args.next().map(std::path::PathBuf::from);
    let (config, config_err) = config::Config::load_or_default(config_path.as_deref());

    let has_term = std::io::IsTerminal::is_terminal(&std::io::stderr());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(config.log_level.into())
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", config.log_level.into());
    }
    if let Some(err) = config_err {
        log::warn!("Using default settings:\n{err:?}");
    }

    if first == "--write-config" {
        config.save()?;
        log::info!("Wrote settings to {:?}", config::Config::default_path());
        return Ok(());
    }

    let script = script::Script::load(std::path::Path::new(&first))?;
    let mut document = floatpaint_core::state::Document::new(
        config.canvas_size(),
        config.canvas_color(),
        config.selection.into(),
    )?;
    log::info!(
        "Running {} steps on a {} canvas",
        script.steps.len(),
        config.canvas_size()
    );
    let result = script.run(&mut document, config.canvas_color());
    // Report what we got to, even on failure.
    print!("{}", script::report(&document));
    result
}
