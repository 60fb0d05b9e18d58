use log::LevelFilter;

#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

/// `0` -> info, `1` -> debug, `2+` -> trace.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install process-wide logging once.
///
/// With the `tracing` feature `log` records are forwarded into a `tracing`
/// subscriber (`RUST_LOG` wins over `verbose`), optionally as JSON lines.
/// Otherwise the plain stderr logger from the core crate is used.
pub fn init_logging(verbose: u8, json: bool) -> Result<(), log::SetLoggerError> {
    let level = level_for_verbosity(verbose);
    #[cfg(feature = "tracing")]
    {
        // already installed when several commands share a process
        let _ = LogTracer::init();
        dobot_vision_core::init_tracing(json, level);
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        dobot_vision_core::init_with_level(level)?;
        if json {
            log::warn!("JSON logs need the `tracing` feature; using plain output");
        }
        Ok(())
    }
}
