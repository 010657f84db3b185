use log::LevelFilter;
use env_logger::{Builder, Env};
use std::io::Write;
use chrono::Local;

/// Level for a `-v` count: info by default, debug for one, trace beyond.
pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the process-wide logger. `RUST_LOG`, when set, wins over `verbose`.
pub fn init(verbose: u8) {
    let default = level_for(verbose).to_string().to_lowercase();
    Builder::from_env(Env::default().default_filter_or(default))
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    log::debug!("Logger initialized.");
}
