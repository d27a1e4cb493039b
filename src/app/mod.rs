use crate::{
    cli::RunOptions,
    config::Config,
    lifecycle::LifecycleController,
    overlay::TerminalOverlay,
    power::{spawn_line_notifier, NeverIdle},
    render::{LayoutSpec, MonospaceMetrics},
    source::SysfsCounter,
    Result,
};
use std::{
    io::{self, BufReader},
    str::FromStr,
    sync::Arc,
};

use crossbeam::channel;

mod logger;
mod render_loop;
mod shutdown;

pub use logger::{LogLevel, Logger};
pub use render_loop::{run_render_loop, RenderContext};
use shutdown::create_shutdown_flag;

/// Config for the daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub density: f32,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            density: crate::config::DEFAULT_DENSITY,
            log_level: LogLevel::default(),
            log_file: None,
        }
    }
}

pub struct App {
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        Logger::new(config.log_level, config.log_file.clone())?.install();
        Ok(Self { config })
    }

    pub fn from_options(opts: RunOptions) -> Result<Self> {
        let cfg_file = Config::load_or_default()?;
        let merged = AppConfig::from_sources(cfg_file, opts)?;
        Self::new(merged)
    }

    /// Entry point for the daemon: overlay on stdout, power events on stdin, ctrl-c to exit.
    pub fn run(&self) -> Result<()> {
        let running = create_shutdown_flag()?;
        let metrics = MonospaceMetrics::for_text_size(LayoutSpec::text_size(self.config.density));
        let host = TerminalOverlay::new(io::stdout(), metrics.glyph_width);
        let counter = SysfsCounter::new();
        log::info!(
            "fpsinfo start (source={}, density={})",
            counter.path().display(),
            self.config.density
        );

        let (mut controller, readings) =
            LifecycleController::new(Arc::new(counter), NeverIdle, host);
        let (events_tx, events_rx) = channel::unbounded();
        // Detached: a blocked stdin read must not hold up shutdown.
        let _notifier = spawn_line_notifier(BufReader::new(io::stdin()), events_tx)?;

        controller.start()?;
        let mut context = RenderContext::new(self.config.density, metrics);
        run_render_loop(
            &mut controller,
            &readings,
            &mut context,
            &events_rx,
            &running,
        );
        log::info!("fpsinfo exit");
        Ok(())
    }
}

impl AppConfig {
    /// CLI values win over the config file.
    pub fn from_sources(config: Config, opts: RunOptions) -> Result<Self> {
        let log_level = match opts.log_level.or(config.log_level) {
            Some(raw) => LogLevel::from_str(&raw)?,
            None => LogLevel::default(),
        };
        Ok(Self {
            density: opts.density.unwrap_or(config.density),
            log_level,
            log_file: opts.log_file.or(config.log_file),
        })
    }
}
