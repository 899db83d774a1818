// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tracing_core::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use super::try_create_layers;
use crate::ok;

/// Where log output goes. A raw mode REPL owns stdout, so the `repl` binary only ever
/// picks [`WriterConfig::File`] or [`WriterConfig::None`]; display writers are for
/// tests and for hosts that embed the engine without a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterConfig {
    None,
    Display(DisplayPreference),
    File(String),
    DisplayAndFile(DisplayPreference, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPreference {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub writer_config: WriterConfig,
    pub level_filter: LevelFilter,
}

impl TracingConfig {
    #[must_use]
    pub fn new_file(path: impl Into<String>, level_filter: LevelFilter) -> Self {
        Self {
            writer_config: WriterConfig::File(path.into()),
            level_filter,
        }
    }

    #[must_use]
    pub fn get_level_filter(&self) -> LevelFilter { self.level_filter }

    #[must_use]
    pub fn get_writer_config(&self) -> WriterConfig { self.writer_config.clone() }

    /// Install the layers as the global default subscriber. Does nothing for
    /// [`WriterConfig::None`].
    ///
    /// # Errors
    ///
    /// Returns an error if the log file can't be created, or if a global subscriber has
    /// already been installed.
    pub fn try_initialize_logging_global(self) -> miette::Result<()> {
        if self.writer_config == WriterConfig::None {
            return ok!();
        }
        if let Some(layers) = try_create_layers(self)? {
            tracing_subscriber::registry()
                .with(layers)
                .try_init()
                .map_err(|err| miette::miette!("Failed to install tracing: {err}"))?;
        }
        ok!()
    }

    /// Install the layers for the current thread only, until the returned guard is
    /// dropped. Useful in tests, where a global subscriber can only be set once per
    /// process.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file can't be created.
    pub fn install_thread_local(
        self,
    ) -> miette::Result<Option<tracing::subscriber::DefaultGuard>> {
        Ok(try_create_layers(self)?.map(|layers| {
            tracing::subscriber::set_default(tracing_subscriber::registry().with(layers))
        }))
    }
}
