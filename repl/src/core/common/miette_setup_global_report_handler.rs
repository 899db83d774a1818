// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Install a global [miette](https://docs.rs/miette/latest/miette/index.html) report
//! handler for the `repl` binary.
//!
//! The [`miette::ErrorHook`] is lazily evaluated: the hook only runs when a
//! [`miette::Report`] is actually displayed, i.e. when `main() -> miette::Result<_>`
//! returns an error. So the terminal width is measured just before the report is printed,
//! and if no error ever occurs it is never measured at all.

use miette::MietteHandlerOpts;
use tracing::debug;

pub const DEFAULT_REPORT_WIDTH: u16 = 80;

pub fn setup_default_miette_global_report_handler(issues_url: &'static str) {
    miette::set_hook(Box::new(|_report| {
        let terminal_width = {
            let it = crossterm::terminal::size()
                .map(|(columns, _rows)| columns)
                .unwrap_or(DEFAULT_REPORT_WIDTH) as usize;
            debug!("miette::set_hook -> terminal_width: {}", it);
            it
        };
        Box::new(
            MietteHandlerOpts::new()
                .width(terminal_width)
                .wrap_lines(true)
                .force_graphical(true)
                .unicode(true)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .with_cause_chain()
                .footer(issues_url.to_string())
                .build(),
        )
    }))
    .ok();
}
