// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use clap::Parser;
use miette::IntoDiagnostic as _;
use r3bl_repl::{CommonResult, EvalState, InputDevice, OutputDevice, RawModeGuard,
                ReferenceEvaluator, Session, StdMutex, TracingConfig, ok, run_repl,
                set_mimalloc_in_main, setup_default_miette_global_report_handler};
use tracing_core::LevelFilter;

use crate::clap_config::CLIArg;

const ISSUES_URL: &str = "https://github.com/r3bl-org/r3bl-open-core/issues/new";

// Note: The `tokio::main` macro internally calls `.expect("Failed building the Runtime")`
// when initializing the Tokio runtime. This is unavoidable and safe, as runtime creation
// failure is a fatal error that should panic. The lint must be suppressed here.
#[tokio::main]
#[allow(clippy::unwrap_in_result)]
async fn main() -> CommonResult<()> {
    set_mimalloc_in_main!();
    setup_default_miette_global_report_handler(ISSUES_URL);

    let cli_arg = CLIArg::parse();

    if cli_arg.global_options.enable_logging {
        let level_filter: LevelFilter =
            cli_arg.global_options.log_level.parse().into_diagnostic()?;
        TracingConfig::new_file(cli_arg.global_options.log_file.clone(), level_filter)
            .try_initialize_logging_global()?;
    }
    tracing::info!(message = "repl starting", ?cli_arg);

    let output_device = OutputDevice::new_stdout();
    let eval_state = Arc::new(StdMutex::new(EvalState::new(output_device.clone())));
    let mut session = Session::try_new(
        cli_arg.to_session_config(),
        Arc::new(ReferenceEvaluator),
        eval_state,
        output_device,
    )?;

    let input_device = InputDevice::try_new_stdin(session.config.channel_capacity)?;
    let raw_mode_guard = RawModeGuard::try_new(false)?;
    let exit_reason = run_repl(&mut session, input_device).await;
    drop(raw_mode_guard);

    tracing::info!(message = "repl exiting", ?exit_reason);
    exit_reason?;
    ok!()
}

mod clap_config {
    use clap::{Args, Parser};
    use r3bl_repl::{CommandPermission, DEFAULT_PROMPT, SessionConfig};

    /// More info: <https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_2/index.html>
    #[derive(Debug, Parser)]
    #[command(bin_name = "repl")]
    #[command(about = "🐚 Interactive line editing REPL for a small scripting language")]
    #[command(version)]
    #[command(next_line_help = true)]
    #[command(arg_required_else_help(false))]
    /// More info: <https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template>
    #[command(
        help_template = "{about}\nVersion: {bin} {version} 💻\n\nUSAGE 📓:\n  repl [\x1b[34moptions\x1b[0m]\n\n[options]\n{options}"
    )]
    pub struct CLIArg {
        #[arg(long, default_value = DEFAULT_PROMPT, help = "Prompt shown before each line")]
        pub prompt: String,

        #[arg(
            long,
            help = "Terminal width in columns. Queried from the terminal when omitted"
        )]
        pub width: Option<usize>,

        #[arg(long, help = "Don't insert the closing bracket when typing `(`, `[` or `{`")]
        pub no_auto_close: bool,

        #[arg(
            long = "trusted",
            value_name = "command",
            help = "Run lines starting with this command as an OS process. Repeatable"
        )]
        pub trusted_commands: Vec<String>,

        #[arg(
            long = "grant",
            value_name = "command chain",
            value_parser = CommandPermission::try_parse,
            help = "Grant a command and subcommand chain, eg: `git log`. Repeatable"
        )]
        pub permissions: Vec<CommandPermission>,

        #[command(flatten)]
        pub global_options: GlobalOption,
    }

    #[derive(Debug, Args)]
    pub struct GlobalOption {
        #[arg(
            global = true,
            long,
            short = 'l',
            help = "Log app output to a file for debugging"
        )]
        pub enable_logging: bool,

        #[arg(global = true, long, default_value = "repl.log", help = "Log file path")]
        pub log_file: String,

        #[arg(
            global = true,
            long,
            default_value = "info",
            help = "One of: off, error, warn, info, debug, trace"
        )]
        pub log_level: String,
    }

    impl CLIArg {
        pub fn to_session_config(&self) -> SessionConfig {
            SessionConfig {
                prompt: self.prompt.clone(),
                terminal_width: self.width,
                auto_close_brackets: !self.no_auto_close,
                trusted_commands: self.trusted_commands.clone(),
                permissions: self.permissions.clone(),
                ..Default::default()
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_grants_and_trusted() {
            let cli_arg = CLIArg::parse_from([
                "repl",
                "--trusted",
                "git",
                "--grant",
                "git log",
                "--no-auto-close",
            ]);
            let config = cli_arg.to_session_config();
            assert_eq!(config.trusted_commands, vec!["git".to_string()]);
            assert_eq!(
                config.permissions,
                vec![CommandPermission::try_parse("git log").unwrap()]
            );
            assert!(!config.auto_close_brackets);
            assert_eq!(config.prompt, DEFAULT_PROMPT);
        }

        #[test]
        fn test_bad_grant_is_rejected() {
            assert!(CLIArg::try_parse_from(["repl", "--grant", "rm -rf /"]).is_err());
        }
    }
}
