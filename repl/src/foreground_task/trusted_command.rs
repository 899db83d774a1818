// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Trusted external commands are spawned as OS processes instead of being evaluated.
//!
//! While the child runs it owns the terminal:
//! 1. The input reader is paused, so the child gets every key press.
//! 2. Raw mode is suspended, so the child sees a normal cooked terminal.
//! 3. The output device lock is held, so nothing from the editor interleaves.
//!
//! All three are undone in reverse order on every exit path.

use std::{io::{Read as _, Write as _},
          process::{Child, Command, ExitStatus, Stdio},
          sync::Arc,
          time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{CommandError, CommandPermission, EvalError, ForegroundJob, OutputDevice,
            PermissionError, ReaderControl, TaskResult, Value, resume_raw_mode,
            suspend_raw_mode, to_raw_mode_line_endings};

/// How often the child is checked for exit or cancellation.
pub const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// The words of `line` if its first word names a trusted command.
#[must_use]
pub fn parse_trusted_command(line: &str, trusted_names: &[String]) -> Option<Vec<String>> {
    let words: Vec<String> = line.split_whitespace().map(String::from).collect();
    let first = words.first()?;
    trusted_names.contains(first).then_some(words)
}

/// Walk the subcommand chain from most to least specific, stopping at the first granted
/// permission. `git log -n 5` is allowed by any of `git log -n 5`, `git log -n`,
/// `git log`, or `git`.
///
/// # Errors
///
/// Returns [`PermissionError`] if nothing along the chain is granted.
pub fn check_permission(
    words: &[String],
    permissions: &[CommandPermission],
) -> Result<(), PermissionError> {
    let denied = || PermissionError {
        command_line: words.join(" "),
    };
    let Some((command, chain)) = words.split_first() else {
        return Err(denied());
    };
    let chain: Vec<&str> = chain.iter().map(String::as_str).collect();

    for len in (0..=chain.len()).rev() {
        let prefix = &chain[..len];
        if permissions
            .iter()
            .any(|it| it.matches_exactly(command, prefix))
        {
            tracing::debug!(message = "trusted command: granted", %command, ?prefix);
            return Ok(());
        }
    }
    Err(denied())
}

/// Everything a launch needs, moved into the blocking job.
#[allow(missing_debug_implementations)]
pub struct TrustedLaunch {
    pub words: Vec<String>,
    pub permissions: Vec<CommandPermission>,
    pub output_device: OutputDevice,
    pub reader_control: Option<Arc<ReaderControl>>,
}

impl TrustedLaunch {
    #[must_use]
    pub fn into_job(self) -> ForegroundJob {
        Box::new(move |cancel_token: &CancellationToken| self.run(cancel_token))
    }

    /// Check the permission, then run the child to completion. A zero exit status is
    /// `nil`, anything else is an error.
    ///
    /// # Errors
    ///
    /// [`CommandError::Permission`] if not granted, [`CommandError::Cancelled`] if the
    /// token fires (the child is killed), and [`EvalError::Process`] if it can't be
    /// spawned or exits unsuccessfully.
    pub fn run(&self, cancel_token: &CancellationToken) -> TaskResult {
        check_permission(&self.words, &self.permissions)?;

        let is_mock = self.output_device.is_mock;
        if let Some(control) = self.reader_control.as_ref()
            && let Err(err) = control.pause()
        {
            return Err(process_error(format!("failed to pause the input reader: {err}")));
        }
        if let Err(err) = suspend_raw_mode(is_mock) {
            tracing::warn!(message = "trusted command: could not leave raw mode", error = ?err);
        }

        let result = self.run_locked(cancel_token);

        if let Err(err) = resume_raw_mode(is_mock) {
            tracing::warn!(message = "trusted command: could not restore raw mode", error = ?err);
        }
        if let Some(control) = self.reader_control.as_ref()
            && let Err(err) = control.resume()
        {
            tracing::warn!(message = "trusted command: could not resume the input reader", error = ?err);
        }
        result
    }

    fn run_locked(&self, cancel_token: &CancellationToken) -> TaskResult {
        let (program, args) = self
            .words
            .split_first()
            .ok_or_else(|| process_error("empty command".into()))?;
        let is_mock = self.output_device.is_mock;

        let mut output = self.output_device.lock();

        // A mock device can't hand the terminal over, so the child's output is captured
        // and copied into it instead.
        let mut child = Command::new(program)
            .args(args)
            .stdin(if is_mock { Stdio::null() } else { Stdio::inherit() })
            .stdout(if is_mock { Stdio::piped() } else { Stdio::inherit() })
            .stderr(if is_mock { Stdio::piped() } else { Stdio::inherit() })
            .spawn()
            .map_err(|err| process_error(format!("failed to spawn `{program}`: {err}")))?;
        tracing::info!(message = "trusted command: spawned", %program, pid = child.id());

        let captured = spawn_capture(&mut child);
        let status = wait_or_kill(&mut child, cancel_token);

        let io_error = |err| CommandError::Eval(EvalError::Io(err));
        for capture in captured {
            if let Ok(bytes) = capture.join() {
                let text = to_raw_mode_line_endings(&String::from_utf8_lossy(&bytes));
                output.write_all(text.as_bytes()).map_err(io_error)?;
            }
        }
        output.flush().map_err(io_error)?;

        let status = status?;
        tracing::info!(message = "trusted command: exited", %program, ?status);
        if status.success() {
            Ok(Value::Nil)
        } else {
            Err(process_error(format!("`{program}` exited with {status}")))
        }
    }
}

fn process_error(message: String) -> CommandError {
    CommandError::Eval(EvalError::Process { message })
}

/// Drain piped stdout and stderr on helper threads, so a chatty child can't fill the pipe
/// and stall.
fn spawn_capture(child: &mut Child) -> Vec<std::thread::JoinHandle<Vec<u8>>> {
    fn drain(
        mut source: impl std::io::Read + Send + 'static,
    ) -> std::thread::JoinHandle<Vec<u8>> {
        std::thread::spawn(move || {
            let mut acc = vec![];
            let _unused = source.read_to_end(&mut acc);
            acc
        })
    }

    let mut acc = vec![];
    if let Some(stdout) = child.stdout.take() {
        acc.push(drain(stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        acc.push(drain(stderr));
    }
    acc
}

fn wait_or_kill(
    child: &mut Child,
    cancel_token: &CancellationToken,
) -> Result<ExitStatus, CommandError> {
    loop {
        if cancel_token.is_cancelled() {
            let _unused = child.kill();
            let _unused = child.wait();
            tracing::info!(message = "trusted command: killed on cancel", pid = child.id());
            return Err(CommandError::Cancelled);
        }
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => std::thread::sleep(CHILD_POLL_INTERVAL),
            Err(err) => return Err(process_error(format!("failed to wait: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn permissions(specs: &[&str]) -> Vec<CommandPermission> {
        specs
            .iter()
            .map(|it| CommandPermission::try_parse(it).unwrap())
            .collect()
    }

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_trusted_command() {
        let trusted = vec!["git".to_string(), "echo".to_string()];
        assert_eq!(parse_trusted_command("  git  log ", &trusted), Some(words("git log")));
        assert_eq!(parse_trusted_command("print 1", &trusted), None);
        assert_eq!(parse_trusted_command("", &trusted), None);
    }

    #[test_case("git log -n 5", &["git log"], true)]
    #[test_case("git log", &["git"], true)]
    #[test_case("git log", &["git log -n"], false)]
    #[test_case("git push origin", &["git log", "git pull"], false)]
    #[test_case("git", &["git"], true)]
    #[test_case("cargo build", &["git"], false)]
    fn test_check_permission(line: &str, granted: &[&str], is_allowed: bool) {
        let result = check_permission(&words(line), &permissions(granted));
        assert_eq!(result.is_ok(), is_allowed);
        if let Err(err) = result {
            assert_eq!(err.command_line, line);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_output_into_mock_device() {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let launch = TrustedLaunch {
            words: words("echo hello trusted"),
            permissions: permissions(&["echo"]),
            output_device,
            reader_control: None,
        };
        let value = launch.into_job()(&CancellationToken::new()).unwrap();
        assert_eq!(value, Value::Nil);
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "hello trusted\r\n");
    }

    #[test]
    fn test_run_without_permission_never_spawns() {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let launch = TrustedLaunch {
            words: words("echo nope"),
            permissions: vec![],
            output_device,
            reader_control: None,
        };
        let result = launch.run(&CancellationToken::new());
        assert!(matches!(result, Err(CommandError::Permission(_))));
        assert!(stdout_mock.get_copy_of_buffer().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_the_child() {
        let (output_device, _) = OutputDevice::new_mock();
        let launch = TrustedLaunch {
            words: words("sleep 30"),
            permissions: permissions(&["sleep"]),
            output_device,
            reader_control: None,
        };
        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                token.cancel();
            })
        };
        let started = std::time::Instant::now();
        let result = launch.run(&token);
        canceller.join().unwrap();
        assert!(matches!(result, Err(CommandError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_exit_status_is_an_error() {
        let (output_device, _) = OutputDevice::new_mock();
        let launch = TrustedLaunch {
            words: words("false"),
            permissions: permissions(&["false"]),
            output_device,
            reader_control: None,
        };
        let result = launch.run(&CancellationToken::new());
        let Err(CommandError::Eval(EvalError::Process { message })) = result else {
            panic!("expected a process error");
        };
        assert!(message.starts_with("`false` exited with"));
    }

    #[test]
    fn test_spawn_failure_is_a_process_error() {
        let (output_device, _) = OutputDevice::new_mock();
        let launch = TrustedLaunch {
            words: words("definitely-not-a-real-program-r3bl"),
            permissions: permissions(&["definitely-not-a-real-program-r3bl"]),
            output_device,
            reader_control: None,
        };
        let result = launch.run(&CancellationToken::new());
        assert!(matches!(
            result,
            Err(CommandError::Eval(EvalError::Process { .. }))
        ));
    }
}
