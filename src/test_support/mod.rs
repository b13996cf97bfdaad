//! Test utilities and mocks for abiprobe unit tests.
//!
//! Two command runners are provided:
//! - [`MockExecutor`] answers with canned outputs matched by pattern, for
//!   tests that care about exact invocations (classification).
//! - [`FakeToolchain`] simulates compiling, archiving and linking by reading
//!   the probe sources, for tests that exercise whole probes.
//!
//! # Example
//!
//! ```rust,ignore
//! use abiprobe::test_support::{MockExecutor, MockProcessOutput};
//!
//! #[test]
//! fn test_example() {
//!     let mut exec = MockExecutor::new();
//!     exec.expect("gcc -v", MockProcessOutput::success("gcc version 12.2.0"));
//!
//!     // Pass `&exec` wherever a `&dyn CommandRunner` is expected...
//! }
//! ```

pub mod fixtures;

use std::io;
use std::sync::Mutex;

use crate::util::process::{CommandRunner, CommandSpec, ProbeResult, ProcessError};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Create an output with both stdout and stderr.
    pub fn with_output(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Merge into a probe result the way a real process run would.
    pub fn to_result(&self) -> ProbeResult {
        let mut text = self.stdout.clone();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        ProbeResult::from_exit(self.status, &text)
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match using a regex pattern.
    Regex(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
            CommandPattern::Any => true,
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    /// Pattern to match against commands.
    pub pattern: CommandPattern,
    /// Output to return when matched.
    pub output: MockProcessOutput,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    /// Number of times this expectation has been used.
    pub used: usize,
}

impl CommandExpectation {
    /// Create a new expectation.
    pub fn new(pattern: CommandPattern, output: MockProcessOutput) -> Self {
        CommandExpectation {
            pattern,
            output,
            times: None,
            used: 0,
        }
    }

    /// Set the number of times this expectation can be used.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Check if this expectation can still be used.
    pub fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<CommandExpectation>,
    calls: Vec<String>,
    default_output: Option<MockProcessOutput>,
}

/// Mock process executor for testing command execution.
///
/// Records every command and answers from the first matching
/// expectation. Unmatched commands fail to spawn, like a missing program.
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    fn state_mut(&mut self) -> &mut MockState {
        self.state.get_mut().unwrap()
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Exact(cmd.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Contains(substring.to_string()),
            output,
        ))
    }

    /// Add a custom expectation.
    pub fn expect_pattern(&mut self, expectation: CommandExpectation) -> &mut Self {
        self.state_mut().expectations.push(expectation);
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&mut self, output: MockProcessOutput) -> &mut Self {
        self.state_mut().default_output = Some(output);
        self
    }

    /// Get all commands that were called.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Clear all recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Verify that all expectations with a specific count were satisfied.
    pub fn verify(&self) -> Result<(), String> {
        let state = self.state.lock().unwrap();
        for (i, exp) in state.expectations.iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    return Err(format!(
                        "expectation {} was used {} times, expected {}",
                        i, exp.used, expected
                    ));
                }
            }
        }
        Ok(())
    }
}

impl CommandRunner for MockExecutor {
    fn run(&self, cmd: &CommandSpec) -> Result<ProbeResult, ProcessError> {
        let full_cmd = cmd.display_command();
        let mut state = self.state.lock().unwrap();
        state.calls.push(full_cmd.clone());

        for exp in &mut state.expectations {
            if exp.pattern.matches(&full_cmd) && exp.available() {
                exp.used += 1;
                return Ok(exp.output.to_result());
            }
        }

        if let Some(ref default) = state.default_output {
            return Ok(default.to_result());
        }

        Err(ProcessError::Spawn {
            program: cmd.program.display().to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "unexpected command"),
        })
    }
}

/// Assertion helpers for testing.
pub mod assertions {
    use crate::env::BuildEnv;

    /// Assert that a result is Ok and return the value.
    pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
        match result {
            Ok(v) => v,
            Err(e) => panic!("expected Ok, got Err: {:?}", e),
        }
    }

    /// Assert that a result is Err and return the error.
    pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
        match result {
            Ok(v) => panic!("expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    }

    /// Assert that two environments hold the same keys and values.
    pub fn assert_env_eq(actual: &BuildEnv, expected: &BuildEnv) {
        if actual != expected {
            panic!(
                "environments differ\nactual:\n{:#?}\nexpected:\n{:#?}",
                actual, expected
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_basic() {
        let mut exec = MockExecutor::new();

        exec.expect(
            "gcc -v",
            MockProcessOutput::with_output(0, "", "gcc version 12.2.0"),
        );
        exec.expect_prefix("ar", MockProcessOutput::success(""));

        let result = exec.run(&CommandSpec::new("gcc").arg("-v")).unwrap();
        assert!(result.success);
        assert_eq!(result.output, vec!["gcc version 12.2.0"]);

        let result = exec
            .run(&CommandSpec::new("ar").args(["rcs", "libx.a"]))
            .unwrap();
        assert!(result.success);
        assert_eq!(exec.calls(), vec!["gcc -v", "ar rcs libx.a"]);
    }

    #[test]
    fn test_mock_executor_unexpected() {
        let exec = MockExecutor::new();

        let result = exec.run(&CommandSpec::new("unknown"));
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[test]
    fn test_mock_executor_times() {
        let mut exec = MockExecutor::new();
        exec.expect_pattern(
            CommandExpectation::new(
                CommandPattern::Contains("-V".into()),
                MockProcessOutput::success("f90: Sun Fortran 95 8.3"),
            )
            .times(1),
        );
        exec.set_default(MockProcessOutput::failure(1, "no"));

        assert!(exec.run(&CommandSpec::new("f90").arg("-V")).unwrap().success);
        assert!(!exec.run(&CommandSpec::new("f90").arg("-V")).unwrap().success);
        assert!(exec.verify().is_ok());
    }

    #[test]
    fn test_merged_output_order() {
        let result = MockProcessOutput::with_output(2, "out", "err").to_result();
        assert_eq!(result.exit_status, 2);
        assert_eq!(result.output, vec!["out", "err"]);
    }

    #[test]
    fn test_assertions() {
        use assertions::*;

        let ok_result: Result<i32, &str> = Ok(42);
        assert_eq!(assert_ok(ok_result), 42);

        let err_result: Result<i32, &str> = Err("error");
        assert_eq!(assert_err(err_result), "error");
    }
}
