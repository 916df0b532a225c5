//! rbw CLI integration.
//!
//! Shells out to the locally installed `rbw` binary. Unlocking, syncing and
//! login are left to `rbw` itself; this client only asks whether the vault is
//! unlocked and reads entries with `rbw get --raw`.

use lookup_core::process::{run_captured, Captured};
use lookup_core::Config;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::LookupError;

/// Outcome of a single `get` query
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// The tool printed this JSON value
    Found(Value),
    /// The tool reported that nothing matched the term
    NotFound,
}

impl Fetched {
    /// The record to resolve fields against; not-found becomes `null`
    pub fn into_record(self) -> Value {
        match self {
            Fetched::Found(value) => value,
            Fetched::NotFound => Value::Null,
        }
    }
}

/// A source of vault records
pub trait Vault {
    /// Whether the vault can currently be read. Locked is `Ok(false)`.
    fn is_unlocked(&self) -> Result<bool, LookupError>;

    /// Fetch the entry matching `term`; `None` asks the tool for its default
    fn fetch(&self, term: Option<&str>) -> Result<Fetched, LookupError>;

    /// The match set for a term: always exactly one decoded value
    fn fetch_matches(&self, term: Option<&str>) -> Result<Vec<Value>, LookupError> {
        Ok(vec![self.fetch(term)?.into_record()])
    }
}

/// Client that shells out to the `rbw` binary
#[derive(Debug, Clone)]
pub struct RbwClient {
    cli_path: String,
    not_found_markers: Vec<String>,
}

impl Default for RbwClient {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RbwClient {
    /// Create a client for the given binary with the default not-found marker
    pub fn new(cli_path: impl Into<String>) -> Self {
        Self {
            cli_path: cli_path.into(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            cli_path: config.cli_path.clone(),
            not_found_markers: config.not_found_markers.clone(),
        }
    }

    pub fn cli_path(&self) -> &str {
        &self.cli_path
    }

    /// Run `rbw` with the given arguments and wait for it to exit
    fn run(&self, args: &[&str]) -> Result<Captured, LookupError> {
        debug!("Running: {} {}", self.cli_path, args.join(" "));

        let captured = run_captured(&self.cli_path, args).map_err(|source| LookupError::Spawn {
            path: self.cli_path.clone(),
            source,
        })?;

        debug!("{} {} exited with {}", self.cli_path, args[0], captured.status);
        Ok(captured)
    }

    fn is_not_found(&self, stderr: &str) -> bool {
        self.not_found_markers
            .iter()
            .any(|marker| stderr.contains(marker.as_str()))
    }
}

impl Vault for RbwClient {
    fn is_unlocked(&self) -> Result<bool, LookupError> {
        Ok(self.run(&["unlocked"])?.success())
    }

    fn fetch(&self, term: Option<&str>) -> Result<Fetched, LookupError> {
        let captured = self.run(&["get", "--raw", term.unwrap_or("")])?;

        if captured.success() {
            return Ok(Fetched::Found(first_value(&captured.stdout)?));
        }

        let stderr = captured.stderr_lossy();
        if self.is_not_found(&stderr) {
            warn!("No rbw entry matches {:?}", term.unwrap_or(""));
            return Ok(Fetched::NotFound);
        }

        Err(LookupError::Tool { stderr })
    }
}

/// Decode the first JSON value on stdout; anything after it is ignored
fn first_value(stdout: &[u8]) -> Result<Value, LookupError> {
    serde_json::Deserializer::from_slice(stdout)
        .into_iter::<Value>()
        .next()
        .ok_or(LookupError::EmptyOutput)?
        .map_err(LookupError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_found_becomes_null_record() {
        assert_eq!(Fetched::NotFound.into_record(), Value::Null);
        assert_eq!(
            Fetched::Found(json!({"name": "a_test"})).into_record(),
            json!({"name": "a_test"})
        );
    }

    #[test]
    fn test_client_from_config() {
        let config = Config {
            cli_path: "/opt/rbw".to_string(),
            not_found_markers: vec!["nope".to_string()],
        };
        let client = RbwClient::from_config(&config);
        assert_eq!(client.cli_path(), "/opt/rbw");
        assert!(client.is_not_found("rbw get: nope"));
        assert!(!client.is_not_found("Not found."));
    }

    #[test]
    fn test_default_client() {
        let client = RbwClient::default();
        assert_eq!(client.cli_path(), "rbw");
        assert!(client.is_not_found("Error: Not found.\n"));

        let client = RbwClient::new("/usr/bin/rbw");
        assert_eq!(client.cli_path(), "/usr/bin/rbw");
        assert!(client.is_not_found("Not found."));
    }

    #[test]
    fn test_first_value_ignores_trailing_output() {
        assert_eq!(
            first_value(b"{\"name\":\"a_test\"}\nrbw: synced\n").unwrap(),
            json!({"name": "a_test"})
        );
        assert_eq!(first_value(b"null\n").unwrap(), Value::Null);
        assert_eq!(
            first_value(b"  {\"a\": 1} {\"b\": 2}").unwrap(),
            json!({"a": 1})
        );
    }

    #[test]
    fn test_first_value_errors() {
        assert!(matches!(first_value(b""), Err(LookupError::EmptyOutput)));
        assert!(matches!(first_value(b"  \n"), Err(LookupError::EmptyOutput)));
        assert!(matches!(first_value(b"hunter2"), Err(LookupError::Decode(_))));
        assert!(matches!(first_value(b"{\"a\":"), Err(LookupError::Decode(_))));
    }

    // -----------------------------------------------------------------------
    // Fake `rbw` scripts exercising the real process plumbing
    // -----------------------------------------------------------------------

    #[cfg(unix)]
    mod fake {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;
        use std::sync::Mutex;
        use tempfile::TempDir;

        // Writing an executable while another test thread forks can make
        // exec fail with ETXTBSY, so these tests run one at a time.
        static SERIAL: Mutex<()> = Mutex::new(());

        /// Write a fake `rbw` that logs its argv and runs `get_body` for `get`
        fn fake_rbw(dir: &Path, unlocked_rc: i32, get_body: &str) -> RbwClient {
            let script = dir.join("rbw");
            let log = dir.join("calls.log");
            let content = format!(
                "#!/bin/sh\n\
                 echo \"$# $*\" >> '{log}'\n\
                 case \"$1\" in\n\
                 unlocked) exit {unlocked_rc} ;;\n\
                 get)\n{get_body}\n;;\n\
                 esac\n",
                log = log.display(),
            );
            fs::write(&script, content).unwrap();
            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
            RbwClient::new(script.to_string_lossy())
        }

        fn calls(dir: &Path) -> Vec<String> {
            fs::read_to_string(dir.join("calls.log"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        #[test]
        fn test_missing_binary_is_spawn_error() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let client = RbwClient::new("/nonexistent/rbw");
            assert!(matches!(
                client.is_unlocked(),
                Err(LookupError::Spawn { ref path, .. }) if path == "/nonexistent/rbw"
            ));
        }

        #[test]
        fn test_trailing_output_after_record() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();
            let client = fake_rbw(dir.path(), 0, "echo '{\"name\":\"a_test\"}'\necho 'warning: stale'");

            assert_eq!(
                client.fetch(Some("a_test")).unwrap(),
                Fetched::Found(json!({"name": "a_test"}))
            );
        }

        #[test]
        fn test_empty_output_is_an_error() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();
            let client = fake_rbw(dir.path(), 0, "exit 0");

            assert!(matches!(
                client.fetch(Some("a_test")),
                Err(LookupError::EmptyOutput)
            ));
        }

        #[test]
        fn test_unlocked_exit_status() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();

            let client = fake_rbw(dir.path(), 0, "exit 0");
            assert!(client.is_unlocked().unwrap());

            let client = fake_rbw(dir.path(), 1, "exit 0");
            assert!(!client.is_unlocked().unwrap());

            assert_eq!(calls(dir.path()), vec!["1 unlocked", "1 unlocked"]);
        }

        #[test]
        fn test_get_decodes_stdout() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();
            let client = fake_rbw(
                dir.path(),
                0,
                "cat <<'JSON'\n{\"name\":\"a_test\",\"data\":{\"password\":\"p@ss\"}}\nJSON",
            );

            let fetched = client.fetch(Some("a_test")).unwrap();
            assert_eq!(
                fetched,
                Fetched::Found(json!({"name": "a_test", "data": {"password": "p@ss"}}))
            );
            assert_eq!(calls(dir.path()), vec!["3 get --raw a_test"]);
        }

        #[test]
        fn test_get_null_output() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();
            let client = fake_rbw(dir.path(), 0, "echo null");

            assert_eq!(client.fetch(Some("x")).unwrap(), Fetched::Found(Value::Null));
        }

        #[test]
        fn test_absent_term_is_forwarded_empty() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();
            let client = fake_rbw(dir.path(), 0, "echo '{}'");

            assert_eq!(client.fetch(None).unwrap(), Fetched::Found(json!({})));
            assert_eq!(calls(dir.path()), vec!["3 get --raw "]);
        }

        #[test]
        fn test_not_found_marker() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();
            let client = fake_rbw(dir.path(), 0, "echo 'Not found.' >&2\nexit 1");

            assert_eq!(client.fetch(Some("missing")).unwrap(), Fetched::NotFound);
            assert_eq!(
                client.fetch_matches(Some("missing")).unwrap(),
                vec![Value::Null]
            );
        }

        #[test]
        fn test_other_failure_carries_stderr() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();
            let client = fake_rbw(dir.path(), 0, "echo 'rbw get: agent not running' >&2\nexit 2");

            match client.fetch(Some("a_test")) {
                Err(LookupError::Tool { stderr }) => {
                    assert_eq!(stderr, "rbw get: agent not running\n");
                }
                other => panic!("Expected Tool error, got {:?}", other),
            }
        }

        #[test]
        fn test_garbage_output_is_decode_error() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();
            let client = fake_rbw(dir.path(), 0, "echo 'hunter2'");

            assert!(matches!(
                client.fetch(Some("a_test")),
                Err(LookupError::Decode(_))
            ));
        }

        #[test]
        fn test_large_output_is_fully_drained() {
            let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
            let dir = TempDir::new().unwrap();
            // Well past a pipe buffer on both streams before exiting
            let client = fake_rbw(
                dir.path(),
                0,
                "i=0\nwhile [ $i -lt 20000 ]; do echo 'noise noise noise noise' >&2; i=$((i+1)); done\n\
                 printf '{\"notes\":\"'\n\
                 i=0\nwhile [ $i -lt 20000 ]; do printf 'xxxxxxxx'; i=$((i+1)); done\n\
                 printf '\"}'",
            );

            match client.fetch(Some("big")).unwrap() {
                Fetched::Found(value) => {
                    assert_eq!(value["notes"].as_str().map(str::len), Some(160_000));
                }
                Fetched::NotFound => panic!("Expected a record"),
            }
        }
    }
}
