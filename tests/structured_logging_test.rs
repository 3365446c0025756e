//! Structured JSON log record shape (`spec.md` §8 scenario 6), grounded in
//! the Python `JsonFormatter` this crate's `StructuredJsonLayer` reproduces.
//!
//! `StructuredJsonLayer` writes directly to stdout rather than through an
//! injectable writer, so the layer is exercised out-of-process: the built
//! `bladed` binary is re-exec'd in blade mode with `--jlog`, and the first
//! stdout line it emits (`"Hello World !"`, logged by `main.rs` right after
//! `LoggerImpl::init`) is parsed and checked against the documented shape.

use std::io::{BufRead, Write};
use std::process::{Command, Stdio};

use bladeswarm::domain::models::{BladeKind, NodeDescriptor, StaticClusterParameters, Topology};
use serde_json::Value;

#[test]
fn print_cmd_only_echoes_the_re_exec_command_line() {
    let exe = env!("CARGO_BIN_EXE_bladed");

    let mut topology_file = tempfile::NamedTempFile::new().expect("failed to create temp file");
    writeln!(
        topology_file,
        r#"
blades:
  - name: orch
    blade: orchestrator
    host: 127.0.0.1
    port: 19231
    static_cluster_parameters:
      monitor_interval_in_seconds: 30
      database_provider: sqlite
      db:
        path: ":memory:"
"#
    )
    .expect("failed to write topology fixture");

    let output = Command::new(exe)
        .arg("--config")
        .arg(topology_file.path())
        .arg("--print_cmd_only")
        .arg("orch")
        .arg("--jlog")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("failed to run bladed");

    assert!(
        output.status.success(),
        "bladed --print_cmd_only exited non-zero: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );

    let printed = String::from_utf8_lossy(&output.stdout);
    assert!(
        printed.contains("--blade-json"),
        "print_cmd_only must echo the re-exec command line, got: {printed}"
    );
}

#[test]
fn jlog_blade_process_emits_the_documented_record_shape() {
    let exe = env!("CARGO_BIN_EXE_bladed");

    let node = NodeDescriptor {
        name: "orch".to_string(),
        blade: BladeKind::Orchestrator,
        managed: false,
        host: "127.0.0.1".to_string(),
        port: 0,
        venv: String::new(),
        static_cluster_parameters: StaticClusterParameters {
            monitor_interval_in_seconds: 30.0,
            database_provider: "sqlite".to_string(),
            db: serde_json::json!({ "path": ":memory:" }),
            github_cache_threshold_minutes: 10,
        },
    };
    let topology = Topology {
        blades: vec![node.clone()],
    };

    let mut child = Command::new(exe)
        .arg("--blade-json")
        .arg(serde_json::to_string(&node).unwrap())
        .arg("--topology-json")
        .arg(serde_json::to_string(&topology).unwrap())
        .arg("--jlog")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn bladed in blade mode");

    let stdout = child.stdout.take().expect("stdout must be piped");
    let mut reader = std::io::BufReader::new(stdout);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .expect("failed to read the first log line before the blade starts serving");

    // The blade now binds a TCP listener and serves forever; this test only
    // needs the one startup log record, so the process is killed rather
    // than waited on.
    let _ = child.kill();
    let _ = child.wait();

    let record: Value = serde_json::from_str(line.trim())
        .unwrap_or_else(|e| panic!("log line was not valid JSON ({e}): {line}"));

    assert_eq!(record["full_message"], "Hello World !");
    assert_eq!(record["level"], 1);
    assert!(record["host"]
        .as_str()
        .expect("host must be a string")
        .starts_with("127.0.0.1:"));
    assert!(record["_details"].as_object().unwrap().is_empty());
    assert!(record["logtest"].as_object().unwrap().is_empty());
    assert!(record["timestamp"].as_f64().is_some());
}
