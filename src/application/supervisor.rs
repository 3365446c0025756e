//! Process supervisor (`spec.md` §4.5), grounded in `multi.py`:
//! `run_blade_server`, `ensure_virtualenv`, `morph_into_blade_server`, and
//! its `__main__` block's terminate-then-join shutdown sequence.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::domain::models::{NodeDescriptor, Topology};
use crate::infrastructure::sandbox::SandboxRegistry;

pub struct Supervisor {
    topology: Topology,
    jlog: bool,
    novenv: bool,
    respawn_delay: Duration,
    sandboxes: Arc<SandboxRegistry>,
}

impl Supervisor {
    pub fn new(topology: Topology, jlog: bool, novenv: bool, respawn_delay: Duration) -> Self {
        Self {
            topology,
            jlog,
            novenv,
            respawn_delay,
            sandboxes: Arc::new(SandboxRegistry::new()),
        }
    }

    /// Spawns one supervising task per `managed: true` node, exactly
    /// mirroring the original's one-`Process`-per-node fan-out. On SIGINT,
    /// every managed child is terminated and reaped, then every
    /// supervising task is joined, before this returns (`spec.md` §4.5,
    /// `multi.py`'s `except KeyboardInterrupt` block).
    pub async fn run(self) -> anyhow::Result<()> {
        let managed: Vec<NodeDescriptor> = self
            .topology
            .blades
            .iter()
            .filter(|b| b.managed)
            .cloned()
            .collect();

        if managed.is_empty() {
            tracing::warn!("topology has no managed blades; supervisor has nothing to do");
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut join_set = JoinSet::new();
        for node in managed {
            let topology = self.topology.clone();
            let jlog = self.jlog;
            let novenv = self.novenv;
            let respawn_delay = self.respawn_delay;
            let sandboxes = self.sandboxes.clone();
            let shutdown_rx = shutdown_rx.clone();
            join_set.spawn(async move {
                Self::run_blade_server(&node, &topology, jlog, novenv, respawn_delay, &sandboxes, shutdown_rx)
                    .await;
            });
        }

        tokio::select! {
            _ = async { while join_set.join_next().await.is_some() {} } => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("keyboard interrupt received, terminating managed processes");
                let _ = shutdown_tx.send(true);
            }
        }

        // Whichever branch won, make sure every supervising task has
        // actually finished — each kills and reaps its own child upon
        // observing the shutdown signal — before the supervisor exits.
        while join_set.join_next().await.is_some() {}

        Ok(())
    }

    /// Builds the re-exec command for `node` and keeps it supervised until
    /// shutdown is signaled.
    async fn run_blade_server(
        node: &NodeDescriptor,
        topology: &Topology,
        jlog: bool,
        novenv: bool,
        respawn_delay: Duration,
        sandboxes: &SandboxRegistry,
        shutdown: watch::Receiver<bool>,
    ) {
        let exe = std::env::current_exe().expect("failed to resolve current executable");

        if !novenv {
            let venv_path = std::path::PathBuf::from(&node.venv);
            if let Err(err) = sandboxes.ensure(&venv_path, exe.parent().unwrap_or(&venv_path)) {
                tracing::error!(error = %err, node = %node.name, "failed to prepare sandbox");
                return;
            }
        }

        let node_json = serde_json::to_string(node).expect("node descriptor is always serializable");
        let topology_json = serde_json::to_string(topology).expect("topology is always serializable");
        let node_name = node.name.clone();

        Self::supervise_child(
            move || {
                let mut command = Command::new(&exe);
                command
                    .arg("--blade-json")
                    .arg(&node_json)
                    .arg("--topology-json")
                    .arg(&topology_json)
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                if jlog {
                    command.arg("--jlog");
                }
                command
            },
            &node_name,
            respawn_delay,
            shutdown,
        )
        .await;
    }

    /// Spawns, streams, and restarts a child process built by
    /// `command_factory`, until `shutdown` fires. At that point the
    /// currently running child (if any) is killed and reaped and this
    /// returns without restarting it.
    async fn supervise_child(
        mut command_factory: impl FnMut() -> Command,
        node_name: &str,
        respawn_delay: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow() {
                return;
            }
            tracing::info!(node = %node_name, "starting server");

            let mut child = match command_factory().spawn() {
                Ok(child) => child,
                Err(err) => {
                    tracing::error!(error = %err, node = %node_name, "failed to spawn server");
                    tokio::select! {
                        _ = tokio::time::sleep(respawn_delay) => {}
                        _ = shutdown.changed() => return,
                    }
                    continue;
                }
            };

            if let Some(stdout) = child.stdout.take() {
                let node_name = node_name.to_string();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        tracing::info!(node = %node_name, "{line}");
                    }
                });
            }
            if let Some(stderr) = child.stderr.take() {
                let node_name = node_name.to_string();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        tracing::info!(node = %node_name, "{line}");
                    }
                });
            }

            tokio::select! {
                status = child.wait() => {
                    match status {
                        Ok(status) => {
                            tracing::warn!(
                                node = %node_name,
                                code = ?status.code(),
                                "server terminated, restarting"
                            );
                        }
                        Err(err) => {
                            tracing::error!(error = %err, node = %node_name, "failed to wait for server");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!(node = %node_name, "shutdown requested, terminating managed child");
                    if let Err(err) = child.kill().await {
                        tracing::error!(error = %err, node = %node_name, "failed to terminate managed child");
                    }
                    return;
                }
            }

            if *shutdown.borrow() {
                return;
            }
            tokio::time::sleep(respawn_delay).await;
        }
    }

    /// Prints (not logs) the exact shell-quoted child invocation for
    /// `name` and returns without spawning anything (`spec.md` §4.5,
    /// grounded in `multi.py`'s `print_cmd_only` branch).
    pub fn print_cmd_only(topology: &Topology, name: &str, jlog: bool) -> anyhow::Result<()> {
        let node = topology
            .find(name)
            .ok_or_else(|| anyhow::anyhow!("no blade configuration with name '{name}' found"))?;

        let exe = std::env::current_exe()?;
        let mut argv = vec![
            exe.display().to_string(),
            "--blade-json".to_string(),
            serde_json::to_string(node)?,
            "--topology-json".to_string(),
            serde_json::to_string(topology)?,
        ];
        if jlog {
            argv.push("--jlog".to_string());
        }

        println!("{}", shell_words::join(&argv));
        Ok(())
    }

    /// Replaces the current process image with a direct run of `name`
    /// (`spec.md` §4.5, grounded in `morph_into_blade_server`'s `os.execv`).
    #[cfg(unix)]
    pub fn morph_into_blade(topology: &Topology, name: &str, jlog: bool) -> anyhow::Result<()> {
        use std::ffi::CString;

        let node = topology
            .find(name)
            .ok_or_else(|| anyhow::anyhow!("no blade configuration with name '{name}' found"))?;

        let exe = std::env::current_exe()?;
        let mut argv = vec![
            exe.display().to_string(),
            "--blade-json".to_string(),
            serde_json::to_string(node)?,
            "--topology-json".to_string(),
            serde_json::to_string(topology)?,
        ];
        if jlog {
            argv.push("--jlog".to_string());
        }

        let exe_c = CString::new(exe.display().to_string())?;
        let argv_c: Vec<CString> = argv
            .into_iter()
            .map(|a| CString::new(a).expect("argv entries must not contain NUL bytes"))
            .collect();

        nix::unistd::execv(&exe_c, &argv_c)?;
        unreachable!("execv only returns on error, which is propagated above")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Covers `spec.md` §4.5's shutdown contract directly against
    /// `supervise_child`: once `shutdown` fires, the running child is
    /// killed and the supervising future returns promptly without
    /// restarting it.
    #[tokio::test]
    async fn shutdown_signal_kills_the_running_child_and_returns() {
        let mut command = Command::new("sleep");
        command.arg("30").stdout(Stdio::null()).stderr(Stdio::null());

        let (tx, rx) = watch::channel(false);
        let supervise = tokio::spawn(Supervisor::supervise_child(
            move || {
                let mut command = Command::new("sleep");
                command.arg("30").stdout(Stdio::null()).stderr(Stdio::null());
                command
            },
            "test-node",
            Duration::from_secs(1),
            rx,
        ));
        let _ = command; // built above only to document the shape; the factory rebuilds it.

        // Give the child a moment to actually start before signaling shutdown.
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).expect("receiver must still be alive");

        tokio::time::timeout(Duration::from_secs(5), supervise)
            .await
            .expect("supervise_child must return promptly once shutdown is observed")
            .expect("supervising task must not panic");
    }

    #[tokio::test]
    async fn shutdown_before_first_spawn_prevents_any_spawn() {
        let spawn_count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counted = spawn_count.clone();

        let (tx, rx) = watch::channel(true);
        tx.send(true).unwrap();

        tokio::time::timeout(
            Duration::from_secs(2),
            Supervisor::supervise_child(
                move || {
                    counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    let mut command = Command::new("true");
                    command.stdout(Stdio::null()).stderr(Stdio::null());
                    command
                },
                "test-node",
                Duration::from_millis(50),
                rx,
            ),
        )
        .await
        .expect("supervise_child must return immediately when already shut down");

        assert_eq!(spawn_count.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
