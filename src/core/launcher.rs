// src/core/launcher.rs
//! Fire-and-forget launch of the companion application with a cosmetic
//! countdown.
//!
//! The countdown is an estimate shown to the user, not a readiness probe:
//! it never looks at the spawned process.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::core::error::LaunchError;
use crate::core::status::{Shutdown, StatusSink};

/// Default length of the countdown window, in seconds
pub const DEFAULT_COUNTDOWN_SECS: u32 = 120;

/// Starts an external program reference as a detached process
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, target: &Path) -> io::Result<()>;
}

/// Opens the target with the platform's default opener.
///
/// The child gets no stdio of ours. A background thread waits on it so
/// short-lived openers do not pile up as zombies.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn command(target: &Path) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg("start").arg("").arg(target);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(target);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(target);
            cmd
        }
    }
}

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, target: &Path) -> io::Result<()> {
        let child = Self::command(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(pid = child.id(), path = %target.display(), "spawned launcher process");
        if let Err(e) = reap(child) {
            warn!("failed to start reaper thread: {}", e);
        }
        Ok(())
    }
}

fn reap(mut child: Child) -> io::Result<thread::JoinHandle<io::Result<ExitStatus>>> {
    thread::Builder::new()
        .name("launch-reaper".to_string())
        .spawn(move || {
            let status = child.wait();
            match &status {
                Ok(status) => debug!(%status, "launcher process exited"),
                Err(e) => warn!("failed to wait on launcher process: {}", e),
            }
            status
        })
}

/// Observable state of the launch countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchState {
    pub target: PathBuf,
    pub running: bool,
    pub remaining_seconds: u32,
}

impl LaunchState {
    fn idle(target: PathBuf) -> Self {
        Self {
            target,
            running: false,
            remaining_seconds: 0,
        }
    }
}

/// Returned by a successful [`LaunchCoordinator::trigger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub target: PathBuf,
    pub countdown_secs: u32,
}

/// Configuration for the launch coordinator
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Shortcut or executable to open
    pub target: PathBuf,

    /// Name used in status messages
    pub app_name: String,

    /// Countdown window length
    pub countdown_secs: u32,

    /// Time between countdown updates
    pub tick: Duration,
}

impl LaunchConfig {
    pub fn new(target: PathBuf) -> Self {
        Self {
            target,
            app_name: "ComfyUI".to_string(),
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            tick: Duration::from_secs(1),
        }
    }
}

/// Launches the configured target at most once per countdown window
pub struct LaunchCoordinator {
    config: LaunchConfig,
    launcher: Arc<dyn ProcessLauncher>,
    status: Arc<dyn StatusSink>,
    shutdown: Shutdown,
    state: Arc<Mutex<LaunchState>>,
}

impl LaunchCoordinator {
    pub fn new(
        config: LaunchConfig,
        launcher: Arc<dyn ProcessLauncher>,
        status: Arc<dyn StatusSink>,
        shutdown: Shutdown,
    ) -> Self {
        let state = Arc::new(Mutex::new(LaunchState::idle(config.target.clone())));
        Self {
            config,
            launcher,
            status,
            shutdown,
            state,
        }
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    pub fn state(&self) -> LaunchState {
        lock(&self.state).clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    /// Launch the target and start the countdown.
    ///
    /// A trigger during an active countdown is a no-op reporting
    /// [`LaunchError::AlreadyRunning`]. A missing target is reported before
    /// anything is spawned.
    pub fn trigger(&self) -> Result<Started, LaunchError> {
        let name = &self.config.app_name;
        let target = &self.config.target;

        {
            let mut state = lock(&self.state);
            if state.running {
                debug!("launch requested during countdown, ignoring");
                return Err(LaunchError::AlreadyRunning);
            }
            if !target.exists() {
                warn!(path = %target.display(), "launch target not found");
                self.status.set_status(&format!("{} shortcut not found", name));
                return Err(LaunchError::TargetNotFound(target.clone()));
            }
            state.running = true;
            state.remaining_seconds = self.config.countdown_secs;
        }

        self.status.set_status(&format!("Launching {}...", name));
        info!(path = %target.display(), "🚀 launching {}", name);

        if let Err(source) = self.launcher.launch(target) {
            error!(path = %target.display(), "failed to launch {}: {}", name, source);
            self.status
                .set_status(&format!("Error launching {}: {}", name, source));
            *lock(&self.state) = LaunchState::idle(target.clone());
            return Err(LaunchError::Spawn {
                target: target.clone(),
                source,
            });
        }

        self.spawn_countdown();

        Ok(Started {
            target: target.clone(),
            countdown_secs: self.config.countdown_secs,
        })
    }

    fn spawn_countdown(&self) {
        let state = Arc::clone(&self.state);
        let status = Arc::clone(&self.status);
        let shutdown = self.shutdown.clone();
        let name = self.config.app_name.clone();
        let target = self.config.target.clone();
        let total = self.config.countdown_secs;
        let tick = self.config.tick;

        let countdown = move || {
            for remaining in (1..=total).rev() {
                if !shutdown.is_running() {
                    break;
                }
                lock(&state).remaining_seconds = remaining;
                status.set_status(&format!("{} loading... {} seconds remaining", name, remaining));
                thread::sleep(tick);
            }

            if shutdown.is_running() {
                status.set_status(&format!("{} loaded and ready", name));
                info!("✅ {} countdown finished", name);
            }
            *lock(&state) = LaunchState::idle(target);
        };

        let spawned = thread::Builder::new()
            .name("launch-countdown".to_string())
            .spawn(countdown);

        if let Err(e) = spawned {
            // The process is already up; only the countdown display is lost.
            error!("failed to start countdown thread: {}", e);
            *lock(&self.state) = LaunchState::idle(self.config.target.clone());
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::StatusBoard;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Instant;

    #[derive(Default)]
    struct CountingLauncher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ProcessLauncher for CountingLauncher {
        fn launch(&self, _target: &Path) -> io::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            } else {
                Ok(())
            }
        }
    }

    fn coordinator(
        target: PathBuf,
        launcher: Arc<CountingLauncher>,
        countdown_secs: u32,
    ) -> (LaunchCoordinator, StatusBoard, Shutdown) {
        let status = StatusBoard::new();
        let shutdown = Shutdown::new();
        let config = LaunchConfig {
            countdown_secs,
            tick: Duration::from_millis(20),
            ..LaunchConfig::new(target)
        };
        let coordinator =
            LaunchCoordinator::new(config, launcher, Arc::new(status.clone()), shutdown.clone());
        (coordinator, status, shutdown)
    }

    fn wait_idle(coordinator: &LaunchCoordinator) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while coordinator.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_missing_target_never_spawns() {
        let launcher = Arc::new(CountingLauncher::default());
        let (coordinator, status, _) =
            coordinator(PathBuf::from("/definitely/not/here.lnk"), Arc::clone(&launcher), 3);

        assert!(matches!(coordinator.trigger(), Err(LaunchError::TargetNotFound(_))));
        assert_eq!(launcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(status.current(), "ComfyUI shortcut not found");
        assert!(!coordinator.is_running());
    }

    #[test]
    fn test_second_trigger_during_countdown() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let launcher = Arc::new(CountingLauncher::default());
        let (coordinator, _, _) =
            coordinator(target.path().to_path_buf(), Arc::clone(&launcher), 50);

        let started = coordinator.trigger().expect("first trigger");
        assert_eq!(started.countdown_secs, 50);
        assert!(matches!(coordinator.trigger(), Err(LaunchError::AlreadyRunning)));
        assert_eq!(launcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_triggers_launch_once() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let launcher = Arc::new(CountingLauncher::default());
        let (coordinator, _, shutdown) =
            coordinator(target.path().to_path_buf(), Arc::clone(&launcher), 50);
        let coordinator = Arc::new(coordinator);

        const THREADS: usize = 8;
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    coordinator.trigger()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(LaunchError::AlreadyRunning))));
        assert_eq!(launcher.calls.load(Ordering::SeqCst), 1);
        shutdown.trigger();
    }

    #[cfg(unix)]
    #[test]
    fn test_reaper_collects_exit_status() {
        let child = Command::new("sh").arg("-c").arg("exit 0").spawn().unwrap();
        let status = reap(child).unwrap().join().unwrap().unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_countdown_finishes_and_resets() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let launcher = Arc::new(CountingLauncher::default());
        let (coordinator, status, _) =
            coordinator(target.path().to_path_buf(), Arc::clone(&launcher), 3);

        coordinator.trigger().unwrap();
        assert!(coordinator.is_running());
        wait_idle(&coordinator);

        assert_eq!(coordinator.state(), LaunchState::idle(target.path().to_path_buf()));
        assert_eq!(status.current(), "ComfyUI loaded and ready");

        // A new window opens once the previous one closed
        coordinator.trigger().unwrap();
        assert_eq!(launcher.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_spawn_failure_resets_state() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let launcher = Arc::new(CountingLauncher {
            fail: true,
            ..Default::default()
        });
        let (coordinator, status, _) =
            coordinator(target.path().to_path_buf(), Arc::clone(&launcher), 3);

        assert!(matches!(coordinator.trigger(), Err(LaunchError::Spawn { .. })));
        assert!(!coordinator.is_running());
        assert!(status.current().starts_with("Error launching ComfyUI"));
    }

    #[test]
    fn test_shutdown_cuts_countdown_short() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let launcher = Arc::new(CountingLauncher::default());
        let (coordinator, status, shutdown) =
            coordinator(target.path().to_path_buf(), Arc::clone(&launcher), 1000);

        coordinator.trigger().unwrap();
        thread::sleep(Duration::from_millis(50));
        shutdown.trigger();

        let started = Instant::now();
        wait_idle(&coordinator);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(status.current().contains("seconds remaining"));
    }
}
