use std::{path::Path, process::Stdio};

use anyhow::Result;
use sysinfo::{get_current_pid, Signal, System};

use super::daemon_path::to_daemon_path;

/// Terminates every running daemon whose executable matches `daemon_exe`.
pub fn kill_previous_servers(daemon_exe: &Path) {
    let system = System::new_all();
    let current_id = get_current_pid().unwrap();
    for process in system.processes().values() {
        if process.pid() == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }
        let Some(exe) = process.exe().filter(|v| v.exists()) else {
            continue;
        };
        if exe != daemon_exe {
            continue;
        }

        if process.kill_with(Signal::Term).is_none() {
            // Not every platform can deliver SIGTERM, fall back to a plain
            // kill there.
            process.kill();
        }
        process.wait();
    }
}

/// Intended for shutting down a previous daemon and starting a new one. The
/// daemon binary detaches itself, so all this has to do is spawn it and let
/// go.
pub fn restart_server() -> Result<()> {
    // The daemon path is derived from the current executable, which covers
    // the usual side-by-side install.
    let daemon =
        to_daemon_path(std::env::current_exe().expect("Can't operate without an executable"));
    kill_previous_servers(&daemon);
    let mut command = std::process::Command::new(daemon);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
        command.stdin(Stdio::null());
        command.stdout(Stdio::null());
    }

    println!("Spawning");
    #[allow(clippy::zombie_processes)]
    let _ = command.spawn()?;
    println!("Success");
    Ok(())
}
