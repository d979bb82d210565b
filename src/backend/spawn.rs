use std::io;
use std::path::Path;

use crate::model::StartMode;

/// Starts one program without waiting for it.
pub trait Spawner {
    fn spawn(&self, path: &str, mode: StartMode) -> io::Result<()>;
}

/// Spawner backed by the host operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSpawner;

impl Spawner for OsSpawner {
    fn spawn(&self, path: &str, mode: StartMode) -> io::Result<()> {
        if is_explicit(path) && !Path::new(path).exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path),
            ));
        }
        platform::spawn(path, mode)
    }
}

/// A path naming a location rather than a bare command looked up on `PATH`.
fn is_explicit(path: &str) -> bool {
    path.contains('/') || path.contains(std::path::MAIN_SEPARATOR)
}

#[cfg(unix)]
mod platform {
    use std::io;
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::process::CommandExt;
    use std::path::Path;
    use std::process::{Child, Command, Stdio};
    use std::thread;

    use crate::model::StartMode;

    #[cfg(target_os = "macos")]
    pub(super) const OPENER: &str = "open";
    #[cfg(not(target_os = "macos"))]
    pub(super) const OPENER: &str = "xdg-open";

    pub(super) fn spawn(path: &str, mode: StartMode) -> io::Result<()> {
        let mut cmd = command(path, mode);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let child = spawn_detached(&mut cmd)?;

        log::debug!("Spawned pid {} for {} ({})", child.id(), path, mode);
        reap(child);
        Ok(())
    }

    pub(super) fn command(path: &str, mode: StartMode) -> Command {
        if mode != StartMode::Normal {
            // X11/Wayland have no standard initial window-state flag for a child.
            log::debug!("Start mode {} has no effect here for {}", mode, path);
        }

        if !super::is_explicit(path) || is_executable_file(Path::new(path)) {
            Command::new(path)
        } else {
            let mut cmd = Command::new(OPENER);
            cmd.arg(path);
            cmd
        }
    }

    /// Start the child in its own session so it outlives the launcher and
    /// does not receive its terminal's signals.
    fn spawn_detached(cmd: &mut Command) -> io::Result<Child> {
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid()?;
                Ok(())
            });
        }
        cmd.spawn()
    }

    /// Collect the exit status on a throwaway thread so the child never lingers
    /// as a zombie. The launcher itself never waits on it.
    fn reap(mut child: Child) {
        let pid = child.id();
        let spawned = thread::Builder::new()
            .name(format!("reap-{}", pid))
            .spawn(move || match child.wait() {
                Ok(status) => log::debug!("pid {} exited with {}", pid, status),
                Err(e) => log::debug!("wait on pid {} failed: {}", pid, e),
            });
        if let Err(e) = spawned {
            log::warn!("Cannot spawn reaper thread for pid {}: {}", pid, e);
        }
    }

    fn is_executable_file(path: &Path) -> bool {
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
}

#[cfg(windows)]
mod platform {
    use std::ffi::OsStr;
    use std::io;
    use std::iter;
    use std::mem;
    use std::os::windows::ffi::OsStrExt;

    use windows_sys::Win32::UI::Shell::{
        ShellExecuteExW, SEE_MASK_FLAG_NO_UI, SEE_MASK_NOASYNC, SHELLEXECUTEINFOW,
    };
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        SW_SHOWMAXIMIZED, SW_SHOWMINNOACTIVE, SW_SHOWNORMAL,
    };

    use crate::model::StartMode;

    fn wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(iter::once(0)).collect()
    }

    /// Open `path` the way Explorer would (.exe, .bat, .lnk, documents) with
    /// the show-window flag for `mode`. `SEE_MASK_NOASYNC` makes the shell
    /// resolve the target before returning, so an unknown name is an error here.
    pub(super) fn spawn(path: &str, mode: StartMode) -> io::Result<()> {
        if path.contains('\0') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "path contains a NUL character",
            ));
        }

        let verb = wide("open");
        let file = wide(path);
        // SAFETY: SHELLEXECUTEINFOW is plain data; all-zero is its documented
        // "unset" state.
        let mut info: SHELLEXECUTEINFOW = unsafe { mem::zeroed() };
        info.cbSize = mem::size_of::<SHELLEXECUTEINFOW>() as u32;
        info.fMask = SEE_MASK_NOASYNC | SEE_MASK_FLAG_NO_UI;
        info.lpVerb = verb.as_ptr();
        info.lpFile = file.as_ptr();
        info.nShow = match mode {
            StartMode::Normal => SW_SHOWNORMAL,
            StartMode::Minimized => SW_SHOWMINNOACTIVE,
            StartMode::Maximized => SW_SHOWMAXIMIZED,
        };

        // SAFETY: `verb` and `file` are NUL-terminated and outlive the call.
        if unsafe { ShellExecuteExW(&mut info) } == 0 {
            return Err(io::Error::last_os_error());
        }
        log::debug!("Shell opened {} ({})", path, mode);
        Ok(())
    }
}

#[cfg(all(test, windows))]
mod windows_tests {
    use super::*;

    #[test]
    fn unknown_bare_command_fails() {
        assert!(OsSpawner.spawn("__missing__", StartMode::Normal).is_err());
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let err = OsSpawner
            .spawn("C:\\definitely\\not\\here\\__missing__.exe", StartMode::Minimized)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::time::{Duration, Instant};

    fn script(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn wait_for(path: &Path) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if path.exists() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let err = OsSpawner
            .spawn("/definitely/not/here/__missing__", StartMode::Normal)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn unknown_bare_command_fails() {
        assert!(OsSpawner
            .spawn("__missing_command_for_launcher_tests__", StartMode::Normal)
            .is_err());
    }

    #[test]
    fn runs_executable_script_without_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let path = script(
            dir.path(),
            "touch.sh",
            &format!("sleep 1; touch '{}'", marker.display()),
        );

        let started = Instant::now();
        OsSpawner.spawn(&path, StartMode::Minimized).unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(wait_for(&marker));
    }

    #[test]
    fn non_executable_file_goes_to_desktop_opener() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("notes.txt");
        fs::write(&doc, "hello").unwrap();
        let doc = doc.to_string_lossy().into_owned();

        let cmd = platform::command(&doc, StartMode::Normal);
        assert_eq!(cmd.get_program(), OsStr::new(platform::OPENER));
        assert_eq!(cmd.get_args().collect::<Vec<_>>(), vec![OsStr::new(&doc)]);

        let folder = dir.path().to_string_lossy().into_owned();
        assert_eq!(
            platform::command(&folder, StartMode::Normal).get_program(),
            OsStr::new(platform::OPENER)
        );
    }

    #[test]
    fn executables_and_bare_names_run_directly() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "run.sh", "true");

        let cmd = platform::command(&exe, StartMode::Maximized);
        assert_eq!(cmd.get_program(), OsStr::new(&exe));
        assert_eq!(cmd.get_args().count(), 0);

        assert_eq!(
            platform::command("firefox", StartMode::Normal).get_program(),
            OsStr::new("firefox")
        );
    }
}
