//! X11 shell helpers
//!
//! Thin wrappers around `xclip` and `xdotool` used by the selection source
//! and the paste-based edit surface. Every probe is bounded by a timeout so
//! callers never hang on a wedged display session.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Read an X selection (`primary` or `clipboard`).
///
/// Returns `Ok(None)` when the selection is empty (xclip exits non-zero or
/// prints nothing) and `Err` when the probe could not run or timed out.
pub async fn read_selection(kind: &str, timeout: Duration) -> std::io::Result<Option<String>> {
    let output = tokio::time::timeout(
        timeout,
        Command::new("xclip")
            .args(["-o", "-selection", kind])
            .stderr(Stdio::null())
            .output(),
    )
    .await
    .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "xclip timed out"))??;

    if !output.status.success() {
        // xclip exits 1 when the selection is unowned
        return Ok(None);
    }

    let text = String::from_utf8_lossy(&output.stdout)
        .trim_end_matches(['\n', '\r'])
        .to_string();
    Ok(if text.is_empty() { None } else { Some(text) })
}

/// Set the clipboard selection to `text`
pub async fn set_clipboard(text: &str, timeout: Duration) -> std::io::Result<()> {
    let mut child = Command::new("xclip")
        .args(["-selection", "clipboard"])
        .stdin(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
    }

    let status = tokio::time::timeout(timeout, child.wait())
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "xclip timed out"))??;

    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("xclip failed to set clipboard"))
    }
}

/// Simulate Ctrl+V in the focused window
pub async fn paste_key(timeout: Duration) -> std::io::Result<()> {
    let status = tokio::time::timeout(
        timeout,
        Command::new("xdotool").args(["key", "ctrl+v"]).status(),
    )
    .await
    .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "xdotool timed out"))??;

    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("xdotool paste failed"))
    }
}

/// Window class of the currently active window, or None if it cannot be read
pub async fn active_window_class(timeout: Duration) -> Option<String> {
    let output = tokio::time::timeout(
        timeout,
        Command::new("xdotool")
            .args(["getactivewindow", "getwindowclassname"])
            .stderr(Stdio::null())
            .output(),
    )
    .await
    .ok()?
    .ok()?;

    if !output.status.success() {
        return None;
    }

    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Current pointer position in root coordinates
pub async fn mouse_position(timeout: Duration) -> Option<(i32, i32)> {
    let output = tokio::time::timeout(
        timeout,
        Command::new("xdotool")
            .args(["getmouselocation", "--shell"])
            .stderr(Stdio::null())
            .output(),
    )
    .await
    .ok()?
    .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut x = None;
    let mut y = None;
    for line in stdout.lines() {
        if let Some(v) = line.strip_prefix("X=") {
            x = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("Y=") {
            y = v.trim().parse().ok();
        }
    }

    debug!("Pointer at {:?},{:?}", x, y);
    Some((x?, y?))
}
