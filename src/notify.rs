//! Loader, toasts, confirm modal and alerts.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// Presentation primitives the controllers drive.
pub trait Surface: Send + Sync {
    fn show_loader(&self);
    fn hide_loader(&self);
    fn toast(&self, kind: ToastKind, message: &str);
    /// Confirm/cancel modal. Returns `true` on confirm.
    fn confirm(&self, title: &str, message: &str) -> bool;
    /// Blocking alert; the flow that raised it halts afterwards.
    fn alert(&self, message: &str);
}

/// Wraps a surface with a counted loader.
///
/// The loader is shown on the first outstanding acquisition and hidden when
/// the last one is released, so overlapping loads never hide it early.
pub struct Notifier<U: Surface> {
    surface: U,
    active: AtomicUsize,
}

impl<U: Surface> Notifier<U> {
    pub fn new(surface: U) -> Self {
        Self {
            surface,
            active: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    pub fn surface(&self) -> &U {
        &self.surface
    }

    pub fn acquire(&self) -> LoaderGuard<'_, U> {
        if self.active.fetch_add(1, Ordering::SeqCst) == 0 {
            self.surface.show_loader();
        }
        LoaderGuard { notifier: self }
    }

    #[cfg(test)]
    pub fn active_loads(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn success(&self, message: &str) {
        self.surface.toast(ToastKind::Success, message);
    }

    pub fn error(&self, message: &str) {
        tracing::warn!(message, "operation failed");
        self.surface.toast(ToastKind::Error, message);
    }

    pub fn info(&self, message: &str) {
        self.surface.toast(ToastKind::Info, message);
    }

    pub fn confirm(&self, title: &str, message: &str) -> bool {
        self.surface.confirm(title, message)
    }

    pub fn alert(&self, message: &str) {
        tracing::warn!(message, "blocking alert");
        self.surface.alert(message);
    }

    fn release(&self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.surface.hide_loader();
        }
    }
}

/// Releases one loader acquisition on drop.
pub struct LoaderGuard<'a, U: Surface> {
    notifier: &'a Notifier<U>,
}

impl<U: Surface> Drop for LoaderGuard<'_, U> {
    fn drop(&mut self) {
        self.notifier.release();
    }
}

/// Terminal surface: toasts and alerts on stderr, confirm prompts on stdin.
pub struct ConsoleSurface {
    assume_yes: bool,
}

impl ConsoleSurface {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Surface for ConsoleSurface {
    fn show_loader(&self) {
        tracing::debug!("loader shown");
        eprintln!("Loading...");
    }

    fn hide_loader(&self) {
        tracing::debug!("loader hidden");
    }

    fn toast(&self, kind: ToastKind, message: &str) {
        let tag = match kind {
            ToastKind::Success => "ok",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        };
        eprintln!("[{tag}] {message}");
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{title}\n{message} [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn alert(&self, message: &str) {
        eprintln!("!! {message}");
    }
}
