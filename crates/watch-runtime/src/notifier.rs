//! Notifier gateways.
//!
//! Room monitors hand finished [`NotificationRequest`]s to a [`Notifier`] and
//! move on. Delivery is best effort: a failing notification daemon is logged
//! here and never reported back to the caller.

use std::future::Future;
use std::process::Stdio;
use std::sync::OnceLock;

use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use watch_core::models::NotificationRequest;

/// Fire-and-forget sink for notifications. Shared by every room monitor.
pub trait Notifier: Send + Sync {
    /// Queue `request` for display. Must not block the caller.
    fn notify(&self, request: NotificationRequest);
}

// ── DesktopNotifier ───────────────────────────────────────────────────────────

/// Shows notifications through `notify-send` (libnotify).
///
/// Requests go onto one queue drained by a single worker task, which runs the
/// binary once per request. Callers never wait on the notification daemon,
/// and notifications appear in the order `notify` was called.
#[derive(Debug)]
pub struct DesktopNotifier {
    program: String,
    queue: OnceLock<mpsc::UnboundedSender<NotificationRequest>>,
}

impl DesktopNotifier {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            queue: OnceLock::new(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to `notify-send` for `request`.
    ///
    /// `-t` is omitted when the request leaves the timeout to the platform.
    pub fn command_args(request: &NotificationRequest) -> Vec<String> {
        let opts = &request.options;
        let mut args = Vec::with_capacity(9);
        if let Some(delay) = opts.delay_ms {
            args.push("-t".to_string());
            args.push(delay.to_string());
        }
        args.push("-u".to_string());
        args.push(opts.priority.as_str().to_string());
        if let Some(icon) = &opts.icon {
            args.push("-i".to_string());
            args.push(icon.clone());
        }
        // Chat text may start with '-'; keep it out of option parsing.
        args.push("--".to_string());
        args.push(request.title.clone());
        args.push(request.body.clone());
        args
    }

    /// The delivery queue, starting its worker on the current runtime the
    /// first time it is needed. `None` outside a tokio runtime.
    fn queue(&self) -> Option<&mpsc::UnboundedSender<NotificationRequest>> {
        if let Some(queue) = self.queue.get() {
            return Some(queue);
        }
        let handle = tokio::runtime::Handle::try_current().ok()?;
        Some(self.queue.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let program = self.program.clone();
            handle.spawn(drain_queue(rx, move |request| {
                let program = program.clone();
                async move {
                    let args = DesktopNotifier::command_args(&request);
                    deliver(&program, &args, &request.title).await;
                }
            }));
            debug!(program = %self.program, "notification worker started");
            tx
        }))
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("notify-send")
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, request: NotificationRequest) {
        let Some(queue) = self.queue() else {
            warn!(title = %request.title, "no async runtime; notification dropped");
            return;
        };
        if let Err(mpsc::error::SendError(request)) = queue.send(request) {
            warn!(title = %request.title, "notification worker gone; notification dropped");
        }
    }
}

/// Hand queued requests to `deliver` one at a time, in arrival order.
async fn drain_queue<F, Fut>(mut rx: mpsc::UnboundedReceiver<NotificationRequest>, mut deliver: F)
where
    F: FnMut(NotificationRequest) -> Fut,
    Fut: Future<Output = ()>,
{
    while let Some(request) = rx.recv().await {
        deliver(request).await;
    }
    debug!("notification queue closed");
}

async fn deliver(program: &str, args: &[String], title: &str) {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => {
            debug!(title, "notification shown");
        }
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            warn!(
                program,
                title,
                status = %out.status,
                stderr = %stderr.trim(),
                "notifier exited with failure"
            );
        }
        Err(e) => {
            warn!(program, title, error = %e, "failed to run notifier");
        }
    }
}

// ── LogNotifier ───────────────────────────────────────────────────────────────

/// Writes notifications to the log instead of the desktop (`--dry-run`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, request: NotificationRequest) {
        let opts = &request.options;
        info!(
            title = %request.title,
            body = %request.body,
            urgency = %opts.priority,
            delay_ms = ?opts.delay_ms,
            icon = ?opts.icon,
            "notification"
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use watch_core::models::{NotifyOptions, Urgency};

    fn request(delay_ms: Option<u64>, priority: Urgency, icon: Option<&str>) -> NotificationRequest {
        NotificationRequest::new(
            "bob in Ops",
            "server down",
            NotifyOptions {
                delay_ms,
                priority,
                icon: icon.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_command_args_full() {
        let args = DesktopNotifier::command_args(&request(Some(0), Urgency::Critical, Some("ops.png")));
        assert_eq!(
            args,
            ["-t", "0", "-u", "critical", "-i", "ops.png", "--", "bob in Ops", "server down"]
        );
    }

    #[test]
    fn test_command_args_default_delay_and_no_icon() {
        let args = DesktopNotifier::command_args(&request(Some(20_000), Urgency::Normal, None));
        assert_eq!(args, ["-t", "20000", "-u", "normal", "--", "bob in Ops", "server down"]);
    }

    #[test]
    fn test_command_args_platform_timeout() {
        let args = DesktopNotifier::command_args(&NotificationRequest::info("Now monitoring Ops"));
        assert_eq!(args, ["-u", "normal", "--", "Now monitoring Ops", ""]);
    }

    #[test]
    fn test_command_args_dash_text_stays_positional() {
        let req = NotificationRequest::new("-u low", "--- build failed ---", NotifyOptions::default());
        let args = DesktopNotifier::command_args(&req);
        assert_eq!(args, ["-u", "normal", "--", "-u low", "--- build failed ---"]);
    }

    #[tokio::test]
    async fn test_queue_delivers_in_call_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let shown = Arc::new(Mutex::new(Vec::new()));
        let titles = ["Now monitoring Ops", "bob in Ops", "Stopped monitoring Ops for some reason"];
        for title in titles {
            tx.send(NotificationRequest::info(title)).unwrap();
        }
        drop(tx);

        // Earlier requests take longer to show, so any overlap would reorder them.
        let mut delay = 60u64;
        let sink = shown.clone();
        drain_queue(rx, move |request| {
            let sink = sink.clone();
            delay = delay.saturating_sub(20);
            let pause = Duration::from_millis(delay);
            async move {
                tokio::time::sleep(pause).await;
                sink.lock().unwrap().push(request.title);
            }
        })
        .await;

        assert_eq!(*shown.lock().unwrap(), titles);
    }

    #[tokio::test]
    async fn test_worker_started_once_per_notifier() {
        let notifier = DesktopNotifier::new("definitely-not-a-real-notifier");
        assert!(notifier.queue.get().is_none());
        notifier.notify(NotificationRequest::info("a"));
        notifier.notify(NotificationRequest::info("b"));
        assert!(notifier.queue.get().is_some());
    }

    #[test]
    fn test_default_program() {
        assert_eq!(DesktopNotifier::default().program(), "notify-send");
    }

    #[test]
    fn test_notify_outside_runtime_does_not_panic() {
        DesktopNotifier::new("definitely-not-a-real-notifier").notify(NotificationRequest::info("x"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_swallowed() {
        let notifier = DesktopNotifier::new("definitely-not-a-real-notifier");
        notifier.notify(NotificationRequest::info("x"));
        // Give the spawned delivery task a chance to run and fail quietly.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[test]
    fn test_log_notifier_accepts_requests() {
        LogNotifier.notify(request(None, Urgency::Normal, None));
    }

    #[test]
    fn test_notifier_is_object_safe_and_shareable() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Notifier>();
        let _shared: std::sync::Arc<dyn Notifier> = std::sync::Arc::new(LogNotifier);
    }
}
