use log::warn;
use nix::sys::signal::{signal, SigHandler, Signal};

const SHELL_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// The Rust runtime starts with SIGPIPE ignored, so children reset it too.
const CHILD_DEFAULTS: [Signal; 3] = [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGPIPE];

/// 交互模式下忽略 Ctrl-C / Ctrl-\，让 shell 本身不被终止
pub fn ignore_interactive_signals() {
    set_all(&SHELL_SIGNALS, SigHandler::SigIgn);
}

/// Ignored dispositions survive `exec`, so every forked child puts the
/// defaults back before running anything.
pub fn restore_default() {
    set_all(&CHILD_DEFAULTS, SigHandler::SigDfl);
}

fn set_all(signals: &[Signal], handler: SigHandler) {
    for &sig in signals {
        // SAFETY: only SigIgn / SigDfl are installed, no Rust handler runs.
        if let Err(err) = unsafe { signal(sig, handler) } {
            warn!("无法设置信号 {:?}: {}", sig, err);
        }
    }
}
