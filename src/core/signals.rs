//! # OS interrupts → internal triggers.
//!
//! A [`SignalBridge`] watches an [`InterruptSource`] and turns each burst of
//! interrupts into exactly one callback invocation, until the runner's root
//! lifetime ends.
//!
//! ```text
//! SIGHUP SIGHUP SIGHUP ──► next() ──► drain() (swallow the rest of the burst) ──► callback()
//!                                                                               (Runner::reload)
//! SIGINT / SIGTERM     ──► next() ──► drain() ──► callback() (terminate trigger)
//! root cancelled       ──► bridge exits
//! ```
//!
//! ## Signals
//! **Unix platforms:** any [`Interrupt`] maps onto a `tokio::signal::unix::SignalKind`.
//!
//! **Other platforms:** only [`Interrupt::Interrupt`] (Ctrl-C) is supported;
//! other kinds are skipped at registration.

use std::io;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// An OS interrupt kind the runner can watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interrupt {
    /// `SIGHUP`: terminal hangup, conventionally "reload configuration".
    Hangup,
    /// `SIGINT` (Ctrl-C).
    Interrupt,
    /// `SIGTERM`: default kill signal, used by systemd/Kubernetes.
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
    /// Any other signal number.
    Raw(i32),
}

#[cfg(unix)]
impl Interrupt {
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Interrupt::Hangup => SignalKind::hangup(),
            Interrupt::Interrupt => SignalKind::interrupt(),
            Interrupt::Terminate => SignalKind::terminate(),
            Interrupt::Quit => SignalKind::quit(),
            Interrupt::User1 => SignalKind::user_defined1(),
            Interrupt::User2 => SignalKind::user_defined2(),
            Interrupt::Raw(n) => SignalKind::from_raw(n),
        }
    }
}

/// Producer of interrupt notifications.
#[async_trait]
pub trait InterruptSource: Send {
    /// Resolves when the next interrupt arrives; `false` once no more can arrive.
    async fn next(&mut self) -> bool;

    /// Swallows interrupts that are already pending; returns how many.
    fn drain(&mut self) -> usize;
}

/// Interrupts delivered by the operating system.
pub struct OsInterrupts {
    #[cfg(unix)]
    signals: Vec<tokio::signal::unix::Signal>,
    #[cfg(not(unix))]
    ctrl_c: bool,
}

impl OsInterrupts {
    /// Registers listeners for every interrupt in `watching`.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn register(watching: &[Interrupt]) -> io::Result<Self> {
        let signals = watching
            .iter()
            .map(|i| tokio::signal::unix::signal(i.kind()))
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self { signals })
    }

    /// Registers listeners for every interrupt in `watching`.
    #[cfg(not(unix))]
    pub fn register(watching: &[Interrupt]) -> io::Result<Self> {
        let ctrl_c = watching.contains(&Interrupt::Interrupt);
        if watching.iter().any(|i| *i != Interrupt::Interrupt) {
            debug!(?watching, "only Ctrl-C is supported on this platform");
        }
        Ok(Self { ctrl_c })
    }
}

#[cfg(unix)]
#[async_trait]
impl InterruptSource for OsInterrupts {
    async fn next(&mut self) -> bool {
        if self.signals.is_empty() {
            return false;
        }
        futures::future::poll_fn(|cx| {
            for signal in self.signals.iter_mut() {
                if let std::task::Poll::Ready(got) = signal.poll_recv(cx) {
                    return std::task::Poll::Ready(got.is_some());
                }
            }
            std::task::Poll::Pending
        })
        .await
    }

    fn drain(&mut self) -> usize {
        use futures::FutureExt;

        let mut drained = 0;
        for signal in self.signals.iter_mut() {
            while let Some(Some(())) = signal.recv().now_or_never() {
                drained += 1;
            }
        }
        drained
    }
}

#[cfg(not(unix))]
#[async_trait]
impl InterruptSource for OsInterrupts {
    async fn next(&mut self) -> bool {
        if !self.ctrl_c {
            return false;
        }
        tokio::signal::ctrl_c().await.is_ok()
    }

    fn drain(&mut self) -> usize {
        0
    }
}

/// Delivers one callback per interrupt burst until the root lifetime ends.
pub struct SignalBridge<S> {
    name: &'static str,
    source: S,
    root: CancellationToken,
    callback: Box<dyn Fn() + Send + Sync>,
}

impl<S: InterruptSource> SignalBridge<S> {
    /// Creates a bridge named `name` (used in diagnostics only).
    pub fn new<F>(name: &'static str, source: S, root: CancellationToken, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            name,
            source,
            root,
            callback: Box::new(callback),
        }
    }

    /// Watches until the root lifetime ends or the source is exhausted.
    ///
    /// Returns the number of bursts delivered to the callback.
    pub async fn run(mut self) -> usize {
        let mut bursts = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.root.cancelled() => break,
                got = self.source.next() => {
                    if !got {
                        debug!(bridge = self.name, "interrupt source exhausted");
                        break;
                    }
                    let coalesced = self.source.drain();
                    if self.root.is_cancelled() {
                        break;
                    }
                    debug!(bridge = self.name, coalesced, "interrupt burst received");
                    (self.callback)();
                    bursts += 1;
                }
            }
        }
        bursts
    }
}
