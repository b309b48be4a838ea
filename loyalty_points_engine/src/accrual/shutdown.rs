use tokio::sync::watch;

/// The trigger half of a shutdown broadcast. Triggering it stops every task holding a [`ShutdownListener`].
///
/// Dropping the signal without triggering it also counts as a shutdown, so listeners can never be left waiting on a
/// signal that no longer exists.
#[derive(Debug)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener { rx: self.tx.subscribe() }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been triggered. Resolves immediately if it already has been.
    pub async fn wait(&mut self) {
        // An error means the signal was dropped
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
