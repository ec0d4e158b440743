//! Debounce Primitive
//!
//! Delays propagation of a rapidly changing value until it has been stable
//! for a configured interval.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

/// Receiving side of a debouncer: `None` until the first emission.
pub type DebouncedValue<T> = watch::Receiver<Option<T>>;

enum Command<T> {
    Value(T),
    Delay(Duration),
}

/// Debouncer backed by a tokio task.
///
/// The output equals the most recent input once `delay` has passed without
/// a newer input. A newer input restarts the timer and the pending value is
/// dropped, never delivered. Dropping the debouncer (or calling
/// [`Debouncer::shutdown`]) cancels the pending timer.
///
/// Must be created inside a tokio runtime.
pub struct Debouncer<T> {
    input_tx: mpsc::UnboundedSender<Command<T>>,
    output_rx: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(delay: Duration) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = watch::channel(None);

        let task = tokio::spawn(Self::run(delay, input_rx, output_tx));

        Self {
            input_tx,
            output_rx,
            task,
        }
    }

    async fn run(
        mut delay: Duration,
        mut input_rx: mpsc::UnboundedReceiver<Command<T>>,
        output_tx: watch::Sender<Option<T>>,
    ) {
        let mut pending: Option<T> = None;
        let timer = sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                cmd = input_rx.recv() => match cmd {
                    Some(Command::Value(value)) => {
                        pending = Some(value);
                        timer.as_mut().reset(Instant::now() + delay);
                    }
                    Some(Command::Delay(new_delay)) => {
                        delay = new_delay;
                        if pending.is_some() {
                            timer.as_mut().reset(Instant::now() + delay);
                        }
                    }
                    None => break,
                },
                () = &mut timer, if pending.is_some() => {
                    output_tx.send_replace(pending.take());
                }
            }
        }
    }

    /// Feed a new value. Restarts the timer.
    pub fn set(&self, value: T) {
        if self.input_tx.send(Command::Value(value)).is_err() {
            tracing::debug!("debouncer already shut down, input ignored");
        }
    }

    /// Change the delay. A pending value restarts its timer with the new
    /// delay.
    pub fn set_delay(&self, delay: Duration) {
        if self.input_tx.send(Command::Delay(delay)).is_err() {
            tracing::debug!("debouncer already shut down, delay change ignored");
        }
    }

    /// Subscribe to emissions.
    pub fn subscribe(&self) -> DebouncedValue<T> {
        self.output_rx.clone()
    }

    /// Last emitted value.
    pub fn latest(&self) -> Option<T> {
        self.output_rx.borrow().clone()
    }

    /// Cancel any pending emission and stop the timer task.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    pub fn is_shutdown(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
