use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::domain::{FetchPayload, Message};

/// Runs repository calls off the UI thread with the simulated service
/// latency, delivering each result as a `Message::Fetched` on the same
/// channel the controller already polls. Requests carry the generation
/// they were issued under; the model drops completions whose generation
/// no longer matches (the user navigated away mid-flight). There is no
/// cancellation and no retry.
pub struct Dispatcher {
    tx: Sender<Message>,
    latency: Duration,
}

impl Dispatcher {
    pub fn new(latency: Duration) -> (Self, Receiver<Message>) {
        let (tx, rx) = channel();
        (Self { tx, latency }, rx)
    }

    pub fn spawn(
        &self,
        generation: u64,
        job: impl FnOnce() -> FetchPayload + Send + 'static,
    ) {
        let tx = self.tx.clone();
        let latency = self.latency;
        thread::spawn(move || {
            thread::sleep(latency);
            let start = Instant::now();
            let payload = job();
            trace!(
                "Fetch (gen {generation}) resolved in {}ms after {}ms latency",
                start.elapsed().as_millis(),
                latency.as_millis()
            );
            // The receiver is gone on shutdown; nothing left to notify.
            let _ = tx.send(Message::Fetched(generation, payload));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::seed_users;

    #[test]
    fn jobs_resolve_as_fetched_messages() {
        let (dispatcher, rx) = Dispatcher::new(Duration::ZERO);
        dispatcher.spawn(7, || FetchPayload::Users(seed_users()));
        let msg = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        match msg {
            Message::Fetched(7, FetchPayload::Users(users)) => assert_eq!(users.len(), 5),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn dropped_receiver_does_not_panic_the_worker() {
        let (dispatcher, rx) = Dispatcher::new(Duration::ZERO);
        drop(rx);
        dispatcher.spawn(1, || FetchPayload::Mutated(Ok("done".into())));
        // Give the worker a beat to run its send against the closed channel.
        thread::sleep(Duration::from_millis(20));
    }
}
