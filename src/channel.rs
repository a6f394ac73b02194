//! Reusable background-channel client with id-correlated replies.
//!
//! A [`ChannelClient`] owns exactly one worker thread for its whole
//! lifetime, created when the client is constructed and never recreated.
//! Every request carries a unique id; a router thread matches responses
//! back to the pending entry for that id, so completion order is free to
//! differ from send order. A channel-level fault rejects every in-flight
//! request at once and poisons the client, making later sends fail fast.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::error::ChannelError;

/// Implemented by response types so the router can find the pending entry.
pub trait Correlated {
    fn correlation_id(&self) -> &str;
}

type ReplySender<Resp> = Sender<Result<Resp, ChannelError>>;

struct PendingTable<Resp> {
    entries: HashMap<String, ReplySender<Resp>>,
    poisoned: bool,
}

impl<Resp> PendingTable<Resp> {
    fn fail_all(&mut self, error: ChannelError) {
        self.poisoned = true;
        for (_, reply) in self.entries.drain() {
            let _ = reply.send(Err(error.clone()));
        }
    }
}

/// Handle to one in-flight request; resolves exactly once.
pub struct ReplyHandle<Resp> {
    reply_rx: Receiver<Result<Resp, ChannelError>>,
}

impl<Resp> ReplyHandle<Resp> {
    /// Blocks until the matching response arrives or the channel fails.
    pub fn wait(self) -> Result<Resp, ChannelError> {
        match self.reply_rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(ChannelError::Disconnected),
        }
    }
}

pub struct ChannelClient<Req, Resp> {
    request_tx: Sender<Req>,
    pending: Arc<Mutex<PendingTable<Resp>>>,
    id_prefix: String,
}

impl<Req, Resp> ChannelClient<Req, Resp>
where
    Req: Send + 'static,
    Resp: Correlated + Send + 'static,
{
    /// Spawns the worker (running `serve`) and the response router.
    ///
    /// `serve` receives the request receiver and the response sender and is
    /// expected to loop until the request channel disconnects. A spawn
    /// failure means the environment cannot host the channel at all.
    pub fn start<F>(id_prefix: &str, serve: F) -> Result<Self, ChannelError>
    where
        F: FnOnce(Receiver<Req>, Sender<Resp>) + Send + 'static,
    {
        let (request_tx, request_rx) = unbounded::<Req>();
        let (response_tx, response_rx) = unbounded::<Resp>();

        thread::Builder::new()
            .name(format!("{id_prefix}-worker"))
            .spawn(move || serve(request_rx, response_tx))
            .map_err(|err| ChannelError::SpawnFailed(err.to_string()))?;

        let pending = Arc::new(Mutex::new(PendingTable {
            entries: HashMap::new(),
            poisoned: false,
        }));
        let router_pending = Arc::clone(&pending);
        thread::Builder::new()
            .name(format!("{id_prefix}-router"))
            .spawn(move || route_responses(response_rx, router_pending))
            .map_err(|err| ChannelError::SpawnFailed(err.to_string()))?;

        tracing::debug!(prefix = id_prefix, "background channel started");
        Ok(Self {
            request_tx,
            pending,
            id_prefix: id_prefix.to_string(),
        })
    }

    /// Registers a pending entry under a fresh id, builds the request with
    /// that id, and transmits it.
    pub fn send(
        &self,
        build: impl FnOnce(String) -> Req,
    ) -> Result<ReplyHandle<Resp>, ChannelError> {
        let id = self.next_id();
        let (reply_tx, reply_rx) = bounded(1);

        {
            let mut table = self.lock_pending()?;
            if table.poisoned {
                return Err(ChannelError::Unavailable);
            }
            table.entries.insert(id.clone(), reply_tx);
        }

        if self.request_tx.send(build(id.clone())).is_err() {
            let mut table = self.lock_pending()?;
            table.entries.remove(&id);
            table.fail_all(ChannelError::Disconnected);
            return Err(ChannelError::Disconnected);
        }

        Ok(ReplyHandle { reply_rx })
    }

    fn next_id(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or(0);
        format!("{}-{}-{:08x}", self.id_prefix, millis, fastrand::u32(..))
    }

    fn lock_pending(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, PendingTable<Resp>>, ChannelError> {
        self.pending.lock().map_err(|_| ChannelError::Unavailable)
    }
}

fn route_responses<Resp: Correlated>(
    response_rx: Receiver<Resp>,
    pending: Arc<Mutex<PendingTable<Resp>>>,
) {
    for response in response_rx.iter() {
        let entry = match pending.lock() {
            Ok(mut table) => table.entries.remove(response.correlation_id()),
            Err(_) => return,
        };
        match entry {
            Some(reply) => {
                let _ = reply.send(Ok(response));
            }
            // No pending entry: a fault already rejected it, or the id is
            // from a different channel generation. Dropped silently.
            None => tracing::debug!("dropping unmatched response"),
        }
    }

    // The worker hung up. Everything still in flight fails together.
    tracing::warn!("background channel disconnected; rejecting pending requests");
    if let Ok(mut table) = pending.lock() {
        table.fail_all(ChannelError::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Echo {
        id: String,
        payload: String,
    }

    impl Correlated for Echo {
        fn correlation_id(&self) -> &str {
            &self.id
        }
    }

    fn echo_server(rx: Receiver<Echo>, tx: Sender<Echo>) {
        for request in rx.iter() {
            if tx.send(request).is_err() {
                break;
            }
        }
    }

    #[test]
    fn replies_are_matched_by_id() {
        let client = ChannelClient::start("echo", echo_server).unwrap();
        let first = client
            .send(|id| Echo { id, payload: "one".into() })
            .unwrap();
        let second = client
            .send(|id| Echo { id, payload: "two".into() })
            .unwrap();
        // Waiting in reverse of send order still resolves correctly.
        assert_eq!(second.wait().unwrap().payload, "two");
        assert_eq!(first.wait().unwrap().payload, "one");
    }

    #[test]
    fn ids_are_unique_and_prefixed() {
        let client = ChannelClient::start("pfx", echo_server).unwrap();
        let a = client.send(|id| Echo { id, payload: String::new() }).unwrap();
        let b = client.send(|id| Echo { id, payload: String::new() }).unwrap();
        let a = a.wait().unwrap().id;
        let b = b.wait().unwrap().id;
        assert!(a.starts_with("pfx-"));
        assert!(b.starts_with("pfx-"));
        assert_ne!(a, b);
    }

    #[test]
    fn worker_death_rejects_all_pending_requests() {
        // A server that swallows requests and exits after the first one,
        // leaving every reply unsent.
        fn black_hole(rx: Receiver<Echo>, _tx: Sender<Echo>) {
            let _ = rx.recv();
        }

        let client = ChannelClient::start("dead", black_hole).unwrap();
        let first = client.send(|id| Echo { id, payload: String::new() }).unwrap();
        assert_eq!(first.wait().unwrap_err(), ChannelError::Disconnected);

        // The fault poisons the client for later senders.
        let eventually_unavailable = (0..50).any(|_| {
            std::thread::sleep(std::time::Duration::from_millis(10));
            match client.send(|id| Echo { id, payload: String::new() }) {
                Err(_) => true,
                Ok(handle) => handle.wait().is_err(),
            }
        });
        assert!(eventually_unavailable);
    }

    #[test]
    fn unmatched_responses_are_dropped() {
        // A server that answers with a bogus id first, then echoes.
        fn confused(rx: Receiver<Echo>, tx: Sender<Echo>) {
            for request in rx.iter() {
                let _ = tx.send(Echo { id: "nobody-waits-for-this".into(), payload: String::new() });
                if tx.send(request).is_err() {
                    break;
                }
            }
        }

        let client = ChannelClient::start("odd", confused).unwrap();
        let handle = client.send(|id| Echo { id, payload: "real".into() }).unwrap();
        assert_eq!(handle.wait().unwrap().payload, "real");
    }
}
