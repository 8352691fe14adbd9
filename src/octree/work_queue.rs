use crossbeam_channel::{unbounded, Receiver, Sender};

/// Number of workers drained against a queue of `queue_len` items:
/// one per `batch_size` items plus one, capped at `max_workers`.
///
/// # Examples
///
/// ```
/// use rs_verlet::octree::worker_count;
///
/// assert_eq!(worker_count(0, 10, 4), 1);
/// assert_eq!(worker_count(25, 10, 4), 3);
/// assert_eq!(worker_count(1000, 10, 4), 4);
/// ```
pub fn worker_count(queue_len: usize, batch_size: usize, max_workers: usize) -> usize {
    (queue_len / batch_size.max(1) + 1).min(max_workers.max(1))
}

/// Unbounded multi-producer multi-consumer queue shared by detection and resolution.
///
/// Detection tasks push from any thread; resolution workers claim fixed-size
/// batches until the queue runs dry.
#[derive(Debug)]
pub struct WorkQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T: Send> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> WorkQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        WorkQueue { sender, receiver }
    }

    pub fn push(&self, item: T) {
        // The queue owns its receiver, so the channel never disconnects.
        let _ = self.sender.send(item);
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Takes up to `batch_size` items without blocking.
    pub fn claim_batch(&self, batch_size: usize) -> Vec<T> {
        self.receiver.try_iter().take(batch_size).collect()
    }

    /// Empties the queue.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Drains the queue with a bounded set of workers on the current rayon pool.
    ///
    /// Each worker repeatedly claims up to `batch_size` items and hands them to
    /// `handler` until it finds the queue empty. Returns once every worker has
    /// finished, reporting how many workers ran.
    pub fn process_in_batches<F>(&self, batch_size: usize, max_workers: usize, handler: F) -> usize
    where
        F: Fn(T) + Sync,
    {
        let workers = worker_count(self.len(), batch_size, max_workers);
        let batch_size = batch_size.max(1);
        rayon::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|_| loop {
                    let batch = self.claim_batch(batch_size);
                    if batch.is_empty() {
                        break;
                    }
                    batch.into_iter().for_each(&handler);
                });
            }
        });
        workers
    }
}

impl<T: Ord + Send> WorkQueue<T> {
    /// Removes duplicate items, returning how many were dropped. Must not race with producers.
    pub fn dedup(&self) -> usize {
        let mut items = self.drain();
        let before = items.len();
        items.sort_unstable();
        items.dedup();
        let removed = before - items.len();
        items.into_iter().for_each(|item| self.push(item));
        removed
    }
}
