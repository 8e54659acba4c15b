use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Deferred work executed against the consumer's state.
pub type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Blocking task queue (single-consumer).
///
/// Any thread may `schedule`; exactly one thread (the render thread) pops.
pub struct TaskQueue<S> {
    tx: Sender<Task<S>>,
    rx: Receiver<Task<S>>,
}

impl<S> TaskQueue<S> {
    #[inline]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Never blocks. The queue owns both channel ends, so sending cannot fail.
    #[inline]
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let _ = self.tx.send(Box::new(task));
    }

    /// Blocks until a task is available.
    #[inline]
    pub fn pop(&self) -> Option<Task<S>> {
        self.rx.recv().ok()
    }

    #[inline]
    pub fn try_pop(&self) -> Option<Task<S>> {
        self.rx.try_recv().ok()
    }

    pub fn pop_timeout(&self, timeout: Duration) -> Option<Task<S>> {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => Some(task),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Run tasks in submission order until `should_stop` holds after a task.
    /// `should_stop` is also checked once before blocking for the first task.
    pub fn run<F>(&self, state: &mut S, should_stop: F)
    where
        F: FnMut(&mut S) -> bool,
    {
        self.run_with_retry(state, should_stop, |_| None, |_| {});
    }

    /// `run`, but while `retry_in` reports a delay the wait for the next task
    /// is bounded by it, and `retry` runs whenever that wait times out.
    pub fn run_with_retry<F, D, R>(&self, state: &mut S, mut should_stop: F, mut retry_in: D, mut retry: R)
    where
        F: FnMut(&mut S) -> bool,
        D: FnMut(&S) -> Option<Duration>,
        R: FnMut(&mut S),
    {
        if should_stop(state) {
            return;
        }
        loop {
            let next = match retry_in(state) {
                Some(delay) => match self.rx.recv_timeout(delay) {
                    Ok(task) => Some(task),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                },
                None => match self.rx.recv() {
                    Ok(task) => Some(task),
                    Err(_) => return,
                },
            };
            match next {
                Some(task) => task(state),
                None => retry(state),
            }
            if should_stop(state) {
                break;
            }
        }
    }
}

impl<S> Default for TaskQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn runs_in_submission_order() {
        let q: TaskQueue<Vec<u32>> = TaskQueue::new();
        for i in 0..5 {
            q.schedule(move |v: &mut Vec<u32>| v.push(i));
        }
        q.schedule(|v: &mut Vec<u32>| v.push(u32::MAX));

        let mut out = Vec::new();
        q.run(&mut out, |v| v.last() == Some(&u32::MAX));
        assert_eq!(out, vec![0, 1, 2, 3, 4, u32::MAX]);
        assert!(q.is_empty());
    }

    #[test]
    fn non_blocking_pops() {
        let q: TaskQueue<u32> = TaskQueue::new();
        assert!(q.try_pop().is_none());
        assert!(q.pop_timeout(Duration::from_millis(5)).is_none());

        q.schedule(|n| *n += 2);
        assert_eq!(q.len(), 1);
        let mut n = 1;
        (q.try_pop().unwrap())(&mut n);
        assert_eq!(n, 3);
    }

    #[test]
    fn consumer_wakes_for_remote_producer() {
        let q: Arc<TaskQueue<u32>> = Arc::new(TaskQueue::new());
        let producer = {
            let q = q.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                for _ in 0..10 {
                    q.schedule(|n| *n += 1);
                }
            })
        };
        let mut n = 0;
        q.run(&mut n, |n| *n == 10);
        producer.join().unwrap();
        assert_eq!(n, 10);
    }

    #[test]
    fn retries_until_nothing_is_left() {
        // (retries left, retries done)
        let q: TaskQueue<(u32, u32)> = TaskQueue::new();
        let mut state = (3, 0);
        q.run_with_retry(
            &mut state,
            |s| s.0 == 0,
            |s| (s.0 > 0).then(|| Duration::from_millis(1)),
            |s| {
                s.0 -= 1;
                s.1 += 1;
            },
        );
        assert_eq!(state, (0, 3));
    }

    #[test]
    fn tasks_win_over_retries() {
        let q: TaskQueue<Vec<&'static str>> = TaskQueue::new();
        q.schedule(|v: &mut Vec<&'static str>| v.push("task"));
        let mut out = Vec::new();
        q.run_with_retry(
            &mut out,
            |v| v.len() == 2,
            |_| Some(Duration::from_millis(1)),
            |v| v.push("retry"),
        );
        assert_eq!(out, vec!["task", "retry"]);
    }

    #[test]
    fn stops_before_blocking() {
        let q: TaskQueue<bool> = TaskQueue::new();
        let mut done = true;
        q.run(&mut done, |d| *d);
    }
}
