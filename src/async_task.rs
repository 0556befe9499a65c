use std::{future::Future, pin::Pin, task::Context};

use futures::future::BoxFuture;

/// A future that is driven by polling from the host's event loop instead of an executor.
///
/// The session runs on a single UI thread, so the future is polled with a no-op waker
/// whenever the host calls into us. It yields its output exactly once.
pub struct AsyncTask<T> {
    future: Option<BoxFuture<'static, T>>,
}

impl<T> AsyncTask<T> {
    pub fn new(future: BoxFuture<'static, T>) -> Self {
        Self {
            future: Some(future),
        }
    }

    /// Returns the output once the future resolved. Later calls return `None`.
    pub fn data(&mut self) -> Option<T> {
        let future = self.future.as_mut()?;
        let waker = std::task::Waker::noop();
        let mut cx = Context::from_waker(waker);
        match Pin::new(future).poll(&mut cx) {
            std::task::Poll::Ready(r) => {
                self.future = None;
                Some(r)
            }
            std::task::Poll::Pending => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.future.is_none()
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[test]
    fn ready_future_yields_once() {
        let mut task = AsyncTask::new(async { 42 }.boxed());
        assert_eq!(Some(42), task.data());
        assert!(task.is_finished());
        assert_eq!(None, task.data());
    }

    #[test]
    fn pending_until_sender_fires() {
        let (tx, rx) = futures::channel::oneshot::channel::<u8>();
        let mut task = AsyncTask::new(rx.map(|r| r.ok()).boxed());
        assert_eq!(None, task.data());
        assert!(!task.is_finished());
        tx.send(7).unwrap();
        assert_eq!(Some(Some(7)), task.data());
    }
}
