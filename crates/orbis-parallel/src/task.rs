//! The unit of work executed once per index.

/// Work executed for every index of a parallel loop.
///
/// Each spawned worker receives its own value obtained through [`copy`](Self::copy)
/// before its chunk starts, so per-call scratch state (a color mixer, a row buffer)
/// never needs synchronization. A task whose state is already safe to share can
/// return a cheap handle to the same state.
pub trait ParallelTask: Send {
    /// Process a single index.
    fn run(&mut self, index: usize);

    /// Produce the instance a worker thread will own.
    fn copy(&self) -> Self
    where
        Self: Sized;
}

/// Adapts a cloneable closure into a [`ParallelTask`].
///
/// The closure is cloned once per worker, so captured scratch buffers are private
/// to each thread while captured references are shared.
#[derive(Clone)]
pub struct FnTask<F>(pub F);

impl<F> ParallelTask for FnTask<F>
where
    F: FnMut(usize) + Clone + Send,
{
    fn run(&mut self, index: usize) {
        (self.0)(index)
    }

    fn copy(&self) -> Self {
        FnTask(self.0.clone())
    }
}
