use std::sync::mpsc;

pub type Sender<T> = mpsc::Sender<T>;
pub type Receiver<T> = mpsc::Receiver<T>;

// Unbounded: the worker must never block on a slow client while it holds session state.
pub fn channel<T>() -> (Sender<T>, Receiver<T>) {
    mpsc::channel()
}
