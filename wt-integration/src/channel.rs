use std::sync::mpsc;
use tracing::warn;

/// Abstraction over a channel sender, so engine/adapter code can be
/// generic over "however this queue happens to be wired" without
/// depending on a specific channel implementation. Built on
/// `std::sync::mpsc` rather than an async runtime: all I/O here is
/// synchronous, there is no cooperative scheduler.
pub trait Tx
where
    Self: Clone + Send,
{
    type Item;
    type Error;
    fn send(&self, item: Self::Item) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone)]
pub struct ChannelTx<T> {
    tx: mpsc::Sender<T>,
}

impl<T> ChannelTx<T> {
    pub fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }
}

impl<T> Tx for ChannelTx<T>
where
    T: Clone + Send,
{
    type Item = T;
    type Error = mpsc::SendError<T>;

    fn send(&self, item: Self::Item) -> Result<(), Self::Error> {
        self.tx.send(item)
    }
}

pub fn channel<T>() -> (ChannelTx<T>, mpsc::Receiver<T>) {
    let (tx, rx) = mpsc::channel();
    (ChannelTx::new(tx), rx)
}

/// A channel sender that silently downgrades to a no-op once its
/// receiver is dropped, logging a single `WARN` at the moment of
/// disconnect rather than on every subsequent send. Used for the
/// engine's fan-out channels where a lagging/dead subscriber must never
/// be allowed to panic the hot tick path.
#[derive(Debug, Clone)]
pub struct ChannelTxDroppable<ChannelTx> {
    state: ChannelState<ChannelTx>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum ChannelState<Tx> {
    Active(Tx),
    Disabled,
}

impl<T> ChannelTxDroppable<T> {
    pub fn new(tx: T) -> Self {
        Self {
            state: ChannelState::Active(tx),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.state, ChannelState::Disabled)
    }
}

impl<T> ChannelTxDroppable<T>
where
    T: Tx,
{
    pub fn send(&mut self, item: T::Item) {
        let ChannelState::Active(tx) = &self.state else {
            return;
        };

        if tx.send(item).is_err() {
            let name = std::any::type_name::<T::Item>();
            warn!(name, "channel receiver dropped - items will no longer be sent");
            self.state = ChannelState::Disabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disables_after_receiver_drop() {
        let (tx, rx) = channel::<u32>();
        let mut droppable = ChannelTxDroppable::new(tx);
        drop(rx);

        assert!(!droppable.is_disabled());
        droppable.send(1);
        assert!(droppable.is_disabled());
        // Subsequent sends are silent no-ops.
        droppable.send(2);
    }
}
