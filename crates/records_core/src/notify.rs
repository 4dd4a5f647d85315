//! Change notification channel.
//!
//! # Responsibility
//! - Register observers against record addresses.
//! - Signal observers when data behind an address changed.
//!
//! # Invariants
//! - Notifications carry no payload; observers re-query to learn new state.
//! - Observers are invoked without the registry lock held, so they may call
//!   back into the store or this notifier.
//! - Registration, removal and publish are safe from any thread.
//! - Observers that report themselves disconnected are dropped by the
//!   publish that noticed it.

use crate::address::Address;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Receives change signals for a subscribed address.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, address: &Address);

    /// `false` once the observer can no longer receive signals.
    fn is_connected(&self) -> bool {
        true
    }
}

impl<F> ChangeObserver for F
where
    F: Fn(&Address) + Send + Sync,
{
    fn on_change(&self, address: &Address) {
        self(address)
    }
}

/// Opaque handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(Uuid);

struct Registration {
    handle: SubscriptionHandle,
    address: Address,
    observer: Arc<dyn ChangeObserver>,
}

struct ChannelObserver {
    sender: Sender<Address>,
    connected: AtomicBool,
}

impl ChangeObserver for ChannelObserver {
    fn on_change(&self, address: &Address) {
        if self.sender.send(*address).is_err() {
            self.connected.store(false, Ordering::Release);
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Publish/subscribe registry shared between the store and its observers.
#[derive(Default)]
pub struct ChangeNotifier {
    registrations: Mutex<Vec<Registration>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` for changes on `address` (and, for item
    /// addresses, collection-wide changes).
    pub fn subscribe(
        &self,
        address: Address,
        observer: impl ChangeObserver + 'static,
    ) -> SubscriptionHandle {
        self.subscribe_arc(address, Arc::new(observer))
    }

    /// Same as `subscribe` for an already shared observer.
    pub fn subscribe_arc(
        &self,
        address: Address,
        observer: Arc<dyn ChangeObserver>,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle(Uuid::new_v4());
        self.lock().push(Registration {
            handle,
            address,
            observer,
        });
        debug!("event=observer_subscribe module=notify status=ok address={address}");
        handle
    }

    /// Subscribes a channel; each change is delivered as the published
    /// address. Useful when the consumer lives on another thread.
    pub fn subscribe_channel(&self, address: Address) -> (SubscriptionHandle, Receiver<Address>) {
        let (sender, receiver) = mpsc::channel();
        let handle = self.subscribe(
            address,
            ChannelObserver {
                sender,
                connected: AtomicBool::new(true),
            },
        );
        (handle, receiver)
    }

    /// Removes a subscription. Returns `false` when the handle is unknown.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut registrations = self.lock();
        let before = registrations.len();
        registrations.retain(|registration| registration.handle != handle);
        before != registrations.len()
    }

    /// Signals every observer affected by a change on `address`.
    ///
    /// Returns the number of observers invoked.
    pub fn publish(&self, address: &Address) -> usize {
        let observers = self
            .lock()
            .iter()
            .filter(|registration| registration.address.is_notified_by(address))
            .map(|registration| (registration.handle, Arc::clone(&registration.observer)))
            .collect::<Vec<_>>();

        for (_, observer) in &observers {
            observer.on_change(address);
        }

        let disconnected = observers
            .iter()
            .filter(|(_, observer)| !observer.is_connected())
            .map(|(handle, _)| *handle)
            .collect::<Vec<_>>();
        if !disconnected.is_empty() {
            self.lock()
                .retain(|registration| !disconnected.contains(&registration.handle));
        }

        debug!(
            "event=change_publish module=notify status=ok address={} observers={} dropped={}",
            address,
            observers.len(),
            disconnected.len()
        );
        observers.len()
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
