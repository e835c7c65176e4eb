//! Synthesized input for automatic players.
//!
//! An `InputProducer` is a pure traffic generator: it picks uniformly
//! random slots and feeds them to its player's handle, which applies the
//! usual acceptance rules (frozen, table not ready, queue full). It knows
//! nothing about the submission protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::{GameRng, SlotId};
use crate::player::PlayerHandle;

/// A running input-producer thread.
///
/// Owned by the player worker it feeds; the worker signals and joins it
/// before exiting.
pub struct InputProducer {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl InputProducer {
    /// Spawn a producer feeding `handle`, throttled to one event per
    /// `throttle`.
    pub fn spawn(
        handle: PlayerHandle,
        slot_count: usize,
        mut rng: GameRng,
        throttle: Duration,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name(format!("producer-{}", handle.id().index()))
            .spawn(move || {
                log::info!("input producer for {} starting", handle.id());
                while !stop_flag.load(Ordering::Acquire) {
                    let slot = SlotId::new(rng.gen_range(0..slot_count) as u8);
                    handle.submit_input(slot);
                    thread::sleep(throttle);
                }
                log::info!("input producer for {} terminated", handle.id());
            })
            .expect("failed to spawn input producer thread");
        Self { stop, thread }
    }

    /// Signal the producer to stop and wait for it to exit.
    pub fn stop_and_join(self) {
        self.stop.store(true, Ordering::Release);
        let _ = self.thread.join();
    }
}
