//! Resource claiming.
//!
//! A design requests the board signals it uses from a [`ResourcePool`]. Each
//! (name, index) can be handed out once; the descriptor itself is never
//! modified.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{PlatformError, Result};
use crate::platform::PlatformDescriptor;
use crate::signal::{Signal, SignalName};

/// Tracks which signals of one platform are in use.
#[derive(Debug)]
pub struct ResourcePool<'a> {
    platform: &'a PlatformDescriptor,
    claimed: HashSet<SignalName>,
}

impl<'a> ResourcePool<'a> {
    pub fn new(platform: &'a PlatformDescriptor) -> Self {
        Self {
            platform,
            claimed: HashSet::new(),
        }
    }

    /// Claim a specific signal.
    pub fn request(&mut self, name: &str, index: u32) -> Result<&'a Signal> {
        let signal = self.platform.signal(name, index)?;
        if !self.claimed.insert(signal.name.clone()) {
            return Err(PlatformError::AlreadyClaimed {
                name: name.to_string(),
                index,
            });
        }
        debug!(signal = %signal.name, "claimed");
        Ok(signal)
    }

    /// Claim the first unclaimed index of `name`, in declaration order.
    pub fn request_next(&mut self, name: &str) -> Result<&'a Signal> {
        let platform = self.platform;
        let mut declared = false;
        for index in platform.indices(name) {
            declared = true;
            if !self.is_claimed(name, index) {
                return self.request(name, index);
            }
        }
        if declared {
            Err(PlatformError::NoFreeResource {
                name: name.to_string(),
            })
        } else {
            Err(PlatformError::UnknownSignal {
                name: name.to_string(),
                index: 0,
            })
        }
    }

    pub fn is_claimed(&self, name: &str, index: u32) -> bool {
        self.claimed.contains(&SignalName::new(name, index))
    }

    /// Return a claimed signal to the pool.
    pub fn release(&mut self, name: &str, index: u32) -> bool {
        self.claimed.remove(&SignalName::new(name, index))
    }

    /// Signals not claimed yet, in declaration order.
    pub fn unclaimed(&self) -> impl Iterator<Item = &'a Signal> + '_ {
        self.platform
            .signals()
            .filter(move |s| !self.claimed.contains(&s.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boards;

    #[test]
    fn request_once() {
        let p = boards::ecp5_evn().unwrap();
        let mut pool = ResourcePool::new(&p);
        let led = pool.request("user_led", 2).unwrap();
        assert_eq!(led.binding(None).unwrap().pins.pins(), ["C17"]);
        assert!(matches!(
            pool.request("user_led", 2),
            Err(PlatformError::AlreadyClaimed { index: 2, .. })
        ));
        assert!(pool.release("user_led", 2));
        assert!(pool.request("user_led", 2).is_ok());
    }

    #[test]
    fn request_next_walks_indices() {
        let p = boards::ecp5_evn().unwrap();
        let mut pool = ResourcePool::new(&p);
        pool.request("user_led", 0).unwrap();
        assert_eq!(pool.request_next("user_led").unwrap().name.index, 1);
        assert_eq!(pool.request_next("user_led").unwrap().name.index, 2);

        assert_eq!(pool.request_next("user_btn").unwrap().name.index, 0);
        assert!(matches!(
            pool.request_next("user_btn"),
            Err(PlatformError::NoFreeResource { .. })
        ));
        assert!(matches!(
            pool.request_next("no_such_thing"),
            Err(PlatformError::UnknownSignal { .. })
        ));
    }

    #[test]
    fn unclaimed_shrinks() {
        let p = boards::ecp5_evn().unwrap();
        let mut pool = ResourcePool::new(&p);
        let before = pool.unclaimed().count();
        pool.request("spiflash", 0).unwrap();
        assert_eq!(pool.unclaimed().count(), before - 1);
        assert!(pool.is_claimed("spiflash", 0));
        assert!(!pool.is_claimed("spiflash4x", 0));
    }
}
