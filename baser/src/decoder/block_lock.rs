//! Receive block lock and bit error rate monitor, after IEEE 802.3 clause 49.

use log::info;

use crate::constants::block_lock::*;
use crate::error::ConfigError;
use crate::fsm::Fsm;

/// Block lock and BER monitor parameters, counted in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLockConfig {
    /// Valid sync headers in a row required to acquire lock.
    pub lock_count: usize,
    /// Invalid sync headers within `lock_count` headers that drop lock.
    pub unlock_invalid_count: usize,
    /// Blocks ignored after each slip while the aligner settles.
    pub slip_holdoff: usize,
    /// Length of one BER window.
    pub ber_window: usize,
    /// Invalid sync headers within one window that assert high BER.
    pub ber_threshold: usize,
}

impl Default for BlockLockConfig {
    fn default() -> Self {
        Self {
            lock_count: LOCK_COUNT,
            unlock_invalid_count: UNLOCK_INVALID_COUNT,
            slip_holdoff: SLIP_HOLDOFF,
            ber_window: COUNT_125US,
            ber_threshold: BER_THRESHOLD,
        }
    }
}

impl BlockLockConfig {
    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_count == 0 {
            return Err(ConfigError::BadBlockLock("lock count must be positive".to_string()));
        }
        if self.unlock_invalid_count == 0 || self.unlock_invalid_count > self.lock_count {
            return Err(ConfigError::BadBlockLock(format!(
                "unlock count {} is not in 1..={}",
                self.unlock_invalid_count, self.lock_count
            )));
        }
        if self.ber_window == 0 || self.ber_threshold == 0 {
            return Err(ConfigError::BadBlockLock("BER window and threshold must be positive".to_string()));
        }
        Ok(())
    }
}

/// Block lock state machine.
///
/// Input is the validity of each received sync header; output is a bit slip request for the
/// receive aligner. While unlocked, every invalid header requests a slip, then the next
/// `slip_holdoff` headers are ignored.
#[derive(Debug, Clone)]
pub struct BlockLock {
    config: BlockLockConfig,
    locked: bool,
    sh_count: usize,
    sh_invalid_count: usize,
    holdoff: usize,
}

impl BlockLock {
    /// Creates an unlocked state machine.
    pub fn new(config: BlockLockConfig) -> Self {
        Self { config, locked: false, sh_count: 0, sh_invalid_count: 0, holdoff: 0 }
    }

    /// Returns true while block lock is held.
    pub fn locked(&self) -> bool { self.locked }

    fn slip(&mut self) -> bool {
        self.sh_count = 0;
        self.sh_invalid_count = 0;
        self.holdoff = self.config.slip_holdoff;
        true
    }
}

impl Fsm for BlockLock {
    type Input = bool;
    type Output = bool;

    fn step(&mut self, valid: bool) -> bool {
        if self.holdoff > 0 {
            self.holdoff -= 1;
            return false;
        }

        self.sh_count += 1;

        if !self.locked {
            if !valid {
                return self.slip();
            }
            if self.sh_count == self.config.lock_count {
                info!("block lock acquired");
                self.locked = true;
                self.sh_count = 0;
            }
            return false;
        }

        if !valid {
            self.sh_invalid_count += 1;
            if self.sh_invalid_count == self.config.unlock_invalid_count {
                info!("block lock lost");
                self.locked = false;
                return self.slip();
            }
        }
        if self.sh_count == self.config.lock_count {
            self.sh_count = 0;
            self.sh_invalid_count = 0;
        }
        false
    }

    fn reset(&mut self) { *self = Self::new(self.config); }
}

/// High BER monitor.
///
/// Input is the validity of each received sync header; output is the high BER flag.
#[derive(Debug, Clone)]
pub struct BerMonitor {
    config: BlockLockConfig,
    high_ber: bool,
    invalid_count: usize,
    timer: usize,
}

impl BerMonitor {
    /// Creates a monitor with high BER deasserted.
    pub fn new(config: BlockLockConfig) -> Self { Self { config, high_ber: false, invalid_count: 0, timer: 0 } }

    /// Returns the high BER flag.
    pub fn high_ber(&self) -> bool { self.high_ber }
}

impl Fsm for BerMonitor {
    type Input = bool;
    type Output = bool;

    fn step(&mut self, valid: bool) -> bool {
        if !valid && self.invalid_count < self.config.ber_threshold {
            self.invalid_count += 1;
            if self.invalid_count == self.config.ber_threshold && !self.high_ber {
                info!("high BER asserted");
                self.high_ber = true;
            }
        }

        self.timer += 1;
        if self.timer == self.config.ber_window {
            if self.invalid_count < self.config.ber_threshold && self.high_ber {
                info!("high BER cleared");
                self.high_ber = false;
            }
            self.invalid_count = 0;
            self.timer = 0;
        }

        self.high_ber
    }

    fn reset(&mut self) { *self = Self::new(self.config); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BlockLockConfig { BlockLockConfig { ber_window: 100, ..Default::default() } }

    #[test]
    fn lock_after_valid_headers() {
        let mut lock = BlockLock::new(config());
        let slips = lock.run(std::iter::repeat(true).take(63));
        assert!(slips.iter().all(|s| !s));
        assert!(!lock.locked());
        assert!(!lock.step(true));
        assert!(lock.locked());
    }

    #[test]
    fn slip_holdoff() {
        let mut lock = BlockLock::new(config());
        assert!(lock.step(false));
        // Invalid headers during the hold-off are ignored.
        assert!(lock.run(std::iter::repeat(false).take(SLIP_HOLDOFF)).iter().all(|s| !s));
        assert!(lock.step(false));
    }

    #[test]
    fn invalid_header_restarts_count() {
        let mut lock = BlockLock::new(BlockLockConfig { slip_holdoff: 0, ..config() });
        lock.run(std::iter::repeat(true).take(40));
        assert!(lock.step(false));
        lock.run(std::iter::repeat(true).take(63));
        assert!(!lock.locked());
        lock.step(true);
        assert!(lock.locked());
    }

    #[test]
    fn lose_lock() {
        let mut lock = BlockLock::new(config());
        lock.run(std::iter::repeat(true).take(64));
        assert!(lock.locked());

        // Up to 15 invalid headers per 64 are tolerated.
        let pattern = (0..64).map(|i| i % 8 != 0);
        assert!(lock.run(pattern.clone().chain(pattern)).iter().all(|s| !s));
        assert!(lock.locked());

        let slips = lock.run(std::iter::repeat(false).take(16));
        assert_eq!(slips.iter().filter(|s| **s).count(), 1);
        assert!(slips[15]);
        assert!(!lock.locked());
    }

    #[test]
    fn ber_monitor() {
        let mut ber = BerMonitor::new(config());
        assert!(!ber.run(std::iter::repeat(false).take(15)).iter().any(|h| *h));
        assert!(ber.step(false));

        // Stays asserted until a window ends with fewer invalid headers.
        assert!(ber.run(std::iter::repeat(true).take(84)).iter().all(|h| *h));
        assert!(ber.run(std::iter::repeat(true).take(99)).iter().all(|h| *h));
        assert!(!ber.step(true));
    }

    #[test]
    fn ber_monitor_holds_over_bad_window() {
        let mut ber = BerMonitor::new(config());
        ber.run(std::iter::repeat(false).take(100));
        assert!(ber.high_ber());
        ber.run(std::iter::repeat(false).take(100));
        assert!(ber.high_ber());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut lock = BlockLock::new(config());
        lock.run(std::iter::repeat(true).take(64));
        lock.reset();
        lock.reset();
        assert!(!lock.locked());
        assert!(lock.run(std::iter::repeat(true).take(63)).iter().all(|s| !s));
        assert!(!lock.locked());
    }

    #[test]
    fn validate() {
        assert_eq!(BlockLockConfig::default().validate(), Ok(()));
        assert!(BlockLockConfig { lock_count: 0, ..Default::default() }.validate().is_err());
        assert!(BlockLockConfig { ber_window: 0, ..Default::default() }.validate().is_err());
    }
}
