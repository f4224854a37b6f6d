//! Self-synchronizing 64b/66b scrambler, G(x) = 1 + x^39 + x^58.
//!
//! Both directions run the same shift register, one payload bit at a time from bit 0 to bit
//! 63. The output bit is `state[tap_low] ^ state[tap_high] ^ in_bit`. The scrambler shifts
//! its *output* into the register while the descrambler shifts its *input* in, so that a
//! descrambler recovers after `width` correct bits whatever state it started from.

use crate::constants::scrambler::*;
use crate::error::ConfigError;
use crate::fsm::Fsm;
use crate::utils::{bit, mask_u64};

/// Scrambler shift register configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScramblerConfig {
    /// Low feedback tap.
    pub tap_low: usize,
    /// High feedback tap.
    pub tap_high: usize,
    /// Register width in bits.
    pub width: usize,
    /// Register value after reset. Both ends must agree.
    pub initial_state: u64,
}

impl Default for ScramblerConfig {
    fn default() -> Self { Self { tap_low: TAP_LOW, tap_high: TAP_HIGH, width: WIDTH, initial_state: INITIAL_STATE } }
}

impl ScramblerConfig {
    /// Checks that both taps fall inside the register.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.width > 64 || self.tap_low >= self.width || self.tap_high >= self.width {
            return Err(ConfigError::BadScramblerTaps {
                tap_low: self.tap_low,
                tap_high: self.tap_high,
                width: self.width,
            });
        }
        Ok(())
    }

    fn mask(&self) -> u64 { mask_u64(self.width) }

    #[inline]
    fn feedback(&self, state: u64) -> bool { bit(state, self.tap_low) ^ bit(state, self.tap_high) }
}

/// Scrambles `data` starting from `state`. Returns the scrambled payload and the next state.
pub fn scramble(data: u64, state: u64, config: &ScramblerConfig) -> (u64, u64) {
    let mask = config.mask();
    let mut state = state & mask;
    let mut out = 0;
    for i in 0..64 {
        let b = config.feedback(state) ^ bit(data, i);
        out |= u64::from(b) << i;
        state = ((state << 1) | u64::from(b)) & mask;
    }
    (out, state)
}

/// Descrambles `data` starting from `state`. Returns the plain payload and the next state.
pub fn descramble(data: u64, state: u64, config: &ScramblerConfig) -> (u64, u64) {
    let mask = config.mask();
    let mut state = state & mask;
    let mut out = 0;
    for i in 0..64 {
        let in_bit = bit(data, i);
        let b = config.feedback(state) ^ in_bit;
        out |= u64::from(b) << i;
        state = ((state << 1) | u64::from(in_bit)) & mask;
    }
    (out, state)
}

/// Transmit scrambler.
#[derive(Debug, Clone)]
pub struct Scrambler {
    config: ScramblerConfig,
    state: u64,
}

impl Scrambler {
    /// Creates a scrambler.
    pub fn new(config: ScramblerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, state: config.initial_state & config.mask() })
    }

    /// Returns the register value.
    pub fn state(&self) -> u64 { self.state }
}

impl Fsm for Scrambler {
    type Input = u64;
    type Output = u64;

    fn step(&mut self, data: u64) -> u64 {
        let (out, state) = scramble(data, self.state, &self.config);
        self.state = state;
        out
    }

    fn reset(&mut self) { self.state = self.config.initial_state & self.config.mask(); }
}

/// Receive descrambler.
#[derive(Debug, Clone)]
pub struct Descrambler {
    config: ScramblerConfig,
    state: u64,
}

impl Descrambler {
    /// Creates a descrambler.
    pub fn new(config: ScramblerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, state: config.initial_state & config.mask() })
    }

    /// Returns the register value.
    pub fn state(&self) -> u64 { self.state }
}

impl Fsm for Descrambler {
    type Input = u64;
    type Output = u64;

    fn step(&mut self, data: u64) -> u64 {
        let (out, state) = descramble(data, self.state, &self.config);
        self.state = state;
        out
    }

    fn reset(&mut self) { self.state = self.config.initial_state & self.config.mask(); }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::*;

    #[test]
    fn self_inverse() {
        let config = ScramblerConfig::default();
        let mut rng = StdRng::seed_from_u64(0x66);
        for _ in 0..1000 {
            let data = rng.next_u64();
            let state = rng.next_u64() & mask_u64(WIDTH);
            let (scrambled, next_tx) = scramble(data, state, &config);
            let (plain, next_rx) = descramble(scrambled, state, &config);
            assert_eq!(plain, data);
            assert_eq!(next_tx, next_rx);
        }
    }

    #[test]
    fn zero_state_zero_data() {
        let (out, state) = scramble(0, 0, &ScramblerConfig::default());
        assert_eq!(out, 0);
        assert_eq!(state, 0);
    }

    #[test]
    fn first_bits_pass_through_from_zero_state() {
        // Feedback only reaches the output once a set bit has moved 39 places.
        let (out, _) = scramble(1, 0, &ScramblerConfig::default());
        assert_eq!(out & mask_u64(39), 1);
        assert_eq!(out >> 39 & 1, 1);
    }

    #[test]
    fn descrambler_feeds_back_input() {
        let config = ScramblerConfig::default();
        let data = 0xdead_beef_0123_4567;
        let (_, state) = descramble(data, 0, &config);
        // The register holds the last 58 received bits, most recent in bit 0.
        assert_eq!(state, data.reverse_bits() & mask_u64(WIDTH));
    }

    #[test]
    fn descrambler_self_synchronizes() {
        let config = ScramblerConfig::default();
        let mut scrambler = Scrambler::new(config).unwrap();
        let mut descrambler = Descrambler::new(ScramblerConfig { initial_state: 0x1234_5678, ..config }).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let payloads = (0..8).map(|_| rng.next_u64()).collect::<Vec<_>>();
        let scrambled = scrambler.run(payloads.clone());
        let plain = descrambler.run(scrambled);

        assert_ne!(plain[0], payloads[0]);
        assert_eq!(&plain[1..], &payloads[1..]);
    }

    #[test]
    fn reset_is_idempotent() {
        let config = ScramblerConfig { initial_state: 0x3ff, ..Default::default() };
        let mut scrambler = Scrambler::new(config).unwrap();
        scrambler.step(0x1234);
        scrambler.reset();
        let once = scrambler.state();
        scrambler.reset();
        assert_eq!(scrambler.state(), once);
        assert_eq!(once, 0x3ff);
    }

    #[test]
    fn bad_taps() {
        let config = ScramblerConfig { tap_high: 58, ..Default::default() };
        assert!(matches!(Scrambler::new(config), Err(ConfigError::BadScramblerTaps { .. })));
    }
}
