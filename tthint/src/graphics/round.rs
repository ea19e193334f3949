//! Rounding state.

use super::super::math::{ceil, floor, round, round_pad};

/// Grid period of one pixel for `SROUND` in 2.14.
pub const GRID_PERIOD: i32 = 0x4000;

/// Grid period of sqrt(2)/2 pixels for `S45ROUND` in 2.14.
pub const GRID_PERIOD_45: i32 = 0x2D41;

/// Rounding strategies supported by the interpreter.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum RoundMode {
    /// Set by `RTG` instruction.
    #[default]
    Grid,
    /// Set by `RTHG` instruction.
    HalfGrid,
    /// Set by `RTDG` instruction.
    DoubleGrid,
    /// Set by `RDTG` instruction.
    DownToGrid,
    /// Set by `RUTG` instruction.
    UpToGrid,
    /// Set by `ROFF` instruction.
    Off,
    /// Set by `SROUND` instruction.
    Super,
    /// Set by `S45ROUND` instruction.
    Super45,
}

/// Graphics state that controls rounding.
///
/// `threshold`, `phase` and `period` are in 26.6 and only apply to the
/// super rounding modes.
///
/// See <https://developer.apple.com/fonts/TrueType-Reference-Manual/RM04/Chap4.html#round%20state>
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RoundState {
    pub mode: RoundMode,
    pub threshold: i32,
    pub phase: i32,
    pub period: i32,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            mode: RoundMode::Grid,
            threshold: 0,
            phase: 0,
            period: 64,
        }
    }
}

impl RoundState {
    /// Rounds `distance` after adding the engine `compensation`.
    ///
    /// Rounding is symmetric around zero and never changes the sign of the
    /// distance: a result that would cross zero collapses to zero (or to
    /// the phase for the super modes).
    pub fn round(&self, distance: i32, compensation: i32) -> i32 {
        use RoundMode::*;
        let (period, phase, threshold) = (self.period, self.phase, self.threshold);
        match self.mode {
            Grid => snap(distance, compensation, 0, round),
            HalfGrid => snap(distance, compensation, 0, |x| floor(x).saturating_add(32)),
            DoubleGrid => snap(distance, compensation, 0, |x| round_pad(x, 32)),
            DownToGrid => snap(distance, compensation, 0, floor),
            UpToGrid => snap(distance, compensation, 0, ceil),
            Off => snap(distance, compensation, 0, |x| x),
            Super => snap(distance, compensation, phase, |x| {
                (x.saturating_add(threshold - phase) & -period).saturating_add(phase)
            }),
            Super45 => snap(distance, compensation, phase, |x| {
                if period == 0 {
                    return phase;
                }
                (x.saturating_add(threshold - phase) / period * period).saturating_add(phase)
            }),
        }
    }

    /// Decomposes an `SROUND` or `S45ROUND` selector into period, phase and
    /// threshold.
    ///
    /// See <https://developer.apple.com/fonts/TrueType-Reference-Manual/RM05/Chap5.html#SROUND>
    pub fn set_super(&mut self, grid_period: i32, selector: i32) {
        let period = match selector & 0xC0 {
            0 => grid_period / 2,
            0x80 => grid_period * 2,
            _ => grid_period,
        };
        let phase = match selector & 0x30 {
            0 => 0,
            0x10 => period / 4,
            0x20 => period / 2,
            _ => period * 3 / 4,
        };
        let threshold = if (selector & 0x0F) == 0 {
            period - 1
        } else {
            ((selector & 0x0F) - 4) * period / 8
        };
        self.period = period >> 8;
        self.phase = phase >> 8;
        self.threshold = threshold >> 8;
    }
}

/// Applies `f` to the magnitude of `distance + compensation`, restoring the
/// sign afterward and clamping to `floor_value` if the sign flipped.
#[inline(always)]
fn snap(distance: i32, compensation: i32, floor_value: i32, f: impl Fn(i32) -> i32) -> i32 {
    if distance >= 0 {
        let value = f(distance.saturating_add(compensation));
        if value < 0 {
            floor_value
        } else {
            value
        }
    } else {
        let value = f(compensation.saturating_sub(distance)).saturating_neg();
        if value > 0 {
            -floor_value
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RoundMode, RoundState, GRID_PERIOD, GRID_PERIOD_45};

    fn state(mode: RoundMode) -> RoundState {
        RoundState {
            mode,
            ..Default::default()
        }
    }

    #[test]
    fn round_to_grid() {
        round_cases(
            RoundMode::Grid,
            &[(0, 0), (32, 64), (-32, -64), (64, 64), (50, 64), (31, 0), (-31, 0)],
        );
    }

    #[test]
    fn round_to_half_grid() {
        round_cases(
            RoundMode::HalfGrid,
            &[(0, 32), (32, 32), (-32, -32), (64, 96), (50, 32), (-100, -96)],
        );
    }

    #[test]
    fn round_to_double_grid() {
        round_cases(
            RoundMode::DoubleGrid,
            &[(0, 0), (32, 32), (-32, -32), (64, 64), (50, 64), (15, 0), (16, 32)],
        );
    }

    #[test]
    fn round_down_to_grid() {
        round_cases(
            RoundMode::DownToGrid,
            &[(0, 0), (32, 0), (-32, 0), (64, 64), (127, 64), (-100, -64)],
        );
    }

    #[test]
    fn round_up_to_grid() {
        round_cases(
            RoundMode::UpToGrid,
            &[(0, 0), (16, 64), (-16, -64), (64, 64), (65, 128), (-100, -128)],
        );
    }

    #[test]
    fn round_off() {
        round_cases(RoundMode::Off, &[(0, 0), (16, 16), (-16, -16), (42, 42)]);
    }

    #[test]
    fn super_round_selectors() {
        let mut state = state(RoundMode::Super);
        state.set_super(GRID_PERIOD, 0x48);
        assert_eq!((state.period, state.phase, state.threshold), (64, 0, 32));
        state.set_super(GRID_PERIOD, 0x98);
        assert_eq!((state.period, state.phase, state.threshold), (128, 32, 64));
        state.set_super(GRID_PERIOD, 0x00);
        assert_eq!((state.period, state.phase, state.threshold), (32, 0, 31));
        state.set_super(GRID_PERIOD_45, 0x48);
        assert_eq!((state.period, state.phase, state.threshold), (45, 0, 22));
    }

    #[test]
    fn super_round_with_phase() {
        let mut state = state(RoundMode::Super);
        // period 1, phase 1/2, threshold 1/2
        state.set_super(GRID_PERIOD, 0x68);
        assert_eq!((state.period, state.phase, state.threshold), (64, 32, 32));
        assert_eq!(state.round(0, 0), 32);
        assert_eq!(state.round(70, 0), 96);
        assert_eq!(state.round(-70, 0), -96);
    }

    #[test]
    fn compensation_is_added_before_rounding() {
        let state = state(RoundMode::Grid);
        assert_eq!(state.round(20, 0), 0);
        assert_eq!(state.round(20, 12), 64);
        assert_eq!(state.round(-20, 12), -64);
        // Compensation can't flip the sign
        assert_eq!(state.round(10, -100), 0);
        assert_eq!(state.round(-10, -100), 0);
    }

    #[test]
    fn rounding_is_idempotent() {
        let mut modes = vec![
            state(RoundMode::Grid),
            state(RoundMode::HalfGrid),
            state(RoundMode::DoubleGrid),
            state(RoundMode::DownToGrid),
            state(RoundMode::UpToGrid),
            state(RoundMode::Off),
        ];
        let mut sround = state(RoundMode::Super);
        sround.set_super(GRID_PERIOD, 0x48);
        modes.push(sround);
        let mut s45round = state(RoundMode::Super45);
        s45round.set_super(GRID_PERIOD_45, 0x48);
        modes.push(s45round);
        for state in modes {
            for distance in -300..300 {
                let once = state.round(distance, 0);
                assert_eq!(state.round(once, 0), once, "{state:?} {distance}");
            }
        }
    }

    #[test]
    fn extreme_distances_saturate() {
        round_cases(
            RoundMode::Grid,
            &[(i32::MAX, 2147483584), (i32::MIN, -2147483584)],
        );
        round_cases(
            RoundMode::HalfGrid,
            &[(i32::MAX, 2147483616), (i32::MIN, -2147483616)],
        );
        round_cases(RoundMode::Off, &[(i32::MAX, i32::MAX), (i32::MIN, -i32::MAX)]);
        let mut sround = state(RoundMode::Super);
        sround.set_super(GRID_PERIOD, 0x68);
        let mut s45round = state(RoundMode::Super45);
        s45round.set_super(GRID_PERIOD_45, 0x48);
        let modes = [
            state(RoundMode::DoubleGrid),
            state(RoundMode::DownToGrid),
            state(RoundMode::UpToGrid),
            sround,
            s45round,
        ];
        for state in modes {
            for compensation in [0, 64, i32::MAX, -i32::MAX] {
                let up = state.round(i32::MAX, compensation);
                let down = state.round(i32::MIN, compensation);
                assert!(up >= 0 && down <= 0, "{state:?} {compensation}");
            }
            assert!(i32::MAX - state.round(i32::MAX, 0) < 128, "{state:?}");
        }
    }

    fn round_cases(mode: RoundMode, cases: &[(i32, i32)]) {
        let state = state(mode);
        for (value, expected) in cases.iter().copied() {
            let result = state.round(value, 0);
            assert_eq!(result, expected, "mismatch in rounding: {mode:?}({value})");
        }
    }
}
