use clap::ValueEnum;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// Opening hours of the airport and the base turnaround they come with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OperatingWindow {
    /// 13:00 to 18:00, half-hour turnarounds.
    #[default]
    Set1,
    /// 13:00 to 15:30, one-hour turnarounds.
    Set2,
}

impl OperatingWindow {
    pub fn open(self) -> f64 {
        13.0
    }

    pub fn close(self) -> f64 {
        match self {
            OperatingWindow::Set1 => 18.0,
            OperatingWindow::Set2 => 15.5,
        }
    }

    pub fn base_turnaround(self) -> f64 {
        match self {
            OperatingWindow::Set1 => 0.5,
            OperatingWindow::Set2 => 1.0,
        }
    }
}

/// Rounds to the micro-hour so that equal grid points compare equal.
#[inline]
pub fn snap(t: f64) -> f64 {
    (t * 1e6).round() / 1e6
}

/// Number of whole steps fitting in `span`, tolerant to float noise.
#[inline]
fn steps_in(span: f64, step: f64) -> usize {
    (span / step + 1e-9).floor().max(0.0) as usize
}

/// Draws `n` ground windows: the arrival lies on the `step`-spaced grid of the
/// operating window, the turnaround is `base + j * step` for a uniform `j`
/// with `j * step <= base`. `turnover = 0` selects the window's own base.
pub fn sample_windows(rng: &mut impl Rng, n: usize, window: OperatingWindow, time_disc: f64, turnover: f64) -> Vec<(f64, f64)> {
    let step = time_disc / 60.0;
    let base = if turnover == 0.0 { window.base_turnaround() } else { turnover };

    let rand_slot = Uniform::new_inclusive(0, steps_in(window.close() - window.open(), step));
    let rand_extra = Uniform::new_inclusive(0, steps_in(base, step));

    let mut windows = Vec::with_capacity(n);
    for _ in 0..n {
        let arrival = snap(window.open() + rand_slot.sample(rng) as f64 * step);
        let turnaround = base + rand_extra.sample(rng) as f64 * step;
        windows.push((arrival, snap(arrival + turnaround)));
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    #[test]
    fn arrivals_stay_on_the_grid_inside_the_window() {
        let mut rng = ChaChaRng::seed_from_u64(7);
        let windows = sample_windows(&mut rng, 200, OperatingWindow::Set2, 15.0, 0.0);
        for (a, d) in windows {
            assert!((13.0..=15.5).contains(&a));
            let slot = (a - 13.0) / 0.25;
            assert!((slot - slot.round()).abs() < 1e-6);
            assert!(d - a >= 1.0 - 1e-9);
            assert!(d - a <= 2.0 + 1e-9);
        }
    }

    #[test]
    fn explicit_turnover_overrides_the_window_base() {
        let mut rng = ChaChaRng::seed_from_u64(3);
        let windows = sample_windows(&mut rng, 50, OperatingWindow::Set1, 60.0, 2.0);
        for (a, d) in windows {
            let tat = d - a;
            assert!([2.0, 3.0, 4.0].iter().any(|t| (tat - t).abs() < 1e-6));
        }
    }

    #[test]
    fn grid_points_compare_exactly() {
        // 13 + 3 * (10/60) + 0.5 must equal 13 + 6 * (10/60) bit for bit
        let step = 10.0 / 60.0;
        let departure = snap(snap(13.0 + 3.0 * step) + 0.5);
        let arrival = snap(13.0 + 6.0 * step);
        assert_eq!(departure, arrival);
    }
}
