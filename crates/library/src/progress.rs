//! Progress events reported to whoever drives a run.

use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Restore,
    Rehome,
    Transform,
    Complete,
}

impl Phase {
    /// The share of the whole run, in percent, this phase reports within.
    pub fn span(self) -> RangeInclusive<u8> {
        match self {
            Phase::Restore => 0..=20,
            Phase::Rehome => 20..=40,
            Phase::Transform => 40..=99,
            Phase::Complete => 100..=100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub phase: Phase,
    /// Overall completion of the run, 0 to 100.
    pub percent: u8,
}

impl Progress {
    pub fn complete() -> Self {
        Self { phase: Phase::Complete, percent: 100 }
    }

    /// `done` out of `total` steps, mapped into `span`. No steps at all counts
    /// as finished.
    pub(crate) fn within(phase: Phase, span: RangeInclusive<u8>, done: usize, total: usize) -> Self {
        let (start, end) = (usize::from(*span.start()), usize::from(*span.end()));
        let percent = match total {
            0 => end,
            total => start + (end.saturating_sub(start) * done.min(total)) / total,
        };
        Self { phase, percent: u8::try_from(percent).unwrap_or(100) }
    }

    pub(crate) fn of(phase: Phase, done: usize, total: usize) -> Self {
        Self::within(phase, phase.span(), done, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Phase::Restore, 0, 10, 0)]
    #[case(Phase::Restore, 5, 10, 10)]
    #[case(Phase::Restore, 10, 10, 20)]
    #[case(Phase::Rehome, 0, 0, 40)]
    #[case(Phase::Transform, 1, 2, 69)]
    #[case(Phase::Transform, 9, 3, 99)]
    fn test_of(#[case] phase: Phase, #[case] done: usize, #[case] total: usize, #[case] expected: u8) {
        assert_eq!(Progress::of(phase, done, total), Progress { phase, percent: expected });
    }

    #[test]
    fn test_within_sub_span() {
        assert_eq!(Progress::within(Phase::Transform, 45..=55, 1, 2).percent, 50);
    }
}
