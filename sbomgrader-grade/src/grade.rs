//! [`Grade`] — `A..=F`, with comparison and one-step-down ("lower")
//! semantics matching `original_source/sbomgrader/core/enums.py::Grade`
//! (character-code stepping, clamped at `F`).

/// A letter grade, `A` (best) through `F` (worst).
///
/// Declaration order doubles as severity order: the derived `Ord` makes `A`
/// the smallest and `F` the largest, so "worst grade across a bundle" is
/// simply `Iterator::max` (spec.md §9, ambiguity 4).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString,
)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    /// One step worse, clamped at `F` — spec.md §4.5 "decrement one step
    /// per unsuccessful SHOULD rule, clamped at F".
    #[must_use]
    pub fn lower(self) -> Grade {
        match self {
            Grade::A => Grade::B,
            Grade::B => Grade::C,
            Grade::C => Grade::D,
            Grade::D => Grade::E,
            Grade::E | Grade::F => Grade::F,
        }
    }

    /// `true` if `self` is at least as good as `passing` — the "A > B >
    /// ... > F; at least B means A or B" exit-code rule from spec.md §6.
    /// Exposed as a pure function; the exit code itself is a host concern
    /// (command-line handling is a Non-goal).
    #[must_use]
    pub fn passes(self, passing: Grade) -> bool {
        self <= passing
    }
}
