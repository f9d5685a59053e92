//! Reference memoization.
//!
//! Keeps the identity of a logical reference stable while its value does not
//! change, so a new-but-equal reference does not restart a subscription.

/// Return `previous` if it equals `next`, else `next`
pub fn keep_if_equal<R: Clone>(previous: Option<&R>, next: R, eq: impl Fn(&R, &R) -> bool) -> R {
    match previous {
        Some(previous) if eq(previous, &next) => previous.clone(),
        _ => next,
    }
}

/// Holds the last distinct value of an optional reference
#[derive(Debug, Clone)]
pub struct Distinct<R> {
    current: Option<R>,
    seeded: bool,
}

impl<R> Default for Distinct<R> {
    fn default() -> Self {
        Self {
            current: None,
            seeded: false,
        }
    }
}

impl<R> Distinct<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&R> {
        self.current.as_ref()
    }

    /// Replace the held value unless `eq` says it is unchanged.
    ///
    /// Returns true when the value changed. The first update always counts as a
    /// change, even to `None`.
    pub fn update(&mut self, next: Option<R>, eq: impl Fn(&R, &R) -> bool) -> bool {
        let changed = match (&self.current, &next) {
            (Some(current), Some(next)) => !eq(current, next),
            (None, None) => !self.seeded,
            _ => true,
        };
        if changed {
            self.current = next;
        }
        self.seeded = true;
        changed
    }
}
