use arrayscope_common::{Result, verify_arg};

/// How the element capacity grows when appending to a full buffer.
///
/// Every policy multiplies the capacity by at least two, which keeps append
/// amortized O(1) and the capacity non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthPolicy {
    /// `max(1, capacity * 2)`.
    #[default]
    Doubling,
    /// `max(1, capacity * factor)`, with `factor >= 2`.
    Factor(usize),
}

impl GrowthPolicy {
    /// Returns the capacity following `current`, or `None` on overflow.
    pub fn next_capacity(&self, current: usize) -> Option<usize> {
        let factor = match *self {
            GrowthPolicy::Doubling => 2,
            GrowthPolicy::Factor(factor) => factor,
        };
        current.checked_mul(factor).map(|c| c.max(1))
    }

    fn factor(&self) -> usize {
        match *self {
            GrowthPolicy::Doubling => 2,
            GrowthPolicy::Factor(factor) => factor,
        }
    }
}

/// Construction options for a buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferOptions {
    /// Number of element slots allocated up front.
    pub initial_capacity: usize,
    pub growth: GrowthPolicy,
}

impl BufferOptions {
    pub fn new() -> BufferOptions {
        Default::default()
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> BufferOptions {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_growth(mut self, growth: GrowthPolicy) -> BufferOptions {
        self.growth = growth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let growth_factor = self.growth.factor();
        verify_arg!(growth_factor, growth_factor >= 2);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_capacity() {
        assert_eq!(GrowthPolicy::Doubling.next_capacity(0), Some(1));
        assert_eq!(GrowthPolicy::Doubling.next_capacity(1), Some(2));
        assert_eq!(GrowthPolicy::Doubling.next_capacity(2), Some(4));
        assert_eq!(GrowthPolicy::Factor(3).next_capacity(0), Some(1));
        assert_eq!(GrowthPolicy::Factor(3).next_capacity(5), Some(15));
        assert_eq!(GrowthPolicy::Doubling.next_capacity(usize::MAX), None);
    }

    #[test]
    fn test_validate() {
        assert!(BufferOptions::new().validate().is_ok());
        assert!(
            BufferOptions::new()
                .with_growth(GrowthPolicy::Factor(4))
                .validate()
                .is_ok()
        );
        let err = BufferOptions::new()
            .with_growth(GrowthPolicy::Factor(1))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("growth_factor"));
    }
}
