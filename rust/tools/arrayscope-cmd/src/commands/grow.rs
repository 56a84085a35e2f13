//! Grow command implementation

use anyhow::{Context, Result};
use arrayscope_buffer::GrowableArrayBuffer;

/// One append observed by the grow command.
#[derive(Debug, PartialEq, Eq)]
struct GrowthStep {
    count: usize,
    capacity: usize,
    grew: bool,
}

/// Run the grow command
pub fn run(appends: usize, capacity: usize) -> Result<()> {
    let steps = trace_growth(appends, capacity)?;
    let growths = steps.iter().filter(|s| s.grew).count();
    for step in &steps {
        println!(
            "count={:<8} capacity={:<8}{}",
            step.count,
            step.capacity,
            if step.grew { " grew" } else { "" }
        );
    }
    println!("{appends} appends, {growths} reallocations");
    Ok(())
}

fn trace_growth(appends: usize, capacity: usize) -> Result<Vec<GrowthStep>> {
    let mut buffer = GrowableArrayBuffer::<u64>::with_capacity(capacity)
        .with_context(|| format!("Failed to allocate a buffer of capacity {capacity}"))?;
    let mut steps = Vec::with_capacity(appends);
    for i in 0..appends {
        let before = buffer.capacity()?;
        buffer
            .append(i as u64)
            .with_context(|| format!("Failed to append value {i}"))?;
        let capacity = buffer.capacity()?;
        steps.push(GrowthStep {
            count: buffer.count()?,
            capacity,
            grew: capacity != before,
        });
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_growth_from_two() {
        let steps = trace_growth(5, 2).unwrap();
        let capacities: Vec<_> = steps.iter().map(|s| s.capacity).collect();
        let grew: Vec<_> = steps.iter().map(|s| s.grew).collect();
        assert_eq!(capacities, vec![2, 2, 4, 4, 8]);
        assert_eq!(grew, vec![false, false, true, false, true]);
        assert_eq!(steps.last().unwrap().count, 5);
    }

    #[test]
    fn test_trace_growth_from_empty() {
        let steps = trace_growth(3, 0).unwrap();
        assert_eq!(
            steps[0],
            GrowthStep {
                count: 1,
                capacity: 1,
                grew: true
            }
        );
        assert!(steps.iter().all(|s| s.grew));
    }
}
