//! Byzantine quorum math.

/// Minimum number of matching observations that tolerates `f` faulty oracles.
pub fn byzantine_quorum(f: usize) -> usize {
    2 * f + 1
}

/// Whether `count` observations reach the 2f+1 quorum.
///
/// A committee that cannot tolerate `f` faults (`n <= 3f`) never reaches quorum.
pub fn observation_count_reaches_quorum(n: usize, f: usize, count: usize) -> bool {
    n > 3 * f && count >= byzantine_quorum(f)
}
