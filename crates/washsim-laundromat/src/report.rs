//! Capacity recommendation derived from the final counts.

/// Share of walked-out students at which expanding the pool is recommended.
pub const EXPANSION_THRESHOLD: f64 = 0.25;

/// Returns whether more machines should be added.
///
/// Recommends expansion when at least [`EXPANSION_THRESHOLD`] of the students
/// walked out without washing. An empty student set never triggers the
/// recommendation (and never divides by zero).
pub fn needs_more_machines(student_count: u32, abandoned: u64) -> bool {
    student_count > 0 && abandoned as f64 / student_count as f64 >= EXPANSION_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::needs_more_machines;

    #[test]
    fn test_recommendation_boundary() {
        // 1 of 4 is exactly the threshold
        assert!(needs_more_machines(4, 1));
        assert!(!needs_more_machines(4, 0));
        assert!(needs_more_machines(4, 4));
        assert!(!needs_more_machines(5, 1));
    }

    #[test]
    fn test_no_students_means_no_recommendation() {
        assert!(!needs_more_machines(0, 0));
    }
}
