//! Collision-free names for implicitly named constraints and indexes.

use std::collections::HashSet;

/// Issues names that are unique within one generation pass.
///
/// Names compare ASCII case-insensitively, since unquoted identifiers fold
/// case in PostgreSQL.
#[derive(Debug, Clone, Default)]
pub struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the allocator with names that must never be issued.
    pub fn with_existing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allocator = Self::new();
        for name in names {
            allocator.reserve(name.as_ref());
        }
        allocator
    }

    /// Records a name without modifying it.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_ascii_lowercase());
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(&name.to_ascii_lowercase())
    }

    /// Returns `base` if free, otherwise `base1`, `base2`, ... whichever is
    /// free first. The returned name is recorded.
    pub fn allocate(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut suffix = 1usize;
        while self.is_used(&name) {
            name = format!("{base}{suffix}");
            suffix += 1;
        }
        tracing::trace!(base, name = %name, "allocated name");
        self.reserve(&name);
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_base_gets_suffixes() {
        let mut names = NameAllocator::new();
        let issued: Vec<String> = (0..3).map(|_| names.allocate("FK_A_TO_B")).collect();
        assert_eq!(issued, vec!["FK_A_TO_B", "FK_A_TO_B1", "FK_A_TO_B2"]);
    }

    #[test]
    fn test_seeded_names_are_skipped() {
        let mut names = NameAllocator::with_existing(["IDX_users", "IDX_users1"]);
        assert_eq!(names.allocate("IDX_users"), "IDX_users2");
    }

    #[test]
    fn test_allocation_skips_taken_suffix() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate("FK_A_TO_B1"), "FK_A_TO_B1");
        assert_eq!(names.allocate("FK_A_TO_B"), "FK_A_TO_B");
        assert_eq!(names.allocate("FK_A_TO_B"), "FK_A_TO_B2");
    }

    #[test]
    fn test_case_insensitive_collision() {
        let mut names = NameAllocator::with_existing(["fk_a_to_b"]);
        assert_eq!(names.allocate("FK_A_TO_B"), "FK_A_TO_B1");
    }
}
