//! Configurable limits for bounded parsing.

/// Container-level limits for header and group parsing.
///
/// These limits are enforced during parsing to prevent resource exhaustion
/// on corrupt or hostile inputs. Residual-block sanity bounds belong to the
/// codec layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of metadata entries.
    pub max_metadata_entries: usize,

    /// Maximum number of attribute descriptors.
    pub max_attributes: usize,

    /// Maximum length of a single string, in bytes.
    pub max_string_len: usize,

    /// Maximum number of groups.
    pub max_groups: usize,

    /// Maximum declared vertex count.
    pub max_vertices: usize,

    /// Maximum declared face count.
    pub max_faces: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_metadata_entries: 256,
            max_attributes: 64,
            // String lengths are u16 on the wire anyway
            max_string_len: 65_534,
            max_groups: 65_536,
            max_vertices: 100_000_000,
            max_faces: 100_000_000,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_metadata_entries: 8,
            max_attributes: 8,
            max_string_len: 256,
            max_groups: 16,
            max_vertices: 4096,
            max_faces: 4096,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_metadata_entries: usize::MAX,
            max_attributes: usize::MAX,
            max_string_len: usize::MAX,
            max_groups: usize::MAX,
            max_vertices: usize::MAX,
            max_faces: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_reasonable() {
        let limits = Limits::default();
        assert!(limits.max_attributes >= 8, "should allow common attributes");
        assert!(
            limits.max_vertices >= 1_000_000,
            "should allow large meshes"
        );
    }

    #[test]
    fn testing_limits_smaller() {
        let test_limits = Limits::for_testing();
        let default_limits = Limits::default();

        assert!(test_limits.max_metadata_entries < default_limits.max_metadata_entries);
        assert!(test_limits.max_attributes < default_limits.max_attributes);
        assert!(test_limits.max_vertices < default_limits.max_vertices);
    }

    #[test]
    fn unlimited_limits() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_vertices, usize::MAX);
        assert_eq!(limits.max_faces, usize::MAX);
    }

    #[test]
    fn limits_equality() {
        assert_eq!(Limits::default(), Limits::default());
        assert_ne!(Limits::default(), Limits::for_testing());
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.max_attributes, 8);
    }
}
