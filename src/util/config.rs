//! Configuration for object loading and value rendering.

/// Separator placed between nested compound member names.
///
/// A private-use code point so it never collides with user field names.
pub const MEMBER_SEPARATOR: char = '\u{0095}';

/// Separator used when showing flattened member names to people.
pub const DISPLAY_SEPARATOR: char = '.';

/// Configuration for rendering values as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Text placed between rendered items.
    pub delimiter: String,
    /// Maximum number of items (and characters, for scalar text) to render.
    pub max_items: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            delimiter: ", ".to_string(),
            max_items: None,
        }
    }
}

impl RenderConfig {
    /// Create a render config with the given delimiter and no cap.
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            max_items: None,
        }
    }

    /// Set the item cap.
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }
}

/// Configuration carried by datasets and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectConfig {
    /// Separator joining nested compound member names.
    pub member_separator: char,
    /// Convert fixed-length string bytes to text on read.
    pub convert_byte_to_string: bool,
    /// Rendering defaults.
    pub render: RenderConfig,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            member_separator: MEMBER_SEPARATOR,
            convert_byte_to_string: true,
            render: RenderConfig::default(),
        }
    }
}
