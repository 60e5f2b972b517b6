use alloc::borrow::Cow;

/// How classes and enums are laid out in the tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Classes are maps keyed by element name, enums are variant names.
    ///
    /// Keys may appear in any order when decoding.
    #[default]
    Keyed,
    /// Classes are sequences in element order, enums are variant indices.
    ///
    /// Decoding reads elements sequentially without looking at keys.
    Positional,
}

/// Configuration of a [`TreeFormat`](crate::TreeFormat).
///
/// # Examples
///
/// ```
/// use vc_tree::{Layout, TreeConfig};
///
/// let config = TreeConfig::default();
/// assert_eq!(config.layout, Layout::Keyed);
/// assert!(!config.ignore_unknown_keys);
/// assert_eq!(config.type_key, "type");
///
/// let config = TreeConfig::positional().with_type_key("@type");
/// assert_eq!(config.layout, Layout::Positional);
/// assert_eq!(config.type_key, "@type");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    /// The layout of classes and enums.
    pub layout: Layout,
    /// Skip keys that name no element instead of failing.
    ///
    /// Only meaningful for [`Layout::Keyed`].
    pub ignore_unknown_keys: bool,
    /// The key holding the serial name of a polymorphic value.
    pub type_key: Cow<'static, str>,
}

impl TreeConfig {
    /// The default keyed configuration.
    #[inline]
    pub const fn keyed() -> Self {
        Self {
            layout: Layout::Keyed,
            ignore_unknown_keys: false,
            type_key: Cow::Borrowed("type"),
        }
    }

    /// A positional configuration.
    #[inline]
    pub const fn positional() -> Self {
        Self {
            layout: Layout::Positional,
            ignore_unknown_keys: false,
            type_key: Cow::Borrowed("type"),
        }
    }

    /// Sets [`ignore_unknown_keys`](Self::ignore_unknown_keys).
    #[inline]
    pub fn with_ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.ignore_unknown_keys = ignore;
        self
    }

    /// Sets [`type_key`](Self::type_key).
    #[inline]
    pub fn with_type_key(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.type_key = key.into();
        self
    }
}

impl Default for TreeConfig {
    #[inline]
    fn default() -> Self {
        Self::keyed()
    }
}
