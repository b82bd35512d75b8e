#![allow(clippy::struct_excessive_bools)]

/// Configuration options for the JSON decoder.
///
/// These options control how strictly the decoder reads its input and what
/// it does with data that does not fit the descriptor being decoded.
///
/// # Examples
///
/// ```rust
/// use jsondecode::DecoderOptions;
///
/// let options = DecoderOptions {
///     is_lenient: true,
///     ignore_unknown_keys: true,
///     ..Default::default()
/// };
/// let value: Vec<i32> = jsondecode::from_str("[1, \"2\", 3]", options).unwrap();
/// assert_eq!(value, vec![1, 2, 3]);
/// ```
///
/// # Default
///
/// All options default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecoderOptions {
    /// Whether to accept unquoted scalars where a string is expected.
    ///
    /// Object keys, string values and enum names may be written as bare
    /// literals (`{key: value}`). Numbers and booleans are always accepted in
    /// either quoted or unquoted form; this option does not relax the
    /// spelling of `true` and `false`.
    ///
    /// # Default
    ///
    /// `false`
    pub is_lenient: bool,

    /// Whether to skip object keys that the descriptor does not know.
    ///
    /// When `false`, an unknown key is a decoding error naming the key. When
    /// `true`, the whole value following the key is skipped, including any
    /// nested objects and arrays.
    ///
    /// # Default
    ///
    /// `false`
    pub ignore_unknown_keys: bool,

    /// Whether to treat unusable field values as absent.
    ///
    /// When enabled, a `null` given for a non-nullable field and an unknown
    /// literal given for an enum field are consumed and skipped, as if the
    /// key had not been present at all. The caller then applies its own
    /// default for the field. This is data loss, not error suppression.
    ///
    /// # Default
    ///
    /// `false`
    pub coerce_input_values: bool,

    /// Whether to accept non-finite floating point values.
    ///
    /// When enabled, float fields accept the textual forms understood by
    /// Rust's float parser, e.g. `NaN`, `Infinity`, `-inf`, quoted or not.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_special_floating_point_values: bool,

    /// Whether content may follow the root value.
    ///
    /// By default [`from_str`](crate::from_str) requires that nothing but
    /// whitespace remains once the root value has been decoded.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_trailing_content: bool,

    #[cfg(any(test, feature = "fuzzing"))]
    #[cfg_attr(feature = "serde", serde(skip))]
    /// Panic on decoding errors instead of returning them.
    ///
    /// Enabled only in test builds to produce backtraces on decode failures.
    pub panic_on_error: bool,
}
