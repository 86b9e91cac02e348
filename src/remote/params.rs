//! Query string building for the CI/CD endpoints

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left as-is, matching JavaScript's `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Join `key=value` pairs with `&`, skipping absent or empty values
///
/// Keys are emitted in the given order; values are percent-encoded.
///
/// # Examples
///
/// ```
/// use app_repo_publisher::remote::build_params;
///
/// let query = build_params(&[
///     ("sys_id", Some("123")),
///     ("version", Some("1.1.1")),
///     ("dev_notes", None),
/// ]);
/// assert_eq!(query, "sys_id=123&version=1.1.1");
/// ```
pub fn build_params(options: &[(&str, Option<&str>)]) -> String {
    options
        .iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", key, utf8_percent_encode(v, COMPONENT)))
        })
        .collect::<Vec<_>>()
        .join("&")
}
