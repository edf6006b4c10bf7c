//! File reference resolution.
//!
//! Definition files declare image references relative to the asset root and
//! with whatever separator their author used. Before anything is loaded each
//! reference goes through [`resolve_path`]:
//!
//! 1. separators are normalized to the platform's own,
//! 2. the `THROTTLE` token is replaced by the selected device variant when
//!    the configuration asks for it,
//! 3. references not already under the asset root are joined onto it,
//! 4. the result is lexically cleaned (`.`/`..`/duplicate separators).
//!
//! Resolution is idempotent. A resolved path is clean, lives under the root
//! and no longer contains the token, so resolving it again returns it as-is.

use std::borrow::Cow;
use std::path::MAIN_SEPARATOR;

/// Placeholder replaced by the device variant in file references.
pub const VARIANT_TOKEN: &str = "THROTTLE";

/// Which throttle hardware the asset set should match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceVariant {
    /// Thrustmaster Warthog (`WH`).
    #[default]
    Warthog,
    /// Thrustmaster Cougar (`HC`).
    Cougar,
}

impl DeviceVariant {
    pub fn from_cougar_flag(use_cougar: bool) -> Self {
        if use_cougar { Self::Cougar } else { Self::Warthog }
    }

    /// Replacement text for [`VARIANT_TOKEN`].
    pub fn token(self) -> &'static str {
        match self {
            Self::Warthog => "WH",
            Self::Cougar => "HC",
        }
    }
}

/// Rewrite every `/` and `\` as the platform separator.
pub fn normalize_separators(path: &str) -> String {
    path.chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect()
}

/// Replace the variant token, if present. Returns the input untouched when
/// the token has already been substituted.
pub fn substitute_variant(reference: &str, variant: DeviceVariant) -> Cow<'_, str> {
    if reference.contains(VARIANT_TOKEN) {
        Cow::Owned(reference.replace(VARIANT_TOKEN, variant.token()))
    } else {
        Cow::Borrowed(reference)
    }
}

/// Lexically clean a path: collapse separators, drop `.` segments and fold
/// `..` into its parent where possible. Never touches the filesystem.
///
/// An empty result becomes `"."`, like an empty relative path would.
pub fn clean(path: &str) -> String {
    let path = normalize_separators(path);
    let (prefix, rest) = split_drive(&path);
    let rooted = rest.starts_with(MAIN_SEPARATOR);

    let mut parts: Vec<&str> = Vec::new();
    for segment in rest.split(MAIN_SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // `..` above the root is the root
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let mut out = String::with_capacity(path.len());
    out.push_str(prefix);
    if rooted {
        out.push(MAIN_SEPARATOR);
    }
    out.push_str(&parts.join(&MAIN_SEPARATOR.to_string()));
    if out.is_empty() {
        out.push('.');
    }
    out
}

/// Split a leading `X:` drive designator off the path.
fn split_drive(path: &str) -> (&str, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        path.split_at(2)
    } else {
        ("", path)
    }
}

/// Whether `child` lies strictly below `parent`, compared on cleaned paths.
pub fn is_path_inside(parent: &str, child: &str) -> bool {
    if parent.is_empty() {
        return false;
    }
    let mut parent = clean(parent);
    if !parent.ends_with(MAIN_SEPARATOR) {
        parent.push(MAIN_SEPARATOR);
    }
    clean(child).starts_with(&parent)
}

/// Join `reference` onto `base` and clean the result.
///
/// The reference is confined to `base`: an absolute reference is placed
/// under it and leading `..` segments cannot climb above it.
pub fn join(base: &str, reference: &str) -> String {
    if base.is_empty() {
        return clean(reference);
    }
    let confined = clean(&format!("{MAIN_SEPARATOR}{reference}"));
    clean(&format!("{base}{confined}"))
}

/// Resolve a declared file reference against the asset root.
///
/// Returns `None` for an empty reference; the caller substitutes an
/// ancestor's reference instead.
pub fn resolve_path(
    reference: &str,
    base: &str,
    needs_variant: bool,
    variant: DeviceVariant,
) -> Option<String> {
    if reference.is_empty() {
        return None;
    }
    let path = normalize_separators(reference);
    // Only the part below the root is ever substituted
    let relative = strip_base(base, &path).unwrap_or(path);
    let relative = if needs_variant {
        substitute_variant(&relative, variant).into_owned()
    } else {
        relative
    };
    Some(join(base, &relative))
}

/// The cleaned remainder of `path` below `base`, if it lies inside it.
fn strip_base(base: &str, path: &str) -> Option<String> {
    if !is_path_inside(base, path) {
        return None;
    }
    let mut prefix = clean(base);
    if !prefix.ends_with(MAIN_SEPARATOR) {
        prefix.push(MAIN_SEPARATOR);
    }
    clean(path).strip_prefix(prefix.as_str()).map(str::to_string)
}
