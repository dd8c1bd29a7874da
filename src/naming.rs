//! Pure transforms from a path relative to the scan root into the id, display
//! name and URL path recorded in the manifest.

use std::collections::HashSet;
use std::path::Path;

fn stem_of(rel_path: &Path) -> String {
    rel_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Title-cases `s`: a cased letter is upper-cased unless it directly follows
/// another cased letter, in which case it is lower-cased. Digits and
/// punctuation break words (`"3d push-up"` -> `"3D Push-Up"`).
///
/// Multi-char upper-case mappings keep only their first char upper
/// (`ß` -> `Ss`, `ﬁ` -> `Fi`). Digraphs with a distinct title-case form
/// (`ǆ`) come out fully upper-cased (`Ǆ`, not `ǅ`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for ch in s.chars() {
        let cased = ch.is_lowercase() || ch.is_uppercase();
        if !cased {
            out.push(ch);
        } else if prev_cased {
            out.extend(ch.to_lowercase());
        } else {
            let mut upper = ch.to_uppercase();
            if let Some(first) = upper.next() {
                out.push(first);
            }
            out.extend(upper.flat_map(char::to_lowercase));
        }
        prev_cased = cased;
    }
    out
}

/// Display name for a file: stem with `_`/`-` runs turned into spaces,
/// whitespace collapsed and title-cased. Falls back to the raw stem.
pub fn humanize_name(rel_path: &Path) -> String {
    let stem = stem_of(rel_path);
    let words: Vec<&str> = stem
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();
    let name = title_case(&words.join(" "));
    if name.is_empty() {
        stem
    } else {
        name
    }
}

/// Lowercase slug of `raw`: every run of characters outside `[a-z0-9]`
/// becomes one `-`, with no leading or trailing dash. May be empty.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Allocates a manifest id for `rel_path` and records it in `seen`.
///
/// The slug of the stem is used as-is when free; otherwise the first free
/// `<slug>-N` with `N >= 2` is taken. Results depend on call order, so callers
/// must feed paths in a fixed order.
pub fn as_id(rel_path: &Path, seen: &mut HashSet<String>, fallback: &str) -> String {
    let mut slug = slugify(&stem_of(rel_path));
    if slug.is_empty() {
        slug = fallback.to_string();
    }
    if seen.insert(slug.clone()) {
        return slug;
    }

    let mut n = 2u64;
    loop {
        let candidate = format!("{}-{}", slug, n);
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Group label: the title-cased name of the file's parent directory, or
/// `default_group` for files at the root.
pub fn group_label(rel_path: &Path, default_group: &str) -> String {
    match rel_path.parent().and_then(Path::file_name) {
        Some(dir) => title_case(&dir.to_string_lossy()),
        None => default_group.to_string(),
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-' | b'~')
}

/// Percent-encodes one path segment over its UTF-8 bytes.
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for &b in segment.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// Encodes each component of `rel_path` separately and joins them with `/`,
/// regardless of the host separator.
pub fn encode_path(rel_path: &Path) -> String {
    rel_path
        .components()
        .map(|c| encode_segment(&c.as_os_str().to_string_lossy()))
        .collect::<Vec<_>>()
        .join("/")
}
