//! Filename sanitization and collision-free allocation.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};

use crate::error::{Error, Result};

/// Default cap on sanitized name length.
pub const MAX_NAME_LENGTH: usize = 60;

/// Used when sanitization leaves nothing behind.
const FALLBACK_NAME: &str = "unnamed";

/// Upper bound on collision suffixes before giving up.
const MAX_SUFFIX: u32 = 1000;

/// Make a name safe as a single path component on any filesystem.
///
/// Reserved characters and anything outside word/space/dot/dash become `_`;
/// leading and trailing spaces and dots are stripped (invalid as a trailing
/// component on Windows), with a re-strip after truncation. Idempotent:
/// `sanitize(sanitize(s)) == sanitize(s)`.
pub fn sanitize(name: &str) -> String {
    sanitize_with_limit(name, MAX_NAME_LENGTH)
}

pub fn sanitize_with_limit(name: &str, max_length: usize) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_alphanumeric() || c == '_' || c == '.' || c == '-' => c,
            c if c.is_whitespace() => c,
            _ => '_',
        })
        .collect();

    let strip = |s: &str| -> String {
        s.trim_matches(|c: char| c == ' ' || c == '.').to_string()
    };

    let stripped = strip(&replaced);
    let base = if stripped.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        stripped
    };

    let truncated: String = base.chars().take(max_length).collect();
    let restripped = strip(&truncated);
    if restripped.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        restripped
    }
}

/// Atomically allocate a collision-free `<base>.<ext>` in `dir` and open it
/// for writing.
///
/// The name is claimed with a create-exclusive open, so two concurrent
/// workers that derive the same base name cannot overwrite each other: the
/// loser of the race sees `AlreadyExists` and moves on to `<base>_1`,
/// `<base>_2`, and so on.
pub async fn allocate_unique(dir: &Path, base: &str, ext: &str) -> Result<(PathBuf, File)> {
    let base = sanitize(base);

    let mut counter: u32 = 0;
    loop {
        let name = if counter == 0 {
            format!("{}.{}", base, ext)
        } else {
            format!("{}_{}.{}", base, counter, ext)
        };
        let path = dir.join(&name);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                counter += 1;
                if counter > MAX_SUFFIX {
                    return Err(Error::InvalidFilename(format!(
                        "no free name for '{}.{}' after {} attempts",
                        base, ext, MAX_SUFFIX
                    )));
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Allocate a collision-free name to be used as a rename target.
///
/// The returned path holds an empty placeholder file claiming the name; the
/// caller's rename replaces it.
pub async fn reserve_unique(dir: &Path, base: &str, ext: &str) -> Result<PathBuf> {
    let (path, file) = allocate_unique(dir, base, ext).await?;
    drop(file);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_characters_replaced() {
        assert_eq!(sanitize("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize("emoji \u{1f600} name"), "emoji _ name");
    }

    #[test]
    fn test_strips_leading_trailing_spaces_and_dots() {
        assert_eq!(sanitize("  name.  "), "name");
        assert_eq!(sanitize("...hidden..."), "hidden");
    }

    #[test]
    fn test_empty_input_falls_back() {
        assert_eq!(sanitize(""), "unnamed");
        assert_eq!(sanitize(" . . "), "unnamed");
        assert_eq!(sanitize(".."), "unnamed");
    }

    #[test]
    fn test_truncation_restrips() {
        let name = format!("{}. trailing", "x".repeat(59));
        let out = sanitize(&name);
        assert_eq!(out, "x".repeat(59));
        assert!(out.chars().count() <= MAX_NAME_LENGTH);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "plain name",
            "  spaced  ",
            "bad/chars\\every:where*",
            "",
            "...",
            "мой пин №5",
            &"long ".repeat(40),
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[tokio::test]
    async fn test_allocation_yields_distinct_names() {
        let dir = tempfile::tempdir().unwrap();

        let (first, _f1) = allocate_unique(dir.path(), "pin", "png").await.unwrap();
        let (second, _f2) = allocate_unique(dir.path(), "pin", "png").await.unwrap();

        assert_eq!(first.file_name().unwrap(), "pin.png");
        assert_eq!(second.file_name().unwrap(), "pin_1.png");
    }

    #[tokio::test]
    async fn test_allocation_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pin.png"), b"x").unwrap();
        std::fs::write(dir.path().join("pin_1.png"), b"x").unwrap();

        let (path, _file) = allocate_unique(dir.path(), "pin", "png").await.unwrap();
        assert_eq!(path.file_name().unwrap(), "pin_2.png");
    }

    #[tokio::test]
    async fn test_reserve_leaves_placeholder() {
        let dir = tempfile::tempdir().unwrap();

        let path = reserve_unique(dir.path(), "clip", "mp4").await.unwrap();
        assert!(path.exists());

        let next = reserve_unique(dir.path(), "clip", "mp4").await.unwrap();
        assert_eq!(next.file_name().unwrap(), "clip_1.mp4");
    }

    #[tokio::test]
    async fn test_allocation_sanitizes_base() {
        let dir = tempfile::tempdir().unwrap();

        let (path, _file) = allocate_unique(dir.path(), "a/b:c", "png").await.unwrap();
        assert_eq!(path.file_name().unwrap(), "a_b_c.png");
    }
}
