//! Font loading for the frame renderer.
//!
//! Each selectable family maps to a DejaVu face looked up in an optional
//! override directory first, then in the usual system font locations.

use std::path::{Path, PathBuf};

use rsvp_models::FontFamily;

use crate::error::{MediaError, MediaResult};

/// System directories searched for the DejaVu faces.
const SYSTEM_FONT_DIRS: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
];

/// File name of the face backing each family.
pub fn font_file_name(family: FontFamily) -> &'static str {
    match family {
        FontFamily::Sans => "DejaVuSans.ttf",
        FontFamily::Serif => "DejaVuSerif.ttf",
        FontFamily::Mono => "DejaVuSansMono.ttf",
    }
}

/// Locate the font file for a family, checking `font_dir` first.
pub fn find_font_file(family: FontFamily, font_dir: Option<&Path>) -> Option<PathBuf> {
    let file = font_file_name(family);
    font_dir
        .map(|dir| dir.join(file))
        .into_iter()
        .chain(SYSTEM_FONT_DIRS.iter().map(|dir| Path::new(dir).join(file)))
        .find(|path| path.is_file())
}

/// Load and parse the font face for a family.
///
/// Failure is fatal for the job that requested the family; it is not
/// retried.
pub fn load_font(family: FontFamily, font_dir: Option<&Path>) -> MediaResult<fontdue::Font> {
    let path = find_font_file(family, font_dir)
        .ok_or_else(|| MediaError::font_load(family.as_str(), "no font file found"))?;

    let bytes = std::fs::read(&path).map_err(|e| {
        MediaError::font_load(family.as_str(), format!("{}: {e}", path.display()))
    })?;

    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
        .map_err(|e| MediaError::font_load(family.as_str(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_file_names() {
        assert_eq!(font_file_name(FontFamily::Sans), "DejaVuSans.ttf");
        assert_eq!(font_file_name(FontFamily::Serif), "DejaVuSerif.ttf");
        assert_eq!(font_file_name(FontFamily::Mono), "DejaVuSansMono.ttf");
    }

    #[test]
    fn test_override_dir_wins() {
        let dir = tempfile::TempDir::new().unwrap();
        // An empty marker file is enough for lookup; parsing is separate.
        let path = dir.path().join("DejaVuSans.ttf");
        std::fs::write(&path, b"").unwrap();

        let found = find_font_file(FontFamily::Sans, Some(dir.path())).unwrap();
        assert_eq!(found, path);
    }

    #[test]
    fn test_missing_font_is_font_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        // Empty override dir and (on any machine) no system serif in it.
        let err = load_font(FontFamily::Serif, Some(dir.path().join("nope").as_path()));
        if let Err(MediaError::FontLoad { family, .. }) = err {
            assert_eq!(family, "serif");
        } else if err.is_ok() {
            // System font picked up; acceptable on hosts with DejaVu installed.
        } else {
            panic!("expected FontLoad error");
        }
    }
}
