//! Image format classification.
//!
//! Maps filenames and declared content types onto the three supported
//! format tags. Classification is deliberately asymmetric:
//!
//! - Archive entries carry no reliable content type, so they are
//!   classified by file extension alone.
//! - Loose files are classified by their declared content type when one
//!   is present; the declared type wins over the extension in both
//!   directions (a `.png` declared as `image/jpeg` is JPEG, and a
//!   non-image declared type rejects the file even if the extension
//!   looks fine). Only when no type is declared does the extension
//!   lookup apply.

use std::fmt;

/// Canonical image format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Png,
    Jpeg,
    Webp,
}

impl Format {
    /// Look up a format from a file extension (without the dot).
    ///
    /// Matching is case-insensitive; `jpg` and `jpeg` both map to
    /// [`Format::Jpeg`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Format::Png),
            "jpg" | "jpeg" => Some(Format::Jpeg),
            "webp" => Some(Format::Webp),
            _ => None,
        }
    }

    /// Look up a format from a declared MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(Format::Png),
            "image/jpeg" => Some(Format::Jpeg),
            "image/webp" => Some(Format::Webp),
            _ => None,
        }
    }

    /// Canonical output file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpeg => "jpg",
            Format::Webp => "webp",
        }
    }

    /// MIME type for this format.
    pub fn mime(&self) -> &'static str {
        match self {
            Format::Png => "image/png",
            Format::Jpeg => "image/jpeg",
            Format::Webp => "image/webp",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Format::Png => "png",
            Format::Jpeg => "jpeg",
            Format::Webp => "webp",
        };
        f.write_str(tag)
    }
}

/// Why a file or archive entry was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    /// Extension missing or not one of png/jpg/jpeg/webp.
    UnsupportedExtension,
    /// A content type was declared but is not a supported image type.
    UnsupportedType(String),
}

/// Extension of a filename: the substring after the last `.`, lowercased.
///
/// A name with no dot yields an empty string, which never matches a
/// supported format.
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Classify an archive entry by its filename extension.
pub fn classify_entry(name: &str) -> Result<Format, Rejected> {
    Format::from_extension(&extension_of(name)).ok_or(Rejected::UnsupportedExtension)
}

/// Classify a loose (non-archive) file.
///
/// The declared content type takes precedence when present; an empty
/// declared type counts as absent and falls back to the extension lookup.
pub fn classify_loose(name: &str, declared_type: Option<&str>) -> Result<Format, Rejected> {
    match declared_type {
        Some(mime) if !mime.is_empty() => {
            Format::from_mime(mime).ok_or_else(|| Rejected::UnsupportedType(mime.to_string()))
        }
        _ => classify_entry(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_extensions_normalize() {
        assert_eq!(classify_entry("a.png"), Ok(Format::Png));
        assert_eq!(classify_entry("a.jpg"), Ok(Format::Jpeg));
        assert_eq!(classify_entry("a.jpeg"), Ok(Format::Jpeg));
        assert_eq!(classify_entry("a.webp"), Ok(Format::Webp));
        assert_eq!(classify_entry("A.PNG"), Ok(Format::Png));
        assert_eq!(classify_entry("photo.JPeG"), Ok(Format::Jpeg));
    }

    #[test]
    fn entry_rejections() {
        assert_eq!(classify_entry("notes.txt"), Err(Rejected::UnsupportedExtension));
        assert_eq!(classify_entry("no_extension"), Err(Rejected::UnsupportedExtension));
        assert_eq!(classify_entry("archive.zip"), Err(Rejected::UnsupportedExtension));
    }

    #[test]
    fn loose_declared_type_wins_over_extension() {
        // Declared JPEG beats the .png extension
        assert_eq!(classify_loose("photo.png", Some("image/jpeg")), Ok(Format::Jpeg));
        // Declared PNG beats the .txt extension
        assert_eq!(classify_loose("photo.txt", Some("image/png")), Ok(Format::Png));
    }

    #[test]
    fn loose_unsupported_type_rejects_despite_valid_extension() {
        assert_eq!(
            classify_loose("photo.png", Some("text/plain")),
            Err(Rejected::UnsupportedType("text/plain".to_string()))
        );
    }

    #[test]
    fn loose_without_type_falls_back_to_extension() {
        assert_eq!(classify_loose("photo.webp", None), Ok(Format::Webp));
        assert_eq!(classify_loose("photo.webp", Some("")), Ok(Format::Webp));
        assert_eq!(classify_loose("notes.txt", None), Err(Rejected::UnsupportedExtension));
    }

    #[test]
    fn output_extension_mapping() {
        assert_eq!(Format::Png.extension(), "png");
        assert_eq!(Format::Jpeg.extension(), "jpg");
        assert_eq!(Format::Webp.extension(), "webp");
    }
}
