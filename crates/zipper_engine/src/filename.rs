use crate::Ordinal;

/// Extension used when the declared content type gives no usable subtype.
pub const FALLBACK_EXTENSION: &str = "bin";

const MAX_EXTENSION_LEN: usize = 32;

/// Deterministic archive entry name: `image{ordinal}.{subtype}`.
pub fn entry_name(ordinal: Ordinal, content_type: Option<&str>) -> String {
    format!("image{ordinal}.{}", extension_for(content_type))
}

/// Subtype of a MIME type (`image/png; q=1` -> `png`), or [`FALLBACK_EXTENSION`].
pub fn extension_for(content_type: Option<&str>) -> String {
    content_type
        .and_then(subtype)
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

fn subtype(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    let (_, sub) = essence.split_once('/')?;
    let sub = sub.trim().to_ascii_lowercase();
    if sub.is_empty() || sub.len() > MAX_EXTENSION_LEN || !sub.chars().all(is_allowed) {
        return None;
    }
    if sub.starts_with('.') || sub.ends_with('.') {
        return None;
    }
    Some(sub)
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

#[cfg(test)]
mod tests {
    use super::{entry_name, extension_for};

    #[test]
    fn subtype_becomes_extension() {
        assert_eq!(entry_name(1, Some("image/png")), "image1.png");
        assert_eq!(entry_name(12, Some("image/jpeg")), "image12.jpeg");
        assert_eq!(entry_name(3, Some("image/svg+xml")), "image3.svg+xml");
    }

    #[test]
    fn parameters_and_case_are_normalized() {
        assert_eq!(extension_for(Some("Image/WEBP; charset=binary")), "webp");
        assert_eq!(extension_for(Some("  image/gif  ")), "gif");
    }

    #[test]
    fn missing_or_malformed_type_falls_back_to_bin() {
        assert_eq!(extension_for(None), "bin");
        assert_eq!(extension_for(Some("")), "bin");
        assert_eq!(extension_for(Some("image")), "bin");
        assert_eq!(extension_for(Some("image/")), "bin");
        assert_eq!(extension_for(Some("image/../etc")), "bin");
        assert_eq!(extension_for(Some("image/p n g")), "bin");
        assert_eq!(entry_name(2, Some("garbage")), "image2.bin");
    }
}
