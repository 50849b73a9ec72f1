use url::Url;

/// Split a locator list into trimmed, non-empty lines.
pub fn parse_locators(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Last path segment of a locator, for display. Falls back to the text after
/// the final `/` when the locator does not parse as a URL.
pub fn display_name(locator: &str) -> String {
    let from_url = Url::parse(locator).ok().and_then(|url| {
        url.path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(ToOwned::to_owned)
    });
    from_url.unwrap_or_else(|| {
        locator
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(locator)
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::{display_name, parse_locators};

    #[test]
    fn crlf_and_blank_lines_are_dropped() {
        let raw = "https://a.example/1.png\r\n\r\n  https://a.example/2.png  \n\t\n";
        assert_eq!(
            parse_locators(raw),
            vec!["https://a.example/1.png", "https://a.example/2.png"]
        );
    }

    #[test]
    fn display_name_uses_last_path_segment() {
        assert_eq!(display_name("https://cdn.example/a/b/cat.jpg?w=10"), "cat.jpg");
        assert_eq!(display_name("https://cdn.example/a/dir/"), "dir");
        assert_eq!(display_name("relative/path/dog.gif"), "dog.gif");
        assert_eq!(display_name("plain"), "plain");
    }
}
