/// Language used for files whose extension is unknown
pub const PLAIN_TEXT: &str = "plaintext";

const EXTENSIONS: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ts", "typescript"),
    ("py", "python"),
    ("html", "html"),
    ("css", "css"),
    ("json", "json"),
    ("md", "markdown"),
    ("txt", "plaintext"),
    ("xml", "xml"),
    ("java", "java"),
    ("c", "c"),
    ("cpp", "cpp"),
    ("cs", "csharp"),
    ("go", "go"),
    ("php", "php"),
    ("rb", "ruby"),
    ("swift", "swift"),
    ("rs", "rust"),
    ("sh", "shell"),
    ("yml", "yaml"),
    ("yaml", "yaml"),
    ("toml", "toml"),
    ("lua", "lua"),
    ("r", "r"),
    ("kt", "kotlin"),
    ("dart", "dart"),
    ("sql", "sql"),
];

/// Editor language of `file_name`, from the text after its last `.`.
///
/// A name without a dot is its own extension, so `Makefile` and `c` are
/// looked up as `makefile` and `c`.
pub fn detect_language(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    EXTENSIONS
        .iter()
        .find(|(suffix, _)| *suffix == extension)
        .map(|(_, language)| *language)
        .unwrap_or(PLAIN_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(detect_language("main.py"), "python");
        assert_eq!(detect_language("src/lib.rs"), "rust");
        assert_eq!(detect_language("index.HTML"), "html");
        assert_eq!(detect_language("config.yml"), "yaml");
        assert_eq!(detect_language("Program.cs"), "csharp");
        assert_eq!(detect_language("archive.tar.go"), "go");
    }

    #[test]
    fn test_unknown_extension_falls_back_to_plain_text() {
        assert_eq!(detect_language("image.png"), PLAIN_TEXT);
        assert_eq!(detect_language("Makefile"), PLAIN_TEXT);
        assert_eq!(detect_language("trailing."), PLAIN_TEXT);
        assert_eq!(detect_language(""), PLAIN_TEXT);
    }
}
