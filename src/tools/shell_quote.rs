use regex::Regex;
use std::sync::LazyLock;

static REGEX_SHELL_SPECIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[ \t\n\r\f\v$`"'\\;|&<>(){}*?\[\]~#!]"#).expect("Invalid regex")
});

/// 判斷參數在 shell 中是否需要加上引號
#[must_use]
pub fn needs_quotes(value: &str) -> bool {
    value.is_empty() || REGEX_SHELL_SPECIAL.is_match(value)
}

/// 必要時以單引號包住，內部的單引號轉為 `'\''`
///
/// 開頭的 `$(...)` 指令替換保持原樣，讓 shell 展開
#[must_use]
pub fn quote(value: &str) -> String {
    if let Some((substitution, rest)) = split_command_substitution(value) {
        if rest.is_empty() {
            return substitution.to_string();
        }
        return format!("{substitution}{}", quote(rest));
    }

    if needs_quotes(value) {
        format!("'{}'", value.replace('\'', r"'\''"))
    } else {
        value.to_string()
    }
}

fn split_command_substitution(value: &str) -> Option<(&str, &str)> {
    if !value.starts_with("$(") {
        return None;
    }
    let end = value.find(')')?;
    Some(value.split_at(end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paths_stay_unquoted() {
        assert_eq!(quote("/input/IMG_1.jpg"), "/input/IMG_1.jpg");
        assert_eq!(quote("scale=1280:720"), "scale=1280:720");
    }

    #[test]
    fn test_special_characters_are_quoted() {
        assert_eq!(quote("/input/my frames/a.jpg"), "'/input/my frames/a.jpg'");
        assert_eq!(quote("/input/*.jpg"), "'/input/*.jpg'");
        assert_eq!(quote("it's.jpg"), r"'it'\''s.jpg'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_command_substitution_is_left_alone() {
        assert_eq!(quote("$(pwd)"), "$(pwd)");
        assert_eq!(quote("$(pwd):/workspace"), "$(pwd):/workspace");
        assert_eq!(quote("$(pwd)/my dir"), "$(pwd)'/my dir'");
    }
}
