// rsdeploy/src/utils/paths.rs
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

/// Separator used in report server catalog paths.
pub const REMOTE_SEPARATOR: char = '/';

/// Longest item name the report server accepts.
const MAX_ITEM_NAME_LEN: usize = 260;

static RESERVED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[;?:@&=+$,\\*><|."/]"#).expect("reserved character pattern is valid")
});

/// Ensures a report server folder path begins with `/` and, unless it is the
/// root, does not end with one. An empty input is treated as the root folder.
pub fn normalize_folder_path(folder_path: &str) -> String {
    let trimmed = folder_path.trim_end_matches(REMOTE_SEPARATOR);
    if trimmed.starts_with(REMOTE_SEPARATOR) {
        trimmed.to_string()
    } else {
        format!("{}{}", REMOTE_SEPARATOR, trimmed)
    }
}

/// Joins a normalized folder path and an item name with exactly one `/`.
pub fn join_item_path(folder_path: &str, item_name: &str) -> String {
    if folder_path.ends_with(REMOTE_SEPARATOR) {
        format!("{}{}", folder_path, item_name)
    } else {
        format!("{}{}{}", folder_path, REMOTE_SEPARATOR, item_name)
    }
}

/// Checks a catalog item name against the report server's naming rules.
pub fn validate_item_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("item name cannot be empty");
    }
    if name.chars().count() > MAX_ITEM_NAME_LEN {
        anyhow::bail!(
            "item name '{}' is longer than {} characters",
            name,
            MAX_ITEM_NAME_LEN
        );
    }
    if let Some(found) = RESERVED_CHARS.find(name) {
        anyhow::bail!(
            "item name '{}' contains the reserved character '{}'",
            name,
            found.as_str()
        );
    }
    Ok(())
}
