use std::cmp::Ordering;

use snaplist::{ItemKind, ListedItem};

use crate::cli::{GroupBy, SortBy};

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut v = bytes as f64;
    let mut u = 0;
    while v >= 1024.0 && u + 1 < UNITS.len() {
        v /= 1024.0;
        u += 1;
    }
    if u == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", v, UNITS[u])
    }
}

/// Folders first, then by the chosen key.
pub fn compare_items(sort: SortBy, a: &ListedItem, b: &ListedItem) -> Ordering {
    let folders_first = (a.kind != ItemKind::Folder).cmp(&(b.kind != ItemKind::Folder));
    let by_name = || a.name.to_lowercase().cmp(&b.name.to_lowercase());
    folders_first.then_with(|| match sort {
        SortBy::Name => by_name(),
        // Крупные и свежие сверху
        SortBy::Size => b.size.cmp(&a.size).then_with(by_name),
        SortBy::Modified => b.modified_secs.cmp(&a.modified_secs).then_with(by_name),
    })
}

pub fn group_key(group_by: GroupBy, item: &ListedItem) -> Option<String> {
    match group_by {
        GroupBy::Kind => Some(item.kind.as_str().to_string()),
        GroupBy::Extension => match item.kind {
            ItemKind::Folder => Some("folder".to_string()),
            _ => Some(item.extension().unwrap_or_else(|| "(none)".to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_units() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
