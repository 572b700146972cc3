use crate::error::ReportError;
use crate::sources::workbook::Sheet;
use regex::Regex;
use std::sync::LazyLock;

/// Separators that exports use interchangeably inside header names.
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_\-.]+").expect("separator pattern compiles"));

/// A logical column and the header spellings it is known under.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

pub const COMPANY: ColumnSpec = ColumnSpec {
    name: "company",
    aliases: &["company", "entity", "brand", "company name"],
};
pub const DAY: ColumnSpec = ColumnSpec {
    name: "date",
    aliases: &["date", "day", "published", "published at", "publish date"],
};
pub const SENTIMENT: ColumnSpec = ColumnSpec {
    name: "sentiment",
    aliases: &["sentiment", "sentiment code", "tone"],
};
pub const AUTHOR: ColumnSpec = ColumnSpec {
    name: "author",
    aliases: &["author", "site", "source", "page", "publisher", "author name"],
};
pub const LINK: ColumnSpec = ColumnSpec {
    name: "link",
    aliases: &["link", "url", "post link", "post url"],
};

pub const AUTHOR_NAME: ColumnSpec = ColumnSpec {
    name: "author_name",
    aliases: &["author name", "author", "page", "page name", "entity"],
};
pub const COMMENT_COUNT: ColumnSpec = ColumnSpec {
    name: "comment_count",
    aliases: &["comment count", "comments"],
};
pub const LIKE_COUNT: ColumnSpec = ColumnSpec {
    name: "like_count",
    aliases: &["like count", "likes", "reactions"],
};
pub const SHARE_COUNT: ColumnSpec = ColumnSpec {
    name: "share_count",
    aliases: &["share count", "shares"],
};
pub const VIEW_COUNT: ColumnSpec = ColumnSpec {
    name: "view_count",
    aliases: &["view count", "views", "reach"],
};

/// Lowercases a header and collapses `_`, `-`, `.` and whitespace runs into a
/// single space, so `Comment_Count` and `comment count` compare equal.
pub fn normalize_header(header: &str) -> String {
    SEPARATORS
        .replace_all(header.trim(), " ")
        .trim()
        .to_lowercase()
}

/// Index of the first header matching any alias of `wanted`, trying aliases in
/// their declared order.
pub fn find_column(headers: &[String], wanted: &ColumnSpec) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    wanted.aliases
        .iter()
        .find_map(|alias| normalized.iter().position(|h| h == alias))
}

pub fn require_column(sheet: &Sheet, wanted: &ColumnSpec) -> Result<usize, ReportError> {
    find_column(&sheet.headers, wanted).ok_or_else(|| ReportError::MissingColumn {
        sheet: sheet.name.clone(),
        column: wanted.name.to_string(),
    })
}
