use crate::error::SinkError;

pub const UNKNOWN_TITLE: &str = "Unknown";
pub const ANONYMOUS: &str = "Anonymous";
pub const UNKNOWN_DATE: &str = "Unknown";

/// Separator of the flattened tags column. Lossy when a tag itself contains ", ".
pub const TAG_SEPARATOR: &str = ", ";

/// Column order of the output file. Downstream analysis depends on these names.
pub const CSV_HEADER: [&str; 10] = [
    "title",
    "author",
    "url",
    "kudos",
    "comments",
    "bookmarks",
    "hits",
    "tags",
    "publication_date",
    "word_count",
];

/// One fan-work entry from a listing page. Unresolved fields hold their sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRecord {
    pub title: String,
    pub author: String,
    pub url: String,
    pub kudos: u64,
    pub comments: u64,
    pub bookmarks: u64,
    pub hits: u64,
    pub tags: Vec<String>,
    pub publication_date: String,
    pub word_count: u64,
}

impl Default for WorkRecord {
    fn default() -> Self {
        WorkRecord {
            title: UNKNOWN_TITLE.to_string(),
            author: ANONYMOUS.to_string(),
            url: String::new(),
            kudos: 0,
            comments: 0,
            bookmarks: 0,
            hits: 0,
            tags: Vec::new(),
            publication_date: UNKNOWN_DATE.to_string(),
            word_count: 0,
        }
    }
}

/// How the tags sequence is flattened into its single column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagFormat {
    /// `"Angst, Fluff"`, the format the analysis scripts split on.
    #[default]
    Joined,
    /// `["Angst","Fluff"]`, survives commas inside tag names.
    Json,
}

impl WorkRecord {
    pub fn to_row(&self, format: TagFormat) -> Result<[String; 10], SinkError> {
        let tags = match format {
            TagFormat::Joined => join_tags(&self.tags),
            TagFormat::Json => serde_json::to_string(&self.tags)?,
        };
        Ok([
            self.title.clone(),
            self.author.clone(),
            self.url.clone(),
            self.kudos.to_string(),
            self.comments.to_string(),
            self.bookmarks.to_string(),
            self.hits.to_string(),
            tags,
            self.publication_date.clone(),
            self.word_count.to_string(),
        ])
    }
}

pub fn join_tags(tags: &[String]) -> String {
    tags.join(TAG_SEPARATOR)
}

/// Inverse of [`join_tags`] for tags without an embedded separator.
pub fn split_tags(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(TAG_SEPARATOR).map(str::to_string).collect()
}
