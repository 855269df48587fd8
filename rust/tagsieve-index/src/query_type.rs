use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tagsieve_common::{Result, error::Error};

/// A predefined ordering (and subset) of the document collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    LastActivityDate,
    CreationDate,
    Score,
    ViewCount,
    AnswerCount,
}

impl QueryType {
    pub const COUNT: usize = 5;

    pub const ALL: [QueryType; QueryType::COUNT] = [
        QueryType::LastActivityDate,
        QueryType::CreationDate,
        QueryType::Score,
        QueryType::ViewCount,
        QueryType::AnswerCount,
    ];

    /// Dense index in `0..COUNT`, matching the order of [`QueryType::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            QueryType::LastActivityDate => "LastActivityDate",
            QueryType::CreationDate => "CreationDate",
            QueryType::Score => "Score",
            QueryType::ViewCount => "ViewCount",
            QueryType::AnswerCount => "AnswerCount",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QueryType {
    type Err = Error;

    /// Case-insensitive; `_` and `-` separators are ignored, so `view_count`,
    /// `ViewCount` and `view-count` all parse.
    fn from_str(s: &str) -> Result<QueryType> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        QueryType::ALL
            .into_iter()
            .find(|qt| qt.name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| Error::invalid_arg("query_type", format!("unknown query type '{s}'")))
    }
}
