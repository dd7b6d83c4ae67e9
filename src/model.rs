use chrono::{DateTime, Utc};
use serde::Deserialize;

/// GitHub's author-association classification, as returned by the GraphQL
/// comment nodes. Anything we do not care about collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorAssociation {
    Owner,
    Member,
    Collaborator,
    Contributor,
    FirstTimeContributor,
    FirstTimer,
    None,
    #[serde(other)]
    Other,
}

impl AuthorAssociation {
    /// OWNER, MEMBER and COLLABORATOR count as organization-affiliated.
    pub fn is_org_affiliated(self) -> bool {
        matches!(
            self,
            AuthorAssociation::Owner | AuthorAssociation::Member | AuthorAssociation::Collaborator
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub login: String,
}

/// One issue or review comment. The comment list on a contribution arrives
/// pre-sorted by update time from the query layer; nothing here re-sorts it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub created_at: DateTime<Utc>,
    // Deleted users come back as a null author.
    #[serde(default)]
    pub author: Option<Author>,
    pub author_association: AuthorAssociation,
}

impl Comment {
    pub fn author_login(&self) -> &str {
        self.author.as_ref().map(|a| a.login.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentConnection {
    #[serde(default)]
    pub nodes: Vec<Comment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub name: String,
    pub is_private: bool,
    pub is_archived: bool,
    pub owner: Author,
}

/// The capability set shared by issues and pull requests. The
/// response/staleness calculators and the aggregation driver are written
/// once against this trait instead of per variant.
pub trait Contribution {
    fn number(&self) -> u64;
    fn title(&self) -> &str;
    fn url(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn closed_at(&self) -> Option<DateTime<Utc>>;
    fn is_closed(&self) -> bool;
    fn comments(&self) -> &[Comment];
    fn repository(&self) -> &RepositoryInfo;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed: bool,
    pub repository: RepositoryInfo,
    #[serde(default)]
    pub comments: CommentConnection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closed: bool,
    pub merged_at: Option<DateTime<Utc>>,
    pub repository: RepositoryInfo,
    #[serde(default)]
    pub comments: CommentConnection,
}

impl Contribution for Issue {
    fn number(&self) -> u64 {
        self.number
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }
    fn is_closed(&self) -> bool {
        self.closed
    }
    fn comments(&self) -> &[Comment] {
        &self.comments.nodes
    }
    fn repository(&self) -> &RepositoryInfo {
        &self.repository
    }
}

impl Contribution for PullRequest {
    fn number(&self) -> u64 {
        self.number
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn closed_at(&self) -> Option<DateTime<Utc>> {
        // A merged PR closes at its merge time.
        self.closed_at.or(self.merged_at)
    }
    fn is_closed(&self) -> bool {
        self.closed
    }
    fn comments(&self) -> &[Comment] {
        &self.comments.nodes
    }
    fn repository(&self) -> &RepositoryInfo {
        &self.repository
    }
}
