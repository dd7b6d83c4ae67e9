use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::aggregate::FetchedPage;
use crate::model::{Contribution, Issue, PullRequest};

const PAGE_SIZE: u32 = 100;
const COMMENT_PAGE_SIZE: u32 = 100;

/// Comment sort order requested from the API. The response/staleness
/// calculators depend on it and never re-sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOrder {
    Ascending,
    Descending,
}

impl CommentOrder {
    fn graphql(self) -> &'static str {
        match self {
            CommentOrder::Ascending => "ASC",
            CommentOrder::Descending => "DESC",
        }
    }
}

/// A contribution variant that can be fetched through the GraphQL search
/// endpoint.
pub trait SearchNode: Contribution + DeserializeOwned {
    /// Inline fragment type in the search query.
    const GRAPHQL_TYPE: &'static str;
    /// Search qualifier selecting this variant.
    const SEARCH_QUALIFIER: &'static str;
    /// Variant-specific fields added to the fragment.
    const EXTRA_FIELDS: &'static str;
}

impl SearchNode for Issue {
    const GRAPHQL_TYPE: &'static str = "Issue";
    const SEARCH_QUALIFIER: &'static str = "is:issue";
    const EXTRA_FIELDS: &'static str = "";
}

impl SearchNode for PullRequest {
    const GRAPHQL_TYPE: &'static str = "PullRequest";
    const SEARCH_QUALIFIER: &'static str = "is:pr";
    const EXTRA_FIELDS: &'static str = "mergedAt";
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<QueryData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct QueryData {
    search: SearchConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchConnection {
    issue_count: u64,
    page_info: PageInfo,
    nodes: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

fn search_document<C: SearchNode>(order: CommentOrder) -> String {
    format!(
        "query($q: String!, $cursor: String) {{\n\
           search(query: $q, type: ISSUE, first: {page}, after: $cursor) {{\n\
             issueCount\n\
             pageInfo {{ hasNextPage endCursor }}\n\
             nodes {{\n\
               ... on {ty} {{\n\
                 number title url createdAt closedAt closed {extra}\n\
                 repository {{ name isPrivate isArchived owner {{ login }} }}\n\
                 comments(first: {comments}, orderBy: {{field: UPDATED_AT, direction: {dir}}}) {{\n\
                   nodes {{ createdAt authorAssociation author {{ login }} }}\n\
                 }}\n\
               }}\n\
             }}\n\
           }}\n\
         }}",
        page = PAGE_SIZE,
        ty = C::GRAPHQL_TYPE,
        extra = C::EXTRA_FIELDS,
        comments = COMMENT_PAGE_SIZE,
        dir = order.graphql(),
    )
}

/// Thin wrapper over the GraphQL search endpoint producing the pages the
/// aggregation driver consumes.
pub struct SearchClient {
    gh: Octocrab,
    pb: ProgressBar,
}

impl SearchClient {
    pub fn new(gh: Octocrab, pb: ProgressBar) -> Self {
        Self { gh, pb }
    }

    pub async fn search_page<C: SearchNode>(
        &self,
        query: &str,
        order: CommentOrder,
        cursor: Option<String>,
    ) -> Result<FetchedPage<C>> {
        let payload = serde_json::json!({
            "query": search_document::<C>(order),
            "variables": { "q": query, "cursor": cursor },
        });

        let response: GraphQlResponse = self.gh.graphql(&payload).await?;
        if let Some(err) = response.errors.first() {
            bail!("GraphQL error for {query:?}: {}", err.message);
        }
        let search = response
            .data
            .with_context(|| format!("empty GraphQL response for {query:?}"))?
            .search;

        self.pb
            .set_message(format!("{} matches for '{}'", search.issue_count, query));

        let mut records = Vec::with_capacity(search.nodes.len());
        for node in search.nodes {
            // Nodes outside the requested fragment arrive as empty objects.
            if node.as_object().map_or(true, |o| o.is_empty()) {
                continue;
            }
            records.push(serde_json::from_value(node)?);
        }

        Ok(FetchedPage {
            records,
            has_next_page: search.page_info.has_next_page,
            end_cursor: search.page_info.end_cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_document_requests_ascending_comments() {
        let doc = search_document::<Issue>(CommentOrder::Ascending);
        assert!(doc.contains("... on Issue"));
        assert!(doc.contains("direction: ASC"));
        assert!(!doc.contains("mergedAt"));
    }

    #[test]
    fn pull_request_document_carries_merge_field_and_order() {
        let doc = search_document::<PullRequest>(CommentOrder::Descending);
        assert!(doc.contains("... on PullRequest"));
        assert!(doc.contains("direction: DESC"));
        assert!(doc.contains("mergedAt"));
    }

    #[test]
    fn response_shape_deserializes() {
        let body = serde_json::json!({
            "data": {
                "search": {
                    "issueCount": 1,
                    "pageInfo": { "hasNextPage": false, "endCursor": null },
                    "nodes": [
                        {},
                        {
                            "number": 7,
                            "title": "t",
                            "url": "u",
                            "createdAt": "2024-06-01T00:00:00Z",
                            "closedAt": null,
                            "closed": false,
                            "repository": {
                                "name": "widget",
                                "isPrivate": false,
                                "isArchived": false,
                                "owner": { "login": "acme" }
                            },
                            "comments": { "nodes": [] }
                        }
                    ]
                }
            }
        });
        let response: GraphQlResponse = serde_json::from_value(body).unwrap();
        let search = response.data.unwrap().search;
        assert_eq!(search.issue_count, 1);
        assert!(!search.page_info.has_next_page);
        // The empty object is the non-matching fragment case the client skips.
        assert!(search.nodes[0].as_object().unwrap().is_empty());
        let issue: Issue = serde_json::from_value(search.nodes[1].clone()).unwrap();
        assert_eq!(issue.number, 7);
    }
}
