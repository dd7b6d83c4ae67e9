use std::collections::HashSet;

use crate::model::{Comment, Contribution, RepositoryInfo};

/// Pure inclusion predicates applied to every record and comment in the
/// aggregation loop. Built once per run from the team membership and the
/// visibility flags; never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ContributionFilter {
    /// Flattened `"org/repo"` names the team owns.
    pub repositories: HashSet<String>,
    /// Flattened team member logins.
    pub logins: HashSet<String>,
    pub exclude_private: bool,
    pub include_archived: bool,
    /// When set, only team members qualify as responders; otherwise any
    /// org-affiliated author association does.
    pub team_comments_only: bool,
}

impl ContributionFilter {
    pub fn is_managed(&self, org: &str, repo: &str) -> bool {
        self.repositories.contains(&format!("{}/{}", org, repo))
    }

    pub fn is_excluded_by_visibility(&self, repo: &RepositoryInfo) -> bool {
        (self.exclude_private && repo.is_private) || (!self.include_archived && repo.is_archived)
    }

    /// The per-record test the aggregation driver applies: owned by the team
    /// and not hidden by the visibility flags.
    pub fn accepts<C: Contribution>(&self, contribution: &C) -> bool {
        let repo = contribution.repository();
        self.is_managed(&repo.owner.login, &repo.name) && !self.is_excluded_by_visibility(repo)
    }

    pub fn is_qualifying_commenter(&self, comment: &Comment) -> bool {
        if self.team_comments_only {
            self.logins.contains(comment.author_login())
        } else {
            comment.author_association.is_org_affiliated()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Author, AuthorAssociation};
    use chrono::Utc;

    fn filter() -> ContributionFilter {
        ContributionFilter {
            repositories: ["acme/widget".to_string(), "acme/gadget".to_string()]
                .into_iter()
                .collect(),
            logins: ["alice".to_string(), "bob".to_string()].into_iter().collect(),
            ..Default::default()
        }
    }

    fn repo(private: bool, archived: bool) -> RepositoryInfo {
        RepositoryInfo {
            name: "widget".to_string(),
            is_private: private,
            is_archived: archived,
            owner: Author {
                login: "acme".to_string(),
            },
        }
    }

    fn comment(login: &str, association: AuthorAssociation) -> Comment {
        Comment {
            created_at: Utc::now(),
            author: Some(Author {
                login: login.to_string(),
            }),
            author_association: association,
        }
    }

    #[test]
    fn is_managed_checks_the_flattened_set() {
        let f = filter();
        assert!(f.is_managed("acme", "widget"));
        assert!(!f.is_managed("acme", "other"));
        assert!(!f.is_managed("intruder", "widget"));
    }

    #[test]
    fn visibility_flags_gate_private_and_archived() {
        let mut f = filter();
        assert!(!f.is_excluded_by_visibility(&repo(true, false)));
        f.exclude_private = true;
        assert!(f.is_excluded_by_visibility(&repo(true, false)));
        assert!(f.is_excluded_by_visibility(&repo(false, true)));
        f.include_archived = true;
        assert!(!f.is_excluded_by_visibility(&repo(false, true)));
    }

    #[test]
    fn association_qualifies_commenters_by_default() {
        let f = filter();
        assert!(f.is_qualifying_commenter(&comment("stranger", AuthorAssociation::Member)));
        assert!(f.is_qualifying_commenter(&comment("stranger", AuthorAssociation::Owner)));
        assert!(f.is_qualifying_commenter(&comment("stranger", AuthorAssociation::Collaborator)));
        assert!(!f.is_qualifying_commenter(&comment("stranger", AuthorAssociation::None)));
        assert!(!f.is_qualifying_commenter(&comment("stranger", AuthorAssociation::Contributor)));
    }

    #[test]
    fn team_comments_only_switches_to_login_membership() {
        let mut f = filter();
        f.team_comments_only = true;
        assert!(f.is_qualifying_commenter(&comment("alice", AuthorAssociation::None)));
        assert!(!f.is_qualifying_commenter(&comment("stranger", AuthorAssociation::Member)));
    }
}
