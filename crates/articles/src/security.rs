//! Article permissions.
//!
//! A principal without a user id claim is never an editor of anything.

use quill_auth::{ClaimsIdentity, EDITORIAL_ROLES, Role, has_any_role, has_role, user_id};

use crate::draft::ArticleDraft;

fn is_listed_editor(principal: &ClaimsIdentity, draft: &ArticleDraft) -> bool {
    user_id(principal).is_ok_and(|id| draft.is_editor(id))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListArticleDraftsPermission;

impl ListArticleDraftsPermission {
    pub fn evaluate(&self, principal: &ClaimsIdentity) -> bool {
        has_any_role(principal, &EDITORIAL_ROLES)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateArticleDraftPermission;

impl CreateArticleDraftPermission {
    pub fn evaluate(&self, principal: &ClaimsIdentity) -> bool {
        has_any_role(principal, &EDITORIAL_ROLES)
    }
}

/// Chiefs edit any draft; other editorial staff only drafts listing them as editors.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditArticleDraftPermission;

impl EditArticleDraftPermission {
    pub fn evaluate(&self, principal: &ClaimsIdentity, draft: &ArticleDraft) -> bool {
        if has_role(principal, &Role::CHIEF) {
            return true;
        }
        has_any_role(principal, &EDITORIAL_ROLES) && is_listed_editor(principal, draft)
    }
}

/// Chiefs publish anything; editors publish drafts listing them as editors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishArticlePermission;

impl PublishArticlePermission {
    pub fn evaluate(&self, principal: &ClaimsIdentity, draft: &ArticleDraft) -> bool {
        if has_role(principal, &Role::CHIEF) {
            return true;
        }
        has_role(principal, &Role::EDITOR) && is_listed_editor(principal, draft)
    }
}

#[cfg(test)]
mod tests {
    use quill_auth::{Claim, ClaimValue};
    use quill_core::{ArticleDraftId, UserId};

    use super::*;

    fn principal(user: Option<UserId>, roles: &[Role]) -> ClaimsIdentity {
        user.map(|u| Claim::new("idp", ClaimValue::UserId(u)))
            .into_iter()
            .chain(roles.iter().cloned().map(|r| Claim::new("idp", ClaimValue::Role(r))))
            .collect()
    }

    fn draft_edited_by(user: UserId) -> ArticleDraft {
        ArticleDraft::create_from_scratch(ArticleDraftId::new(), None, user)
    }

    #[test]
    fn publish_matrix() {
        let owner = UserId::new();
        let editor = UserId::new();
        let mut draft = draft_edited_by(owner);

        let p = principal(Some(editor), &[Role::EDITOR]);
        assert!(!PublishArticlePermission.evaluate(&p, &draft));

        draft.add_editor(editor);
        assert!(PublishArticlePermission.evaluate(&p, &draft));

        let chief = principal(Some(UserId::new()), &[Role::CHIEF]);
        assert!(PublishArticlePermission.evaluate(&chief, &draft_edited_by(owner)));
        assert!(PublishArticlePermission.evaluate(&principal(None, &[Role::CHIEF]), &draft));
    }

    #[test]
    fn journalists_cannot_publish_even_their_own_drafts() {
        let owner = UserId::new();
        let p = principal(Some(owner), &[Role::JOURNALIST]);
        assert!(!PublishArticlePermission.evaluate(&p, &draft_edited_by(owner)));
        assert!(EditArticleDraftPermission.evaluate(&p, &draft_edited_by(owner)));
    }

    #[test]
    fn edit_needs_editorial_role_and_listing() {
        let owner = UserId::new();
        let draft = draft_edited_by(owner);
        assert!(!EditArticleDraftPermission.evaluate(&principal(Some(owner), &[Role::PHOTOGRAPHER]), &draft));
        assert!(!EditArticleDraftPermission.evaluate(&principal(Some(UserId::new()), &[Role::EDITOR]), &draft));
        assert!(!EditArticleDraftPermission.evaluate(&principal(None, &[Role::EDITOR]), &draft));
        assert!(EditArticleDraftPermission.evaluate(&principal(None, &[Role::CHIEF]), &draft));
    }

    #[test]
    fn listing_and_creating_need_editorial_role() {
        let staff = principal(None, &[Role::JOURNALIST]);
        let outsider = principal(Some(UserId::new()), &[Role::PHOTOGRAPHER, Role::new("intern")]);
        assert!(ListArticleDraftsPermission.evaluate(&staff));
        assert!(CreateArticleDraftPermission.evaluate(&staff));
        assert!(!ListArticleDraftsPermission.evaluate(&outsider));
        assert!(!CreateArticleDraftPermission.evaluate(&outsider));
    }
}
