use tracing::warn;

use crate::auth::extractors::Identity;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo_types::{Role, User};

/// A persisted role passes only when it is in the allowed set AND still
/// matches the role embedded in the token. Both checks must hold: the
/// fresh read catches a downgrade that happened after issuance, the
/// token comparison catches a token minted under a different role.
pub fn role_allows(persisted: Role, token_role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&persisted) && persisted == token_role
}

/// Admins and instructors see everything; everyone else needs the
/// category in their subscription set.
pub fn subscription_allows(persisted: Role, subscriptions: &[String], category_id: &str) -> bool {
    matches!(persisted, Role::Admin | Role::Instructor)
        || subscriptions.iter().any(|c| c == category_id)
}

/// Role policy predicate. Re-fetches the caller's record so the decision
/// always runs against current state, never cached or token-only state.
pub async fn require_role(
    state: &AppState,
    identity: &Identity,
    allowed: &[Role],
) -> Result<(), ApiError> {
    let user = User::find_by_id(&state.db, identity.id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if role_allows(user.role, identity.role, allowed) {
        Ok(())
    } else {
        warn!(user_id = %identity.id, email = %identity.email, persisted = ?user.role, token = ?identity.role, "role denied");
        Err(ApiError::Forbidden(
            "You do not have permission to access this routes".into(),
        ))
    }
}

/// Subscription-or-role policy predicate. A storage failure surfaces as
/// a server error, never as a denial.
pub async fn require_subscription_or_role(
    state: &AppState,
    identity: &Identity,
    category_id: &str,
) -> Result<(), ApiError> {
    let user = User::find_by_id(&state.db, identity.id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if subscription_allows(user.role, &user.subscriptions, category_id) {
        Ok(())
    } else {
        warn!(user_id = %identity.id, category_id, "subscription denied");
        Err(ApiError::Forbidden(
            "Please subscribe to access this route!".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN_OR_INSTRUCTOR: &[Role] = &[Role::Admin, Role::Instructor];

    #[test]
    fn role_allows_matching_persisted_and_token_role() {
        assert!(role_allows(Role::Admin, Role::Admin, ADMIN_OR_INSTRUCTOR));
        assert!(role_allows(
            Role::Instructor,
            Role::Instructor,
            ADMIN_OR_INSTRUCTOR
        ));
    }

    #[test]
    fn role_denies_plain_user() {
        assert!(!role_allows(Role::User, Role::User, ADMIN_OR_INSTRUCTOR));
    }

    #[test]
    fn role_denies_downgraded_record_with_stale_admin_token() {
        // Token still says ADMIN, record was downgraded to USER.
        assert!(!role_allows(Role::User, Role::Admin, &[Role::Admin]));
    }

    #[test]
    fn role_denies_token_role_mismatch_even_when_persisted_is_allowed() {
        // Persisted role is allowed, but the token was minted as USER.
        assert!(!role_allows(Role::Admin, Role::User, &[Role::Admin]));
    }

    #[test]
    fn subscription_grants_by_elevated_role() {
        assert!(subscription_allows(Role::Admin, &[], "C1"));
        assert!(subscription_allows(Role::Instructor, &[], "C1"));
    }

    #[test]
    fn subscription_grants_by_membership() {
        let subs = vec!["C1".to_string(), "C2".to_string()];
        assert!(subscription_allows(Role::User, &subs, "C1"));
        assert!(subscription_allows(Role::User, &subs, "C2"));
    }

    #[test]
    fn subscription_denies_unsubscribed_user() {
        let subs = vec!["C1".to_string()];
        assert!(!subscription_allows(Role::User, &subs, "C3"));
        assert!(!subscription_allows(Role::User, &[], "C1"));
    }
}
