//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts. `email` is stored lower case and is unique.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        role -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Reported issues.
    ///
    /// `upvotes` caches the row count of `issue_upvotes` for the issue and is
    /// rewritten in the same transaction as every toggle.
    issues (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        category -> Varchar,
        status -> Varchar,
        address -> Varchar,
        latitude -> Float8,
        longitude -> Float8,
        reporter_id -> Uuid,
        upvotes -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Photo URLs in upload order.
    issue_images (issue_id, position) {
        issue_id -> Uuid,
        position -> Int2,
        url -> Text,
    }
}

diesel::table! {
    /// Upvote membership, one row per (issue, user).
    issue_upvotes (issue_id, user_id) {
        issue_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    issue_comments (id) {
        id -> Uuid,
        issue_id -> Uuid,
        author_id -> Uuid,
        body -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(issues -> users (reporter_id));
diesel::joinable!(issue_images -> issues (issue_id));
diesel::joinable!(issue_upvotes -> issues (issue_id));
diesel::joinable!(issue_comments -> issues (issue_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    issues,
    issue_images,
    issue_upvotes,
    issue_comments,
);
