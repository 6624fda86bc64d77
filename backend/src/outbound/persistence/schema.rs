//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, regenerate them with `diesel print-schema`
//! or update them by hand.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique login name.
        username -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        email -> Nullable<Varchar>,
        /// Argon2 PHC string.
        password_hash -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Operator-curated topic groups.
    groups (id) {
        id -> Int8,
        title -> Varchar,
        /// Unique URL key.
        slug -> Varchar,
        description -> Text,
    }
}

diesel::table! {
    /// Published posts.
    posts (id) {
        id -> Int8,
        text -> Text,
        pub_date -> Timestamptz,
        /// Cascades on user deletion.
        author_id -> Uuid,
        /// Set to NULL when the group is deleted.
        group_id -> Nullable<Int8>,
        /// Path relative to the media root.
        image -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Comments; cascade with their post and author.
    comments (id) {
        id -> Int8,
        post_id -> Int8,
        author_id -> Uuid,
        text -> Text,
        created -> Timestamptz,
    }
}

diesel::table! {
    /// Follow edges, unique per pair and never self-referencing.
    follows (id) {
        id -> Int8,
        user_id -> Uuid,
        author_id -> Uuid,
    }
}

diesel::joinable!(posts -> users (author_id));
diesel::joinable!(posts -> groups (group_id));
diesel::joinable!(comments -> posts (post_id));
diesel::joinable!(comments -> users (author_id));

diesel::allow_tables_to_appear_in_same_query!(users, groups, posts, comments, follows);
