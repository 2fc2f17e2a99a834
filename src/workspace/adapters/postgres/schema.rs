//! Diesel schema for workspace persistence.

diesel::table! {
    /// Workspace records.
    workspaces (id) {
        /// Workspace identifier.
        id -> Uuid,
        /// Owning user.
        #[max_length = 64]
        user_id -> Varchar,
        /// Owning organization.
        #[max_length = 64]
        organization_code -> Varchar,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Archive flag.
        #[max_length = 20]
        archive_status -> Varchar,
        /// Administrative status.
        #[max_length = 20]
        status -> Varchar,
        /// Weak pointer to the most recently used topic.
        current_topic_id -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-deletion timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}
