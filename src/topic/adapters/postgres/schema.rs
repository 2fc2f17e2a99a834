//! Diesel schema for topic persistence.

diesel::table! {
    /// Topic records.
    topics (id) {
        /// Topic identifier.
        id -> Uuid,
        /// Owning workspace.
        workspace_id -> Uuid,
        /// Owning user.
        #[max_length = 64]
        user_id -> Varchar,
        /// Owning organization.
        #[max_length = 64]
        organization_code -> Varchar,
        /// Chat-layer conversation identifier.
        #[max_length = 64]
        chat_conversation_id -> Varchar,
        /// Chat-layer topic identifier.
        #[max_length = 64]
        chat_topic_id -> Varchar,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Sticky sandbox.
        #[max_length = 128]
        sandbox_id -> Nullable<Varchar>,
        /// Working directory.
        #[max_length = 512]
        work_dir -> Varchar,
        /// Weak pointer to the latest task.
        current_task_id -> Nullable<Uuid>,
        /// Cached status of the latest task.
        #[max_length = 20]
        current_task_status -> Nullable<Varchar>,
        /// Remembered task mode.
        #[max_length = 20]
        task_mode -> Varchar,
        /// Opaque sandbox configuration.
        sandbox_config -> Nullable<Jsonb>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-deletion timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}
