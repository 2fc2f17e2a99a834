//! Diesel schema for task, task file and transcript persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Identifier assigned by the sandbox.
        #[max_length = 128]
        external_task_id -> Nullable<Varchar>,
        /// Owning user.
        #[max_length = 64]
        user_id -> Varchar,
        /// Owning organization.
        #[max_length = 64]
        organization_code -> Varchar,
        /// Workspace containing the topic.
        workspace_id -> Uuid,
        /// Owning topic.
        topic_id -> Uuid,
        /// Bound sandbox.
        #[max_length = 128]
        sandbox_id -> Nullable<Varchar>,
        /// Execution mode.
        #[max_length = 20]
        task_mode -> Varchar,
        /// Prompt text.
        prompt -> Text,
        /// Serialized attachments.
        attachments -> Nullable<Jsonb>,
        /// Execution status.
        #[max_length = 20]
        status -> Varchar,
        /// Working directory.
        #[max_length = 512]
        work_dir -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-deletion timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Files registered against tasks.
    task_files (id) {
        /// File identifier.
        id -> Uuid,
        /// Idempotency key, unique among live rows.
        #[max_length = 512]
        file_key -> Varchar,
        /// Owning user.
        #[max_length = 64]
        user_id -> Varchar,
        /// Owning organization.
        #[max_length = 64]
        organization_code -> Varchar,
        /// Topic the file belongs to.
        topic_id -> Uuid,
        /// Task that registered the file.
        task_id -> Uuid,
        /// File role.
        #[max_length = 32]
        file_type -> Varchar,
        /// File name.
        #[max_length = 255]
        file_name -> Varchar,
        /// Extension without the leading dot.
        #[max_length = 32]
        file_extension -> Varchar,
        /// Size in bytes.
        file_size -> Int8,
        /// Storage backend.
        #[max_length = 32]
        storage_type -> Varchar,
        /// External URL.
        external_url -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-deletion timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only task transcript.
    task_messages (seq) {
        /// Insertion sequence.
        seq -> Int8,
        /// Message identifier.
        id -> Uuid,
        /// Task the entry belongs to.
        task_id -> Uuid,
        /// Topic the task belongs to.
        topic_id -> Uuid,
        /// Sender role.
        #[max_length = 20]
        sender -> Varchar,
        /// Receiver role.
        #[max_length = 20]
        receiver -> Varchar,
        /// Entry kind.
        #[max_length = 20]
        message_type -> Varchar,
        /// Entry text.
        content -> Text,
        /// Reported task status.
        #[max_length = 20]
        status -> Nullable<Varchar>,
        /// Plan steps.
        steps -> Nullable<Jsonb>,
        /// Tool details.
        tool -> Nullable<Jsonb>,
        /// Attachments.
        attachments -> Nullable<Jsonb>,
        /// Sandbox event name.
        #[max_length = 64]
        event -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
