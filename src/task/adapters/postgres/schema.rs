//! Diesel schema for task persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project, cascaded on project deletion.
        project_id -> Uuid,
        /// Task title.
        title -> Text,
        /// Task description.
        description -> Text,
        /// Task workflow status.
        #[max_length = 20]
        status -> Varchar,
        /// Optional calendar deadline.
        deadline -> Nullable<Date>,
        /// Close timestamp, set exactly when status is `done`.
        closed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
