//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation. When migrations change the schema, regenerate this file with
//! `diesel print-schema` or update it by hand.

diesel::table! {
    /// Registered user accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique login name (3–32 characters).
        username -> Varchar,
        /// Unique email address.
        email -> Varchar,
        /// PHC-format Argon2id credential hash.
        password_hash -> Varchar,
        /// Identifier assigned by an external auth provider, when linked.
        external_id -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// User goals, nested via `parent_goal_id`.
    goals (id) {
        id -> Uuid,
        user_id -> Uuid,
        title -> Varchar,
        category -> Varchar,
        /// One of `long-term`, `monthly`, `weekly`, `daily`.
        timeframe -> Varchar,
        /// Completion percentage, 0–100.
        progress -> Int4,
        deadline -> Nullable<Timestamptz>,
        /// One of `low`, `medium`, `high`.
        priority -> Varchar,
        parent_goal_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Units of work, optionally linked to a goal.
    tasks (id) {
        id -> Uuid,
        user_id -> Uuid,
        title -> Varchar,
        estimated_minutes -> Int4,
        actual_minutes -> Nullable<Int4>,
        /// One of `todo`, `in-progress`, `done`.
        status -> Varchar,
        goal_id -> Nullable<Uuid>,
        priority -> Varchar,
        /// Always equal to `status = 'done'`; stored for query convenience.
        completed -> Bool,
        due_date -> Nullable<Timestamptz>,
        source -> Nullable<Varchar>,
        external_id -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Scheduled calendar intervals.
    time_blocks (id) {
        id -> Uuid,
        user_id -> Uuid,
        title -> Varchar,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        task_id -> Nullable<Uuid>,
        buffer_minutes -> Int4,
        calendar_event_id -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-day agendas, unique per (user, date).
    daily_plans (id) {
        id -> Uuid,
        user_id -> Uuid,
        date -> Date,
        task_ids -> Array<Uuid>,
        time_block_ids -> Array<Uuid>,
        notes -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-week focus plans, unique per (user, week_start).
    weekly_plans (id) {
        id -> Uuid,
        user_id -> Uuid,
        week_start -> Date,
        focus_goal_ids -> Array<Uuid>,
        /// Minutes budgeted per category, stored as a JSON object.
        time_budget -> Jsonb,
        priority_areas -> Array<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// External service connections, unique per (user, service_type).
    integrations (id) {
        id -> Uuid,
        user_id -> Uuid,
        service_type -> Varchar,
        /// Opaque credential blob; stored verbatim, never interpreted.
        credentials -> Jsonb,
        /// One of `inactive`, `active`, `error`.
        sync_status -> Varchar,
        last_synced_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    goals,
    tasks,
    time_blocks,
    daily_plans,
    weekly_plans,
    integrations,
);
