// db/schema.rs
//
// Startup schema bootstrap. Every statement is idempotent so the server can
// be restarted (or run as multiple processes) against the same database.
use sqlx::{Pool, Postgres};

const ENUM_TYPES: &[&str] = &[
    "CREATE TYPE user_role AS ENUM ('customer', 'provider')",
    "CREATE TYPE provider_kind AS ENUM ('rider', 'business')",
    "CREATE TYPE service_kind AS ENUM ('rider', 'business', 'any')",
    "CREATE TYPE request_status AS ENUM ('new', 'offered', 'accepted', 'closed')",
    "CREATE TYPE offer_status AS ENUM ('offered', 'accepted', 'passed')",
];

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS user_prefs (
        phone TEXT PRIMARY KEY,
        role user_role,
        role_session TEXT,
        village TEXT NOT NULL DEFAULT '',
        landmark TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS providers (
        phone TEXT PRIMARY KEY,
        kind provider_kind NOT NULL,
        name TEXT NOT NULL,
        village TEXT NOT NULL,
        affiliation TEXT NOT NULL DEFAULT '',
        current_landmark TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        kind service_kind NOT NULL DEFAULT 'any'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS provider_services (
        phone TEXT NOT NULL REFERENCES providers(phone),
        service_id INTEGER NOT NULL REFERENCES services(id),
        active BOOLEAN NOT NULL DEFAULT TRUE,
        PRIMARY KEY (phone, service_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS landmarks (
        id BIGSERIAL PRIMARY KEY,
        village TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        added_by TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (village, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS service_requests (
        id BIGSERIAL PRIMARY KEY,
        customer_phone TEXT NOT NULL,
        service_id INTEGER NOT NULL REFERENCES services(id),
        village TEXT NOT NULL,
        landmark TEXT NOT NULL DEFAULT '',
        note TEXT NOT NULL DEFAULT '',
        status request_status NOT NULL DEFAULT 'new',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS request_offers (
        id BIGSERIAL PRIMARY KEY,
        request_id BIGINT NOT NULL REFERENCES service_requests(id),
        provider_phone TEXT NOT NULL,
        score DOUBLE PRECISION NOT NULL DEFAULT 0,
        eta_minutes INTEGER NOT NULL DEFAULT 999,
        status offer_status NOT NULL DEFAULT 'offered',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (request_id, provider_phone)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assignments (
        id BIGSERIAL PRIMARY KEY,
        request_id BIGINT NOT NULL UNIQUE REFERENCES service_requests(id),
        provider_phone TEXT NOT NULL,
        assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS anchor_receipts (
        id BIGSERIAL PRIMARY KEY,
        request_id BIGINT NOT NULL REFERENCES service_requests(id),
        acknowledged BOOLEAN NOT NULL DEFAULT FALSE,
        anchored_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_landmarks_village ON landmarks (village)",
    "CREATE INDEX IF NOT EXISTS idx_offers_provider ON request_offers (provider_phone, status)",
    "CREATE INDEX IF NOT EXISTS idx_offers_request ON request_offers (request_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_assignments_provider_time ON assignments (provider_phone, assigned_at)",
    "CREATE INDEX IF NOT EXISTS idx_requests_customer ON service_requests (customer_phone, created_at)",
];

/// Seed catalog. Inserted once; `ON CONFLICT DO NOTHING` keeps restarts safe.
const DEFAULT_SERVICES: &[(&str, &str)] = &[
    ("Rider (Boda/Tuktuk)", "rider"),
    ("Food / Restaurants", "business"),
    ("Shop / Duka", "business"),
    ("Plumber", "business"),
    ("Carpenter", "business"),
    ("Electrician", "business"),
];

pub async fn init_schema(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    for ddl in ENUM_TYPES {
        let guarded = format!(
            "DO $$ BEGIN {}; EXCEPTION WHEN duplicate_object THEN NULL; END $$",
            ddl
        );
        sqlx::query(&guarded).execute(pool).await?;
    }

    for ddl in TABLES.iter().chain(INDEXES.iter()) {
        sqlx::query(ddl).execute(pool).await?;
    }

    for (name, kind) in DEFAULT_SERVICES {
        sqlx::query(
            "INSERT INTO services (name, kind) VALUES ($1, $2::service_kind) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(kind)
        .execute(pool)
        .await?;
    }

    Ok(())
}
