//! SQL schema for the Docket SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE,
    full_name   TEXT NOT NULL,
    role        TEXT NOT NULL,   -- 'admin' | 'lawyer' | 'paralegal' | 'staff'
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,   -- unique across soft-deleted rows too
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS companies (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT NOT NULL,
    registration_number TEXT,
    industry            TEXT,
    website             TEXT,
    notes               TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    deleted_at          TEXT
);

CREATE TABLE IF NOT EXISTS company_categories (
    company_id  INTEGER NOT NULL REFERENCES companies(id)  ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    PRIMARY KEY (company_id, category_id)
);

CREATE TABLE IF NOT EXISTS matters (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    reference   TEXT,
    status      TEXT NOT NULL,   -- 'open' | 'on_hold' | 'closed'
    description TEXT,
    company_id  INTEGER REFERENCES companies(id),
    lead_id     INTEGER REFERENCES users(id),
    opened_on   TEXT,            -- YYYY-MM-DD
    closed_on   TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS contracts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    title           TEXT NOT NULL,
    contract_type   TEXT NOT NULL,
    status          TEXT NOT NULL,
    priority        TEXT NOT NULL,
    value_amount    TEXT,        -- decimal string; NULL together with value_currency
    value_currency  TEXT,
    effective_date  TEXT,
    execution_date  TEXT,
    expiration_date TEXT,
    payment_terms   TEXT,
    notes           TEXT,
    matter_id       INTEGER REFERENCES matters(id),
    company_id      INTEGER REFERENCES companies(id),
    counterparty_id INTEGER REFERENCES companies(id),
    legal_owner_id  INTEGER REFERENCES users(id),
    created_by_id   INTEGER REFERENCES users(id),
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    deleted_at      TEXT
);

-- Owned by contracts: written with the parent, replaced wholesale on update.
CREATE TABLE IF NOT EXISTS contract_parties (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id INTEGER NOT NULL REFERENCES contracts(id) ON DELETE CASCADE,
    company_id  INTEGER NOT NULL REFERENCES companies(id),
    role        TEXT NOT NULL,
    signatory   TEXT
);

CREATE TABLE IF NOT EXISTS risks (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    title                TEXT NOT NULL,
    category             TEXT NOT NULL,
    score                INTEGER NOT NULL,
    likelihood           TEXT NOT NULL,
    priority             TEXT NOT NULL,
    tolerance            TEXT NOT NULL,
    financial_impact_min TEXT,
    financial_impact_max TEXT,
    currency             TEXT,
    mitigation_plan      TEXT,
    mitigation_status    TEXT NOT NULL,
    owner_id             INTEGER REFERENCES users(id),
    matter_id            INTEGER REFERENCES matters(id),
    company_id           INTEGER REFERENCES companies(id),
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    deleted_at           TEXT,
    CONSTRAINT chk_risks_score         CHECK (score BETWEEN 0 AND 10),
    CONSTRAINT chk_risks_has_parent    CHECK (matter_id IS NOT NULL OR company_id IS NOT NULL),
    CONSTRAINT chk_risks_single_parent CHECK (matter_id IS NULL OR company_id IS NULL)
);

CREATE INDEX IF NOT EXISTS matters_company_idx     ON matters(company_id);
CREATE INDEX IF NOT EXISTS contracts_matter_idx    ON contracts(matter_id);
CREATE INDEX IF NOT EXISTS contracts_company_idx   ON contracts(company_id);
CREATE INDEX IF NOT EXISTS parties_contract_idx    ON contract_parties(contract_id);
CREATE INDEX IF NOT EXISTS company_categories_idx  ON company_categories(category_id);
CREATE INDEX IF NOT EXISTS risks_matter_idx        ON risks(matter_id);
CREATE INDEX IF NOT EXISTS risks_company_idx       ON risks(company_id);

PRAGMA user_version = 1;
";

/// Readable messages for the named CHECK constraints above.
const CHECKS: &[(&str, &str)] = &[
  ("chk_risks_score", "score: must be between 0 and 10"),
  ("chk_risks_has_parent", "risk must belong to a matter or a company"),
  (
    "chk_risks_single_parent",
    "risk cannot belong to both a matter and a company",
  ),
];

/// Find the constraint named in a SQLite CHECK failure message.
pub fn check_message(detail: &str) -> Option<(&'static str, &'static str)> {
  CHECKS
    .iter()
    .find(|(name, _)| detail.contains(name))
    .copied()
}
