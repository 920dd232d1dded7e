pub const SCHEMA: &str = r#"
-- Credential store: tokens are kept only as sha256 digests
CREATE TABLE IF NOT EXISTS identities (
    token_key TEXT PRIMARY KEY,        -- hex sha256 of the raw token
    belong TEXT NOT NULL,              -- owning account id
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT                    -- NULL = never
);

-- Catalog entries
CREATE TABLE IF NOT EXISTS repositories (
    id TEXT PRIMARY KEY,
    account TEXT NOT NULL,
    created TEXT NOT NULL,
    "update" TEXT NOT NULL,
    organization TEXT NOT NULL,
    project TEXT NOT NULL,
    version TEXT NOT NULL,
    readme TEXT NOT NULL,
    type TEXT NOT NULL,
    repository TEXT NOT NULL,
    entry TEXT NOT NULL,
    author TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',   -- JSON array

    -- An account registers an organization/project pair at most once
    UNIQUE(account, organization, project)
);

-- Search index writes that failed after the repository write succeeded
CREATE TABLE IF NOT EXISTS search_outbox (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    operation TEXT NOT NULL,           -- 'upload' | 'update'
    document TEXT NOT NULL,            -- JSON search document
    revision TEXT NOT NULL,            -- repositories."update" the document was built from
    attempts INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_identities_belong ON identities(belong);
CREATE INDEX IF NOT EXISTS idx_repositories_project ON repositories(organization, project);
CREATE INDEX IF NOT EXISTS idx_repositories_created ON repositories(created);
CREATE UNIQUE INDEX IF NOT EXISTS idx_search_outbox_repository ON search_outbox(repository_id);
"#;
