//! SQLite persistence for the commercial portfolio: companies, contracts and
//! their key terms, partners, RFx documents, and dashboard KPIs.
//!
//! One connection is held for the lifetime of the process. Read operations
//! degrade to empty results when a query fails (the caller renders an empty
//! table instead of crashing); the contract write path surfaces its error and
//! commits atomically or not at all.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Days, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use thiserror::Error;

use crate::analysis::ContractAnalysis;
use crate::types::{CompanyType, ContractType};

/// Expiry window the dashboard uses when none is given.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 90;

/// Counterparty used when a contract title carries no `" with "` marker.
const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Errors specific to database operations.
///
/// `Open` and `CreateDir` occur at startup and are fatal to the caller; the
/// process cannot serve anything without persistence.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),
}

/// How much of a statement's result set [`PortfolioDb::execute`] materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    None,
    One,
    All,
}

/// One row of untyped column values from a generic query.
pub type SqlRow = Vec<Value>;

/// A contract joined to its counterparty, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractRow {
    pub id: i64,
    pub title: String,
    pub counterparty: String,
    pub contract_type: String,
    pub status: String,
    pub expiration_date: Option<String>,
    pub risk_score: String,
}

/// A contract expiring within the dashboard's attention window.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiringContract {
    pub title: String,
    pub expiration_date: String,
}

/// Current value and signed delta for one dashboard KPI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiMetric {
    pub value: f64,
    pub change: f64,
}

/// One partner KPI row; values are display strings so units can vary.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerKpiRow {
    pub kpi_name: String,
    pub kpi_value: String,
    pub target_value: String,
}

/// One assessed requirement from an RFx document.
#[derive(Debug, Clone, PartialEq)]
pub struct RfxRequirementRow {
    pub requirement_text: String,
    pub risk_level: String,
}

/// Resolve the counterparty company name from a contract title.
///
/// Titles follow the `"<subject> with <Counterparty>"` convention; the text
/// after the last `" with "` names the other party. Titles without the marker
/// map to the literal `"Unknown Company"`.
pub fn derive_counterparty(title: &str) -> &str {
    match title.rfind(" with ") {
        Some(idx) => &title[idx + " with ".len()..],
        None => UNKNOWN_COMPANY,
    }
}

/// SQLite connection wrapper for the portfolio schema.
///
/// Intentionally not `Clone` or `Sync`; the embedding application holds one
/// instance for the process lifetime and serializes access to it.
pub struct PortfolioDb {
    conn: Connection,
    /// Set once `initialize` has completed in this process, so repeat calls
    /// on every surface refresh skip the marker probe. Cross-restart
    /// idempotency relies on the marker check, not this flag.
    initialized: bool,
}

impl PortfolioDb {
    /// Open (or create) the database at `path`, creating parent directories
    /// as needed. Failure here is fatal: nothing works without persistence.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(path).map_err(|source| DbError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        // WAL for concurrent readers; foreign keys are declared in the schema
        // and must actually be enforced.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        Ok(Self {
            conn,
            initialized: false,
        })
    }

    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    // =========================================================================
    // Schema lifecycle
    // =========================================================================

    /// Create the schema and seed rows on first run; a no-op afterwards.
    ///
    /// Safe to call on every process start: the `companies` marker table
    /// gates creation, so running twice never duplicates schema objects or
    /// seed data.
    pub fn initialize(&mut self) -> Result<(), DbError> {
        if self.initialized {
            return Ok(());
        }

        if !self.schema_exists()? {
            self.conn.execute_batch(include_str!("schema.sql"))?;
            self.insert_seed_data()?;
        }

        self.initialized = true;
        Ok(())
    }

    /// First-run probe: does the marker table exist?
    fn schema_exists(&self) -> Result<bool, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'companies'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Sample portfolio inserted once, on first schema creation.
    fn insert_seed_data(&self) -> Result<(), DbError> {
        let today = Utc::now().date_naive();
        let in_250_days = (today + Days::new(250)).format("%Y-%m-%d").to_string();
        let in_80_days = (today + Days::new(80)).format("%Y-%m-%d").to_string();

        self.conn.execute(
            "INSERT INTO companies (company_name, type) VALUES
                ('InnovateTel GmbH', 'Partner'),
                ('FutureNet Mobile', 'Client'),
                ('Global Telco Inc.', 'Prospect')",
            [],
        )?;
        self.conn.execute(
            "INSERT INTO contracts
                (company_id, contract_title, contract_type, status, expiration_date, risk_score_display)
             VALUES (1, 'Reseller - InnovateTel', 'Reseller Agreement', 'Active', ?1, 'Medium')",
            params![in_250_days],
        )?;
        self.conn.execute(
            "INSERT INTO contracts
                (company_id, contract_title, contract_type, status, expiration_date, risk_score_display)
             VALUES (2, 'MSA - FutureNet', 'Service Agreement (MSA)', 'Active', ?1, 'High')",
            params![in_80_days],
        )?;
        self.conn
            .execute("INSERT INTO partners (company_id) VALUES (1)", [])?;
        self.conn.execute(
            "INSERT INTO rfx_documents (rfx_title, company_id, status)
             VALUES ('FutureNet VoNR RFP', 2, 'In Progress')",
            [],
        )?;
        self.conn.execute(
            "INSERT INTO kpi_summary (kpi_name, kpi_value, kpi_change)
             VALUES ('win_rate', 72.5, 5.2), ('avg_margin', 28.3, -1.5)",
            [],
        )?;

        Ok(())
    }

    // =========================================================================
    // Generic execution
    // =========================================================================

    /// Generic parameterized execution with caller-selected fetch depth.
    ///
    /// Failures never propagate: the statement's effects are rolled back by
    /// SQLite, the failure is logged, and an empty result is returned.
    /// Missing-table errors are expected while probing a fresh database and
    /// only log at debug level.
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql], fetch: FetchMode) -> Vec<SqlRow> {
        match self.try_execute(sql, params, fetch) {
            Ok(rows) => rows,
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("no such table") {
                    log::debug!("query touched a table that does not exist yet: {msg}");
                } else {
                    log::error!("query failed: {msg}");
                }
                Vec::new()
            }
        }
    }

    fn try_execute(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
        fetch: FetchMode,
    ) -> Result<Vec<SqlRow>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(sql)?;

        if fetch == FetchMode::None {
            stmt.execute(params)?;
            return Ok(Vec::new());
        }

        let column_count = stmt.column_count();
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(row.get::<_, Value>(i)?);
            }
            out.push(values);
            if fetch == FetchMode::One {
                break;
            }
        }
        Ok(out)
    }

    // =========================================================================
    // Contracts
    // =========================================================================

    /// Persist an analyzed contract: counterparty company (reused when the
    /// name already exists, created as a Client otherwise), the contract row
    /// with its rolled-up risk score, and one key-term row per extracted
    /// term. Runs in a single transaction: a failure mid-batch leaves no
    /// contract without its terms.
    ///
    /// Returns the new contract's id.
    pub fn save_contract_and_analysis(
        &mut self,
        title: &str,
        contract_type: ContractType,
        analysis: &ContractAnalysis,
    ) -> Result<i64, DbError> {
        let company_name = derive_counterparty(title);
        let risk_score = analysis.overall_risk();

        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT company_id FROM companies WHERE company_name = ?1",
                params![company_name],
                |row| row.get(0),
            )
            .optional()?;

        let company_id = match existing {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO companies (company_name, type) VALUES (?1, ?2)",
                    params![company_name, CompanyType::Client.as_str()],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            "INSERT INTO contracts
                (company_id, contract_title, contract_type, status, risk_score_display)
             VALUES (?1, ?2, ?3, 'Active', ?4)",
            params![company_id, title, contract_type.label(), risk_score.as_str()],
        )?;
        let contract_id = tx.last_insert_rowid();

        for (term_name, term_value) in &analysis.key_terms {
            tx.execute(
                "INSERT INTO contract_key_terms (contract_id, term_name, term_value)
                 VALUES (?1, ?2, ?3)",
                params![contract_id, term_name, term_value],
            )?;
        }

        tx.commit()?;
        Ok(contract_id)
    }

    /// All contracts with their counterparty name, newest first.
    pub fn get_contracts(&self) -> Vec<ContractRow> {
        match self.query_contracts() {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("contract list query failed: {e}");
                Vec::new()
            }
        }
    }

    fn query_contracts(&self) -> Result<Vec<ContractRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.contract_id, c.contract_title, co.company_name, c.contract_type,
                    c.status, c.expiration_date, c.risk_score_display
             FROM contracts c
             JOIN companies co ON c.company_id = co.company_id
             ORDER BY c.contract_id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ContractRow {
                id: row.get(0)?,
                title: row.get(1)?,
                counterparty: row.get(2)?,
                contract_type: row.get(3)?,
                status: row.get(4)?,
                expiration_date: row.get(5)?,
                risk_score: row.get(6)?,
            })
        })?;

        let mut contracts = Vec::new();
        for row in rows {
            contracts.push(row?);
        }
        Ok(contracts)
    }

    /// Contracts expiring within `[today, today + window_days]`, both
    /// endpoints inclusive, soonest first.
    pub fn get_expiring_contracts(&self, window_days: u32) -> Vec<ExpiringContract> {
        match self.query_expiring_contracts(window_days) {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("expiring contract query failed: {e}");
                Vec::new()
            }
        }
    }

    fn query_expiring_contracts(
        &self,
        window_days: u32,
    ) -> Result<Vec<ExpiringContract>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT contract_title, expiration_date
             FROM contracts
             WHERE expiration_date BETWEEN date('now') AND date('now', ?1 || ' days')
             ORDER BY expiration_date ASC",
        )?;

        let days_param = format!("+{window_days}");
        let rows = stmt.query_map(params![days_param], |row| {
            Ok(ExpiringContract {
                title: row.get(0)?,
                expiration_date: row.get(1)?,
            })
        })?;

        let mut contracts = Vec::new();
        for row in rows {
            contracts.push(row?);
        }
        Ok(contracts)
    }

    // =========================================================================
    // Dashboard KPIs
    // =========================================================================

    /// Dashboard KPIs by name. `win_rate` and `avg_margin` are always
    /// present (zeroed when the table has no row for them) so the overview
    /// never hits a missing key.
    pub fn get_kpi_summary(&self) -> HashMap<String, KpiMetric> {
        let mut summary = match self.query_kpi_summary() {
            Ok(map) => map,
            Err(e) => {
                log::error!("KPI summary query failed: {e}");
                HashMap::new()
            }
        };

        for name in ["win_rate", "avg_margin"] {
            summary.entry(name.to_string()).or_insert(KpiMetric {
                value: 0.0,
                change: 0.0,
            });
        }
        summary
    }

    fn query_kpi_summary(&self) -> Result<HashMap<String, KpiMetric>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT kpi_name, kpi_value, kpi_change FROM kpi_summary")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                KpiMetric {
                    value: row.get(1)?,
                    change: row.get(2)?,
                },
            ))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (name, metric) = row?;
            map.insert(name, metric);
        }
        Ok(map)
    }

    // =========================================================================
    // Partners
    // =========================================================================

    /// Performance rows for the partner linked to the given company.
    pub fn get_partner_performance(&self, partner_company_id: i64) -> Vec<PartnerKpiRow> {
        match self.query_partner_performance(partner_company_id) {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("partner performance query failed: {e}");
                Vec::new()
            }
        }
    }

    fn query_partner_performance(
        &self,
        partner_company_id: i64,
    ) -> Result<Vec<PartnerKpiRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT pp.kpi_name, pp.kpi_value, pp.target_value
             FROM partner_performance pp
             JOIN partners p ON pp.partner_id = p.partner_id
             WHERE p.company_id = ?1",
        )?;

        let rows = stmt.query_map(params![partner_company_id], |row| {
            Ok(PartnerKpiRow {
                kpi_name: row.get(0)?,
                kpi_value: row.get(1)?,
                target_value: row.get(2)?,
            })
        })?;

        let mut kpis = Vec::new();
        for row in rows {
            kpis.push(row?);
        }
        Ok(kpis)
    }

    // =========================================================================
    // RFx
    // =========================================================================

    /// Assessed requirements for one RFx document.
    pub fn get_rfx_requirements(&self, rfx_id: i64) -> Vec<RfxRequirementRow> {
        match self.query_rfx_requirements(rfx_id) {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("RFx requirement query failed: {e}");
                Vec::new()
            }
        }
    }

    fn query_rfx_requirements(&self, rfx_id: i64) -> Result<Vec<RfxRequirementRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT requirement_text, risk_level
             FROM rfx_requirements
             WHERE rfx_id = ?1",
        )?;

        let rows = stmt.query_map(params![rfx_id], |row| {
            Ok(RfxRequirementRow {
                requirement_text: row.get(0)?,
                risk_level: row.get(1)?,
            })
        })?;

        let mut requirements = Vec::new();
        for row in rows {
            requirements.push(row?);
        }
        Ok(requirements)
    }
}

// =============================================================================
// Test support
// =============================================================================


// =============================================================================
// Tests
// =============================================================================
