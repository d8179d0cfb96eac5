//! PostgreSQL repository implementation
//!
//! Schema lives in `migrations/0001_lead_routing.sql`. Rotation advances are a
//! single `UPDATE ... RETURNING` so concurrent allocations serialize on the row lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadroute_core::{
    AssignmentMethod, AssignmentRule, Counsellor, CourseConditions, L3Rule, Lead, RuleConditions,
    Tier,
};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::{debug, warn};

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{AssignmentLogEntry, LeadActivity, LeadRecord, LeadSnapshot, StaleLeadQuery};
use crate::traits::{AdminRepository, RoutingRepository};

const RULE_COLUMNS: &str = "id, name, tier, conditions, assigned_counsellor_ids, \
     assigned_university_names, is_active, priority, round_robin_index, match_count, last_matched_at";

const L3_RULE_COLUMNS: &str = "id, name, university_name, source, course_conditions, \
     assigned_counsellor_ids, is_active, priority, round_robin_index";

const COUNSELLOR_COLUMNS: &str = "id, name, email, role, status";

const LEAD_COLUMNS: &str = "id, assigned_counsellor_id, opened, created_at, assigned_at, \
     last_reassigned_at, reassign_retry_count";

/// PostgreSQL-backed routing repository
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Connect to PostgreSQL
    ///
    /// # Example
    /// ```no_run
    /// use leadroute_repository::PostgresRepository;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let repo = PostgresRepository::new("postgresql://localhost/leadroute").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(database_url: &str) -> RepositoryResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Create a repository over an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn rule_from_row(row: &PgRow) -> RepositoryResult<AssignmentRule> {
    let tier: String = row.try_get("tier")?;
    let conditions: JsonValue = row.try_get("conditions")?;
    let conditions: RuleConditions = serde_json::from_value(conditions)?;
    let match_count: i64 = row.try_get("match_count")?;

    Ok(AssignmentRule {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        tier: tier.parse()?,
        conditions,
        assigned_counsellor_ids: row.try_get("assigned_counsellor_ids")?,
        assigned_university_names: row.try_get("assigned_university_names")?,
        is_active: row.try_get("is_active")?,
        priority: row.try_get("priority")?,
        round_robin_index: to_usize(row.try_get("round_robin_index")?),
        match_count: u64::try_from(match_count).unwrap_or(0),
        last_matched_at: row.try_get("last_matched_at")?,
    })
}

fn l3_rule_from_row(row: &PgRow) -> RepositoryResult<L3Rule> {
    let course: JsonValue = row.try_get("course_conditions")?;
    let course_conditions: CourseConditions = serde_json::from_value(course)?;

    Ok(L3Rule {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        university_name: row.try_get("university_name")?,
        source: row.try_get("source")?,
        course_conditions,
        assigned_counsellor_ids: row.try_get("assigned_counsellor_ids")?,
        is_active: row.try_get("is_active")?,
        priority: row.try_get("priority")?,
        round_robin_index: to_usize(row.try_get("round_robin_index")?),
    })
}

fn counsellor_from_row(row: &PgRow) -> RepositoryResult<Counsellor> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("status")?;

    Ok(Counsellor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: role.parse()?,
        status: status.parse()?,
    })
}

fn lead_from_row(row: &PgRow) -> RepositoryResult<LeadRecord> {
    let retries: i32 = row.try_get("reassign_retry_count")?;

    Ok(LeadRecord {
        id: row.try_get("id")?,
        assigned_counsellor_id: row.try_get("assigned_counsellor_id")?,
        opened: row.try_get("opened")?,
        created_at: row.try_get("created_at")?,
        assigned_at: row.try_get("assigned_at")?,
        last_reassigned_at: row.try_get("last_reassigned_at")?,
        reassign_retry_count: u32::try_from(retries).unwrap_or(0),
    })
}

fn log_from_row(row: &PgRow) -> RepositoryResult<AssignmentLogEntry> {
    let method: Option<String> = row.try_get("method")?;
    let method = method
        .map(|m| serde_json::from_value::<AssignmentMethod>(JsonValue::String(m)))
        .transpose()?;

    Ok(AssignmentLogEntry {
        lead_id: row.try_get("lead_id")?,
        target_id: row.try_get("target_id")?,
        assigned_by: row.try_get("assigned_by")?,
        reason: row.try_get("reason")?,
        method,
        rule_id: row.try_get("rule_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Decode a stored activity snapshot, dropping it when the payload no longer parses
fn decode_activity(lead_id: &str, value: JsonValue) -> Option<Lead> {
    match serde_json::from_value::<Lead>(value) {
        Ok(lead) => Some(lead),
        Err(e) => {
            warn!(lead_id = %lead_id, error = %e, "Discarding undecodable activity snapshot");
            None
        }
    }
}

#[async_trait]
impl RoutingRepository for PostgresRepository {
    async fn find_active_rules(&self, tier: Tier) -> RepositoryResult<Vec<AssignmentRule>> {
        let rows = sqlx::query(&format!(
            "SELECT {RULE_COLUMNS} FROM assignment_rules \
             WHERE is_active AND tier = $1 ORDER BY seq"
        ))
        .bind(tier.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(rule_from_row).collect()
    }

    async fn find_active_l3_rules(&self) -> RepositoryResult<Vec<L3Rule>> {
        let rows = sqlx::query(&format!(
            "SELECT {L3_RULE_COLUMNS} FROM l3_rules WHERE is_active ORDER BY seq"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(l3_rule_from_row).collect()
    }

    async fn advance_round_robin(
        &self,
        tier: Tier,
        rule_id: &str,
        eligible_len: usize,
    ) -> RepositoryResult<Option<usize>> {
        if eligible_len == 0 {
            return Ok(None);
        }
        let len = to_i64(eligible_len);

        // Out-of-range indexes reset to slot 0 before advancing
        let row = match tier {
            Tier::L3 => {
                sqlx::query(
                    r#"
                    UPDATE l3_rules
                    SET round_robin_index = CASE
                        WHEN round_robin_index < 0 OR round_robin_index >= $2 THEN 1 % $2
                        ELSE (round_robin_index + 1) % $2
                    END
                    WHERE id = $1
                    RETURNING round_robin_index
                    "#,
                )
                .bind(rule_id)
                .bind(len)
                .fetch_optional(&self.pool)
                .await?
            }
            _ => {
                sqlx::query(
                    r#"
                    UPDATE assignment_rules
                    SET round_robin_index = CASE
                        WHEN round_robin_index < 0 OR round_robin_index >= $2 THEN 1 % $2
                        ELSE (round_robin_index + 1) % $2
                    END
                    WHERE id = $1 AND tier = $3
                    RETURNING round_robin_index
                    "#,
                )
                .bind(rule_id)
                .bind(len)
                .bind(tier.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
        };

        let row = row.ok_or_else(|| RepositoryError::not_found("rule", rule_id))?;
        let next: i64 = row.try_get("round_robin_index")?;
        let selected = (next + len - 1) % len;
        debug!("Rule {} rotated to slot {}", rule_id, selected);
        Ok(Some(to_usize(selected)))
    }

    async fn increment_match_telemetry(
        &self,
        rule_id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE assignment_rules SET match_count = match_count + 1, last_matched_at = $2 WHERE id = $1",
        )
        .bind(rule_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("rule", rule_id));
        }
        Ok(())
    }

    async fn find_counsellors_by_ids(&self, ids: &[String]) -> RepositoryResult<Vec<Counsellor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {COUNSELLOR_COLUMNS} FROM counsellors WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let found = rows
            .iter()
            .map(counsellor_from_row)
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|c| &c.id == id).cloned())
            .collect())
    }

    async fn find_counsellor_by_id(&self, id: &str) -> RepositoryResult<Option<Counsellor>> {
        let row = sqlx::query(&format!(
            "SELECT {COUNSELLOR_COLUMNS} FROM counsellors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(counsellor_from_row).transpose()
    }

    async fn find_counsellor_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<Counsellor>> {
        let row = sqlx::query(&format!(
            "SELECT {COUNSELLOR_COLUMNS} FROM counsellors WHERE lower(email) = lower($1) LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(counsellor_from_row).transpose()
    }

    async fn ensure_default_counsellor(
        &self,
        candidate: &Counsellor,
    ) -> RepositoryResult<Counsellor> {
        sqlx::query(
            r#"
            INSERT INTO counsellors (id, name, email, role, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&candidate.id)
        .bind(&candidate.name)
        .bind(&candidate.email)
        .bind(candidate.role.as_str())
        .bind(candidate.status.as_str())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(&format!(
            "SELECT {COUNSELLOR_COLUMNS} FROM counsellors \
             WHERE id = $1 OR lower(email) = lower($2) ORDER BY (id = $1) DESC LIMIT 1"
        ))
        .bind(&candidate.id)
        .bind(&candidate.email)
        .fetch_one(&self.pool)
        .await?;

        counsellor_from_row(&row)
    }

    async fn find_lead(&self, lead_id: &str) -> RepositoryResult<Option<LeadRecord>> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"))
            .bind(lead_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(lead_from_row).transpose()
    }

    async fn find_stale_unopened_leads(
        &self,
        query: &StaleLeadQuery,
    ) -> RepositoryResult<Vec<LeadSnapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.assigned_counsellor_id, l.created_at, l.last_reassigned_at,
                   l.reassign_retry_count,
                   (SELECT a.snapshot FROM lead_activities a
                     WHERE a.lead_id = l.id
                     ORDER BY a.recorded_at DESC LIMIT 1) AS activity
            FROM leads l
            WHERE l.assigned_counsellor_id IS NOT NULL
              AND NOT l.opened
              AND l.created_at < $1
              AND (l.last_reassigned_at IS NULL
                   OR l.last_reassigned_at < $2
                   OR l.last_reassigned_at < $3)
            ORDER BY l.created_at
            "#,
        )
        .bind(query.now - query.quiet_period)
        .bind(query.start_of_today())
        .bind(query.now - query.staleness_window)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let lead_id: String = row.try_get("id")?;
                let retries: i32 = row.try_get("reassign_retry_count")?;
                let activity: Option<JsonValue> = row.try_get("activity")?;
                let activity = activity.and_then(|value| decode_activity(&lead_id, value));
                Ok(LeadSnapshot {
                    lead_id,
                    assigned_counsellor_id: row.try_get("assigned_counsellor_id")?,
                    created_at: row.try_get("created_at")?,
                    last_reassigned_at: row.try_get("last_reassigned_at")?,
                    reassign_retry_count: u32::try_from(retries).unwrap_or(0),
                    activity,
                })
            })
            .collect()
    }

    async fn update_lead_assignment(
        &self,
        lead_id: &str,
        target_id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE leads SET
                last_reassigned_at = CASE
                    WHEN assigned_counsellor_id IS NOT NULL AND assigned_counsellor_id <> $2 THEN $3
                    ELSE last_reassigned_at
                END,
                reassign_retry_count = CASE
                    WHEN assigned_counsellor_id IS NOT NULL AND assigned_counsellor_id <> $2 THEN 0
                    ELSE reassign_retry_count
                END,
                assigned_counsellor_id = $2,
                assigned_at = $3
            WHERE id = $1
            "#,
        )
        .bind(lead_id)
        .bind(target_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("lead", lead_id));
        }
        Ok(())
    }

    async fn append_assignment_log(&self, entry: AssignmentLogEntry) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO assignment_logs
                (lead_id, target_id, assigned_by, reason, method, rule_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&entry.lead_id)
        .bind(&entry.target_id)
        .bind(&entry.assigned_by)
        .bind(&entry.reason)
        .bind(entry.method.map(|m| m.as_str()))
        .bind(&entry.rule_id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn assignment_logs(&self, lead_id: &str) -> RepositoryResult<Vec<AssignmentLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT lead_id, target_id, assigned_by, reason, method, rule_id, created_at
            FROM assignment_logs WHERE lead_id = $1 ORDER BY id
            "#,
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(log_from_row).collect()
    }

    async fn increment_reassign_retry(&self, lead_id: &str) -> RepositoryResult<u32> {
        let row = sqlx::query(
            r#"
            UPDATE leads SET reassign_retry_count = reassign_retry_count + 1
            WHERE id = $1
            RETURNING reassign_retry_count
            "#,
        )
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::not_found("lead", lead_id))?;

        let count: i32 = row.try_get("reassign_retry_count")?;
        Ok(u32::try_from(count).unwrap_or(0))
    }

    async fn reset_reassign_retry(&self, lead_id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE leads SET reassign_retry_count = 0 WHERE id = $1")
            .bind(lead_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("lead", lead_id));
        }
        Ok(())
    }

    async fn save_lead(&self, lead: &LeadRecord) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leads
                (id, assigned_counsellor_id, opened, created_at, assigned_at,
                 last_reassigned_at, reassign_retry_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                assigned_counsellor_id = EXCLUDED.assigned_counsellor_id,
                opened = EXCLUDED.opened,
                assigned_at = EXCLUDED.assigned_at,
                last_reassigned_at = EXCLUDED.last_reassigned_at,
                reassign_retry_count = EXCLUDED.reassign_retry_count
            "#,
        )
        .bind(&lead.id)
        .bind(&lead.assigned_counsellor_id)
        .bind(lead.opened)
        .bind(lead.created_at)
        .bind(lead.assigned_at)
        .bind(lead.last_reassigned_at)
        .bind(i32::try_from(lead.reassign_retry_count).unwrap_or(i32::MAX))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_lead_activity(&self, activity: &LeadActivity) -> RepositoryResult<()> {
        let snapshot = serde_json::to_value(&activity.snapshot)?;

        sqlx::query(
            "INSERT INTO lead_activities (lead_id, recorded_at, snapshot) VALUES ($1, $2, $3)",
        )
        .bind(&activity.lead_id)
        .bind(activity.recorded_at)
        .bind(snapshot)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AdminRepository for PostgresRepository {
    async fn save_rule(&self, rule: &AssignmentRule) -> RepositoryResult<()> {
        rule.validate()?;
        let conditions = serde_json::to_value(&rule.conditions)?;

        sqlx::query(
            r#"
            INSERT INTO assignment_rules
                (id, name, tier, conditions, assigned_counsellor_ids, assigned_university_names,
                 is_active, priority, round_robin_index, match_count, last_matched_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                tier = EXCLUDED.tier,
                conditions = EXCLUDED.conditions,
                assigned_counsellor_ids = EXCLUDED.assigned_counsellor_ids,
                assigned_university_names = EXCLUDED.assigned_university_names,
                is_active = EXCLUDED.is_active,
                priority = EXCLUDED.priority,
                round_robin_index = EXCLUDED.round_robin_index,
                updated_at = NOW()
            "#,
        )
        .bind(&rule.id)
        .bind(&rule.name)
        .bind(rule.tier.as_str())
        .bind(conditions)
        .bind(&rule.assigned_counsellor_ids)
        .bind(&rule.assigned_university_names)
        .bind(rule.is_active)
        .bind(rule.priority)
        .bind(to_i64(rule.round_robin_index))
        .bind(i64::try_from(rule.match_count).unwrap_or(i64::MAX))
        .bind(rule.last_matched_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_l3_rule(&self, rule: &L3Rule) -> RepositoryResult<()> {
        rule.validate()?;
        let course_conditions = serde_json::to_value(&rule.course_conditions)?;

        sqlx::query(
            r#"
            INSERT INTO l3_rules
                (id, name, university_name, source, course_conditions, assigned_counsellor_ids,
                 is_active, priority, round_robin_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                university_name = EXCLUDED.university_name,
                source = EXCLUDED.source,
                course_conditions = EXCLUDED.course_conditions,
                assigned_counsellor_ids = EXCLUDED.assigned_counsellor_ids,
                is_active = EXCLUDED.is_active,
                priority = EXCLUDED.priority,
                round_robin_index = EXCLUDED.round_robin_index,
                updated_at = NOW()
            "#,
        )
        .bind(&rule.id)
        .bind(&rule.name)
        .bind(&rule.university_name)
        .bind(&rule.source)
        .bind(course_conditions)
        .bind(&rule.assigned_counsellor_ids)
        .bind(rule.is_active)
        .bind(rule.priority)
        .bind(to_i64(rule.round_robin_index))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_rule(&self, tier: Tier, rule_id: &str) -> RepositoryResult<bool> {
        let result = match tier {
            Tier::L3 => {
                sqlx::query("DELETE FROM l3_rules WHERE id = $1")
                    .bind(rule_id)
                    .execute(&self.pool)
                    .await?
            }
            _ => {
                sqlx::query("DELETE FROM assignment_rules WHERE id = $1 AND tier = $2")
                    .bind(rule_id)
                    .bind(tier.as_str())
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    async fn save_counsellor(&self, counsellor: &Counsellor) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO counsellors (id, name, email, role, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                role = EXCLUDED.role,
                status = EXCLUDED.status
            "#,
        )
        .bind(&counsellor.id)
        .bind(&counsellor.name)
        .bind(&counsellor.email)
        .bind(counsellor.role.as_str())
        .bind(counsellor.status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_lead_opened(&self, lead_id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE leads SET opened = TRUE WHERE id = $1")
            .bind(lead_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("lead", lead_id));
        }
        Ok(())
    }
}
