// services/database/companies.rs
use super::Database;
use crate::models::{
    AddMembershipRequest, Branch, Company, CompanyAccess, CreateBranchRequest,
    CreateCompanyRequest, Membership, ModulePermission, SetPermissionRequest,
    UpdateBranchRequest, UpdateCompanyRequest, UpdateMembershipRequest, UserRole,
};
use crate::utils::error::{AppError, Result};
use sqlx::PgConnection;
use uuid::Uuid;

impl Database {
    // === ENTREPRISES ===

    pub async fn create_company(&self, req: &CreateCompanyRequest) -> Result<Company> {
        let row = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (legal_name, trade_name, rut, address, phone, email, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&req.legal_name)
        .bind(&req.trade_name)
        .bind(&req.rut)
        .bind(&req.address)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.website)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_company(&self, id: Uuid, req: &UpdateCompanyRequest) -> Result<Company> {
        sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                legal_name = COALESCE($2, legal_name),
                trade_name = COALESCE($3, trade_name),
                rut = COALESCE($4, rut),
                address = COALESCE($5, address),
                phone = COALESCE($6, phone),
                email = COALESCE($7, email),
                website = COALESCE($8, website),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.legal_name)
        .bind(&req.trade_name)
        .bind(&req.rut)
        .bind(&req.address)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.website)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Company".to_string()))
    }

    pub async fn get_company(&self, id: Uuid) -> Result<Company> {
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Company".to_string()))
    }

    pub async fn find_company_by_rut(&self, rut: &str) -> Result<Option<Company>> {
        let row = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE rut = $1")
            .bind(rut)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn list_companies(&self, include_inactive: bool) -> Result<Vec<Company>> {
        let rows = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE ($1 OR is_active) ORDER BY legal_name",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn set_company_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE companies SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Company".to_string()));
        }
        Ok(())
    }

    // === SUCCURSALES ===

    /// Retire le drapeau "principale" des autres succursales de l'entreprise
    pub async fn clear_principal_branch(
        conn: &mut PgConnection,
        company_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE branches SET is_principal = FALSE, updated_at = NOW()
            WHERE company_id = $1 AND is_principal AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(company_id)
        .bind(except)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn insert_branch(
        conn: &mut PgConnection,
        company_id: Uuid,
        req: &CreateBranchRequest,
    ) -> Result<Branch> {
        let row = sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO branches
                (company_id, name, address, phone, email, opening_time, closing_time, is_principal)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(&req.name)
        .bind(&req.address)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(req.opening_time)
        .bind(req.closing_time)
        .bind(req.is_principal)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn update_branch(
        conn: &mut PgConnection,
        company_id: Uuid,
        id: Uuid,
        req: &UpdateBranchRequest,
    ) -> Result<Branch> {
        sqlx::query_as::<_, Branch>(
            r#"
            UPDATE branches SET
                name = COALESCE($3, name),
                address = COALESCE($4, address),
                phone = COALESCE($5, phone),
                email = COALESCE($6, email),
                opening_time = COALESCE($7, opening_time),
                closing_time = COALESCE($8, closing_time),
                is_principal = COALESCE($9, is_principal),
                is_active = COALESCE($10, is_active),
                updated_at = NOW()
            WHERE id = $2 AND company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(id)
        .bind(&req.name)
        .bind(&req.address)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(req.opening_time)
        .bind(req.closing_time)
        .bind(req.is_principal)
        .bind(req.is_active)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Branch".to_string()))
    }

    pub async fn get_branch(&self, company_id: Uuid, id: Uuid) -> Result<Branch> {
        sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Branch".to_string()))
    }

    pub async fn list_branches(&self, company_id: Uuid) -> Result<Vec<Branch>> {
        let rows = sqlx::query_as::<_, Branch>(
            "SELECT * FROM branches WHERE company_id = $1 ORDER BY is_principal DESC, name",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // === RATTACHEMENTS ===

    pub async fn create_membership(
        &self,
        company_id: Uuid,
        req: &AddMembershipRequest,
    ) -> Result<Membership> {
        let row = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (user_id, company_id, branch_id, role, start_date, end_date)
            VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE), $6)
            RETURNING *
            "#,
        )
        .bind(req.user_id)
        .bind(company_id)
        .bind(req.branch_id)
        .bind(req.role)
        .bind(req.start_date)
        .bind(req.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Crée ou réactive le rattachement d'un utilisateur
    pub async fn upsert_membership(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        role: UserRole,
    ) -> Result<Membership> {
        let row = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (user_id, company_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, company_id) DO UPDATE SET
                role = EXCLUDED.role,
                is_active = TRUE,
                end_date = NULL,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_membership(
        &self,
        company_id: Uuid,
        id: Uuid,
        req: &UpdateMembershipRequest,
    ) -> Result<Membership> {
        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships SET
                branch_id = COALESCE($3, branch_id),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                end_date = COALESCE($6, end_date),
                updated_at = NOW()
            WHERE id = $2 AND company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(id)
        .bind(req.branch_id)
        .bind(req.role)
        .bind(req.is_active)
        .bind(req.end_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Membership".to_string()))
    }

    pub async fn delete_membership(&self, company_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM memberships WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Membership".to_string()));
        }
        Ok(())
    }

    pub async fn get_membership_by_id(&self, company_id: Uuid, id: Uuid) -> Result<Membership> {
        sqlx::query_as::<_, Membership>("SELECT * FROM memberships WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Membership".to_string()))
    }

    pub async fn find_membership(&self, user_id: Uuid, company_id: Uuid) -> Result<Option<Membership>> {
        let row = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE user_id = $1 AND company_id = $2",
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_memberships(&self, company_id: Uuid) -> Result<Vec<Membership>> {
        let rows = sqlx::query_as::<_, Membership>(
            "SELECT * FROM memberships WHERE company_id = $1 ORDER BY created_at",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Entreprises actives accessibles via un rattachement en cours de validité
    pub async fn list_company_access(&self, user_id: Uuid) -> Result<Vec<CompanyAccess>> {
        let rows = sqlx::query_as::<_, CompanyAccess>(
            r#"
            SELECT m.id AS membership_id, c.id AS company_id, c.legal_name, c.trade_name,
                   m.role, m.branch_id
            FROM memberships m
            JOIN companies c ON c.id = m.company_id
            WHERE m.user_id = $1
              AND m.is_active AND c.is_active
              AND m.start_date <= CURRENT_DATE
              AND (m.end_date IS NULL OR m.end_date >= CURRENT_DATE)
            ORDER BY m.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // === PERMISSIONS ===

    pub async fn upsert_permission(
        &self,
        membership_id: Uuid,
        req: &SetPermissionRequest,
    ) -> Result<ModulePermission> {
        let row = sqlx::query_as::<_, ModulePermission>(
            r#"
            INSERT INTO module_permissions
                (membership_id, module, can_view, can_create, can_edit, can_delete, can_export)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (membership_id, module) DO UPDATE SET
                can_view = EXCLUDED.can_view,
                can_create = EXCLUDED.can_create,
                can_edit = EXCLUDED.can_edit,
                can_delete = EXCLUDED.can_delete,
                can_export = EXCLUDED.can_export
            RETURNING *
            "#,
        )
        .bind(membership_id)
        .bind(req.module)
        .bind(req.can_view)
        .bind(req.can_create)
        .bind(req.can_edit)
        .bind(req.can_delete)
        .bind(req.can_export)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_permissions(&self, membership_id: Uuid) -> Result<Vec<ModulePermission>> {
        let rows = sqlx::query_as::<_, ModulePermission>(
            "SELECT * FROM module_permissions WHERE membership_id = $1 ORDER BY module",
        )
        .bind(membership_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
