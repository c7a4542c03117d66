//! Permission hierarchy business logic
//!
//! Groups form a forest per owner; permissions are leaves. The ownership
//! check (group belongs to the caller) is the only authorization gate in
//! this engine; there is no cross-owner sharing.

use crate::domain::{
    AuthContext, CreateGroupInput, CreatePermissionInput, ListQuery, Page, Permission,
    PermissionGroup, StringUuid, UpdateGroupInput, PERMISSION_GROUP_SORT_FIELDS,
};
use crate::error::{AppError, Result};
use crate::repository::{PermissionGroupRepository, PermissionRepository};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

/// Upper bound on ancestor-chain walks. Deeper chains are rejected rather
/// than risking an unbounded loop over corrupted parent pointers.
const MAX_TREE_DEPTH: usize = 32;

pub struct PermissionService<G: PermissionGroupRepository, P: PermissionRepository> {
    group_repo: Arc<G>,
    permission_repo: Arc<P>,
}

impl<G: PermissionGroupRepository, P: PermissionRepository> PermissionService<G, P> {
    pub fn new(group_repo: Arc<G>, permission_repo: Arc<P>) -> Self {
        Self {
            group_repo,
            permission_repo,
        }
    }

    async fn find_owned_group(
        &self,
        ctx: &AuthContext,
        id: StringUuid,
    ) -> Result<PermissionGroup> {
        self.group_repo
            .find_for_owner(ctx.user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Permission group not found".to_string()))
    }

    pub async fn create_group(
        &self,
        ctx: &AuthContext,
        input: CreateGroupInput,
    ) -> Result<PermissionGroup> {
        input.validate()?;

        if let Some(parent_id) = input.parent_id {
            let _ = self.find_owned_group(ctx, parent_id).await.map_err(|_| {
                AppError::NotFound("Parent permission group not found".to_string())
            })?;
        }

        let group = self.group_repo.create(ctx.user_id, &input).await?;
        info!(owner_id = %ctx.user_id, group_id = %group.id, "permission group created");
        Ok(group)
    }

    pub async fn get_group(&self, ctx: &AuthContext, id: StringUuid) -> Result<PermissionGroup> {
        self.find_owned_group(ctx, id).await
    }

    /// Owner-scoped listing with pagination, the sort allow-list, and the
    /// searchable-text filter.
    pub async fn list_groups(
        &self,
        ctx: &AuthContext,
        page: i64,
        per_page: i64,
        sort_by: Option<&str>,
        filter: Option<String>,
    ) -> Result<Page<PermissionGroup>> {
        let query = ListQuery::new(page, per_page, sort_by, filter, PERMISSION_GROUP_SORT_FIELDS)?;

        let total = self.group_repo.count_by_owner(ctx.user_id, &query).await?;
        let items = self.group_repo.list_by_owner(ctx.user_id, &query).await?;

        Ok(Page { items, total })
    }

    pub async fn update_group(
        &self,
        ctx: &AuthContext,
        id: StringUuid,
        input: UpdateGroupInput,
    ) -> Result<PermissionGroup> {
        input.validate()?;

        let existing = self.find_owned_group(ctx, id).await?;

        let parent_id = match input.parent_id {
            None => existing.parent_id,
            Some(None) => None,
            Some(Some(new_parent)) => {
                if new_parent == id {
                    return Err(AppError::Validation(
                        "a group cannot be its own parent".to_string(),
                    ));
                }
                let _ = self.find_owned_group(ctx, new_parent).await.map_err(|_| {
                    AppError::NotFound("Parent permission group not found".to_string())
                })?;
                self.ensure_no_cycle(ctx, id, new_parent).await?;
                Some(new_parent)
            }
        };

        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);

        self.group_repo
            .update(id, &name, description, parent_id)
            .await
    }

    /// Walk the ancestor chain from `candidate_parent`; reattaching under a
    /// descendant of `group_id` would close a loop.
    async fn ensure_no_cycle(
        &self,
        ctx: &AuthContext,
        group_id: StringUuid,
        candidate_parent: StringUuid,
    ) -> Result<()> {
        let mut current = Some(candidate_parent);
        for _ in 0..MAX_TREE_DEPTH {
            let Some(id) = current else {
                return Ok(());
            };
            if id == group_id {
                return Err(AppError::Validation(
                    "reparenting would create a cycle".to_string(),
                ));
            }
            current = self
                .group_repo
                .find_for_owner(ctx.user_id, id)
                .await?
                .and_then(|g| g.parent_id);
        }
        Err(AppError::Validation(
            "permission group tree is too deep".to_string(),
        ))
    }

    /// Hard delete; descendants are orphaned, not cascaded.
    pub async fn delete_group(&self, ctx: &AuthContext, id: StringUuid) -> Result<()> {
        let _ = self.find_owned_group(ctx, id).await?;
        self.group_repo.delete(id).await?;
        info!(owner_id = %ctx.user_id, group_id = %id, "permission group deleted");
        Ok(())
    }

    /// Create a permission inside a group the caller owns. Permissions are
    /// read-after-create.
    pub async fn create_permission(
        &self,
        ctx: &AuthContext,
        group_id: StringUuid,
        input: CreatePermissionInput,
    ) -> Result<Permission> {
        input.validate()?;

        let group = self.find_owned_group(ctx, group_id).await?;

        let permission = self.permission_repo.create(group.id, &input).await?;
        info!(group_id = %group.id, permission_id = %permission.id, "permission created");
        Ok(permission)
    }

    pub async fn list_permissions(
        &self,
        ctx: &AuthContext,
        group_id: StringUuid,
    ) -> Result<Vec<Permission>> {
        let group = self.find_owned_group(ctx, group_id).await?;
        self.permission_repo.list_by_group(group.id).await
    }
}
