//! Workplace operations.

use huddle_core::{
    Clock, DocId, DocItem, DocumentStore, Filter, Query, UserId, Workplace, WorkplaceMember,
    WorkplaceRef, WorkplaceRole,
    store::{decode, encode},
    types::{collections, fields},
};

use crate::{ChatApi, ClientError};

impl<S: DocumentStore, C: Clock> ChatApi<S, C> {
    /// Create a workplace and record the owner's membership.
    pub async fn create_workplace(
        &self,
        owner: &UserId,
        name: &str,
        description: Option<&str>,
    ) -> Result<DocId, ClientError> {
        let now = self.now();
        let workplace = Workplace {
            name: name.to_owned(),
            owner_id: owner.clone(),
            description: description.map(str::to_owned),
            created_at: now,
            updated_at: now,
            icon_url: None,
        };
        let id = self.store.create(collections::WORKPLACES, encode(&workplace)?).await?;
        self.add_workplace_member(&id, owner, WorkplaceRole::Owner).await?;
        Ok(id)
    }

    /// Record a user's membership in a workplace.
    pub async fn add_workplace_member(
        &self,
        workplace: &DocId,
        user: &UserId,
        role: WorkplaceRole,
    ) -> Result<DocId, ClientError> {
        let member = WorkplaceMember {
            workplace_id: workplace.clone(),
            user_id: user.clone(),
            role,
            joined_at: self.now(),
        };
        Ok(self.store.create(collections::WORKPLACE_MEMBERS, encode(&member)?).await?)
    }

    /// Read one workplace. Absent is `Ok(None)`, not an error.
    pub async fn get_workplace(&self, id: &DocId) -> Result<Option<WorkplaceRef>, ClientError> {
        match self.store.get(collections::WORKPLACES, id).await? {
            Some(doc) => Ok(Some(WorkplaceRef { id: id.clone(), data: decode(doc)? })),
            None => Ok(None),
        }
    }

    /// List the workplaces a user belongs to.
    ///
    /// Membership query first, then a read per workplace id; memberships
    /// pointing at deleted workplaces are skipped.
    pub async fn list_workplaces(&self, user: &UserId) -> Result<Vec<WorkplaceRef>, ClientError> {
        let query = Query::collection(collections::WORKPLACE_MEMBERS)
            .with_filter(Filter::eq(fields::USER_ID, user.as_str()));
        let raw = self.store.query(&query).await?;

        let mut workplaces = Vec::new();
        for item in raw {
            let member: DocItem<WorkplaceMember> = DocItem::decode(item)?;
            if let Some(workplace) = self.get_workplace(&member.data.workplace_id).await? {
                workplaces.push(workplace);
            }
        }
        Ok(workplaces)
    }
}
