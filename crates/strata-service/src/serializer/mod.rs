//! Model serializers: validated input DTOs in, output DTOs out.

use crate::base::WriteService;
use serde::Serialize;
use strata_core::{EntityId, Model, Page, StrataResult, ValidateExt};
use validator::Validate;

/// Maps between a model and its create, update and output DTOs.
pub trait ModelSerializer<E: Model>: Send + Sync {
    type Create: Validate + Send;
    type Update: Validate + Send;
    type Output: Serialize + Send;

    /// Builds a new entity from already validated input.
    fn build(&self, input: Self::Create) -> StrataResult<E>;

    /// Applies already validated input onto an entity.
    fn apply(&self, entity: &mut E, input: Self::Update) -> StrataResult<()>;

    fn render(&self, entity: &E) -> Self::Output;

    fn render_page(&self, page: Page<E>) -> Page<Self::Output> {
        page.map(|entity| self.render(&entity))
    }
}

/// A serializer bound to a write service: validate, build or apply, save,
/// render.
pub struct ServiceSerializer<E: Model, S: ModelSerializer<E>> {
    serializer: S,
    service: WriteService<E>,
}

impl<E: Model, S: ModelSerializer<E>> ServiceSerializer<E, S> {
    #[must_use]
    pub fn new(serializer: S, service: WriteService<E>) -> Self {
        Self {
            serializer,
            service,
        }
    }

    pub async fn create(&self, input: S::Create) -> StrataResult<S::Output> {
        input.validate_request()?;
        let entity = self.serializer.build(input)?;
        let saved = self.service.create(entity).await?;
        Ok(self.serializer.render(&saved))
    }

    /// Applies `input` to the stored entity inside the update transaction.
    pub async fn update(&self, id: EntityId, input: S::Update) -> StrataResult<S::Output> {
        input.validate_request()?;
        let serializer = &self.serializer;
        let saved = self
            .service
            .update_with(id, move |entity| serializer.apply(entity, input))
            .await?;
        Ok(self.serializer.render(&saved))
    }

    #[must_use]
    pub const fn serializer(&self) -> &S {
        &self.serializer
    }
}

impl<E: Model, S: ModelSerializer<E>> std::fmt::Debug for ServiceSerializer<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSerializer")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}
