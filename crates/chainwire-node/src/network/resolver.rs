use crate::capability::{ObjectStore, ObjectStoreExt};
use crate::supervisor::Context;
use chainwire_types::{
    BlockHeader, ChainwireError, ChainwireResult, ContentId, InitState, StateRoot,
    INIT_ACTOR_ADDRESS,
};
use tracing::{debug, info, Span};

/// Reads the network name out of genesis state: genesis header, its parent
/// state root, the init actor, then the init actor's state.
pub struct NetworkNameResolver {
    span: Span,
}

impl NetworkNameResolver {
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    pub async fn resolve(
        &self,
        ctx: &Context,
        genesis: &ContentId,
        store: &dyn ObjectStore,
    ) -> ChainwireResult<String> {
        ctx.check()?;
        let header: BlockHeader = store
            .get_cbor(genesis)
            .await?
            .ok_or(ChainwireError::GenesisNotFound(*genesis))?;

        ctx.check()?;
        let state: StateRoot = store
            .get_cbor(&header.parent_state_root)
            .await?
            .ok_or(ChainwireError::ObjectNotFound(header.parent_state_root))?;

        let init = state.actor(INIT_ACTOR_ADDRESS).ok_or_else(|| {
            ChainwireError::State(format!(
                "init actor {} missing from genesis state",
                INIT_ACTOR_ADDRESS
            ))
        })?;
        self.span
            .in_scope(|| debug!("Init actor head at {}", init.head));

        ctx.check()?;
        let init_state: InitState = store
            .get_cbor(&init.head)
            .await?
            .ok_or(ChainwireError::ObjectNotFound(init.head))?;

        self.span.in_scope(|| {
            info!(
                "Resolved network name '{}' from genesis {}",
                init_state.network_name, genesis
            )
        });
        Ok(init_state.network_name)
    }
}
