//! Relay configuration container.
//!
//! [`RelayConfig`] groups the split parameter types so the binary can hand
//! each use case only the slice it needs.
//!
//! | Type | Catalog | Selector | Dispatcher | Novelty | Fire |
//! |------|---------|----------|------------|---------|------|
//! | `CatalogParams` | Yes | No | No | No | No |
//! | `SelectionParams` | No | Yes | No | No | No |
//! | `DispatchParams` | No | No | Yes | No | No |
//! | `NoveltyParams` | No | No | No | Yes | No |
//! | `FireParams` | No | No | No | No | Yes |

use crate::config::{CatalogParams, DispatchParams, FireParams, NoveltyParams, SelectionParams};

#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    catalog: CatalogParams,
    selection: SelectionParams,
    dispatch: DispatchParams,
    novelty: NoveltyParams,
    fire: FireParams,
}

impl RelayConfig {
    pub fn new(
        catalog: CatalogParams,
        selection: SelectionParams,
        dispatch: DispatchParams,
        novelty: NoveltyParams,
        fire: FireParams,
    ) -> Self {
        Self {
            catalog,
            selection,
            dispatch,
            novelty,
            fire,
        }
    }

    // ==================== Accessors ====================

    pub fn catalog(&self) -> &CatalogParams {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionParams {
        &self.selection
    }

    pub fn dispatch(&self) -> &DispatchParams {
        &self.dispatch
    }

    pub fn novelty(&self) -> &NoveltyParams {
        &self.novelty
    }

    pub fn fire(&self) -> &FireParams {
        &self.fire
    }
}
