use crate::config::TokenEnv;
use crate::model::store::ParameterStore;
use crate::vcloud::Vcloud;
use std::fmt::{Debug, Formatter, Result};
use std::sync::Arc;

/// Holds the application's shared state, like the parameter store and the
/// vCloud client across Axum handlers.
///
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ParameterStore + Send + Sync>,
    pub vcloud: Arc<dyn Vcloud + Send + Sync>,
    pub token: Arc<TokenEnv>,
}

impl Debug for AppState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("AppState")
            .field("Store", &"Arc<dyn ParameterStore>")
            .field("Vcloud", &"Arc<dyn Vcloud>")
            .finish()
    }
}
