use crate::gui_bridge::model::VisualizationModel;
use anyhow::Context;
use log::info;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
};
use tokio::task::JoinHandle;
use warp::Filter;

type SharedModel = Arc<RwLock<VisualizationModel>>;

/// Bridge that hosts the display HTTP endpoints and holds the latest published model.
#[derive(Clone)]
pub struct GuiBridge {
    state: SharedModel,
}

impl GuiBridge {
    pub fn new(model: VisualizationModel) -> Self {
        Self {
            state: Arc::new(RwLock::new(model)),
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone + Send + Sync + 'static
    {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());

        let frame_route = warp::path("frame")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| warp::reply::json(&*read(&state)));

        let data_route = warp::path("data")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| warp::reply::json(&read(&state).data_reply()));

        let status_route = warp::path("status")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter)
            .map(|state: SharedModel| warp::reply::json(&read(&state).status));

        frame_route.or(data_route).or(status_route)
    }

    /// Binds `address` and serves on the current runtime.
    pub fn serve(&self, address: SocketAddr) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_ephemeral(address)
            .with_context(|| format!("binding HTTP bridge on {address}"))?;
        info!("[bridge] serving /frame, /data and /status on http://{bound}");
        Ok((bound, tokio::spawn(server)))
    }

    pub fn publish(&self, model: &VisualizationModel) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = model.clone();
    }

    pub fn snapshot(&self) -> VisualizationModel {
        read(&self.state).clone()
    }
}

fn read(state: &SharedModel) -> std::sync::RwLockReadGuard<'_, VisualizationModel> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}
