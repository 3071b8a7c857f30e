use crate::gui_bridge::model::VisualizationModel;
use anyhow::Context;
use orbitcore::picking::PointerPosition;
use orbitcore::SchedulerHandle;
use serde::Deserialize;
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use warp::{http::StatusCode, Filter};

pub type SharedHandle = Arc<RwLock<SchedulerHandle>>;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThresholdInput {
    pub height_km: f64,
}

/// HTTP surface over a running scheduler: the published view out, pointer and
/// threshold input in.
pub struct GuiBridge {
    handle: SharedHandle,
}

impl GuiBridge {
    pub fn new(handle: SchedulerHandle) -> Self {
        Self {
            handle: Arc::new(RwLock::new(handle)),
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let handle = self.handle.clone();
        let handle_filter = warp::any().map(move || handle.clone());

        let view_route = warp::path("view")
            .and(warp::path::end())
            .and(warp::get())
            .and(handle_filter.clone())
            .and_then(|handle: SharedHandle| async move {
                let model = snapshot_of(&*handle.read().await);
                Ok::<_, warp::Rejection>(warp::reply::json(&model))
            });

        let pointer_route = warp::path("pointer")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(handle_filter.clone())
            .and_then(|input: PointerInput, handle: SharedHandle| async move {
                let handle = handle.read().await;
                if handle.is_torn_down() {
                    return Ok::<_, warp::Rejection>(torn_down_reply());
                }
                if !handle.pointer_moved(PointerPosition::new(input.x, input.y)) {
                    return Ok(warp::reply::with_status(
                        warp::reply::json(&json!({"status": "pointer must be finite"})),
                        StatusCode::BAD_REQUEST,
                    ));
                }
                Ok(ok_reply())
            });

        let pointer_leave_route = warp::path("pointer")
            .and(warp::path::end())
            .and(warp::delete())
            .and(handle_filter.clone())
            .and_then(|handle: SharedHandle| async move {
                let handle = handle.read().await;
                if handle.is_torn_down() {
                    return Ok::<_, warp::Rejection>(torn_down_reply());
                }
                handle.pointer_left();
                Ok(ok_reply())
            });

        let threshold_route = warp::path("threshold")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(handle_filter)
            .and_then(|input: ThresholdInput, handle: SharedHandle| async move {
                let handle = handle.read().await;
                if handle.is_torn_down() {
                    return Ok::<_, warp::Rejection>(torn_down_reply());
                }
                let applied = handle.set_filter_height(input.height_km);
                log::info!("filter height set to {} km", applied);
                Ok(warp::reply::with_status(
                    warp::reply::json(&json!({
                        "status": "ok",
                        "filter_height_km": applied,
                        "visible_count": handle.output().visible_count,
                    })),
                    StatusCode::OK,
                ))
            });

        view_route
            .or(pointer_route)
            .or(pointer_leave_route)
            .or(threshold_route)
    }

    /// Binds `addr` and serves the routes on the current runtime.
    pub fn serve(&self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding HTTP bridge on {}", addr))?;
        Ok((bound, tokio::spawn(server)))
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> VisualizationModel {
        snapshot_of(&*self.handle.read().await)
    }

    pub async fn teardown(&self) {
        self.handle.write().await.teardown();
    }
}

fn snapshot_of(handle: &SchedulerHandle) -> VisualizationModel {
    let (camera, viewport) = {
        let state = handle.view().lock();
        (state.camera.clone(), state.viewport)
    };
    VisualizationModel::from_view(&handle.output(), camera, viewport, handle.metrics())
}

fn ok_reply() -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&json!({"status": "ok"})), StatusCode::OK)
}

fn torn_down_reply() -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({"status": "torn down"})),
        StatusCode::SERVICE_UNAVAILABLE,
    )
}
