//! One-shot asynchronous session startup.
//!
//! Loading the face mesh and constructing the engine are the only steps that
//! suspend. The frame loop polls a [`StartupTask`] once per frame and starts
//! driving the session as soon as it resolves.

use std::future::Future;

use picking::Mesh;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{error, info};
use visage_config::InteractionConfig;

use crate::engine::DeformationEngine;
use crate::error::LoadError;
use crate::session::Session;

/// Raw geometry handed over by the asset loader
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Flat positions, 3 floats per vertex
    pub positions: Vec<f32>,
    /// Triangle indices, 3 per triangle
    pub indices: Vec<u32>,
}

/// Load the mesh, build the engine over it and assemble a session.
///
/// Fails if the mesh is malformed, the engine cannot be constructed, or the
/// engine simulates a different number of vertices than the mesh holds.
pub async fn start_session<E, F>(
    load_mesh: F,
    config: InteractionConfig,
) -> Result<Session<E>, LoadError>
where
    E: DeformationEngine,
    F: Future<Output = Result<MeshData, LoadError>>,
{
    let data = load_mesh.await?;
    let mesh = Mesh::new(data.positions, data.indices)?;
    let engine = E::construct(mesh.positions(), mesh.indices())?;

    if engine.vertex_count() != mesh.vertex_count() {
        return Err(LoadError::EngineTopology {
            engine: engine.vertex_count(),
            mesh: mesh.vertex_count(),
        });
    }

    info!(
        "Session ready: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(Session::new(mesh, engine, &config))
}

type StartupResult<E> = Result<Session<E>, LoadError>;

/// Pending startup, polled without blocking
pub struct StartupTask<E> {
    receiver: Option<oneshot::Receiver<StartupResult<E>>>,
}

impl<E> StartupTask<E>
where
    E: DeformationEngine + Send + 'static,
{
    /// Run [`start_session`] on `runtime`
    pub fn spawn<F>(runtime: &tokio::runtime::Handle, load_mesh: F, config: InteractionConfig) -> Self
    where
        F: Future<Output = Result<MeshData, LoadError>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        runtime.spawn(async move {
            let result = start_session(load_mesh, config).await;
            if let Err(err) = &result {
                error!("Session startup failed: {}", err);
            }
            // The receiver may already be gone if the host shut down
            let _ = sender.send(result);
        });

        Self {
            receiver: Some(receiver),
        }
    }
}

impl<E> StartupTask<E> {
    /// A task that has already resolved
    pub fn ready(result: StartupResult<E>) -> Self {
        let (sender, receiver) = oneshot::channel();
        let _ = sender.send(result);
        Self {
            receiver: Some(receiver),
        }
    }

    /// Take the result if startup finished.
    ///
    /// Yields `Some` exactly once; afterwards the task is spent and always
    /// returns `None`.
    pub fn try_take(&mut self) -> Option<StartupResult<E>> {
        let receiver = self.receiver.as_mut()?;
        let outcome = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(LoadError::TaskDropped),
        };
        self.receiver = None;
        Some(outcome)
    }

    /// True until the result has been taken
    pub fn is_pending(&self) -> bool {
        self.receiver.is_some()
    }
}
