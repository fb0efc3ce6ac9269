//! Process-wide base pipelines, one per shader type.
//!
//! Templates live until process exit. Quads only ever clone them, so nothing
//! releases them early.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use crate::error::QuadError;
use crate::pipeline::{standard_alpha_blend, Pipeline};

enum Slot {
    /// Build hook is running; only it may mutate the pipeline.
    Building(Pipeline),
    Ready(Arc<Pipeline>),
}

static TEMPLATES: LazyLock<Mutex<HashMap<TypeId, Slot>>> = LazyLock::new(Default::default);

fn slots() -> MutexGuard<'static, HashMap<TypeId, Slot>> {
    TEMPLATES.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(super) enum Lookup {
    Ready(Arc<Pipeline>),
    /// Caller must run the build hook, then [`BuildGuard::commit`].
    Build(BuildGuard),
}

/// Returns the template for `S`, or reserves the slot for building it.
///
/// The lock is released before returning so the build hook can add snippets.
pub(super) fn lookup<S: 'static>() -> Result<Lookup, QuadError> {
    let key = TypeId::of::<S>();
    let mut slots = slots();
    match slots.get(&key) {
        Some(Slot::Ready(template)) => Ok(Lookup::Ready(Arc::clone(template))),
        Some(Slot::Building(_)) => Err(QuadError::BuildInProgress {
            shader: std::any::type_name::<S>(),
        }),
        None => {
            let mut base = Pipeline::new();
            base.set_blend(standard_alpha_blend());
            slots.insert(key, Slot::Building(base));
            Ok(Lookup::Build(BuildGuard {
                key,
                shader: std::any::type_name::<S>(),
                committed: false,
            }))
        }
    }
}

/// Runs `f` on the template of `S` while it is being built.
pub(super) fn with_building<S: 'static, R>(
    f: impl FnOnce(&mut Pipeline) -> Result<R, QuadError>,
) -> Result<R, QuadError> {
    let shader = std::any::type_name::<S>();
    match slots().get_mut(&TypeId::of::<S>()) {
        Some(Slot::Building(base)) => f(base),
        Some(Slot::Ready(_)) => Err(QuadError::NotInBuildHook { shader }),
        None => Err(QuadError::MissingTemplate { shader }),
    }
}

pub(super) fn is_ready<S: 'static>() -> bool {
    matches!(slots().get(&TypeId::of::<S>()), Some(Slot::Ready(_)))
}

/// Reservation of a template slot. Dropping it uncommitted discards the
/// half-built pipeline so a later construction can retry.
pub(super) struct BuildGuard {
    key: TypeId,
    shader: &'static str,
    committed: bool,
}

impl BuildGuard {
    pub(super) fn commit(mut self) -> Result<Arc<Pipeline>, QuadError> {
        self.committed = true;
        let mut slots = slots();
        match slots.remove(&self.key) {
            Some(Slot::Building(base)) => {
                let template = Arc::new(base);
                slots.insert(self.key, Slot::Ready(Arc::clone(&template)));
                log::debug!(
                    "base pipeline for {} ready ({} snippet(s), {} layer snippet(s), {} uniform(s))",
                    self.shader,
                    template.snippets().len(),
                    template.layer().snippets().len(),
                    template.uniforms().decls().len(),
                );
                Ok(template)
            }
            Some(other) => {
                slots.insert(self.key, other);
                Err(QuadError::MissingTemplate { shader: self.shader })
            }
            None => Err(QuadError::MissingTemplate { shader: self.shader }),
        }
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Some(Slot::Building(_)) = slots().remove(&self.key) {
            log::warn!("discarded unfinished base pipeline for {}", self.shader);
        }
    }
}
