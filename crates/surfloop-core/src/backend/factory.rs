use log::{debug, info, warn};

use super::{HeadlessBackend, SurfaceKind};
use crate::surface::Surface;

pub type SurfaceCreator = Box<dyn Fn() -> Surface + Send + Sync>;

/// Startup-time backend selection.
#[derive(Default)]
pub struct SurfaceFactory {
    creators: Vec<(SurfaceKind, SurfaceCreator)>,
}

impl SurfaceFactory {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creators are tried in registration order.
    pub fn register<F>(&mut self, kind: SurfaceKind, creator: F) -> &mut Self
    where
        F: Fn() -> Surface + Send + Sync + 'static,
    {
        self.creators.push((kind, Box::new(creator)));
        self
    }

    #[inline]
    pub fn kinds(&self) -> impl Iterator<Item = SurfaceKind> + '_ {
        self.creators.iter().map(|(k, _)| *k)
    }

    /// A registered, explicitly requested kind is used as is. Otherwise the
    /// first creator whose surface acquired a native handle wins, falling back
    /// to an inert headless surface.
    pub fn create(&self, kind: SurfaceKind) -> Surface {
        if kind != SurfaceKind::Default {
            if let Some((_, create)) = self.creators.iter().find(|(k, _)| *k == kind) {
                let surface = create();
                info!(target: "surface", "factory.create kind={:?} {}", kind, surface.id());
                return surface;
            }
            debug!(target: "surface", "factory.create kind={:?} not registered, trying all", kind);
        }

        for (k, create) in &self.creators {
            let surface = create();
            if surface.native_handle().is_some() {
                info!(target: "surface", "factory.create kind={:?} {}", k, surface.id());
                return surface;
            }
            debug!(target: "surface", "factory.skip kind={:?} reason='no native handle'", k);
        }

        warn!(target: "surface", "factory.fallback reason='no backend acquired a native handle'");
        Surface::new(HeadlessBackend::inert())
    }
}
