//! Per-resource router state: the bound service plus shared rendering and paging settings.

use crate::query::Paging;
use crate::render::Renderers;
use std::marker::PhantomData;
use std::sync::Arc;

pub struct ResourceState<R, S> {
    pub service: Arc<S>,
    pub renderers: Renderers,
    pub paging: Paging,
    _resource: PhantomData<fn() -> R>,
}

impl<R, S> ResourceState<R, S> {
    pub fn new(service: Arc<S>) -> Self {
        ResourceState {
            service,
            renderers: Renderers::default(),
            paging: Paging::default(),
            _resource: PhantomData,
        }
    }

    pub fn with_renderers(mut self, renderers: Renderers) -> Self {
        self.renderers = renderers;
        self
    }

    pub fn with_paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }
}

impl<R, S> Clone for ResourceState<R, S> {
    fn clone(&self) -> Self {
        ResourceState {
            service: Arc::clone(&self.service),
            renderers: self.renderers.clone(),
            paging: self.paging,
            _resource: PhantomData,
        }
    }
}
