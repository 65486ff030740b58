use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::options::Settings;
use crate::table::{Decoder, DecoderTable, Partitions};
use crate::{Error, Result};

thread_local! {
    static CURRENT: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// Settings plus the decoder table they select. Cheap to clone.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    settings: Settings,
    table: Arc<dyn DecoderTable>,
}

impl Context {
    /// Composes the partitions `settings` names.
    pub fn new(settings: Settings, partitions: &Partitions) -> Result<Self> {
        let table = partitions.compose(settings.partitions.as_slice())?;
        Ok(Self::with_table(settings, table))
    }

    pub fn with_table(settings: Settings, table: impl DecoderTable + 'static) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                settings,
                table: Arc::new(table),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn table(&self) -> &dyn DecoderTable {
        self.inner.table.as_ref()
    }

    pub fn discrimination_name(&self) -> &str {
        &self.inner.settings.discrimination_name
    }

    pub fn fallback(&self) -> Option<&dyn Decoder> {
        self.inner.settings.fallback.as_deref()
    }

    pub fn decoder(&self, tag: &str) -> Option<&dyn Decoder> {
        self.inner.table.get(tag)
    }

    /// Context installed on this thread by the innermost live guard.
    pub fn current() -> Result<Context> {
        CURRENT
            .with(|current| current.borrow().clone())
            .ok_or_else(Error::no_context)
    }

    /// Installs this context as the thread's current one until the guard
    /// is dropped.
    pub fn enter(&self) -> ContextGuard {
        let previous = CURRENT.with(|current| current.replace(Some(self.clone())));
        log::debug!(
            "installed parser context (discrimination name \"{}\"), previous: {}",
            self.discrimination_name(),
            previous.is_some()
        );
        ContextGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.inner.settings)
            .field("tags", &self.inner.table.keys())
            .finish()
    }
}

/// Restores the previously installed context on drop, including when the
/// operation it guards fails.
#[must_use = "the context is uninstalled as soon as the guard is dropped"]
pub struct ContextGuard {
    previous: Option<Context>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        log::debug!("restoring parser context, previous: {}", previous.is_some());
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}
