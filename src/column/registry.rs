use std::collections::HashMap;
use std::sync::OnceLock;

use thiserror::Error;

use super::boolean::BooleanColumn;
use super::chart::ChartColumn;
use super::image::ImageColumn;
use super::list::ListColumn;
use super::number::NumberColumn;
use super::object::ObjectColumn;
use super::range::RangeColumn;
use super::select::SelectColumn;
use super::temporal::TemporalColumn;
use super::text::TextColumn;
use super::url::UrlColumn;
use super::{ColumnKind, ColumnProps, ColumnType};

pub type ColumnFactory = fn(&ColumnProps) -> Box<dyn ColumnType>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("column kind '{0}' is already registered")]
    AlreadyRegistered(ColumnKind),
    #[error("a column registry has already been installed")]
    AlreadyInstalled,
}

/// Maps column kinds to the factories that instantiate them.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    factories: HashMap<ColumnKind, ColumnFactory>,
}

impl ColumnRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding every built-in kind.
    pub fn builtin() -> Self {
        let builtins: [(ColumnKind, ColumnFactory); 15] = [
            (ColumnKind::Text, |p| Box::new(TextColumn::new(p))),
            (ColumnKind::Number, |p| Box::new(NumberColumn::new(p))),
            (ColumnKind::Boolean, |p| Box::new(BooleanColumn::new(p))),
            (ColumnKind::Date, |p| Box::new(TemporalColumn::date(p))),
            (ColumnKind::Time, |p| Box::new(TemporalColumn::time(p))),
            (ColumnKind::DateTime, |p| Box::new(TemporalColumn::datetime(p))),
            (ColumnKind::Select, |p| Box::new(SelectColumn::new(p))),
            (ColumnKind::List, |p| Box::new(ListColumn::new(p))),
            (ColumnKind::Object, |p| Box::new(ObjectColumn::new(p))),
            (ColumnKind::Range, |p| Box::new(RangeColumn::new(p))),
            (ColumnKind::LineChart, |p| {
                Box::new(ChartColumn::new(ColumnKind::LineChart, p))
            }),
            (ColumnKind::BarChart, |p| {
                Box::new(ChartColumn::new(ColumnKind::BarChart, p))
            }),
            (ColumnKind::AreaChart, |p| {
                Box::new(ChartColumn::new(ColumnKind::AreaChart, p))
            }),
            (ColumnKind::Image, |p| Box::new(ImageColumn::new(p))),
            (ColumnKind::Url, |p| Box::new(UrlColumn::new(p))),
        ];
        Self {
            factories: builtins.into_iter().collect(),
        }
    }

    pub fn register(&mut self, kind: ColumnKind, factory: ColumnFactory) -> Result<(), RegistryError> {
        if self.factories.contains_key(&kind) {
            return Err(RegistryError::AlreadyRegistered(kind));
        }
        self.factories.insert(kind, factory);
        Ok(())
    }

    pub fn contains(&self, kind: &ColumnKind) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn create(&self, props: &ColumnProps) -> Option<Box<dyn ColumnType>> {
        self.factories.get(&props.kind).map(|factory| factory(props))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

static REGISTRY: OnceLock<ColumnRegistry> = OnceLock::new();

/// The process-wide registry; built-in kinds unless [`install_registry`] ran
/// first.
pub fn registry() -> &'static ColumnRegistry {
    REGISTRY.get_or_init(ColumnRegistry::builtin)
}

/// Installs `registry` as the process-wide registry. Fails once any registry,
/// including the lazily built default, is in place.
pub fn install_registry(registry: ColumnRegistry) -> Result<(), RegistryError> {
    REGISTRY
        .set(registry)
        .map_err(|_| RegistryError::AlreadyInstalled)
}
