// Базовые модули
pub mod config;
pub mod metrics;

// Примитивы: read/write gate, уведомления, снапшоты
mod gate;
pub mod notify;
pub mod snapshot;

// Сам список (папка с mod.rs) и группировка поверх него
pub mod list; // src/list/{mod,core,read,write,range,bulk,order}.rs
pub mod group;

// Producer: перечисление каталога в список
pub mod enumerate;

// Удобные реэкспорты
pub use config::{BulkIsolation, ListBuilder, ListConfig};
pub use enumerate::{enumerate_into, EnumerateOptions, EnumerationSummary, ItemKind, ListedItem};
pub use group::{Group, GroupHeader};
pub use list::{BulkGuard, SnapList};
pub use notify::{ChangeAction, CollectionChange, ListEvent, Property, SubscriptionHandle};
pub use snapshot::{Snapshot, SnapshotIter};
