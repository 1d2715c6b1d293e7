//! list: конкурентный наблюдаемый список со снапшотами
//!
//! Разделение по подмодулям:
//! - core.rs  : SnapList, внутреннее состояние (Items), seal/dispatch уведомлений
//! - read.rs  : чтения (len/get/contains/index_of/copy_to) и снапшоты для итерации
//! - write.rs : одиночные записи (add/insert/set/remove/remove_at/clear)
//! - range.rs : пакетные записи (add_range/insert_range/remove_range/replace_range)
//! - bulk.rs  : bulk-окна (begin/end_bulk_operation, BulkGuard)
//! - order.rs : упорядочивание (sort/sort_by/order_by/order_one, is_sorted)
//!
//! Grouping lives in crate::group and plugs into dispatch through GroupIndex.

pub mod bulk;
pub mod core;
pub mod order;
pub mod range;
pub mod read;
pub mod write;

pub use bulk::BulkGuard;
pub use self::core::SnapList;
