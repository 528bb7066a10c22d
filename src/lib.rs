extern crate core;

mod avl;
pub mod collection;
pub mod dit;
pub mod endpoint_list;
pub mod error;
pub mod ibs;
pub mod interval;
pub mod lcl;
pub mod reference_set;
pub mod sit;
mod types;

pub use collection::IntervalCollection;
pub use dit::DynamicIntervalTree;
pub use error::{EmptyCollectionError, ReadOnlyError};
pub use ibs::IntervalBinarySearchTree;
pub use interval::{Interval, IntervalRef};
pub use lcl::LayeredContainmentList;
pub use sit::StaticIntervalTree;
