mod hashset;

pub use hashset::HashSet;
