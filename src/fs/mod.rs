//! Path-traversal-resistant filesystem access (§4.1).

mod rooted;

pub use rooted::RootedFs;
