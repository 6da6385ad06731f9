mod scope;

pub use scope::{EmptyScopePolicy, Scope, ScopeResolver};
